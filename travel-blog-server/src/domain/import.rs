use super::post::MIN_CONTENT_LENGTH;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One record of an uploaded JSON array. Every field may be missing; the
/// record is checked with [`PostRecord::check`] before anything is stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostRecord {
    pub title: Option<String>,
    pub content: Option<String>,
    pub country: Option<String>,
    pub categories: Option<Vec<String>>,
    pub created_at: Option<NaiveDate>,
    pub rating: Option<f64>,
    pub user_id: Option<i64>,
}

/// A record whose fields are all present and well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedRecord {
    pub title: String,
    pub content: String,
    pub country: String,
    pub categories: Vec<String>,
    pub created_at: NaiveDate,
    pub rating: f64,
    pub user_id: i64,
}

/// Why a record was left out of the import batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingField(&'static str),
    BlankField(&'static str),
    ContentTooShort(usize),
    OwnerNotFound(i64),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{} is missing", field),
            Self::BlankField(field) => write!(f, "{} is blank", field),
            Self::ContentTooShort(len) => write!(
                f,
                "content has {} characters, at least {} required",
                len, MIN_CONTENT_LENGTH
            ),
            Self::OwnerNotFound(id) => write!(f, "user {} does not exist", id),
        }
    }
}

impl PostRecord {
    pub fn check(self) -> Result<CheckedRecord, SkipReason> {
        let title = self.title.ok_or(SkipReason::MissingField("title"))?;
        if title.trim().is_empty() {
            return Err(SkipReason::BlankField("title"));
        }

        let content = self.content.ok_or(SkipReason::MissingField("content"))?;
        let content_len = content.chars().count();
        if content_len < MIN_CONTENT_LENGTH {
            return Err(SkipReason::ContentTooShort(content_len));
        }

        let country = self.country.ok_or(SkipReason::MissingField("country"))?;
        if country.trim().is_empty() {
            return Err(SkipReason::BlankField("country"));
        }

        let categories = self
            .categories
            .ok_or(SkipReason::MissingField("categories"))?;
        if categories.is_empty() {
            return Err(SkipReason::BlankField("categories"));
        }

        Ok(CheckedRecord {
            title,
            content,
            country,
            categories,
            created_at: self.created_at.ok_or(SkipReason::MissingField("createdAt"))?,
            rating: self.rating.ok_or(SkipReason::MissingField("rating"))?,
            user_id: self.user_id.ok_or(SkipReason::MissingField("userId"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub success_message: String,
    pub error_message: String,
}

impl UploadSummary {
    pub fn new(succeeded: usize, failed: usize) -> Self {
        Self {
            success_message: format!("Posts successfully uploaded from file: {}", succeeded),
            error_message: format!("Posts uploading failed: {}", failed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PostRecord {
        PostRecord {
            title: Some("Carpathians".into()),
            content: Some("Three days on the ridge".into()),
            country: Some("Ukraine".into()),
            categories: Some(vec!["hiking".into()]),
            created_at: NaiveDate::from_ymd_opt(2025, 12, 1),
            rating: Some(4.0),
            user_id: Some(1),
        }
    }

    #[test]
    fn complete_record_passes() {
        let checked = complete().check().unwrap();
        assert_eq!(checked.user_id, 1);
        assert_eq!(checked.rating, 4.0);
    }

    #[test]
    fn short_content_is_skipped() {
        let mut record = complete();
        record.content = Some("tiny!".into());

        assert_eq!(record.check(), Err(SkipReason::ContentTooShort(5)));
    }

    #[test]
    fn missing_rating_is_skipped() {
        let mut record = complete();
        record.rating = None;

        assert_eq!(record.check(), Err(SkipReason::MissingField("rating")));
    }

    #[test]
    fn empty_categories_are_skipped() {
        let mut record = complete();
        record.categories = Some(vec![]);

        assert_eq!(record.check(), Err(SkipReason::BlankField("categories")));
    }

    #[test]
    fn summary_embeds_counts() {
        let summary = UploadSummary::new(1, 2);

        assert_eq!(summary.success_message, "Posts successfully uploaded from file: 1");
        assert_eq!(summary.error_message, "Posts uploading failed: 2");
    }
}
