//! Post filtering. Every criterion is optional: an unset field adds no
//! constraint, a set field narrows the result. Present criteria are joined
//! with AND.

use super::{DomainError, Post};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single test over a post.
pub type PostPredicate = Box<dyn Fn(&Post) -> bool + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostFilter {
    pub country: Option<String>,
    pub category: Option<String>,
    pub created_after: Option<NaiveDate>,
    pub min_rating: Option<f64>,
    pub user_id: Option<i64>,
}

/// Filter plus the requested page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    #[serde(flatten)]
    pub filter: PostFilter,
    /// Zero-based page index.
    pub from: i64,
    pub size: i64,
}

impl PostQuery {
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        if self.from < 0 {
            errors.push("from: page number cannot be negative".to_string());
        }
        if self.size < 1 {
            errors.push("size: page size must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::ValidationFailed(errors))
        }
    }

    pub fn offset(&self) -> i64 {
        self.from.saturating_mul(self.size)
    }
}

pub fn has_country(country: Option<String>) -> Option<PostPredicate> {
    country.map(|country| Box::new(move |post: &Post| post.country == country) as PostPredicate)
}

pub fn has_category(category: Option<String>) -> Option<PostPredicate> {
    category.map(|category| {
        Box::new(move |post: &Post| post.categories.iter().any(|c| *c == category)) as PostPredicate
    })
}

pub fn is_created_after(date: Option<NaiveDate>) -> Option<PostPredicate> {
    date.map(|date| Box::new(move |post: &Post| post.created_at > date) as PostPredicate)
}

pub fn has_min_rating(min_rating: Option<f64>) -> Option<PostPredicate> {
    min_rating.map(|min| Box::new(move |post: &Post| post.rating >= min) as PostPredicate)
}

pub fn has_user_id(user_id: Option<i64>) -> Option<PostPredicate> {
    user_id.map(|user_id| Box::new(move |post: &Post| post.user_id == user_id) as PostPredicate)
}

impl PostFilter {
    /// Predicates of the criteria that are set, in field order.
    pub fn predicates(&self) -> Vec<PostPredicate> {
        [
            has_country(self.country.clone()),
            has_category(self.category.clone()),
            is_created_after(self.created_after),
            has_min_rating(self.min_rating),
            has_user_id(self.user_id),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Conjunction of all present criteria.
    pub fn to_predicate(&self) -> impl Fn(&Post) -> bool + Send + Sync {
        let predicates = self.predicates();
        move |post| predicates.iter().all(|predicate| predicate(post))
    }

    pub fn is_empty(&self) -> bool {
        self.predicates().is_empty()
    }
}
