use crate::data::post_repository::PostRepository;
use crate::domain::post::PostResponse;
use crate::domain::{DomainError, Post, PostFilter, PostQuery};
use serde::Serialize;
use std::sync::Arc;

/// One page of search results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredPostsResponse {
    pub items: Vec<PostResponse>,
    pub total_pages: i64,
    pub total_elements: i64,
}

/// Filtered reads over posts: paged search for the API and the full
/// selection for reports.
pub struct PostQueryService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
}

impl PostQueryService {
    pub fn new(post_repo: Arc<dyn PostRepository + Send + Sync>) -> Self {
        Self { post_repo }
    }

    pub async fn search(&self, query: &PostQuery) -> Result<FilteredPostsResponse, DomainError> {
        query.validate()?;

        let (posts, total) = self
            .post_repo
            .search(&query.filter, query.size, query.offset())
            .await?;

        tracing::debug!(
            "Search page {} (size {}) matched {} posts in total",
            query.from,
            query.size,
            total
        );

        Ok(FilteredPostsResponse {
            items: posts.into_iter().map(PostResponse::from).collect(),
            total_pages: total_pages(total, query.size),
            total_elements: total,
        })
    }

    pub async fn export(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        if filter.is_empty() {
            tracing::info!("Exporting all posts, no criteria given");
        }

        let posts = self.post_repo.find_all(filter).await?;

        tracing::debug!("Export selected {} posts", posts.len());

        Ok(posts)
    }
}

fn total_pages(total: i64, size: i64) -> i64 {
    if total <= 0 || size <= 0 {
        0
    } else {
        total / size + i64::from(total % size != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryStore;
    use crate::data::user_repository::UserRepository;
    use crate::domain::post::NewPost;
    use crate::domain::user::UserChanges;
    use chrono::NaiveDate;

    async fn seeded(count: usize) -> (PostQueryService, i64) {
        let store = Arc::new(InMemoryStore::new());
        let user = UserRepository::create(
            store.as_ref(),
            UserChanges {
                name: "Marusia".into(),
                email: "marusia@test.com".into(),
                password_hash: None,
            },
        )
        .await
        .unwrap();

        let posts = (0..count)
            .map(|i| NewPost {
                title: format!("Post {}", i),
                content: "Content long enough".into(),
                country: if i % 3 == 0 { "Canada" } else { "Ukraine" }.into(),
                categories: vec!["travel".into()],
                created_at: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                rating: (i % 5) as f64,
                user_id: user.id,
            })
            .collect();
        store.create_all(posts).await.unwrap();

        (PostQueryService::new(store), user.id)
    }

    fn query(filter: PostFilter, from: i64, size: i64) -> PostQuery {
        PostQuery { filter, from, size }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 1), 1);
        assert_eq!(total_pages(2, i64::MAX), 1);
        assert_eq!(total_pages(i64::MAX, i64::MAX), 1);
        assert_eq!(total_pages(i64::MAX, 2), i64::MAX / 2 + 1);
    }

    #[actix_rt::test]
    async fn largest_page_size_holds_everything() {
        let (service, _) = seeded(2).await;

        let result = service
            .search(&query(PostFilter::default(), 0, i64::MAX))
            .await
            .unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.total_elements, 2);
        assert_eq!(result.total_pages, 1);
    }

    #[actix_rt::test]
    async fn pages_add_up_to_total() {
        let (service, _) = seeded(23).await;
        let filter = PostFilter {
            country: Some("Ukraine".into()),
            ..Default::default()
        };

        let first = service.search(&query(filter.clone(), 0, 4)).await.unwrap();
        let mut seen = 0;
        for page in 0..first.total_pages {
            let result = service.search(&query(filter.clone(), page, 4)).await.unwrap();
            assert!(result.items.iter().all(|p| p.country == "Ukraine"));
            seen += result.items.len() as i64;
        }

        let exported = service.export(&filter).await.unwrap();
        assert_eq!(seen, first.total_elements);
        assert_eq!(exported.len() as i64, first.total_elements);
        assert_eq!(first.total_pages, (first.total_elements + 3) / 4);
    }

    #[actix_rt::test]
    async fn page_past_the_end_is_empty() {
        let (service, _) = seeded(5).await;

        let result = service
            .search(&query(PostFilter::default(), 3, 5))
            .await
            .unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.total_elements, 5);
        assert_eq!(result.total_pages, 1);
    }

    #[actix_rt::test]
    async fn no_matches_means_zero_pages() {
        let (service, _) = seeded(5).await;
        let filter = PostFilter {
            country: Some("Japan".into()),
            ..Default::default()
        };

        let result = service.search(&query(filter, 0, 10)).await.unwrap();

        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 0);
        assert_eq!(result.total_elements, 0);
    }

    #[actix_rt::test]
    async fn invalid_page_size_is_rejected() {
        let (service, _) = seeded(1).await;

        let result = service.search(&query(PostFilter::default(), 0, 0)).await;

        assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
    }

    #[actix_rt::test]
    async fn export_applies_user_filter() {
        let (service, user_id) = seeded(6).await;

        let mine = service
            .export(&PostFilter {
                user_id: Some(user_id),
                min_rating: Some(3.0),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.rating >= 3.0));
    }
}
