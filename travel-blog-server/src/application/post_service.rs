use crate::application::notification::{post_created_message, NotificationPublisher};
use crate::data::post_repository::PostRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::post::{ExtendedPostResponse, NewPost, PostResponse, SavePostRequest};
use crate::domain::user::UserResponse;
use crate::domain::DomainError;
use chrono::Utc;
use std::sync::Arc;

pub struct PostService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    notifier: Arc<dyn NotificationPublisher>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        notifier: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            notifier,
        }
    }

    pub async fn create_post(&self, req: SavePostRequest) -> Result<PostResponse, DomainError> {
        let valid = req.validate()?;

        let author = self.user_repo.find_by_id(valid.user_id).await?;

        let new_post = NewPost::new(valid.changes, author.id, Utc::now().date_naive());
        let post = self.post_repo.create(new_post).await?;

        if post.id == 0 {
            return Err(DomainError::CreationFailed(
                "Failed to create post".to_string(),
            ));
        }

        tracing::info!("Post created: id={}, user_id={}", post.id, author.id);

        self.notifier.publish(post_created_message(&post, &author));

        Ok(PostResponse::from(post))
    }

    pub async fn get_post(&self, id: i64) -> Result<ExtendedPostResponse, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        let author = self.user_repo.find_by_id(post.user_id).await?;

        Ok(ExtendedPostResponse::new(post, UserResponse::from(author)))
    }

    /// Replaces title, content, country and categories. The owner named in
    /// the request is validated but never reassigned.
    pub async fn update_post(
        &self,
        id: i64,
        req: SavePostRequest,
    ) -> Result<PostResponse, DomainError> {
        let valid = req.validate()?;

        let updated_post = self.post_repo.update(id, valid.changes).await?;

        tracing::info!("Post updated: id={}", id);

        Ok(PostResponse::from(updated_post))
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), DomainError> {
        if !self.post_repo.exists(id).await? {
            return Err(DomainError::PostNotFound);
        }

        self.post_repo.delete(id).await?;

        tracing::info!("Post deleted: id={}", id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notification::testing::RecordingPublisher;
    use crate::data::memory::InMemoryStore;
    use crate::domain::user::UserChanges;

    struct Fixture {
        service: PostService,
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingPublisher>,
        user_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingPublisher::default());
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

        Fixture {
            service: PostService::new(store.clone(), store.clone(), notifier.clone()),
            store,
            notifier,
            user_id: user.id,
        }
    }

    fn request(user_id: i64) -> SavePostRequest {
        SavePostRequest {
            title: Some("Test Title".into()),
            content: Some("Test Content".into()),
            country: Some("Ukraine".into()),
            categories: Some(vec!["travel".into(), "city".into()]),
            user_id: Some(user_id),
        }
    }

    #[actix_rt::test]
    async fn create_sets_date_rating_and_notifies_author() {
        let f = fixture().await;

        let post = f.service.create_post(request(f.user_id)).await.unwrap();

        assert!(post.id > 0);
        assert_eq!(post.rating, 0.0);
        assert_eq!(post.created_at, Utc::now().date_naive());
        assert_eq!(post.categories, vec!["travel", "city"]);

        let messages = f.notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].subject, "New post published: Test Title");
        assert_eq!(messages[0].recipients_emails, vec!["marusia@test.com"]);
    }

    #[actix_rt::test]
    async fn create_for_unknown_user_is_not_found() {
        let f = fixture().await;

        let result = f.service.create_post(request(999)).await;

        assert!(matches!(result, Err(DomainError::UserNotFound)));
        assert!(f.notifier.messages.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn get_embeds_author() {
        let f = fixture().await;
        let created = f.service.create_post(request(f.user_id)).await.unwrap();

        let post = f.service.get_post(created.id).await.unwrap();

        assert_eq!(post.author.id, f.user_id);
        assert_eq!(post.author.name, "Marusia");
        assert_eq!(post.author.email, "marusia@test.com");
    }

    #[actix_rt::test]
    async fn update_keeps_owner_and_creation_date() {
        let f = fixture().await;
        let created = f.service.create_post(request(f.user_id)).await.unwrap();

        let mut changes = request(f.user_id);
        changes.title = Some("Updated title".into());
        changes.country = Some("Canada".into());
        changes.categories = Some(vec!["photography".into(), "adventure".into()]);

        let updated = f.service.update_post(created.id, changes).await.unwrap();

        assert_eq!(updated.title, "Updated title");
        assert_eq!(updated.country, "Canada");
        assert_eq!(updated.user_id, f.user_id);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[actix_rt::test]
    async fn update_of_unknown_post_is_not_found() {
        let f = fixture().await;

        let result = f.service.update_post(999, request(f.user_id)).await;

        assert!(matches!(result, Err(DomainError::PostNotFound)));
    }

    #[actix_rt::test]
    async fn delete_then_exists_is_false() {
        let f = fixture().await;
        let created = f.service.create_post(request(f.user_id)).await.unwrap();

        assert!(matches!(
            f.service.delete_post(999).await,
            Err(DomainError::PostNotFound)
        ));

        f.service.delete_post(created.id).await.unwrap();

        assert!(!PostRepository::exists(f.store.as_ref(), created.id)
            .await
            .unwrap());
    }
}
