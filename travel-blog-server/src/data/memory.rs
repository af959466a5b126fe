//! In-process store used when no database is configured.
//!
//! Users and posts live behind one lock so that cascading deletes, email
//! uniqueness and batch inserts see a consistent view. Data is lost on
//! restart.

use super::post_repository::PostRepository;
use super::user_repository::UserRepository;
use crate::domain::post::{NewPost, PostChanges};
use crate::domain::user::UserChanges;
use crate::domain::{DomainError, Post, PostFilter, User};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    last_user_id: i64,
    last_post_id: i64,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn insert_post(&mut self, post: NewPost) -> Post {
        self.last_post_id += 1;
        let post = post.into_post(self.last_post_id);
        self.posts.insert(post.id, post.clone());
        post
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: UserChanges) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        if state.email_taken(&user.email, None) {
            return Err(DomainError::DuplicateEmail(user.email));
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let state = self.state.read().await;
        state.users.get(&id).cloned().ok_or(DomainError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        let state = self.state.read().await;
        state
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Err(DomainError::UserNotFound);
        }
        if state.email_taken(&changes.email, Some(id)) {
            return Err(DomainError::DuplicateEmail(changes.email));
        }

        let user = state.users.get_mut(&id).ok_or(DomainError::UserNotFound)?;
        user.name = changes.name;
        user.email = changes.email;
        user.password_hash = changes.password_hash;

        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(DomainError::UserNotFound);
        }
        state.posts.retain(|_, post| post.user_id != id);
        Ok(())
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state.read().await.users.contains_key(&id))
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&post.user_id) {
            return Err(DomainError::DatabaseError(format!(
                "owner {} does not exist",
                post.user_id
            )));
        }
        Ok(state.insert_post(post))
    }

    async fn create_all(&self, posts: Vec<NewPost>) -> Result<Vec<Post>, DomainError> {
        let mut state = self.state.write().await;
        if let Some(orphan) = posts.iter().find(|p| !state.users.contains_key(&p.user_id)) {
            return Err(DomainError::DatabaseError(format!(
                "owner {} does not exist",
                orphan.user_id
            )));
        }

        Ok(posts
            .into_iter()
            .map(|post| state.insert_post(post))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let state = self.state.read().await;
        state.posts.get(&id).cloned().ok_or(DomainError::PostNotFound)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let mut state = self.state.write().await;
        let post = state.posts.get_mut(&id).ok_or(DomainError::PostNotFound)?;
        post.title = changes.title;
        post.content = changes.content;
        post.country = changes.country;
        post.categories = changes.categories;
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        match state.posts.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state.read().await.posts.contains_key(&id))
    }

    async fn search(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError> {
        let matching = PostRepository::find_all(self, filter).await?;
        let total = matching.len() as i64;

        let page = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();

        Ok((page, total))
    }

    async fn find_all(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        let predicate = filter.to_predicate();
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .filter(|post| predicate(post))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn user(email: &str) -> UserChanges {
        UserChanges {
            name: "Marusia".into(),
            email: email.into(),
            password_hash: None,
        }
    }

    fn new_post(user_id: i64, country: &str) -> NewPost {
        NewPost {
            title: "Title".into(),
            content: "Some content here".into(),
            country: country.into(),
            categories: vec!["travel".into()],
            created_at: NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
            rating: 0.0,
            user_id,
        }
    }

    #[actix_rt::test]
    async fn store_rejects_second_owner_of_an_email() {
        let store = InMemoryStore::new();
        UserRepository::create(&store, user("a@x.com")).await.unwrap();

        let result = UserRepository::create(&store, user("a@x.com")).await;

        assert!(matches!(result, Err(DomainError::DuplicateEmail(_))));
    }

    #[actix_rt::test]
    async fn deleting_a_user_removes_its_posts() {
        let store = InMemoryStore::new();
        let owner = UserRepository::create(&store, user("a@x.com")).await.unwrap();
        let other = UserRepository::create(&store, user("b@x.com")).await.unwrap();
        let owned = PostRepository::create(&store, new_post(owner.id, "Ukraine")).await.unwrap();
        let kept = PostRepository::create(&store, new_post(other.id, "Canada")).await.unwrap();

        UserRepository::delete(&store, owner.id).await.unwrap();

        assert!(!PostRepository::exists(&store, owned.id).await.unwrap());
        assert!(PostRepository::exists(&store, kept.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn batch_with_unknown_owner_stores_nothing() {
        let store = InMemoryStore::new();
        let owner = UserRepository::create(&store, user("a@x.com")).await.unwrap();

        let result = store
            .create_all(vec![new_post(owner.id, "Ukraine"), new_post(404, "Canada")])
            .await;

        assert!(result.is_err());
        assert!(PostRepository::find_all(&store, &PostFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_rt::test]
    async fn search_pages_in_id_order() {
        let store = InMemoryStore::new();
        let owner = UserRepository::create(&store, user("a@x.com")).await.unwrap();
        for _ in 0..5 {
            PostRepository::create(&store, new_post(owner.id, "Ukraine")).await.unwrap();
        }

        let (page, total) = store.search(&PostFilter::default(), 2, 2).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 4]);
    }
}
