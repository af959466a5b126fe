use crate::domain::post::{NewPost, PostChanges};
use crate::domain::{DomainError, Post, PostFilter};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    /// Stores the whole batch or nothing.
    async fn create_all(&self, posts: Vec<NewPost>) -> Result<Vec<Post>, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn exists(&self, id: i64) -> Result<bool, DomainError>;
    /// One page of matching posts in id order, plus the total match count.
    async fn search(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError>;
    async fn find_all(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError>;
}

const SNAPSHOT_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY";

const POST_COLUMNS: &str = "id, title, content, country, categories, created_at, rating, user_id";

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        country: row.try_get("country")?,
        categories: row.try_get("categories")?,
        created_at: row.try_get("created_at")?,
        rating: row.try_get("rating")?,
        user_id: row.try_get("user_id")?,
    })
}

/// Appends one `AND` clause per criterion that is set.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    builder.push(" WHERE TRUE");

    if let Some(country) = &filter.country {
        builder.push(" AND country = ").push_bind(country.clone());
    }
    if let Some(category) = &filter.category {
        builder
            .push(" AND ")
            .push_bind(category.clone())
            .push(" = ANY(categories)");
    }
    if let Some(created_after) = filter.created_after {
        builder.push(" AND created_at > ").push_bind(created_after);
    }
    if let Some(min_rating) = filter.min_rating {
        builder.push(" AND rating >= ").push_bind(min_rating);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO posts (title, content, country, categories, created_at, rating, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.country)
        .bind(&post.categories)
        .bind(post.created_at)
        .bind(post.rating)
        .bind(post.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        post_from_row(&row)
    }

    async fn create_all(&self, posts: Vec<NewPost>) -> Result<Vec<Post>, DomainError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;

        let mut stored = Vec::with_capacity(posts.len());
        for post in posts {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO posts (title, content, country, categories, created_at, rating, user_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {}
                "#,
                POST_COLUMNS
            ))
            .bind(post.title)
            .bind(post.content)
            .bind(post.country)
            .bind(post.categories)
            .bind(post.created_at)
            .bind(post.rating)
            .bind(post.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert post batch: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;

            stored.push(post_from_row(&row)?);
        }

        // dropping tx without commit rolls the batch back
        tx.commit().await?;

        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE posts
            SET title = $1, content = $2, country = $3, categories = $4
            WHERE id = $5
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.country)
        .bind(changes.categories)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(exists)
    }

    async fn search(
        &self,
        filter: &PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Post>, i64), DomainError> {
        // Count and page must see the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query(SNAPSHOT_ISOLATION).execute(&mut *tx).await?;

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        // Get the requested page
        let mut page_query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut page_query, filter);
        page_query
            .push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = page_query
            .build()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        tx.commit().await?;

        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<Post>, DomainError>>()?;

        Ok((posts, total))
    }

    async fn find_all(&self, filter: &PostFilter) -> Result<Vec<Post>, DomainError> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut query, filter);
        query.push(" ORDER BY id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.iter().map(post_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::user_repository::{PostgresUserRepository, UserRepository};
    use crate::domain::user::UserChanges;
    use crate::infrastructure::database::{create_pool, run_migrations};
    use chrono::NaiveDate;
    use serial_test::serial;
    use std::sync::Arc;

    fn rendered(filter: &PostFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut builder, filter);
        builder.sql().to_string()
    }

    #[test]
    fn empty_filter_adds_no_clause() {
        assert_eq!(
            rendered(&PostFilter::default()),
            "SELECT COUNT(*) FROM posts WHERE TRUE"
        );
    }

    #[test]
    fn each_present_criterion_adds_one_bound_clause() {
        let filter = PostFilter {
            country: Some("Ukraine".into()),
            category: Some("city".into()),
            created_after: NaiveDate::from_ymd_opt(2025, 1, 1),
            min_rating: Some(3.5),
            user_id: Some(4),
        };

        assert_eq!(
            rendered(&filter),
            "SELECT COUNT(*) FROM posts WHERE TRUE AND country = $1 AND $2 = ANY(categories) \
             AND created_at > $3 AND rating >= $4 AND user_id = $5"
        );
    }

    #[test]
    fn placeholders_follow_present_fields_only() {
        let filter = PostFilter {
            min_rating: Some(2.0),
            user_id: Some(9),
            ..Default::default()
        };

        assert_eq!(
            rendered(&filter),
            "SELECT COUNT(*) FROM posts WHERE TRUE AND rating >= $1 AND user_id = $2"
        );
    }

    /// Runs only when `TEST_DATABASE_URL` points at a disposable database.
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url, 4).await.unwrap();
        run_migrations(&pool).await.unwrap();
        Some(pool)
    }

    #[actix_rt::test]
    #[serial]
    async fn total_agrees_with_page_during_concurrent_inserts() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let users = PostgresUserRepository::new(pool.clone());
        let posts = Arc::new(PostgresPostRepository::new(pool));

        let run = uuid::Uuid::new_v4().to_string();
        let owner_id = users
            .create(UserChanges {
                name: "Marusia".into(),
                email: format!("{}@test.com", run),
                password_hash: None,
            })
            .await
            .unwrap()
            .id;
        let filter = PostFilter {
            country: Some(run.clone()),
            ..Default::default()
        };

        let writer = {
            let posts = posts.clone();
            let country = run.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    posts
                        .create(NewPost {
                            title: format!("Post {}", i),
                            content: "Long enough content".into(),
                            country: country.clone(),
                            categories: vec!["city".into()],
                            created_at: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                            rating: 1.0,
                            user_id: owner_id,
                        })
                        .await
                        .unwrap();
                }
            })
        };

        for _ in 0..50 {
            let (page, total) = posts.search(&filter, i64::MAX, 0).await.unwrap();
            assert_eq!(page.len() as i64, total);
        }

        writer.await.unwrap();
        users.delete(owner_id).await.unwrap();
    }
}
