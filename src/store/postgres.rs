//! PostgreSQL-backed document store.
//!
//! DESIGN
//! ======
//! One table per collection. Array membership (`users.lists`,
//! `users.saved_lists`) is maintained with `array_append`/`array_remove`
//! in single statements, so concurrent edits to the same user row do not
//! overwrite each other. Items are kept as a `jsonb` array on the list row
//! because they have no identity outside their list.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{DocumentStore, StoreError, check_batch};
use crate::models::{Item, List, User};

type UserRow = (Uuid, String, String, Vec<Uuid>, Vec<Uuid>);
type ListRow = (Uuid, String, Uuid, Json<Vec<Item>>, Option<String>);

const USER_COLUMNS: &str = "id, email, name, lists, saved_lists";
const LIST_COLUMNS: &str = "id, name, creator_id, items, short_url";

fn user_from_row((id, email, name, lists, saved_lists): UserRow) -> User {
    User { id, email, name, lists, saved_lists }
}

fn list_from_row((id, name, creator_id, Json(items), short_url): ListRow) -> List {
    List { id, name, creator_id, items, short_url }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentStore for PgStore {
    async fn find_user_id_by_email(&self, email: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert_user(&self, email: &str, name: &str) -> Result<Uuid, StoreError> {
        // A concurrent insert for the same email resolves to the existing row.
        let id = sqlx::query_scalar::<_, Uuid>(
            r"INSERT INTO users (email, name)
              VALUES ($1, $2)
              ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
              RETURNING id",
        )
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(user_from_row))
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        check_batch(ids)?;
        let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn set_user_name(&self, id: Uuid, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET lists = array_append(lists, $2) WHERE id = $1 AND NOT ($2 = ANY(lists))",
        )
        .bind(user_id)
        .bind(list_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_owned_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET lists = array_remove(lists, $2) WHERE id = $1")
            .bind(user_id)
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_saved_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r"UPDATE users SET saved_lists = array_append(saved_lists, $2)
              WHERE id = $1 AND NOT ($2 = ANY(saved_lists))",
        )
        .bind(user_id)
        .bind(list_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_saved_list(&self, user_id: Uuid, list_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET saved_lists = array_remove(saved_lists, $2) WHERE id = $1")
            .bind(user_id)
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_saved_list_everywhere(&self, list_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET saved_lists = array_remove(saved_lists, $1) WHERE $1 = ANY(saved_lists)",
        )
        .bind(list_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_list(&self, name: &str, creator_id: Uuid) -> Result<List, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO lists (id, name, creator_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(creator_id)
            .execute(&self.pool)
            .await?;
        Ok(List { id, name: name.to_owned(), creator_id, items: Vec::new(), short_url: None })
    }

    async fn get_list(&self, id: Uuid) -> Result<Option<List>, StoreError> {
        let row = sqlx::query_as::<_, ListRow>(&format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(list_from_row))
    }

    async fn get_lists(&self, ids: &[Uuid]) -> Result<Vec<List>, StoreError> {
        check_batch(ids)?;
        let rows = sqlx::query_as::<_, ListRow>(&format!("SELECT {LIST_COLUMNS} FROM lists WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(list_from_row).collect())
    }

    async fn update_list(&self, list: &List) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE lists SET name = $2, items = $3, updated_at = now() WHERE id = $1")
            .bind(list.id)
            .bind(&list.name)
            .bind(Json(&list.items))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_list_short_url(&self, list_id: Uuid, code: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE lists SET short_url = $2 WHERE id = $1")
            .bind(list_id)
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_list(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn short_url_exists(&self, code: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM short_urls WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_short_url(&self, code: &str, list_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("INSERT INTO short_urls (code, list_id) VALUES ($1, $2) ON CONFLICT (code) DO NOTHING")
            .bind(code)
            .bind(list_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_short_url(&self, code: &str) -> Result<Option<Uuid>, StoreError> {
        let list_id = sqlx::query_scalar::<_, Uuid>("SELECT list_id FROM short_urls WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(list_id)
    }

    async fn delete_short_url(&self, code: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM short_urls WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
