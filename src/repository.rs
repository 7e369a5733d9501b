//! Task persistence.
//!
//! Every statement filters on `user_id` together with `id`, so a row that belongs to
//! someone else is indistinguishable from a row that does not exist. Functions take a
//! connection rather than the pool so callers can run them inside a transaction.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::Task;

pub struct TaskRepository;

impl TaskRepository {
    pub async fn create(
        conn: &mut PgConnection,
        user_id: Uuid,
        title: &str,
    ) -> Result<Task, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO task (id, user_id, title, completed)
             VALUES ($1, $2, $3, FALSE)
             RETURNING id, user_id, title, completed, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&mut *conn)
        .await?;

        log::debug!("Created task {} for user {}", task.id, user_id);
        Ok(task)
    }

    /// Owner's tasks, newest first, with an optional completion filter.
    pub async fn list(
        conn: &mut PgConnection,
        user_id: Uuid,
        completed: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT id, user_id, title, completed, created_at, updated_at
             FROM task
             WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(completed)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
    }

    /// Number of the owner's tasks matching the filter, ignoring pagination.
    pub async fn count(
        conn: &mut PgConnection,
        user_id: Uuid,
        completed: Option<bool>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
             FROM task
             WHERE user_id = $1 AND ($2::BOOLEAN IS NULL OR completed = $2)",
        )
        .bind(user_id)
        .bind(completed)
        .fetch_one(&mut *conn)
        .await
    }

    pub async fn find(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT id, user_id, title, completed, created_at, updated_at
             FROM task
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Sets whichever of `title`/`completed` is given. `updated_at` moves only when
    /// at least one field is supplied.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "UPDATE task
             SET title = COALESCE($3, title),
                 completed = COALESCE($4, completed),
                 updated_at = CASE
                     WHEN $3::TEXT IS NULL AND $4::BOOLEAN IS NULL THEN updated_at
                     ELSE now()
                 END
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, title, completed, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(completed)
        .fetch_optional(&mut *conn)
        .await
    }

    pub async fn toggle_complete(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "UPDATE task
             SET completed = NOT completed, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, title, completed, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
