/// Database models for Taskify
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts with role and status
/// - `task`: Work items and the role-scoped query engine
/// - `activity_log`: Append-only audit trail of task mutations
/// - `pagination`: Page clamping and response metadata
///
/// # Example
///
/// ```no_run
/// use taskify_shared::models::task::{Task, TaskFilter, TaskScope, SortBy, SortOrder};
/// use taskify_shared::models::pagination::Page;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, me: Uuid) -> Result<(), sqlx::Error> {
/// let (tasks, total) = Task::list(
///     &pool,
///     &TaskFilter::default(),
///     &TaskScope::Member(me),
///     SortBy::CreatedAt,
///     SortOrder::Desc,
///     &Page::clamped(Some(1), Some(10)),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod activity_log;
pub mod pagination;
pub mod task;
pub mod user;
