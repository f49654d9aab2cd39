/// Task model and the role-scoped query engine
///
/// Tasks are the core entity: every task is owned by its creator and
/// assigned to exactly one user (the creator itself at creation time).
/// Listing is driven by [`TaskFilter`] + [`TaskScope`]: user-supplied
/// filters compose as SQL conjuncts, and a non-admin caller's scope is one
/// more conjunct restricting rows to those they created or are assigned —
/// never a replacement for the other filters.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in-progress', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'critical');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'low',
///     due_date TIMESTAMPTZ,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     assignee UUID NOT NULL,
///     created_by UUID NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `assignee` and `created_by` are weak references (no FK): deleting a user
/// leaves their tasks in place, and reads resolve the missing username to
/// "Unknown".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::pagination::Page;
use super::user::Role;

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority
///
/// Enum order matters: Postgres sorts by declaration order, so
/// `ORDER BY priority` ranks low < medium < high < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    /// Title (required, at most 100 characters)
    pub title: String,

    /// Free-text description (at most 1000 characters)
    pub description: String,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Up to 10 tags of up to 10 characters each
    pub tags: Vec<String>,

    /// Owning user (weak reference)
    pub assignee: Uuid,

    /// Creator (weak reference, immutable after creation)
    pub created_by: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A task joined with the usernames of its assignee and creator
///
/// Usernames resolve to "Unknown" when the referenced user no longer
/// exists.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithUsers {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    pub assignee_username: String,

    pub created_by_username: String,
}

/// Input for creating a new task
///
/// Missing optional fields fall back to the schema defaults: empty
/// description, status todo, priority low, no tags.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,

    /// Owning user; on creation this is always the creator
    pub assignee: Uuid,

    pub created_by: Uuid,
}

/// Input for updating a task
///
/// Only non-None fields are written. `created_by` is immutable and has no
/// update field.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub assignee: Option<Uuid>,
}

/// Row visibility for a caller
///
/// Admins see every task; members see only tasks they created or are
/// assigned. The scope composes with user filters as an additional AND
/// conjunct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// No row restriction (admin)
    All,

    /// Restricted to tasks where the user is creator or assignee
    Member(Uuid),
}

impl TaskScope {
    /// Derives the scope for a caller
    pub fn for_role(role: Role, user_id: Uuid) -> Self {
        match role {
            Role::Admin => TaskScope::All,
            Role::Member => TaskScope::Member(user_id),
        }
    }

    /// The scope's SQL conjunct, if any, using a single placeholder
    fn condition(&self, placeholder: usize) -> Option<String> {
        match self {
            TaskScope::All => None,
            TaskScope::Member(_) => Some(format!(
                "(tasks.created_by = ${0} OR tasks.assignee = ${0})",
                placeholder
            )),
        }
    }

    fn member_id(&self) -> Option<Uuid> {
        match self {
            TaskScope::All => None,
            TaskScope::Member(id) => Some(*id),
        }
    }
}

/// Sort keys accepted by the list endpoints
///
/// A whitelist rather than a raw column string: anything else parses to
/// None and callers fall back to the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
}

impl SortBy {
    /// Parses a query-string value; anything off the whitelist is None and
    /// callers fall back to the default
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(SortBy::CreatedAt),
            "updatedAt" => Some(SortBy::UpdatedAt),
            "dueDate" => Some(SortBy::DueDate),
            "priority" => Some(SortBy::Priority),
            "status" => Some(SortBy::Status),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::UpdatedAt => "updated_at",
            SortBy::DueDate => "due_date",
            SortBy::Priority => "priority",
            SortBy::Status => "status",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parses a query-string value; unknown values are None
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filters for the task listings
///
/// Status, priority, assignee, and created_by are matched as raw text
/// (`column::text = $n`) so an unknown value produces an empty result set
/// rather than an error. Tags match with array overlap ("any tag in set").
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring over title and description
    pub search: Option<String>,

    pub status: Option<String>,

    pub priority: Option<String>,

    pub assignee: Option<String>,

    pub created_by: Option<String>,

    pub tags: Option<Vec<String>>,

    /// Inclusive lower bound on due date
    pub due_date_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on due date
    pub due_date_to: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Parses the comma-separated `tags` query value into a tag set
    pub fn parse_tags(raw: &str) -> Option<Vec<String>> {
        let tags: Vec<String> = raw
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if tags.is_empty() {
            None
        } else {
            Some(tags)
        }
    }

    /// Builds the WHERE clause for this filter plus a scope
    ///
    /// Placeholders start at `$1`; returns the clause (empty string when
    /// unfiltered) and the number of binds consumed. Bind order matches
    /// [`bind_task_filter`]: search, status, priority, assignee,
    /// created_by, tags, due_date_from, due_date_to, scope.
    fn where_clause(&self, scope: &TaskScope) -> (String, usize) {
        let mut conditions = Vec::new();
        let mut n = 0usize;

        if self.search.is_some() {
            n += 1;
            conditions.push(format!(
                "(tasks.title ILIKE ${0} OR tasks.description ILIKE ${0})",
                n
            ));
        }
        if self.status.is_some() {
            n += 1;
            conditions.push(format!("tasks.status::text = ${}", n));
        }
        if self.priority.is_some() {
            n += 1;
            conditions.push(format!("tasks.priority::text = ${}", n));
        }
        if self.assignee.is_some() {
            n += 1;
            conditions.push(format!("tasks.assignee::text = ${}", n));
        }
        if self.created_by.is_some() {
            n += 1;
            conditions.push(format!("tasks.created_by::text = ${}", n));
        }
        if self.tags.is_some() {
            n += 1;
            conditions.push(format!("tasks.tags && ${}", n));
        }
        if self.due_date_from.is_some() {
            n += 1;
            conditions.push(format!("tasks.due_date >= ${}", n));
        }
        if self.due_date_to.is_some() {
            n += 1;
            conditions.push(format!("tasks.due_date <= ${}", n));
        }
        if let Some(condition) = scope.condition(n + 1) {
            n += 1;
            conditions.push(condition);
        }

        if conditions.is_empty() {
            (String::new(), 0)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), n)
        }
    }
}

/// Applies a [`TaskFilter`]'s binds (and the scope's) in `where_clause`
/// order.
macro_rules! bind_task_filter {
    ($query:expr, $filter:expr, $scope:expr) => {{
        let mut q = $query;
        if let Some(ref search) = $filter.search {
            q = q.bind(format!("%{}%", search));
        }
        if let Some(ref status) = $filter.status {
            q = q.bind(status.clone());
        }
        if let Some(ref priority) = $filter.priority {
            q = q.bind(priority.clone());
        }
        if let Some(ref assignee) = $filter.assignee {
            q = q.bind(assignee.clone());
        }
        if let Some(ref created_by) = $filter.created_by {
            q = q.bind(created_by.clone());
        }
        if let Some(ref tags) = $filter.tags {
            q = q.bind(tags.clone());
        }
        if let Some(from) = $filter.due_date_from {
            q = q.bind(from);
        }
        if let Some(to) = $filter.due_date_to {
            q = q.bind(to);
        }
        if let Some(member_id) = $scope.member_id() {
            q = q.bind(member_id);
        }
        q
    }};
}

/// Per-status task count
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

/// Per-priority task count
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PriorityCount {
    pub priority: TaskPriority,
    pub count: i64,
}

const TASK_COLUMNS: &str = "tasks.id, tasks.title, tasks.description, tasks.status, \
     tasks.priority, tasks.due_date, tasks.tags, tasks.assignee, tasks.created_by, \
     tasks.created_at, tasks.updated_at";

const USERNAME_JOINS: &str = "LEFT JOIN users assignee_user ON assignee_user.id = tasks.assignee \
     LEFT JOIN users creator_user ON creator_user.id = tasks.created_by";

const USERNAME_COLUMNS: &str =
    "COALESCE(assignee_user.username, 'Unknown') AS assignee_username, \
     COALESCE(creator_user.username, 'Unknown') AS created_by_username";

impl Task {
    /// Whether a caller may update or delete this task
    ///
    /// Admins always may; otherwise only the creator. Assignment alone does
    /// not grant mutation rights.
    pub fn can_be_modified_by(&self, user_id: Uuid, role: Role) -> bool {
        role == Role::Admin || self.created_by == user_id
    }

    /// Creates a new task
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, tags, assignee, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(data.title)
        .bind(data.description.unwrap_or_default())
        .bind(data.status.unwrap_or(TaskStatus::Todo))
        .bind(data.priority.unwrap_or(TaskPriority::Low))
        .bind(data.due_date)
        .bind(data.tags.unwrap_or_default())
        .bind(data.assignee)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE tasks.id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching a filter under a scope, with the total count
    ///
    /// The page of rows and the total count run concurrently against the
    /// same composed predicate.
    pub async fn list(
        pool: &PgPool,
        filter: &TaskFilter,
        scope: &TaskScope,
        sort_by: SortBy,
        sort_order: SortOrder,
        page: &Page,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let (where_clause, bind_count) = filter.where_clause(scope);

        let list_sql = format!(
            "SELECT {} FROM tasks{} ORDER BY tasks.{} {} LIMIT ${} OFFSET ${}",
            TASK_COLUMNS,
            where_clause,
            sort_by.column(),
            sort_order.keyword(),
            bind_count + 1,
            bind_count + 2,
        );
        let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_clause);

        let list_query = bind_task_filter!(sqlx::query_as::<_, Task>(&list_sql), filter, scope)
            .bind(page.limit)
            .bind(page.offset());
        let count_query = bind_task_filter!(sqlx::query_as::<_, (i64,)>(&count_sql), filter, scope);

        let (tasks, (total,)) =
            tokio::try_join!(list_query.fetch_all(pool), count_query.fetch_one(pool))?;

        Ok((tasks, total))
    }

    /// Lists tasks with assignee/creator usernames resolved, newest first
    ///
    /// Used by the admin task listing; missing users render as "Unknown".
    pub async fn list_with_users(
        pool: &PgPool,
        filter: &TaskFilter,
        page: &Page,
    ) -> Result<(Vec<TaskWithUsers>, i64), sqlx::Error> {
        let scope = TaskScope::All;
        let (where_clause, bind_count) = filter.where_clause(&scope);

        let list_sql = format!(
            "SELECT {}, {} FROM tasks {}{} ORDER BY tasks.created_at DESC LIMIT ${} OFFSET ${}",
            TASK_COLUMNS,
            USERNAME_COLUMNS,
            USERNAME_JOINS,
            where_clause,
            bind_count + 1,
            bind_count + 2,
        );
        let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_clause);

        let list_query =
            bind_task_filter!(sqlx::query_as::<_, TaskWithUsers>(&list_sql), filter, &scope)
                .bind(page.limit)
                .bind(page.offset());
        let count_query =
            bind_task_filter!(sqlx::query_as::<_, (i64,)>(&count_sql), filter, &scope);

        let (tasks, (total,)) =
            tokio::try_join!(list_query.fetch_all(pool), count_query.fetch_one(pool))?;

        Ok((tasks, total))
    }

    /// Updates a task
    ///
    /// Only non-None fields are written. Returns None if the task does not
    /// exist. Ownership and assignee-change rules are enforced by the
    /// caller before this runs.
    pub async fn update<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${}", bind_count));
        }
        if data.assignee.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", TASK_COLUMNS));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(assignee) = data.assignee {
            q = q.bind(assignee);
        }

        let task = q.fetch_optional(executor).await?;

        Ok(task)
    }

    /// Reassigns a task to another user (admin operation)
    pub async fn update_assignee<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        assignee: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET assignee = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(assignee)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// The activity-log entry for the deletion is appended before this
    /// runs, inside the same transaction.
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts all tasks
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Task counts grouped by status under a scope
    pub async fn count_by_status(
        pool: &PgPool,
        scope: &TaskScope,
    ) -> Result<Vec<StatusCount>, sqlx::Error> {
        let where_clause = match scope.condition(1) {
            Some(condition) => format!(" WHERE {}", condition),
            None => String::new(),
        };

        let sql = format!(
            "SELECT tasks.status, COUNT(*) AS count FROM tasks{} GROUP BY tasks.status",
            where_clause
        );

        let mut query = sqlx::query_as::<_, StatusCount>(&sql);
        if let Some(member_id) = scope.member_id() {
            query = query.bind(member_id);
        }

        query.fetch_all(pool).await
    }

    /// Task counts grouped by priority under a scope
    pub async fn count_by_priority(
        pool: &PgPool,
        scope: &TaskScope,
    ) -> Result<Vec<PriorityCount>, sqlx::Error> {
        let where_clause = match scope.condition(1) {
            Some(condition) => format!(" WHERE {}", condition),
            None => String::new(),
        };

        let sql = format!(
            "SELECT tasks.priority, COUNT(*) AS count FROM tasks{} GROUP BY tasks.priority",
            where_clause
        );

        let mut query = sqlx::query_as::<_, PriorityCount>(&sql);
        if let Some(member_id) = scope.member_id() {
            query = query.bind(member_id);
        }

        query.fetch_all(pool).await
    }

    /// Counts overdue tasks under a scope
    ///
    /// Overdue means: due date set, due date in the past, status not done.
    pub async fn count_overdue(pool: &PgPool, scope: &TaskScope) -> Result<i64, sqlx::Error> {
        let scope_clause = match scope.condition(1) {
            Some(condition) => format!(" AND {}", condition),
            None => String::new(),
        };

        let sql = format!(
            "SELECT COUNT(*) FROM tasks \
             WHERE tasks.due_date IS NOT NULL AND tasks.due_date < NOW() \
             AND tasks.status <> 'done'{}",
            scope_clause
        );

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(member_id) = scope.member_id() {
            query = query.bind(member_id);
        }

        let (count,) = query.fetch_one(pool).await?;
        Ok(count)
    }

    /// Returns the most recently created tasks with usernames resolved
    pub async fn list_recent_with_users(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<TaskWithUsers>, sqlx::Error> {
        let sql = format!(
            "SELECT {}, {} FROM tasks {} ORDER BY tasks.created_at DESC LIMIT $1",
            TASK_COLUMNS, USERNAME_COLUMNS, USERNAME_JOINS
        );

        sqlx::query_as::<_, TaskWithUsers>(&sql)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_owned_by(created_by: Uuid, assignee: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "T".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Low,
            due_date: None,
            tags: Vec::new(),
            assignee,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_serde_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!(
            serde_json::from_str::<TaskStatus>("\"todo\"").unwrap(),
            TaskStatus::Todo
        );
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_priority_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskPriority::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(TaskPriority::Medium.as_str(), "medium");
    }

    #[test]
    fn test_can_be_modified_by() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let task = task_owned_by(creator, assignee);

        // admins always may
        assert!(task.can_be_modified_by(stranger, Role::Admin));

        // the creator may
        assert!(task.can_be_modified_by(creator, Role::Member));

        // assignment alone grants no mutation rights
        assert!(!task.can_be_modified_by(assignee, Role::Member));
        assert!(!task.can_be_modified_by(stranger, Role::Member));
    }

    #[test]
    fn test_scope_for_role() {
        let id = Uuid::new_v4();
        assert_eq!(TaskScope::for_role(Role::Admin, id), TaskScope::All);
        assert_eq!(TaskScope::for_role(Role::Member, id), TaskScope::Member(id));
    }

    #[test]
    fn test_where_clause_empty_for_admin_without_filters() {
        let (clause, binds) = TaskFilter::default().where_clause(&TaskScope::All);
        assert_eq!(clause, "");
        assert_eq!(binds, 0);
    }

    #[test]
    fn test_where_clause_scope_only() {
        let scope = TaskScope::Member(Uuid::new_v4());
        let (clause, binds) = TaskFilter::default().where_clause(&scope);

        assert_eq!(
            clause,
            " WHERE (tasks.created_by = $1 OR tasks.assignee = $1)"
        );
        assert_eq!(binds, 1);
    }

    #[test]
    fn test_where_clause_scope_is_an_additional_conjunct() {
        // scoping must AND with user filters, not replace them
        let filter = TaskFilter {
            search: Some("report".to_string()),
            status: Some("todo".to_string()),
            tags: Some(vec!["urgent".to_string()]),
            ..Default::default()
        };
        let scope = TaskScope::Member(Uuid::new_v4());
        let (clause, binds) = filter.where_clause(&scope);

        assert_eq!(
            clause,
            " WHERE (tasks.title ILIKE $1 OR tasks.description ILIKE $1) \
             AND tasks.status::text = $2 \
             AND tasks.tags && $3 \
             AND (tasks.created_by = $4 OR tasks.assignee = $4)"
        );
        assert_eq!(binds, 4);
    }

    #[test]
    fn test_where_clause_due_date_range() {
        let filter = TaskFilter {
            due_date_from: Some(Utc::now()),
            due_date_to: Some(Utc::now()),
            ..Default::default()
        };
        let (clause, binds) = filter.where_clause(&TaskScope::All);

        assert_eq!(
            clause,
            " WHERE tasks.due_date >= $1 AND tasks.due_date <= $2"
        );
        assert_eq!(binds, 2);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            TaskFilter::parse_tags("a, b ,c"),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert_eq!(TaskFilter::parse_tags(" , ,"), None);
        assert_eq!(TaskFilter::parse_tags(""), None);
    }

    #[test]
    fn test_sort_by_whitelist() {
        assert_eq!(SortBy::CreatedAt.column(), "created_at");
        assert_eq!(SortBy::UpdatedAt.column(), "updated_at");
        assert_eq!(SortBy::DueDate.column(), "due_date");
        assert_eq!(SortBy::Priority.column(), "priority");
        assert_eq!(SortBy::Status.column(), "status");

        // query-string names are camelCase
        assert_eq!(
            serde_json::from_str::<SortBy>("\"dueDate\"").unwrap(),
            SortBy::DueDate
        );
        assert!(serde_json::from_str::<SortBy>("\"id; DROP TABLE\"").is_err());
    }

    #[test]
    fn test_sort_parse_is_lenient() {
        assert_eq!(SortBy::parse("dueDate"), Some(SortBy::DueDate));
        assert_eq!(SortBy::parse("id; DROP TABLE"), None);
        assert_eq!(SortBy::parse(""), None);

        assert_eq!(SortOrder::parse("asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("descending"), None);
    }

    #[test]
    fn test_sort_defaults() {
        assert_eq!(SortBy::default(), SortBy::CreatedAt);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        assert_eq!(SortOrder::Asc.keyword(), "ASC");
    }

    #[test]
    fn test_task_serializes_camel_case() {
        let task = task_owned_by(Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_value(&task).unwrap();

        assert!(json.get("dueDate").is_some());
        assert!(json.get("createdBy").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("due_date").is_none());
    }
}
