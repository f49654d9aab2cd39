/// Task endpoints
///
/// # Endpoints
///
/// - `GET /task/list` - Search, filter, sort, and paginate tasks
/// - `POST /task/create` - Create a task (caller becomes creator and assignee)
/// - `PUT /task/update/:id` - Update a task
/// - `DELETE /task/delete/:id` - Delete a task
///
/// Listing is scoped by role: members only ever see tasks they created or
/// are assigned, composed as one more AND conjunct with their filters.
///
/// Mutations check existence before ownership, so probing an id that does
/// not exist answers 404 whether or not the caller could have touched it.
/// Every mutation appends an activity-log entry inside the same
/// transaction; for deletes the entry is written first, then the row goes.

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use taskify_shared::models::{
    activity_log::{ActivityAction, ActivityLog},
    pagination::{Meta, Page},
    task::{
        CreateTask, SortBy, SortOrder, Task, TaskFilter, TaskPriority, TaskScope, TaskStatus,
        UpdateTask,
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthUser,
    response,
};

const MAX_TAGS: usize = 10;
const MAX_TAG_LENGTH: usize = 10;

/// Query parameters for the task listing
///
/// Everything is taken as raw text and parsed leniently: a non-numeric
/// `page`, a malformed date, or an off-whitelist `sortBy` falls back to the
/// default instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub created_by: Option<String>,
    /// Comma-separated tag set; matches tasks carrying any of them
    pub tags: Option<String>,
    pub due_date_from: Option<String>,
    pub due_date_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TaskListQuery {
    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            search: self.search.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
            assignee: self.assignee.clone(),
            created_by: self.created_by.clone(),
            tags: self.tags.as_deref().and_then(TaskFilter::parse_tags),
            due_date_from: parse_date(&self.due_date_from),
            due_date_to: parse_date(&self.due_date_to),
        }
    }

    pub fn page(&self) -> Page {
        Page::clamped(parse_i64(&self.page), parse_i64(&self.limit))
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
            .as_deref()
            .and_then(SortBy::parse)
            .unwrap_or_default()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or_default()
    }
}

pub(crate) fn parse_i64(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|s| s.trim().parse().ok())
}

fn parse_date(value: &Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    pub tags: Option<Vec<String>>,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub due_date: Option<DateTime<Utc>>,

    pub tags: Option<Vec<String>>,

    pub assignee: Option<Uuid>,
}

/// Resolves a loaded task against the caller's rights
///
/// Not-found is checked before ownership, so probing an id that does not
/// exist answers 404 regardless of who asks; an existing task the caller
/// cannot touch answers 401 with the given denial message.
fn check_task_access(
    task: Option<Task>,
    caller: &AuthUser,
    denial: &'static str,
) -> Result<Task, ApiError> {
    let task = task.ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    if !task.can_be_modified_by(caller.id, caller.role) {
        return Err(ApiError::Unauthorized(denial.to_string()));
    }

    Ok(task)
}

/// Whether a request carrying an `assignee` field is acceptable
///
/// Reassignment is admin-only; a non-admin submitting the field at all is
/// rejected, even echoing the current value back.
fn assignee_change_permitted(requested: Option<Uuid>, caller: &AuthUser) -> bool {
    requested.is_none() || caller.is_admin()
}

fn validate_tags(tags: &[String]) -> Result<(), ApiError> {
    if tags.len() > MAX_TAGS {
        return Err(ApiError::Validation(format!(
            "At most {} tags are allowed",
            MAX_TAGS
        )));
    }
    if tags.iter().any(|t| t.len() > MAX_TAG_LENGTH) {
        return Err(ApiError::Validation(format!(
            "Tags must be at most {} characters",
            MAX_TAG_LENGTH
        )));
    }
    Ok(())
}

/// List tasks
///
/// Members see their own scope; admins see everything. Unknown filter
/// values (e.g. `status=bogus`) match nothing rather than erroring.
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Response> {
    let filter = query.filter();
    let scope = TaskScope::for_role(caller.role, caller.id);
    let page = query.page();

    let (tasks, total) = Task::list(
        &state.db,
        &filter,
        &scope,
        query.sort_by(),
        query.sort_order(),
        &page,
    )
    .await?;

    Ok(response::ok(
        "Tasks retrieved successfully",
        json!({ "tasks": tasks, "meta": Meta::new(&page, total) }),
    ))
}

/// Create a task
///
/// The caller becomes both creator and assignee; reassignment is a separate
/// admin operation.
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Response> {
    req.validate()?;
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }

    let changes = submitted_create_fields(&req);

    let mut tx = state.db.begin().await?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            tags: req.tags,
            assignee: caller.id,
            created_by: caller.id,
        },
    )
    .await?;

    ActivityLog::append(&mut *tx, task.id, caller.id, ActivityAction::Create, changes).await?;

    tx.commit().await?;

    tracing::info!(task_id = %task.id, user_id = %caller.id, "Task created");

    Ok(response::created(
        "Task created successfully",
        json!({ "task": task }),
    ))
}

/// Update a task
///
/// # Errors
///
/// - `404 Not Found`: no such task (checked before ownership)
/// - `401 Unauthorized`: caller is neither admin nor creator, or a
///   non-admin tried to change the assignee
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Response> {
    req.validate()?;
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }

    let task = check_task_access(
        Task::find_by_id(&state.db, id).await?,
        &caller,
        "You do not have permission to update this task",
    )?;

    if !assignee_change_permitted(req.assignee, &caller) {
        return Err(ApiError::Unauthorized(
            "Only admins can change task assignee".to_string(),
        ));
    }

    let (old, new) = update_change_set(&task, &req);

    let mut tx = state.db.begin().await?;

    let updated = Task::update(
        &mut *tx,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            tags: req.tags,
            assignee: req.assignee,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    ActivityLog::append(
        &mut *tx,
        id,
        caller.id,
        ActivityAction::Update,
        json!({ "old": old, "new": new }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(task_id = %id, user_id = %caller.id, "Task updated");

    Ok(response::ok(
        "Task updated successfully",
        json!({ "task": updated }),
    ))
}

/// Delete a task
///
/// The audit entry (carrying a full snapshot of the task) is appended
/// before the row is deleted, in the same transaction.
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let task = check_task_access(
        Task::find_by_id(&state.db, id).await?,
        &caller,
        "You do not have permission to delete this task",
    )?;

    let mut tx = state.db.begin().await?;

    ActivityLog::append(
        &mut *tx,
        id,
        caller.id,
        ActivityAction::Delete,
        json!({ "deletedTask": task }),
    )
    .await?;

    Task::delete(&mut *tx, id).await?;

    tx.commit().await?;

    tracing::info!(task_id = %id, user_id = %caller.id, "Task deleted");

    Ok(response::ok("Task deleted successfully", json!(null)))
}

/// The fields actually submitted in a create request, for the audit entry
fn submitted_create_fields(req: &CreateTaskRequest) -> JsonValue {
    let mut fields = Map::new();
    fields.insert("title".to_string(), json!(req.title));
    if let Some(ref description) = req.description {
        fields.insert("description".to_string(), json!(description));
    }
    if let Some(status) = req.status {
        fields.insert("status".to_string(), json!(status));
    }
    if let Some(priority) = req.priority {
        fields.insert("priority".to_string(), json!(priority));
    }
    if let Some(due_date) = req.due_date {
        fields.insert("dueDate".to_string(), json!(due_date));
    }
    if let Some(ref tags) = req.tags {
        fields.insert("tags".to_string(), json!(tags));
    }
    JsonValue::Object(fields)
}

/// Old and new values for the fields touched by an update request
fn update_change_set(task: &Task, req: &UpdateTaskRequest) -> (JsonValue, JsonValue) {
    let mut old = Map::new();
    let mut new = Map::new();

    if let Some(ref title) = req.title {
        old.insert("title".to_string(), json!(task.title));
        new.insert("title".to_string(), json!(title));
    }
    if let Some(ref description) = req.description {
        old.insert("description".to_string(), json!(task.description));
        new.insert("description".to_string(), json!(description));
    }
    if let Some(status) = req.status {
        old.insert("status".to_string(), json!(task.status));
        new.insert("status".to_string(), json!(status));
    }
    if let Some(priority) = req.priority {
        old.insert("priority".to_string(), json!(task.priority));
        new.insert("priority".to_string(), json!(priority));
    }
    if let Some(due_date) = req.due_date {
        old.insert("dueDate".to_string(), json!(task.due_date));
        new.insert("dueDate".to_string(), json!(due_date));
    }
    if let Some(ref tags) = req.tags {
        old.insert("tags".to_string(), json!(task.tags));
        new.insert("tags".to_string(), json!(tags));
    }
    if let Some(assignee) = req.assignee {
        old.insert("assignee".to_string(), json!(task.assignee));
        new.insert("assignee".to_string(), json!(assignee));
    }

    (JsonValue::Object(old), JsonValue::Object(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskify_shared::models::user::Role;

    fn sample_task(created_by: Uuid) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: "Quarterly numbers".to_string(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            tags: vec!["work".to_string()],
            assignee: created_by,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags(&vec!["a".to_string(); 10]).is_ok());
        assert!(validate_tags(&vec!["a".to_string(); 11]).is_err());
        assert!(validate_tags(&["elevenchars".to_string()]).is_err());
        assert!(validate_tags(&[]).is_ok());
    }

    #[test]
    fn test_create_request_validation() {
        let valid = CreateTaskRequest {
            title: "T".to_string(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            tags: None,
        };
        assert!(valid.validate().is_ok());

        let empty_title = CreateTaskRequest {
            title: String::new(),
            ..valid_request()
        };
        assert!(empty_title.validate().is_err());

        let long_title = CreateTaskRequest {
            title: "t".repeat(101),
            ..valid_request()
        };
        assert!(long_title.validate().is_err());
    }

    fn valid_request() -> CreateTaskRequest {
        CreateTaskRequest {
            title: "T".to_string(),
            description: None,
            status: None,
            priority: None,
            due_date: None,
            tags: None,
        }
    }

    #[test]
    fn test_list_query_filter_mapping() {
        let query = TaskListQuery {
            search: Some("report".to_string()),
            tags: Some("work, home".to_string()),
            due_date_from: Some("2026-08-01T00:00:00Z".to_string()),
            ..Default::default()
        };

        let filter = query.filter();
        assert_eq!(filter.search.as_deref(), Some("report"));
        assert_eq!(
            filter.tags,
            Some(vec!["work".to_string(), "home".to_string()])
        );
        assert!(filter.status.is_none());
        assert!(filter.due_date_from.is_some());
    }

    #[test]
    fn test_list_query_is_lenient_on_malformed_values() {
        // bad numerics, dates, and sort keys fall back to defaults instead
        // of rejecting the request
        let query = TaskListQuery {
            page: Some("abc".to_string()),
            limit: Some("-3".to_string()),
            due_date_from: Some("not-a-date".to_string()),
            sort_by: Some("id; DROP TABLE".to_string()),
            sort_order: Some("upwards".to_string()),
            ..Default::default()
        };

        let page = query.page();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1); // -3 parses, then clamps to the floor
        assert!(query.filter().due_date_from.is_none());
        assert_eq!(query.sort_by(), SortBy::CreatedAt);
        assert_eq!(query.sort_order(), SortOrder::Desc);

        let query = TaskListQuery {
            page: Some("3".to_string()),
            limit: Some("25".to_string()),
            sort_by: Some("dueDate".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        assert_eq!(query.page().offset(), 50);
        assert_eq!(query.sort_by(), SortBy::DueDate);
        assert_eq!(query.sort_order(), SortOrder::Asc);
    }

    #[test]
    fn test_missing_task_is_not_found_before_ownership() {
        // a nonexistent id answers 404 no matter who asks
        for role in [Role::Member, Role::Admin] {
            let caller = AuthUser {
                id: Uuid::new_v4(),
                role,
            };
            let result = check_task_access(None, &caller, "denied");
            assert!(matches!(result, Err(ApiError::NotFound(_))));
        }
    }

    #[test]
    fn test_existing_task_denies_non_owner_with_specific_message() {
        let task = sample_task(Uuid::new_v4());
        let stranger = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Member,
        };

        let result = check_task_access(
            Some(task.clone()),
            &stranger,
            "You do not have permission to update this task",
        );
        match result {
            Err(ApiError::Unauthorized(msg)) => {
                assert_eq!(msg, "You do not have permission to update this task")
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }

        // creator and admin both pass
        let creator = AuthUser {
            id: task.created_by,
            role: Role::Member,
        };
        assert!(check_task_access(Some(task.clone()), &creator, "denied").is_ok());

        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(check_task_access(Some(task), &admin, "denied").is_ok());
    }

    #[test]
    fn test_assignee_field_is_admin_only() {
        let member = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Member,
        };
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };

        // a member submitting the field is rejected even with a no-op value
        assert!(!assignee_change_permitted(Some(member.id), &member));
        assert!(!assignee_change_permitted(Some(Uuid::new_v4()), &member));

        assert!(assignee_change_permitted(None, &member));
        assert!(assignee_change_permitted(Some(Uuid::new_v4()), &admin));
    }

    #[test]
    fn test_update_change_set_tracks_only_submitted_fields() {
        let task = sample_task(Uuid::new_v4());
        let req = UpdateTaskRequest {
            title: None,
            description: None,
            status: Some(TaskStatus::Done),
            priority: None,
            due_date: None,
            tags: None,
            assignee: None,
        };

        let (old, new) = update_change_set(&task, &req);

        assert_eq!(old["status"], "todo");
        assert_eq!(new["status"], "done");
        assert!(old.get("title").is_none());
        assert!(new.get("priority").is_none());
    }

    #[test]
    fn test_submitted_create_fields_skips_missing() {
        let req = CreateTaskRequest {
            title: "T".to_string(),
            description: None,
            status: None,
            priority: Some(TaskPriority::High),
            due_date: None,
            tags: None,
        };

        let changes = submitted_create_fields(&req);
        assert_eq!(changes["title"], "T");
        assert_eq!(changes["priority"], "high");
        assert!(changes.get("description").is_none());
    }

    #[test]
    fn test_modification_rights() {
        let creator = Uuid::new_v4();
        let task = sample_task(creator);

        assert!(task.can_be_modified_by(creator, Role::Member));
        assert!(task.can_be_modified_by(Uuid::new_v4(), Role::Admin));
        assert!(!task.can_be_modified_by(Uuid::new_v4(), Role::Member));
    }
}
