/// Admin endpoints
///
/// # Endpoints
///
/// - `GET /admin/dashboard/overview` - Dashboard aggregates
/// - `GET /admin/tasks` - All tasks with usernames resolved
/// - `PATCH /admin/tasks/:task_id/assign` - Reassign a task
/// - `POST /admin/users` - Create a user
/// - `GET /admin/users` - List users
/// - `PUT /admin/users/:id` - Update a user
/// - `DELETE /admin/users/:id` - Delete a user
/// - `PATCH /admin/users/:id/role` - Change a user's role
///
/// User administration holds two invariants: an admin can never delete
/// their own account, and the system can never be left without an admin
/// (the last admin can neither be deleted nor demoted).

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use taskify_shared::{
    auth::password,
    models::{
        activity_log::{ActivityAction, ActivityLog},
        pagination::{Meta, Page},
        task::{Task, TaskScope},
        user::{CreateUser, Role, UpdateUser, User, UserFilter, UserStatus},
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthUser,
    response,
    routes::stats::{priority_map, status_map},
    routes::tasks::{parse_i64, TaskListQuery},
};

/// Number of recent tasks and users shown on the dashboard
const RECENT_LIMIT: i64 = 5;

/// Query parameters for the user listing
///
/// `page` and `limit` are taken as raw text and parsed leniently, like the
/// task listing: non-numeric values fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserListQuery {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl UserListQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            status: self.status.clone(),
        }
    }

    fn page(&self) -> Page {
        Page::clamped(parse_i64(&self.page), parse_i64(&self.limit))
    }
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 30, message = "Username must be between 1 and 30 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    pub role: Option<Role>,

    pub status: Option<UserStatus>,
}

/// Update user request (admin)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 30, message = "Username must be between 1 and 30 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub status: Option<UserStatus>,
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Task assignment request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTaskRequest {
    pub assignee_id: Uuid,
}

/// Whether the caller may delete the target user
///
/// Self-deletion is never allowed, and an admin cannot be deleted when no
/// other admin would remain.
fn user_delete_guard(
    caller_id: Uuid,
    target: &User,
    admin_count: i64,
) -> Result<(), &'static str> {
    if target.id == caller_id {
        return Err("Cannot delete your own account");
    }
    if target.role == Role::Admin && admin_count <= 1 {
        return Err("Cannot delete the last admin user");
    }
    Ok(())
}

/// Whether the target user may be moved to the new role
///
/// Demoting the last admin is rejected: the system must always keep at
/// least one admin.
fn role_change_guard(target: &User, new_role: Role, admin_count: i64) -> Result<(), &'static str> {
    if target.role == Role::Admin && new_role == Role::Member && admin_count <= 1 {
        return Err("Cannot demote the last admin user");
    }
    Ok(())
}

/// Dashboard overview
///
/// All seven aggregates run concurrently against the full (unscoped) data
/// set.
pub async fn dashboard_overview(State(state): State<AppState>) -> ApiResult<Response> {
    let scope = TaskScope::All;

    let (total_users, total_tasks, by_status, by_priority, overdue, recent_tasks, recent_users) =
        tokio::try_join!(
            User::count(&state.db),
            Task::count(&state.db),
            Task::count_by_status(&state.db, &scope),
            Task::count_by_priority(&state.db, &scope),
            Task::count_overdue(&state.db, &scope),
            Task::list_recent_with_users(&state.db, RECENT_LIMIT),
            User::list_recent(&state.db, RECENT_LIMIT),
        )?;

    Ok(response::ok(
        "Dashboard data retrieved successfully",
        json!({
            "totalUsers": total_users,
            "totalTasks": total_tasks,
            "tasksByStatus": status_map(&by_status),
            "tasksByPriority": priority_map(&by_priority),
            "overdueTasks": overdue,
            "recentTasks": recent_tasks,
            "recentUsers": recent_users,
        }),
    ))
}

/// List all tasks with assignee and creator usernames resolved
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Response> {
    let filter = query.filter();
    let page = query.page();

    let (tasks, total) = Task::list_with_users(&state.db, &filter, &page).await?;

    Ok(response::ok(
        "Tasks retrieved successfully",
        json!({ "tasks": tasks, "meta": Meta::new(&page, total) }),
    ))
}

/// Reassign a task to another user
///
/// # Errors
///
/// - `404 Not Found`: no such task, or no such assignee
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignTaskRequest>,
) -> ApiResult<Response> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    User::find_by_id(&state.db, req.assignee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut tx = state.db.begin().await?;

    let updated = Task::update_assignee(&mut *tx, task_id, req.assignee_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    ActivityLog::append(
        &mut *tx,
        task_id,
        caller.id,
        ActivityAction::Update,
        json!({
            "old": { "assignee": task.assignee },
            "new": { "assignee": req.assignee_id },
        }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(task_id = %task_id, assignee = %req.assignee_id, "Task reassigned");

    Ok(response::ok(
        "Task assigned successfully",
        json!({ "task": updated }),
    ))
}

/// Create a user
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or email/username already taken
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Response> {
    req.validate()?;
    password::validate_password_strength(&req.password).map_err(ApiError::Validation)?;

    let email = req.email.trim().to_lowercase();

    if User::email_or_username_exists(&state.db, &email, &req.username).await? {
        return Err(ApiError::BadRequest(
            "User with this email or username already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            username: req.username,
            role: req.role.unwrap_or(Role::Member),
            status: req.status.unwrap_or(UserStatus::Active),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User created by admin");

    Ok(response::created(
        "User created successfully",
        json!({ "user": user }),
    ))
}

/// List users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Response> {
    let filter = query.filter();
    let page = query.page();

    let (users, total) = User::list(&state.db, &filter, &page).await?;

    Ok(response::ok(
        "Users retrieved successfully",
        json!({ "users": users, "meta": Meta::new(&page, total) }),
    ))
}

/// Update a user's profile fields
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Response> {
    req.validate()?;

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            username: req.username,
            email: req.email.map(|e| e.trim().to_lowercase()),
            status: req.status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(response::ok(
        "User updated successfully",
        json!({ "user": user }),
    ))
}

/// Delete a user
///
/// # Errors
///
/// - `400 Bad Request`: caller targeting themselves, or target is the last
///   admin
/// - `404 Not Found`: no such user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let admin_count = User::count_admins(&state.db).await?;
    user_delete_guard(caller.id, &target, admin_count)
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    User::delete(&state.db, id).await?;

    tracing::info!(user_id = %id, deleted_by = %caller.id, "User deleted");

    Ok(response::ok("User deleted successfully", json!(null)))
}

/// Change a user's role
///
/// Demoting the last admin is rejected for the same reason deleting them
/// is: the system must always keep at least one admin.
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Response> {
    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let admin_count = User::count_admins(&state.db).await?;
    role_change_guard(&target, req.role, admin_count)
        .map_err(|msg| ApiError::BadRequest(msg.to_string()))?;

    let user = User::update_role(&state.db, id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %id, role = %req.role.as_str(), "User role updated");

    Ok(response::ok(
        "User role updated successfully",
        json!({ "user": user }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "user@example.com".to_string(),
            password_hash: String::new(),
            username: "user".to_string(),
            role,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_delete_guard_rejects_self_deletion() {
        let target = sample_user(Role::Admin);

        assert_eq!(
            user_delete_guard(target.id, &target, 5),
            Err("Cannot delete your own account")
        );
    }

    #[test]
    fn test_delete_guard_protects_last_admin() {
        let target = sample_user(Role::Admin);
        let caller_id = Uuid::new_v4();

        assert_eq!(
            user_delete_guard(caller_id, &target, 1),
            Err("Cannot delete the last admin user")
        );

        // another admin remains, so deletion goes through
        assert!(user_delete_guard(caller_id, &target, 2).is_ok());

        // members are never protected by the admin count
        let member = sample_user(Role::Member);
        assert!(user_delete_guard(caller_id, &member, 1).is_ok());
    }

    #[test]
    fn test_role_change_guard_protects_last_admin() {
        let admin = sample_user(Role::Admin);

        assert_eq!(
            role_change_guard(&admin, Role::Member, 1),
            Err("Cannot demote the last admin user")
        );

        assert!(role_change_guard(&admin, Role::Member, 2).is_ok());

        // re-asserting the same role is a no-op, not a demotion
        assert!(role_change_guard(&admin, Role::Admin, 1).is_ok());

        // promoting a member is always fine
        let member = sample_user(Role::Member);
        assert!(role_change_guard(&member, Role::Admin, 1).is_ok());
    }

    #[test]
    fn test_user_list_query_page_is_lenient() {
        let query = UserListQuery {
            page: Some("two".to_string()),
            limit: Some("9999".to_string()),
            ..Default::default()
        };

        let page = query.page();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn test_create_user_request_validation() {
        let valid = CreateUserRequest {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "Passw0rd".to_string(),
            role: None,
            status: None,
        };
        assert!(valid.validate().is_ok());

        let bad = CreateUserRequest {
            username: String::new(),
            email: "bob@example.com".to_string(),
            password: "Passw0rd".to_string(),
            role: None,
            status: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_user_list_query_maps_to_filter() {
        let query = UserListQuery {
            role: Some("admin".to_string()),
            status: Some("active".to_string()),
            ..Default::default()
        };

        let filter = query.filter();
        assert_eq!(filter.role.as_deref(), Some("admin"));
        assert_eq!(filter.status.as_deref(), Some("active"));
        assert!(filter.username.is_none());
    }
}
