/// Task statistics endpoints
///
/// # Endpoints
///
/// - `GET /stats/overview` - Counts by status and priority, plus overdue
///
/// The overview respects the caller's scope: members get statistics over
/// their own tasks only, admins over everything. The three aggregates run
/// concurrently.

use axum::{extract::State, response::Response, Extension};
use serde_json::{json, Map, Value as JsonValue};
use taskify_shared::models::task::{
    PriorityCount, StatusCount, Task, TaskPriority, TaskScope, TaskStatus,
};

use crate::{app::AppState, error::ApiResult, middleware::auth::AuthUser, response};

const ALL_STATUSES: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

const ALL_PRIORITIES: [TaskPriority; 4] = [
    TaskPriority::Low,
    TaskPriority::Medium,
    TaskPriority::High,
    TaskPriority::Critical,
];

/// Task statistics overview
pub async fn overview(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> ApiResult<Response> {
    let scope = TaskScope::for_role(caller.role, caller.id);

    let (by_status, by_priority, overdue) = tokio::try_join!(
        Task::count_by_status(&state.db, &scope),
        Task::count_by_priority(&state.db, &scope),
        Task::count_overdue(&state.db, &scope),
    )?;

    Ok(response::ok(
        "Stats retrieved successfully",
        json!({
            "byStatus": status_map(&by_status),
            "byPriority": priority_map(&by_priority),
            "overdue": overdue,
        }),
    ))
}

/// Expands grouped status counts into a complete map, zero-filling
/// statuses with no rows
pub fn status_map(counts: &[StatusCount]) -> JsonValue {
    let mut map = Map::new();
    for status in ALL_STATUSES {
        let count = counts
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.count)
            .unwrap_or(0);
        map.insert(status.as_str().to_string(), json!(count));
    }
    JsonValue::Object(map)
}

/// Expands grouped priority counts into a complete map, zero-filling
/// priorities with no rows
pub fn priority_map(counts: &[PriorityCount]) -> JsonValue {
    let mut map = Map::new();
    for priority in ALL_PRIORITIES {
        let count = counts
            .iter()
            .find(|c| c.priority == priority)
            .map(|c| c.count)
            .unwrap_or(0);
        map.insert(priority.as_str().to_string(), json!(count));
    }
    JsonValue::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_map_zero_fills() {
        let counts = vec![StatusCount {
            status: TaskStatus::Done,
            count: 7,
        }];

        let map = status_map(&counts);
        assert_eq!(map["todo"], 0);
        assert_eq!(map["in-progress"], 0);
        assert_eq!(map["done"], 7);
    }

    #[test]
    fn test_priority_map_zero_fills() {
        let counts = vec![
            PriorityCount {
                priority: TaskPriority::High,
                count: 3,
            },
            PriorityCount {
                priority: TaskPriority::Low,
                count: 1,
            },
        ];

        let map = priority_map(&counts);
        assert_eq!(map["low"], 1);
        assert_eq!(map["medium"], 0);
        assert_eq!(map["high"], 3);
        assert_eq!(map["critical"], 0);
    }
}
