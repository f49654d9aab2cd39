/// Append-only audit trail of task mutations
///
/// Every create, update, and delete of a task appends exactly one row,
/// inside the same transaction as the mutation. The `changes` payload
/// depends on the action: submitted fields for a create, `{old, new}`
/// snapshots for an update, and `{deletedTask}` for a delete.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE activity_action AS ENUM ('create', 'update', 'delete');
///
/// CREATE TABLE activity_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL,
///     user_id UUID NOT NULL,
///     action activity_action NOT NULL,
///     changes JSONB NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgExecutor;
use uuid::Uuid;

/// The kind of task mutation being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

/// One audit entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,

    /// The task that was mutated (weak reference; survives task deletion)
    pub task_id: Uuid,

    /// The user who performed the mutation
    pub user_id: Uuid,

    pub action: ActivityAction,

    /// Action-specific change payload
    pub changes: JsonValue,

    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Appends an audit entry
    ///
    /// Called with the same transaction as the mutation it records, so the
    /// entry commits exactly when the mutation does.
    pub async fn append<'e>(
        executor: impl PgExecutor<'e>,
        task_id: Uuid,
        user_id: Uuid,
        action: ActivityAction,
        changes: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        let entry = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (task_id, user_id, action, changes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, action, changes, created_at
            "#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(action)
        .bind(changes)
        .fetch_one(executor)
        .await?;

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ActivityAction::Create).unwrap(),
            "\"create\""
        );
        assert_eq!(
            serde_json::from_str::<ActivityAction>("\"delete\"").unwrap(),
            ActivityAction::Delete
        );
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = ActivityLog {
            id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            action: ActivityAction::Update,
            changes: serde_json::json!({"old": {"status": "todo"}, "new": {"status": "done"}}),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();

        assert!(json.get("taskId").is_some());
        assert!(json.get("userId").is_some());
        assert_eq!(json["action"], "update");
        assert_eq!(json["changes"]["new"]["status"], "done");
    }
}
