/// User model and database operations
///
/// Users carry a role (admin or member) and a status (active or blocked).
/// The access guard only resolves tokens against active rows, and resolves
/// them by id AND role, so a role change invalidates outstanding tokens.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'member');
/// CREATE TYPE user_status AS ENUM ('active', 'blocked');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     username TEXT NOT NULL DEFAULT '',
///     role user_role NOT NULL DEFAULT 'member',
///     status user_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskify_shared::models::user::{User, CreateUser, Role, UserStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     username: "alice".to_string(),
///     role: Role::Member,
///     status: UserStatus::Active,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::pagination::Page;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every task and user
    Admin,

    /// Access limited to tasks the user created or is assigned
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

/// User account status
///
/// Blocked users keep their rows (and their tasks keep referencing them)
/// but fail the access guard's live lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }
}

/// User model
///
/// The password hash never leaves the server: it is skipped on
/// serialization, so the struct can be embedded in responses directly.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (stored trimmed and lowercased)
    pub email: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub username: String,

    /// Role (admin or member)
    pub role: Role,

    /// Account status (active or blocked)
    pub status: UserStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (caller is responsible for normalization)
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    pub username: String,

    pub role: Role,

    pub status: UserStatus,
}

/// Input for the admin profile update
///
/// Only non-None fields are written. Role changes go through
/// [`User::update_role`] instead.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub status: Option<UserStatus>,
}

/// Filters for the user listings
///
/// Role and status are matched as raw text so an unknown value produces an
/// empty result set rather than an error.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring match on username
    pub username: Option<String>,

    /// Case-insensitive substring match on email
    pub email: Option<String>,

    pub role: Option<String>,

    pub status: Option<String>,
}

impl UserFilter {
    /// Builds the WHERE clause for this filter, with placeholders starting
    /// at `$1`. Bind order matches [`bind_user_filter`].
    fn where_clause(&self) -> String {
        let mut conditions = Vec::new();
        let mut n = 0usize;

        if self.username.is_some() {
            n += 1;
            conditions.push(format!("username ILIKE ${}", n));
        }
        if self.email.is_some() {
            n += 1;
            conditions.push(format!("email ILIKE ${}", n));
        }
        if self.role.is_some() {
            n += 1;
            conditions.push(format!("role::text = ${}", n));
        }
        if self.status.is_some() {
            n += 1;
            conditions.push(format!("status::text = ${}", n));
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        }
    }
}

/// Applies a [`UserFilter`]'s binds to a query in `where_clause` order.
macro_rules! bind_user_filter {
    ($query:expr, $filter:expr) => {{
        let mut q = $query;
        if let Some(ref username) = $filter.username {
            q = q.bind(format!("%{}%", username));
        }
        if let Some(ref email) = $filter.email {
            q = q.bind(format!("%{}%", email));
        }
        if let Some(ref role) = $filter.role {
            q = q.bind(role.clone());
        }
        if let Some(ref status) = $filter.status {
            q = q.bind(status.clone());
        }
        q
    }};
}

const USER_COLUMNS: &str =
    "id, email, password_hash, username, role, status, created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate email (unique constraint) or any
    /// other database failure.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, username, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, username, role, status, created_at, updated_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.username)
        .bind(data.role)
        .bind(data.status)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Resolves a token's identity claim to a live user row
    ///
    /// The lookup filters by id AND the role embedded in the token AND
    /// active status. A demoted or blocked user therefore fails this lookup
    /// even while holding a signed, unexpired token.
    pub async fn find_for_auth(
        pool: &PgPool,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND role = $2 AND status = 'active'",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether an email or username is already taken
    pub async fn email_or_username_exists(
        pool: &PgPool,
        email: &str,
        username: &str,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 OR username = $2)",
        )
        .bind(email)
        .bind(username)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Updates profile fields (username, email, status)
    ///
    /// Only non-None fields are written. Returns None if the user does not
    /// exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Changes a user's role
    ///
    /// Existing tasks keep their assignee/creator references; only the
    /// user's future access changes.
    pub async fn update_role(
        pool: &PgPool,
        id: Uuid,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user
    ///
    /// Tasks referencing the user are left untouched; readers resolve the
    /// dangling reference as "Unknown".
    pub async fn delete<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts users holding the admin role
    ///
    /// Used by the last-admin delete invariant.
    pub async fn count_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Lists users matching a filter, newest first, with the total count
    ///
    /// List and count run concurrently against the same filter.
    pub async fn list(
        pool: &PgPool,
        filter: &UserFilter,
        page: &Page,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let where_clause = filter.where_clause();
        let bind_count = [
            filter.username.is_some(),
            filter.email.is_some(),
            filter.role.is_some(),
            filter.status.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count();

        let list_sql = format!(
            "SELECT {} FROM users{} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            USER_COLUMNS,
            where_clause,
            bind_count + 1,
            bind_count + 2,
        );
        let count_sql = format!("SELECT COUNT(*) FROM users{}", where_clause);

        let list_query = bind_user_filter!(sqlx::query_as::<_, User>(&list_sql), filter)
            .bind(page.limit)
            .bind(page.offset());
        let count_query = bind_user_filter!(sqlx::query_as::<_, (i64,)>(&count_sql), filter);

        let (users, (total,)) =
            tokio::try_join!(list_query.fetch_all(pool), count_query.fetch_one(pool))?;

        Ok((users, total))
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Returns the most recently created users
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1",
            USER_COLUMNS
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Member.as_str(), "member");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"member\"").unwrap(),
            Role::Member
        );
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserStatus::Blocked).unwrap(),
            "\"blocked\""
        );
        assert_eq!(UserStatus::Active.as_str(), "active");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            username: "alice".to_string(),
            role: Role::Member,
            status: UserStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["role"], "member");
    }

    #[test]
    fn test_filter_where_clause_empty() {
        assert_eq!(UserFilter::default().where_clause(), "");
    }

    #[test]
    fn test_filter_where_clause_composition() {
        let filter = UserFilter {
            username: Some("ali".to_string()),
            email: None,
            role: Some("admin".to_string()),
            status: Some("active".to_string()),
        };

        assert_eq!(
            filter.where_clause(),
            " WHERE username ILIKE $1 AND role::text = $2 AND status::text = $3"
        );
    }
}
