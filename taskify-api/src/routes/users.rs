/// Legacy user endpoints
///
/// # Endpoints
///
/// - `GET /users` - List users
/// - `PATCH /users/:id/role` - Change a user's role
///
/// Older clients reach user administration at the root instead of under
/// `/admin/users`. Both paths are admin-only and share the same handlers;
/// these re-exports exist so the router can mount them separately.

pub use super::admin::{list_users, update_user_role};
