/// Request middleware
///
/// - `auth`: the access guard applied to every protected route group

pub mod auth;
