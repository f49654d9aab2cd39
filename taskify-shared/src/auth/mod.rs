/// Authentication primitives for Taskify
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: JWT token generation and validation
///
/// Tokens are stateless but never trusted alone: the API's access guard
/// re-checks the decoded identity and role against the live user row, so a
/// demoted or blocked user's outstanding tokens stop working immediately.

pub mod jwt;
pub mod password;
