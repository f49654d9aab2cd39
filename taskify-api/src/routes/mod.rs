/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout)
/// - `tasks`: Task CRUD and listing
/// - `stats`: Task statistics
/// - `admin`: Dashboard and user administration
/// - `users`: Legacy aliases for user administration

pub mod admin;
pub mod auth;
pub mod health;
pub mod stats;
pub mod tasks;
pub mod users;
