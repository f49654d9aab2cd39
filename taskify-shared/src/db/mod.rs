/// Database utilities
///
/// - `pool`: PostgreSQL connection pool management
/// - `migrations`: embedded schema migration runner

pub mod migrations;
pub mod pool;
