/// Database layer
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded migration runner
/// - `listing`: search/ordering/pagination shared by list endpoints
///
/// Models live in the `models` module at crate root level.

pub mod listing;
pub mod migrations;
pub mod pool;
