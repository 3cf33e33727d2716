/// Maintenance jobs
///
/// Each job is safe to re-run: expensa issuance skips units already billed
/// for the month, and occupancy reconciliation only touches units whose
/// state disagrees with their contracts.

pub mod expensas;
pub mod occupancy;

pub use expensas::{issue_monthly_expensas, IssueReport};
pub use occupancy::{reconcile_unit_occupancy, OccupancyReport};
