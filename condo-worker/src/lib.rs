///! # Condo Worker Library
///!
///! Out-of-band maintenance for the condominium backend.
///!
///! ## Modules
///!
///! - `config`: Environment configuration
///! - `jobs`: Monthly expensa issuance and unit occupancy reconciliation
///! - `scheduler`: Interval loop running the enabled jobs until shutdown

pub mod config;
pub mod jobs;
pub mod scheduler;
