//! Core services for the CRE workbench backend.
//!
//! Everything the HTTP layer delegates to lives here: configuration
//! resolution, the `.env` key store, the workflow file writer, and the
//! simulation runner. None of these modules know about HTTP.

pub mod config;
pub mod env_store;
pub mod files;
pub mod simulate;

pub use config::{RunMode, WorkbenchConfig};
pub use simulate::{run_simulation, SimulationResult};
