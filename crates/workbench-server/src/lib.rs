//! HTTP facade over the workbench core services.
//!
//! The router is built once from an immutable [`WorkbenchConfig`] and every
//! handler delegates to `workbench-core`; the split exists so integration
//! tests can drive the router in-process without binding a socket.

pub mod error;
mod handlers;
pub mod routes;

pub use routes::{app, AppState};
