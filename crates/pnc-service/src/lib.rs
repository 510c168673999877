//! Shared library surface for the route segment service and its tests.

pub mod backoff;
pub mod config;
pub mod loops;
pub mod sources;
pub mod state;
