//! Test fixtures for route-risk.
//!
//! Provides:
//! - Real UK / North Sea port locations
//! - In-process collaborators (geocoder, router, weather, renderer) that
//!   count their calls instead of touching the network

pub mod mocks;
pub mod ports;

pub use mocks::*;
pub use ports::*;
