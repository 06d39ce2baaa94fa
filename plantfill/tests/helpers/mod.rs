//! Test Helper Utilities
//!
//! Shared utilities for testing plantfill

#![allow(dead_code)]

pub mod log_capture;
pub mod mock_server;

// Re-export commonly used items
pub use log_capture::LogCapture;
pub use mock_server::{spawn_server, test_settings, HitCounter};
