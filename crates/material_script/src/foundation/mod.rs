//! Foundation module - Core utilities and types
//!
//! - Color math on top of nalgebra
//! - Handle-based collections
//! - Logging setup

pub mod math;
pub mod collections;
pub mod logging;
