//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Math types and bounding boxes
//! - Index-stable collections
//! - Logging setup

pub mod collections;
pub mod logging;
pub mod math;
