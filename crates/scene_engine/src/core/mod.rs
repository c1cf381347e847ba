//! # Core Module
//!
//! Shared configuration for the scene layer.

pub mod config;

pub use config::{AssetPaths, AtlasSize, Config, ConfigError, Platform, ProbeConfig, SceneConfig};
