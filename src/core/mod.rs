//! Core engine module
//!
//! Shared abstractions used throughout the engine: configuration and the
//! crate-wide error type. Everything else (`foundation`, `vk`, `memory`,
//! `resources`, `transfer`, `graphics`, `visual`, `scene`, `runner`) lives
//! in its own top-level module and depends only on these two.

pub mod config;
pub mod error;

pub use crate::foundation;
pub use crate::assets;

pub use config::{ApplicationConfig, AssetConfig, Config, ConfigError, ShaderConfig, VulkanRendererConfig};
pub use error::{EngineError, EngineResult};
