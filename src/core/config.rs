//! Unified configuration system
//!
//! Consolidates the engine's file-backed configuration structures: shader
//! search paths, Vulkan renderer tuning, asset directories, and the
//! top-level `ApplicationConfig` that composes them. All of these support
//! load/save through the [`Config`] trait (TOML or RON on disk).
//!
//! Runtime-only tuning driven by environment variables (`DVZ_RUN_NFRAMES`,
//! `DVZ_RUN_SCREENSHOT`, `DVZ_NUM_THREADS`) lives in
//! [`crate::runner::RunnerConfig`] instead of here, since it is built once
//! at `Runner::new` from the process environment rather than loaded from a
//! file.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::config::{Config, ConfigError};

/// Shader search-path configuration.
///
/// The catalogue looks for compiled SPIR-V under `shader_dir`, named after
/// the graphics type (e.g. `point.vert.spv`, `point.frag.spv`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Directory containing compiled SPIR-V modules.
    pub shader_dir: String,
}

impl ShaderConfig {
    /// Build a config pointing at an explicit directory.
    pub fn new(shader_dir: impl Into<String>) -> Self {
        Self {
            shader_dir: shader_dir.into(),
        }
    }

    /// Probe a handful of conventional locations for a shader directory,
    /// falling back to `target/shaders` if none exist yet (the directory is
    /// populated by `build.rs` at compile time).
    pub fn with_path_resolution() -> Self {
        let candidates = ["target/shaders", "shaders", "resources/shaders", "./shaders"];
        for dir in candidates {
            if Path::new(dir).is_dir() {
                return Self::new(dir);
            }
        }
        Self::new("target/shaders")
    }

    /// Resolve the path to a compiled shader stage for a given graphics name.
    pub fn stage_path(&self, name: &str, stage: &str) -> String {
        format!("{}/{name}.{stage}.spv", self.shader_dir)
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution()
    }
}

/// Vulkan renderer configuration: instance metadata, validation, and the
/// swapchain-image count that drives dup-Dat and per-image fence sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VulkanRendererConfig {
    /// Application name passed to `vkCreateInstance`.
    pub application_name: String,
    /// Application version (major, minor, patch).
    pub application_version: (u32, u32, u32),
    /// Shader search configuration.
    pub shaders: ShaderConfig,
    /// Preferred number of swapchain images (clamped to what the surface supports).
    pub preferred_image_count: u32,
    /// Enable Vulkan validation layers. `None` means auto-detect from build type.
    pub enable_validation: Option<bool>,
}

impl VulkanRendererConfig {
    /// Create a renderer configuration with the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            application_name: app_name.into(),
            application_version: (1, 0, 0),
            shaders: ShaderConfig::default(),
            preferred_image_count: 3,
            enable_validation: None,
        }
    }

    /// Set the application version.
    pub fn with_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.application_version = (major, minor, patch);
        self
    }

    /// Override the shader search configuration.
    pub fn with_shaders(mut self, shaders: ShaderConfig) -> Self {
        self.shaders = shaders;
        self
    }

    /// Request a specific swapchain image count (still clamped at surface creation).
    pub fn with_preferred_image_count(mut self, count: u32) -> Self {
        self.preferred_image_count = count;
        self
    }

    /// Force validation layers on or off.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = Some(enabled);
        self
    }

    /// Enable validation in debug builds, disable in release.
    pub fn with_auto_validation(mut self) -> Self {
        self.enable_validation = Some(cfg!(debug_assertions));
        self
    }

    /// Validate the configuration, returning a human-readable error on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.application_name.is_empty() {
            return Err("application name cannot be empty".into());
        }
        if !(2..=3).contains(&self.preferred_image_count) {
            return Err("preferred_image_count must be 2 or 3".into());
        }
        Ok(())
    }
}

impl Default for VulkanRendererConfig {
    fn default() -> Self {
        Self::new("vkscene").with_auto_validation()
    }
}

/// Asset-directory configuration for colormap tables, font atlases, and
/// textures loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Base directory for static assets (colormaps, fonts, textures).
    pub assets_dir: String,
    /// Directory holding colormap table PNGs (one row per registered colormap).
    pub colormap_dir: String,
}

impl AssetConfig {
    /// Build an asset configuration with default directories.
    pub fn new() -> Self {
        Self {
            assets_dir: "resources".to_string(),
            colormap_dir: "resources/colormaps".to_string(),
        }
    }

    /// Override the base assets directory.
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level configuration composing renderer and asset settings; this is
/// the structure applications load from `.toml`/`.ron` at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Renderer configuration.
    pub renderer: VulkanRendererConfig,
    /// Asset-directory configuration.
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Build an application configuration for `app_name` with default asset settings.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            renderer: VulkanRendererConfig::new(app_name),
            assets: AssetConfig::default(),
        }
    }

    /// Validate the whole configuration tree.
    pub fn validate(&self) -> Result<(), String> {
        self.renderer.validate()
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::new("vkscene")
    }
}

impl Config for ApplicationConfig {}
