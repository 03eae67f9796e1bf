//! Static asset loading: PNG-backed textures, colormap tables, font atlases.
//!
//! This is deliberately thin: the engine itself is not a general asset
//! pipeline (no hot reload, no format registry). It decodes PNGs into
//! `ImageData` the resource manager can upload, nothing more.

pub mod image_loader;

pub use image_loader::ImageData;

use thiserror::Error;

/// Asset loading errors.
#[derive(Error, Debug)]
pub enum AssetError {
    /// Failed to decode or read an asset.
    #[error("failed to load asset: {0}")]
    LoadFailed(String),

    /// IO error while reading an asset from disk.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
