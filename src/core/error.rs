//! Crate-wide error type
//!
//! Each subsystem defines its own `#[derive(thiserror::Error)]` enum; this
//! module composes them into the one error type that crosses module
//! boundaries, the way the Vulkan wrapper's `VulkanError` composes into
//! each layer built on top of it.

use thiserror::Error;

use crate::memory::MemoryError;
use crate::resources::ResourceError;
use crate::transfer::TransferError;
use crate::visual::BakeError;
use crate::runner::RunnerError;
use crate::vk::VulkanError;

/// Top-level error type returned by public engine operations.
///
/// Variants map directly onto the error kinds: `ResourceExhausted`,
/// `Invalid`, `Overflow`, `DeviceLost`, `SwapchainOutOfDate`,
/// `MissingProp`, `NotSupported`.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The memory allocator could not grow a backing buffer to satisfy a request.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Malformed input or a dtype mismatch between a Prop and its target Source.
    #[error("invalid: {0}")]
    Invalid(String),

    /// A requested region falls outside the bounds of its destination.
    #[error("overflow: {0}")]
    Overflow(String),

    /// The Vulkan device was lost; unrecoverable at this layer.
    #[error("device lost")]
    DeviceLost,

    /// The swapchain is out of date or suboptimal; recoverable by recreation.
    #[error("swapchain out of date")]
    SwapchainOutOfDate,

    /// A bake callback required a prop the caller never set and for which no default exists.
    #[error("missing prop: {0}")]
    MissingProp(String),

    /// An optional feature was compiled out (e.g. PNG or video support).
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Raw Vulkan API failure from the wrapper layer.
    #[error(transparent)]
    Vulkan(#[from] VulkanError),

    /// Memory allocator failure.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Resource manager (Dat/Tex) failure.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Transfer engine failure.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Visual/prop/source baking failure.
    #[error(transparent)]
    Bake(#[from] BakeError),

    /// Runner (event loop) failure.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Convenience result alias used across the public API.
pub type EngineResult<T> = Result<T, EngineError>;
