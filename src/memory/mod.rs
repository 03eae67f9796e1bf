//! Pooled GPU memory suballocation.
//!
//! A small, fixed set of typed [`Buffer`]s (one per `usage ×
//! memory-properties` combination) back every [`BufferRegions`] handle
//! the resource manager and transfer engine allocate. Buffers grow by
//! reallocate-and-copy; they never shrink.

mod allocator;
mod buffer;

pub use allocator::{BufferKind, BufferRegions, MemoryAllocator, MemoryError};
pub use buffer::Buffer;
