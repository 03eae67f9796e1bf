//! Thin Vulkan wrapper: typed handles over instance/device setup, the
//! window surface, swapchain, synchronization primitives, and shader
//! pipeline objects.
//!
//! Everything here is a straightforward RAII shell around `ash` calls — the
//! engine's actual behavior (pooled suballocation, transfer ordering,
//! baking, scene/controller state machines) lives in the modules built on
//! top of this one (`memory`, `resources`, `transfer`, `graphics`,
//! `visual`, `scene`, `runner`).

pub mod context;
pub mod descriptor;
pub mod shader;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod window;

pub use context::{PhysicalDeviceInfo, VulkanContext, VulkanError, VulkanResult};
pub use descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder};
pub use shader::{GraphicsPipelineDesc, GraphicsPipeline, ShaderModule};
pub use surface::Surface;
pub use swapchain::Swapchain;
pub use sync::{Fence, FrameSync, Semaphore};
pub use window::{Window, WindowBackend};
