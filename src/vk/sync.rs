//! Synchronization primitives: RAII semaphores/fences and the per-frame
//! pair the runner waits on around acquire/submit/present.

use ash::vk;

use super::{VulkanError, VulkanResult};

/// Common memory barrier shapes used by the resource manager and transfer
/// engine when transitioning image layouts or sequencing host/device access.
pub struct MemoryBarrierBuilder;

impl MemoryBarrierBuilder {
    /// Host write visible to a subsequent shader read (uniform buffer updates).
    pub fn buffer_host_write_to_shader_read() -> vk::MemoryBarrier {
        vk::MemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::HOST_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ)
            .build()
    }

    /// Transfer write visible to a subsequent vertex/index read.
    pub fn buffer_transfer_to_vertex_read() -> vk::MemoryBarrier {
        vk::MemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::VERTEX_ATTRIBUTE_READ)
            .build()
    }

    /// Host write visible to a subsequent transfer read (staging buffer reuse).
    pub fn buffer_host_write_to_transfer_read() -> vk::MemoryBarrier {
        vk::MemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::HOST_WRITE)
            .dst_access_mask(vk::AccessFlags::TRANSFER_READ)
            .build()
    }
}

/// RAII semaphore wrapper.
pub struct Semaphore {
    device: ash::Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Create a new binary semaphore.
    pub fn new(device: ash::Device) -> VulkanResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe {
            device
                .create_semaphore(&create_info, None)
                .map_err(VulkanError::from)?
        };
        Ok(Self { device, semaphore })
    }

    /// Raw semaphore handle.
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// RAII fence wrapper.
pub struct Fence {
    device: ash::Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a new fence, optionally pre-signaled.
    pub fn new(device: ash::Device, signaled: bool) -> VulkanResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let fence = unsafe {
            device
                .create_fence(&create_info, None)
                .map_err(VulkanError::from)?
        };
        Ok(Self { device, fence })
    }

    /// Block until the fence signals or `timeout` nanoseconds elapse.
    pub fn wait(&self, timeout: u64) -> VulkanResult<()> {
        unsafe {
            self.device
                .wait_for_fences(&[self.fence], true, timeout)
                .map_err(VulkanError::from)
        }
    }

    /// Reset the fence to unsignaled.
    pub fn reset(&self) -> VulkanResult<()> {
        unsafe { self.device.reset_fences(&[self.fence]).map_err(VulkanError::from) }
    }

    /// Raw fence handle.
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// The three synchronization objects a frame in flight needs: a semaphore
/// signaled when its swapchain image becomes available, one signaled when
/// its rendering is done, and a fence the runner waits on before reusing
/// the command buffer tied to that frame slot (invariant iii in the data
/// model: a command buffer for image `k` is never re-recorded while frame
/// `k` is still in flight).
pub struct FrameSync {
    /// Signaled by `vkAcquireNextImageKHR`.
    pub image_available: Semaphore,
    /// Signaled by the submit that renders this frame.
    pub render_finished: Semaphore,
    /// Waited on before re-recording this frame slot's command buffer.
    pub in_flight: Fence,
}

impl FrameSync {
    /// Create a frame-sync triple; the fence starts signaled so the first
    /// frame does not wait on work that never happened.
    pub fn new(device: ash::Device) -> VulkanResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device.clone())?,
            render_finished: Semaphore::new(device.clone())?,
            in_flight: Fence::new(device, true)?,
        })
    }
}
