//! Allocator: manages the fixed, small set of typed [`Buffer`]s and hands
//! out [`BufferRegions`] handles into them.

use std::collections::HashMap;

use ash::vk;
use thiserror::Error;

use crate::vk::{VulkanContext, VulkanError};

use super::buffer::Buffer;

/// Errors raised by the memory allocator.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// A buffer could not grow to satisfy the request (host or device out of memory).
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A requested region falls outside its buffer's bounds.
    #[error("overflow: {0}")]
    Overflow(String),

    /// The request is otherwise malformed.
    #[error("invalid request: {0}")]
    Invalid(String),

    /// A lower-level Vulkan call failed.
    #[error(transparent)]
    Vulkan(#[from] VulkanError),
}

/// Key identifying one typed buffer: its usage flags and memory-property
/// flags combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferKind {
    pub usage: vk::BufferUsageFlags,
    pub memory_properties: vk::MemoryPropertyFlags,
}

/// A handle into one or more aligned regions of a typed buffer. `count > 1`
/// is used only for per-swapchain-image-duplicated uniform buffers.
#[derive(Debug, Clone)]
pub struct BufferRegions {
    pub(crate) kind: BufferKind,
    pub count: usize,
    pub region_size: vk::DeviceSize,
    pub alignment: vk::DeviceSize,
    pub offsets: Vec<vk::DeviceSize>,
}

impl BufferRegions {
    /// The offset of region `index`.
    pub fn offset(&self, index: usize) -> vk::DeviceSize {
        self.offsets[index]
    }
}

/// Manages the fixed set of typed [`Buffer`]s (one per usage×properties
/// combination encountered) and services `alloc`/`resize`/`free` against
/// them.
pub struct MemoryAllocator {
    context_device: ash::Device,
    graphics_queue: vk::Queue,
    queue_family: u32,
    buffers: HashMap<BufferKind, Buffer>,
    uniform_alignment: vk::DeviceSize,
    storage_alignment: vk::DeviceSize,
    /// Regions released but not yet safe to reuse because an in-flight
    /// command buffer may still reference them. Flushed by `collect_garbage`
    /// once the caller confirms no in-flight work remains.
    pending_free: Vec<(BufferKind, vk::DeviceSize, vk::DeviceSize)>,
    initial_buffer_size: vk::DeviceSize,
}

impl MemoryAllocator {
    /// Create an allocator against `context`, querying the device's minimum
    /// uniform/storage buffer offset alignment once up front.
    pub fn new(context: &VulkanContext, initial_buffer_size: vk::DeviceSize) -> Self {
        let limits = context.physical_device().properties.limits;
        Self {
            context_device: context.device().clone(),
            graphics_queue: context.graphics_queue(),
            queue_family: context.physical_device().queue_families.graphics,
            buffers: HashMap::new(),
            uniform_alignment: limits.min_uniform_buffer_offset_alignment,
            storage_alignment: limits.min_storage_buffer_offset_alignment,
            pending_free: Vec::new(),
            initial_buffer_size,
        }
    }

    /// The device's minimum uniform buffer offset alignment.
    pub fn uniform_alignment(&self) -> vk::DeviceSize {
        self.uniform_alignment
    }

    /// The device's minimum storage buffer offset alignment.
    pub fn storage_alignment(&self) -> vk::DeviceSize {
        self.storage_alignment
    }

    /// Allocate `count` aligned regions of `size` bytes each from the typed
    /// buffer matching `usage`/`memory_properties`, creating that buffer on
    /// first use.
    pub fn alloc(
        &mut self,
        context: &VulkanContext,
        usage: vk::BufferUsageFlags,
        memory_properties: vk::MemoryPropertyFlags,
        count: usize,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
    ) -> Result<BufferRegions, MemoryError> {
        if count == 0 || size == 0 {
            return Err(MemoryError::Invalid("count and size must be non-zero".into()));
        }

        let kind = BufferKind {
            usage,
            memory_properties,
        };
        let region_size = align_up(size, alignment);

        if !self.buffers.contains_key(&kind) {
            let buffer = Buffer::new(context, self.initial_buffer_size, usage, memory_properties)?;
            self.buffers.insert(kind, buffer);
        }

        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = loop {
                let buffer = self.buffers.get_mut(&kind).expect("buffer just inserted");
                match buffer.try_alloc(region_size, alignment) {
                    Some(offset) => break offset,
                    None => {
                        self.grow(context, kind)?;
                    }
                }
            };
            offsets.push(offset);
        }

        Ok(BufferRegions {
            kind,
            count,
            region_size,
            alignment,
            offsets,
        })
    }

    /// Resize `regions` to `new_size` per region. If the new size fits in
    /// place in every region the size is updated; otherwise a fresh set of
    /// regions is allocated, old contents copied, and the old regions
    /// released. The caller keeps using the returned handle — its identity
    /// is stable even though offsets may change.
    pub fn resize(
        &mut self,
        context: &VulkanContext,
        regions: BufferRegions,
        new_size: vk::DeviceSize,
    ) -> Result<BufferRegions, MemoryError> {
        let new_region_size = align_up(new_size, regions.alignment);
        if new_region_size <= regions.region_size {
            let mut resized = regions;
            resized.region_size = new_region_size;
            return Ok(resized);
        }

        let fresh = self.alloc(
            context,
            regions.kind.usage,
            regions.kind.memory_properties,
            regions.count,
            new_size,
            regions.alignment,
        )?;

        self.copy_regions(context, &regions, &fresh)?;
        self.free(regions);
        Ok(fresh)
    }

    /// Append `regions`' ranges to their buffer's free-list. Actual slot
    /// reuse happens only once no in-flight command buffer can still
    /// reference them (the transfer engine / runner defers destruction
    /// accordingly; this call just records the pending release).
    pub fn free(&mut self, regions: BufferRegions) {
        for &offset in &regions.offsets {
            self.pending_free.push((regions.kind, offset, regions.region_size));
        }
    }

    /// Flush pending frees into their buffers' free-lists. Call only once
    /// the caller has confirmed no in-flight command buffer references the
    /// freed ranges (invariant iv).
    pub fn collect_garbage(&mut self) {
        for (kind, offset, size) in self.pending_free.drain(..) {
            if let Some(buffer) = self.buffers.get_mut(&kind) {
                buffer.release(offset, size);
            }
        }
    }

    /// Copy `data` into `regions`' slice `index` via the mapped pointer.
    /// Only valid for host-visible buffers.
    pub fn write(&self, regions: &BufferRegions, index: usize, data: &[u8]) -> Result<(), MemoryError> {
        let buffer = self
            .buffers
            .get(&regions.kind)
            .ok_or_else(|| MemoryError::Invalid("unknown buffer kind".into()))?;
        let offset = regions.offset(index);
        if offset + data.len() as vk::DeviceSize > buffer.size() {
            return Err(MemoryError::Overflow(format!(
                "write of {} bytes at offset {offset} exceeds buffer size {}",
                data.len(),
                buffer.size()
            )));
        }
        unsafe { buffer.write_mapped(offset, data) };
        Ok(())
    }

    /// Raw handle of the buffer backing `kind`, for command-buffer binding.
    pub fn buffer_handle(&self, kind: BufferKind) -> Option<vk::Buffer> {
        self.buffers.get(&kind).map(Buffer::handle)
    }

    /// Read `len` bytes at `offset` from the mapped region of the buffer
    /// backing `kind`. Only valid for host-visible buffers.
    pub fn read(&self, kind: BufferKind, offset: vk::DeviceSize, len: usize) -> Result<Vec<u8>, MemoryError> {
        let buffer = self
            .buffers
            .get(&kind)
            .ok_or_else(|| MemoryError::Invalid("unknown buffer kind".into()))?;
        if offset + len as vk::DeviceSize > buffer.size() {
            return Err(MemoryError::Overflow(format!(
                "read of {len} bytes at offset {offset} exceeds buffer size {}",
                buffer.size()
            )));
        }
        Ok(unsafe { buffer.read_mapped(offset, len) })
    }

    fn grow(&mut self, context: &VulkanContext, kind: BufferKind) -> Result<(), MemoryError> {
        let old = self.buffers.get(&kind).expect("grow called on known kind");
        let new_size = doubled_size(old.size());
        log::info!(
            "growing buffer (usage={:?}, props={:?}) from {} to {new_size} bytes",
            kind.usage,
            kind.memory_properties,
            old.size()
        );

        let new_buffer = Buffer::new(context, new_size, kind.usage, kind.memory_properties)?;
        self.copy_buffer_contents(old, &new_buffer, old.watermark())?;

        self.buffers.insert(kind, new_buffer);
        Ok(())
    }

    fn copy_regions(
        &mut self,
        context: &VulkanContext,
        src: &BufferRegions,
        dst: &BufferRegions,
    ) -> Result<(), MemoryError> {
        let src_buffer = self
            .buffers
            .get(&src.kind)
            .ok_or_else(|| MemoryError::Invalid("unknown source buffer kind".into()))?;
        let dst_buffer = self
            .buffers
            .get(&dst.kind)
            .ok_or_else(|| MemoryError::Invalid("unknown destination buffer kind".into()))?;

        for (i, &src_offset) in src.offsets.iter().enumerate() {
            let dst_offset = dst.offsets[i];
            self.record_copy(
                context,
                src_buffer.handle(),
                src_offset,
                dst_buffer.handle(),
                dst_offset,
                src.region_size,
            )?;
        }
        Ok(())
    }

    fn copy_buffer_contents(
        &self,
        old: &Buffer,
        new: &Buffer,
        live_bytes: vk::DeviceSize,
    ) -> Result<(), MemoryError> {
        if live_bytes == 0 {
            return Ok(());
        }
        self.record_copy_raw(old.handle(), 0, new.handle(), 0, live_bytes)
    }

    fn record_copy(
        &self,
        _context: &VulkanContext,
        src: vk::Buffer,
        src_offset: vk::DeviceSize,
        dst: vk::Buffer,
        dst_offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), MemoryError> {
        self.record_copy_raw(src, src_offset, dst, dst_offset, size)
    }

    /// Submit a one-shot command buffer copying `size` bytes from `src` to
    /// `dst`, waiting idle on the graphics queue. Growth and resize are rare
    /// (watermark-overflow events), so this is not latency-sensitive.
    fn record_copy_raw(
        &self,
        src: vk::Buffer,
        src_offset: vk::DeviceSize,
        dst: vk::Buffer,
        dst_offset: vk::DeviceSize,
        size: vk::DeviceSize,
    ) -> Result<(), MemoryError> {
        let device = &self.context_device;
        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(self.queue_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);
        let pool = unsafe { device.create_command_pool(&pool_info, None).map_err(VulkanError::from)? };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = unsafe {
            device
                .allocate_command_buffers(&alloc_info)
                .map_err(VulkanError::from)?[0]
        };

        let begin_info =
            vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::from)?;
            let region = vk::BufferCopy::builder()
                .src_offset(src_offset)
                .dst_offset(dst_offset)
                .size(size)
                .build();
            device.cmd_copy_buffer(command_buffer, src, dst, &[region]);
            device.end_command_buffer(command_buffer).map_err(VulkanError::from)?;
        }

        let submit_info = vk::SubmitInfo::builder().command_buffers(std::slice::from_ref(&command_buffer));
        unsafe {
            device
                .queue_submit(self.graphics_queue, std::slice::from_ref(&submit_info), vk::Fence::null())
                .map_err(VulkanError::from)?;
            device.queue_wait_idle(self.graphics_queue).map_err(VulkanError::from)?;
            device.free_command_buffers(pool, &[command_buffer]);
            device.destroy_command_pool(pool, None);
        }
        Ok(())
    }
}

fn align_up(value: vk::DeviceSize, alignment: vk::DeviceSize) -> vk::DeviceSize {
    if alignment == 0 {
        value
    } else {
        (value + alignment - 1) / alignment * alignment
    }
}

/// A buffer due to grow doubles rather than growing to exactly fit the
/// failed request, so repeated small overflows don't each trigger their
/// own reallocate-and-copy pass.
fn doubled_size(old_size: vk::DeviceSize) -> vk::DeviceSize {
    old_size * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_next_multiple() {
        assert_eq!(align_up(10, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 16), 32);
        assert_eq!(align_up(0, 16), 0);
    }

    #[test]
    fn doubled_size_doubles_rather_than_fitting_the_triggering_request() {
        assert_eq!(doubled_size(256), 512);
        assert_eq!(doubled_size(512), 1024);
    }

    #[test]
    fn repeated_doubling_eventually_exceeds_any_bounded_request() {
        let mut size = 64u64;
        for _ in 0..10 {
            size = doubled_size(size);
        }
        assert!(size > 1 << 15);
    }
}
