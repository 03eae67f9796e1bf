//! A single typed GPU buffer: one `usage × memory-properties` allocation
//! with a watermark pointer and a free-list of released ranges.

use ash::vk;

use crate::vk::{VulkanContext, VulkanError, VulkanResult};

/// A free range within a [`FreeListAllocator`], in bytes.
#[derive(Debug, Clone, Copy)]
struct FreeRange {
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
}

/// The pure bookkeeping behind [`Buffer`]'s `try_alloc`/`release`: a
/// watermark pointer plus a best-fit free-list of released ranges, kept
/// separate from the device handles so it can be exercised without a
/// Vulkan context.
#[derive(Debug, Default)]
struct FreeListAllocator {
    size: vk::DeviceSize,
    watermark: vk::DeviceSize,
    free_list: Vec<FreeRange>,
}

impl FreeListAllocator {
    fn new(size: vk::DeviceSize) -> Self {
        Self { size, watermark: 0, free_list: Vec::new() }
    }

    /// Search the free-list for a best-fit range of at least `size` bytes
    /// aligned to `alignment`; on miss, advance the watermark. Returns
    /// `None` if the watermark would overflow `self.size` (the caller then
    /// grows the buffer).
    fn try_alloc(&mut self, size: vk::DeviceSize, alignment: vk::DeviceSize) -> Option<vk::DeviceSize> {
        let mut best: Option<(usize, vk::DeviceSize, vk::DeviceSize)> = None;
        for (i, range) in self.free_list.iter().enumerate() {
            let aligned_offset = align_up(range.offset, alignment);
            let padding = aligned_offset - range.offset;
            if range.size >= size + padding {
                let waste = range.size - size - padding;
                if best.map_or(true, |(_, _, best_waste)| waste < best_waste) {
                    best = Some((i, aligned_offset, waste));
                }
            }
        }

        if let Some((i, aligned_offset, waste)) = best {
            let range = self.free_list.remove(i);
            let used_end = aligned_offset + size;
            if used_end < range.offset + range.size {
                self.free_list.push(FreeRange {
                    offset: used_end,
                    size: waste,
                });
            }
            return Some(aligned_offset);
        }

        let aligned_watermark = align_up(self.watermark, alignment);
        let end = aligned_watermark + size;
        if end > self.size {
            return None;
        }
        self.watermark = end;
        Some(aligned_watermark)
    }

    /// Release `[offset, offset+size)` back to the free-list. Reuse is
    /// deferred by the allocator until no in-flight command buffer
    /// references it.
    fn release(&mut self, offset: vk::DeviceSize, size: vk::DeviceSize) {
        self.free_list.push(FreeRange { offset, size });
    }

    fn watermark(&self) -> vk::DeviceSize {
        self.watermark
    }
}

/// One device allocation dedicated to a single `usage × memory-properties`
/// combination. Never shrunk; grown by reallocate-and-copy when the
/// watermark would overflow the current size.
pub struct Buffer {
    device: ash::Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    memory_properties: vk::MemoryPropertyFlags,
    mapped_ptr: Option<*mut u8>,
    allocator: FreeListAllocator,
}

// The buffer and its mapping are only ever touched from the thread that owns
// the `MemoryAllocator`; `Send` is required to hand ownership across the
// transfer engine's worker threads between frames.
unsafe impl Send for Buffer {}

impl Buffer {
    /// Allocate a new buffer of `size` bytes with the given usage and
    /// memory-property flags, mapping it persistently if host-visible.
    pub fn new(
        context: &VulkanContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        memory_properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let device = context.device();
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);
        let buffer = unsafe { device.create_buffer(&buffer_info, None).map_err(VulkanError::from)? };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type_index = find_memory_type(
            &context.physical_device().memory_properties,
            requirements.memory_type_bits,
            memory_properties,
        )?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = unsafe {
            device.allocate_memory(&alloc_info, None).map_err(|e| {
                unsafe { device.destroy_buffer(buffer, None) };
                VulkanError::from(e)
            })?
        };

        unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .map_err(VulkanError::from)?
        };

        let mapped_ptr = if memory_properties.contains(vk::MemoryPropertyFlags::HOST_VISIBLE) {
            let ptr = unsafe {
                device
                    .map_memory(memory, 0, vk::WHOLE_SIZE, vk::MemoryMapFlags::empty())
                    .map_err(VulkanError::from)?
            };
            Some(ptr as *mut u8)
        } else {
            None
        };

        Ok(Self {
            device: device.clone(),
            buffer,
            memory,
            size,
            usage,
            memory_properties,
            mapped_ptr,
            allocator: FreeListAllocator::new(size),
        })
    }

    /// Raw buffer handle.
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Total size of the backing allocation.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// The usage flags this buffer was created with.
    pub fn usage(&self) -> vk::BufferUsageFlags {
        self.usage
    }

    /// The memory-property flags this buffer was created with.
    pub fn memory_properties(&self) -> vk::MemoryPropertyFlags {
        self.memory_properties
    }

    /// Persistently mapped host pointer, if this buffer is host-visible.
    pub fn mapped_ptr(&self) -> Option<*mut u8> {
        self.mapped_ptr
    }

    /// Write `data` at byte `offset` into the mapped region. Caller
    /// guarantees `offset + data.len() <= size` and that this buffer is
    /// mappable.
    ///
    /// # Safety
    /// `offset + data.len()` must not exceed `self.size`, and no other
    /// thread may write overlapping bytes concurrently.
    pub unsafe fn write_mapped(&self, offset: vk::DeviceSize, data: &[u8]) {
        let ptr = self
            .mapped_ptr
            .expect("write_mapped called on a non-mappable buffer");
        std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(offset as usize), data.len());
    }

    /// Read `len` bytes at byte `offset` from the mapped region.
    ///
    /// # Safety
    /// `offset + len` must not exceed `self.size`.
    pub unsafe fn read_mapped(&self, offset: vk::DeviceSize, len: usize) -> Vec<u8> {
        let ptr = self
            .mapped_ptr
            .expect("read_mapped called on a non-mappable buffer");
        let mut out = vec![0u8; len];
        std::ptr::copy_nonoverlapping(ptr.add(offset as usize), out.as_mut_ptr(), len);
        out
    }

    /// Search the free-list for a best-fit range, or advance the watermark
    /// on miss. See [`FreeListAllocator::try_alloc`].
    pub(super) fn try_alloc(&mut self, size: vk::DeviceSize, alignment: vk::DeviceSize) -> Option<vk::DeviceSize> {
        self.allocator.try_alloc(size, alignment)
    }

    /// Release `[offset, offset+size)` back to the free-list. Reuse is
    /// deferred by the allocator until no in-flight command buffer
    /// references it.
    pub(super) fn release(&mut self, offset: vk::DeviceSize, size: vk::DeviceSize) {
        self.allocator.release(offset, size);
    }

    /// Current watermark, for diagnostics and the grow-doubling decision.
    pub(super) fn watermark(&self) -> vk::DeviceSize {
        self.allocator.watermark()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if self.mapped_ptr.is_some() {
                self.device.unmap_memory(self.memory);
            }
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

fn align_up(value: vk::DeviceSize, alignment: vk::DeviceSize) -> vk::DeviceSize {
    if alignment == 0 {
        value
    } else {
        (value + alignment - 1) / alignment * alignment
    }
}

fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    for i in 0..memory_properties.memory_type_count {
        let suitable = (type_bits & (1 << i)) != 0;
        let matches = memory_properties.memory_types[i as usize]
            .property_flags
            .contains(required);
        if suitable && matches {
            return Ok(i);
        }
    }
    Err(VulkanError::NoSuitableMemoryType)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_alloc_advances_watermark_when_free_list_is_empty() {
        let mut alloc = FreeListAllocator::new(1024);
        assert_eq!(alloc.try_alloc(64, 16), Some(0));
        assert_eq!(alloc.try_alloc(64, 16), Some(64));
        assert_eq!(alloc.watermark(), 128);
    }

    #[test]
    fn try_alloc_aligns_the_watermark_before_advancing() {
        let mut alloc = FreeListAllocator::new(1024);
        alloc.try_alloc(10, 1);
        assert_eq!(alloc.try_alloc(16, 16), Some(16));
        assert_eq!(alloc.watermark(), 32);
    }

    #[test]
    fn try_alloc_returns_none_when_the_watermark_would_overflow() {
        let mut alloc = FreeListAllocator::new(64);
        assert_eq!(alloc.try_alloc(64, 1), Some(0));
        assert_eq!(alloc.try_alloc(1, 1), None);
    }

    #[test]
    fn released_ranges_are_reused_by_a_later_alloc_of_matching_size() {
        let mut alloc = FreeListAllocator::new(256);
        let first = alloc.try_alloc(32, 16).unwrap();
        let watermark_after_first = alloc.watermark();
        alloc.release(first, 32);
        let reused = alloc.try_alloc(32, 16);
        assert_eq!(reused, Some(first));
        assert_eq!(alloc.watermark(), watermark_after_first, "a free-list hit must not move the watermark");
    }

    #[test]
    fn try_alloc_picks_the_best_fit_free_range_over_a_larger_one() {
        let mut alloc = FreeListAllocator::new(256);
        let small = alloc.try_alloc(16, 1).unwrap();
        let large = alloc.try_alloc(64, 1).unwrap();
        alloc.release(large, 64);
        alloc.release(small, 16);
        // A 16-byte request should land in the exact-fit 16-byte range, not
        // carve into the 64-byte one and leave fragmentation behind.
        assert_eq!(alloc.try_alloc(16, 1), Some(small));
    }

    #[test]
    fn leftover_space_in_a_reused_range_is_tracked_as_a_new_free_range() {
        let mut alloc = FreeListAllocator::new(256);
        let region = alloc.try_alloc(64, 1).unwrap();
        alloc.release(region, 64);
        // Only 40 of the 64 released bytes are claimed; the remaining 24
        // should still be allocatable afterward.
        alloc.try_alloc(40, 1);
        assert_eq!(alloc.try_alloc(24, 1), Some(region + 40));
    }
}
