//! `Dat`: the typed handle to a suballocated buffer region.

use ash::vk;
use bitflags::bitflags;

use crate::memory::BufferRegions;

bitflags! {
    /// Usage hints a `Dat` carries at creation time; these shape how the
    /// transfer engine schedules its uploads/downloads but never change the
    /// underlying buffer kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DatFlags: u32 {
        /// Expected to receive uploads on most frames (skip staging-ring churn heuristics).
        const FREQUENT_UPLOAD   = 1 << 0;
        /// Expected to be read back frequently (e.g. picking).
        const FREQUENT_DOWNLOAD = 1 << 1;
        /// Expected to be resized often (grows with slack instead of exact-fit).
        const FREQUENT_RESIZE   = 1 << 2;
        /// Backed by a host-visible mappable buffer.
        const MAPPABLE          = 1 << 3;
        /// Replicated across swapchain images to avoid read-after-write hazards.
        const DUP               = 1 << 4;
    }
}

/// A high-level wrapper around one [`BufferRegions`]. When `DUP` is set the
/// Dat holds `swapchain-image-count` distinct region offsets and tracks,
/// per slice, whether it still holds stale data after a logical write.
pub struct Dat {
    pub(crate) regions: BufferRegions,
    pub(crate) flags: DatFlags,
    element_size: vk::DeviceSize,
    /// `dirty[i]` is true if slice `i` has not yet received the latest write.
    dirty: Vec<bool>,
}

impl Dat {
    /// Wrap `regions` as a Dat with the given flags. `element_size` is the
    /// logical payload size per slice (before alignment padding).
    pub fn new(regions: BufferRegions, flags: DatFlags, element_size: vk::DeviceSize) -> Self {
        let count = regions.count;
        Self {
            regions,
            flags,
            element_size,
            dirty: vec![false; count],
        }
    }

    /// Whether this Dat is replicated across swapchain images.
    pub fn is_dup(&self) -> bool {
        self.flags.contains(DatFlags::DUP)
    }

    /// Number of region slices (1 unless `dup`).
    pub fn slice_count(&self) -> usize {
        self.regions.count
    }

    /// Logical payload size per slice.
    pub fn element_size(&self) -> vk::DeviceSize {
        self.element_size
    }

    /// Byte offset of slice `index` within its backing buffer.
    pub fn offset(&self, index: usize) -> vk::DeviceSize {
        self.regions.offset(index)
    }

    /// Record a logical write landing on slice `written_index`: that slice
    /// becomes clean, every other slice becomes stale (for non-dup Dats
    /// there is only ever slice 0, which never goes stale).
    pub fn mark_written(&mut self, written_index: usize) {
        for (i, dirty) in self.dirty.iter_mut().enumerate() {
            *dirty = i != written_index;
        }
    }

    /// Indices of slices still holding stale data after the last write —
    /// what the transfer engine's upfill propagation must still copy into.
    pub fn stale_slices(&self) -> Vec<usize> {
        self.dirty
            .iter()
            .enumerate()
            .filter_map(|(i, &d)| d.then_some(i))
            .collect()
    }

    /// Mark slice `index` as now consistent (the upfill copy landed).
    pub fn mark_clean(&mut self, index: usize) {
        if let Some(d) = self.dirty.get_mut(index) {
            *d = false;
        }
    }

    /// True once every slice holds the latest write (invariant ii).
    pub fn is_consistent(&self) -> bool {
        self.dirty.iter().all(|&d| !d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{BufferKind, BufferRegions};

    fn regions(count: usize) -> BufferRegions {
        BufferRegions {
            kind: BufferKind { usage: vk::BufferUsageFlags::UNIFORM_BUFFER, memory_properties: vk::MemoryPropertyFlags::HOST_VISIBLE },
            count,
            region_size: 64,
            alignment: 16,
            offsets: (0..count).map(|i| i as vk::DeviceSize * 64).collect(),
        }
    }

    #[test]
    fn a_non_dup_dat_has_a_single_slice_that_is_always_consistent() {
        let dat = Dat::new(regions(1), DatFlags::MAPPABLE, 64);
        assert_eq!(dat.slice_count(), 1);
        assert!(dat.is_consistent());
    }

    #[test]
    fn mark_written_stales_every_other_slice() {
        let mut dat = Dat::new(regions(3), DatFlags::DUP | DatFlags::MAPPABLE, 64);
        dat.mark_written(1);
        assert_eq!(dat.stale_slices(), vec![0, 2]);
        assert!(!dat.is_consistent());
    }

    #[test]
    fn swapchain_image_count_frames_of_upfill_restore_consistency() {
        // After one logical write, `slice_count` upfill passes (one per
        // frame) must clear every stale slice without another write
        // landing in between.
        let mut dat = Dat::new(regions(3), DatFlags::DUP | DatFlags::MAPPABLE, 64);
        dat.mark_written(0);
        assert_eq!(dat.stale_slices(), vec![1, 2]);

        for stale in dat.stale_slices() {
            dat.mark_clean(stale);
        }
        assert!(dat.is_consistent());
    }

    #[test]
    fn mark_clean_on_an_unknown_slice_is_a_no_op() {
        let mut dat = Dat::new(regions(1), DatFlags::MAPPABLE, 64);
        dat.mark_clean(5);
        assert!(dat.is_consistent());
    }
}
