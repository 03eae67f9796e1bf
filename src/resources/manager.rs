//! Resource manager: the typed handle layer over the memory allocator for
//! [`Dat`]s and over raw images for [`Tex`]es.

use std::collections::HashMap;

use ash::vk;
use thiserror::Error;

use crate::foundation::collections::{HandleMap, TypedHandle};
use crate::memory::{BufferRegions, MemoryAllocator, MemoryError};
use crate::vk::{Fence, VulkanContext, VulkanError};

use super::dat::{Dat, DatFlags};
use super::tex::{format_texel_size, Tex, TexDims};

/// Errors raised by the resource manager.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The underlying allocator could not satisfy the request.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A lower-level Vulkan call failed (image/view/sampler creation).
    #[error(transparent)]
    Vulkan(#[from] VulkanError),

    /// The requested range falls outside the resource.
    #[error("overflow: {0}")]
    Overflow(String),

    /// Source/destination formats are incompatible.
    #[error("invalid: {0}")]
    Invalid(String),

    /// The handle does not refer to a live resource.
    #[error("handle not found")]
    NotFound,
}

/// Handle to a live [`Dat`].
pub type DatHandle = TypedHandle<Dat>;
/// Handle to a live [`Tex`].
pub type TexHandle = TypedHandle<Tex>;

/// Which direction of one-shot command buffer a transfer uses; each kind
/// gets its own persistent [`OneShotSlot`] so upload/download/copy jobs
/// never contend for the same command buffer or staging region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum OneShotKind {
    Upload,
    Download,
    Copy,
}

/// A reusable one-shot command pool/buffer/fence triple, plus the staging
/// `Dat` (upload/download kinds only) it stages transfers through. Reused
/// across calls instead of being allocated and torn down per transfer; the
/// fence gates both command-buffer re-recording and staging-buffer reuse,
/// so a region is only ever touched again once the GPU work that last used
/// it has signaled.
struct OneShotSlot {
    device: ash::Device,
    pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    fence: Fence,
    staging: Option<DatHandle>,
}

impl OneShotSlot {
    fn new(context: &VulkanContext) -> Result<Self, ResourceError> {
        let device = context.device();
        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(context.physical_device().queue_families.graphics)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let pool = unsafe { device.create_command_pool(&pool_info, None).map_err(VulkanError::from)? };

        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = unsafe { device.allocate_command_buffers(&alloc_info).map_err(VulkanError::from)?[0] };

        // Pre-signaled: the first `begin_one_shot` call waits on this fence
        // before reusing the command buffer, and nothing has been submitted
        // yet.
        let fence = Fence::new(device.clone(), true)?;
        Ok(Self {
            device: device.clone(),
            pool,
            command_buffer,
            fence,
            staging: None,
        })
    }
}

impl Drop for OneShotSlot {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
    }
}

/// Owns every live `Dat`/`Tex` and the allocator backing `Dat`s. `upload`,
/// `download`, and `copy` are the only ways to touch contents; layout
/// transitions for textures happen inside these calls.
pub struct ResourceManager {
    allocator: MemoryAllocator,
    dats: HandleMap<Dat>,
    texs: HandleMap<Tex>,
    image_count: usize,
    one_shot_slots: HashMap<OneShotKind, OneShotSlot>,
}

impl ResourceManager {
    /// Create a manager whose dup-Dats replicate across `image_count`
    /// swapchain images.
    pub fn new(context: &VulkanContext, image_count: usize, initial_buffer_size: vk::DeviceSize) -> Self {
        Self {
            allocator: MemoryAllocator::new(context, initial_buffer_size),
            dats: HandleMap::new(),
            texs: HandleMap::new(),
            image_count,
            one_shot_slots: HashMap::new(),
        }
    }

    /// The device's minimum uniform buffer offset alignment, the alignment
    /// every uniform-kind `Dat` should be created with.
    pub fn uniform_alignment(&self) -> vk::DeviceSize {
        self.allocator.uniform_alignment()
    }

    /// The device's minimum storage buffer offset alignment, the alignment
    /// every storage-kind `Dat` (and every vertex/index `Dat`, which has no
    /// alignment requirement of its own but shares the storage buffer's
    /// free-list granularity) should be created with.
    pub fn storage_alignment(&self) -> vk::DeviceSize {
        self.allocator.storage_alignment()
    }

    /// Create a Dat of `element_size` bytes. If `flags` contains `DUP`, the
    /// allocation reserves `image_count` aligned slices; otherwise one.
    pub fn create_dat(
        &mut self,
        context: &VulkanContext,
        usage: vk::BufferUsageFlags,
        flags: DatFlags,
        element_size: vk::DeviceSize,
        alignment: vk::DeviceSize,
    ) -> Result<DatHandle, ResourceError> {
        let memory_properties = if flags.contains(DatFlags::MAPPABLE) {
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT
        } else {
            vk::MemoryPropertyFlags::DEVICE_LOCAL
        };
        let count = if flags.contains(DatFlags::DUP) { self.image_count } else { 1 };

        let regions: BufferRegions =
            self.allocator
                .alloc(context, usage, memory_properties, count, element_size, alignment)?;
        let dat = Dat::new(regions, flags, element_size);
        Ok(TypedHandle::new(self.dats.insert(dat)))
    }

    /// Create a texture.
    pub fn create_tex(
        &mut self,
        context: &VulkanContext,
        dims: TexDims,
        format: vk::Format,
        extent: vk::Extent3D,
        generate_mips: bool,
    ) -> Result<TexHandle, ResourceError> {
        let tex = Tex::new(context, dims, format, extent, generate_mips)?;
        Ok(TypedHandle::new(self.texs.insert(tex)))
    }

    /// Resize a Dat's per-slice element size, preserving its handle identity.
    pub fn resize_dat(
        &mut self,
        context: &VulkanContext,
        handle: DatHandle,
        new_element_size: vk::DeviceSize,
    ) -> Result<(), ResourceError> {
        let dat = self.dats.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
        let alignment = dat.regions.alignment;
        let kind = dat.regions.kind;
        let old_regions = std::mem::replace(
            &mut dat.regions,
            BufferRegions {
                kind,
                count: 0,
                region_size: 0,
                alignment,
                offsets: Vec::new(),
            },
        );
        let resized = self.allocator.resize(context, old_regions, new_element_size)?;
        let dat = self.dats.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
        dat.regions = resized;
        Ok(())
    }

    /// Write `data` to a non-dup Dat, or to the current slice of a dup-Dat
    /// (per `current_image`), marking the remaining slices stale for the
    /// transfer engine's upfill pass. Dispatches to [`Self::upload_dat_mapped`]
    /// for host-visible Dats and [`Self::upload_dat_staged`] for
    /// device-local ones.
    pub fn upload_dat(
        &mut self,
        context: &VulkanContext,
        handle: DatHandle,
        current_image: usize,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        if dat.flags.contains(DatFlags::MAPPABLE) {
            self.upload_dat_mapped(handle, current_image, data)
        } else {
            self.upload_dat_staged(context, handle, current_image, data)
        }
    }

    /// Write `data` directly through `handle`'s host mapping.
    fn upload_dat_mapped(&mut self, handle: DatHandle, current_image: usize, data: &[u8]) -> Result<(), ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        if data.len() as vk::DeviceSize > dat.element_size() {
            return Err(ResourceError::Overflow(format!(
                "upload of {} bytes exceeds Dat element size {}",
                data.len(),
                dat.element_size()
            )));
        }
        let index = if dat.is_dup() { current_image % dat.slice_count() } else { 0 };
        let regions = dat.regions.clone();
        self.allocator.write(&regions, index, data)?;
        let dat = self.dats.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
        dat.mark_written(index);
        Ok(())
    }

    /// Write `data` into the upload slot's staging ring, then record and
    /// submit a one-shot buffer-to-buffer copy into `handle`'s device-local
    /// region.
    fn upload_dat_staged(
        &mut self,
        context: &VulkanContext,
        handle: DatHandle,
        current_image: usize,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        if data.len() as vk::DeviceSize > dat.element_size() {
            return Err(ResourceError::Overflow(format!(
                "upload of {} bytes exceeds Dat element size {}",
                data.len(),
                dat.element_size()
            )));
        }
        let index = if dat.is_dup() { current_image % dat.slice_count() } else { 0 };
        let (dst_buffer, dst_offset) = self.dat_buffer(handle, index).ok_or(ResourceError::NotFound)?;

        let staging = self.staging_dat_for(context, OneShotKind::Upload, vk::BufferUsageFlags::TRANSFER_SRC, data.len().max(1) as vk::DeviceSize)?;
        self.upload_dat_mapped(staging, 0, data)?;
        let (staging_buffer, staging_offset) = self.dat_buffer(staging, 0).ok_or(ResourceError::NotFound)?;

        let (_, command_buffer) = self.begin_one_shot(context, OneShotKind::Upload)?;
        let device = context.device();
        let region = vk::BufferCopy::builder()
            .src_offset(staging_offset)
            .dst_offset(dst_offset)
            .size(data.len() as vk::DeviceSize)
            .build();
        unsafe {
            device.cmd_copy_buffer(command_buffer, staging_buffer, dst_buffer, &[region]);
        }
        self.end_one_shot(context, OneShotKind::Upload, command_buffer)?;

        let dat = self.dats.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
        dat.mark_written(index);
        Ok(())
    }

    /// Slices of `handle` still stale after its last write (what the
    /// transfer engine's upfill pass must still copy into).
    pub fn stale_slices(&self, handle: DatHandle) -> Vec<usize> {
        self.dats.get(handle.key()).map(Dat::stale_slices).unwrap_or_default()
    }

    /// Copy the contents of slice `from` into slice `to` and mark `to`
    /// clean — the upfill propagation step.
    pub fn propagate_dup(&mut self, handle: DatHandle, from: usize, to: usize) -> Result<(), ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        if !dat.flags.contains(DatFlags::MAPPABLE) {
            return Err(ResourceError::Invalid("propagate_dup requires a mappable Dat".into()));
        }
        let regions = dat.regions.clone();
        let element_size = dat.element_size();

        let bytes = self.allocator.read(regions.kind, regions.offset(from), element_size as usize)?;
        self.allocator.write(&regions, to, &bytes)?;
        let dat = self.dats.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
        dat.mark_clean(to);
        Ok(())
    }

    /// Download the full contents of a non-dup Dat (or slice 0 of a dup-Dat).
    /// Dispatches to [`Self::download_dat_mapped`] for host-visible Dats and
    /// [`Self::download_dat_staged`] for device-local ones.
    pub fn download_dat(&mut self, context: &VulkanContext, handle: DatHandle) -> Result<Vec<u8>, ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        if dat.flags.contains(DatFlags::MAPPABLE) {
            self.download_dat_mapped(handle)
        } else {
            self.download_dat_staged(context, handle)
        }
    }

    /// Read directly through `handle`'s host mapping.
    fn download_dat_mapped(&self, handle: DatHandle) -> Result<Vec<u8>, ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        let len = dat.element_size() as usize;
        let bytes = self.allocator.read(dat.regions.kind, dat.offset(0), len)?;
        Ok(bytes)
    }

    /// Record and submit a one-shot buffer-to-buffer copy from `handle`'s
    /// device-local region into the download slot's staging ring, then read
    /// the staged bytes back through the host mapping.
    fn download_dat_staged(&mut self, context: &VulkanContext, handle: DatHandle) -> Result<Vec<u8>, ResourceError> {
        let dat = self.dats.get(handle.key()).ok_or(ResourceError::NotFound)?;
        let len = dat.element_size();
        let (src_buffer, src_offset) = self.dat_buffer(handle, 0).ok_or(ResourceError::NotFound)?;

        let staging = self.staging_dat_for(context, OneShotKind::Download, vk::BufferUsageFlags::TRANSFER_DST, len.max(1))?;
        let (staging_buffer, staging_offset) = self.dat_buffer(staging, 0).ok_or(ResourceError::NotFound)?;

        let (_, command_buffer) = self.begin_one_shot(context, OneShotKind::Download)?;
        let device = context.device();
        let region = vk::BufferCopy::builder()
            .src_offset(src_offset)
            .dst_offset(staging_offset)
            .size(len)
            .build();
        unsafe {
            device.cmd_copy_buffer(command_buffer, src_buffer, staging_buffer, &[region]);
        }
        self.end_one_shot(context, OneShotKind::Download, command_buffer)?;

        self.download_dat_mapped(staging)
    }

    /// Destroy a Dat, releasing its regions back to the allocator's
    /// free-list (actual slot reuse is deferred by the allocator until no
    /// in-flight command buffer references it).
    pub fn destroy_dat(&mut self, handle: DatHandle) {
        if let Some(dat) = self.dats.remove(handle.key()) {
            self.allocator.free(dat.regions);
        }
    }

    /// Destroy a texture.
    pub fn destroy_tex(&mut self, handle: TexHandle) {
        self.texs.remove(handle.key());
    }

    /// Borrow a live Dat.
    pub fn dat(&self, handle: DatHandle) -> Option<&Dat> {
        self.dats.get(handle.key())
    }

    /// Raw buffer handle and byte offset backing slice `slice_index` of
    /// `handle` (slice 0 for a non-dup Dat), for command-buffer binding of
    /// vertex/index/uniform sources.
    pub fn dat_buffer(&self, handle: DatHandle, slice_index: usize) -> Option<(vk::Buffer, vk::DeviceSize)> {
        let dat = self.dats.get(handle.key())?;
        let buffer = self.allocator.buffer_handle(dat.regions.kind)?;
        Some((buffer, dat.offset(slice_index)))
    }

    /// Borrow a live Tex.
    pub fn tex(&self, handle: TexHandle) -> Option<&Tex> {
        self.texs.get(handle.key())
    }

    /// Borrow a live Tex mutably (layout transitions during upload/download/copy).
    pub fn tex_mut(&mut self, handle: TexHandle) -> Option<&mut Tex> {
        self.texs.get_mut(handle.key())
    }

    /// Flush deferred frees once the caller has confirmed no in-flight
    /// command buffer references them.
    pub fn collect_garbage(&mut self) {
        self.allocator.collect_garbage();
    }

    /// Upload `data` into `tex`'s sub-region `[offset, offset+extent)`: stage
    /// the bytes through the upload slot's persistent staging Dat, then
    /// record and submit a one-shot command buffer that transitions the
    /// image to `TRANSFER_DST_OPTIMAL`, copies the staged buffer into it,
    /// and transitions it back to `SHADER_READ_ONLY_OPTIMAL`. Layout
    /// transitions are always performed within this call; callers never
    /// track layouts themselves. Waits on this transfer's own fence, never
    /// the whole graphics queue.
    pub fn upload_tex(
        &mut self,
        context: &VulkanContext,
        handle: TexHandle,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        let staging = self.staging_dat_for(context, OneShotKind::Upload, vk::BufferUsageFlags::TRANSFER_SRC, data.len().max(1) as vk::DeviceSize)?;
        self.upload_dat_mapped(staging, 0, data)?;
        let (staging_buffer, staging_offset) = self.dat_buffer(staging, 0).ok_or(ResourceError::NotFound)?;

        let (_, command_buffer) = self.begin_one_shot(context, OneShotKind::Upload)?;
        let device = context.device();
        {
            let tex = self.texs.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
            tex.transition_to(device, command_buffer, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
            let region = vk::BufferImageCopy::builder()
                .buffer_offset(staging_offset)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(offset)
                .image_extent(extent)
                .build();
            unsafe {
                device.cmd_copy_buffer_to_image(
                    command_buffer,
                    staging_buffer,
                    tex.image(),
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );
            }
            tex.transition_to(device, command_buffer, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        }
        self.end_one_shot(context, OneShotKind::Upload, command_buffer)?;
        Ok(())
    }

    /// Download `tex`'s sub-region `[offset, offset+extent)` into a freshly
    /// allocated `Vec<u8>`, sized from the texture's own format. Symmetric
    /// with [`Self::upload_tex`]: transitions to `TRANSFER_SRC_OPTIMAL`,
    /// copies into the download slot's persistent staging Dat, transitions
    /// back, then reads the staged bytes off the host-visible mapping.
    pub fn download_tex(
        &mut self,
        context: &VulkanContext,
        handle: TexHandle,
        offset: vk::Offset3D,
        extent: vk::Extent3D,
    ) -> Result<Vec<u8>, ResourceError> {
        let texel_size = self.texs.get(handle.key()).map(|t| format_texel_size(t.format())).ok_or(ResourceError::NotFound)?;
        let byte_len = (extent.width as u64 * extent.height as u64 * extent.depth as u64 * texel_size as u64).max(1);

        let staging = self.staging_dat_for(context, OneShotKind::Download, vk::BufferUsageFlags::TRANSFER_DST, byte_len)?;
        let (staging_buffer, staging_offset) = self.dat_buffer(staging, 0).ok_or(ResourceError::NotFound)?;

        let (_, command_buffer) = self.begin_one_shot(context, OneShotKind::Download)?;
        let device = context.device();
        {
            let tex = self.texs.get_mut(handle.key()).ok_or(ResourceError::NotFound)?;
            let restore_layout = match tex.layout() {
                vk::ImageLayout::UNDEFINED => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                other => other,
            };
            tex.transition_to(device, command_buffer, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
            let region = vk::BufferImageCopy::builder()
                .buffer_offset(staging_offset)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(offset)
                .image_extent(extent)
                .build();
            unsafe {
                device.cmd_copy_image_to_buffer(
                    command_buffer,
                    tex.image(),
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    staging_buffer,
                    &[region],
                );
            }
            tex.transition_to(device, command_buffer, restore_layout);
        }
        self.end_one_shot(context, OneShotKind::Download, command_buffer)?;
        let bytes = self.download_dat_mapped(staging)?;
        Ok(bytes[..byte_len as usize].to_vec())
    }

    /// Copy `extent` texels from `src`'s `src_offset` to `dst`'s
    /// `dst_offset`, a direct image-to-image copy with no intermediate
    /// staging buffer. Both images end up `SHADER_READ_ONLY_OPTIMAL`.
    pub fn copy_tex(
        &mut self,
        context: &VulkanContext,
        src: TexHandle,
        src_offset: vk::Offset3D,
        dst: TexHandle,
        dst_offset: vk::Offset3D,
        extent: vk::Extent3D,
    ) -> Result<(), ResourceError> {
        let (_, command_buffer) = self.begin_one_shot(context, OneShotKind::Copy)?;
        let device = context.device();
        {
            let src_tex = self.texs.get_mut(src.key()).ok_or(ResourceError::NotFound)?;
            src_tex.transition_to(device, command_buffer, vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
        }
        {
            let dst_tex = self.texs.get_mut(dst.key()).ok_or(ResourceError::NotFound)?;
            dst_tex.transition_to(device, command_buffer, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        }
        let (src_image, dst_image) = {
            let src_tex = self.texs.get(src.key()).ok_or(ResourceError::NotFound)?;
            let dst_tex = self.texs.get(dst.key()).ok_or(ResourceError::NotFound)?;
            (src_tex.image(), dst_tex.image())
        };
        let subresource = vk::ImageSubresourceLayers {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            mip_level: 0,
            base_array_layer: 0,
            layer_count: 1,
        };
        let region = vk::ImageCopy::builder()
            .src_subresource(subresource)
            .src_offset(src_offset)
            .dst_subresource(subresource)
            .dst_offset(dst_offset)
            .extent(extent)
            .build();
        unsafe {
            device.cmd_copy_image(
                command_buffer,
                src_image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                dst_image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }
        {
            let src_tex = self.texs.get_mut(src.key()).ok_or(ResourceError::NotFound)?;
            src_tex.transition_to(device, command_buffer, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        }
        {
            let dst_tex = self.texs.get_mut(dst.key()).ok_or(ResourceError::NotFound)?;
            dst_tex.transition_to(device, command_buffer, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        }
        self.end_one_shot(context, OneShotKind::Copy, command_buffer)
    }

    /// Borrow (lazily creating) `kind`'s persistent staging `Dat`, resizing
    /// it in place if the current region is too small. The region is only
    /// reused once `kind`'s one-shot fence has signaled, since `begin_one_shot`
    /// waits on that same fence before letting a new recording reuse it.
    fn staging_dat_for(
        &mut self,
        context: &VulkanContext,
        kind: OneShotKind,
        usage: vk::BufferUsageFlags,
        needed: vk::DeviceSize,
    ) -> Result<DatHandle, ResourceError> {
        if !self.one_shot_slots.contains_key(&kind) {
            self.one_shot_slots.insert(kind, OneShotSlot::new(context)?);
        }
        let existing = self.one_shot_slots.get(&kind).and_then(|slot| slot.staging);
        let handle = match existing {
            Some(handle) => {
                let current = self.dats.get(handle.key()).map(Dat::element_size).unwrap_or(0);
                if needed > current {
                    self.resize_dat(context, handle, needed)?;
                }
                handle
            }
            None => {
                let handle = self.create_dat(context, usage | vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST, DatFlags::MAPPABLE, needed, 1)?;
                self.one_shot_slots.get_mut(&kind).expect("slot created above").staging = Some(handle);
                handle
            }
        };
        Ok(handle)
    }

    /// Reset and begin recording `kind`'s persistent `ONE_TIME_SUBMIT`
    /// command buffer, waiting first on `kind`'s fence so the previous
    /// recording (and anything that read its staging region) is known to
    /// have completed. Paired with [`Self::end_one_shot`].
    fn begin_one_shot(&mut self, context: &VulkanContext, kind: OneShotKind) -> Result<(vk::CommandPool, vk::CommandBuffer), ResourceError> {
        if !self.one_shot_slots.contains_key(&kind) {
            self.one_shot_slots.insert(kind, OneShotSlot::new(context)?);
        }
        let slot = self.one_shot_slots.get(&kind).expect("slot created above");
        let device = context.device();
        slot.fence.wait(u64::MAX)?;
        slot.fence.reset()?;
        unsafe {
            device
                .reset_command_buffer(slot.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(VulkanError::from)?;
        }
        let begin_info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            device
                .begin_command_buffer(slot.command_buffer, &begin_info)
                .map_err(VulkanError::from)?;
        }
        Ok((slot.pool, slot.command_buffer))
    }

    /// End and submit `kind`'s one-shot command buffer against its own
    /// fence, then wait on just that fence — never a queue-wide
    /// `queue_wait_idle` — so other in-flight work on the graphics queue is
    /// left undisturbed.
    fn end_one_shot(&self, context: &VulkanContext, kind: OneShotKind, command_buffer: vk::CommandBuffer) -> Result<(), ResourceError> {
        let slot = self.one_shot_slots.get(&kind).ok_or(ResourceError::NotFound)?;
        let device = context.device();
        unsafe {
            device.end_command_buffer(command_buffer).map_err(VulkanError::from)?;
            let submit_info = vk::SubmitInfo::builder().command_buffers(std::slice::from_ref(&command_buffer));
            device
                .queue_submit(context.graphics_queue(), std::slice::from_ref(&submit_info), slot.fence.handle())
                .map_err(VulkanError::from)?;
        }
        slot.fence.wait(u64::MAX)?;
        Ok(())
    }
}
