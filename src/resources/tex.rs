//! `Tex`: a Vulkan image + view + sampler triple with an immutable
//! format/extent/tiling after creation. 1D/2D/3D share this one type.

use ash::vk;

use crate::vk::{VulkanContext, VulkanError, VulkanResult};

/// Dimensionality of a [`Tex`]. All three share the same upload/download/copy
/// API; only the `VkImageType`/`VkImageViewType` differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexDims {
    One,
    Two,
    Three,
}

impl TexDims {
    fn image_type(self) -> vk::ImageType {
        match self {
            TexDims::One => vk::ImageType::TYPE_1D,
            TexDims::Two => vk::ImageType::TYPE_2D,
            TexDims::Three => vk::ImageType::TYPE_3D,
        }
    }

    fn view_type(self) -> vk::ImageViewType {
        match self {
            TexDims::One => vk::ImageViewType::TYPE_1D,
            TexDims::Two => vk::ImageViewType::TYPE_2D,
            TexDims::Three => vk::ImageViewType::TYPE_3D,
        }
    }
}

/// The number of mip levels a full chain needs for `max(width, height)`,
/// per `floor(log2(max(w, h))) + 1`.
pub fn mip_levels_for(width: u32, height: u32) -> u32 {
    (32 - (width.max(height).max(1)).leading_zeros()).max(1)
}

/// Bytes per texel for the formats the builtin textures (colormaps, font
/// atlases, volume slices) use. Unrecognized formats fall back to 4 bytes
/// (the common case) with a warning, rather than panicking on a format this
/// engine doesn't otherwise construct.
pub fn format_texel_size(format: vk::Format) -> u32 {
    match format {
        vk::Format::R8_UNORM | vk::Format::R8_UINT => 1,
        vk::Format::R8G8_UNORM => 2,
        vk::Format::R8G8B8A8_UNORM | vk::Format::R8G8B8A8_UINT | vk::Format::B8G8R8A8_UNORM => 4,
        vk::Format::R32_SFLOAT | vk::Format::R32_UINT => 4,
        vk::Format::R32G32_SFLOAT => 8,
        vk::Format::R16G16B16A16_UINT | vk::Format::R16G16B16A16_SFLOAT => 8,
        vk::Format::R32G32B32A32_SFLOAT => 16,
        other => {
            log::warn!("format_texel_size: unrecognized format {other:?}, assuming 4 bytes/texel");
            4
        }
    }
}

/// A Vulkan image, its full-chain view, and a sampler, with format, extent,
/// tiling, and layout fixed after creation. Layout transitions happen
/// internally during upload/download/copy; callers never track layout.
pub struct Tex {
    device: ash::Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    sampler: vk::Sampler,
    dims: TexDims,
    format: vk::Format,
    extent: vk::Extent3D,
    mip_levels: u32,
    layout: vk::ImageLayout,
}

impl Tex {
    /// Create a texture of `dims`, `format`, and `extent`, with a full mip
    /// chain when `generate_mips` is set (2D/3D images used as sampled
    /// color attachments; 1D colormap rows stay single-level).
    pub fn new(
        context: &VulkanContext,
        dims: TexDims,
        format: vk::Format,
        extent: vk::Extent3D,
        generate_mips: bool,
    ) -> VulkanResult<Self> {
        let device = context.device();
        let mip_levels = if generate_mips {
            mip_levels_for(extent.width, extent.height)
        } else {
            1
        };

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(dims.image_type())
            .format(format)
            .extent(extent)
            .mip_levels(mip_levels)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(
                vk::ImageUsageFlags::SAMPLED
                    | vk::ImageUsageFlags::TRANSFER_SRC
                    | vk::ImageUsageFlags::TRANSFER_DST,
            )
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);
        let image = unsafe { device.create_image(&image_info, None).map_err(VulkanError::from)? };

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type_index = find_memory_type(
            &context.physical_device().memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;
        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::from)? };
        unsafe {
            device
                .bind_image_memory(image, memory, 0)
                .map_err(VulkanError::from)?
        };

        let subresource = vk::ImageSubresourceRange::builder()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(mip_levels)
            .base_array_layer(0)
            .layer_count(1)
            .build();
        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(dims.view_type())
            .format(format)
            .subresource_range(subresource);
        let view = unsafe {
            device.create_image_view(&view_info, None).map_err(VulkanError::from)?
        };

        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .min_lod(0.0)
            .max_lod(mip_levels as f32)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);
        let sampler = unsafe {
            device.create_sampler(&sampler_info, None).map_err(VulkanError::from)?
        };

        Ok(Self {
            device: device.clone(),
            image,
            memory,
            view,
            sampler,
            dims,
            format,
            extent,
            mip_levels,
            layout: vk::ImageLayout::UNDEFINED,
        })
    }

    /// Raw image handle.
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Raw view handle (what descriptor sets bind).
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Raw sampler handle.
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Dimensionality.
    pub fn dims(&self) -> TexDims {
        self.dims
    }

    /// Pixel format, fixed at creation.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Extent in texels, fixed at creation.
    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }

    /// Mip level count.
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Current layout, mutated only by [`Self::transition_to`].
    pub fn layout(&self) -> vk::ImageLayout {
        self.layout
    }

    /// Record a layout transition on `command_buffer`. Called internally by
    /// the transfer engine's upload/download/copy jobs; callers of the
    /// resource manager never see or set layouts directly.
    pub fn transition_to(&mut self, device: &ash::Device, command_buffer: vk::CommandBuffer, new_layout: vk::ImageLayout) {
        if self.layout == new_layout {
            return;
        }
        let (src_access, dst_access, src_stage, dst_stage) = transition_masks(self.layout, new_layout);
        let barrier = vk::ImageMemoryBarrier::builder()
            .old_layout(self.layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(
                vk::ImageSubresourceRange::builder()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(self.mip_levels)
                    .base_array_layer(0)
                    .layer_count(1)
                    .build(),
            )
            .src_access_mask(src_access)
            .dst_access_mask(dst_access)
            .build();
        unsafe {
            device.cmd_pipeline_barrier(
                command_buffer,
                src_stage,
                dst_stage,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
        self.layout = new_layout;
    }
}

impl Drop for Tex {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
            self.device.destroy_image_view(self.view, None);
            self.device.destroy_image(self.image, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

fn transition_masks(
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> (vk::AccessFlags, vk::AccessFlags, vk::PipelineStageFlags, vk::PipelineStageFlags) {
    use vk::ImageLayout as L;
    match (old, new) {
        (L::UNDEFINED, L::TRANSFER_DST_OPTIMAL) => (
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_WRITE,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
        ),
        (L::TRANSFER_DST_OPTIMAL, L::SHADER_READ_ONLY_OPTIMAL) => (
            vk::AccessFlags::TRANSFER_WRITE,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        (L::SHADER_READ_ONLY_OPTIMAL, L::TRANSFER_SRC_OPTIMAL) => (
            vk::AccessFlags::SHADER_READ,
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::PipelineStageFlags::TRANSFER,
        ),
        (L::TRANSFER_SRC_OPTIMAL, L::SHADER_READ_ONLY_OPTIMAL) => (
            vk::AccessFlags::TRANSFER_READ,
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        (L::UNDEFINED, L::TRANSFER_SRC_OPTIMAL) => (
            vk::AccessFlags::empty(),
            vk::AccessFlags::TRANSFER_READ,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
        ),
        _ => (
            vk::AccessFlags::MEMORY_WRITE,
            vk::AccessFlags::MEMORY_READ,
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
        ),
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
    fn mip_levels_match_floor_log2_plus_one() {
        assert_eq!(mip_levels_for(1, 1), 1);
        assert_eq!(mip_levels_for(256, 256), 9);
        assert_eq!(mip_levels_for(800, 600), 10);
        assert_eq!(mip_levels_for(1, 1024), 11);
    }

    #[test]
    fn format_texel_size_matches_known_formats() {
        assert_eq!(format_texel_size(vk::Format::R8G8B8A8_UNORM), 4);
        assert_eq!(format_texel_size(vk::Format::R8_UNORM), 1);
        assert_eq!(format_texel_size(vk::Format::R32G32B32A32_SFLOAT), 16);
    }
}
