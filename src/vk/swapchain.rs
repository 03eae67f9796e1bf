//! Swapchain, render pass, and per-image framebuffer/depth-buffer wiring.

use ash::extensions::khr;
use ash::vk;

use super::{Surface, VulkanContext, VulkanError, VulkanResult};

fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|f| f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
        .copied()
        .unwrap_or(formats[0])
}

fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, requested: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: requested
                .0
                .clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
            height: requested
                .1
                .clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
        }
    }
}

/// Owns the presentable image chain plus the render pass and per-image
/// framebuffers/depth buffers that draw into it. Recreated wholesale on
/// resize or `VK_ERROR_OUT_OF_DATE_KHR`/`SUBOPTIMAL_KHR`.
pub struct Swapchain {
    device: ash::Device,
    swapchain_loader: khr::Swapchain,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    extent: vk::Extent2D,
    render_pass: vk::RenderPass,
    depth_images: Vec<(vk::Image, vk::DeviceMemory, vk::ImageView)>,
    framebuffers: Vec<vk::Framebuffer>,
}

impl Swapchain {
    /// Create the swapchain and its dependent render targets for the given surface.
    pub fn new(
        context: &VulkanContext,
        surface: &Surface,
        preferred_image_count: u32,
        requested_extent: (u32, u32),
    ) -> VulkanResult<Self> {
        let physical_device = context.physical_device().device;
        let capabilities = surface.capabilities(physical_device)?;
        let formats = surface.formats(physical_device)?;
        let present_modes = surface.present_modes(physical_device)?;

        let surface_format = choose_surface_format(&formats);
        let present_mode = choose_present_mode(&present_modes);
        let extent = choose_extent(&capabilities, requested_extent);

        let mut image_count = preferred_image_count.max(capabilities.min_image_count);
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let swapchain_loader = khr::Swapchain::new(context.instance(), context.device());
        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::from)?
        };

        let images = unsafe {
            swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::from)?
        };

        let image_views = Self::create_image_views(context.device(), &images, surface_format.format)?;
        let render_pass = Self::create_render_pass(context.device(), surface_format.format)?;
        let depth_images = Self::create_depth_images(context, images.len(), extent)?;
        let framebuffers =
            Self::create_framebuffers(context.device(), render_pass, &image_views, &depth_images, extent)?;

        log::info!(
            "swapchain created: {} images, {}x{}, format {:?}",
            images.len(),
            extent.width,
            extent.height,
            surface_format.format
        );

        Ok(Self {
            device: context.device().clone(),
            swapchain_loader,
            swapchain,
            images,
            image_views,
            format: surface_format.format,
            extent,
            render_pass,
            depth_images,
            framebuffers,
        })
    }

    fn create_image_views(
        device: &ash::Device,
        images: &[vk::Image],
        format: vk::Format,
    ) -> VulkanResult<Vec<vk::ImageView>> {
        images
            .iter()
            .map(|&image| {
                let create_info = vk::ImageViewCreateInfo::builder()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                unsafe { device.create_image_view(&create_info, None).map_err(VulkanError::from) }
            })
            .collect()
    }

    fn create_render_pass(device: &ash::Device, format: vk::Format) -> VulkanResult<vk::RenderPass> {
        let color_attachment = vk::AttachmentDescription::builder()
            .format(format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .build();

        let depth_attachment = vk::AttachmentDescription::builder()
            .format(vk::Format::D32_SFLOAT)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentLoadOp::DONT_CARE.into())
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            .build();

        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };

        let color_refs = [color_ref];
        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref)
            .build();

        let dependency = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            )
            .build();

        let attachments = [color_attachment, depth_attachment];
        let subpasses = [subpass];
        let dependencies = [dependency];
        let create_info = vk::RenderPassCreateInfo::builder()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        unsafe { device.create_render_pass(&create_info, None).map_err(VulkanError::from) }
    }

    fn create_depth_images(
        context: &VulkanContext,
        count: usize,
        extent: vk::Extent2D,
    ) -> VulkanResult<Vec<(vk::Image, vk::DeviceMemory, vk::ImageView)>> {
        (0..count)
            .map(|_| Self::create_depth_image(context, extent))
            .collect()
    }

    fn create_depth_image(
        context: &VulkanContext,
        extent: vk::Extent2D,
    ) -> VulkanResult<(vk::Image, vk::DeviceMemory, vk::ImageView)> {
        let device = context.device();
        let format = vk::Format::D32_SFLOAT;

        let image_info = vk::ImageCreateInfo::builder()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .samples(vk::SampleCountFlags::TYPE_1)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let image = unsafe { device.create_image(&image_info, None).map_err(VulkanError::from)? };
        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let memory_type = find_memory_type(
            &context.physical_device().memory_properties,
            requirements.memory_type_bits,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);
        let memory = unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::from)? };
        unsafe {
            device.bind_image_memory(image, memory, 0).map_err(VulkanError::from)?;
        }

        let view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        let view = unsafe { device.create_image_view(&view_info, None).map_err(VulkanError::from)? };

        Ok((image, memory, view))
    }

    fn create_framebuffers(
        device: &ash::Device,
        render_pass: vk::RenderPass,
        image_views: &[vk::ImageView],
        depth_images: &[(vk::Image, vk::DeviceMemory, vk::ImageView)],
        extent: vk::Extent2D,
    ) -> VulkanResult<Vec<vk::Framebuffer>> {
        image_views
            .iter()
            .zip(depth_images.iter())
            .map(|(&color_view, &(_, _, depth_view))| {
                let attachments = [color_view, depth_view];
                let create_info = vk::FramebufferCreateInfo::builder()
                    .render_pass(render_pass)
                    .attachments(&attachments)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);
                unsafe { device.create_framebuffer(&create_info, None).map_err(VulkanError::from) }
            })
            .collect()
    }

    /// Acquire the index of the next presentable image, signaling `signal` when ready.
    ///
    /// Returns `Err(VulkanError::Api(ERROR_OUT_OF_DATE_KHR))` when the swapchain must be
    /// recreated; the runner maps this to `EngineError::SwapchainOutOfDate`.
    pub fn acquire_next_image(&self, signal: vk::Semaphore) -> VulkanResult<(u32, bool)> {
        unsafe {
            self.swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, signal, vk::Fence::null())
                .map_err(VulkanError::from)
        }
    }

    /// Present `image_index`, waiting on `wait` (normally the frame's render-finished semaphore).
    pub fn present(&self, present_queue: vk::Queue, image_index: u32, wait: vk::Semaphore) -> VulkanResult<bool> {
        let wait_semaphores = [wait];
        let swapchains = [self.swapchain];
        let indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&indices);

        unsafe {
            self.swapchain_loader
                .queue_present(present_queue, &present_info)
                .map_err(VulkanError::from)
        }
    }

    /// Number of images the presentation engine owns (the `N` in dup-Dat bookkeeping).
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Swapchain surface format.
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// The single render pass every framebuffer was created against.
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Framebuffer for a given swapchain image index.
    pub fn framebuffer(&self, image_index: usize) -> vk::Framebuffer {
        self.framebuffers[image_index]
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        log::debug!("destroying swapchain and its {} framebuffers", self.framebuffers.len());
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            for &(image, memory, view) in &self.depth_images {
                self.device.destroy_image_view(view, None);
                self.device.destroy_image(image, None);
                self.device.free_memory(memory, None);
            }
            self.device.destroy_render_pass(self.render_pass, None);
            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

fn find_memory_type(
    memory_properties: &vk::PhysicalDeviceMemoryProperties,
    type_filter: u32,
    required_properties: vk::MemoryPropertyFlags,
) -> VulkanResult<u32> {
    for i in 0..memory_properties.memory_type_count {
        let suitable = (type_filter & (1 << i)) != 0;
        let matches = memory_properties.memory_types[i as usize]
            .property_flags
            .contains(required_properties);
        if suitable && matches {
            return Ok(i);
        }
    }
    Err(VulkanError::NoSuitableMemoryType)
}
