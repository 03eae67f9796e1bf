//! Descriptor set layout/pool wrappers.
//!
//! The shader interface is fixed: binding 0 is the MVP uniform, binding 1
//! is the Viewport uniform, and binding 2+ are pipeline-specific
//! params/textures declared by the graphics catalogue. This builder is how
//! the catalogue assembles a `VkDescriptorSetLayout` for each entry.

use ash::vk;

use super::{VulkanError, VulkanResult};

/// RAII descriptor set layout.
pub struct DescriptorSetLayout {
    device: ash::Device,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Raw layout handle.
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Builds a [`DescriptorSetLayout`] binding-by-binding in declaration order,
/// matching the way the graphics catalogue lists a pipeline's descriptor
/// slots.
#[derive(Default)]
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a uniform buffer binding (MVP, Viewport, or a pipeline param block).
    pub fn add_uniform_buffer(mut self, binding: u32, stage: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
        );
        self
    }

    /// Declare a storage buffer binding.
    pub fn add_storage_buffer(mut self, binding: u32, stage: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
        );
        self
    }

    /// Declare a combined image sampler binding (a texture source).
    pub fn add_combined_image_sampler(mut self, binding: u32, stage: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(stage)
                .build(),
        );
        self
    }

    /// Build the layout.
    pub fn build(self, device: &ash::Device) -> VulkanResult<DescriptorSetLayout> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);
        let layout = unsafe {
            device
                .create_descriptor_set_layout(&create_info, None)
                .map_err(VulkanError::from)?
        };
        Ok(DescriptorSetLayout {
            device: device.clone(),
            layout,
        })
    }
}

/// RAII descriptor pool sized for a fixed number of sets/bindings at creation time.
pub struct DescriptorPool {
    device: ash::Device,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    /// Create a pool able to allocate `max_sets` sets drawing from `pool_sizes`.
    pub fn new(device: &ash::Device, max_sets: u32, pool_sizes: &[vk::DescriptorPoolSize]) -> VulkanResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes)
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET);
        let pool = unsafe {
            device
                .create_descriptor_pool(&create_info, None)
                .map_err(VulkanError::from)?
        };
        Ok(Self {
            device: device.clone(),
            pool,
        })
    }

    /// Allocate one set per layout in `layouts`.
    pub fn allocate(&self, layouts: &[vk::DescriptorSetLayout]) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);
        unsafe { self.device.allocate_descriptor_sets(&alloc_info).map_err(VulkanError::from) }
    }

    /// Raw pool handle.
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}
