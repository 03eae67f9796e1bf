//! Pipeline cache: builds and caches one [`GraphicsPipeline`] (and the
//! descriptor set layout its catalogue entry declares) per [`GraphicsType`]
//! on first use. There are at most seventeen builtin graphics types, so the
//! cache never evicts — it exists purely to avoid rebuilding a pipeline
//! every frame for a visual that requested it once.

use std::collections::HashMap;

use ash::vk;

use crate::core::config::ShaderConfig;
use crate::vk::{
    DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, GraphicsPipeline, ShaderModule, VulkanResult,
};

use super::catalogue::{self, CatalogueEntry, GraphicsType};

/// A built pipeline plus the descriptor set layout and catalogue entry it
/// was built from (the entry's `descriptor_slots` tell a visual which of
/// its sources bind to which slot).
pub struct CachedPipeline {
    pub pipeline: GraphicsPipeline,
    pub descriptor_layout: DescriptorSetLayout,
    pub entry: CatalogueEntry,
}

/// Lazily builds one [`CachedPipeline`] per graphics type actually
/// requested, plus a shared descriptor pool every visual allocates its
/// one descriptor set from.
pub struct PipelineCache {
    device: ash::Device,
    shaders: ShaderConfig,
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
    entries: HashMap<GraphicsType, CachedPipeline>,
    pool: DescriptorPool,
}

impl PipelineCache {
    /// Build a cache targeting `render_pass`/`extent`, with a descriptor
    /// pool sized for up to `max_visuals` concurrently bound descriptor
    /// sets (one per visual, regardless of which graphics type it uses).
    pub fn new(
        device: &ash::Device,
        shaders: ShaderConfig,
        render_pass: vk::RenderPass,
        extent: vk::Extent2D,
        max_visuals: u32,
    ) -> VulkanResult<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: max_visuals * 2,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: max_visuals,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: max_visuals * 2,
            },
        ];
        let pool = DescriptorPool::new(device, max_visuals, &pool_sizes)?;
        Ok(Self {
            device: device.clone(),
            shaders,
            render_pass,
            extent,
            entries: HashMap::new(),
            pool,
        })
    }

    /// Get or build the cached pipeline for `graphics_type`, compiling its
    /// shader stages from `self.shaders`' search path
    /// (`<shader_name>.vert.spv`/`.frag.spv`).
    pub fn get_or_create(&mut self, graphics_type: GraphicsType) -> VulkanResult<&CachedPipeline> {
        if !self.entries.contains_key(&graphics_type) {
            let entry = catalogue::describe(graphics_type);
            let layout = build_descriptor_layout(&self.device, &entry)?;

            let vertex_path = self.shaders.stage_path(graphics_type.shader_name(), "vert");
            let fragment_path = self.shaders.stage_path(graphics_type.shader_name(), "frag");
            let vertex_shader = ShaderModule::from_file(
                &self.device,
                std::path::Path::new(&vertex_path),
                vk::ShaderStageFlags::VERTEX,
            )?;
            let fragment_shader = ShaderModule::from_file(
                &self.device,
                std::path::Path::new(&fragment_path),
                vk::ShaderStageFlags::FRAGMENT,
            )?;

            let set_layouts = [layout.handle()];
            let desc = catalogue::pipeline_desc(
                &entry,
                &vertex_shader,
                &fragment_shader,
                &set_layouts,
                self.render_pass,
                self.extent,
            );
            let pipeline = GraphicsPipeline::new(&self.device, &desc)?;

            log::debug!("built pipeline for graphics type {graphics_type:?}");
            self.entries.insert(
                graphics_type,
                CachedPipeline {
                    pipeline,
                    descriptor_layout: layout,
                    entry,
                },
            );
        }
        Ok(self.entries.get(&graphics_type).expect("just inserted above"))
    }

    /// Borrow an already-built entry, if `get_or_create` has run for it.
    pub fn get(&self, graphics_type: GraphicsType) -> Option<&CachedPipeline> {
        self.entries.get(&graphics_type)
    }

    /// Allocate one descriptor set from `graphics_type`'s layout. Callers
    /// must have called `get_or_create` for that type first.
    pub fn allocate_descriptor_set(&self, graphics_type: GraphicsType) -> VulkanResult<vk::DescriptorSet> {
        let entry = self
            .entries
            .get(&graphics_type)
            .expect("get_or_create must run before allocate_descriptor_set");
        let sets = self.pool.allocate(&[entry.descriptor_layout.handle()])?;
        Ok(sets[0])
    }
}

fn build_descriptor_layout(device: &ash::Device, entry: &CatalogueEntry) -> VulkanResult<DescriptorSetLayout> {
    let mut builder = DescriptorSetLayoutBuilder::new();
    for slot in &entry.descriptor_slots {
        builder = match slot.descriptor_type {
            vk::DescriptorType::STORAGE_BUFFER => builder.add_storage_buffer(slot.binding, slot.stage),
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER => builder.add_combined_image_sampler(slot.binding, slot.stage),
            _ => builder.add_uniform_buffer(slot.binding, slot.stage),
        };
    }
    builder.build(device)
}
