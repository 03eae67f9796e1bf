//! Shader modules and graphics pipeline construction.
//!
//! Every graphics-catalogue entry compiles down to a
//! [`GraphicsPipeline`] built from a vertex/fragment [`ShaderModule`] pair
//! plus a vertex input description. Pipelines are small and numerous (one
//! per graphics type in use), so this stays a thin builder rather than a
//! cache — the catalogue owns caching.

use std::fs;
use std::path::Path;

use ash::vk;

use super::{VulkanError, VulkanResult};

/// A compiled SPIR-V module for one shader stage.
pub struct ShaderModule {
    device: ash::Device,
    module: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
    entry_point: std::ffi::CString,
}

impl ShaderModule {
    /// Load SPIR-V bytecode from `path` and create a module for `stage`.
    pub fn from_file(device: &ash::Device, path: &Path, stage: vk::ShaderStageFlags) -> VulkanResult<Self> {
        let bytes = fs::read(path)
            .map_err(|e| VulkanError::InitializationFailed(format!("reading shader {path:?}: {e}")))?;
        Self::from_bytes(device, &bytes, stage)
    }

    /// Create a module directly from SPIR-V bytes (must be a multiple of 4).
    pub fn from_bytes(device: &ash::Device, bytes: &[u8], stage: vk::ShaderStageFlags) -> VulkanResult<Self> {
        if bytes.len() % 4 != 0 {
            return Err(VulkanError::InitializationFailed(
                "SPIR-V bytecode length must be a multiple of 4".into(),
            ));
        }
        let code: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::builder().code(&code);
        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::from)?
        };

        Ok(Self {
            device: device.clone(),
            module,
            stage,
            entry_point: std::ffi::CString::new("main").unwrap(),
        })
    }

    /// Pipeline-stage-create-info pointing at this module's `main` entry point.
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(self.stage)
            .module(self.module)
            .name(&self.entry_point)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Everything needed to build one [`GraphicsPipeline`]: shader stages,
/// vertex layout, topology, and the descriptor set layouts it binds.
pub struct GraphicsPipelineDesc<'a> {
    pub vertex_shader: &'a ShaderModule,
    pub fragment_shader: &'a ShaderModule,
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    pub topology: vk::PrimitiveTopology,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub depth_test: bool,
    pub depth_write: bool,
    pub blend_enabled: bool,
    pub descriptor_set_layouts: &'a [vk::DescriptorSetLayout],
    pub render_pass: vk::RenderPass,
    pub extent: vk::Extent2D,
}

/// A complete graphics pipeline plus the layout it was built with.
pub struct GraphicsPipeline {
    device: ash::Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    /// Build a pipeline from `desc`, fixed to a single viewport/scissor
    /// matching `desc.extent`. Pipelines are recreated on resize alongside
    /// the swapchain rather than carrying dynamic viewport state.
    pub fn new(device: &ash::Device, desc: &GraphicsPipelineDesc) -> VulkanResult<Self> {
        let stages = [desc.vertex_shader.stage_info(), desc.fragment_shader.stage_info()];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&desc.vertex_bindings)
            .vertex_attribute_descriptions(&desc.vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(desc.topology)
            .primitive_restart_enable(false);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: desc.extent.width as f32,
            height: desc.extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: desc.extent,
        };
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(std::slice::from_ref(&viewport))
            .scissors(std::slice::from_ref(&scissor));

        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(desc.polygon_mode)
            .line_width(1.0)
            .cull_mode(desc.cull_mode)
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_bias_enable(false);

        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(desc.depth_test)
            .depth_write_enable(desc.depth_write)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let blend_attachment = if desc.blend_enabled {
            vk::PipelineColorBlendAttachmentState::builder()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD)
                .build()
        } else {
            vk::PipelineColorBlendAttachmentState::builder()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)
                .build()
        };
        let color_blend = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&blend_attachment));

        let layout_info = vk::PipelineLayoutCreateInfo::builder().set_layouts(desc.descriptor_set_layouts);
        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::from)?
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .layout(layout)
            .render_pass(desc.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&pipeline_info), None)
                .map_err(|(_, e)| VulkanError::from(e))?
        };

        Ok(Self {
            device: device.clone(),
            pipeline: pipelines[0],
            layout,
        })
    }

    /// Raw pipeline handle.
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Raw pipeline layout handle (for descriptor-set and push-constant binding).
    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
