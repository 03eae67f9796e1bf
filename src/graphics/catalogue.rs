//! Graphics catalogue: a table keyed by graphics type mapping to a
//! complete pipeline description. Visuals request a builtin graphics from
//! here and associate their own sources with its declared descriptor slots.

use ash::vk;

use crate::vk::{GraphicsPipelineDesc, ShaderModule};

use super::vertex::{ImageVertex, MeshVertex, PointVertex, SegmentVertex, TextVertex};

/// Byte offset of `$field` within `$ty`, for vertex attribute descriptions.
macro_rules! offset_of {
    ($ty:ty, $field:ident) => {{
        let dummy = std::mem::MaybeUninit::<$ty>::uninit();
        let base = dummy.as_ptr();
        #[allow(unused_unsafe)]
        unsafe {
            let field = std::ptr::addr_of!((*base).$field);
            (field as *const u8).offset_from(base as *const u8) as u32
        }
    }};
}

/// The builtin graphics types a visual can request from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsType {
    Point,
    Line,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    Marker,
    Segment,
    Arrow,
    Path,
    Text,
    Image,
    ImageCmap,
    VolumeSlice,
    Volume,
    Mesh,
    FakeSphere,
}

impl GraphicsType {
    /// Every builtin graphics type, in catalogue-declaration order.
    pub const ALL: &'static [GraphicsType] = &[
        GraphicsType::Point,
        GraphicsType::Line,
        GraphicsType::LineStrip,
        GraphicsType::TriangleList,
        GraphicsType::TriangleStrip,
        GraphicsType::TriangleFan,
        GraphicsType::Marker,
        GraphicsType::Segment,
        GraphicsType::Arrow,
        GraphicsType::Path,
        GraphicsType::Text,
        GraphicsType::Image,
        GraphicsType::ImageCmap,
        GraphicsType::VolumeSlice,
        GraphicsType::Volume,
        GraphicsType::Mesh,
        GraphicsType::FakeSphere,
    ];

    /// Base shader name this graphics type's SPIR-V is compiled from, e.g.
    /// `"point"` resolves to `point.vert.spv`/`point.frag.spv` via
    /// [`crate::core::config::ShaderConfig::stage_path`].
    pub fn shader_name(self) -> &'static str {
        match self {
            GraphicsType::Point => "point",
            GraphicsType::Line => "line",
            GraphicsType::LineStrip => "line_strip",
            GraphicsType::TriangleList => "triangle",
            GraphicsType::TriangleStrip => "triangle_strip",
            GraphicsType::TriangleFan => "triangle_fan",
            GraphicsType::Marker => "marker",
            GraphicsType::Segment => "segment",
            GraphicsType::Arrow => "arrow",
            GraphicsType::Path => "path",
            GraphicsType::Text => "text",
            GraphicsType::Image => "image",
            GraphicsType::ImageCmap => "image_cmap",
            GraphicsType::VolumeSlice => "volume_slice",
            GraphicsType::Volume => "volume",
            GraphicsType::Mesh => "mesh",
            GraphicsType::FakeSphere => "fake_sphere",
        }
    }
}

/// One descriptor slot a pipeline expects at binding 2+ (0/1 are always
/// MVP/Viewport).
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSlot {
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub stage: vk::ShaderStageFlags,
}

/// A catalogue entry: everything needed to build the pipeline for one
/// graphics type, short of the shader modules and render pass (supplied at
/// build time by the visual requesting it).
pub struct CatalogueEntry {
    pub graphics_type: GraphicsType,
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    pub topology: vk::PrimitiveTopology,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub depth_test: bool,
    pub blend_enabled: bool,
    pub descriptor_slots: Vec<DescriptorSlot>,
}

/// Look up the catalogue entry for `graphics_type`.
pub fn describe(graphics_type: GraphicsType) -> CatalogueEntry {
    use GraphicsType::*;

    let mvp_viewport_slots = vec![
        DescriptorSlot {
            binding: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            stage: vk::ShaderStageFlags::VERTEX,
        },
        DescriptorSlot {
            binding: 1,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            stage: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
        },
    ];

    match graphics_type {
        Point | Marker => CatalogueEntry {
            graphics_type,
            vertex_bindings: point_bindings(),
            vertex_attributes: point_attributes(),
            topology: vk::PrimitiveTopology::POINT_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: true,
            blend_enabled: true,
            descriptor_slots: mvp_viewport_slots,
        },
        Line => CatalogueEntry {
            graphics_type,
            vertex_bindings: segment_bindings(),
            vertex_attributes: segment_attributes(),
            topology: vk::PrimitiveTopology::LINE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: true,
            blend_enabled: true,
            descriptor_slots: mvp_viewport_slots,
        },
        Segment | Arrow => CatalogueEntry {
            graphics_type,
            vertex_bindings: segment_bindings(),
            vertex_attributes: segment_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: true,
            blend_enabled: true,
            descriptor_slots: mvp_viewport_slots,
        },
        LineStrip | Path => CatalogueEntry {
            graphics_type,
            vertex_bindings: mesh_bindings(),
            vertex_attributes: mesh_attributes(),
            topology: vk::PrimitiveTopology::LINE_STRIP,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: true,
            blend_enabled: true,
            descriptor_slots: mvp_viewport_slots,
        },
        TriangleList | FakeSphere => CatalogueEntry {
            graphics_type,
            vertex_bindings: mesh_bindings(),
            vertex_attributes: mesh_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            depth_test: true,
            blend_enabled: false,
            descriptor_slots: mvp_viewport_slots,
        },
        TriangleStrip => CatalogueEntry {
            graphics_type,
            vertex_bindings: mesh_bindings(),
            vertex_attributes: mesh_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_STRIP,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            depth_test: true,
            blend_enabled: false,
            descriptor_slots: mvp_viewport_slots,
        },
        TriangleFan => CatalogueEntry {
            graphics_type,
            vertex_bindings: mesh_bindings(),
            vertex_attributes: mesh_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_FAN,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: true,
            blend_enabled: false,
            descriptor_slots: mvp_viewport_slots,
        },
        Mesh | Volume => CatalogueEntry {
            graphics_type,
            vertex_bindings: mesh_bindings(),
            vertex_attributes: mesh_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            depth_test: true,
            blend_enabled: false,
            descriptor_slots: {
                let mut slots = mvp_viewport_slots.clone();
                slots.push(DescriptorSlot {
                    binding: 2,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    stage: vk::ShaderStageFlags::FRAGMENT,
                });
                slots
            },
        },
        Text => CatalogueEntry {
            graphics_type,
            vertex_bindings: text_bindings(),
            vertex_attributes: text_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: false,
            blend_enabled: true,
            descriptor_slots: {
                let mut slots = mvp_viewport_slots.clone();
                slots.push(DescriptorSlot {
                    binding: 2,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    stage: vk::ShaderStageFlags::FRAGMENT,
                });
                slots
            },
        },
        Image | ImageCmap | VolumeSlice => CatalogueEntry {
            graphics_type,
            vertex_bindings: image_bindings(),
            vertex_attributes: image_attributes(),
            topology: vk::PrimitiveTopology::TRIANGLE_STRIP,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            depth_test: false,
            blend_enabled: true,
            descriptor_slots: {
                let mut slots = mvp_viewport_slots.clone();
                slots.push(DescriptorSlot {
                    binding: 2,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    stage: vk::ShaderStageFlags::FRAGMENT,
                });
                if matches!(graphics_type, ImageCmap) {
                    slots.push(DescriptorSlot {
                        binding: 3,
                        descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                        stage: vk::ShaderStageFlags::FRAGMENT,
                    });
                }
                slots
            },
        },
    }
}

/// Build the full [`GraphicsPipelineDesc`] for `entry` against already-loaded
/// shader modules.
pub fn pipeline_desc<'a>(
    entry: &CatalogueEntry,
    vertex_shader: &'a ShaderModule,
    fragment_shader: &'a ShaderModule,
    descriptor_set_layouts: &'a [vk::DescriptorSetLayout],
    render_pass: vk::RenderPass,
    extent: vk::Extent2D,
) -> GraphicsPipelineDesc<'a> {
    GraphicsPipelineDesc {
        vertex_shader,
        fragment_shader,
        vertex_bindings: entry.vertex_bindings.clone(),
        vertex_attributes: entry.vertex_attributes.clone(),
        topology: entry.topology,
        polygon_mode: entry.polygon_mode,
        cull_mode: entry.cull_mode,
        depth_test: entry.depth_test,
        depth_write: entry.depth_test,
        blend_enabled: entry.blend_enabled,
        descriptor_set_layouts,
        render_pass,
        extent,
    }
}

fn point_bindings() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<PointVertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }]
}

fn point_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    vec![
        attr(0, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(PointVertex, pos)),
        attr(1, 0, vk::Format::R8G8B8A8_UNORM, offset_of!(PointVertex, color)),
        attr(2, 0, vk::Format::R32_SFLOAT, offset_of!(PointVertex, size)),
    ]
}

fn segment_bindings() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<SegmentVertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }]
}

fn segment_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    vec![
        attr(0, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(SegmentVertex, p0)),
        attr(1, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(SegmentVertex, p1)),
        attr(2, 0, vk::Format::R32G32B32A32_SFLOAT, offset_of!(SegmentVertex, shift)),
        attr(3, 0, vk::Format::R8G8B8A8_UNORM, offset_of!(SegmentVertex, color)),
        attr(4, 0, vk::Format::R32_SFLOAT, offset_of!(SegmentVertex, linewidth)),
        attr(5, 0, vk::Format::R8G8B8A8_UINT, offset_of!(SegmentVertex, cap0)),
    ]
}

fn text_bindings() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<TextVertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }]
}

fn text_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    vec![
        attr(0, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(TextVertex, pos)),
        attr(1, 0, vk::Format::R32G32_SFLOAT, offset_of!(TextVertex, shift)),
        attr(2, 0, vk::Format::R8G8B8A8_UNORM, offset_of!(TextVertex, color)),
        attr(3, 0, vk::Format::R32G32_SFLOAT, offset_of!(TextVertex, glyph_size)),
        attr(4, 0, vk::Format::R32G32_SFLOAT, offset_of!(TextVertex, anchor)),
        attr(5, 0, vk::Format::R32_SFLOAT, offset_of!(TextVertex, angle)),
        attr(6, 0, vk::Format::R16G16B16A16_UINT, offset_of!(TextVertex, glyph)),
    ]
}

fn mesh_bindings() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<MeshVertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }]
}

fn mesh_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    vec![
        attr(0, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(MeshVertex, pos)),
        attr(1, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(MeshVertex, normal)),
        attr(2, 0, vk::Format::R8G8B8A8_UNORM, offset_of!(MeshVertex, color)),
        attr(3, 0, vk::Format::R32G32_SFLOAT, offset_of!(MeshVertex, tex_coords)),
    ]
}

fn image_bindings() -> Vec<vk::VertexInputBindingDescription> {
    vec![vk::VertexInputBindingDescription {
        binding: 0,
        stride: std::mem::size_of::<ImageVertex>() as u32,
        input_rate: vk::VertexInputRate::VERTEX,
    }]
}

fn image_attributes() -> Vec<vk::VertexInputAttributeDescription> {
    vec![
        attr(0, 0, vk::Format::R32G32B32_SFLOAT, offset_of!(ImageVertex, pos)),
        attr(1, 0, vk::Format::R32G32_SFLOAT, offset_of!(ImageVertex, tex_coords)),
    ]
}

fn attr(location: u32, binding: u32, format: vk::Format, offset: u32) -> vk::VertexInputAttributeDescription {
    vk::VertexInputAttributeDescription {
        location,
        binding,
        format,
        offset,
    }
}
