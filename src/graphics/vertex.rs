//! Vertex layouts for builtin graphics types. Field offsets and types are
//! part of the wire contract with the shaders — they must not be
//! reordered without updating the corresponding SPIR-V.

use bytemuck::{Pod, Zeroable};

/// Vertex layout for `Point` and `Marker` graphics.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PointVertex {
    pub pos: [f32; 3],
    pub color: [u8; 4],
    pub size: f32,
}

/// Vertex layout for `Segment` and `Arrow` graphics: a line from `p0` to
/// `p1` with a per-vertex shift (used for cap/join extrusion in the vertex
/// shader) and independent start/end cap styles.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SegmentVertex {
    pub p0: [f32; 3],
    pub p1: [f32; 3],
    pub shift: [f32; 4],
    pub color: [u8; 4],
    pub linewidth: f32,
    pub cap0: u8,
    pub cap1: u8,
    pub transform: u8,
    _pad: u8,
}

impl SegmentVertex {
    /// Construct a segment vertex, zeroing the trailing alignment pad.
    pub fn new(
        p0: [f32; 3],
        p1: [f32; 3],
        shift: [f32; 4],
        color: [u8; 4],
        linewidth: f32,
        cap0: u8,
        cap1: u8,
        transform: u8,
    ) -> Self {
        Self {
            p0,
            p1,
            shift,
            color,
            linewidth,
            cap0,
            cap1,
            transform,
            _pad: 0,
        }
    }
}

/// Vertex layout for `Text` graphics: one quad corner per vertex, with
/// glyph atlas coordinates packed into `glyph`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct TextVertex {
    pub pos: [f32; 3],
    pub shift: [f32; 2],
    pub color: [u8; 4],
    pub glyph_size: [f32; 2],
    pub anchor: [f32; 2],
    pub angle: f32,
    pub glyph: [u16; 4],
    pub transform: u8,
    _pad: [u8; 3],
}

impl TextVertex {
    /// Construct a text vertex, zeroing the trailing alignment pad.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: [f32; 3],
        shift: [f32; 2],
        color: [u8; 4],
        glyph_size: [f32; 2],
        anchor: [f32; 2],
        angle: f32,
        glyph: [u16; 4],
        transform: u8,
    ) -> Self {
        Self {
            pos,
            shift,
            color,
            glyph_size,
            anchor,
            angle,
            glyph,
            transform,
            _pad: [0; 3],
        }
    }
}

/// Vertex layout shared by `Line`, `LineStrip`, `Triangle{List,Strip,Fan}`,
/// `Path`, `Mesh`, and the volume/image graphics: position, normal (zeroed
/// for purely 2D graphics), color, and texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
    pub tex_coords: [f32; 2],
}

/// Vertex layout for `Image`/`ImageCmap`/`VolumeSlice`: a screen-aligned
/// quad corner plus texture coordinates, no lighting.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ImageVertex {
    pub pos: [f32; 3],
    pub tex_coords: [f32; 2],
}
