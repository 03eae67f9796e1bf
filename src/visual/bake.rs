//! Baking: turns a visual's Prop arrays into its Sources' GPU-facing
//! element arrays.

use thiserror::Error;

use super::prop::{CopyPolicy, Prop, PropType};
use super::source::{Source, SourceKind};

/// Which specialized bake routine a visual uses. `Default` runs the
/// straightforward prop→source copy; the others tesselate, build index
/// buffers, lay out glyphs, or compute normals before delegating to the
/// same copy phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeKind {
    Default,
    Path,
    Polygon,
    Text,
    Mesh,
    LineStrip,
    Volume,
    Image,
    Axes,
}

/// Errors raised while baking.
#[derive(Error, Debug)]
pub enum BakeError {
    /// A bake routine needed a prop the caller never set and for which no
    /// default exists.
    #[error("missing prop: {0}")]
    MissingProp(String),
}

/// Run the default bake: for every prop with a non-empty effective array,
/// copy it into its source's element array at `field_offset`, applying
/// `copy_policy` and any dtype cast. Returns an error only if a prop has
/// neither data nor a default (callers of specialized bakes are expected to
/// check required props before calling this).
pub fn bake_default(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    for prop in props.iter_mut() {
        if !prop.has_data() {
            continue;
        }

        let source = sources
            .get_mut(prop.source_idx as usize)
            .ok_or_else(|| BakeError::MissingProp(format!("{:?} source index {}", prop.prop_type, prop.source_idx)))?;

        let input = prop.effective_array().to_vec();
        let element_dtype_size = prop.gpu_dtype.unwrap_or(prop.dtype).size();
        let input_element_size = prop.dtype.size();
        if input_element_size == 0 {
            continue;
        }
        let count = input.len() / input_element_size;
        if count == 0 {
            continue;
        }

        if source.is_empty() || source.len() != count {
            source.resize(count);
        }

        for i in 0..count {
            let src_start = i * input_element_size;
            let src_slice = &input[src_start..src_start + input_element_size];
            let copy_len = element_dtype_size.min(input_element_size);

            match prop.copy_policy {
                CopyPolicy::Single => {
                    write_field(source, i, prop.field_offset, &src_slice[..copy_len]);
                }
                CopyPolicy::Repeat => {
                    for r in 0..prop.repeat_count {
                        let dst_index = i * prop.repeat_count + r;
                        if dst_index < source.len() {
                            write_field(source, dst_index, prop.field_offset, &src_slice[..copy_len]);
                        }
                    }
                }
            }
        }

        prop.arr_staging = Some(input);
        source.mark_dirty();
    }
    Ok(())
}

/// Mesh bake: run the default prop-to-source copy, then — if the visual
/// declares a `Normal` prop but the caller never wrote to it — fill it in
/// with smooth per-vertex normals averaged from the adjacent triangles'
/// face normals (indexed via the visual's `Index` source if it has one,
/// otherwise treating the vertex source as a flat triangle list).
pub fn bake_mesh(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    bake_default(props, sources)?;

    let pos_prop = props.iter().find(|p| p.prop_type == PropType::Pos);
    let normal_prop = props.iter().find(|p| p.prop_type == PropType::Normal);
    let (pos_prop, normal_prop) = match (pos_prop, normal_prop) {
        (Some(p), n) if n.map_or(true, |n| !n.has_data()) => (p, n),
        _ => return Ok(()),
    };
    let normal_prop = match normal_prop {
        Some(n) => n,
        None => return Ok(()),
    };
    if pos_prop.source_idx != normal_prop.source_idx {
        return Ok(());
    }
    compute_smooth_normals(sources, pos_prop.source_idx as usize, pos_prop.field_offset, normal_prop.field_offset);
    Ok(())
}

/// Line-strip/path bake: run the default copy, then — if a `Length` prop
/// declares more than one item — splice a sentinel vertex between items so
/// a single `LINE_STRIP` draw call doesn't visually bridge unrelated
/// polylines. The sentinel repeats the item boundary's last vertex,
/// producing a zero-length segment at the seam; callers with more than one
/// item are expected to keep that seam imperceptible the way `datoviz`'s
/// own path visual does (thin enough linewidths, or colors that fade at
/// segment ends). Visuals with zero or one declared item are left exactly
/// as `bake_default` produced them.
pub fn bake_line_strip(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    bake_default(props, sources)?;

    let lengths: Vec<usize> = match props.iter().find(|p| p.prop_type == PropType::Length) {
        Some(p) if p.has_data() => p
            .effective_array()
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()) as usize)
            .collect(),
        _ => return Ok(()),
    };
    if lengths.len() < 2 {
        return Ok(());
    }

    let source_idx = match props.iter().find(|p| p.prop_type == PropType::Pos) {
        Some(p) => p.source_idx as usize,
        None => return Ok(()),
    };
    let source = match sources.get_mut(source_idx) {
        Some(s) => s,
        None => return Ok(()),
    };
    let total: usize = lengths.iter().sum();
    if total == 0 || source.len() < total {
        return Ok(());
    }

    let element_size = source.element_size;
    let mut concatenated = Vec::with_capacity(source.elements.len() + (lengths.len() - 1) * element_size);
    let mut cursor = 0;
    for (item_idx, &len) in lengths.iter().enumerate() {
        if len == 0 {
            continue;
        }
        let start = cursor * element_size;
        let end = (cursor + len) * element_size;
        concatenated.extend_from_slice(&source.elements[start..end]);
        if item_idx + 1 < lengths.len() {
            concatenated.extend_from_slice(&source.elements[end - element_size..end]);
        }
        cursor += len;
    }
    source.elements = concatenated;
    source.mark_dirty();
    Ok(())
}

fn compute_smooth_normals(sources: &mut [Source], vertex_source_idx: usize, pos_offset: usize, normal_offset: usize) {
    let index_source_idx = sources.iter().position(|s| s.source_kind == SourceKind::Index);

    let element_size = match sources.get(vertex_source_idx) {
        Some(s) => s.element_size,
        None => return,
    };
    let vertex_count = sources[vertex_source_idx].len();
    if vertex_count == 0 || element_size < pos_offset + 12 {
        return;
    }

    let read_pos = |elements: &[u8], i: usize| -> [f32; 3] {
        let base = i * element_size + pos_offset;
        [
            f32::from_le_bytes(elements[base..base + 4].try_into().unwrap()),
            f32::from_le_bytes(elements[base + 4..base + 8].try_into().unwrap()),
            f32::from_le_bytes(elements[base + 8..base + 12].try_into().unwrap()),
        ]
    };

    let triangles: Vec<[usize; 3]> = match index_source_idx {
        Some(idx) if !sources[idx].is_empty() => sources[idx]
            .elements
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()) as usize)
            .collect::<Vec<_>>()
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        _ => (0..vertex_count / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
    };

    let mut accum = vec![[0.0f32; 3]; vertex_count];
    {
        let elements = &sources[vertex_source_idx].elements;
        for tri in &triangles {
            let [a, b, c] = *tri;
            if a >= vertex_count || b >= vertex_count || c >= vertex_count {
                continue;
            }
            let pa = read_pos(elements, a);
            let pb = read_pos(elements, b);
            let pc = read_pos(elements, c);
            let e1 = sub(pb, pa);
            let e2 = sub(pc, pa);
            let n = cross(e1, e2);
            for &v in &[a, b, c] {
                accum[v][0] += n[0];
                accum[v][1] += n[1];
                accum[v][2] += n[2];
            }
        }
    }

    let source = &mut sources[vertex_source_idx];
    if element_size < normal_offset + 12 {
        return;
    }
    for (i, acc) in accum.into_iter().enumerate() {
        let n = normalize(acc);
        let base = i * element_size + normal_offset;
        source.elements[base..base + 4].copy_from_slice(&n[0].to_le_bytes());
        source.elements[base + 4..base + 8].copy_from_slice(&n[1].to_le_bytes());
        source.elements[base + 8..base + 12].copy_from_slice(&n[2].to_le_bytes());
    }
    source.mark_dirty();
}

/// Text bake: run the default copy, then lay out one vertex per glyph from
/// the visual's `Text` prop bytes, walking `Length`-delimited items exactly
/// like [`bake_line_strip`] walks polylines (absent a `Length` prop, the
/// whole `Text` array is a single item). Each glyph is one vertex — the
/// pipeline expands it to a screen-aligned quad using `glyph_size` — with
/// `shift.x` accumulating a fixed advance so a multi-character string reads
/// left to right from its item's anchor position. Field offsets below
/// follow the builtin text vertex layout: `pos@0, shift@12, color@20,
/// glyph_size@24, anchor@32, angle@40, glyph@44`.
pub fn bake_text(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    bake_default(props, sources)?;

    let text_prop = props.iter().find(|p| p.prop_type == PropType::Text).ok_or_else(|| BakeError::MissingProp("Text".into()))?;
    require_prop(text_prop, "Text")?;
    let text_bytes = text_prop.effective_array().to_vec();
    let text_source_idx = text_prop.source_idx as usize;

    let pos_prop = props.iter().find(|p| p.prop_type == PropType::Pos).ok_or_else(|| BakeError::MissingProp("Pos".into()))?;
    require_prop(pos_prop, "Pos")?;
    let positions: Vec<[f32; 3]> = pos_prop.effective_array().chunks_exact(12).map(read_vec3).collect();

    let lengths: Vec<usize> = match props.iter().find(|p| p.prop_type == PropType::Length) {
        Some(p) if p.has_data() => p
            .effective_array()
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()) as usize)
            .collect(),
        _ => vec![text_bytes.len()],
    };

    let color: [u8; 4] = props
        .iter()
        .find(|p| p.prop_type == PropType::Color)
        .filter(|p| p.has_data())
        .map(|p| read_color(p.effective_array()))
        .unwrap_or([255, 255, 255, 255]);

    let glyph_px: f32 = props
        .iter()
        .find(|p| p.prop_type == PropType::MarkerSize)
        .filter(|p| p.has_data())
        .and_then(|p| p.effective_array().get(0..4).map(|b| f32::from_le_bytes(b.try_into().unwrap())))
        .unwrap_or(16.0);
    let advance = glyph_px * 0.6;

    let anchors: Vec<[f32; 2]> = props
        .iter()
        .find(|p| p.prop_type == PropType::Anchor)
        .filter(|p| p.has_data())
        .map(|p| p.effective_array().chunks_exact(8).map(read_vec2).collect())
        .unwrap_or_default();

    let angles: Vec<f32> = props
        .iter()
        .find(|p| p.prop_type == PropType::Angle)
        .filter(|p| p.has_data())
        .map(|p| {
            p.effective_array()
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
                .collect()
        })
        .unwrap_or_default();

    let total_glyphs: usize = lengths.iter().sum();
    let Some(source) = sources.get_mut(text_source_idx) else {
        return Ok(());
    };
    let element_size = source.element_size;
    if element_size < 52 {
        return Ok(());
    }
    source.resize(total_glyphs);

    let mut glyph_index = 0usize;
    let mut byte_cursor = 0usize;
    for (item_idx, &len) in lengths.iter().enumerate() {
        let anchor_pos = positions.get(item_idx).or_else(|| positions.last()).copied().unwrap_or([0.0, 0.0, 0.0]);
        let anchor = anchors.get(item_idx).or_else(|| anchors.last()).copied().unwrap_or([0.0, 0.0]);
        let angle = angles.get(item_idx).or_else(|| angles.last()).copied().unwrap_or(0.0);
        for j in 0..len {
            let byte = text_bytes.get(byte_cursor).copied().unwrap_or(0);
            byte_cursor += 1;

            write_field(source, glyph_index, 0, bytemuck::bytes_of(&anchor_pos));
            write_field(source, glyph_index, 12, bytemuck::bytes_of(&[j as f32 * advance, 0.0f32]));
            write_field(source, glyph_index, 20, &color);
            write_field(source, glyph_index, 24, bytemuck::bytes_of(&[glyph_px, glyph_px]));
            write_field(source, glyph_index, 32, bytemuck::bytes_of(&anchor));
            write_field(source, glyph_index, 40, bytemuck::bytes_of(&angle));
            write_field(source, glyph_index, 44, bytemuck::bytes_of(&[byte as u16, 0u16, 0u16, 0u16]));
            glyph_index += 1;
        }
    }
    source.mark_dirty();
    Ok(())
}

/// Image/volume-slice bake: run the default copy, then build the
/// screen-aligned textured quad `bake_quad` produces from the visual's
/// `Pos[0]`/`Pos[1]` corners. Datoviz's `Volume` graphics renders a
/// bounding-box proxy the same shape as an image slice; the ray-marching
/// itself happens against the bound 3D texture in the fragment shader, so
/// both bake the same quad geometry.
pub fn bake_image(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    bake_default(props, sources)?;
    bake_quad(props, sources)
}

/// See [`bake_image`] — volume proxies bake the identical quad.
pub fn bake_volume(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    bake_default(props, sources)?;
    bake_quad(props, sources)
}

fn bake_quad(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    let pos0 = props
        .iter()
        .find(|p| p.prop_type == PropType::Pos && p.prop_idx == 0)
        .ok_or_else(|| BakeError::MissingProp("Pos[0]".into()))?;
    require_prop(pos0, "Pos[0]")?;
    let p0 = read_vec3(pos0.effective_array());
    let pos_field_offset = pos0.field_offset;
    let source_idx = pos0.source_idx as usize;

    let pos1 = props
        .iter()
        .find(|p| p.prop_type == PropType::Pos && p.prop_idx == 1)
        .ok_or_else(|| BakeError::MissingProp("Pos[1]".into()))?;
    require_prop(pos1, "Pos[1]")?;
    let p1 = read_vec3(pos1.effective_array());

    let tex_coords_offset = props.iter().find(|p| p.prop_type == PropType::TexCoords).map(|p| p.field_offset);

    let corners = [
        ([p0[0], p0[1], p0[2]], [0.0f32, 0.0]),
        ([p1[0], p0[1], p0[2]], [1.0, 0.0]),
        ([p1[0], p1[1], p0[2]], [1.0, 1.0]),
        ([p0[0], p1[1], p0[2]], [0.0, 1.0]),
    ];
    let order = [0usize, 1, 2, 0, 2, 3];

    let Some(source) = sources.get_mut(source_idx) else {
        return Ok(());
    };
    source.resize(order.len());
    for (i, &idx) in order.iter().enumerate() {
        let (pos, uv) = corners[idx];
        write_field(source, i, pos_field_offset, bytemuck::bytes_of(&pos));
        if let Some(uv_offset) = tex_coords_offset {
            write_field(source, i, uv_offset, bytemuck::bytes_of(&uv));
        }
    }
    source.mark_dirty();
    Ok(())
}

/// Axes bake: run the default copy, then turn externally computed tick
/// positions (`Pos`) and an axis unit direction (`Normal`, reused — axes
/// have no orientation-bearing prop of their own) into one two-vertex tick
/// mark per position, perpendicular to the axis. Where those ticks fall is
/// an upstream concern (an auto-tick collaborator); this only emits the
/// line geometry for whatever positions it's given.
pub fn bake_axes(props: &mut [Prop], sources: &mut [Source]) -> Result<(), BakeError> {
    bake_default(props, sources)?;

    let pos_prop = props.iter().find(|p| p.prop_type == PropType::Pos).ok_or_else(|| BakeError::MissingProp("Pos".into()))?;
    require_prop(pos_prop, "Pos")?;
    let positions: Vec<[f32; 3]> = pos_prop.effective_array().chunks_exact(12).map(read_vec3).collect();
    let pos_field_offset = pos_prop.field_offset;
    let source_idx = pos_prop.source_idx as usize;

    let direction = props
        .iter()
        .find(|p| p.prop_type == PropType::Normal)
        .filter(|p| p.has_data())
        .map(|p| read_vec3(p.effective_array()))
        .unwrap_or([1.0, 0.0, 0.0]);
    let perp = normalize([-direction[1], direction[0], 0.0]);

    let tick_len = props
        .iter()
        .find(|p| p.prop_type == PropType::MarkerSize)
        .filter(|p| p.has_data())
        .and_then(|p| p.effective_array().get(0..4).map(|b| f32::from_le_bytes(b.try_into().unwrap())))
        .unwrap_or(0.02);
    let half = tick_len / 2.0;

    let Some(source) = sources.get_mut(source_idx) else {
        return Ok(());
    };
    source.resize(positions.len() * 2);
    for (i, p) in positions.iter().enumerate() {
        let a = [p[0] - perp[0] * half, p[1] - perp[1] * half, p[2] - perp[2] * half];
        let b = [p[0] + perp[0] * half, p[1] + perp[1] * half, p[2] + perp[2] * half];
        write_field(source, i * 2, pos_field_offset, bytemuck::bytes_of(&a));
        write_field(source, i * 2 + 1, pos_field_offset, bytemuck::bytes_of(&b));
    }
    source.mark_dirty();
    Ok(())
}

fn read_vec3(data: &[u8]) -> [f32; 3] {
    if data.len() < 12 {
        return [0.0; 3];
    }
    [
        f32::from_le_bytes(data[0..4].try_into().unwrap()),
        f32::from_le_bytes(data[4..8].try_into().unwrap()),
        f32::from_le_bytes(data[8..12].try_into().unwrap()),
    ]
}

fn read_vec2(data: &[u8]) -> [f32; 2] {
    [
        f32::from_le_bytes(data[0..4].try_into().unwrap()),
        f32::from_le_bytes(data[4..8].try_into().unwrap()),
    ]
}

fn read_color(data: &[u8]) -> [u8; 4] {
    if data.len() < 4 {
        return [255, 255, 255, 255];
    }
    [data[0], data[1], data[2], data[3]]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-8 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

fn write_field(source: &mut Source, element_index: usize, field_offset: usize, data: &[u8]) {
    let element_size = source.element_size;
    let base = element_index * element_size + field_offset;
    if base + data.len() > source.elements.len() {
        return;
    }
    source.elements[base..base + data.len()].copy_from_slice(data);
}

/// Require that `prop` has data, returning [`BakeError::MissingProp`]
/// otherwise. Specialized bake routines call this for props with no
/// sensible default (e.g. `Path`'s point positions).
pub fn require_prop(prop: &Prop, name: &str) -> Result<(), BakeError> {
    if prop.has_data() {
        Ok(())
    } else {
        Err(BakeError::MissingProp(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::source::{PipelineKind, SourceType};
    use crate::visual::{CopyPolicy, DType};

    fn mesh_source() -> Source {
        // pos @ 0 (12 bytes), normal @ 12 (12 bytes), color @ 24 (4 bytes).
        Source::new(SourceType::Vertex, 0, SourceKind::Vertex, (PipelineKind::Graphics, 0), 0, 28)
    }

    #[test]
    fn bake_mesh_fills_flat_triangle_normal_when_caller_never_set_one() {
        let mut sources = vec![mesh_source()];
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut pos_prop = Prop::new(PropType::Pos, 0, DType::F32x3, 0, 0, CopyPolicy::Single);
        pos_prop.set(bytemuck::cast_slice(&positions));
        let normal_prop = Prop::new(PropType::Normal, 0, DType::F32x3, 0, 12, CopyPolicy::Single);
        let mut props = vec![pos_prop, normal_prop];

        bake_mesh(&mut props, &mut sources).unwrap();

        let source = &sources[0];
        for i in 0..3 {
            let base = i * source.element_size + 12;
            let nz = f32::from_le_bytes(source.elements[base + 8..base + 12].try_into().unwrap());
            assert!(nz > 0.9, "expected +Z face normal, got nz={nz}");
        }
    }

    fn pos_source() -> Source {
        Source::new(SourceType::Vertex, 0, SourceKind::Vertex, (PipelineKind::Graphics, 0), 0, 12)
    }

    #[test]
    fn bake_line_strip_leaves_single_item_untouched() {
        let mut sources = vec![pos_source()];
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let mut pos_prop = Prop::new(PropType::Pos, 0, DType::F32x3, 0, 0, CopyPolicy::Single);
        pos_prop.set(bytemuck::cast_slice(&positions));
        let mut props = vec![pos_prop];

        bake_line_strip(&mut props, &mut sources).unwrap();

        assert_eq!(sources[0].len(), 3);
    }

    #[test]
    fn bake_line_strip_splices_sentinel_between_items() {
        let mut sources = vec![pos_source()];
        // Item 0: 2 points, item 1: 3 points.
        let positions: [[f32; 3]; 5] = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [5.0, 5.0, 0.0],
            [6.0, 5.0, 0.0],
            [7.0, 5.0, 0.0],
        ];
        let mut pos_prop = Prop::new(PropType::Pos, 0, DType::F32x3, 0, 0, CopyPolicy::Single);
        pos_prop.set(bytemuck::cast_slice(&positions));
        let mut length_prop = Prop::new(PropType::Length, 0, DType::U32, 0, 0, CopyPolicy::Single);
        length_prop.set(bytemuck::cast_slice(&[2u32, 3u32]));
        let mut props = vec![pos_prop, length_prop];

        bake_line_strip(&mut props, &mut sources).unwrap();

        // 2 + 1 sentinel + 3 = 6 vertices; the sentinel repeats item 0's last point.
        assert_eq!(sources[0].len(), 6);
        let read = |i: usize| -> [f32; 3] {
            let base = i * sources[0].element_size;
            let b = &sources[0].elements[base..base + 12];
            [
                f32::from_le_bytes(b[0..4].try_into().unwrap()),
                f32::from_le_bytes(b[4..8].try_into().unwrap()),
                f32::from_le_bytes(b[8..12].try_into().unwrap()),
            ]
        };
        assert_eq!(read(1), [1.0, 0.0, 0.0]);
        assert_eq!(read(2), [1.0, 0.0, 0.0]);
        assert_eq!(read(3), [5.0, 5.0, 0.0]);
    }

    #[test]
    fn bake_mesh_leaves_caller_supplied_normals_alone() {
        let mut sources = vec![mesh_source()];
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals: [[f32; 3]; 3] = [[0.0, 0.0, -1.0]; 3];
        let mut pos_prop = Prop::new(PropType::Pos, 0, DType::F32x3, 0, 0, CopyPolicy::Single);
        pos_prop.set(bytemuck::cast_slice(&positions));
        let mut normal_prop = Prop::new(PropType::Normal, 0, DType::F32x3, 0, 12, CopyPolicy::Single);
        normal_prop.set(bytemuck::cast_slice(&normals));
        let mut props = vec![pos_prop, normal_prop];

        bake_mesh(&mut props, &mut sources).unwrap();

        let source = &sources[0];
        let base = 12;
        let nz = f32::from_le_bytes(source.elements[base + 8..base + 12].try_into().unwrap());
        assert!(nz < -0.9, "expected caller's -Z normal preserved, got nz={nz}");
    }
}
