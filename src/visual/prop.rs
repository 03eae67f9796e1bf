//! `Prop`: a named, typed input field on a Visual, set by the caller.

/// Semantic type of a prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropType {
    Pos,
    Color,
    Alpha,
    MarkerSize,
    LineWidth,
    Text,
    Normal,
    TexCoords,
    Model,
    View,
    Proj,
    Viewport,
    Length,
    Topology,
    Transform,
    /// Per-item anchor offset (text glyph quads pivot around this point).
    Anchor,
    /// Per-item rotation in radians (text glyph quads).
    Angle,
}

/// Declared element dtype of a prop's input array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    F32,
    F32x2,
    F32x3,
    F32x4,
    U8x4,
    U16,
    U32,
    I32,
}

impl DType {
    /// Size in bytes of one element of this dtype.
    pub fn size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F32x2 => 8,
            DType::F32x3 => 12,
            DType::F32x4 => 16,
            DType::U8x4 => 4,
            DType::U16 => 2,
            DType::U32 => 4,
            DType::I32 => 4,
        }
    }
}

/// How a prop's single logical value maps onto the (possibly larger)
/// element count of its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPolicy {
    /// One prop element maps to exactly one source element.
    Single,
    /// One prop element is repeated `repeat_count` times per source element
    /// group (e.g. a single color applied to every vertex of a glyph quad).
    Repeat,
}

/// A named, typed input field on a visual, uniquely identified by
/// `(prop_type, prop_idx)`.
pub struct Prop {
    pub prop_type: PropType,
    pub prop_idx: u32,
    pub dtype: DType,
    /// Index of the owning source within the visual's source list.
    pub source_idx: u32,
    /// Byte offset of this prop's field within one element of its source.
    pub field_offset: usize,
    pub copy_policy: CopyPolicy,
    pub repeat_count: usize,
    /// GPU dtype to cast into, if different from `dtype`.
    pub gpu_dtype: Option<DType>,
    pub dpi_scale: Option<f32>,
    pub default: Vec<u8>,
    /// What the caller set, via `set_prop`.
    pub arr_orig: Vec<u8>,
    /// After CPU-side transforms (data-space normalization); absent until computed.
    pub arr_trans: Option<Vec<u8>>,
    /// After baking; staged for upload.
    pub arr_staging: Option<Vec<u8>>,
}

impl Prop {
    /// Declare a prop with no data set yet.
    pub fn new(
        prop_type: PropType,
        prop_idx: u32,
        dtype: DType,
        source_idx: u32,
        field_offset: usize,
        copy_policy: CopyPolicy,
    ) -> Self {
        Self {
            prop_type,
            prop_idx,
            dtype,
            source_idx,
            field_offset,
            copy_policy,
            repeat_count: 1,
            gpu_dtype: None,
            dpi_scale: None,
            default: Vec::new(),
            arr_orig: Vec::new(),
            arr_trans: None,
            arr_staging: None,
        }
    }

    /// The array the baking function reads from: `arr_trans` if present,
    /// else `arr_orig`.
    pub fn read_array(&self) -> &[u8] {
        self.arr_trans.as_deref().unwrap_or(&self.arr_orig)
    }

    /// Number of logical elements currently set (`arr_orig` length / dtype size).
    pub fn count(&self) -> usize {
        let size = self.dtype.size();
        if size == 0 {
            0
        } else {
            self.arr_orig.len() / size
        }
    }

    /// Write `data` as the new `arr_orig`, clearing any stale transform/staging.
    pub fn set(&mut self, data: &[u8]) {
        self.arr_orig = data.to_vec();
        self.arr_trans = None;
        self.arr_staging = None;
    }

    /// Whether the caller has provided data (directly or via a default).
    pub fn has_data(&self) -> bool {
        !self.arr_orig.is_empty() || !self.default.is_empty()
    }

    /// The effective input: `read_array()` if non-empty, else the default.
    pub fn effective_array(&self) -> &[u8] {
        let arr = self.read_array();
        if arr.is_empty() {
            &self.default
        } else {
            arr
        }
    }
}
