//! `Source`: a typed GPU binding produced by baking one or more props.

use ash::vk;

use crate::resources::{DatFlags, DatHandle, ResourceError, ResourceManager, TexHandle};
use crate::vk::VulkanContext;

/// What a source semantically represents within a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Mvp,
    Viewport,
    Param,
    Vertex,
    Index,
    Image,
    Volume,
    Transfer,
    ColorTexture,
    FontAtlas,
    Other,
}

/// The GPU resource kind a source is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Vertex,
    Index,
    Uniform,
    Storage,
    Texture1D,
    Texture2D,
    Texture3D,
}

/// Which pipeline type a source's binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Graphics,
    Compute,
}

/// Who owns the GPU resource behind a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    /// The engine allocated and owns it (typical vertex/index/uniform buffers).
    Library,
    /// The caller supplied an existing handle (e.g. a shared color texture).
    User,
    /// No GPU resource is baked for this source (CPU-only staging).
    NoBake,
}

/// The GPU resource a source is currently bound to.
#[derive(Debug, Clone, Copy)]
pub enum SourceBinding {
    Dat(DatHandle),
    Tex(TexHandle),
    Unbound,
}

/// A typed GPU binding, uniquely identified within a visual by
/// `(source_type, source_idx)`.
pub struct Source {
    pub source_type: SourceType,
    pub source_idx: u32,
    pub source_kind: SourceKind,
    pub target: (PipelineKind, u32),
    pub binding_slot: u32,
    pub element_size: usize,
    /// The source's current GPU-facing byte contents, written by baking.
    pub elements: Vec<u8>,
    pub origin: SourceOrigin,
    pub binding: SourceBinding,
    /// Other sources sharing this source's underlying Dat/Tex.
    pub shared_with: Vec<u32>,
    dirty: bool,
    /// Whether this source should replicate per-swapchain-image even
    /// though its `source_type` isn't `Mvp`/`Viewport`. Set via
    /// [`Source::mark_dup`].
    dup: bool,
}

impl Source {
    /// Construct an empty, library-owned source.
    pub fn new(
        source_type: SourceType,
        source_idx: u32,
        source_kind: SourceKind,
        target: (PipelineKind, u32),
        binding_slot: u32,
        element_size: usize,
    ) -> Self {
        Self {
            source_type,
            source_idx,
            source_kind,
            target,
            binding_slot,
            element_size,
            elements: Vec::new(),
            origin: SourceOrigin::Library,
            binding: SourceBinding::Unbound,
            shared_with: Vec::new(),
            dirty: false,
            dup: false,
        }
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        if self.element_size == 0 {
            0
        } else {
            self.elements.len() / self.element_size
        }
    }

    /// True if the source holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize the element array to `count` elements, zero-filling new slots.
    pub fn resize(&mut self, count: usize) {
        self.elements.resize(count * self.element_size, 0);
    }

    /// Mark dirty (needs upload before next draw).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag (after a successful upload).
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether this source needs uploading.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Usage flags implied by `source_kind`, for allocator requests.
    pub fn buffer_usage(&self) -> vk::BufferUsageFlags {
        match self.source_kind {
            SourceKind::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            SourceKind::Index => vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            SourceKind::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            SourceKind::Storage => vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            SourceKind::Texture1D | SourceKind::Texture2D | SourceKind::Texture3D => vk::BufferUsageFlags::empty(),
        }
    }

    /// Whether this source is replicated per-swapchain-image to avoid
    /// read-after-write hazards (`MVP`/`Viewport` uniforms; any other
    /// source whose caller opted in via [`Source::mark_dup`]).
    pub fn wants_dup(&self) -> bool {
        matches!(self.source_type, SourceType::Mvp | SourceType::Viewport) || self.dup
    }

    /// Opt a non-MVP/Viewport source into per-image duplication (a
    /// caller-written uniform/storage buffer updated every frame).
    pub fn mark_dup(&mut self) {
        self.dup = true;
    }

    /// Buffer-backed sources only: allocate a [`crate::resources::Dat`] the
    /// first time this is called, resizing it in place on later calls if
    /// the source's baked element array has grown. Texture-kind sources
    /// return [`ResourceError::Invalid`] — they go through
    /// [`crate::resources::ResourceManager::create_tex`] instead.
    ///
    /// Returns the handle either way, registering newly-created dup Dats
    /// with `transfer` so the upfill pass picks them up.
    pub fn ensure_dat(
        &mut self,
        context: &VulkanContext,
        resources: &mut ResourceManager,
        transfer: &mut crate::transfer::TransferEngine,
    ) -> Result<DatHandle, ResourceError> {
        let alignment = match self.source_kind {
            SourceKind::Uniform => resources.uniform_alignment(),
            SourceKind::Storage | SourceKind::Vertex | SourceKind::Index => resources.storage_alignment(),
            SourceKind::Texture1D | SourceKind::Texture2D | SourceKind::Texture3D => {
                return Err(ResourceError::Invalid("ensure_dat called on a texture-kind source".into()));
            }
        };

        let needed = self.elements.len().max(self.element_size) as vk::DeviceSize;

        match self.binding {
            SourceBinding::Dat(handle) => {
                let current = resources.dat(handle).map(crate::resources::Dat::element_size).unwrap_or(0);
                if needed > current {
                    resources.resize_dat(context, handle, needed)?;
                }
                Ok(handle)
            }
            _ => {
                // Uniform sources and anything replicated per-swapchain-image are
                // written every frame, so mapping them directly is cheaper than
                // staging through a device-local copy; `propagate_dup` also
                // requires a mappable Dat for its upfill passes. Vertex/index/
                // storage sources are typically baked once and read many times,
                // so they go device-local and upload through the transfer
                // engine's staging ring instead.
                let mappable = self.source_kind == SourceKind::Uniform || self.wants_dup();
                let mut flags = DatFlags::empty();
                if mappable {
                    flags |= DatFlags::FREQUENT_UPLOAD | DatFlags::MAPPABLE;
                }
                if self.wants_dup() {
                    flags |= DatFlags::DUP;
                }
                let handle = resources.create_dat(context, self.buffer_usage(), flags, needed.max(1), alignment)?;
                if self.wants_dup() {
                    transfer.register_dup(handle);
                }
                self.binding = SourceBinding::Dat(handle);
                Ok(handle)
            }
        }
    }
}
