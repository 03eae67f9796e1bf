//! The graphics catalogue: builtin vertex layouts and the table mapping
//! each graphics type to a complete pipeline description.

mod catalogue;
mod pipeline_cache;
mod uniforms;
mod vertex;

pub use catalogue::{describe, pipeline_desc, CatalogueEntry, DescriptorSlot, GraphicsType};
pub use pipeline_cache::{CachedPipeline, PipelineCache};
pub use uniforms::{ClipMode, MvpUniform, ViewportUniform};
pub use vertex::{ImageVertex, MeshVertex, PointVertex, SegmentVertex, TextVertex};
