//! Visual/Prop/Source baking: turns user-facing prop writes into the GPU
//! element arrays the graphics catalogue's pipelines consume.

pub mod bake;
pub mod prop;
pub mod source;
mod visual;

pub use bake::{bake_default, bake_line_strip, bake_mesh, BakeError, BakeKind};
pub use prop::{CopyPolicy, DType, Prop, PropType};
pub use source::{PipelineKind, Source, SourceBinding, SourceKind, SourceOrigin, SourceType};
pub use visual::{declare_pos_color_props, Visual, VisualFlags};
