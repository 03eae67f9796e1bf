//! The two uniforms every builtin pipeline binds at slots 0/1: the MVP
//! matrix set and the viewport/clip parameters. Both are `Pod` so they
//! can be byte-cast straight into a dup-Dat upload.

use bytemuck::{Pod, Zeroable};

/// Binding 0: `(model, view, proj, time)`, written once per panel per frame
/// by its [`crate::scene::Controller`] and dup-uploaded across swapchain images.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MvpUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub time: f32,
    _pad: [f32; 3],
}

fn mat4_to_cols(m: &crate::foundation::math::Mat4) -> [[f32; 4]; 4] {
    let mut cols = [[0.0f32; 4]; 4];
    for (c, col) in cols.iter_mut().enumerate() {
        for (r, elem) in col.iter_mut().enumerate() {
            *elem = m[(r, c)];
        }
    }
    cols
}

impl MvpUniform {
    /// Build from column-major `nalgebra` matrices and the current clock time.
    pub fn new(model: crate::foundation::math::Mat4, view: crate::foundation::math::Mat4, proj: crate::foundation::math::Mat4, time: f32) -> Self {
        Self {
            model: mat4_to_cols(&model),
            view: mat4_to_cols(&view),
            proj: mat4_to_cols(&proj),
            time,
            _pad: [0.0; 3],
        }
    }

    /// The identity MVP (model/view/proj all identity, time zero) — what a
    /// panel starts with before its controller has produced its first frame.
    pub fn identity() -> Self {
        Self::new(
            crate::foundation::math::Mat4::identity(),
            crate::foundation::math::Mat4::identity(),
            crate::foundation::math::Mat4::identity(),
            0.0,
        )
    }
}

/// How a panel clips visuals whose geometry extends past its viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ClipMode {
    /// No clipping; fragments outside the viewport are still rasterized
    /// (relies on the scissor rect alone).
    None = 0,
    /// Discard fragments outside the inner viewport rectangle.
    Inner = 1,
    /// Discard fragments outside the viewport plus its margins.
    Outer = 2,
}

/// Binding 1: screen/framebuffer placement and clip parameters, shared by
/// every pipeline in a panel regardless of graphics type.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ViewportUniform {
    pub screen_offset: [f32; 2],
    pub screen_size: [f32; 2],
    pub framebuffer_offset: [f32; 2],
    pub framebuffer_size: [f32; 2],
    pub clip_mode: i32,
    /// -1 = no restriction, 0 = x-only, 1 = y-only, per [`crate::scene::InteractAxis`].
    pub interact_axis: i32,
    _pad: [f32; 2],
    pub margins: [f32; 4],
}

impl ViewportUniform {
    /// Build from a panel's resolved screen/framebuffer rectangles.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        screen_offset: [f32; 2],
        screen_size: [f32; 2],
        framebuffer_offset: [f32; 2],
        framebuffer_size: [f32; 2],
        clip_mode: ClipMode,
        interact_axis: i32,
        margins: [f32; 4],
    ) -> Self {
        Self {
            screen_offset,
            screen_size,
            framebuffer_offset,
            framebuffer_size,
            clip_mode: clip_mode as i32,
            interact_axis,
            _pad: [0.0; 2],
            margins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvp_identity_has_identity_matrices() {
        let mvp = MvpUniform::identity();
        assert_eq!(mvp.model, mat4_to_cols(&crate::foundation::math::Mat4::identity()));
        assert_eq!(mvp.time, 0.0);
    }
}
