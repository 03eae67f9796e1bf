//! `Panel`: a rectangle within a [`crate::scene::Scene`]'s grid, owning a
//! controller, a viewport, an auto-fit data-space bounding box, and the
//! visuals drawn into it in priority order.

use ash::vk;

use crate::foundation::math::{Mat4, Vec3};
use crate::graphics::MvpUniform;
use crate::resources::{DatFlags, DatHandle, ResourceError, ResourceManager};
use crate::transfer::TransferEngine;
use crate::visual::Visual;
use crate::vk::VulkanContext;

use super::controller::{Controller, InputEvent, MvpMatrices};
use super::coords::DataCoords;
use super::viewport::Viewport;

/// A visual plus the draw-order priority it was added with (lower draws first).
struct PanelVisual {
    priority: i32,
    visual: Visual,
}

/// Whether a panel's 3D controllers should receive the "make cubic" variant
/// of [`DataCoords::fit`] — true for every controller except the 2D ones.
fn controller_is_3d(controller: &Controller) -> bool {
    matches!(
        controller,
        Controller::Arcball(_) | Controller::Turntable(_) | Controller::Fly(_) | Controller::Fps(_) | Controller::Axes3D(_)
    )
}

/// A cell in the scene's panel grid.
pub struct Panel {
    pub row: u32,
    pub col: u32,
    pub row_span: u32,
    pub col_span: u32,
    pub controller: Controller,
    pub viewport: Viewport,
    pub data_coords: DataCoords,
    /// Recompute `data_coords` from visuals' `Pos` props whenever one changes.
    pub auto_fit: bool,
    visuals: Vec<PanelVisual>,
    /// Binding-0 MVP dup-Dat, allocated lazily on the first [`Self::sync_uniforms`] call.
    mvp_dat: Option<DatHandle>,
    /// Binding-1 viewport dup-Dat, allocated lazily alongside `mvp_dat`.
    viewport_dat: Option<DatHandle>,
}

impl Panel {
    pub fn new(row: u32, col: u32, controller: Controller, viewport: Viewport) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
            controller,
            viewport,
            data_coords: DataCoords::empty(),
            auto_fit: true,
            visuals: Vec::new(),
            mvp_dat: None,
            viewport_dat: None,
        }
    }

    /// This panel's MVP dup-Dat, if [`Self::sync_uniforms`] has run at least once.
    pub fn mvp_dat(&self) -> Option<DatHandle> {
        self.mvp_dat
    }

    /// This panel's viewport dup-Dat, if [`Self::sync_uniforms`] has run at least once.
    pub fn viewport_dat(&self) -> Option<DatHandle> {
        self.viewport_dat
    }

    /// Allocate this panel's binding-0/binding-1 dup-Dats on first use, then
    /// upload this frame's MVP and viewport uniform bytes to the slice for
    /// `image_index`. Every builtin pipeline binds these two regardless of
    /// graphics type, so a panel owns them once rather than each visual
    /// duplicating the allocation.
    pub fn sync_uniforms(
        &mut self,
        time: f32,
        context: &VulkanContext,
        resources: &mut ResourceManager,
        transfer: &mut TransferEngine,
        image_index: usize,
    ) -> Result<(), ResourceError> {
        let mvp = self.mvp();
        let mvp_uniform = MvpUniform::new(mvp.model, mvp.view, mvp.proj, time);
        let mvp_bytes = bytemuck::bytes_of(&mvp_uniform).to_vec();
        let mvp_handle = match self.mvp_dat {
            Some(h) => h,
            None => {
                let h = resources.create_dat(
                    context,
                    vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                    DatFlags::DUP | DatFlags::MAPPABLE | DatFlags::FREQUENT_UPLOAD,
                    mvp_bytes.len() as vk::DeviceSize,
                    resources.uniform_alignment(),
                )?;
                transfer.register_dup(h);
                self.mvp_dat = Some(h);
                h
            }
        };
        transfer.enqueue_upload(mvp_handle, mvp_bytes, image_index);

        let viewport_bytes = bytemuck::bytes_of(&self.viewport.to_uniform()).to_vec();
        let viewport_handle = match self.viewport_dat {
            Some(h) => h,
            None => {
                let h = resources.create_dat(
                    context,
                    vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                    DatFlags::DUP | DatFlags::MAPPABLE | DatFlags::FREQUENT_UPLOAD,
                    viewport_bytes.len() as vk::DeviceSize,
                    resources.uniform_alignment(),
                )?;
                transfer.register_dup(h);
                self.viewport_dat = Some(h);
                h
            }
        };
        transfer.enqueue_upload(viewport_handle, viewport_bytes, image_index);
        Ok(())
    }

    /// Add a visual at the given draw-order priority; the visual list stays
    /// sorted so [`Panel::visuals_in_draw_order`] never has to sort itself.
    pub fn add_visual(&mut self, visual: Visual, priority: i32) {
        let pos = self.visuals.partition_point(|pv| pv.priority <= priority);
        self.visuals.insert(pos, PanelVisual { priority, visual });
    }

    /// Visuals in the order they should be recorded into the command buffer.
    pub fn visuals_in_draw_order(&self) -> impl Iterator<Item = &Visual> {
        self.visuals.iter().map(|pv| &pv.visual)
    }

    /// Visuals in draw order, mutably (the runner's Main-event prepare pass).
    pub fn visuals_in_draw_order_mut(&mut self) -> impl Iterator<Item = &mut Visual> {
        self.visuals.iter_mut().map(|pv| &mut pv.visual)
    }

    /// Recompute `data_coords` from the current visuals' `Pos` props, if
    /// `auto_fit` is set. Cubic-fits when the controller is a 3D one so a
    /// non-cubic dataset isn't squashed by a uniform-scale camera.
    pub fn refit_coords(&mut self) {
        if !self.auto_fit {
            return;
        }
        let visuals: Vec<&Visual> = self.visuals.iter().map(|pv| &pv.visual).collect();
        let cubic = controller_is_3d(&self.controller);
        // `DataCoords::fit` takes a slice of owned visuals in its public
        // signature; panels instead fold the scan inline over borrows so it
        // never has to clone a visual's backing arrays.
        let mut bounds = DataCoords::empty();
        for visual in visuals {
            for prop in &visual.props {
                if prop.prop_type != crate::visual::PropType::Pos {
                    continue;
                }
                let data = prop.effective_array();
                for chunk in data.chunks_exact(12) {
                    let p = [
                        f32::from_le_bytes(chunk[0..4].try_into().unwrap()),
                        f32::from_le_bytes(chunk[4..8].try_into().unwrap()),
                        f32::from_le_bytes(chunk[8..12].try_into().unwrap()),
                    ];
                    bounds.min[0] = bounds.min[0].min(p[0]);
                    bounds.min[1] = bounds.min[1].min(p[1]);
                    bounds.min[2] = bounds.min[2].min(p[2]);
                    bounds.max[0] = bounds.max[0].max(p[0]);
                    bounds.max[1] = bounds.max[1].max(p[1]);
                    bounds.max[2] = bounds.max[2].max(p[2]);
                }
            }
        }
        if cubic {
            bounds.make_cubic();
        }
        self.data_coords = bounds;
    }

    /// Forward one input event to this panel's controller if `pos` falls
    /// within its viewport (or the event carries no position, e.g. a key).
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let in_bounds = match event {
            InputEvent::MouseDown { pos, .. }
            | InputEvent::MouseUp { pos, .. }
            | InputEvent::Drag { pos, .. }
            | InputEvent::Wheel { pos, .. }
            | InputEvent::DoubleClick { pos, .. } => self.viewport.contains(*pos),
            InputEvent::Key { .. } => true,
        };
        if !in_bounds {
            return false;
        }
        self.controller.handle_event(event)
    }

    /// Advance time-driven controllers.
    pub fn update(&mut self, dt: f32) {
        self.controller.update(dt);
    }

    /// This frame's MVP: the controller's view/projection composed with a
    /// model matrix that maps `data_coords` onto `[-1, 1]` in every axis
    /// the box isn't degenerate on.
    pub fn mvp(&self) -> MvpMatrices {
        let camera = self.controller.mvp();
        if self.data_coords.is_empty() {
            return camera;
        }
        let center = self.data_coords.center();
        let half = self.data_coords.half_extent();
        let scale = Vec3::new(
            if half[0] > f32::EPSILON { 1.0 / half[0] } else { 1.0 },
            if half[1] > f32::EPSILON { 1.0 / half[1] } else { 1.0 },
            if half[2] > f32::EPSILON { 1.0 / half[2] } else { 1.0 },
        );
        let fit_model = Mat4::new_nonuniform_scaling(&scale)
            * Mat4::new_translation(&Vec3::new(-center[0], -center[1], -center[2]));
        MvpMatrices {
            model: camera.model * fit_model,
            view: camera.view,
            proj: camera.proj,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::GraphicsType;
    use crate::scene::controller::PanZoomState;
    use crate::visual::{BakeKind, CopyPolicy, DType, Prop, PropType};

    fn panel_with_point(p: [f32; 3]) -> Panel {
        let viewport = Viewport::new((0.0, 0.0), (800.0, 600.0));
        let mut panel = Panel::new(0, 0, Controller::PanZoom(PanZoomState::new((800.0, 600.0), false)), viewport);
        let mut visual = Visual::new(GraphicsType::Point, BakeKind::Default);
        let mut prop = Prop::new(PropType::Pos, 0, DType::F32x3, 0, 0, CopyPolicy::Single);
        prop.set(bytemuck::bytes_of(&p));
        visual.add_prop(prop);
        panel.add_visual(visual, 0);
        panel
    }

    #[test]
    fn visuals_draw_in_priority_order() {
        let viewport = Viewport::new((0.0, 0.0), (100.0, 100.0));
        let mut panel = Panel::new(0, 0, Controller::None, viewport);
        panel.add_visual(Visual::new(GraphicsType::Point, BakeKind::Default), 5);
        panel.add_visual(Visual::new(GraphicsType::Line, BakeKind::Default), 1);
        panel.add_visual(Visual::new(GraphicsType::Mesh, BakeKind::Default), 3);
        let order: Vec<GraphicsType> = panel.visuals_in_draw_order().map(|v| v.graphics_type).collect();
        assert_eq!(order, vec![GraphicsType::Line, GraphicsType::Mesh, GraphicsType::Point]);
    }

    #[test]
    fn refit_coords_centers_single_point_at_origin() {
        let mut panel = panel_with_point([4.0, 2.0, 0.0]);
        panel.refit_coords();
        let mvp = panel.mvp();
        let origin = mvp.model.transform_point(&nalgebra::Point3::new(4.0, 2.0, 0.0));
        assert!(origin.x.abs() < 1e-5);
        assert!(origin.y.abs() < 1e-5);
    }

    #[test]
    fn event_outside_viewport_is_ignored() {
        let mut panel = panel_with_point([0.0, 0.0, 0.0]);
        let changed = panel.handle_event(&InputEvent::Drag {
            button: super::super::controller::MouseButton::Left,
            pos: (10_000.0, 10_000.0),
            delta: (1.0, 1.0),
        });
        assert!(!changed);
    }
}
