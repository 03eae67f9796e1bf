//! `Scene`: the panel grid, the pending-update queue panels post to when
//! they change shape, and the textures every panel's visuals may share
//! (a color lookup table, a font atlas).

use ash::vk;

use crate::foundation::collections::Fifo;
use crate::resources::{ResourceError, ResourceManager, TexDims, TexHandle};
use crate::vk::VulkanContext;

use super::colormap::{self, CMAP_HEIGHT, CMAP_WIDTH};
use super::panel::Panel;

/// Side length, in texels, of the shared glyph atlas texture.
const FONT_ATLAS_SIZE: u32 = 1024;

/// What changed about a panel, queued for the runner's Main-event handling
/// rather than applied synchronously (so a batch of updates within one
/// frame coalesces into a single Refill).
#[derive(Debug, Clone, Copy)]
pub enum SceneUpdateKind {
    /// A panel's viewport rectangle moved or resized.
    Viewport,
    /// A panel's controller was swapped out for a different interaction mode.
    Controller,
    /// A panel's data-space bounding box was recomputed.
    DataCoords,
}

/// One queued change: which panel, what kind, nothing else — the runner
/// re-reads current state from the panel itself rather than carrying an
/// old/new value pair, since by the time it's drained the panel may have
/// changed again.
#[derive(Debug, Clone, Copy)]
pub struct SceneUpdate {
    pub panel_index: usize,
    pub kind: SceneUpdateKind,
}

/// Owns every panel plus the resources shared across all of them.
pub struct Scene {
    panels: Vec<Panel>,
    /// Panel-change notifications, drained once per frame by the runner's
    /// Main queue before it decides whether to enqueue a Refill.
    pub updates: Fifo<SceneUpdate>,
    /// Shared color lookup texture (one row per colormap/palette table),
    /// allocated lazily via [`Self::ensure_color_texture`] and bound by any
    /// visual with a `ColorTexture` source.
    pub color_texture: Option<TexHandle>,
    /// Shared glyph atlas, bound by any visual with a `FontAtlas` source.
    pub font_atlas: Option<TexHandle>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            panels: Vec::new(),
            updates: Fifo::new(),
            color_texture: None,
            font_atlas: None,
        }
    }

    /// Add a panel, returning its index within the grid.
    pub fn add_panel(&mut self, panel: Panel) -> usize {
        self.panels.push(panel);
        self.panels.len() - 1
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    pub fn panel_mut(&mut self, index: usize) -> Option<&mut Panel> {
        self.panels.get_mut(index)
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    pub fn panels_mut(&mut self) -> impl Iterator<Item = &mut Panel> {
        self.panels.iter_mut()
    }

    /// Find the (first, topmost-priority) panel whose viewport contains
    /// `pos`, used by the runner to route a pointer event to one panel.
    pub fn panel_at(&self, pos: (f32, f32)) -> Option<usize> {
        self.panels.iter().position(|p| p.viewport.contains(pos))
    }

    /// Route one input event to whichever panel's viewport contains its
    /// position (all panels, for key events), queuing a `DataCoords`
    /// update notification if the event changed the camera.
    pub fn dispatch_event(&mut self, event: &super::controller::InputEvent) {
        if matches!(event, super::controller::InputEvent::Key { .. }) {
            for panel in &mut self.panels {
                panel.handle_event(event);
            }
            return;
        }
        if let Some(index) = self.panels.iter().position(|p| {
            matches!(
                event,
                super::controller::InputEvent::MouseDown { pos, .. }
                    | super::controller::InputEvent::MouseUp { pos, .. }
                    | super::controller::InputEvent::Drag { pos, .. }
                    | super::controller::InputEvent::Wheel { pos, .. }
                    | super::controller::InputEvent::DoubleClick { pos, .. }
                if p.viewport.contains(*pos)
            )
        }) {
            if self.panels[index].handle_event(event) {
                self.updates.enqueue(SceneUpdate {
                    panel_index: index,
                    kind: SceneUpdateKind::Controller,
                });
            }
        }
    }

    /// Advance every panel's time-driven controller.
    pub fn update(&mut self, dt: f32) {
        for panel in &mut self.panels {
            panel.update(dt);
        }
    }

    /// This scene's shared colormap texture, allocating it on first use
    /// (a `CMAP_WIDTH`x`CMAP_HEIGHT` RGBA8 2D image, one row per table).
    pub fn ensure_color_texture(&mut self, context: &VulkanContext, resources: &mut ResourceManager) -> Result<TexHandle, ResourceError> {
        if let Some(handle) = self.color_texture {
            return Ok(handle);
        }
        let handle = resources.create_tex(
            context,
            TexDims::Two,
            vk::Format::R8G8B8A8_UNORM,
            vk::Extent3D { width: CMAP_WIDTH, height: CMAP_HEIGHT, depth: 1 },
            false,
        )?;
        self.color_texture = Some(handle);
        Ok(handle)
    }

    /// This scene's shared glyph atlas texture, allocating it on first use
    /// (a single-channel coverage atlas sized for the builtin bitmap font).
    pub fn ensure_font_atlas(&mut self, context: &VulkanContext, resources: &mut ResourceManager) -> Result<TexHandle, ResourceError> {
        if let Some(handle) = self.font_atlas {
            return Ok(handle);
        }
        let handle = resources.create_tex(
            context,
            TexDims::Two,
            vk::Format::R8_UNORM,
            vk::Extent3D { width: FONT_ATLAS_SIZE, height: FONT_ATLAS_SIZE, depth: 1 },
            false,
        )?;
        self.font_atlas = Some(handle);
        Ok(handle)
    }

    /// Register `colors` as colormap row `cmap_id`, packing and uploading
    /// them into the shared color texture (allocated lazily via
    /// [`Self::ensure_color_texture`] if this is the first registration).
    pub fn register_colormap(
        &mut self,
        context: &VulkanContext,
        resources: &mut ResourceManager,
        cmap_id: u32,
        colors: &[[u8; 4]],
    ) -> Result<(), ResourceError> {
        let handle = self.ensure_color_texture(context, resources)?;
        let row = colormap::pack_row(colors);
        resources.upload_tex(
            context,
            handle,
            vk::Offset3D { x: 0, y: cmap_id as i32, z: 0 },
            vk::Extent3D { width: CMAP_WIDTH, height: 1, depth: 1 },
            &row,
        )
    }

    /// Download and unpack colormap row `cmap_id` from the shared color
    /// texture. Returns `ResourceError::NotFound` if no colormap texture
    /// has been registered yet.
    pub fn colormap_row(
        &mut self,
        context: &VulkanContext,
        resources: &mut ResourceManager,
        cmap_id: u32,
    ) -> Result<Vec<[u8; 4]>, ResourceError> {
        let handle = self.color_texture.ok_or(ResourceError::NotFound)?;
        let bytes = resources.download_tex(
            context,
            handle,
            vk::Offset3D { x: 0, y: cmap_id as i32, z: 0 },
            vk::Extent3D { width: CMAP_WIDTH, height: 1, depth: 1 },
        )?;
        Ok(colormap::unpack_row(&bytes))
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::controller::{Controller, InputEvent, MouseButton, PanZoomState};
    use crate::scene::viewport::Viewport;

    #[test]
    fn dispatch_event_routes_to_panel_under_cursor() {
        let mut scene = Scene::new();
        let left = Panel::new(0, 0, Controller::PanZoom(PanZoomState::new((100.0, 100.0), false)), Viewport::new((0.0, 0.0), (100.0, 100.0)));
        let right = Panel::new(0, 1, Controller::PanZoom(PanZoomState::new((100.0, 100.0), false)), Viewport::new((100.0, 0.0), (100.0, 100.0)));
        scene.add_panel(left);
        scene.add_panel(right);

        scene.dispatch_event(&InputEvent::Drag {
            button: MouseButton::Left,
            pos: (150.0, 50.0),
            delta: (10.0, 0.0),
        });

        let update = scene.updates.try_dequeue().expect("expected a queued update");
        assert_eq!(update.panel_index, 1);
    }

    #[test]
    fn panel_at_finds_containing_panel() {
        let mut scene = Scene::new();
        scene.add_panel(Panel::new(0, 0, Controller::None, Viewport::new((0.0, 0.0), (50.0, 50.0))));
        scene.add_panel(Panel::new(0, 1, Controller::None, Viewport::new((50.0, 0.0), (50.0, 50.0))));
        assert_eq!(scene.panel_at((10.0, 10.0)), Some(0));
        assert_eq!(scene.panel_at((60.0, 10.0)), Some(1));
        assert_eq!(scene.panel_at((1000.0, 1000.0)), None);
    }
}
