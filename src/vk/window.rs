//! Windowing collaborator.
//!
//! Windowing and input are treated as an external concern: this crate does
//! not own an event loop or an input-mapping layer, only a thin handle the
//! surface and swapchain need (framebuffer extent, raw window handle).

use glfw::{Context as GlfwContext, Glfw};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle};

use crate::vk::context::VulkanError;

/// The windowing boundary this crate depends on: a source of raw window/
/// display handles, a framebuffer size, a close request, and an event pump.
/// `Window` is the only implementation shipped here; the trait exists so a
/// caller embedding this engine in a different windowing toolkit can swap
/// it out without touching `vk::Surface`/`vk::Swapchain`.
pub trait WindowBackend: HasRawWindowHandle + HasRawDisplayHandle {
    /// Current framebuffer size in pixels.
    fn framebuffer_size(&self) -> (u32, u32);
    /// Whether the user has requested the window be closed.
    fn should_close(&self) -> bool;
    /// Vulkan instance extensions this backend's surface creation needs.
    fn required_instance_extensions(&self) -> Vec<String>;
}

/// A GLFW-backed window providing the raw handles the surface needs and the
/// framebuffer extent the swapchain needs.
pub struct Window {
    glfw: Glfw,
    handle: glfw::Window,
    events: std::sync::mpsc::Receiver<(f64, glfw::WindowEvent)>,
}

impl Window {
    /// Create a window of `width`×`height` titled `title`, with the Vulkan
    /// client-API hint (GLFW otherwise assumes OpenGL).
    pub fn new(width: u32, height: u32, title: &str) -> Result<Self, VulkanError> {
        let mut glfw = glfw::init(glfw::FAIL_ON_ERRORS)
            .map_err(|e| VulkanError::InitializationFailed(e.to_string()))?;
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));

        let (handle, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or_else(|| VulkanError::InitializationFailed("failed to create GLFW window".into()))?;

        Ok(Self { glfw, handle, events })
    }

    /// Current framebuffer size in pixels (what the swapchain extent must match).
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (w, h) = self.handle.get_framebuffer_size();
        (w as u32, h as u32)
    }

    /// Whether the user has requested the window be closed.
    pub fn should_close(&self) -> bool {
        self.handle.should_close()
    }

    /// Poll the windowing system for new events; drains but does not
    /// interpret them (interpretation is the input collaborator's job).
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        while glfw::flush_messages(&self.events).next().is_some() {}
    }

    /// The names of the Vulkan instance extensions GLFW requires for surface creation.
    pub fn required_instance_extensions(&self) -> Vec<String> {
        self.glfw.get_required_instance_extensions().unwrap_or_default()
    }
}

unsafe impl HasRawWindowHandle for Window {
    fn raw_window_handle(&self) -> RawWindowHandle {
        self.handle.raw_window_handle()
    }
}

unsafe impl HasRawDisplayHandle for Window {
    fn raw_display_handle(&self) -> RawDisplayHandle {
        self.handle.raw_display_handle()
    }
}

impl WindowBackend for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        Window::framebuffer_size(self)
    }

    fn should_close(&self) -> bool {
        Window::should_close(self)
    }

    fn required_instance_extensions(&self) -> Vec<String> {
        Window::required_instance_extensions(self)
    }
}
