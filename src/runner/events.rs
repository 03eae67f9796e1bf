//! The event payloads carried by the runner's four priority FIFOs. Frame
//! events drive the other three: handling one Frame event is what enqueues
//! whatever Main/Refill/Present work that frame turns out to need.

use crate::scene::InputEvent;

/// Kicks one tick of the event loop: advance controllers by `dt`, then
/// forward `input` to the scene before deciding what else needs doing.
#[derive(Debug, Clone)]
pub struct FrameEvent {
    pub dt: f32,
    pub input: Vec<InputEvent>,
}

/// A low-level request resolved directly against the resource manager,
/// bypassing the usual visual/prop bake path (e.g. host tooling asking for
/// an immediate screenshot or a clean shutdown).
#[derive(Debug, Clone)]
pub enum RunnerRequest {
    /// Write the next presented frame to this path before continuing.
    Screenshot(std::path::PathBuf),
    /// Stop accepting new frames once the current one finishes.
    Stop,
}

/// Work discovered while processing a `FrameEvent`, handled before any
/// Refill/Present so the GPU-facing queues only see settled state.
#[derive(Debug, Clone)]
pub enum MainEvent {
    /// A panel gained a visual: its data-coordinate box must be
    /// recomputed, every owned visual's pos props re-transformed against
    /// it, and the panel's draw list re-recorded.
    VisualAdded { panel_index: usize },
    /// A panel gained or lost a visual; its draw list must be re-recorded.
    VisualChanged { panel_index: usize },
    /// A panel's data-space bounding box changed; its model matrix is stale.
    CoordsChanged { panel_index: usize },
    /// A panel's viewport or controller changed; its MVP uniform is stale.
    PanelChanged { panel_index: usize },
    /// A low-level request to resolve against the resource manager.
    Request(RunnerRequest),
    /// Flush the transfer engine's three job queues and run the upfill pass
    /// for the currently acquired image. Enqueued once per frame regardless
    /// of whether anything else changed.
    TransferFlush { image_index: usize },
}

/// Refill the command buffer for one swapchain image, either because
/// something changed or because its periodic full-refill counter elapsed.
#[derive(Debug, Clone, Copy)]
pub struct RefillEvent {
    pub image_index: usize,
    /// Forces a full re-record of every panel rather than only dirtied ones.
    pub full: bool,
}

/// Submit the recorded command buffer for `image_index` and present it.
#[derive(Debug, Clone, Copy)]
pub struct PresentEvent {
    pub image_index: usize,
}
