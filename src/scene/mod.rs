//! Scene graph: panels arranged in a grid, each owning a [`Controller`]
//! that turns input into a camera, a [`Viewport`] describing its screen
//! placement, and the ordered list of visuals it draws.
//!
//! This module owns none of the GPU state itself — panels hold plain data
//! and matrices; the runner is what turns a panel's current MVP into an
//! actual uniform upload.

pub mod colormap;
pub mod controller;
pub mod coords;
pub mod panel;
#[allow(clippy::module_inception)]
mod scene;
pub mod ticks;
pub mod viewport;

pub use controller::{
    ArcballState, AxesState2D, AxesState3D, Controller, FlyState, InputEvent, KeyCode, MouseButton, MvpMatrices,
    PanZoomState,
};
pub use coords::DataCoords;
pub use panel::Panel;
pub use scene::{Scene, SceneUpdate, SceneUpdateKind};
pub use ticks::{Tick, TickLocator, UniformTickLocator};
pub use viewport::{InteractAxis, Viewport};
