//! The event loop: a fixed Frame -> Main -> Refill -> Present FIFO
//! pipeline driving the scene graph, the resource manager, and the
//! transfer engine toward a presented frame.
//!
//! Nothing below this module knows the loop exists — panels mutate their
//! own state and enqueue update notifications, visuals bake themselves on
//! request, the transfer engine ticks when told to. The runner is strictly
//! the thing that tells them, in the order the data model requires.

mod config;
mod events;
#[allow(clippy::module_inception)]
mod runner;

pub use config::RunnerConfig;
pub use events::{FrameEvent, MainEvent, PresentEvent, RefillEvent, RunnerRequest};
pub use runner::{log_startup, Runner, RunnerError};
