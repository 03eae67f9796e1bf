//! Runtime tuning read once from the process environment at
//! [`crate::runner::Runner::new`] time — never from a config file, since
//! these are meant to be flipped per-invocation (`DVZ_RUN_NFRAMES=10 cargo
//! run`) rather than checked into a project's asset config.

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Runner behavior sourced from environment variables.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Stop after this many frames. `None` runs until the caller stops polling events.
    pub nframes: Option<u64>,
    /// Write a screenshot of the last rendered frame to this path before exiting.
    pub screenshot: Option<PathBuf>,
    /// Background worker count for the transfer engine.
    pub num_threads: usize,
    /// Frames between forced full refills of every swapchain image's command buffer.
    pub refill_period: u32,
}

impl RunnerConfig {
    /// Read `DVZ_RUN_NFRAMES`, `DVZ_RUN_SCREENSHOT`, and `DVZ_NUM_THREADS`
    /// from the environment, falling back to sensible defaults when unset
    /// or unparseable.
    pub fn from_env() -> Self {
        let nframes = env::var("DVZ_RUN_NFRAMES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&n| n > 0);

        let screenshot = env::var("DVZ_RUN_SCREENSHOT").ok().map(PathBuf::from);

        let num_threads = env::var("DVZ_NUM_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .or_else(|| std::thread::available_parallelism().ok().map(NonZeroUsize::get))
            .unwrap_or(1);

        Self {
            nframes,
            screenshot,
            num_threads,
            refill_period: 2,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            nframes: None,
            screenshot: None,
            num_threads: 1,
            refill_period: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_runs_unbounded_with_one_thread() {
        let config = RunnerConfig::default();
        assert_eq!(config.nframes, None);
        assert_eq!(config.screenshot, None);
        assert_eq!(config.num_threads, 1);
    }

    #[test]
    fn from_env_ignores_zero_nframes() {
        // DVZ_RUN_NFRAMES=0 means "unset" rather than "stop immediately",
        // matching nframes being a count of frames still to render.
        env::remove_var("DVZ_RUN_NFRAMES");
        let config = RunnerConfig::from_env();
        assert_eq!(config.nframes, None);
    }
}
