//! The device polling loop.
//!
//! One iteration walks `FETCH_CONFIG → MAYBE_APPLY_CONFIG → MAYBE_CAPTURE
//! → SLEEP` and the loop repeats for the life of the process:
//!
//! ```text
//! fetch config ──(non-200)──▶ abort
//!      │
//!      ▼
//! new version? ──yes──▶ decode, replace config, reconfigure camera
//!      │
//!      ▼
//! capture due? ──yes──▶ capture, sign, upload (failures logged)
//!      │
//!      ▼
//! sleep config_interval
//! ```

mod runner;
mod state;

pub use runner::{CaptureResult, StepOutcome, Watchdog, WatchdogError};
pub use state::{PollState, WatchdogStats};
