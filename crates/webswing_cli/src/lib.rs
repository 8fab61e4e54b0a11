//! Webswing headless harness
//!
//! Loads a motion scene from TOML, replays a JSON scroll scenario against it
//! with a deterministic frame clock, and reports the transforms each target
//! ended up with.

pub mod config;
pub mod headless_assert;
pub mod headless_report;
pub mod headless_runner;
pub mod headless_scenario;
pub mod scene;

pub use config::SceneConfig;
pub use headless_report::{HeadlessReport, ReportStatus, RunCounters};
pub use headless_runner::{run_paths, run_scenario, HeadlessRun, RecordingSink, RunOutcome};
pub use headless_scenario::{HeadlessScenario, ScenarioStep};
pub use scene::{Scene, SceneError};
