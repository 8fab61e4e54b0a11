//! Scenario runner that replays host events against a scene.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use webswing_animation::{AnchorBounds, Property, TransformSink, TransformState};
use webswing_core::{Event, TargetId};

use crate::config::SceneConfig;
use crate::headless_assert::{evaluate_assert_transform, evaluate_assert_writes, AssertionResult, ValueCheck};
use crate::headless_report::{HeadlessReport, RunCounters};
use crate::headless_scenario::{HeadlessScenario, ScenarioStep};
use crate::scene::Scene;

/// Final outcome of a scenario run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: HeadlessReport },
    Failed { report: HeadlessReport },
}

impl RunOutcome {
    pub fn report(&self) -> &HeadlessReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Sink standing in for the view layer: keeps the last write per target
#[derive(Debug, Default)]
pub struct RecordingSink {
    latest: BTreeMap<TargetId, TransformState>,
    counts: BTreeMap<TargetId, u64>,
    total: u64,
}

impl RecordingSink {
    pub fn latest(&self, target: TargetId) -> Option<&TransformState> {
        self.latest.get(&target)
    }

    pub fn writes_for(&self, target: TargetId) -> u64 {
        self.counts.get(&target).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

impl TransformSink for RecordingSink {
    fn apply(&mut self, target: TargetId, state: &TransformState) {
        self.latest.insert(target, *state);
        *self.counts.entry(target).or_insert(0) += 1;
        self.total += 1;
    }
}

/// A scene being driven by a deterministic frame clock
#[derive(Debug)]
pub struct HeadlessRun {
    scene: Scene,
    sink: RecordingSink,
    elapsed_frames: u64,
    elapsed_ms: u64,
}

impl HeadlessRun {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            sink: RecordingSink::default(),
            elapsed_frames: 0,
            elapsed_ms: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn sink(&self) -> &RecordingSink {
        &self.sink
    }

    pub fn counters(&self) -> RunCounters {
        RunCounters {
            elapsed_frames: self.elapsed_frames,
            elapsed_ms: self.elapsed_ms,
            writes: self.sink.total(),
        }
    }

    fn now(&self) -> f64 {
        self.elapsed_ms as f64
    }

    pub fn scroll_to(&mut self, y: f32) {
        let event = Event::scroll(y, self.now());
        self.scene.stage.dispatch(&event, &mut self.sink);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let event = Event::resize(width, height, self.now());
        self.scene.stage.dispatch(&event, &mut self.sink);
    }

    pub fn unmount(&mut self, target: TargetId) {
        let event = Event::unmount(target, self.now());
        self.scene.stage.dispatch(&event, &mut self.sink);
    }

    pub fn move_anchor(&mut self, target: TargetId, bounds: AnchorBounds) {
        let Some(id) = self.scene.stage.find(target) else {
            return;
        };
        if let Some(timeline) = self.scene.stage.get_mut(id) {
            timeline.on_anchor_moved(bounds);
        }
    }

    /// Advance the clock by `dt_ms` and render one frame
    pub fn frame(&mut self, dt_ms: u64) -> usize {
        self.elapsed_frames = self.elapsed_frames.saturating_add(1);
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        let event = Event::frame(dt_ms as f32, self.now());
        self.scene.stage.dispatch(&event, &mut self.sink)
    }

    /// Render frames covering `ms`, the last one shortened to fit
    pub fn wait(&mut self, ms: u64, tick_ms: u64) {
        let tick = tick_ms.max(1);
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(tick);
            remaining -= step;
            self.frame(step);
        }
    }

    /// Last written transforms keyed by target name
    pub fn transforms(&self) -> BTreeMap<String, BTreeMap<String, f32>> {
        self.scene
            .targets()
            .filter_map(|(name, id)| {
                let state = self.sink.latest(id)?;
                let values: BTreeMap<String, f32> = state
                    .iter()
                    .map(|(property, value)| (property.name().to_string(), value))
                    .collect();
                Some((name.to_string(), values))
            })
            .collect()
    }
}

/// Load a scene and a scenario from disk and run them
pub fn run_paths(scene_path: &Path, scenario_path: &Path) -> Result<RunOutcome> {
    let config = SceneConfig::load(scene_path)?;
    let scene = Scene::build(&config).with_context(|| format!("Failed to build scene {}", scene_path.display()))?;
    let scenario = HeadlessScenario::from_path(scenario_path)?;
    run_scenario(scene, &scenario)
}

/// Execute a scenario against a built scene.
///
/// Steps naming unknown targets or properties are rejected before anything
/// runs; a failed assertion ends the run with a failed report.
pub fn run_scenario(scene: Scene, scenario: &HeadlessScenario) -> Result<RunOutcome> {
    if scenario.tick_ms == 0 {
        bail!("scenario tick_ms must be > 0");
    }
    let steps = resolve_steps(&scene, &scenario.steps)?;
    let mut run = HeadlessRun::new(scene);

    for (step_index, (step, target)) in scenario.steps.iter().zip(steps).enumerate() {
        tracing::debug!(step_index, ?step, "scenario step");
        let target = target.unwrap_or(TargetId(0));
        match step {
            ScenarioStep::ScrollTo { y } => run.scroll_to(*y),
            ScenarioStep::Resize { width, height } => run.resize(*width, *height),
            ScenarioStep::MoveAnchor { top, height, .. } => run.move_anchor(target, AnchorBounds::new(*top, *height)),
            ScenarioStep::Tick { frames } => {
                for _ in 0..*frames {
                    run.frame(scenario.tick_ms);
                }
            }
            ScenarioStep::Wait { ms } => run.wait(*ms, scenario.tick_ms),
            ScenarioStep::Unmount { .. } => run.unmount(target),
            ScenarioStep::AssertTransform {
                target: name,
                property,
                equals,
                min,
                max,
                tolerance,
            } => {
                let check = ValueCheck {
                    equals: *equals,
                    min: *min,
                    max: *max,
                    tolerance: *tolerance,
                };
                let property = parse_property(property)?;
                let result = evaluate_assert_transform(name, property, &check, run.sink().latest(target));
                if let Some(report) = failure(&run, "assert_transform", step_index, result) {
                    return Ok(RunOutcome::Failed { report });
                }
            }
            ScenarioStep::AssertWrites { target: name, count } => {
                let result = evaluate_assert_writes(name, *count, run.sink().writes_for(target));
                if let Some(report) = failure(&run, "assert_writes", step_index, result) {
                    return Ok(RunOutcome::Failed { report });
                }
            }
        }
    }

    let counters = run.counters();
    tracing::info!(
        scene = %run.scene().name,
        frames = counters.elapsed_frames,
        writes = counters.writes,
        "scenario passed"
    );
    Ok(RunOutcome::Passed {
        report: HeadlessReport::passed(&run.scene().name, counters).with_transforms(run.transforms()),
    })
}

fn resolve_steps(scene: &Scene, steps: &[ScenarioStep]) -> Result<Vec<Option<TargetId>>> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            if let ScenarioStep::AssertTransform { property, .. } = step {
                parse_property(property).with_context(|| format!("step {index}"))?;
            }
            match step.target() {
                Some(name) => match scene.target(name) {
                    Some(id) => Ok(Some(id)),
                    None => bail!("step {index}: unknown target {name:?}"),
                },
                None => Ok(None),
            }
        })
        .collect()
}

fn parse_property(name: &str) -> Result<Property> {
    match Property::from_name(name) {
        Some(property) => Ok(property),
        None => bail!("unknown property {name:?}"),
    }
}

fn failure(run: &HeadlessRun, assertion: &str, step_index: usize, result: AssertionResult) -> Option<HeadlessReport> {
    let AssertionResult::Failed { code, message } = result else {
        return None;
    };
    tracing::warn!(step_index, %code, %message, "assertion failed");
    Some(
        HeadlessReport::failed(&run.scene().name, assertion, step_index, code, message, run.counters())
            .with_transforms(run.transforms()),
    )
}
