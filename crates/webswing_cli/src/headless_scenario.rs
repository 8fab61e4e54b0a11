//! Scroll scenario definition for headless runs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Sequence of host events and checks replayed against a scene.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadlessScenario {
    /// Logical milliseconds between frames
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    pub steps: Vec<ScenarioStep>,
}

fn default_tick_ms() -> u64 {
    16
}

impl HeadlessScenario {
    /// Load a scenario from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a scenario from file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Document scroll position in px
    ScrollTo { y: f32 },
    Resize { width: f32, height: f32 },
    /// The view layer re-measured a target's anchor element
    MoveAnchor { target: String, top: f32, height: f32 },
    Tick { frames: u32 },
    Wait { ms: u64 },
    Unmount { target: String },
    /// Check the last transform written to a target
    AssertTransform {
        target: String,
        property: String,
        #[serde(default)]
        equals: Option<f32>,
        #[serde(default)]
        min: Option<f32>,
        #[serde(default)]
        max: Option<f32>,
        #[serde(default = "default_tolerance")]
        tolerance: f32,
    },
    /// Check how many writes a target has received so far
    AssertWrites { target: String, count: u64 },
}

fn default_tolerance() -> f32 {
    1e-3
}

impl ScenarioStep {
    /// Target name the step refers to, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            ScenarioStep::MoveAnchor { target, .. }
            | ScenarioStep::Unmount { target }
            | ScenarioStep::AssertTransform { target, .. }
            | ScenarioStep::AssertWrites { target, .. } => Some(target),
            ScenarioStep::ScrollTo { .. }
            | ScenarioStep::Resize { .. }
            | ScenarioStep::Tick { .. }
            | ScenarioStep::Wait { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_steps() {
        let scenario = HeadlessScenario::from_json(
            r#"{
                "steps": [
                    { "type": "scroll_to", "y": 250 },
                    { "type": "tick", "frames": 3 },
                    { "type": "assert_transform", "target": "hero", "property": "x", "min": 0 }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.tick_ms, 16);
        assert_eq!(scenario.steps.len(), 3);
        assert!(matches!(scenario.steps[0], ScenarioStep::ScrollTo { y } if y == 250.0));
        match &scenario.steps[2] {
            ScenarioStep::AssertTransform {
                min, equals, tolerance, ..
            } => {
                assert_eq!(*min, Some(0.0));
                assert_eq!(*equals, None);
                assert_eq!(*tolerance, 1e-3);
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(scenario.steps[2].target(), Some("hero"));
        assert_eq!(scenario.steps[1].target(), None);
    }

    #[test]
    fn rejects_unknown_step_type() {
        assert!(HeadlessScenario::from_json(r#"{ "steps": [{ "type": "teleport" }] }"#).is_err());
    }
}
