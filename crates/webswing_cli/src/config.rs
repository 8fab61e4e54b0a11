//! Scene file handling (webswing.toml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Top-level scene description
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub scene: SceneMeta,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub timeline: TimelineSettings,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetConfig>,
    #[serde(default, rename = "stagger")]
    pub staggers: Vec<StaggerConfig>,
    #[serde(default)]
    pub particles: Vec<ParticlesConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SceneMeta {
    #[serde(default = "default_scene_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for SceneMeta {
    fn default() -> Self {
        Self {
            name: default_scene_name(),
            description: None,
        }
    }
}

fn default_scene_name() -> String {
    "untitled".to_string()
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

fn default_width() -> f32 {
    1280.0
}

fn default_height() -> f32 {
    720.0
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Overrides for the per-timeline tuning; unset fields keep the engine defaults
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct TimelineSettings {
    #[serde(default)]
    pub idle_debounce_ms: Option<f32>,
    #[serde(default)]
    pub max_consecutive_faults: Option<u32>,
    #[serde(default)]
    pub heading_epsilon: Option<f32>,
    #[serde(default)]
    pub entrance_on_kill: Option<KillPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KillPolicy {
    Complete,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    None,
    Repeat,
    Yoyo,
}

/// One animated element
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    pub name: String,
    /// Explicit target id; assigned in declaration order when omitted
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub entrance: Option<EntranceConfig>,
    #[serde(default)]
    pub idle: Option<IdleConfig>,
    #[serde(default)]
    pub scroll: Option<ScrollConfig>,
}

/// A timed motion: either a named preset or explicit `from`/`to` values
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MotionConfig {
    #[serde(default)]
    pub preset: Option<String>,
    /// Preset parameter (rise distance, swing degrees)
    #[serde(default)]
    pub amount: Option<f32>,
    #[serde(default)]
    pub from: BTreeMap<String, f32>,
    #[serde(default)]
    pub to: BTreeMap<String, f32>,
    #[serde(default)]
    pub easing: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<f32>,
    #[serde(default)]
    pub delay_ms: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EntranceConfig {
    #[serde(flatten)]
    pub motion: MotionConfig,
    /// Hold the entrance until this threshold fires
    #[serde(default)]
    pub trigger: Option<ThresholdConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdleConfig {
    #[serde(flatten)]
    pub motion: MotionConfig,
    #[serde(default, rename = "loop")]
    pub loop_mode: Option<LoopMode>,
}

/// Threshold region, given either as an element box with an edge pair or
/// as a raw scroll offset
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub anchor: u64,
    #[serde(default)]
    pub top: Option<f32>,
    #[serde(default)]
    pub height: f32,
    #[serde(default = "default_threshold_edge")]
    pub start: String,
    #[serde(default)]
    pub start_offset: Option<f32>,
    #[serde(default)]
    pub viewport_fraction: Option<f32>,
    /// Re-arm after scrolling back this far above the start
    #[serde(default)]
    pub rearm_hysteresis_px: Option<f32>,
}

fn default_threshold_edge() -> String {
    "top 80%".to_string()
}

/// Scrub binding: a region plus the drive it scrubs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrollConfig {
    #[serde(default)]
    pub anchor: u64,
    #[serde(default)]
    pub start_offset: Option<f32>,
    #[serde(default)]
    pub end_offset: Option<f32>,
    #[serde(default)]
    pub top: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default = "default_scrub_start")]
    pub start: String,
    #[serde(default = "default_scrub_end")]
    pub end: String,
    /// Applied progress trails the scroll position by about this long
    #[serde(default)]
    pub lag_ms: Option<f32>,
    pub drive: DriveConfig,
}

fn default_scrub_start() -> String {
    "top top".to_string()
}

fn default_scrub_end() -> String {
    "bottom bottom".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriveConfig {
    SwingPath,
    HeroOscillator,
    Parallax {
        y_percent: f32,
    },
    Path {
        points: Vec<PointConfig>,
        #[serde(default)]
        curviness: Option<f32>,
        #[serde(default)]
        auto_rotate: bool,
        #[serde(default)]
        easing: Option<String>,
    },
    Oscillator {
        #[serde(default)]
        base_x: f32,
        amplitude: f32,
        cycles: f32,
        #[serde(default)]
        rotation: Option<f32>,
    },
    Keyframes {
        from: BTreeMap<String, f32>,
        to: BTreeMap<String, f32>,
        #[serde(default)]
        easing: Option<String>,
    },
}

/// Control point; each axis is `px + fraction × viewport extent`
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct PointConfig {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub x_fraction: f32,
    #[serde(default)]
    pub y_fraction: f32,
    #[serde(default)]
    pub weight: Option<f32>,
}

/// Entrance launched on several targets offset by `stagger_ms`: as the
/// trigger fires, or on mount when there is no trigger
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaggerConfig {
    pub targets: Vec<String>,
    #[serde(default)]
    pub stagger_ms: f32,
    pub entrance: MotionConfig,
    #[serde(default)]
    pub trigger: Option<ThresholdConfig>,
}

/// Targets drifting across the viewport in one shared loop
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParticlesConfig {
    pub targets: Vec<String>,
}

impl SceneConfig {
    /// Load a scene from a file, or from `webswing.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self> {
        let scene_path = if path.is_dir() {
            path.join("webswing.toml")
        } else {
            path.to_path_buf()
        };

        if !scene_path.exists() {
            anyhow::bail!("No scene file found at {}", scene_path.display());
        }

        let content = fs::read_to_string(&scene_path)
            .with_context(|| format!("Failed to read {}", scene_path.display()))?;

        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", scene_path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize scene")
    }
}
