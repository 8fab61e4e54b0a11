//! Building a stage from a scene description

use std::collections::BTreeMap;

use thiserror::Error;
use webswing_animation::{
    AnchorBounds, AnchorRef, ControlPoint, CurvePath, Easing, EdgeSpec, Entrance, IdleLoop, LoopPolicy,
    MotionError, MotionPreset, MotionSampler, MotionTrack, OnKill, Oscillator, PathCoord, Property, ScrubLag,
    Stage, ThresholdPolicy, TimelineConfig, Timing, TransformState, TriggerRegion,
};
use webswing_core::{TargetId, Viewport};

use crate::config::{
    DriveConfig, EntranceConfig, IdleConfig, KillPolicy, LoopMode, MotionConfig, PointConfig, SceneConfig,
    ScrollConfig, ThresholdConfig, TimelineSettings,
};

/// Scene construction errors
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unknown {kind} preset {name:?}")]
    UnknownPreset { kind: &'static str, name: String },
    #[error("unknown property {0:?}")]
    UnknownProperty(String),
    #[error("target {0:?} is declared twice")]
    DuplicateTarget(String),
    #[error("target id {0} is used twice")]
    DuplicateTargetId(u64),
    #[error("target {0:?}: {1}")]
    Target(String, #[source] Box<SceneError>),
    #[error("region needs either an anchor box (`top`) or explicit offsets")]
    MissingRegion,
    #[error("scroll region with an anchor `top` needs a `height`")]
    MissingHeight,
    #[error("scroll region ends at {end} before it starts at {start}")]
    InvertedRegion { start: f32, end: f32 },
    #[error("motion has neither a preset nor from/to values")]
    EmptyMotion,
    #[error("viewport {width}x{height} is not usable")]
    BadViewport { width: f32, height: f32 },
    #[error(transparent)]
    Motion(#[from] MotionError),
}

type Result<T> = std::result::Result<T, SceneError>;

/// A built stage plus the names its targets were declared with
#[derive(Debug)]
pub struct Scene {
    pub name: String,
    pub stage: Stage,
    targets: BTreeMap<String, TargetId>,
}

impl Scene {
    pub fn build(config: &SceneConfig) -> Result<Scene> {
        let viewport = Viewport::new(config.viewport.width, config.viewport.height);
        if !viewport.is_usable() {
            return Err(SceneError::BadViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let mut scene = Scene {
            name: config.scene.name.clone(),
            stage: Stage::new(viewport).with_config(timeline_config(&config.timeline)),
            targets: BTreeMap::new(),
        };
        let mut next_id = 1u64;

        for target in &config.targets {
            let id = target.id.unwrap_or(next_id);
            next_id = next_id.max(id + 1);
            let target_id = scene.register(&target.name, id)?;
            scene
                .mount(target_id, target.entrance.as_ref(), target.idle.as_ref(), target.scroll.as_ref())
                .map_err(|err| SceneError::Target(target.name.clone(), Box::new(err)))?;
        }

        for stagger in &config.staggers {
            let mut ids = Vec::with_capacity(stagger.targets.len());
            for name in &stagger.targets {
                ids.push(scene.register(name, next_id)?);
                next_id += 1;
            }
            let entrance = entrance(&stagger.entrance)?;
            match &stagger.trigger {
                Some(trigger) => {
                    let region = threshold_region(trigger)?;
                    scene
                        .stage
                        .stagger_on_enter(&ids, &region, &entrance.track, entrance.timing, stagger.stagger_ms)?;
                }
                None => {
                    scene
                        .stage
                        .stagger_now(&ids, &entrance.track, entrance.timing, stagger.stagger_ms)?;
                }
            }
        }

        for field in &config.particles {
            let drifts = MotionPreset::particle_field(viewport, field.targets.len())?;
            for (name, drift) in field.targets.iter().zip(drifts) {
                let target = scene.register(name, next_id)?;
                next_id += 1;
                let id = scene.stage.create_timeline(target);
                if let Some(timeline) = scene.stage.get_mut(id) {
                    timeline.loop_idle(drift.track, drift.loop_policy, drift.timing)?;
                }
            }
        }

        tracing::info!(
            scene = %scene.name,
            targets = scene.targets.len(),
            timelines = scene.stage.len(),
            "scene built"
        );
        Ok(scene)
    }

    /// Target id by declared name
    pub fn target(&self, name: &str) -> Option<TargetId> {
        self.targets.get(name).copied()
    }

    pub fn target_name(&self, id: TargetId) -> Option<&str> {
        self.targets
            .iter()
            .find(|(_, other)| **other == id)
            .map(|(name, _)| name.as_str())
    }

    /// Declared targets, sorted by name
    pub fn targets(&self) -> impl Iterator<Item = (&str, TargetId)> + '_ {
        self.targets.iter().map(|(name, id)| (name.as_str(), *id))
    }

    fn register(&mut self, name: &str, id: u64) -> Result<TargetId> {
        if self.targets.contains_key(name) {
            return Err(SceneError::DuplicateTarget(name.to_string()));
        }
        let id = TargetId(id);
        if self.targets.values().any(|other| *other == id) {
            return Err(SceneError::DuplicateTargetId(id.0));
        }
        self.targets.insert(name.to_string(), id);
        Ok(id)
    }

    fn mount(
        &mut self,
        target: TargetId,
        entrance_cfg: Option<&EntranceConfig>,
        idle_cfg: Option<&IdleConfig>,
        scroll_cfg: Option<&ScrollConfig>,
    ) -> Result<()> {
        let viewport = self.stage.viewport();
        let id = self.stage.create_timeline(target);
        let Some(timeline) = self.stage.get_mut(id) else {
            return Ok(());
        };

        if let Some(cfg) = entrance_cfg {
            let Entrance { track, timing } = entrance(&cfg.motion)?;
            match &cfg.trigger {
                Some(trigger) => {
                    timeline.play_entrance_on_enter(threshold_region(trigger)?, track, timing)?;
                }
                None => {
                    timeline.play_entrance(track, timing)?;
                }
            }
        }
        if let Some(cfg) = scroll_cfg {
            let region = scrub_region(cfg, viewport)?;
            let sampler = drive(&cfg.drive, viewport)?;
            timeline.bind_scroll_lagged(region, sampler, cfg.lag_ms.map(ScrubLag::new))?;
        }
        if let Some(cfg) = idle_cfg {
            let IdleLoop {
                track,
                loop_policy,
                timing,
            } = idle(cfg)?;
            timeline.loop_idle(track, loop_policy, timing)?;
        }
        Ok(())
    }
}

fn timeline_config(settings: &TimelineSettings) -> TimelineConfig {
    let defaults = TimelineConfig::default();
    TimelineConfig {
        idle_debounce_ms: settings.idle_debounce_ms.unwrap_or(defaults.idle_debounce_ms),
        max_consecutive_faults: settings
            .max_consecutive_faults
            .unwrap_or(defaults.max_consecutive_faults),
        heading_epsilon: settings.heading_epsilon.unwrap_or(defaults.heading_epsilon),
        entrance_on_kill: match settings.entrance_on_kill {
            Some(KillPolicy::Complete) => OnKill::Complete,
            Some(KillPolicy::Hold) => OnKill::Hold,
            None => defaults.entrance_on_kill,
        },
    }
}

fn easing(name: Option<&str>) -> Result<Option<Easing>> {
    Ok(name.map(Easing::parse).transpose()?)
}

fn state(values: &BTreeMap<String, f32>) -> Result<TransformState> {
    values.iter().try_fold(TransformState::default(), |state, (name, value)| {
        let property = Property::from_name(name).ok_or_else(|| SceneError::UnknownProperty(name.clone()))?;
        Ok(state.with(property, *value))
    })
}

fn explicit_track(from: &BTreeMap<String, f32>, to: &BTreeMap<String, f32>, easing: Easing) -> Result<MotionTrack> {
    if from.is_empty() && to.is_empty() {
        return Err(SceneError::EmptyMotion);
    }
    Ok(MotionTrack::from_to(&state(from)?, &state(to)?, easing))
}

/// Preset timing, then any per-scene overrides
fn timed(cfg: &MotionConfig, mut timing: Timing) -> Result<Timing> {
    if let Some(duration) = cfg.duration_ms {
        timing.duration_ms = duration;
    }
    if let Some(delay) = cfg.delay_ms {
        timing.delay_ms = delay;
    }
    if let Some(easing) = easing(cfg.easing.as_deref())? {
        timing = timing.with_easing(easing);
    }
    Ok(timing)
}

fn entrance(cfg: &MotionConfig) -> Result<Entrance> {
    let base = match cfg.preset.as_deref() {
        Some("rise_in") => MotionPreset::rise_in(cfg.amount.unwrap_or(100.0)),
        Some("pop_in") => MotionPreset::pop_in(),
        Some("spin_in") => MotionPreset::spin_in(),
        Some("flip_in") => MotionPreset::flip_in(),
        Some("drop_in") => MotionPreset::drop_in(),
        Some(other) => {
            return Err(SceneError::UnknownPreset {
                kind: "entrance",
                name: other.to_string(),
            })
        }
        None => Entrance {
            track: explicit_track(&cfg.from, &cfg.to, Easing::Linear)?,
            timing: Timing::default(),
        },
    };
    Ok(Entrance {
        timing: timed(cfg, base.timing)?,
        track: base.track,
    })
}

fn idle(cfg: &IdleConfig) -> Result<IdleLoop> {
    let motion = &cfg.motion;
    let base = match motion.preset.as_deref() {
        Some("idle_swing") => MotionPreset::idle_swing(motion.amount.unwrap_or(20.0)),
        Some(other) => {
            return Err(SceneError::UnknownPreset {
                kind: "idle",
                name: other.to_string(),
            })
        }
        None => IdleLoop {
            track: explicit_track(&motion.from, &motion.to, Easing::Linear)?,
            loop_policy: LoopPolicy::Yoyo,
            timing: Timing::default(),
        },
    };
    let loop_policy = match cfg.loop_mode {
        Some(LoopMode::None) => LoopPolicy::None,
        Some(LoopMode::Repeat) => LoopPolicy::Repeat,
        Some(LoopMode::Yoyo) => LoopPolicy::Yoyo,
        None => base.loop_policy,
    };
    Ok(IdleLoop {
        timing: timed(motion, base.timing)?,
        track: base.track,
        loop_policy,
    })
}

fn threshold_region(cfg: &ThresholdConfig) -> Result<TriggerRegion> {
    let anchor = AnchorRef(cfg.anchor);
    let region = match (cfg.top, cfg.start_offset) {
        (Some(top), _) => {
            TriggerRegion::threshold_at(anchor, AnchorBounds::new(top, cfg.height), EdgeSpec::parse(&cfg.start)?)
        }
        (None, Some(offset)) => TriggerRegion::threshold(anchor, offset, cfg.viewport_fraction.unwrap_or(0.8)),
        (None, None) => return Err(SceneError::MissingRegion),
    };
    Ok(match cfg.rearm_hysteresis_px {
        Some(hysteresis_px) => region.with_policy(ThresholdPolicy::Rearm { hysteresis_px }),
        None => region,
    })
}

fn scrub_region(cfg: &ScrollConfig, viewport: Viewport) -> Result<TriggerRegion> {
    let anchor = AnchorRef(cfg.anchor);
    let region = match (cfg.top, cfg.start_offset, cfg.end_offset) {
        (Some(top), _, _) => {
            let height = cfg.height.ok_or(SceneError::MissingHeight)?;
            TriggerRegion::scrub_between(
                anchor,
                AnchorBounds::new(top, height),
                EdgeSpec::parse(&cfg.start)?,
                EdgeSpec::parse(&cfg.end)?,
                viewport,
            )
        }
        (None, Some(start), Some(end)) => TriggerRegion::scrub(anchor, start, end),
        _ => return Err(SceneError::MissingRegion),
    };
    if region.is_inverted() {
        return Err(SceneError::InvertedRegion {
            start: region.start_offset,
            end: region.end_offset,
        });
    }
    Ok(region)
}

fn control_point(cfg: &PointConfig) -> ControlPoint {
    let point = ControlPoint::new(
        PathCoord::offset(cfg.x_fraction, cfg.x),
        PathCoord::offset(cfg.y_fraction, cfg.y),
    );
    match cfg.weight {
        Some(weight) => point.with_weight(weight),
        None => point,
    }
}

fn drive(cfg: &DriveConfig, viewport: Viewport) -> Result<MotionSampler> {
    let sampler: MotionSampler = match cfg {
        DriveConfig::SwingPath => MotionPreset::swing_path(viewport)?.into(),
        DriveConfig::HeroOscillator => MotionPreset::hero_oscillator().into(),
        DriveConfig::Parallax { y_percent } => MotionPreset::parallax(*y_percent).into(),
        DriveConfig::Path {
            points,
            curviness,
            auto_rotate,
            easing: ease_name,
        } => {
            let mut path = CurvePath::new(points.iter().map(control_point).collect(), viewport)?
                .with_auto_rotate(*auto_rotate);
            if let Some(curviness) = curviness {
                path = path.with_curviness(*curviness);
            }
            if let Some(e) = easing(ease_name.as_deref())? {
                path = path.with_easing(e);
            }
            path.into()
        }
        DriveConfig::Oscillator {
            base_x,
            amplitude,
            cycles,
            rotation,
        } => {
            let osc = Oscillator::new(*base_x, *amplitude, *cycles);
            match rotation {
                Some(degrees) => osc.with_rotation(*degrees),
                None => osc,
            }
            .into()
        }
        DriveConfig::Keyframes {
            from,
            to,
            easing: ease_name,
        } => {
            let e = easing(ease_name.as_deref())?.unwrap_or_default();
            explicit_track(from, to, e)?.into()
        }
    };
    Ok(sampler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(toml: &str) -> Result<Scene> {
        Scene::build(&SceneConfig::from_toml(toml).unwrap())
    }

    #[test]
    fn assigns_ids_in_declaration_order() {
        let scene = build(
            r#"
            [[target]]
            name = "a"
            [[target]]
            name = "b"
            id = 10
            [[target]]
            name = "c"
            "#,
        )
        .unwrap();
        assert_eq!(scene.target("a"), Some(TargetId(1)));
        assert_eq!(scene.target("b"), Some(TargetId(10)));
        assert_eq!(scene.target("c"), Some(TargetId(11)));
        assert_eq!(scene.target_name(TargetId(10)), Some("b"));
        assert_eq!(scene.stage.len(), 3);
    }

    #[test]
    fn unknown_easing_fails_at_load() {
        let err = build(
            r#"
            [[target]]
            name = "a"
            [target.entrance]
            preset = "pop_in"
            easing = "wobble.out"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SceneError::Target(_, ref inner)
                if matches!(**inner, SceneError::Motion(MotionError::UnknownEasingKind(_)))
        ));
    }

    #[test]
    fn unknown_property_and_preset_are_reported() {
        let err = build(
            r#"
            [[target]]
            name = "a"
            [target.entrance]
            from = { skew = 1.0 }
            to = { skew = 0.0 }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("skew"));

        let err = build(
            r#"
            [[target]]
            name = "a"
            [target.idle]
            preset = "bounce"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bounce"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = build(
            r#"
            [[target]]
            name = "a"
            [[stagger]]
            targets = ["a"]
            entrance = { preset = "pop_in" }
            trigger = { start_offset = 100.0 }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::DuplicateTarget(name) if name == "a"));
    }

    #[test]
    fn second_region_on_one_target_is_rejected() {
        let err = build(
            r#"
            [[target]]
            name = "a"
            [target.entrance]
            preset = "rise_in"
            trigger = { start_offset = 500.0 }
            [target.scroll]
            start_offset = 0.0
            end_offset = 1000.0
            drive = { kind = "hero_oscillator" }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("already"));
    }

    #[test]
    fn builds_staggered_group() {
        let scene = build(
            r#"
            [[stagger]]
            targets = ["card-1", "card-2", "card-3"]
            stagger_ms = 200.0
            entrance = { preset = "pop_in" }
            trigger = { top = 1800.0, height = 600.0, start = "top 80%" }
            "#,
        )
        .unwrap();
        assert_eq!(scene.stage.len(), 3);
        let delays: Vec<f32> = ["card-1", "card-2", "card-3"]
            .iter()
            .map(|name| {
                let id = scene.stage.find(scene.target(name).unwrap()).unwrap();
                let tl = scene.stage.get(id).unwrap();
                tl.handle(tl.entrance_id().unwrap()).unwrap().timing().delay_ms
            })
            .collect();
        assert_eq!(delays, vec![0.0, 200.0, 400.0]);
    }

    #[test]
    fn untriggered_stagger_and_particles_start_on_mount() {
        use webswing_animation::HandleState;

        let scene = build(
            r#"
            [viewport]
            width = 1000.0
            height = 800.0

            [[stagger]]
            targets = ["badge", "title", "tagline"]
            stagger_ms = 400.0
            entrance = { preset = "drop_in" }

            [[particles]]
            targets = ["web-0", "web-1", "web-2"]
            "#,
        )
        .unwrap();
        assert_eq!(scene.stage.len(), 6);

        let entrance_of = |name: &str| {
            let id = scene.stage.find(scene.target(name).unwrap()).unwrap();
            let tl = scene.stage.get(id).unwrap();
            tl.handle(tl.entrance_id().unwrap()).unwrap().clone()
        };
        assert_eq!(entrance_of("tagline").timing().delay_ms, 800.0);
        assert_eq!(entrance_of("badge").state(), HandleState::Running);

        let web = scene.stage.find(scene.target("web-2").unwrap()).unwrap();
        let tl = scene.stage.get(web).unwrap();
        let drift = tl.handle(tl.idle_id().unwrap()).unwrap();
        assert_eq!(drift.loop_policy(), LoopPolicy::Repeat);
        assert!(drift.track().properties().contains(Property::X));
    }

    fn scroll_error(scroll: &str) -> SceneError {
        let toml = format!(
            "[viewport]\nwidth = 1000.0\nheight = 800.0\n[[target]]\nname = \"a\"\n[target.scroll]\n{scroll}\ndrive = {{ kind = \"hero_oscillator\" }}\n"
        );
        match build(&toml).unwrap_err() {
            SceneError::Target(_, inner) => *inner,
            other => panic!("expected a target error, got {other}"),
        }
    }

    #[test]
    fn scroll_region_spans_must_run_forward() {
        // no height: "bottom bottom" would land one viewport above "top top"
        assert!(matches!(scroll_error("top = 500.0"), SceneError::MissingHeight));

        match scroll_error("top = 500.0\nheight = 400.0") {
            SceneError::InvertedRegion { start, end } => {
                assert_eq!(start, 500.0);
                assert_eq!(end, 100.0);
            }
            other => panic!("expected an inverted region, got {other}"),
        }

        assert!(matches!(
            scroll_error("start_offset = 900.0\nend_offset = 300.0"),
            SceneError::InvertedRegion { .. }
        ));

        let scene = build(
            r#"
            [[target]]
            name = "a"
            [target.scroll]
            top = 0.0
            height = 1440.0
            drive = { kind = "hero_oscillator" }
            "#,
        );
        assert!(scene.is_ok());
    }

    #[test]
    fn timeline_settings_override_defaults() {
        let scene = build(
            r#"
            [timeline]
            idle_debounce_ms = 300.0
            entrance_on_kill = "hold"
            "#,
        )
        .unwrap();
        let config = scene.stage.config();
        assert_eq!(config.idle_debounce_ms, 300.0);
        assert_eq!(config.entrance_on_kill, OnKill::Hold);
        assert_eq!(config.max_consecutive_faults, 3);
    }

    #[test]
    fn custom_path_drive() {
        let viewport = Viewport::new(1000.0, 800.0);
        let sampler = drive(
            &DriveConfig::Path {
                points: vec![
                    PointConfig::default(),
                    PointConfig {
                        x_fraction: 1.0,
                        y: 100.0,
                        ..PointConfig::default()
                    },
                ],
                curviness: None,
                auto_rotate: true,
                easing: Some("power1.inOut".to_string()),
            },
            viewport,
        )
        .unwrap();
        let end = sampler.sample(1.0);
        assert!((end.x.unwrap() - 1000.0).abs() < 1e-3);
        assert!((end.y.unwrap() - 100.0).abs() < 1e-3);
        assert!(end.rotation.is_some());
    }
}
