//! End-to-end timeline behaviour through the stage, observed by a spy sink

use pretty_assertions::assert_eq;
use webswing_animation::{
    AnchorBounds, AnchorRef, EdgeSpec, MotionPreset, OnKill, Property, Stage, ThresholdPolicy, TimelineConfig,
    TimelineState, TransformSink, TransformState, TriggerRegion,
};
use webswing_core::{Event, TargetId, Viewport};

#[derive(Default)]
struct SpySink {
    writes: Vec<(TargetId, TransformState)>,
}

impl SpySink {
    fn for_target(&self, target: TargetId) -> Vec<TransformState> {
        self.writes
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, s)| *s)
            .collect()
    }
}

impl TransformSink for SpySink {
    fn apply(&mut self, target: TargetId, state: &TransformState) {
        self.writes.push((target, *state));
    }
}

const VIEWPORT: Viewport = Viewport::new(1200.0, 800.0);
const CHARACTER: TargetId = TargetId(1);
const CARD: TargetId = TargetId(2);

fn page_region() -> TriggerRegion {
    TriggerRegion::scrub_between(
        AnchorRef(0),
        AnchorBounds::new(0.0, 4000.0),
        EdgeSpec::parse("top top").unwrap(),
        EdgeSpec::parse("bottom bottom").unwrap(),
        VIEWPORT,
    )
}

fn mount_character(stage: &mut Stage) {
    let id = stage.create_timeline(CHARACTER);
    let timeline = stage.get_mut(id).unwrap();
    let entrance = MotionPreset::drop_in();
    timeline.play_entrance(entrance.track, entrance.timing).unwrap();
    timeline
        .bind_scroll(page_region(), MotionPreset::swing_path(VIEWPORT).unwrap())
        .unwrap();
    let idle = MotionPreset::idle_swing(20.0);
    timeline.loop_idle(idle.track, idle.loop_policy, idle.timing).unwrap();
}

fn opacity(sink: &SpySink, target: TargetId) -> f32 {
    sink.for_target(target).last().unwrap().opacity.unwrap()
}

fn frame(stage: &mut Stage, sink: &mut SpySink, now: &mut f64) -> usize {
    *now += 16.0;
    stage.dispatch(&Event::frame(16.0, *now), sink)
}

#[test]
fn at_most_one_write_per_target_per_frame() {
    let mut stage = Stage::new(VIEWPORT);
    mount_character(&mut stage);
    let mut sink = SpySink::default();
    let mut now = 0.0;

    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    for i in 0..120 {
        // several scroll events between frames
        for j in 0..3 {
            stage.dispatch(&Event::scroll((i * 30 + j * 10) as f32, now), &mut sink);
        }
        let before = sink.writes.len();
        frame(&mut stage, &mut sink, &mut now);
        assert!(sink.writes.len() - before <= 1);
    }
    assert!(!sink.writes.is_empty());
}

#[test]
fn entrance_is_exclusive_until_scroll_moves() {
    let mut stage = Stage::new(VIEWPORT);
    mount_character(&mut stage);
    let mut sink = SpySink::default();
    let mut now = 0.0;

    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    for _ in 0..10 {
        frame(&mut stage, &mut sink, &mut now);
    }
    // the entrance writes no path position and no swing
    for state in sink.for_target(CHARACTER) {
        assert_eq!(state.x, None);
        assert_eq!(state.swing, None);
        assert!(state.opacity.is_some());
    }

    stage.dispatch(&Event::scroll(320.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);
    let last = *sink.for_target(CHARACTER).last().unwrap();
    // superseded entrance completed; path now drives position and heading
    assert_eq!(last.opacity, Some(1.0));
    assert_eq!(last.scale, Some(1.0));
    assert!(last.x.is_some() && last.y.is_some() && last.rotation.is_some());
    assert!(last.swing.is_some());
}

#[test]
fn no_writes_after_destroy() {
    let mut stage = Stage::new(VIEWPORT);
    mount_character(&mut stage);
    let mut sink = SpySink::default();
    let mut now = 0.0;

    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);
    assert_eq!(sink.for_target(CHARACTER).len(), 1);

    let id = stage.find(CHARACTER).unwrap();
    stage.get_mut(id).unwrap().destroy();
    assert_eq!(stage.get(id).unwrap().state(), TimelineState::Destroyed);

    let written = sink.writes.len();
    for i in 0..30 {
        stage.dispatch(&Event::scroll(i as f32 * 50.0, now), &mut sink);
        stage.dispatch(&Event::resize(900.0, 700.0, now), &mut sink);
        frame(&mut stage, &mut sink, &mut now);
    }
    assert_eq!(sink.writes.len(), written);
}

#[test]
fn unmount_event_tears_down_synchronously() {
    let mut stage = Stage::new(VIEWPORT);
    mount_character(&mut stage);
    let mut sink = SpySink::default();
    let mut now = 0.0;
    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);

    stage.dispatch(&Event::unmount(CHARACTER, now), &mut sink);
    assert!(stage.find(CHARACTER).is_none());
    let written = sink.writes.len();
    frame(&mut stage, &mut sink, &mut now);
    assert_eq!(sink.writes.len(), written);
}

#[test]
fn idle_swing_composes_with_auto_rotating_path() {
    let mut stage = Stage::new(VIEWPORT);
    let id = stage.create_timeline(CHARACTER);
    let timeline = stage.get_mut(id).unwrap();
    timeline
        .bind_scroll(page_region(), MotionPreset::swing_path(VIEWPORT).unwrap())
        .unwrap();
    let idle = MotionPreset::idle_swing(20.0);
    timeline.loop_idle(idle.track, idle.loop_policy, idle.timing).unwrap();

    let mut sink = SpySink::default();
    let mut now = 0.0;
    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    let mut swings = Vec::new();
    for i in 0..60 {
        stage.dispatch(&Event::scroll(i as f32 * 20.0, now), &mut sink);
        frame(&mut stage, &mut sink, &mut now);
        let state = *sink.for_target(CHARACTER).last().unwrap();
        swings.push(state.swing.unwrap());
        assert_eq!(
            state.resolved_rotation(),
            state.rotation.unwrap() + state.swing.unwrap()
        );
    }
    // the swing keeps advancing while scrolling because it is disjoint
    assert!(swings.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn staggered_cards_enter_in_order() {
    let mut stage = Stage::new(VIEWPORT);
    let region = TriggerRegion::threshold_at(
        AnchorRef(5),
        AnchorBounds::new(1800.0, 600.0),
        EdgeSpec::parse("top 80%").unwrap(),
    );
    let cards = [CARD, TargetId(3), TargetId(4)];
    let entrance = MotionPreset::pop_in();
    stage
        .stagger_on_enter(&cards, &region, &entrance.track, entrance.timing, 200.0)
        .unwrap();

    let mut sink = SpySink::default();
    let mut now = 0.0;
    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);
    for card in cards {
        assert_eq!(sink.for_target(card).last().unwrap().opacity, Some(0.0));
    }

    // line at 80% of 800 = 640; element top 1800
    stage.dispatch(&Event::scroll(1200.0, now), &mut sink);
    for _ in 0..20 {
        frame(&mut stage, &mut sink, &mut now);
    }
    assert!(opacity(&sink, CARD) > 0.0);
    // 320ms after entering the third card is still inside its 400ms delay
    assert_eq!(opacity(&sink, TargetId(4)), 0.0);

    for _ in 0..100 {
        frame(&mut stage, &mut sink, &mut now);
    }
    for card in cards {
        assert_eq!(opacity(&sink, card), 1.0);
    }
}

#[test]
fn rearmed_threshold_replays_entrance() {
    let mut stage = Stage::new(VIEWPORT);
    let id = stage.create_timeline(CARD);
    let region = TriggerRegion::threshold(AnchorRef(5), 1000.0, 0.8)
        .with_policy(ThresholdPolicy::Rearm { hysteresis_px: 100.0 });
    let entrance = MotionPreset::rise_in(100.0);
    stage
        .get_mut(id)
        .unwrap()
        .play_entrance_on_enter(region, entrance.track, entrance.timing)
        .unwrap();

    let mut sink = SpySink::default();
    let mut now = 0.0;
    stage.dispatch(&Event::scroll(400.0, now), &mut sink);
    for _ in 0..100 {
        frame(&mut stage, &mut sink, &mut now);
    }
    assert_eq!(sink.for_target(CARD).last().unwrap().opacity, Some(1.0));

    // back up past the hysteresis band: reset to the entrance start
    stage.dispatch(&Event::scroll(200.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);
    assert_eq!(sink.for_target(CARD).last().unwrap().opacity, Some(0.0));

    stage.dispatch(&Event::scroll(400.0, now), &mut sink);
    for _ in 0..100 {
        frame(&mut stage, &mut sink, &mut now);
    }
    assert_eq!(sink.for_target(CARD).last().unwrap().opacity, Some(1.0));
}

#[test]
fn hold_policy_keeps_partial_entrance() {
    let config = TimelineConfig {
        entrance_on_kill: OnKill::Hold,
        ..TimelineConfig::default()
    };
    let mut stage = Stage::new(VIEWPORT).with_config(config);
    mount_character(&mut stage);
    let mut sink = SpySink::default();
    let mut now = 0.0;

    stage.dispatch(&Event::scroll(0.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);
    let partial = sink.for_target(CHARACTER).last().unwrap().opacity.unwrap();
    assert!(partial < 1.0);

    stage.dispatch(&Event::scroll(100.0, now), &mut sink);
    frame(&mut stage, &mut sink, &mut now);
    let after = *sink.for_target(CHARACTER).last().unwrap();
    assert_eq!(after.opacity, Some(partial));
    assert!(after.get(Property::X).is_some());
}
