//! Easing functions for animations
//!
//! Every easing maps a normalized progress `t ∈ [0, 1]` onto an eased value.
//! Inputs are clamped; outputs are not, because elastic and back curves
//! overshoot on purpose. Endpoints are exact for every curve.

use std::f32::consts::PI;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{MotionError, Result};

/// Default amplitude for `elastic.out`
pub const DEFAULT_ELASTIC_AMPLITUDE: f32 = 1.0;
/// Default period for `elastic.out`
pub const DEFAULT_ELASTIC_PERIOD: f32 = 0.3;
/// Default overshoot for `back.out`
pub const DEFAULT_BACK_OVERSHOOT: f32 = 1.7;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    /// Damped oscillation settling on 1.0; amplitude below 1 is raised to 1
    ElasticOut { amplitude: f32, period: f32 },
    /// Overshoots past 1.0 before settling
    BackOut { overshoot: f32 },
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// `elastic.out` with the default amplitude and period
    pub const fn elastic_out() -> Self {
        Easing::ElasticOut {
            amplitude: DEFAULT_ELASTIC_AMPLITUDE,
            period: DEFAULT_ELASTIC_PERIOD,
        }
    }

    /// `back.out` with the default overshoot
    pub const fn back_out() -> Self {
        Easing::BackOut {
            overshoot: DEFAULT_BACK_OVERSHOOT,
        }
    }

    /// Whether the curve can leave the [0, 1] range between its endpoints
    pub fn overshoots(&self) -> bool {
        match self {
            Easing::ElasticOut { .. } | Easing::BackOut { .. } => true,
            Easing::CubicBezier(_, y1, _, y2) => !(0.0..=1.0).contains(y1) || !(0.0..=1.0).contains(y2),
            _ => false,
        }
    }

    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        if t <= 0.0 || t.is_nan() {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => power_out(t, 2),
            Easing::EaseInOutQuad => power_in_out(t, 2),
            Easing::EaseInCubic => t.powi(3),
            Easing::EaseOutCubic => power_out(t, 3),
            Easing::EaseInOutCubic => power_in_out(t, 3),
            Easing::EaseInQuart => t.powi(4),
            Easing::EaseOutQuart => power_out(t, 4),
            Easing::EaseInOutQuart => power_in_out(t, 4),
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => power_out(t, 5),
            Easing::EaseInOutQuint => power_in_out(t, 5),
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::ElasticOut { amplitude, period } => elastic_out(t, amplitude, period),
            Easing::BackOut { overshoot } => {
                let c3 = overshoot + 1.0;
                let u = t - 1.0;
                1.0 + c3 * u.powi(3) + overshoot * u.powi(2)
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, x1, y1, x2, y2),
        }
    }

    /// Parse an easing name.
    ///
    /// Accepts the tween-library spellings used by page authors
    /// (`power3.out`, `sine.inOut`, `elastic.out(1, 0.5)`, `back.out(1.7)`,
    /// `none`) as well as CSS names (`ease-in-out`, `cubic-bezier(...)`).
    /// A bare `powerN` means `powerN.out`.
    pub fn parse(input: &str) -> Result<Easing> {
        let raw = input.trim();
        let unknown = || MotionError::UnknownEasingKind(raw.to_string());

        let (head, args) = match raw.find('(') {
            Some(open) => {
                let close = raw.rfind(')').filter(|c| *c > open).ok_or_else(unknown)?;
                if !raw[close + 1..].trim().is_empty() {
                    return Err(unknown());
                }
                let args = parse_args(&raw[open + 1..close]).ok_or_else(unknown)?;
                (raw[..open].trim().to_ascii_lowercase(), args)
            }
            None => (raw.to_ascii_lowercase(), SmallVec::new()),
        };

        let easing = match head.as_str() {
            "none" | "linear" | "power0" | "power0.out" | "power0.in" | "power0.inout" => {
                no_args(&args).map(|_| Easing::Linear)
            }
            "ease-in" => no_args(&args).map(|_| Easing::EaseInCubic),
            "ease-out" => no_args(&args).map(|_| Easing::EaseOutCubic),
            "ease-in-out" => no_args(&args).map(|_| Easing::EaseInOutCubic),
            "cubic-bezier" => match args.as_slice() {
                [x1, y1, x2, y2] => Some(Easing::CubicBezier(*x1, *y1, *x2, *y2)),
                _ => None,
            },
            _ => {
                let (family, variant) = head.split_once('.').unwrap_or((head.as_str(), "out"));
                family_easing(family, variant, &args)
            }
        };
        easing.ok_or_else(unknown)
    }
}

impl FromStr for Easing {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self> {
        Easing::parse(s)
    }
}

/// Sample an easing kind at `t`
pub fn ease(kind: Easing, t: f32) -> f32 {
    kind.apply(t)
}

fn family_easing(family: &str, variant: &str, args: &[f32]) -> Option<Easing> {
    let power = match family {
        "power1" | "quad" => Some(2),
        "power2" | "cubic" => Some(3),
        "power3" | "quart" => Some(4),
        "power4" | "quint" => Some(5),
        _ => None,
    };
    if let Some(n) = power {
        no_args(args)?;
        return match (n, variant) {
            (2, "in") => Some(Easing::EaseInQuad),
            (2, "out") => Some(Easing::EaseOutQuad),
            (2, "inout") => Some(Easing::EaseInOutQuad),
            (3, "in") => Some(Easing::EaseInCubic),
            (3, "out") => Some(Easing::EaseOutCubic),
            (3, "inout") => Some(Easing::EaseInOutCubic),
            (4, "in") => Some(Easing::EaseInQuart),
            (4, "out") => Some(Easing::EaseOutQuart),
            (4, "inout") => Some(Easing::EaseInOutQuart),
            (5, "in") => Some(Easing::EaseInQuint),
            (5, "out") => Some(Easing::EaseOutQuint),
            (5, "inout") => Some(Easing::EaseInOutQuint),
            _ => None,
        };
    }

    match (family, variant) {
        ("sine", "in") => no_args(args).map(|_| Easing::EaseInSine),
        ("sine", "out") => no_args(args).map(|_| Easing::EaseOutSine),
        ("sine", "inout") => no_args(args).map(|_| Easing::EaseInOutSine),
        ("elastic", "out") => match args {
            [] => Some(Easing::elastic_out()),
            [amplitude] => Some(Easing::ElasticOut {
                amplitude: *amplitude,
                period: DEFAULT_ELASTIC_PERIOD,
            }),
            [amplitude, period] if *period > 0.0 => Some(Easing::ElasticOut {
                amplitude: *amplitude,
                period: *period,
            }),
            _ => None,
        },
        ("back", "out") => match args {
            [] => Some(Easing::back_out()),
            [overshoot] => Some(Easing::BackOut {
                overshoot: *overshoot,
            }),
            _ => None,
        },
        _ => None,
    }
}

fn no_args(args: &[f32]) -> Option<()> {
    args.is_empty().then_some(())
}

fn parse_args(inner: &str) -> Option<SmallVec<[f32; 4]>> {
    if inner.trim().is_empty() {
        return Some(SmallVec::new());
    }
    inner
        .split(',')
        .map(|part| part.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect()
}

#[inline]
fn power_out(t: f32, n: i32) -> f32 {
    1.0 - (1.0 - t).powi(n)
}

#[inline]
fn power_in_out(t: f32, n: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(n - 1) * t.powi(n)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(n) / 2.0
    }
}

fn elastic_out(t: f32, amplitude: f32, period: f32) -> f32 {
    let amplitude = amplitude.max(1.0);
    let period = if period > 0.0 {
        period
    } else {
        DEFAULT_ELASTIC_PERIOD
    };
    let tau = 2.0 * PI;
    let phase = period / tau * (1.0 / amplitude).asin();
    amplitude * 2f32.powf(-10.0 * t) * ((t - phase) * tau / period).sin() + 1.0
}

/// Cubic bezier easing calculation (matches CSS timing functions).
///
/// Newton-Raphson with a bisection fallback, in f64 to avoid f32 jitter.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let x = t as f64;
    let curve_x = BezierAxis::new(x1 as f64, x2 as f64);
    let curve_y = BezierAxis::new(y1 as f64, y2 as f64);

    let mut p = x;
    for _ in 0..8 {
        let err = curve_x.sample(p) - x;
        if err.abs() < 1e-7 {
            return curve_y.sample(p) as f32;
        }
        let slope = curve_x.slope(p);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    p = x;
    for _ in 0..24 {
        let val = curve_x.sample(p);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }
    curve_y.sample(p) as f32
}

/// One axis of a cubic bezier anchored at 0 and 1, in polynomial form
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    fn new(p1: f64, p2: f64) -> Self {
        Self {
            a: 1.0 - 3.0 * p2 + 3.0 * p1,
            b: 3.0 * p2 - 6.0 * p1,
            c: 3.0 * p1,
        }
    }

    #[inline]
    fn sample(&self, t: f64) -> f64 {
        ((self.a * t + self.b) * t + self.c) * t
    }

    #[inline]
    fn slope(&self, t: f64) -> f64 {
        (3.0 * self.a * t + 2.0 * self.b) * t + self.c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 19] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::elastic_out(),
        Easing::back_out(),
        Easing::CubicBezier(0.42, 0.0, 0.58, 1.0),
    ];

    #[test]
    fn endpoints_are_exact() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
            assert_eq!(easing.apply(-0.5), 0.0, "{easing:?} below range");
            assert_eq!(easing.apply(1.5), 1.0, "{easing:?} above range");
        }
    }

    #[test]
    fn in_out_curves_hit_midpoint() {
        for easing in [
            Easing::EaseInOutQuad,
            Easing::EaseInOutCubic,
            Easing::EaseInOutQuart,
            Easing::EaseInOutQuint,
            Easing::EaseInOutSine,
        ] {
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-6, "{easing:?}");
        }
    }

    #[test]
    fn sine_in_out_is_point_symmetric() {
        for i in 1..20 {
            let t = i as f32 / 20.0;
            let a = Easing::EaseInOutSine.apply(t);
            let b = Easing::EaseInOutSine.apply(1.0 - t);
            assert!((a + b - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn overshoot_curves_leave_unit_range() {
        let elastic_peak = (1..100)
            .map(|i| Easing::elastic_out().apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(elastic_peak > 1.0);

        let back_peak = (1..100)
            .map(|i| Easing::back_out().apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(back_peak > 1.0);
        assert!(Easing::back_out().overshoots());
        assert!(!Easing::EaseOutQuart.overshoots());
    }

    #[test]
    fn elastic_amplitude_is_floored_at_one() {
        let low = Easing::ElasticOut {
            amplitude: 0.2,
            period: 0.3,
        };
        let unit = Easing::ElasticOut {
            amplitude: 1.0,
            period: 0.3,
        };
        assert_eq!(low.apply(0.37), unit.apply(0.37));
    }

    #[test]
    fn parses_page_easing_names() {
        assert_eq!(Easing::parse("none").unwrap(), Easing::Linear);
        assert_eq!(Easing::parse("power1.inOut").unwrap(), Easing::EaseInOutQuad);
        assert_eq!(Easing::parse("power2.out").unwrap(), Easing::EaseOutCubic);
        assert_eq!(Easing::parse("power3.out").unwrap(), Easing::EaseOutQuart);
        assert_eq!(Easing::parse("power4").unwrap(), Easing::EaseOutQuint);
        assert_eq!(Easing::parse("sine.inOut").unwrap(), Easing::EaseInOutSine);
        assert_eq!(Easing::parse(" back.out(1.7) ").unwrap(), Easing::back_out());
        assert_eq!(
            Easing::parse("elastic.out(1, 0.5)").unwrap(),
            Easing::ElasticOut {
                amplitude: 1.0,
                period: 0.5
            }
        );
        assert_eq!(Easing::parse("elastic.out").unwrap(), Easing::elastic_out());
        assert_eq!(
            "cubic-bezier(0.4, 0, 0.2, 1)".parse::<Easing>().unwrap(),
            Easing::CubicBezier(0.4, 0.0, 0.2, 1.0)
        );
        assert_eq!(Easing::parse("ease-in-out").unwrap(), Easing::EaseInOutCubic);
    }

    #[test]
    fn rejects_unknown_names() {
        for name in [
            "bounce.out",
            "elastic.in",
            "power3.sideways",
            "back.out(1.7",
            "back.out(a)",
            "sine.inOut(2)",
            "cubic-bezier(1, 2)",
            "elastic.out(1, 0)",
            "",
        ] {
            assert_eq!(
                Easing::parse(name),
                Err(MotionError::UnknownEasingKind(name.trim().to_string())),
                "{name:?}"
            );
        }
    }

    #[test]
    fn free_function_matches_method() {
        assert_eq!(ease(Easing::EaseOutQuart, 0.3), Easing::EaseOutQuart.apply(0.3));
    }
}
