//! Assertion helpers for headless scenario checks.

use webswing_animation::{Property, TransformState};

/// Expected value of one transform property
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueCheck {
    pub equals: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
    pub tolerance: f32,
}

impl ValueCheck {
    fn accepts(&self, value: f32) -> bool {
        let tol = self.tolerance.abs();
        self.equals.map_or(true, |e| (value - e).abs() <= tol)
            && self.min.map_or(true, |m| value >= m - tol)
            && self.max.map_or(true, |m| value <= m + tol)
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(e) = self.equals {
            parts.push(format!("== {e} ± {}", self.tolerance));
        }
        if let Some(m) = self.min {
            parts.push(format!(">= {m}"));
        }
        if let Some(m) = self.max {
            parts.push(format!("<= {m}"));
        }
        if parts.is_empty() {
            "present".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Assertion result with structured failure details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed { code: String, message: String },
}

fn failed(code: &str, message: String) -> AssertionResult {
    AssertionResult::Failed {
        code: code.to_string(),
        message,
    }
}

pub fn evaluate_assert_transform(
    target: &str,
    property: Property,
    check: &ValueCheck,
    latest: Option<&TransformState>,
) -> AssertionResult {
    let Some(state) = latest else {
        return failed("no_write", format!("{target}: no transform written yet"));
    };
    let Some(value) = state.get(property) else {
        return failed("missing_property", format!("{target}: {property} not written"));
    };
    if check.accepts(value) {
        AssertionResult::Passed
    } else {
        failed(
            "value_mismatch",
            format!("{target}: expected {property} {}, got {value}", check.describe()),
        )
    }
}

pub fn evaluate_assert_writes(target: &str, expected: u64, actual: u64) -> AssertionResult {
    if expected == actual {
        AssertionResult::Passed
    } else {
        failed(
            "write_count",
            format!("{target}: expected {expected} writes, got {actual}"),
        )
    }
}
