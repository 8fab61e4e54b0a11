//! Report output model for headless scenario runs.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Component, Path};

/// Report status for a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    Failed,
}

/// Clock and write counters at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub elapsed_frames: u64,
    pub elapsed_ms: u64,
    pub writes: u64,
}

/// Machine-readable result of a headless run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessReport {
    pub scene: String,
    pub status: ReportStatus,
    pub failed_step_index: Option<usize>,
    pub assertion: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub counters: RunCounters,
    /// Last transform written to each target, keyed by target then property
    #[serde(default)]
    pub transforms: BTreeMap<String, BTreeMap<String, f32>>,
}

impl HeadlessReport {
    pub fn passed(scene: &str, counters: RunCounters) -> Self {
        Self {
            scene: scene.to_string(),
            status: ReportStatus::Passed,
            failed_step_index: None,
            assertion: None,
            code: None,
            message: None,
            counters,
            transforms: BTreeMap::new(),
        }
    }

    pub fn failed(
        scene: &str,
        assertion: &str,
        failed_step_index: usize,
        code: String,
        message: String,
        counters: RunCounters,
    ) -> Self {
        Self {
            scene: scene.to_string(),
            status: ReportStatus::Failed,
            failed_step_index: Some(failed_step_index),
            assertion: Some(assertion.to_string()),
            code: Some(code),
            message: Some(message),
            counters,
            transforms: BTreeMap::new(),
        }
    }

    pub fn with_transforms(mut self, transforms: BTreeMap<String, BTreeMap<String, f32>>) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if path.is_absolute() || path.has_root() {
            bail!("report path must be relative and must not start with a separator");
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("report path cannot contain '..' or drive prefixes");
        }
        let payload = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        writer.write_all(payload.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_flat_counters() {
        let counters = RunCounters {
            elapsed_frames: 4,
            elapsed_ms: 64,
            writes: 3,
        };
        let mut out = Vec::new();
        HeadlessReport::passed("hero", counters).write_to_writer(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "passed");
        assert_eq!(value["elapsed_frames"], 4);
        assert_eq!(value["writes"], 3);
        assert_eq!(value["failed_step_index"], serde_json::Value::Null);
    }

    #[test]
    fn rejects_escaping_paths() {
        let report = HeadlessReport::passed("hero", RunCounters::default());
        assert!(report.write_to_path(Path::new("/tmp/report.json")).is_err());
        assert!(report.write_to_path(Path::new("../report.json")).is_err());
    }
}
