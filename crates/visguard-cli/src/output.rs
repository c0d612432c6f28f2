//! Machine-readable run report.

use std::path::Path;

use anyhow::{Context, Result};

use visguard_core::ReconcileReport;

/// Write the full report as pretty JSON, replacing any existing file.
pub fn write_report_json(path: &Path, report: &ReconcileReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize report")?;
    std::fs::write(path, content).with_context(|| format!("write report to {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use visguard_core::Visibility;

    fn empty_report() -> ReconcileReport {
        ReconcileReport {
            run_id: Uuid::new_v4(),
            target: Visibility::Internal,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    #[test]
    fn test_write_report_json_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        let report = empty_report();

        write_report_json(&path, &report).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["run_id"], report.run_id.to_string());
        assert_eq!(v["target"], "internal");
        assert!(v["outcomes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_write_report_json_missing_dir_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("no-such-dir").join("report.json");

        let err = write_report_json(&path, &empty_report()).unwrap_err();

        assert!(format!("{:#}", err).contains("write report"));
    }
}
