//! End-of-run wipe report, as text for terminals or JSON for tooling.

use crate::{WipeAlgorithm, WipeResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Serialize)]
pub struct WipeReport {
    pub device: String,
    pub drive_type: String,
    pub algorithm: String,
    pub passes_completed: usize,
    pub passes_total: usize,
    pub bytes_written: u64,
    pub elapsed_secs: f64,
    pub verification_failures: u32,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

impl WipeReport {
    pub fn new(device: &str, algorithm: WipeAlgorithm, result: &WipeResult) -> Self {
        Self {
            device: device.to_string(),
            drive_type: result.detected_drive_type.name().to_string(),
            algorithm: algorithm.name().to_string(),
            passes_completed: result.passes_completed,
            passes_total: result.passes_total,
            bytes_written: result.bytes_written_total,
            elapsed_secs: result.elapsed.as_secs_f64(),
            verification_failures: result.verification_failures,
            status: if result.is_success() { "COMPLETED" } else { "FAILED" },
            error: result.error.as_ref().map(|e| e.to_string()),
            warnings: result.warnings.clone(),
            finished_at: Utc::now(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "  ============= WIPE REPORT =============");
        let _ = writeln!(out, "  Device:               {}", self.device);
        let _ = writeln!(out, "  Drive Type:           {}", self.drive_type);
        let _ = writeln!(out, "  Algorithm:            {}", self.algorithm);
        let _ = writeln!(
            out,
            "  Passes Completed:     {} / {}",
            self.passes_completed, self.passes_total
        );
        let _ = writeln!(
            out,
            "  Total Data Written:   {:.2} GB",
            self.bytes_written as f64 / GIB
        );
        let _ = writeln!(out, "  Time Elapsed:         {:.1} seconds", self.elapsed_secs);
        let _ = writeln!(out, "  Verification Errors:  {}", self.verification_failures);
        let _ = writeln!(out, "  Status:               {}", self.status);
        if let Some(error) = &self.error {
            let _ = writeln!(out, "  Error:                {}", error);
        }
        for warning in &self.warnings {
            let _ = writeln!(out, "  Warning:              {}", warning);
        }
        let _ = writeln!(
            out,
            "  Finished:             {}",
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "  =========================================");
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WipeError;
    use crate::DriveType;
    use std::time::Duration;

    fn finished() -> WipeResult {
        let mut result = WipeResult::new(1);
        result.passes_completed = 1;
        result.bytes_written_total = 3 * 1024 * 1024 * 1024;
        result.elapsed = Duration::from_millis(12_340);
        result.detected_drive_type = DriveType::HDD;
        result.completed = true;
        result
    }

    #[test]
    fn test_completed_report_text() {
        let report = WipeReport::new("/dev/sdb", WipeAlgorithm::Zero1, &finished());
        let text = report.render_text();

        assert!(text.contains("Device:               /dev/sdb"));
        assert!(text.contains("Drive Type:           HDD (Rotational)"));
        assert!(text.contains("Algorithm:            Zero Fill (1-pass)"));
        assert!(text.contains("Passes Completed:     1 / 1"));
        assert!(text.contains("Total Data Written:   3.00 GB"));
        assert!(text.contains("Time Elapsed:         12.3 seconds"));
        assert!(text.contains("Status:               COMPLETED"));
        assert!(!text.contains("Error:"));
    }

    #[test]
    fn test_failed_report_carries_error() {
        let mut result = WipeResult::new(35);
        result.passes_completed = 16;
        result.error = Some(WipeError::UserAborted { pass: 17, offset: 4096 });

        let report = WipeReport::new("/dev/sdb", WipeAlgorithm::Gutmann35, &result);
        let text = report.render_text();

        assert_eq!(report.status, "FAILED");
        assert!(text.contains("Passes Completed:     16 / 35"));
        assert!(text.contains("Error:                wipe aborted by user during pass 17"));
    }

    #[test]
    fn test_json_report_fields() {
        let mut result = finished();
        result.warnings.push("flash".to_string());
        let report = WipeReport::new("/dev/nvme0n1", WipeAlgorithm::Random1, &result);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["device"], "/dev/nvme0n1");
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["passes_total"], 1);
        assert_eq!(value["warnings"][0], "flash");
        assert!(value.get("error").is_none());
        assert!(value["finished_at"].is_string());
    }
}
