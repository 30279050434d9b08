//! Fidelity reporting
//!
//! Gantree: L4_Engine → Reporter
//!
//! Plain text, Markdown and JSON renderings of a run.

use crate::estimator::FidelityEstimate;
use crate::pipeline::FidelityRun;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Markdown table
    Markdown,
    /// JSON
    Json,
    /// Plain text summary
    Text,
}

/// Fidelity reporter
/// Gantree: Reporter // 결과 리포팅
pub struct Reporter;

impl Reporter {
    // ========================================================================
    // Format Converters
    // ========================================================================

    /// Generate report in specified format
    pub fn report(run: &FidelityRun, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => Self::to_markdown(run),
            ReportFormat::Json => Self::to_json(run),
            ReportFormat::Text => Self::to_text(run),
        }
    }

    /// One-line estimate, as printed after a run
    pub fn summary_line(estimate: &FidelityEstimate) -> String {
        format!(
            "Average gate fidelity: {:.6} ± {:.6} (z = {}, {} trials)",
            estimate.mean,
            estimate.error_bound,
            estimate.confidence_z,
            estimate.num_trials()
        )
    }

    /// Convert run to plain text
    pub fn to_text(run: &FidelityRun) -> String {
        let mut output = String::new();
        writeln!(output, "=== Process Tomography: {} ===", run.job_name).unwrap();
        writeln!(output, "Job id:          {}", run.job_id).unwrap();
        writeln!(output, "Qubits:          {}", run.num_qubits).unwrap();
        writeln!(output, "Circuits:        {}", run.num_circuits).unwrap();
        writeln!(output, "Total shots:     {}", run.total_shots).unwrap();
        writeln!(
            output,
            "Mitigation:      {}",
            if run.mitigated { "tensored" } else { "none" }
        )
        .unwrap();
        writeln!(output, "Direct fidelity: {:.6}", run.direct_fidelity).unwrap();
        writeln!(output, "{}", Self::summary_line(&run.estimate)).unwrap();
        writeln!(output, "Time:            {} ms", run.elapsed_ms).unwrap();
        output
    }

    /// Convert run to Markdown
    pub fn to_markdown(run: &FidelityRun) -> String {
        let mut output = String::new();
        let estimate = &run.estimate;
        let (lo, hi) = estimate.interval();

        writeln!(output, "# Process Tomography: {}\n", run.job_name).unwrap();
        writeln!(output, "## Summary\n").unwrap();
        writeln!(output, "- **Job**: `{}`", run.job_id).unwrap();
        writeln!(output, "- **Qubits**: {}", run.num_qubits).unwrap();
        writeln!(output, "- **Circuits**: {}", run.num_circuits).unwrap();
        writeln!(output, "- **Total Shots**: {}", run.total_shots).unwrap();
        writeln!(output, "- **Mitigated**: {}", if run.mitigated { "✓" } else { "-" }).unwrap();
        writeln!(output, "- **Time**: {:.2}s\n", run.elapsed_ms as f64 / 1000.0).unwrap();

        writeln!(output, "## Fidelity\n").unwrap();
        writeln!(output, "| Direct | Mean | Error Bound | Interval | z | Trials |").unwrap();
        writeln!(output, "|--------|------|-------------|----------|---|--------|").unwrap();
        writeln!(
            output,
            "| {:.4} | {:.4} | {:.4} | [{:.4}, {:.4}] | {} | {} |",
            run.direct_fidelity,
            estimate.mean,
            estimate.error_bound,
            lo,
            hi,
            estimate.confidence_z,
            estimate.num_trials()
        )
        .unwrap();

        if let (Some(min), Some(max)) = (
            estimate.trials.iter().copied().reduce(f64::min),
            estimate.trials.iter().copied().reduce(f64::max),
        ) {
            writeln!(output, "\nTrial range: {:.4} to {:.4}", min, max).unwrap();
        }
        output
    }

    /// Convert run to JSON
    pub fn to_json(run: &FidelityRun) -> String {
        serde_json::to_string_pretty(run).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_run() -> FidelityRun {
        FidelityRun {
            job_name: "toffoli_qpt".into(),
            job_id: "jobset-toffoli_qpt-1".into(),
            num_qubits: 3,
            num_circuits: 1728,
            total_shots: 1728 * 8192,
            mitigated: false,
            direct_fidelity: 0.9123,
            estimate: FidelityEstimate::from_trials(vec![0.91, 0.92, 0.90], 1.96).unwrap(),
            elapsed_ms: 1500,
        }
    }

    #[test]
    fn test_text() {
        let text = Reporter::report(&sample_run(), ReportFormat::Text);
        assert!(text.contains("toffoli_qpt"));
        assert!(text.contains("Circuits:        1728"));
        assert!(text.contains("Average gate fidelity: 0.910000 ±"));
    }

    #[test]
    fn test_markdown() {
        let md = Reporter::report(&sample_run(), ReportFormat::Markdown);
        assert!(md.starts_with("# Process Tomography: toffoli_qpt"));
        assert!(md.contains("| 0.9123 | 0.9100 |"));
        assert!(md.contains("Trial range: 0.9000 to 0.9200"));
    }

    #[test]
    fn test_json_roundtrip() {
        let run = sample_run();
        let json = Reporter::report(&run, ReportFormat::Json);
        let parsed: FidelityRun = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.job_id, run.job_id);
        assert_eq!(parsed.num_circuits, 1728);
        assert!((parsed.estimate.mean - run.estimate.mean).abs() < 1e-12);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["estimate"]["trials"].as_array().unwrap().len(), 3);
    }
}
