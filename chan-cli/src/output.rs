//! Run output
//!
//! The merged stream is printed as one JSON object per line, followed by a
//! single summary line, so the output can be piped straight into `jq`.

use std::io::Write;

use anyhow::Result;
use chan_mux::{CombinerStats, Phase};
use chan_protocol::StreamRecord;
use chan_sim::SimulationReport;
use serde::Serialize;

/// Closing summary of a run
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Records on the merged stream
    pub records: usize,
    /// Phase the combiner ended in
    pub phase: Phase,
    /// Combiner totals
    pub stats: CombinerStats,
    /// Contract violations seen
    pub violations: usize,
}

impl From<&SimulationReport> for Summary {
    fn from(report: &SimulationReport) -> Self {
        Self {
            records: report.received.len(),
            phase: report.phase,
            stats: report.stats,
            violations: report.violations.len(),
        }
    }
}

/// Write each record as a JSON line
pub fn write_records<W: Write>(out: &mut W, records: &[StreamRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write the summary as a JSON line
pub fn write_summary<W: Write>(out: &mut W, summary: &Summary) -> Result<()> {
    serde_json::to_writer(&mut *out, &serde_json::json!({ "summary": summary }))?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_one_per_line() {
        let mut out = Vec::new();
        write_records(
            &mut out,
            &[
                StreamRecord::new(10, 0).with_first(true),
                StreamRecord::new(0, 2).with_last(true),
            ],
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"payload":10,"channel_nr":0,"first":true,"last":false}"#
        );
        let parsed: StreamRecord = serde_json::from_str(lines[1]).unwrap();
        assert!(parsed.last);
    }

    #[test]
    fn test_summary_line() {
        let summary = Summary {
            records: 5,
            phase: Phase::ServingLower,
            stats: CombinerStats::default(),
            violations: 0,
        };
        let mut out = Vec::new();
        write_summary(&mut out, &summary).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["records"], 5);
        assert_eq!(value["summary"]["violations"], 0);
        assert!(value["summary"]["stats"].is_object());
    }
}
