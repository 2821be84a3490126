//! Channel Combiner Scenario Runner
//!
//! Loads a JSON scenario, plays it through the combiner and prints the merged
//! stream followed by a summary line. Exits non-zero if any party broke the
//! stream contract.

mod args;
mod live;
mod output;

use std::io::Write;
use std::process::ExitCode;

use anyhow::{Context, Result};
use args::CliArgs;
use chan_sim::Scenario;
use clap::Parser;
use output::{write_records, write_summary, Summary};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chanmux=info,chan_protocol=info,chan_mux=info,chan_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    let json = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read {}", args.scenario.display()))?;
    let scenario = Scenario::from_json(&json)
        .with_context(|| format!("failed to load {}", args.scenario.display()))?;

    tracing::info!(
        "Running {} ({} lower + {} upper channels)",
        args.scenario.display(),
        scenario.config.lower.channel_count,
        scenario.config.upper.channel_count
    );

    let (received, summary, violations) = if args.live {
        let runtime = tokio::runtime::Runtime::new()?;
        let (received, summary) = runtime.block_on(live::run_live(&scenario, args.tick_us))?;
        (received, summary, Vec::new())
    } else {
        let report = scenario.run()?;
        let summary = Summary::from(&report);
        (report.received, summary, report.violations)
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_records(&mut out, &received)?;
    write_summary(&mut out, &summary)?;
    out.flush()?;

    if violations.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        for violation in &violations {
            eprintln!("violation: {}", violation);
        }
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_scenarios_run_clean() {
        for json in [
            include_str!("../../scenarios/inactive_upper.json"),
            include_str!("../../scenarios/switching_backpressure.json"),
        ] {
            let report = Scenario::from_json(json).unwrap().run().unwrap();
            assert!(report.violations.is_empty());
            assert!(!report.received.is_empty());
        }
    }

    #[test]
    fn test_inactive_upper_scenario_output() {
        let scenario =
            Scenario::from_json(include_str!("../../scenarios/inactive_upper.json")).unwrap();
        let report = scenario.run().unwrap();

        assert_eq!(report.received.len(), 10);
        assert_eq!(report.stats.drained, 6);
        assert_eq!(Summary::from(&report).records, 10);

        let mut out = Vec::new();
        write_records(&mut out, &report.received).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 10);
    }
}
