//! Live mode
//!
//! Plays a scenario through the real-time combiner actor instead of the tick
//! simulation. Producers push their whole feed into the ingress channels up
//! front and the merged stream is collected until it goes quiet.

use std::time::Duration;

use anyhow::{Context, Result};
use chan_mux::{
    run_combiner_actor, ActorSettings, Combiner, CombinerChannels, CombinerCommand, MuxError,
};
use chan_protocol::{Group, StreamRecord};
use chan_sim::{ActivitySchedule, Pattern, Scenario};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, info, warn};

use crate::output::Summary;

/// Merged stream buffer between the actor and the collector
const COMBINED_CAPACITY: usize = 64;

/// Event buffer between the actor and the logger
const EVENT_CAPACITY: usize = 256;

/// Quiet time after which the merged stream is considered finished
fn idle_timeout(settings: &ActorSettings) -> Duration {
    (settings.tick_period() * 64).max(Duration::from_millis(200))
}

/// Run `scenario` through the combiner actor
///
/// Activity switch points are applied at `tick * tick_period` of wall-clock
/// time, so they land close to, not exactly on, the given ticks.
pub async fn run_live(
    scenario: &Scenario,
    tick_us: Option<u64>,
) -> Result<(Vec<StreamRecord>, Summary)> {
    let combiner = Combiner::new(scenario.config)?;
    let lower = scenario.records(Group::Lower)?;
    let upper = scenario.records(Group::Upper)?;

    if scenario.consumer_ready != Pattern::Always
        || scenario.lower.offer != Pattern::Always
        || scenario.upper.offer != Pattern::Always
    {
        warn!("Signal patterns are ignored in live mode");
    }

    let mut settings = ActorSettings::default();
    if let Some(us) = tick_us {
        settings.tick_us = us;
    }
    settings.upper_active = scenario.upper_active.at(0);

    let (lower_tx, lower_rx) = mpsc::channel(lower.len().max(1));
    let (upper_tx, upper_rx) = mpsc::channel(upper.len().max(1));
    let (combined_tx, mut combined_rx) = mpsc::channel(COMBINED_CAPACITY);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::channel(EVENT_CAPACITY);

    for record in lower {
        lower_tx.send(record).await?;
    }
    for record in upper {
        upper_tx.send(record).await?;
    }

    let channels = CombinerChannels {
        lower_rx,
        upper_rx,
        combined_tx,
    };
    let actor = tokio::spawn(run_combiner_actor(
        combiner,
        channels,
        cmd_rx,
        event_tx,
        settings,
    ));

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Combiner event: {:?}", event);
        }
    });

    match &scenario.upper_active {
        ActivitySchedule::Switches(points) => {
            let start = Instant::now();
            let period = settings.tick_period();
            let points = points.clone();
            let switch_tx = cmd_tx.clone();
            tokio::spawn(async move {
                for (tick, active) in points {
                    let at = u32::try_from(tick).map_or(Duration::MAX, |t| period * t);
                    if let Some(deadline) = start.checked_add(at) {
                        sleep_until(deadline).await;
                    }
                    if switch_tx
                        .send(CombinerCommand::SetUpperActive { active })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });
        }
        ActivitySchedule::Pattern(_) => {
            warn!("Patterned upper activity is not supported in live mode, using the tick 0 value");
        }
        ActivitySchedule::Constant(_) => {}
    }

    let quiet = idle_timeout(&settings);
    let mut received = Vec::new();
    while let Ok(Some(record)) = timeout(quiet, combined_rx.recv()).await {
        received.push(record);
    }

    let phase = CombinerCommand::phase(&cmd_tx).await?;
    cmd_tx
        .send(CombinerCommand::Shutdown)
        .await
        .map_err(|_| MuxError::ActorStopped)?;
    let stats = actor.await.context("combiner actor panicked")?;

    info!("Live run finished with {} records", received.len());
    let summary = Summary {
        records: received.len(),
        phase,
        stats,
        violations: 0,
    };
    Ok((received, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chan_mux::Phase;

    const DRAIN_SCENARIO: &str = r#"{
        "config": { "lower": { "channel_count": 2 }, "upper": { "channel_count": 3 } },
        "lower": { "frames": [[10, 20], [11, 21]] },
        "upper": { "frames": [[1, 2, 3], [4, 5, 6]] },
        "upper_active": { "kind": "constant", "value": false }
    }"#;

    #[tokio::test]
    async fn test_live_drain_matches_simulation() {
        let scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();

        let (received, summary) = run_live(&scenario, Some(10)).await.unwrap();
        let simulated = scenario.run().unwrap();

        assert_eq!(received, simulated.received);
        assert_eq!(summary.records, 10);
        assert_eq!(summary.stats.drained, 6);
        assert_eq!(summary.stats.rounds, 2);
        assert_eq!(summary.phase, Phase::ServingLower);
    }

    #[tokio::test]
    async fn test_live_rejects_bad_scenario() {
        let mut scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();
        scenario.upper.frames.push(vec![1, 2, 3, 4]);
        assert!(run_live(&scenario, Some(10)).await.is_err());
    }
}
