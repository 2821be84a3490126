//! Combiner Actor
//!
//! This module runs a [`Combiner`] as a real-time software multiplexer. The
//! actor owns the combiner and steps it on a fixed tick period; producers and
//! the consumer talk to it through tokio channels.
//!
//! # Architecture
//!
//! - Each ingress group is an `mpsc::Receiver<StreamRecord>`. The actor keeps
//!   at most one record per group on offer, which is exactly what the stream
//!   contract lets a producer hold while `valid` is asserted.
//! - The egress is an `mpsc::Sender<StreamRecord>`. The consumer is "ready"
//!   whenever that channel has spare capacity.
//! - Control commands (upper activity, queries, shutdown) and emitted
//!   [`CombinerEvent`]s travel on their own channels. Events are dropped
//!   when the event channel is full, so an unread event receiver never
//!   stalls the merged stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use chan_mux::{run_combiner_actor, ActorSettings, Combiner, CombinerChannels, CombinerConfig};
//! use tokio::sync::mpsc;
//!
//! let (lower_tx, lower_rx) = mpsc::channel(64);
//! let (upper_tx, upper_rx) = mpsc::channel(64);
//! let (out_tx, mut out_rx) = mpsc::channel(64);
//! let (cmd_tx, cmd_rx) = mpsc::channel(16);
//! let (event_tx, event_rx) = mpsc::channel(256);
//!
//! let combiner = Combiner::new(CombinerConfig::new(8, 8)?)?;
//! let channels = CombinerChannels { lower_rx, upper_rx, combined_tx: out_tx };
//! tokio::spawn(run_combiner_actor(combiner, channels, cmd_rx, event_tx, ActorSettings::default()));
//! ```

use std::time::Duration;

use chan_protocol::{StreamPort, StreamRecord};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{Combiner, CombinerIo};
use crate::error::MuxError;
use crate::events::CombinerEvent;
use crate::state::{CombinerStats, Phase};

/// Default tick period in microseconds (one 48 kHz sample slot)
const DEFAULT_TICK_US: u64 = 20;

/// Commands sent to the combiner actor
#[derive(Debug)]
pub enum CombinerCommand {
    /// Enable or disable the upper channel group
    SetUpperActive {
        /// New activity flag
        active: bool,
    },

    /// Query running totals
    QueryStats {
        /// Channel to send back the statistics
        response: oneshot::Sender<CombinerStats>,
    },

    /// Query the current arbitration phase
    QueryPhase {
        /// Channel to send back the phase
        response: oneshot::Sender<Phase>,
    },

    /// Shutdown the actor
    Shutdown,
}

impl CombinerCommand {
    /// Ask a running actor for its statistics
    pub async fn stats(cmd_tx: &mpsc::Sender<CombinerCommand>) -> Result<CombinerStats, MuxError> {
        let (response, rx) = oneshot::channel();
        cmd_tx
            .send(CombinerCommand::QueryStats { response })
            .await
            .map_err(|_| MuxError::ActorStopped)?;
        rx.await.map_err(|_| MuxError::ActorStopped)
    }

    /// Ask a running actor for its phase
    pub async fn phase(cmd_tx: &mpsc::Sender<CombinerCommand>) -> Result<Phase, MuxError> {
        let (response, rx) = oneshot::channel();
        cmd_tx
            .send(CombinerCommand::QueryPhase { response })
            .await
            .map_err(|_| MuxError::ActorStopped)?;
        rx.await.map_err(|_| MuxError::ActorStopped)
    }
}

/// Stream channels wired to the actor
#[derive(Debug)]
pub struct CombinerChannels {
    /// Lower group records
    pub lower_rx: mpsc::Receiver<StreamRecord>,
    /// Upper group records
    pub upper_rx: mpsc::Receiver<StreamRecord>,
    /// Merged stream
    pub combined_tx: mpsc::Sender<StreamRecord>,
}

/// Runtime settings for the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSettings {
    /// Tick period in microseconds
    pub tick_us: u64,
    /// Initial upper group activity
    #[serde(default = "default_true")]
    pub upper_active: bool,
}

fn default_true() -> bool {
    true
}

impl ActorSettings {
    /// Tick period as a duration (never zero)
    pub fn tick_period(&self) -> Duration {
        Duration::from_micros(self.tick_us.max(1))
    }
}

impl Default for ActorSettings {
    fn default() -> Self {
        Self {
            tick_us: DEFAULT_TICK_US,
            upper_active: true,
        }
    }
}

/// Put the next queued record on offer if the port is empty
fn refill(port: &mut StreamPort, rx: &mut mpsc::Receiver<StreamRecord>) {
    if port.valid {
        return;
    }
    match rx.try_recv() {
        Ok(record) => port.offer(record),
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
    }
}

/// Run the combiner actor
///
/// Returns the final statistics when a shutdown command arrives, the command
/// channel closes, or the consumer drops the merged stream receiver. Closed
/// ingress channels are not an exit condition; the combiner simply stalls
/// waiting for that group.
pub async fn run_combiner_actor(
    mut combiner: Combiner,
    mut channels: CombinerChannels,
    mut cmd_rx: mpsc::Receiver<CombinerCommand>,
    event_tx: mpsc::Sender<CombinerEvent>,
    settings: ActorSettings,
) -> CombinerStats {
    let mut io = CombinerIo::new(settings.upper_active);
    let mut ticker = interval(settings.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Combiner actor started (tick {}us, upper {})",
        settings.tick_us,
        if io.upper_active { "active" } else { "inactive" }
    );

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    CombinerCommand::SetUpperActive { active } => {
                        if io.upper_active != active {
                            info!("Upper channel group {}", if active { "enabled" } else { "disabled" });
                        }
                        io.upper_active = active;
                    }
                    CombinerCommand::QueryStats { response } => {
                        let _ = response.send(*combiner.stats());
                    }
                    CombinerCommand::QueryPhase { response } => {
                        let _ = response.send(combiner.phase());
                    }
                    CombinerCommand::Shutdown => {
                        debug!("Combiner actor received shutdown");
                        break;
                    }
                }
            }

            _ = ticker.tick() => {
                if channels.combined_tx.is_closed() {
                    warn!("Merged stream receiver dropped, stopping combiner actor");
                    break;
                }

                refill(&mut io.lower, &mut channels.lower_rx);
                refill(&mut io.upper, &mut channels.upper_rx);
                io.combined.set_ready(channels.combined_tx.capacity() > 0);

                combiner.step(&mut io);

                if io.lower.fired() {
                    io.lower.withdraw();
                }
                if io.upper.fired() {
                    io.upper.withdraw();
                }
                if let Some(record) = io.combined.transfer() {
                    if channels.combined_tx.try_send(record).is_err() {
                        warn!("Merged stream rejected a record, stopping combiner actor");
                        break;
                    }
                }

                // Events are best effort; the merged stream never waits on them
                for event in combiner.drain_events() {
                    match event_tx.try_send(event) {
                        Ok(()) | Err(TrySendError::Closed(_)) => {}
                        Err(TrySendError::Full(event)) => {
                            debug!("Event channel full, dropping {:?}", event);
                        }
                    }
                }
            }
        }
    }

    let stats = *combiner.stats();
    info!(
        "Combiner actor stopped after {} ticks ({} records emitted)",
        stats.ticks,
        stats.emitted()
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombinerConfig;

    struct Harness {
        lower_tx: mpsc::Sender<StreamRecord>,
        upper_tx: mpsc::Sender<StreamRecord>,
        out_rx: mpsc::Receiver<StreamRecord>,
        cmd_tx: mpsc::Sender<CombinerCommand>,
        event_rx: mpsc::Receiver<CombinerEvent>,
        task: tokio::task::JoinHandle<CombinerStats>,
    }

    fn spawn_actor(lower: u32, upper: u32, upper_active: bool) -> Harness {
        spawn_actor_with_events(lower, upper, upper_active, 256)
    }

    fn spawn_actor_with_events(
        lower: u32,
        upper: u32,
        upper_active: bool,
        event_capacity: usize,
    ) -> Harness {
        let (lower_tx, lower_rx) = mpsc::channel(32);
        let (upper_tx, upper_rx) = mpsc::channel(32);
        let (combined_tx, out_rx) = mpsc::channel(32);
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(event_capacity);

        let combiner = Combiner::new(CombinerConfig::new(lower, upper).unwrap()).unwrap();
        let channels = CombinerChannels {
            lower_rx,
            upper_rx,
            combined_tx,
        };
        let settings = ActorSettings {
            tick_us: 100,
            upper_active,
        };
        let task = tokio::spawn(run_combiner_actor(
            combiner, channels, cmd_rx, event_tx, settings,
        ));

        Harness {
            lower_tx,
            upper_tx,
            out_rx,
            cmd_tx,
            event_rx,
            task,
        }
    }

    async fn recv(rx: &mut mpsc::Receiver<StreamRecord>) -> StreamRecord {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_actor_merges_active_groups() {
        let mut h = spawn_actor(2, 3, true);

        h.lower_tx
            .send(StreamRecord::new(10, 0).with_first(true))
            .await
            .unwrap();
        h.lower_tx
            .send(StreamRecord::new(20, 1).with_last(true))
            .await
            .unwrap();
        h.upper_tx.send(StreamRecord::new(5, 0)).await.unwrap();
        h.upper_tx
            .send(StreamRecord::new(6, 2).with_last(true))
            .await
            .unwrap();

        let out: Vec<_> = [
            recv(&mut h.out_rx).await,
            recv(&mut h.out_rx).await,
            recv(&mut h.out_rx).await,
            recv(&mut h.out_rx).await,
        ]
        .to_vec();

        assert_eq!(
            out.iter().map(|r| r.channel_nr).collect::<Vec<_>>(),
            vec![0, 1, 2, 4]
        );
        assert_eq!(
            out.iter().map(|r| r.payload).collect::<Vec<_>>(),
            vec![10, 20, 5, 6]
        );
        assert!(out[3].last);

        let phase = CombinerCommand::phase(&h.cmd_tx).await.unwrap();
        assert_eq!(phase, Phase::ServingLower);

        h.cmd_tx.send(CombinerCommand::Shutdown).await.unwrap();
        let stats = h.task.await.unwrap();
        assert_eq!(stats.lower_forwarded, 2);
        assert_eq!(stats.upper_forwarded, 2);
        assert_eq!(stats.rounds, 1);

        let mut saw_round_end = false;
        while let Ok(event) = h.event_rx.try_recv() {
            saw_round_end |= event.is_round_end();
        }
        assert!(saw_round_end);
    }

    #[tokio::test]
    async fn test_actor_drains_when_upper_disabled() {
        let mut h = spawn_actor(1, 2, true);
        h.cmd_tx
            .send(CombinerCommand::SetUpperActive { active: false })
            .await
            .unwrap();

        h.lower_tx
            .send(StreamRecord::new(1, 0).with_first(true).with_last(true))
            .await
            .unwrap();
        for payload in [0xAA, 0xBB] {
            h.upper_tx
                .send(StreamRecord::new(payload, 0))
                .await
                .unwrap();
        }

        let first = recv(&mut h.out_rx).await;
        let drained_a = recv(&mut h.out_rx).await;
        let drained_b = recv(&mut h.out_rx).await;

        assert_eq!(first.payload, 1);
        assert_eq!((drained_a.payload, drained_a.channel_nr), (0, 1));
        assert_eq!((drained_b.payload, drained_b.channel_nr), (0, 2));
        assert!(!drained_a.last);
        assert!(drained_b.last);

        let stats = CombinerCommand::stats(&h.cmd_tx).await.unwrap();
        assert_eq!(stats.drained, 2);

        drop(h.cmd_tx);
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_unread_events_do_not_stall_stream() {
        let mut h = spawn_actor_with_events(1, 1, true, 4);
        let lower_tx = h.lower_tx.clone();
        let upper_tx = h.upper_tx.clone();

        tokio::spawn(async move {
            for n in 0..50 {
                let lower = StreamRecord::new(n, 0).with_first(true).with_last(true);
                let upper = StreamRecord::new(n, 0).with_first(true).with_last(true);
                if lower_tx.send(lower).await.is_err() || upper_tx.send(upper).await.is_err() {
                    break;
                }
            }
        });

        // Four events per round; the event channel is full after the first
        let mut received = 0;
        for _ in 0..100 {
            recv(&mut h.out_rx).await;
            received += 1;
        }
        assert_eq!(received, 100);

        let query = CombinerCommand::stats(&h.cmd_tx);
        let stats = tokio::time::timeout(Duration::from_secs(2), query)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.rounds, 50);

        h.cmd_tx.send(CombinerCommand::Shutdown).await.unwrap();
        h.task.await.unwrap();
        let mut buffered = 0;
        while h.event_rx.try_recv().is_ok() {
            buffered += 1;
        }
        assert_eq!(buffered, 4);
    }

    #[tokio::test]
    async fn test_actor_stops_when_consumer_drops() {
        let h = spawn_actor(1, 1, true);
        drop(h.out_rx);

        let stats = tokio::time::timeout(Duration::from_secs(2), h.task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.emitted(), 0);
    }
}
