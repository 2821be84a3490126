//! Scenario descriptions
//!
//! A scenario is everything needed to reproduce a simulation run: combiner
//! configuration, the frames each producer sends, and the signal patterns of
//! every party. Scenarios are plain JSON so they can be kept next to bug
//! reports.

use chan_mux::CombinerConfig;
use chan_protocol::{Group, StreamRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimError;
use crate::pattern::{ActivitySchedule, Pattern};
use crate::simulation::{Simulation, SimulationReport};
use crate::source::frame;

/// Default tick limit for a scenario run
const DEFAULT_MAX_TICKS: u64 = 10_000;

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

/// What one producer sends
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupFeed {
    /// Frames of signed samples, one sample per channel
    #[serde(default)]
    pub frames: Vec<Vec<i32>>,
    /// Ticks on which a fresh record may be offered
    #[serde(default)]
    pub offer: Pattern,
}

/// A reproducible simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Combiner configuration
    pub config: CombinerConfig,
    /// Lower group producer
    #[serde(default)]
    pub lower: GroupFeed,
    /// Upper group producer
    #[serde(default)]
    pub upper: GroupFeed,
    /// Consumer ready pattern
    #[serde(default)]
    pub consumer_ready: Pattern,
    /// Upper group activity
    #[serde(default)]
    pub upper_active: ActivitySchedule,
    /// Tick limit
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Scenario {
    /// Parse a scenario from JSON
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the scenario as pretty JSON
    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get the feed for `group`
    pub fn feed(&self, group: Group) -> &GroupFeed {
        match group {
            Group::Lower => &self.lower,
            Group::Upper => &self.upper,
        }
    }

    /// Encode every frame `group` sends, back to back
    pub fn records(&self, group: Group) -> Result<Vec<StreamRecord>, SimError> {
        let channel_count = self.config.channel_count(group);
        let format = self.config.sample_format;

        let mut records = Vec::new();
        for samples in &self.feed(group).frames {
            if samples.is_empty() {
                return Err(SimError::EmptyFrame(group));
            }
            if samples.len() > channel_count as usize {
                return Err(SimError::FrameTooWide {
                    group,
                    len: samples.len(),
                    channel_count,
                });
            }
            records.extend(frame(&format, samples)?);
        }
        Ok(records)
    }

    /// Build a ready-to-run simulation
    pub fn build(&self) -> Result<Simulation, SimError> {
        let mut sim = Simulation::new(self.config)?;
        let lower = self.records(Group::Lower)?;
        let upper = self.records(Group::Upper)?;

        sim.lower_mut().set_offer_pattern(self.lower.offer.clone());
        sim.lower_mut().push_frame(&lower);
        sim.upper_mut().set_offer_pattern(self.upper.offer.clone());
        sim.upper_mut().push_frame(&upper);
        debug!(
            "Scenario loaded: {} lower and {} upper records",
            lower.len(),
            upper.len()
        );

        sim.consumer_mut()
            .set_ready_pattern(self.consumer_ready.clone());
        sim.set_activity(self.upper_active.clone());
        Ok(sim)
    }

    /// Build and run until idle or the tick limit
    pub fn run(&self) -> Result<SimulationReport, SimError> {
        Ok(self.build()?.run_until_idle(self.max_ticks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAIN_SCENARIO: &str = r#"{
        "config": { "lower": { "channel_count": 2 }, "upper": { "channel_count": 3 } },
        "lower": { "frames": [[10, 20]] },
        "upper": { "frames": [[-1, -2, -3]] },
        "upper_active": { "kind": "constant", "value": false }
    }"#;

    #[test]
    fn test_parse_with_defaults() {
        let scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();
        assert_eq!(scenario.max_ticks, DEFAULT_MAX_TICKS);
        assert_eq!(scenario.consumer_ready, Pattern::Always);
        assert_eq!(scenario.lower.offer, Pattern::Always);
        assert_eq!(scenario.config.sample_format.width(), 24);
    }

    #[test]
    fn test_drain_scenario_output() {
        let report = Scenario::from_json(DRAIN_SCENARIO).unwrap().run().unwrap();

        let out: Vec<_> = report
            .received
            .iter()
            .map(|r| (r.payload, r.channel_nr, r.first, r.last))
            .collect();
        assert_eq!(
            out,
            vec![
                (10, 0, true, false),
                (20, 1, false, false),
                (0, 2, false, false),
                (0, 3, false, false),
                (0, 4, false, true),
            ]
        );
    }

    #[test]
    fn test_records_carry_group_local_indices() {
        let scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();
        let upper = scenario.records(Group::Upper).unwrap();
        let channels: Vec<_> = upper.iter().map(|r| r.channel_nr).collect();
        assert_eq!(channels, vec![0, 1, 2]);
        assert_eq!(upper[0].payload, 0x00FF_FFFF);
        assert!(upper[2].last);
    }

    #[test]
    fn test_rejects_wide_frame() {
        let mut scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();
        scenario.lower.frames.push(vec![1, 2, 3]);
        assert!(matches!(
            scenario.build(),
            Err(SimError::FrameTooWide {
                group: Group::Lower,
                len: 3,
                channel_count: 2
            })
        ));
    }

    #[test]
    fn test_rejects_empty_frame_and_bad_config() {
        let mut scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();
        scenario.upper.frames.push(vec![]);
        assert!(matches!(
            scenario.build(),
            Err(SimError::EmptyFrame(Group::Upper))
        ));

        scenario.config.lower.channel_count = 0;
        assert!(matches!(scenario.build(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_json_round_trip_keeps_scenario() {
        let scenario = Scenario::from_json(DRAIN_SCENARIO).unwrap();
        let again = Scenario::from_json(&scenario.to_json().unwrap()).unwrap();
        assert_eq!(scenario, again);
    }
}
