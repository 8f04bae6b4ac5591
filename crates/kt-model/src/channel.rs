//! Result channels shared by every trace and every graph selector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;
use crate::scheme::{Choice, choice_traits};

/// Closed set of channel names a computation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Time,
    Position,
    Height,
    Velocity,
    Acceleration,
    Force,
    KineticEnergy,
    PotentialEnergy,
    Energy,
}

impl Choice for Channel {
    const KIND: &'static str = "channel";
    const ALL: &'static [Self] = &[
        Self::Time,
        Self::Position,
        Self::Height,
        Self::Velocity,
        Self::Acceleration,
        Self::Force,
        Self::KineticEnergy,
        Self::PotentialEnergy,
        Self::Energy,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Position => "position",
            Self::Height => "height",
            Self::Velocity => "velocity",
            Self::Acceleration => "acceleration",
            Self::Force => "force",
            Self::KineticEnergy => "kinetic_energy",
            Self::PotentialEnergy => "potential_energy",
            Self::Energy => "energy",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Time => "Time (s)",
            Self::Position => "Position (m)",
            Self::Height => "Height (m)",
            Self::Velocity => "Velocity (m/s)",
            Self::Acceleration => "Acceleration (m/s²)",
            Self::Force => "Force (N)",
            Self::KineticEnergy => "Kinetic energy (J)",
            Self::PotentialEnergy => "Potential energy (J)",
            Self::Energy => "Total energy (J)",
        }
    }
}

choice_traits!(Channel);

/// Computed sequences keyed by channel. Absent channels read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Channels {
    data: BTreeMap<Channel, Vec<f64>>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: Channel, values: Vec<f64>) {
        self.data.insert(channel, values);
    }

    /// Values of a channel, or an empty slice when it was never computed.
    pub fn get(&self, channel: Channel) -> &[f64] {
        self.data.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.data.get(&channel).is_some_and(|v| !v.is_empty())
    }

    /// Number of recorded samples (length of the time channel).
    pub fn sample_count(&self) -> usize {
        self.get(Channel::Time).len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &[f64])> {
        self.data.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl FromIterator<(Channel, Vec<f64>)> for Channels {
    fn from_iter<T: IntoIterator<Item = (Channel, Vec<f64>)>>(iter: T) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_back() {
        for channel in Channel::ALL {
            assert_eq!(channel.key().parse::<Channel>().unwrap(), *channel);
        }
        assert!("momentum".parse::<Channel>().is_err());
    }

    #[test]
    fn absent_channel_reads_empty() {
        let mut channels = Channels::new();
        assert!(channels.is_empty());
        assert!(channels.get(Channel::Force).is_empty());

        channels.insert(Channel::Time, vec![0.0, 0.1]);
        assert!(channels.contains(Channel::Time));
        assert!(!channels.contains(Channel::Force));
        assert_eq!(channels.sample_count(), 2);
    }

    #[test]
    fn serde_names_match_keys() {
        for channel in Channel::ALL {
            let json = serde_json::to_string(channel).unwrap();
            assert_eq!(json, format!("\"{}\"", channel.key()));
        }
    }
}
