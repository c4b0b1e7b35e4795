use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------
// ## Centers
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Center {
    Head,
    Ajna,
    Throat,
    G,
    Heart,
    Sacral,
    SolarPlexus,
    Spleen,
    Root,
}

impl Center {
    pub const ALL: [Center; 9] = [
        Center::Head,
        Center::Ajna,
        Center::Throat,
        Center::G,
        Center::Heart,
        Center::Sacral,
        Center::SolarPlexus,
        Center::Spleen,
        Center::Root,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Center::Head => "head-center",
            Center::Ajna => "ajna-center",
            Center::Throat => "throat-center",
            Center::G => "g-center",
            Center::Heart => "heart-center",
            Center::Sacral => "sacral-center",
            Center::SolarPlexus => "solar-plexus-center",
            Center::Spleen => "spleen-center",
            Center::Root => "root-center",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Center::Head => "Head",
            Center::Ajna => "Ajna",
            Center::Throat => "Throat",
            Center::G => "G",
            Center::Heart => "Heart",
            Center::Sacral => "Sacral",
            Center::SolarPlexus => "Solar Plexus",
            Center::Spleen => "Spleen",
            Center::Root => "Root",
        }
    }

    pub fn gates(&self) -> &'static [u8] {
        match self {
            Center::Head => &[64, 61, 63],
            Center::Ajna => &[47, 24, 4, 17, 43, 11],
            Center::Throat => &[62, 23, 56, 35, 12, 45, 33, 8, 31, 20, 16],
            Center::G => &[1, 13, 25, 46, 2, 15, 10, 7],
            Center::Heart => &[21, 40, 26, 51],
            Center::Sacral => &[5, 14, 29, 59, 9, 3, 42, 27, 34],
            Center::SolarPlexus => &[36, 22, 37, 6, 49, 55, 30],
            Center::Spleen => &[48, 57, 44, 50, 32, 28, 18],
            Center::Root => &[53, 60, 52, 19, 39, 41, 58, 38, 54],
        }
    }

    /// Heart, Solar Plexus, Sacral and Root generate energy.
    pub fn is_motor(&self) -> bool {
        matches!(
            self,
            Center::Heart | Center::SolarPlexus | Center::Sacral | Center::Root
        )
    }

    pub fn of_gate(gate: u8) -> Option<Center> {
        Center::ALL
            .iter()
            .copied()
            .find(|center| center.gates().contains(&gate))
    }

    pub fn from_id(id: &str) -> Option<Center> {
        Center::ALL.iter().copied().find(|center| center.id() == id)
    }
}

impl fmt::Display for Center {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Channels
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Channel {
    pub gate1: u8,
    pub gate2: u8,
}

impl Channel {
    pub fn id(&self) -> String {
        format!("channel-{}-{}", self.gate1, self.gate2)
    }

    pub fn center1(&self) -> Option<Center> {
        Center::of_gate(self.gate1)
    }

    pub fn center2(&self) -> Option<Center> {
        Center::of_gate(self.gate2)
    }

    /// The two centers a channel joins. Every channel joins two distinct
    /// centers; `None` only for a malformed table entry.
    pub fn centers(&self) -> Option<(Center, Center)> {
        Some((self.center1()?, self.center2()?))
    }

    pub fn is_defined_by(&self, gates: &BTreeSet<u8>) -> bool {
        gates.contains(&self.gate1) && gates.contains(&self.gate2)
    }
}

const fn channel(gate1: u8, gate2: u8) -> Channel {
    Channel { gate1, gate2 }
}

pub const CHANNELS: [Channel; 36] = [
    channel(1, 8),
    channel(2, 14),
    channel(3, 60),
    channel(4, 63),
    channel(5, 15),
    channel(6, 59),
    channel(7, 31),
    channel(9, 52),
    channel(10, 20),
    channel(10, 34),
    channel(10, 57),
    channel(11, 56),
    channel(12, 22),
    channel(13, 33),
    channel(16, 48),
    channel(17, 62),
    channel(18, 58),
    channel(19, 49),
    channel(20, 34),
    channel(20, 57),
    channel(21, 45),
    channel(23, 43),
    channel(24, 61),
    channel(25, 51),
    channel(26, 44),
    channel(27, 50),
    channel(28, 38),
    channel(29, 46),
    channel(30, 41),
    channel(32, 54),
    channel(34, 57),
    channel(35, 36),
    channel(37, 40),
    channel(39, 55),
    channel(42, 53),
    channel(47, 64),
];

pub fn channel_by_id(id: &str) -> Option<Channel> {
    CHANNELS.iter().copied().find(|c| c.id() == id)
}

/// Channels whose two gates are both activated.
pub fn defined_channels(gates: &BTreeSet<u8>) -> Vec<Channel> {
    CHANNELS
        .iter()
        .copied()
        .filter(|channel| channel.is_defined_by(gates))
        .collect()
}

/// Centers touched by at least one defined channel, in [`Center::ALL`] order.
pub fn defined_centers(channels: &[Channel]) -> Vec<Center> {
    let set: BTreeSet<Center> = channels
        .iter()
        .filter_map(Channel::centers)
        .flat_map(|(a, b)| [a, b])
        .collect();
    set.into_iter().collect()
}

// ---------------------------
// ## Connectivity
// ---------------------------

/// Union-find over the nine centers.
struct CenterGraph {
    parent: [usize; 9],
}

impl CenterGraph {
    fn new(channels: &[Channel]) -> Self {
        let mut graph = CenterGraph {
            parent: [0, 1, 2, 3, 4, 5, 6, 7, 8],
        };
        for (a, b) in channels.iter().filter_map(Channel::centers) {
            graph.union(a as usize, b as usize);
        }
        graph
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent[root_b] = root_a;
        }
    }

    fn connected(&mut self, a: Center, b: Center) -> bool {
        self.find(a as usize) == self.find(b as usize)
    }
}

/// True when any motor reaches the Throat through a chain of defined channels.
pub fn motor_connected_to_throat(channels: &[Channel]) -> bool {
    let mut graph = CenterGraph::new(channels);
    let throat_defined = defined_centers(channels).contains(&Center::Throat);
    throat_defined
        && Center::ALL
            .iter()
            .filter(|center| center.is_motor())
            .any(|motor| graph.connected(*motor, Center::Throat))
}

/// Number of separate groups the defined centers form.
pub fn connected_components(channels: &[Channel]) -> usize {
    let centers = defined_centers(channels);
    let mut graph = CenterGraph::new(channels);
    let roots: BTreeSet<usize> = centers
        .iter()
        .map(|center| graph.find(*center as usize))
        .collect();
    roots.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gates(list: &[u8]) -> BTreeSet<u8> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_every_gate_has_one_center() {
        for gate in 1..=64u8 {
            let owners = Center::ALL
                .iter()
                .filter(|c| c.gates().contains(&gate))
                .count();
            assert_eq!(owners, 1, "gate {}", gate);
        }
    }

    #[test]
    fn test_channels_join_distinct_centers() {
        for channel in CHANNELS {
            let (a, b) = channel.centers().unwrap();
            assert_ne!(a, b, "{}", channel.id());
        }
    }

    #[test]
    fn test_channel_ids() {
        assert_eq!(CHANNELS[0].id(), "channel-1-8");
        assert!(channel_by_id("channel-26-44").is_some());
        assert!(channel_by_id("channel-44-26").is_none());
    }

    #[test]
    fn test_defined_channel_needs_both_gates() {
        let defined = defined_channels(&gates(&[34, 20, 1]));
        assert_eq!(defined.len(), 1);
        assert_eq!(defined[0].id(), "channel-20-34");
        assert_eq!(defined_centers(&defined), vec![Center::Throat, Center::Sacral]);
    }

    #[test]
    fn test_direct_motor_to_throat() {
        let defined = defined_channels(&gates(&[21, 45]));
        assert!(motor_connected_to_throat(&defined));
    }

    #[test]
    fn test_indirect_motor_to_throat() {
        // Sacral -> G (5-15), G -> Throat (7-31)
        let defined = defined_channels(&gates(&[5, 15, 7, 31]));
        assert!(motor_connected_to_throat(&defined));
    }

    #[test]
    fn test_throat_without_motor() {
        // Ajna -> Throat (17-62), Head -> Ajna (47-64)
        let defined = defined_channels(&gates(&[17, 62, 47, 64]));
        assert!(!motor_connected_to_throat(&defined));
    }

    #[test]
    fn test_components() {
        assert_eq!(connected_components(&[]), 0);
        let single = defined_channels(&gates(&[17, 62, 47, 64]));
        assert_eq!(connected_components(&single), 1);
        // Head-Ajna and Sacral-Root stay apart
        let split = defined_channels(&gates(&[47, 64, 42, 53]));
        assert_eq!(connected_components(&split), 2);
        let triple = defined_channels(&gates(&[47, 64, 42, 53, 26, 44]));
        assert_eq!(connected_components(&triple), 3);
    }
}
