//! The Human Design mandala: 64 gates of 5.625° laid around the ecliptic.

use serde::{Deserialize, Serialize};

use blueprint_ephemeris::normalize_degrees;

use super::channels::Center;

/// Ecliptic longitude where gate 41 begins.
pub const WHEEL_START: f64 = 302.0;
pub const GATE_SPAN: f64 = 360.0 / 64.0;
pub const LINE_SPAN: f64 = GATE_SPAN / 6.0;

/// Gates in wheel order, starting from [`WHEEL_START`].
pub const GATE_ORDER: [u8; 64] = [
    41, 19, 13, 49, 30, 55, 37, 63, 22, 36, 25, 17, 21, 51, 42, 3, //
    27, 24, 2, 23, 8, 20, 16, 35, 45, 12, 15, 52, 39, 53, 62, 56, //
    31, 33, 7, 4, 29, 59, 40, 64, 47, 6, 46, 18, 48, 57, 32, 50, //
    28, 44, 1, 43, 14, 34, 9, 5, 26, 11, 10, 58, 38, 54, 61, 60,
];

/// Gate and line activated by a longitude.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateLine {
    pub gate: u8,
    pub line: u8,
}

impl GateLine {
    pub fn gate_id(&self) -> String {
        gate_id(self.gate)
    }

    pub fn center(&self) -> Option<Center> {
        Center::of_gate(self.gate)
    }
}

pub fn gate_id(gate: u8) -> String {
    format!("gate-{}", gate)
}

pub fn gate_at(longitude: f64) -> GateLine {
    let offset = normalize_degrees(longitude - WHEEL_START);
    let index = ((offset / GATE_SPAN).floor() as usize).min(63);
    let within = offset - index as f64 * GATE_SPAN;
    let line = ((within / LINE_SPAN).floor() as i64 + 1).clamp(1, 6) as u8;
    GateLine {
        gate: GATE_ORDER[index],
        line,
    }
}

/// `(start, end)` longitudes of a gate; `end < start` for the gate that
/// straddles 0° Aries.
pub fn gate_range(gate: u8) -> Option<(f64, f64)> {
    let index = GATE_ORDER.iter().position(|g| *g == gate)?;
    let start = normalize_degrees(WHEEL_START + index as f64 * GATE_SPAN);
    Some((start, normalize_degrees(start + GATE_SPAN)))
}

pub fn is_valid_gate(gate: u8) -> bool {
    (1..=64).contains(&gate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wheel_contains_every_gate_once() {
        let mut seen = [false; 65];
        for gate in GATE_ORDER {
            assert!(!seen[gate as usize], "gate {} repeated", gate);
            seen[gate as usize] = true;
        }
        assert!(seen[1..].iter().all(|s| *s));
    }

    #[test]
    fn test_wheel_start() {
        assert_eq!(gate_at(302.0), GateLine { gate: 41, line: 1 });
        assert_eq!(gate_at(301.99).gate, 60);
    }

    #[test]
    fn test_gate_25_straddles_aries_point() {
        let (start, end) = gate_range(25).unwrap();
        assert_relative_eq!(start, 358.25);
        assert_relative_eq!(end, 3.875);
        assert_eq!(gate_at(359.0).gate, 25);
        assert_eq!(gate_at(0.0).gate, 25);
        assert_eq!(gate_at(3.8).gate, 25);
        assert_eq!(gate_at(3.9).gate, 17);
    }

    #[test]
    fn test_lines() {
        let (start, _) = gate_range(44).unwrap();
        assert_eq!(gate_at(start + 0.01).line, 1);
        assert_eq!(gate_at(start + 3.5 * LINE_SPAN).line, 4);
        assert_eq!(gate_at(start + GATE_SPAN - 1e-9).line, 6);
    }

    #[test]
    fn test_known_positions() {
        // 0° Cancer falls in gate 15, 0° Libra in gate 46
        assert_eq!(gate_at(90.0).gate, 15);
        assert_eq!(gate_at(180.0).gate, 46);
    }

    #[test]
    fn test_gate_range_unknown() {
        assert!(gate_range(65).is_none());
        assert!(!is_valid_gate(0));
    }
}
