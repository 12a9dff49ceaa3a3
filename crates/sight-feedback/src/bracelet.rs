//! Discrete direction states for the haptic bracelet.

use serde::{Deserialize, Serialize};

/// Direction code transmitted to the bracelet.
///
/// `0` means centered. `1..=8` walk the compass clockwise from "right"
/// in 45° steps; the active deadband discretization only emits the four
/// cardinal codes 1, 3, 5, 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BraceletState(pub u8);

impl BraceletState {
    pub const CENTERED: BraceletState = BraceletState(0);
}

/// How `(deltaX, deltaY)` is discretized into a bracelet state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BraceletBucketing {
    /// Per-axis deadband, 5 states (center + 4 cardinals). The default.
    Cardinal,
    /// Full 8-sector angular bucketing.
    Octant,
}

/// Which hand holds the phone; bracelet codes rotate accordingly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingHand {
    Left,
    Right,
}

/// Deadband discretization of the reference → target deltas.
///
/// `delta_*` are `reference - target`; `half_*` are half the target's
/// view-space dimensions. Returns `None` when no zone matches (the caller
/// keeps the previous state, matching the transmit loop's behavior of
/// repeating the last code).
pub fn cardinal_state(
    delta_x: f32,
    delta_y: f32,
    half_width: f32,
    half_height: f32,
) -> Option<BraceletState> {
    if delta_x.abs() < half_width && delta_y.abs() < half_height {
        Some(BraceletState(0))
    } else if delta_x.abs() > half_width && delta_x > 0.0 {
        Some(BraceletState(1))
    } else if delta_x.abs() < half_width && delta_y > 0.0 {
        Some(BraceletState(3))
    } else if delta_x.abs() > half_width && delta_x < 0.0 {
        Some(BraceletState(5))
    } else if delta_x.abs() < half_width && delta_y < 0.0 {
        Some(BraceletState(7))
    } else {
        None
    }
}

/// 8-sector angular bucketing, 45° sectors offset by 22.5°.
///
/// Kept as an alternate configuration; the deadband discretization is the
/// product behavior.
pub fn octant_state(angle_degrees: f32) -> BraceletState {
    debug_assert!((0.0..=360.0).contains(&angle_degrees));
    let code = match angle_degrees {
        a if a < 22.5 || a > 337.5 => 1,
        a if a < 67.5 => 2,
        a if a < 112.5 => 3,
        a if a < 157.5 => 4,
        a if a < 202.5 => 5,
        a if a < 247.5 => 6,
        a if a < 292.5 => 7,
        _ => 8,
    };
    BraceletState(code)
}

/// Relabel a direction code for the hand holding the device.
///
/// The bracelet's compass is relative to device orientation, not the frame:
/// when the phone sits in the left or right hand the eight positions are
/// permuted by a fixed table. Center (0) and out-of-range codes pass
/// through unchanged.
pub fn rotate_for_hand(state: BraceletState, hand: HoldingHand) -> BraceletState {
    let BraceletState(code) = state;
    if !(1..=8).contains(&code) {
        return state;
    }
    let rotated = match hand {
        HoldingHand::Left => match code {
            1 => 3,
            2 => 4,
            3 => 5,
            4 => 6,
            5 => 7,
            6 => 8,
            7 => 1,
            _ => 2,
        },
        HoldingHand::Right => match code {
            1 => 7,
            2 => 8,
            3 => 1,
            4 => 2,
            5 => 3,
            6 => 4,
            7 => 5,
            _ => 6,
        },
    };
    BraceletState(rotated)
}

/// Serialize a state + beep interval as the bracelet wire message.
pub fn bracelet_message(state: BraceletState, duration_ms: u32) -> String {
    format!("{}-{}", state.0, duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadband_discretization_covers_the_cardinals() {
        // Deltas are reference - target, half dims 50x60.
        assert_eq!(cardinal_state(10.0, 20.0, 50.0, 60.0), Some(BraceletState(0)));
        assert_eq!(cardinal_state(80.0, 0.0, 50.0, 60.0), Some(BraceletState(1)));
        assert_eq!(cardinal_state(10.0, 90.0, 50.0, 60.0), Some(BraceletState(3)));
        assert_eq!(cardinal_state(-80.0, 0.0, 50.0, 60.0), Some(BraceletState(5)));
        assert_eq!(cardinal_state(10.0, -90.0, 50.0, 60.0), Some(BraceletState(7)));
        // Exactly on the deadband edge with no vertical offset: no zone.
        assert_eq!(cardinal_state(50.0, 0.0, 50.0, 60.0), None);
    }

    #[test]
    fn octants_are_offset_half_a_sector() {
        assert_eq!(octant_state(0.0), BraceletState(1));
        assert_eq!(octant_state(350.0), BraceletState(1));
        assert_eq!(octant_state(45.0), BraceletState(2));
        assert_eq!(octant_state(90.0), BraceletState(3));
        assert_eq!(octant_state(180.0), BraceletState(5));
        assert_eq!(octant_state(270.0), BraceletState(7));
        assert_eq!(octant_state(315.0), BraceletState(8));
    }

    #[test]
    fn left_rotation_table_is_exact() {
        let expected = [(1, 3), (2, 4), (3, 5), (4, 6), (5, 7), (6, 8), (7, 1), (8, 2)];
        for (from, to) in expected {
            assert_eq!(
                rotate_for_hand(BraceletState(from), HoldingHand::Left),
                BraceletState(to)
            );
        }
    }

    #[test]
    fn right_rotation_table_is_exact() {
        let expected = [(1, 7), (2, 8), (3, 1), (4, 2), (5, 3), (6, 4), (7, 5), (8, 6)];
        for (from, to) in expected {
            assert_eq!(
                rotate_for_hand(BraceletState(from), HoldingHand::Right),
                BraceletState(to)
            );
        }
    }

    #[test]
    fn double_left_rotation_is_not_identity() {
        // The table is a fixed relabeling, not an involution.
        let twice = rotate_for_hand(
            rotate_for_hand(BraceletState(1), HoldingHand::Left),
            HoldingHand::Left,
        );
        assert_ne!(twice, BraceletState(1));
        assert_eq!(twice, BraceletState(5));
    }

    #[test]
    fn centered_passes_rotation_unchanged() {
        assert_eq!(
            rotate_for_hand(BraceletState::CENTERED, HoldingHand::Left),
            BraceletState::CENTERED
        );
    }

    #[test]
    fn wire_message_is_state_dash_millis() {
        assert_eq!(bracelet_message(BraceletState(3), 450), "3-450");
        assert_eq!(bracelet_message(BraceletState(0), 1000), "0-1000");
    }
}
