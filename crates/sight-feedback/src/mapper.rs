//! Continuous sonification and discrete feedback from the target relation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use sight_core::angle_degrees;

use crate::bracelet::{cardinal_state, octant_state, BraceletBucketing, BraceletState};
use crate::output::Cue;

/// Pitch magnitude ceiling, in cents, for every response curve.
pub const MAX_PITCH: f32 = 2000.0;

/// Extra slack, in view pixels, before a centered target counts as
/// uncentered again.
pub const HYSTERESIS_MARGIN_PX: f32 = 30.0;

/// Horizontal reference span used by the parabola curve's slope.
const PARABOLA_REFERENCE_PX: f32 = 960.0;

/// Apparent hand size, in sensor pixels, at the calibration floor.
const MIN_HAND_SIZE_PX: f32 = 300.0;

/// Assumed arm reach in meters for the hand-size cadence proxy.
const REACHING_DISTANCE_M: f32 = 0.5;

/// Vertical offset → pitch response curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalCurve {
    /// Constant pitch magnitude outside the deadband.
    Step,
    /// Quadratic growth with the vertical offset.
    Parabola,
    /// Cubic growth, clamped at [`MAX_PITCH`].
    Cubic,
}

/// Unrecognized response-curve name in the session configuration.
#[derive(thiserror::Error, Debug)]
#[error("unrecognized vertical response curve {0:?} (expected step, parabola or cubic)")]
pub struct CurveParseError(pub String);

impl FromStr for VerticalCurve {
    type Err = CurveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "step" => Ok(VerticalCurve::Step),
            "parabola" => Ok(VerticalCurve::Parabola),
            "cubic" => Ok(VerticalCurve::Cubic),
            _ => Err(CurveParseError(s.to_string())),
        }
    }
}

impl fmt::Display for VerticalCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerticalCurve::Step => "step",
            VerticalCurve::Parabola => "parabola",
            VerticalCurve::Cubic => "cubic",
        };
        f.write_str(name)
    }
}

/// Which feedback channel carries the guidance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackMode {
    Sonification,
    Bracelet,
}

/// Mapper tuning, fixed for the session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MapperConfig {
    pub mode: FeedbackMode,
    pub vertical_curve: VerticalCurve,
    /// User-configured multiplier on the vertical response.
    pub vertical_slope: f32,
    /// User-configured multiplier on the depth → cadence relation.
    pub depth_slope: f32,
    pub default_inter_beep_s: f32,
    pub min_inter_beep_s: f32,
    pub bucketing: BraceletBucketing,
}

impl Default for MapperConfig {
    fn default() -> Self {
        MapperConfig {
            mode: FeedbackMode::Sonification,
            vertical_curve: VerticalCurve::Step,
            vertical_slope: 1.0,
            depth_slope: 1.0,
            default_inter_beep_s: 1.0,
            min_inter_beep_s: 0.1,
            bucketing: BraceletBucketing::Cardinal,
        }
    }
}

/// Continuous feedback parameters for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackParams {
    /// Pitch shift in cents, sign follows the vertical offset.
    pub pitch: f32,
    /// Stereo pan in `[-1, 1]`.
    pub pan: f32,
    /// Beep cadence; never below the configured minimum.
    pub inter_beep: Duration,
    pub bracelet: BraceletState,
}

/// Result of the centering/direction pass: the guidance message plus an
/// optional edge cue.
#[derive(Clone, Debug, PartialEq)]
pub struct CenteringUpdate {
    pub message: String,
    pub cue: Option<Cue>,
}

/// Compass phrase for a bearing angle, 45° sectors offset by 22.5°.
pub fn compass_phrase(angle_degrees: f32) -> &'static str {
    match angle_degrees {
        a if a < 22.5 || a > 337.5 => "left",
        a if a < 67.5 => "top left",
        a if a < 112.5 => "top",
        a if a < 157.5 => "top right",
        a if a < 202.5 => "right",
        a if a < 247.5 => "down right",
        a if a < 292.5 => "down",
        _ => "down left",
    }
}

/// Maps the live reference-point → target relation to feedback parameters.
///
/// Holds the hysteretic centering flag, the hand-size calibration and the
/// last emitted bracelet state; everything else is recomputed per tick.
#[derive(Debug)]
pub struct FeedbackMapper {
    config: MapperConfig,
    target_width: f32,
    target_height: f32,
    hand_detected: bool,
    hand_size: f32,
    max_hand_size: f32,
    centered: bool,
    bracelet: BraceletState,
    direction: &'static str,
    inter_beep_s: f32,
}

impl FeedbackMapper {
    pub fn new(config: MapperConfig) -> Self {
        FeedbackMapper {
            config,
            target_width: 0.0,
            target_height: 0.0,
            hand_detected: false,
            hand_size: 0.0,
            max_hand_size: 0.0,
            centered: false,
            bracelet: BraceletState::CENTERED,
            direction: "",
            inter_beep_s: config.default_inter_beep_s,
        }
    }

    #[inline]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Latest target extent in view pixels; defines both deadbands.
    pub fn set_target_extent(&mut self, width_px: f32, height_px: f32) {
        self.target_width = width_px;
        self.target_height = height_px;
    }

    /// Record a validated hand sample; grows the calibration maximum.
    pub fn hand_present(&mut self, size_px: f32) {
        self.hand_detected = true;
        self.hand_size = size_px;
        if size_px > self.max_hand_size {
            self.max_hand_size = size_px;
        }
    }

    pub fn hand_absent(&mut self) {
        self.hand_detected = false;
    }

    #[inline]
    pub fn is_centered(&self) -> bool {
        self.centered
    }

    #[inline]
    pub fn bracelet_state(&self) -> BraceletState {
        self.bracelet
    }

    /// Last computed compass phrase, used in the target-lost message.
    #[inline]
    pub fn direction_phrase(&self) -> &'static str {
        self.direction
    }

    #[inline]
    pub fn inter_beep(&self) -> Duration {
        Duration::from_secs_f32(self.inter_beep_s)
    }

    /// Parameters for a tick without a live target projection.
    pub fn neutral_params(&mut self) -> FeedbackParams {
        self.inter_beep_s = self
            .config
            .default_inter_beep_s
            .max(self.config.min_inter_beep_s);
        FeedbackParams {
            pitch: 0.0,
            pan: 0.0,
            inter_beep: self.inter_beep(),
            bracelet: self.bracelet,
        }
    }

    /// Recompute continuous parameters for one tick.
    ///
    /// `reference` and `target` are view-space points; `depth` is the
    /// current anchor depth estimate in meters.
    pub fn update(
        &mut self,
        reference: Point2<f32>,
        target: Point2<f32>,
        depth: f32,
    ) -> FeedbackParams {
        let delta_x = reference.x - target.x;
        let delta_y = reference.y - target.y;
        let half_w = self.target_width / 2.0;
        let half_h = self.target_height / 2.0;

        let pitch = self.vertical_pitch(delta_y, half_h, reference.y);
        let pan = if delta_x.abs() < half_w || self.centered {
            0.0
        } else if target.x > reference.x {
            1.0
        } else {
            -1.0
        };

        if self.config.mode == FeedbackMode::Bracelet {
            let next = match self.config.bucketing {
                BraceletBucketing::Cardinal => cardinal_state(delta_x, delta_y, half_w, half_h),
                BraceletBucketing::Octant => {
                    if delta_x.abs() < half_w && delta_y.abs() < half_h {
                        Some(BraceletState::CENTERED)
                    } else {
                        Some(octant_state(angle_degrees(target, reference)))
                    }
                }
            };
            // No zone matched: repeat the previous code.
            if let Some(state) = next {
                self.bracelet = state;
            }
        }

        self.inter_beep_s = self.cadence_seconds(depth);

        FeedbackParams {
            pitch,
            pan,
            inter_beep: self.inter_beep(),
            bracelet: self.bracelet,
        }
    }

    fn vertical_pitch(&self, delta_y: f32, half_h: f32, reference_y: f32) -> f32 {
        let factor = self.config.vertical_slope;
        match self.config.vertical_curve {
            VerticalCurve::Step => {
                if delta_y.abs() < half_h {
                    0.0
                } else {
                    factor * delta_y.signum() * MAX_PITCH
                }
            }
            VerticalCurve::Parabola => {
                if reference_y <= 0.0 {
                    return 0.0;
                }
                let slope = MAX_PITCH / (PARABOLA_REFERENCE_PX * reference_y);
                factor * slope * delta_y * delta_y
            }
            VerticalCurve::Cubic => {
                if half_h <= 0.0 {
                    return 0.0;
                }
                let slope = 32.0 / (half_h * half_h * half_h);
                let pitch = factor * slope * delta_y * delta_y * delta_y;
                pitch.clamp(-MAX_PITCH, MAX_PITCH)
            }
        }
    }

    /// Inter-beep cadence in seconds, floored at the configured minimum.
    ///
    /// With a calibrated hand in frame the cadence derives from the
    /// apparent hand size instead of the target depth: the hand growing in
    /// the frame is a proxy for the remaining reaching distance.
    fn cadence_seconds(&self, depth: f32) -> f32 {
        let cadence = if depth != 0.0 {
            let offset = self.config.min_inter_beep_s;
            let slope = self.config.default_inter_beep_s - offset;
            let from_depth = self.config.depth_slope * slope * depth + offset;

            if self.hand_detected && self.max_hand_size > MIN_HAND_SIZE_PX {
                let min_dist = depth - REACHING_DISTANCE_M;
                let hand_slope = (depth - min_dist) / (self.max_hand_size - MIN_HAND_SIZE_PX);
                let hand_offset = min_dist - hand_slope * MIN_HAND_SIZE_PX;
                hand_slope * self.hand_size + hand_offset
            } else {
                from_depth
            }
        } else {
            self.config.default_inter_beep_s
        };
        cadence.max(self.config.min_inter_beep_s)
    }

    /// Directional message and centering hysteresis for one tick.
    ///
    /// A cue fires exactly once per centered/uncentered edge. Once
    /// centered, the flag holds for any delta within half the target
    /// dimension plus [`HYSTERESIS_MARGIN_PX`] and clears only beyond it.
    pub fn assist(&mut self, reference: Point2<f32>, target: Point2<f32>) -> CenteringUpdate {
        let delta_x = reference.x - target.x;
        let delta_y = reference.y - target.y;
        let half_w = self.target_width / 2.0;
        let half_h = self.target_height / 2.0;

        self.direction = compass_phrase(angle_degrees(target, reference));

        let inside = delta_x.abs() < half_w && delta_y.abs() < half_h;
        let inside_margin = delta_x.abs() <= half_w + HYSTERESIS_MARGIN_PX
            && delta_y.abs() <= half_h + HYSTERESIS_MARGIN_PX;

        if inside {
            let cue = if self.centered {
                None
            } else {
                self.centered = true;
                Some(Cue::Centered)
            };
            return CenteringUpdate {
                message: "Centered!".to_string(),
                cue,
            };
        }

        if self.centered && inside_margin {
            // Hysteresis band: hold the centered state, no cue.
            return CenteringUpdate {
                message: "Centered!".to_string(),
                cue: None,
            };
        }

        let cue = if self.centered {
            self.centered = false;
            Some(Cue::Uncentered)
        } else {
            None
        };
        CenteringUpdate {
            message: self.direction.to_string(),
            cue,
        }
    }

    /// Restore session defaults. Idempotent.
    pub fn reset(&mut self) {
        self.target_width = 0.0;
        self.target_height = 0.0;
        self.hand_detected = false;
        self.hand_size = 0.0;
        self.max_hand_size = 0.0;
        self.centered = false;
        self.bracelet = BraceletState::CENTERED;
        self.direction = "";
        self.inter_beep_s = self.config.default_inter_beep_s;
    }
}
