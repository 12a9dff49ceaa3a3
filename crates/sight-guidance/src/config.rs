//! Per-session configuration, validated once at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use sight_feedback::{BraceletBucketing, FeedbackMode, HoldingHand, MapperConfig, VerticalCurve};

/// Invalid session configuration; raised before any worker starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no target label configured")]
    EmptyLabel,
    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f32 },
    #[error("minimum inter-beep ({min_s} s) must be below the default ({default_s} s)")]
    InvertedCadence { min_s: f32, default_s: f32 },
    #[error("item height for {label:?} must be positive (got {height_m} m)")]
    BadItemHeight { label: String, height_m: f32 },
}

/// Worker cadences, in seconds.
///
/// The object loop runs at `object_idle_s` while searching and speeds up to
/// `object_tracking_s` once an anchor is committed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerIntervals {
    pub object_idle_s: f32,
    pub object_tracking_s: f32,
    pub hand_s: f32,
    pub stabilizer_s: f32,
    pub bracelet_s: f32,
}

impl Default for WorkerIntervals {
    fn default() -> Self {
        WorkerIntervals {
            object_idle_s: 0.25,
            object_tracking_s: 0.2,
            hand_s: 0.25,
            stabilizer_s: 0.5,
            bracelet_s: 0.5,
        }
    }
}

impl WorkerIntervals {
    pub fn object_idle(&self) -> Duration {
        Duration::from_secs_f32(self.object_idle_s)
    }

    pub fn object_tracking(&self) -> Duration {
        Duration::from_secs_f32(self.object_tracking_s)
    }

    pub fn hand(&self) -> Duration {
        Duration::from_secs_f32(self.hand_s)
    }

    pub fn stabilizer(&self) -> Duration {
        Duration::from_secs_f32(self.stabilizer_s)
    }

    pub fn bracelet(&self) -> Duration {
        Duration::from_secs_f32(self.bracelet_s)
    }
}

/// Everything a guidance session needs to know up front.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Detector label of the object being sought.
    pub object_label: String,
    pub vertical_curve: VerticalCurve,
    pub vertical_slope: f32,
    pub depth_slope: f32,
    pub holding_hand: HoldingHand,
    pub feedback_mode: FeedbackMode,
    pub bracelet_bucketing: BraceletBucketing,
    /// Spoken directional guidance on top of the continuous channel.
    pub oral_feedback: bool,
    pub default_inter_beep_s: f32,
    pub min_inter_beep_s: f32,
    pub intervals: WorkerIntervals,
    /// Per-axis detection spread, in view pixels, below which the detection
    /// stream is steady enough to commit an anchor.
    pub stability_std_dev_px: f32,
    /// Extra label → physical height entries merged into the catalog.
    pub custom_item_heights_m: Vec<(String, f32)>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            object_label: "bottle".to_string(),
            vertical_curve: VerticalCurve::Step,
            vertical_slope: 1.0,
            depth_slope: 1.0,
            holding_hand: HoldingHand::Right,
            feedback_mode: FeedbackMode::Sonification,
            bracelet_bucketing: BraceletBucketing::Cardinal,
            oral_feedback: true,
            default_inter_beep_s: 1.0,
            min_inter_beep_s: 0.1,
            intervals: WorkerIntervals::default(),
            stability_std_dev_px: 12.0,
            custom_item_heights_m: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on values that would misbehave mid-session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.object_label.is_empty() {
            return Err(ConfigError::EmptyLabel);
        }
        let positives: [(&'static str, f32); 9] = [
            ("vertical_slope", self.vertical_slope),
            ("depth_slope", self.depth_slope),
            ("default_inter_beep_s", self.default_inter_beep_s),
            ("min_inter_beep_s", self.min_inter_beep_s),
            ("stability_std_dev_px", self.stability_std_dev_px),
            ("intervals.object_idle_s", self.intervals.object_idle_s),
            ("intervals.object_tracking_s", self.intervals.object_tracking_s),
            ("intervals.hand_s", self.intervals.hand_s),
            ("intervals.stabilizer_s", self.intervals.stabilizer_s),
        ];
        for (name, value) in positives {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.feedback_mode == FeedbackMode::Bracelet && self.intervals.bracelet_s <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "intervals.bracelet_s",
                value: self.intervals.bracelet_s,
            });
        }
        if self.min_inter_beep_s >= self.default_inter_beep_s {
            return Err(ConfigError::InvertedCadence {
                min_s: self.min_inter_beep_s,
                default_s: self.default_inter_beep_s,
            });
        }
        for (label, height_m) in &self.custom_item_heights_m {
            if *height_m <= 0.0 {
                return Err(ConfigError::BadItemHeight {
                    label: label.clone(),
                    height_m: *height_m,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn mapper_config(&self) -> MapperConfig {
        MapperConfig {
            mode: self.feedback_mode,
            vertical_curve: self.vertical_curve,
            vertical_slope: self.vertical_slope,
            depth_slope: self.depth_slope,
            default_inter_beep_s: self.default_inter_beep_s,
            min_inter_beep_s: self.min_inter_beep_s,
            bucketing: self.bracelet_bucketing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_cadence_is_rejected() {
        let config = SessionConfig {
            min_inter_beep_s: 1.0,
            default_inter_beep_s: 0.5,
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedCadence { .. })
        ));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        let config = SessionConfig {
            intervals: WorkerIntervals {
                hand_s: 0.0,
                ..WorkerIntervals::default()
            },
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name, .. }) if name == "intervals.hand_s"
        ));
    }

    #[test]
    fn json_round_trip_with_unknown_curve_fails() {
        let config = SessionConfig::from_json(
            r#"{"object_label": "cup", "vertical_curve": "cubic", "holding_hand": "left"}"#,
        )
        .unwrap();
        assert_eq!(config.vertical_curve, VerticalCurve::Cubic);
        assert_eq!(config.holding_hand, HoldingHand::Left);

        assert!(matches!(
            SessionConfig::from_json(r#"{"vertical_curve": "triangle"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn bad_custom_height_is_rejected() {
        let config = SessionConfig {
            custom_item_heights_m: vec![("jar".to_string(), -0.1)],
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BadItemHeight { .. })
        ));
    }
}
