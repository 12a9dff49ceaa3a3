//! Traits at the platform boundary.
//!
//! The detector, camera session and feedback hardware live outside this
//! crate; everything crosses these three seams. All of them are polled or
//! fire-and-forget, so a missing value is an `Option`, never an error.

use std::time::Duration;

use sight_core::PoseSnapshot;
use sight_feedback::Cue;
use sight_track::{FrameSize, HandKeypoints, Observation};

/// Synchronous per-tick access to the vision models.
pub trait TargetDetector: Send + Sync {
    /// Raw sensor frame size in pixels.
    fn frame_size(&self) -> FrameSize;

    /// Effective focal length in pixels for the current frame.
    fn focal_length(&self) -> f32;

    /// Best object detection for the current frame, if any.
    fn detect_target(&self) -> Option<Observation>;

    /// Hand keypoints for the current frame, if a hand is visible.
    fn detect_hand(&self) -> Option<HandKeypoints>;
}

/// Camera pose source. `None` skips the tick.
pub trait PoseProvider: Send + Sync {
    fn current_pose(&self) -> Option<PoseSnapshot>;
}

/// Feedback hardware sink.
///
/// Implementations must not block: the consumer loop calls these inline
/// between state updates.
pub trait Effector: Send + Sync {
    fn speak(&self, text: &str);
    fn play_cue(&self, cue: Cue);
    fn set_audio(&self, pitch: f32, pan: f32, inter_beep: Duration);
    fn vibrate(&self);
    /// Raw bracelet wire message, `"<state>-<durationMs>"`.
    fn send_bracelet(&self, message: &str);
}
