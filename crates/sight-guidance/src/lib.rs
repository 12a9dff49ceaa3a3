//! Guidance session facade.
//!
//! Wires the tracking pipeline and the feedback mapper behind three boundary
//! traits (detector, pose provider, effector). [`Engine`] is the pure
//! event-driven core; [`GuidanceSession`] runs it behind periodic worker
//! threads.

mod boundary;
mod config;
mod engine;
mod orchestrator;

pub use boundary::{Effector, PoseProvider, TargetDetector};
pub use config::{ConfigError, SessionConfig, WorkerIntervals};
pub use engine::{Engine, Event};
pub use orchestrator::GuidanceSession;

pub use sight_core::{CameraPose, ItemCatalog, PoseSnapshot, Viewport};
pub use sight_feedback::{
    BraceletBucketing, BraceletState, Cue, FeedbackMode, HoldingHand, Output, VerticalCurve,
};
pub use sight_track::{
    FrameSize, HandKeypoints, Keypoint, NormalizedRect, Observation, TrackingState,
};
