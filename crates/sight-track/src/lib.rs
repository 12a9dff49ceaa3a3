//! Detection ingest and target tracking for the sight guidance engine.
//!
//! Raw detector output (bounding boxes, hand keypoints) comes in as
//! normalized observations; this crate turns them into view-space target
//! metrics, runs the detection → tracking state machine around a persisted
//! 3D anchor, and keeps that anchor consistent over time.

mod ingest;
mod stabilizer;
mod state;

pub use ingest::{
    ingest_hand, ingest_object, FrameSize, HandKeypoints, HandSample, Keypoint, NormalizedRect,
    Observation, TargetMetrics, MIN_CONFIDENCE, SENSOR_OFFSET,
};
pub use stabilizer::{Correction, PositionStabilizer, StabilizerParams, DEPTH_DRIFT_TOLERANCE};
pub use state::{
    AnchorProjection, TargetAnchor, TargetTracker, TrackingState, REPROJECTION_TOLERANCE_PX,
};
