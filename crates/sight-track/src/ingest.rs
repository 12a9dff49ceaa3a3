//! Turn raw detector output into view-space target metrics.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use sight_core::{ItemCatalog, Viewport};

/// Detections and keypoints below this confidence count as "no observation".
pub const MIN_CONFIDENCE: f32 = 0.3;

/// Additive correction to the reported focal length, in pixels.
///
/// The intrinsics reported by the AR session consistently underestimate the
/// effective focal length for the cropped preview; the offset was calibrated
/// against measured target distances.
pub const SENSOR_OFFSET: f32 = 100.0;

/// Axis-aligned rectangle in normalized detector coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub origin: Point2<f32>,
    pub size: Vector2<f32>,
}

impl NormalizedRect {
    /// Bounding-box center flipped into view orientation.
    ///
    /// The detector origin is bottom-left with a mirrored horizontal axis,
    /// so both axes flip: `c = 1 - (origin + size / 2)`.
    pub fn flipped_center(&self) -> Point2<f32> {
        Point2::new(
            1.0 - (self.origin.x + self.size.x / 2.0),
            1.0 - (self.origin.y + self.size.y / 2.0),
        )
    }
}

/// One object detection, as returned by the external detector boundary.
#[derive(Clone, Debug)]
pub struct Observation {
    pub bounding_box: NormalizedRect,
    pub confidence: f32,
    pub label: String,
}

/// A single hand keypoint with its per-point confidence.
#[derive(Clone, Copy, Debug)]
pub struct Keypoint {
    pub location: Point2<f32>,
    pub confidence: f32,
}

/// Hand-pose keypoints needed for guidance, in normalized coordinates.
#[derive(Clone, Copy, Debug)]
pub struct HandKeypoints {
    pub wrist: Keypoint,
    pub thumb_tip: Keypoint,
    pub index_tip: Keypoint,
    pub middle_tip: Keypoint,
    pub middle_pip: Keypoint,
}

/// Raw sensor frame size in pixels, before rotation to view orientation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: f32,
    pub height: f32,
}

/// Derived per-detection target metrics in view space.
#[derive(Clone, Copy, Debug)]
pub struct TargetMetrics {
    /// Bounding-box center in view coordinates.
    pub center: Point2<f32>,
    /// Bounding-box center in flipped normalized coordinates.
    pub center_norm: Point2<f32>,
    /// Bounding-box extent in view pixels.
    pub width_px: f32,
    pub height_px: f32,
    /// Monocular depth estimate in meters, always positive.
    pub depth_m: f32,
}

/// Validated hand sample: guidance point plus apparent hand size.
#[derive(Clone, Copy, Debug)]
pub struct HandSample {
    /// Index fingertip in normalized coordinates.
    pub index_tip: Point2<f32>,
    /// Wrist to middle-fingertip distance in sensor pixels.
    pub size_px: f32,
}

/// Compute view-space metrics for an object observation.
///
/// Returns `None` for low-confidence detections, labels without a known
/// physical height, or degenerate bounding boxes. The depth estimate uses
/// the larger bounding-box dimension as the measurement axis: the longer
/// visible dimension is less sensitive to partial occlusion. The sensor is
/// rotated relative to the view, so the height in pixels is measured
/// against the frame *width* and vice versa.
pub fn ingest_object(
    obs: &Observation,
    frame: FrameSize,
    viewport: &Viewport,
    catalog: &ItemCatalog,
    focal_px: f32,
) -> Option<TargetMetrics> {
    if obs.confidence < MIN_CONFIDENCE {
        return None;
    }
    let height_m = catalog.height_m(&obs.label)?;

    let width_norm = obs.bounding_box.size.x;
    let height_norm = obs.bounding_box.size.y;

    let max_dim_px = if height_norm > width_norm {
        height_norm * frame.width
    } else {
        width_norm * frame.height
    };
    if max_dim_px <= 0.0 {
        log::debug!("degenerate bounding box for {:?}", obs.label);
        return None;
    }

    let depth_m = (focal_px + SENSOR_OFFSET) * height_m / max_dim_px;
    if depth_m <= 0.0 {
        return None;
    }

    let center_norm = obs.bounding_box.flipped_center();
    let (width_px, height_px) = viewport.scale_extent(width_norm, height_norm);

    Some(TargetMetrics {
        center: viewport.scale_point(center_norm),
        center_norm,
        width_px,
        height_px,
        depth_m,
    })
}

/// Validate hand keypoints and derive the guidance sample.
///
/// Both the thumb tip and the index tip must clear [`MIN_CONFIDENCE`];
/// otherwise the hand counts as not detected. The hand size is the
/// wrist-to-middle-fingertip distance in sensor pixels, used downstream as
/// a reaching-distance proxy.
pub fn ingest_hand(hand: &HandKeypoints, frame: FrameSize) -> Option<HandSample> {
    if hand.thumb_tip.confidence <= MIN_CONFIDENCE || hand.index_tip.confidence <= MIN_CONFIDENCE {
        return None;
    }

    let dx = (hand.middle_tip.location.x - hand.wrist.location.x) * frame.width;
    let dy = (hand.middle_tip.location.y - hand.wrist.location.y) * frame.height;
    let size_px = (dx * dx + dy * dy).sqrt();

    Some(HandSample {
        index_tip: hand.index_tip.location,
        size_px,
    })
}
