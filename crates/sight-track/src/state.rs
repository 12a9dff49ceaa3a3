//! Detection → tracking lifecycle for a single guided target.

use std::time::Instant;

use nalgebra::{Point2, Point3};

use sight_core::{distance_along_ray, unproject_at_depth, CameraPose, Ray, Viewport};

/// Maximum per-axis reprojection error, in view pixels, for a candidate
/// anchor to be accepted. The same bound guards both initial confirmation
/// and stabilizer corrections.
pub const REPROJECTION_TOLERANCE_PX: f32 = 10.0;

/// Lifecycle state of a guidance session's target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingState {
    /// Searching for a target; no anchor exists.
    Detection,
    /// An anchor is committed and guidance is active.
    Tracking,
    /// Session wound down; no further transitions except reset.
    Stopped,
}

/// Persisted 3D world estimate of the physical target.
#[derive(Clone, Copy, Debug)]
pub struct TargetAnchor {
    pub world_position: Point3<f32>,
    pub created_at: Instant,
    pub last_validated_at: Instant,
}

/// Result of projecting the anchor for one tick.
#[derive(Clone, Copy, Debug)]
pub struct AnchorProjection {
    /// Anchor position in view coordinates.
    pub point: Point2<f32>,
    pub in_view: bool,
    /// True exactly on the inside → outside transition.
    pub lost_edge: bool,
}

/// State machine owning the target anchor.
///
/// Invariant: an anchor exists if and only if the state is `Tracking`.
#[derive(Debug)]
pub struct TargetTracker {
    state: TrackingState,
    anchor: Option<TargetAnchor>,
    in_view: bool,
    /// Depth of the anchor along the current view ray, ray-filtered.
    anchor_distance: f32,
}

impl Default for TargetTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetTracker {
    pub fn new() -> Self {
        TargetTracker {
            state: TrackingState::Detection,
            anchor: None,
            in_view: false,
            anchor_distance: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    #[inline]
    pub fn anchor(&self) -> Option<&TargetAnchor> {
        self.anchor.as_ref()
    }

    #[inline]
    pub fn anchor_distance(&self) -> f32 {
        self.anchor_distance
    }

    /// Attempt the double-confirmation anchor commit.
    ///
    /// A provisional anchor is unprojected at `point`/`depth` and accepted
    /// only when its reprojection lands within
    /// [`REPROJECTION_TOLERANCE_PX`] of `point` on both axes. On success
    /// the state transitions to `Tracking`. A `false` return leaves the
    /// machine in `Detection`; spurious detections never create anchors.
    pub fn try_acquire(&mut self, point: Point2<f32>, depth: f32, pose: &dyn CameraPose) -> bool {
        if self.state != TrackingState::Detection || depth <= 0.0 {
            return false;
        }
        let Some(candidate) = unproject_at_depth(point, depth, pose) else {
            return false;
        };
        let reprojected = pose.project_world_point(candidate);
        if (reprojected.x - point.x).abs() >= REPROJECTION_TOLERANCE_PX
            || (reprojected.y - point.y).abs() >= REPROJECTION_TOLERANCE_PX
        {
            log::debug!(
                "anchor candidate rejected: reprojection off by ({:.1}, {:.1}) px",
                reprojected.x - point.x,
                reprojected.y - point.y
            );
            return false;
        }

        let now = Instant::now();
        self.anchor = Some(TargetAnchor {
            world_position: candidate,
            created_at: now,
            last_validated_at: now,
        });
        self.state = TrackingState::Tracking;
        self.in_view = true;
        self.anchor_distance = depth;
        log::info!("anchor committed at {depth:.3} m");
        true
    }

    /// Project the anchor for the current tick and update visibility.
    ///
    /// Going out of view raises `lost_edge` once but keeps the anchor:
    /// transient occlusion or a camera sweep must not drop tracking, and
    /// re-entering the viewport needs no reconfirmation. While in view the
    /// anchor depth is re-measured along the view ray through the
    /// ray-plausibility filter.
    pub fn project(&mut self, pose: &dyn CameraPose, viewport: &Viewport) -> Option<AnchorProjection> {
        let anchor = self.anchor.as_mut()?;
        let point = pose.project_world_point(anchor.world_position);

        let was_in_view = self.in_view;
        self.in_view = viewport.contains(point);
        let lost_edge = was_in_view && !self.in_view;

        if self.in_view {
            if let Some(ray) = Ray::through_screen_point(pose, point) {
                self.anchor_distance =
                    distance_along_ray(anchor.world_position, &ray, self.anchor_distance);
            }
        }

        Some(AnchorProjection {
            point,
            in_view: self.in_view,
            lost_edge,
        })
    }

    /// Move the anchor to a validated corrected position.
    ///
    /// Only the stabilizer calls this, after its own reprojection check.
    pub fn apply_correction(&mut self, position: Point3<f32>) {
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.world_position = position;
            anchor.last_validated_at = Instant::now();
        }
    }

    /// Back to `Detection`, destroying the anchor. Idempotent.
    pub fn reset(&mut self) {
        self.state = TrackingState::Detection;
        self.anchor = None;
        self.in_view = false;
        self.anchor_distance = 0.0;
    }

    /// Wind the session down.
    pub fn stop(&mut self) {
        self.anchor = None;
        self.in_view = false;
        self.anchor_distance = 0.0;
        self.state = TrackingState::Stopped;
    }
}
