//! Periodic anchor consistency checks and detection smoothing.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use sight_core::{distance2, distance_along_ray, unproject_at_depth, CameraPose, PositionBuffer, Ray};

use crate::ingest::TargetMetrics;
use crate::state::{TargetTracker, TrackingState, REPROJECTION_TOLERANCE_PX};

/// Depth drift below this value is noise and never corrected.
pub const DEPTH_DRIFT_TOLERANCE: f32 = 0.01;

/// Stabilizer tuning.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StabilizerParams {
    /// Capacity of the detection position buffer.
    pub buffer_capacity: usize,
    /// Per-axis standard deviation, in view pixels, below which the
    /// detection stream counts as stable enough to commit an anchor.
    pub stability_std_dev_px: f32,
    /// Positional errors below this are noise; no correction.
    pub min_correction_px: f32,
}

impl Default for StabilizerParams {
    fn default() -> Self {
        StabilizerParams {
            buffer_capacity: 10,
            stability_std_dev_px: 12.0,
            min_correction_px: 10.0,
        }
    }
}

/// Correction committed by a stabilization tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Correction {
    /// Anchor repositioned at the fresh detection center.
    Reposition { moved_by_m: f32 },
    /// Anchor kept at its screen point but moved to a corrected depth.
    DepthOnly { new_depth_m: f32 },
}

/// Re-validates and repairs the target anchor on its own cadence.
///
/// Runs slower than the detection loop. Also owns the detection position
/// buffer consulted before an anchor is committed in the first place.
#[derive(Debug)]
pub struct PositionStabilizer {
    params: StabilizerParams,
    buffer: PositionBuffer,
    max_width: f32,
    max_height: f32,
    previous_distance: f32,
}

impl PositionStabilizer {
    pub fn new(params: StabilizerParams) -> Self {
        let buffer = PositionBuffer::new(params.buffer_capacity);
        PositionStabilizer {
            params,
            buffer,
            max_width: 0.0,
            max_height: 0.0,
            previous_distance: 0.0,
        }
    }

    #[inline]
    pub fn params(&self) -> &StabilizerParams {
        &self.params
    }

    #[inline]
    pub fn previous_distance(&self) -> f32 {
        self.previous_distance
    }

    /// Record a detection center while searching for a target.
    pub fn observe(&mut self, center: Point2<f32>) {
        self.buffer.push(center);
    }

    /// Whether the recent detection stream is steady enough to trust.
    ///
    /// Requires at least half a buffer of samples with per-axis spread
    /// under the configured threshold.
    pub fn is_stable(&self) -> bool {
        if self.buffer.len() < self.buffer.capacity() / 2 {
            return false;
        }
        match self.buffer.std_dev() {
            Some((sx, sy)) => {
                sx < self.params.stability_std_dev_px && sy < self.params.stability_std_dev_px
            }
            None => false,
        }
    }

    /// One stabilization tick against a fresh detection.
    ///
    /// Compares the anchor's screen projection with the fresh bounding-box
    /// center and commits a correction when the positional error sits in
    /// the trusted window: below `min_correction_px` is jitter, above half
    /// the box diagonal is likely a different object. Corrections also
    /// require the box to be growing past its running maxima on both axes,
    /// so a transient partial occlusion (shrinking box) never moves the
    /// anchor. Every candidate is re-validated by reprojection before it
    /// replaces the anchor position.
    pub fn stabilize(
        &mut self,
        tracker: &mut TargetTracker,
        metrics: &TargetMetrics,
        pose: &dyn CameraPose,
    ) -> Option<Correction> {
        if tracker.state() != TrackingState::Tracking {
            return None;
        }
        let anchor = tracker.anchor()?;
        let anchor_pos = anchor.world_position;

        let fresh_depth = metrics.depth_m;
        let projected = pose.project_world_point(anchor_pos);

        let error = distance2(projected, metrics.center);
        let half_w = metrics.width_px / 2.0;
        let half_h = metrics.height_px / 2.0;
        let max_error = (half_w * half_w + half_h * half_h).sqrt();
        let in_range = error >= self.params.min_correction_px && error <= max_error;

        let growing = metrics.width_px > self.max_width && metrics.height_px > self.max_height;
        let depth_drift = (fresh_depth - self.previous_distance).abs();

        let candidate = if in_range && growing {
            let anchor_depth = Ray::through_screen_point(pose, projected)
                .map(|ray| distance_along_ray(anchor_pos, &ray, self.previous_distance))
                .unwrap_or(self.previous_distance);
            unproject_at_depth(metrics.center, anchor_depth, pose)
                .map(|p| (metrics.center, p, Correction::Reposition { moved_by_m: 0.0 }))
        } else if in_range && depth_drift > DEPTH_DRIFT_TOLERANCE {
            unproject_at_depth(projected, fresh_depth, pose).map(|p| {
                (
                    projected,
                    p,
                    Correction::DepthOnly {
                        new_depth_m: fresh_depth,
                    },
                )
            })
        } else {
            None
        };

        let committed = candidate.and_then(|(placement, position, kind)| {
            let reprojected = pose.project_world_point(position);
            if (reprojected.x - placement.x).abs() >= REPROJECTION_TOLERANCE_PX
                || (reprojected.y - placement.y).abs() >= REPROJECTION_TOLERANCE_PX
            {
                log::debug!("stabilizer correction rejected by reprojection check");
                return None;
            }
            let moved_by = sight_core::distance3(anchor_pos, position);
            tracker.apply_correction(position);
            Some(match kind {
                Correction::Reposition { .. } => Correction::Reposition {
                    moved_by_m: moved_by,
                },
                depth_only => depth_only,
            })
        });

        if let Some(correction) = &committed {
            log::info!("anchor corrected: {correction:?} (error {error:.1} px)");
        }

        self.previous_distance = fresh_depth;
        if metrics.width_px > self.max_width {
            self.max_width = metrics.width_px;
        }
        if metrics.height_px > self.max_height {
            self.max_height = metrics.height_px;
        }

        committed
    }

    /// Clear every buffer and running statistic. Idempotent.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.max_width = 0.0;
        self.max_height = 0.0;
        self.previous_distance = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point2;
    use sight_core::PoseSnapshot;

    fn pose() -> PoseSnapshot {
        PoseSnapshot::looking_forward(1000.0, Point2::new(195.0, 422.0))
    }

    fn metrics(center: Point2<f32>, depth: f32) -> TargetMetrics {
        TargetMetrics {
            center,
            center_norm: Point2::new(0.5, 0.5),
            width_px: 120.0,
            height_px: 160.0,
            depth_m: depth,
        }
    }

    fn tracking_pair() -> (TargetTracker, PositionStabilizer) {
        let mut tracker = TargetTracker::new();
        assert!(tracker.try_acquire(Point2::new(200.0, 400.0), 0.6, &pose()));
        (tracker, PositionStabilizer::new(StabilizerParams::default()))
    }

    #[test]
    fn stability_gate_needs_samples_and_low_spread() {
        let mut stab = PositionStabilizer::new(StabilizerParams::default());
        assert!(!stab.is_stable());
        for _ in 0..5 {
            stab.observe(Point2::new(200.0, 400.0));
        }
        assert!(stab.is_stable());

        stab.reset();
        for i in 0..10 {
            stab.observe(Point2::new(200.0 + (i as f32) * 30.0, 400.0));
        }
        assert!(!stab.is_stable());
    }

    #[test]
    fn small_errors_are_left_alone() {
        let (mut tracker, mut stab) = tracking_pair();
        // 5 px off: inside the noise floor.
        let m = metrics(Point2::new(205.0, 400.0), 0.6);
        assert_eq!(stab.stabilize(&mut tracker, &m, &pose()), None);
    }

    #[test]
    fn huge_errors_are_untrusted() {
        let (mut tracker, mut stab) = tracking_pair();
        // Way beyond half the box diagonal: likely a different object.
        let m = metrics(Point2::new(600.0, 400.0), 0.6);
        assert_eq!(stab.stabilize(&mut tracker, &m, &pose()), None);
    }

    #[test]
    fn growing_box_with_in_range_error_repositions() {
        let (mut tracker, mut stab) = tracking_pair();
        let before = tracker.anchor().unwrap().world_position;

        // Seed the running maxima with a smaller box first (out-of-range
        // error so nothing is corrected yet).
        let seed = TargetMetrics {
            width_px: 60.0,
            height_px: 80.0,
            ..metrics(Point2::new(202.0, 400.0), 0.6)
        };
        assert_eq!(stab.stabilize(&mut tracker, &seed, &pose()), None);

        // Bigger box, 30 px positional error: full reposition.
        let m = metrics(Point2::new(230.0, 400.0), 0.6);
        let correction = stab.stabilize(&mut tracker, &m, &pose());
        assert!(matches!(correction, Some(Correction::Reposition { .. })));
        let after = tracker.anchor().unwrap().world_position;
        assert!(sight_core::distance3(before, after) > 0.0);
        // Anchor now reprojects onto the fresh detection center.
        let reprojected = pose().project_world_point(after);
        assert_relative_eq!(reprojected.x, 230.0, epsilon = 0.5);
    }

    #[test]
    fn shrinking_box_blocks_corrections() {
        let (mut tracker, mut stab) = tracking_pair();
        let big = TargetMetrics {
            width_px: 200.0,
            height_px: 260.0,
            ..metrics(Point2::new(202.0, 400.0), 0.6)
        };
        assert_eq!(stab.stabilize(&mut tracker, &big, &pose()), None);

        let before = tracker.anchor().unwrap().world_position;
        // Smaller box (partial occlusion) with an in-range error.
        let small = metrics(Point2::new(230.0, 400.0), 0.6);
        // Depth unchanged, not growing: no reposition branch fires.
        assert_eq!(stab.stabilize(&mut tracker, &small, &pose()), None);
        let after = tracker.anchor().unwrap().world_position;
        assert_relative_eq!(sight_core::distance3(before, after), 0.0);
    }

    #[test]
    fn depth_drift_alone_corrects_depth_at_same_screen_point() {
        let (mut tracker, mut stab) = tracking_pair();
        // Previous distance seeded by a first tick.
        let seed = TargetMetrics {
            width_px: 200.0,
            height_px: 260.0,
            ..metrics(Point2::new(202.0, 400.0), 0.6)
        };
        assert_eq!(stab.stabilize(&mut tracker, &seed, &pose()), None);
        assert_relative_eq!(stab.previous_distance(), 0.6);

        // Shrinking box (no reposition) but clear depth drift, error in range.
        let drifted = metrics(Point2::new(230.0, 400.0), 0.72);
        let correction = stab.stabilize(&mut tracker, &drifted, &pose());
        assert!(matches!(
            correction,
            Some(Correction::DepthOnly { new_depth_m }) if (new_depth_m - 0.72).abs() < 1e-6
        ));
        // Screen point preserved: still reprojects near the old projection.
        let after = tracker.anchor().unwrap().world_position;
        let reprojected = pose().project_world_point(after);
        assert_relative_eq!(reprojected.x, 200.0, epsilon = 0.5);
        assert_relative_eq!(reprojected.y, 400.0, epsilon = 0.5);
    }

    #[test]
    fn depth_estimates_never_jump_implausibly() {
        let pose = pose();
        let ray = Ray::through_screen_point(&pose, Point2::new(200.0, 400.0)).unwrap();
        let far = ray.point_at(1.4);
        // Candidate exceeds previous + 0.2: previous retained.
        assert_relative_eq!(distance_along_ray(far, &ray, 0.6), 0.6);
    }

    #[test]
    fn zero_buffer_capacity_never_panics() {
        let mut stab = PositionStabilizer::new(StabilizerParams {
            buffer_capacity: 0,
            ..StabilizerParams::default()
        });
        stab.observe(Point2::new(200.0, 400.0));
        // Floored to a single-slot buffer, which is trivially stable.
        assert!(stab.is_stable());
    }

    #[test]
    fn reset_clears_statistics() {
        let (_, mut stab) = tracking_pair();
        stab.observe(Point2::new(1.0, 2.0));
        stab.reset();
        stab.reset();
        assert_relative_eq!(stab.previous_distance(), 0.0);
        assert!(!stab.is_stable());
    }
}
