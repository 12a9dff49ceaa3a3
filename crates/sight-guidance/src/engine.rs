//! Deterministic guidance core.
//!
//! The engine is a single-writer state machine: one event in, a batch of
//! effector commands out. It owns the tracker, the stabilizer and the
//! feedback mapper, and never touches a thread or a clock source of its
//! own, so every scenario is testable by feeding it a script of events.

use nalgebra::Point2;

use sight_core::{CameraPose, ItemCatalog, Viewport};
use sight_feedback::{
    rotate_for_hand, Cue, FeedbackMapper, FeedbackMode, FeedbackParams, Output, SEARCHING_MESSAGE,
};
use sight_track::{
    ingest_hand, ingest_object, FrameSize, HandKeypoints, Observation, PositionStabilizer,
    StabilizerParams, TargetMetrics, TargetTracker, TrackingState,
};

use crate::config::{ConfigError, SessionConfig};

/// One unit of work for the engine.
#[derive(Clone, Debug)]
pub enum Event {
    /// Result of one object-detection tick. `None` means no detection.
    Object {
        observation: Option<Observation>,
        frame: FrameSize,
        focal_px: f32,
    },
    /// Result of one hand-detection tick.
    Hand {
        keypoints: Option<HandKeypoints>,
        frame: FrameSize,
    },
    /// Periodic anchor consistency check.
    StabilizeTick,
    /// Periodic bracelet transmission.
    TransmitTick,
    /// Back to square one, keeping the session alive.
    Reset,
    /// Wind the session down.
    Stop,
}

pub struct Engine {
    config: SessionConfig,
    viewport: Viewport,
    catalog: ItemCatalog,
    tracker: TargetTracker,
    stabilizer: PositionStabilizer,
    mapper: FeedbackMapper,
    /// Guidance reference point: scaled hand index tip, else view center.
    reference: Point2<f32>,
    hand_visible: bool,
    last_metrics: Option<TargetMetrics>,
    last_message: String,
}

impl Engine {
    pub fn new(config: SessionConfig, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut catalog = ItemCatalog::with_defaults();
        for (label, height_m) in &config.custom_item_heights_m {
            catalog.insert(label, *height_m);
        }

        let stabilizer = PositionStabilizer::new(StabilizerParams {
            stability_std_dev_px: config.stability_std_dev_px,
            ..StabilizerParams::default()
        });
        let mapper = FeedbackMapper::new(config.mapper_config());
        let reference = viewport.center();

        Ok(Engine {
            config,
            viewport,
            catalog,
            tracker: TargetTracker::new(),
            stabilizer,
            mapper,
            reference,
            hand_visible: false,
            last_metrics: None,
            last_message: String::new(),
        })
    }

    /// Outputs announcing a fresh session.
    pub fn start(&self) -> Vec<Output> {
        vec![Output::Speak(SEARCHING_MESSAGE.to_string())]
    }

    #[inline]
    pub fn tracking_state(&self) -> TrackingState {
        self.tracker.state()
    }

    #[inline]
    pub fn is_tracking(&self) -> bool {
        self.tracker.state() == TrackingState::Tracking
    }

    #[inline]
    pub fn reference_point(&self) -> Point2<f32> {
        self.reference
    }

    /// Advance the state machine by one event.
    ///
    /// `pose` comes from the pose boundary; `None` (no world tracking this
    /// tick) skips every pose-dependent step and is never an error.
    pub fn handle(&mut self, event: Event, pose: Option<&dyn CameraPose>) -> Vec<Output> {
        match event {
            Event::Object {
                observation,
                frame,
                focal_px,
            } => self.on_object(observation, frame, focal_px, pose),
            Event::Hand { keypoints, frame } => self.on_hand(keypoints, frame),
            Event::StabilizeTick => self.on_stabilize(pose),
            Event::TransmitTick => self.on_transmit(),
            Event::Reset => self.on_reset(),
            Event::Stop => {
                self.tracker.stop();
                Vec::new()
            }
        }
    }

    fn on_object(
        &mut self,
        observation: Option<Observation>,
        frame: FrameSize,
        focal_px: f32,
        pose: Option<&dyn CameraPose>,
    ) -> Vec<Output> {
        let mut out = Vec::new();
        if self.tracker.state() == TrackingState::Stopped {
            return out;
        }

        let metrics = observation
            .filter(|obs| obs.label == self.config.object_label)
            .and_then(|obs| {
                ingest_object(&obs, frame, &self.viewport, &self.catalog, focal_px)
            });

        match self.tracker.state() {
            TrackingState::Detection => {
                let Some(m) = metrics else {
                    self.last_metrics = None;
                    let params = self.mapper.neutral_params();
                    self.push_audio(&mut out, params);
                    return out;
                };
                self.mapper.set_target_extent(m.width_px, m.height_px);
                out.push(Output::Vibrate);
                self.stabilizer.observe(m.center);

                if self.stabilizer.is_stable() {
                    if let Some(pose) = pose {
                        if self.tracker.try_acquire(m.center, m.depth_m, pose) {
                            let cm = (m.depth_m * 100.0).round() as i32;
                            out.push(Output::Speak(format!(
                                "Distance from target: {cm} centimeters"
                            )));
                        }
                    }
                }

                // Continuous guidance starts with tracking; while still
                // searching the audio stays neutral.
                let params = self.mapper.neutral_params();
                self.push_audio(&mut out, params);
                self.last_metrics = Some(m);
            }
            TrackingState::Tracking => {
                // Fresh detections feed the stabilizer and the deadbands;
                // the guided point is always the anchor projection.
                if let Some(m) = metrics {
                    self.mapper.set_target_extent(m.width_px, m.height_px);
                    self.last_metrics = Some(m);
                }
                let Some(pose) = pose else {
                    return out;
                };
                let Some(proj) = self.tracker.project(pose, &self.viewport) else {
                    return out;
                };

                if proj.lost_edge {
                    out.push(Output::PlayCue(Cue::TargetLost));
                    let was = self.mapper.direction_phrase();
                    if self.config.oral_feedback && !was.is_empty() {
                        out.push(Output::Speak(format!("Out of view, was {was}")));
                    }
                }

                if proj.in_view {
                    let update = self.mapper.assist(self.reference, proj.point);
                    if let Some(cue) = update.cue {
                        out.push(Output::PlayCue(cue));
                    }
                    if self.config.oral_feedback && update.message != self.last_message {
                        self.last_message = update.message.clone();
                        out.push(Output::Speak(update.message));
                    }
                    let params = self.mapper.update(
                        self.reference,
                        proj.point,
                        self.tracker.anchor_distance(),
                    );
                    self.push_audio(&mut out, params);
                } else {
                    let params = self.mapper.neutral_params();
                    self.push_audio(&mut out, params);
                }
            }
            TrackingState::Stopped => {}
        }
        out
    }

    fn on_hand(&mut self, keypoints: Option<HandKeypoints>, frame: FrameSize) -> Vec<Output> {
        let mut out = Vec::new();
        if self.tracker.state() == TrackingState::Stopped {
            return out;
        }
        match keypoints.as_ref().and_then(|k| ingest_hand(k, frame)) {
            Some(sample) => {
                self.mapper.hand_present(sample.size_px);
                self.reference = self.viewport.scale_point(sample.index_tip);
                if !self.hand_visible {
                    self.hand_visible = true;
                    out.push(Output::Speak("Hand".to_string()));
                }
            }
            None => {
                self.mapper.hand_absent();
                self.reference = self.viewport.center();
                if self.hand_visible {
                    self.hand_visible = false;
                    out.push(Output::Speak("Frame".to_string()));
                }
            }
        }
        out
    }

    fn on_stabilize(&mut self, pose: Option<&dyn CameraPose>) -> Vec<Output> {
        if self.tracker.state() == TrackingState::Tracking {
            if let (Some(metrics), Some(pose)) = (self.last_metrics, pose) {
                let _ = self.stabilizer.stabilize(&mut self.tracker, &metrics, pose);
            }
        }
        Vec::new()
    }

    fn on_transmit(&mut self) -> Vec<Output> {
        // The wearable only gets frames while an anchor is being guided.
        if self.config.feedback_mode != FeedbackMode::Bracelet
            || self.tracker.state() != TrackingState::Tracking
        {
            return Vec::new();
        }
        let mut state = self.mapper.bracelet_state();
        // The compass relabeling only applies while the reaching hand is
        // away from the device.
        if !self.hand_visible {
            state = rotate_for_hand(state, self.config.holding_hand);
        }
        let duration_ms = self.mapper.inter_beep().as_millis() as u32;
        vec![Output::Bracelet { state, duration_ms }]
    }

    fn on_reset(&mut self) -> Vec<Output> {
        self.tracker.reset();
        self.stabilizer.reset();
        self.mapper.reset();
        self.reference = self.viewport.center();
        self.hand_visible = false;
        self.last_metrics = None;
        self.last_message.clear();
        log::info!("session reset");
        vec![
            Output::Speak("Resetting".to_string()),
            Output::Speak(SEARCHING_MESSAGE.to_string()),
        ]
    }

    fn push_audio(&self, out: &mut Vec<Output>, params: FeedbackParams) {
        if self.config.feedback_mode == FeedbackMode::Sonification {
            out.push(Output::SetAudio {
                pitch: params.pitch,
                pan: params.pan,
                inter_beep: params.inter_beep,
            });
        }
    }
}
