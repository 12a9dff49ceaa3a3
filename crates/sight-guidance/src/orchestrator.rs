//! Threaded shell around the engine.
//!
//! Four periodic producer threads poll the boundaries and send typed events
//! over a channel; one consumer loop drives the engine and forwards its
//! outputs to the effector. The engine itself is single-threaded, so no
//! state is shared beyond two atomic flags.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sight_core::CameraPose;
use sight_feedback::{bracelet_message, FeedbackMode, Output};

use crate::boundary::{Effector, PoseProvider, TargetDetector};
use crate::config::{ConfigError, SessionConfig};
use crate::engine::{Engine, Event};

/// Flags observable by every worker before its next tick.
struct ControlFlags {
    running: AtomicBool,
    /// Switches the object loop between its idle and tracking cadence.
    tracking: AtomicBool,
}

/// Handle to a running guidance session.
///
/// Dropping the handle without calling [`stop`](GuidanceSession::stop)
/// stops the workers too, but without joining them.
pub struct GuidanceSession {
    sender: Sender<Event>,
    flags: Arc<ControlFlags>,
    workers: Vec<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl GuidanceSession {
    /// Validate the configuration, announce the session and start the
    /// worker threads.
    pub fn start(
        config: SessionConfig,
        viewport: sight_core::Viewport,
        detector: Arc<dyn TargetDetector>,
        poses: Arc<dyn PoseProvider>,
        effector: Arc<dyn Effector>,
    ) -> Result<Self, ConfigError> {
        let engine = Engine::new(config.clone(), viewport)?;
        dispatch(engine.start(), &effector);

        let flags = Arc::new(ControlFlags {
            running: AtomicBool::new(true),
            tracking: AtomicBool::new(false),
        });
        let (sender, receiver) = mpsc::channel::<Event>();
        let mut workers = Vec::new();

        let intervals = config.intervals;

        {
            let flags = Arc::clone(&flags);
            let detector = Arc::clone(&detector);
            let sender = sender.clone();
            workers.push(spawn_worker("object-detect", move || {
                while flags.running.load(Ordering::Relaxed) {
                    let interval = if flags.tracking.load(Ordering::Relaxed) {
                        intervals.object_tracking()
                    } else {
                        intervals.object_idle()
                    };
                    thread::sleep(interval);
                    let event = Event::Object {
                        observation: detector.detect_target(),
                        frame: detector.frame_size(),
                        focal_px: detector.focal_length(),
                    };
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            }));
        }

        {
            let flags = Arc::clone(&flags);
            let detector = Arc::clone(&detector);
            let sender = sender.clone();
            workers.push(spawn_worker("hand-detect", move || {
                while flags.running.load(Ordering::Relaxed) {
                    thread::sleep(intervals.hand());
                    let event = Event::Hand {
                        keypoints: detector.detect_hand(),
                        frame: detector.frame_size(),
                    };
                    if sender.send(event).is_err() {
                        break;
                    }
                }
            }));
        }

        {
            let flags = Arc::clone(&flags);
            let sender = sender.clone();
            workers.push(spawn_worker("stabilizer", move || {
                while flags.running.load(Ordering::Relaxed) {
                    thread::sleep(intervals.stabilizer());
                    if sender.send(Event::StabilizeTick).is_err() {
                        break;
                    }
                }
            }));
        }

        if config.feedback_mode == FeedbackMode::Bracelet {
            let flags = Arc::clone(&flags);
            let sender = sender.clone();
            workers.push(spawn_worker("bracelet-transmit", move || {
                while flags.running.load(Ordering::Relaxed) {
                    thread::sleep(intervals.bracelet());
                    if sender.send(Event::TransmitTick).is_err() {
                        break;
                    }
                }
            }));
        }

        let consumer = {
            let flags = Arc::clone(&flags);
            let effector = Arc::clone(&effector);
            spawn_worker("guidance-loop", move || {
                let mut engine = engine;
                for event in receiver {
                    let is_stop = matches!(event, Event::Stop);
                    let pose = poses.current_pose();
                    let pose_ref = pose.as_ref().map(|p| p as &dyn CameraPose);
                    let outputs = engine.handle(event, pose_ref);
                    flags
                        .tracking
                        .store(engine.is_tracking(), Ordering::Relaxed);
                    dispatch(outputs, &effector);
                    if is_stop {
                        break;
                    }
                }
            })
        };

        Ok(GuidanceSession {
            sender,
            flags,
            workers,
            consumer: Some(consumer),
        })
    }

    /// Restart the search without tearing the session down.
    pub fn reset(&self) {
        let _ = self.sender.send(Event::Reset);
    }

    /// Stop every worker and join them.
    pub fn stop(mut self) {
        self.flags.running.store(false, Ordering::Relaxed);
        let _ = self.sender.send(Event::Stop);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.join();
        }
    }
}

impl Drop for GuidanceSession {
    fn drop(&mut self) {
        self.flags.running.store(false, Ordering::Relaxed);
    }
}

fn spawn_worker(name: &'static str, body: impl FnOnce() + Send + 'static) -> JoinHandle<()> {
    thread::spawn(move || {
        log::debug!("{name} worker started");
        body();
        log::debug!("{name} worker stopped");
    })
}

/// Forward one output batch to the effector.
///
/// Speech is dispatched on a detached thread so a slow synthesizer never
/// delays the haptic or audio commands sent in the same batch.
fn dispatch(outputs: Vec<Output>, effector: &Arc<dyn Effector>) {
    for output in outputs {
        match output {
            Output::Speak(text) => {
                let effector = Arc::clone(effector);
                thread::spawn(move || effector.speak(&text));
            }
            Output::PlayCue(cue) => effector.play_cue(cue),
            Output::SetAudio {
                pitch,
                pan,
                inter_beep,
            } => effector.set_audio(pitch, pan, inter_beep),
            Output::Vibrate => effector.vibrate(),
            Output::Bracelet { state, duration_ms } => {
                effector.send_bracelet(&bracelet_message(state, duration_ms));
            }
        }
    }
}
