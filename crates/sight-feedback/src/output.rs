//! Effector-facing command vocabulary.

use std::time::Duration;

use crate::bracelet::BraceletState;

/// Default guidance prompt while no target is known.
pub const SEARCHING_MESSAGE: &str = "Look around for a target object";

/// One-shot audio cues, played on state edges only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    Centered,
    Uncentered,
    TargetLost,
}

/// A single command for the effector boundary.
///
/// The engine emits batches of these per input event; delivery is
/// fire-and-forget and never blocks the next state update.
#[derive(Clone, Debug, PartialEq)]
pub enum Output {
    Speak(String),
    PlayCue(Cue),
    SetAudio {
        pitch: f32,
        pan: f32,
        inter_beep: Duration,
    },
    Vibrate,
    Bracelet {
        state: BraceletState,
        duration_ms: u32,
    },
}
