//! Feedback mapping: spatial target relation → audio, bracelet and speech.

mod bracelet;
mod mapper;
mod output;

pub use bracelet::{
    bracelet_message, cardinal_state, octant_state, rotate_for_hand, BraceletBucketing,
    BraceletState, HoldingHand,
};
pub use mapper::{
    compass_phrase, CenteringUpdate, CurveParseError, FeedbackMapper, FeedbackParams, FeedbackMode,
    MapperConfig, VerticalCurve, HYSTERESIS_MARGIN_PX, MAX_PITCH,
};
pub use output::{Cue, Output, SEARCHING_MESSAGE};
