//! Core types and utilities for the sight guidance engine.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete detector, camera session or audio backend.

mod buffer;
mod camera;
mod catalog;
mod geometry;
mod logger;
mod viewport;

pub use buffer::PositionBuffer;
pub use camera::{CameraPose, PoseSnapshot, Ray};
pub use catalog::ItemCatalog;
pub use geometry::{
    angle_degrees, distance2, distance3, distance_along_ray, normalize, unproject_at_depth,
    DEPTH_JUMP_TOLERANCE,
};
pub use viewport::Viewport;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
