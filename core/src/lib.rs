#![no_std]

//! Animated 2-bit bitplane frames for a 192x63 LCD: encoding into keyframe + delta streams and
//! paced, interlaced playback onto the panel's register interface.

pub mod container;
pub mod delta;
pub mod device;
pub mod encoder;
pub mod error;
pub mod fs;
pub mod geometry;
pub mod plane;
pub mod player;
pub mod projector;
pub mod quantize;
pub mod sequence;


extern crate alloc;
