//! Pipeline conversions module
//!
//! This module contains orchestration logic for raw frame conversions.

mod raw_to_rgb;


pub use raw_to_rgb::RawToRgbPipeline;
