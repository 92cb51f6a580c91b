//! Raw frame reading module
//!
//! This module turns container bytes (FITS primary HDUs, camera RAW files)
//! into single-channel Bayer frames.

mod reader;
mod fits_reader;
mod rawloader_reader;
pub mod types;

pub use reader::RawFrameReader;
pub use fits_reader::{FitsReader, encode_fits};
pub use rawloader_reader::RawLoaderReader;
pub use types::{CellLayout, CfaPattern, RawFrame};
