//! Raw astronomical camera frames to viewable color images.
//!
//! [`image_pipeline`] decodes FITS or camera RAW captures and debayers them
//! into 8-bit RGB PNG or TIFF files. [`capture`] drives a capture source
//! frame by frame and persists every delivered exposure.

pub mod capture;
pub mod image_pipeline;
pub mod logger;
