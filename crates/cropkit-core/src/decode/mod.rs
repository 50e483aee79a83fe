//! Sampled decode pipeline.
//!
//! This module provides:
//! - Image sources with a bounds-only probe and optional region decoding
//! - Sample-size selection from the requested size and texture limit
//! - Bounded out-of-memory backoff for full and region decodes
//! - EXIF orientation extraction
//! - Post-crop resize policies
//!
//! # Memory Model
//!
//! Allocation failure is an ordinary error here. Every pixel buffer is
//! allocated through a [`MemoryBudget`]; exceeding it yields
//! [`DecodeError::ResourceExhausted`], which the backoff loops answer by
//! doubling the sample size.
//!
//! # Examples
//!
//! ```ignore
//! use cropkit_core::decode::{decode_with_backoff, EncodedImage};
//! use cropkit_core::CancelToken;
//!
//! let source = EncodedImage::new(std::fs::read("photo.jpg").unwrap());
//! let sampled = decode_with_backoff(&source, 1, &CancelToken::new()).unwrap();
//! println!("{}x{} at 1/{}", sampled.buffer.width, sampled.buffer.height, sampled.sample_size);
//! ```

mod orientation;
mod resize;
mod sample;
mod source;
mod types;

pub use orientation::read_orientation;
pub use resize::{apply_resize, target_dimensions, ResizePolicy};
pub use sample::{
    choose_sample_size, decode_with_backoff, region_decode_with_backoff, sample_size_for_request,
    sample_size_for_texture, BackoffError, CachedTextureLimit, FixedTextureLimit, TextureLimit,
    DEFAULT_MAX_TEXTURE_SIZE, MAX_SAMPLE_SIZE,
};
pub use source::{sampled_dimension, subsample_region, EncodedImage, ImageSource, MemoryImage};
pub use types::{
    rgb_byte_size, DecodeError, FilterType, MemoryBudget, Orientation, PixelBuffer, RgbBuffer,
    SampledImage,
};

#[cfg(test)]
pub(crate) use source::test_support;
