//! Output encoding for cropped buffers.
//!
//! # Examples
//!
//! ```ignore
//! use cropkit_core::encode::{encode_output, OutputFormat};
//!
//! let bytes = encode_output(&result.buffer, OutputFormat::Jpeg { quality: 90 }).unwrap();
//! std::fs::write("crop.jpg", bytes).unwrap();
//! ```

mod output;

pub use output::{encode_output, EncodeError, OutputFormat};
