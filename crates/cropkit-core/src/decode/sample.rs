//! Sample-size selection and out-of-memory backoff.
//!
//! Decoding is attempted at a power-of-two sample size. When the source
//! reports [`DecodeError::ResourceExhausted`], the sample size doubles and the
//! decode is retried, up to [`MAX_SAMPLE_SIZE`]. Cancellation is checked
//! before every attempt.

use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

use super::source::ImageSource;
use super::{DecodeError, SampledImage};
use crate::geometry::PixelRect;
use crate::task::CancelToken;

/// Largest sample size a backoff loop will try.
pub const MAX_SAMPLE_SIZE: u32 = 512;

/// Texture size assumed when the platform cannot report one.
pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 2048;

/// Why a backoff loop gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    #[error("Out of memory after {attempts} attempts (last sample size {last_sample_size})")]
    Exhausted { attempts: u32, last_sample_size: u32 },

    #[error(transparent)]
    Decode(DecodeError),

    #[error("Decode cancelled")]
    Cancelled,
}

/// Smallest power of two that brings a `width` x `height` image near the
/// requested size without going below it.
///
/// A zero request means "no preference" and yields 1.
pub fn sample_size_for_request(width: u32, height: u32, req_width: u32, req_height: u32) -> u32 {
    if req_width == 0 || req_height == 0 {
        return 1;
    }
    let mut sample_size = 1u32;
    if height > req_height || width > req_width {
        while height / 2 / sample_size > req_height && width / 2 / sample_size > req_width {
            sample_size *= 2;
        }
    }
    sample_size
}

/// Smallest power of two that keeps both sides within `max_texture_size`.
pub fn sample_size_for_texture(width: u32, height: u32, max_texture_size: u32) -> u32 {
    let max = max_texture_size.max(1);
    let mut sample_size = 1u32;
    while height / sample_size > max || width / sample_size > max {
        sample_size *= 2;
    }
    sample_size
}

/// Sample size satisfying both the requested output size and the texture limit.
///
/// # Example
///
/// ```ignore
/// assert_eq!(choose_sample_size(4000, 3000, 1000, 750, 2048), 2);
/// ```
pub fn choose_sample_size(
    width: u32,
    height: u32,
    req_width: u32,
    req_height: u32,
    max_texture_size: u32,
) -> u32 {
    sample_size_for_request(width, height, req_width, req_height)
        .max(sample_size_for_texture(width, height, max_texture_size))
}

/// Reports the largest texture the display side can upload.
pub trait TextureLimit: Send + Sync {
    /// `None` if the capability cannot be queried.
    fn query(&self) -> Option<u32>;
}

/// A texture limit known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTextureLimit(pub u32);

impl TextureLimit for FixedTextureLimit {
    fn query(&self) -> Option<u32> {
        Some(self.0)
    }
}

impl<T: TextureLimit + ?Sized> TextureLimit for Box<T> {
    fn query(&self) -> Option<u32> {
        (**self).query()
    }
}

/// Queries the wrapped limit once and caches the answer, never reporting less
/// than [`DEFAULT_MAX_TEXTURE_SIZE`].
pub struct CachedTextureLimit<T> {
    inner: T,
    cached: OnceLock<u32>,
}

impl<T: TextureLimit> CachedTextureLimit<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            cached: OnceLock::new(),
        }
    }

    pub fn max_texture_size(&self) -> u32 {
        *self.cached.get_or_init(|| {
            self.inner
                .query()
                .map_or(DEFAULT_MAX_TEXTURE_SIZE, |size| size.max(DEFAULT_MAX_TEXTURE_SIZE))
        })
    }
}

impl Default for CachedTextureLimit<FixedTextureLimit> {
    fn default() -> Self {
        Self::new(FixedTextureLimit(DEFAULT_MAX_TEXTURE_SIZE))
    }
}

/// Run `attempt` with doubling sample sizes until it stops reporting
/// resource exhaustion.
fn with_backoff<F>(
    initial_sample_size: u32,
    cancel: &CancelToken,
    what: &str,
    mut attempt: F,
) -> Result<SampledImage, BackoffError>
where
    F: FnMut(u32) -> Result<super::RgbBuffer, DecodeError>,
{
    let mut sample_size = initial_sample_size.max(1);
    let mut attempts = 0u32;
    while sample_size <= MAX_SAMPLE_SIZE {
        if cancel.is_cancelled() {
            debug!(what, sample_size, "decode cancelled before attempt");
            return Err(BackoffError::Cancelled);
        }
        attempts += 1;
        match attempt(sample_size) {
            Ok(buffer) => {
                return Ok(SampledImage {
                    buffer,
                    sample_size,
                })
            }
            Err(e) if e.is_resource_exhausted() => {
                debug!(what, sample_size, attempts, "resource exhausted, doubling sample size");
                sample_size = sample_size.saturating_mul(2);
            }
            Err(e) => return Err(BackoffError::Decode(e)),
        }
    }
    Err(BackoffError::Exhausted {
        attempts,
        last_sample_size: sample_size / 2,
    })
}

/// Decode the whole source, doubling the sample size on resource exhaustion.
pub fn decode_with_backoff(
    source: &dyn ImageSource,
    initial_sample_size: u32,
    cancel: &CancelToken,
) -> Result<SampledImage, BackoffError> {
    with_backoff(initial_sample_size, cancel, "full decode", |sample_size| {
        source.decode(sample_size)
    })
}

/// Decode `region` of the source, doubling the sample size on resource
/// exhaustion. The bound is independent of any full-decode backoff.
pub fn region_decode_with_backoff(
    source: &dyn ImageSource,
    region: PixelRect,
    initial_sample_size: u32,
    cancel: &CancelToken,
) -> Result<SampledImage, BackoffError> {
    with_backoff(initial_sample_size, cancel, "region decode", |sample_size| {
        source.decode_region(region, sample_size)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::source::test_support::*;
    use crate::decode::MemoryImage;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_request_sample_size() {
        assert_eq!(sample_size_for_request(4000, 3000, 4000, 3000), 1);
        assert_eq!(sample_size_for_request(4000, 3000, 2000, 1500), 1);
        assert_eq!(sample_size_for_request(4000, 3000, 1000, 750), 2);
        assert_eq!(sample_size_for_request(4000, 3000, 999, 749), 4);
        assert_eq!(sample_size_for_request(4000, 3000, 0, 0), 1);
    }

    #[test]
    fn test_texture_sample_size() {
        assert_eq!(sample_size_for_texture(2048, 2048, 2048), 1);
        assert_eq!(sample_size_for_texture(2049, 100, 2048), 2);
        assert_eq!(sample_size_for_texture(9000, 100, 2048), 8);
    }

    #[test]
    fn test_choose_takes_larger() {
        assert_eq!(choose_sample_size(8000, 6000, 8000, 6000, 2048), 4);
        assert_eq!(choose_sample_size(1000, 1000, 100, 100, 4096), 8);
    }

    struct CountingLimit {
        calls: AtomicU32,
        answer: Option<u32>,
    }

    impl TextureLimit for CountingLimit {
        fn query(&self) -> Option<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[test]
    fn test_cached_texture_limit_queries_once() {
        let limit = CachedTextureLimit::new(CountingLimit {
            calls: AtomicU32::new(0),
            answer: Some(4096),
        });
        assert_eq!(limit.max_texture_size(), 4096);
        assert_eq!(limit.max_texture_size(), 4096);
        assert_eq!(limit.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_texture_limit_floor() {
        let small = CachedTextureLimit::new(FixedTextureLimit(512));
        assert_eq!(small.max_texture_size(), DEFAULT_MAX_TEXTURE_SIZE);

        let unknown = CachedTextureLimit::new(CountingLimit {
            calls: AtomicU32::new(0),
            answer: None,
        });
        assert_eq!(unknown.max_texture_size(), DEFAULT_MAX_TEXTURE_SIZE);
    }

    #[test]
    fn test_decode_backoff_succeeds_after_failures() {
        let source = FlakySource::new(MemoryImage::new(gradient(64, 64)), 2);
        let result = decode_with_backoff(&source, 1, &CancelToken::new()).unwrap();
        assert_eq!(result.sample_size, 4);
        assert_eq!((result.buffer.width, result.buffer.height), (16, 16));
    }

    #[test]
    fn test_backoff_bound() {
        let source = FlakySource::new(MemoryImage::new(gradient(8, 8)), u32::MAX);
        let result = decode_with_backoff(&source, 1, &CancelToken::new());
        assert_eq!(
            result,
            Err(BackoffError::Exhausted {
                attempts: 10,
                last_sample_size: 512
            })
        );
    }

    #[test]
    fn test_backoff_does_not_retry_corrupt() {
        let result = decode_with_backoff(&CorruptSource, 1, &CancelToken::new());
        assert!(matches!(
            result,
            Err(BackoffError::Decode(DecodeError::CorruptedFile(_)))
        ));
    }

    #[test]
    fn test_backoff_cancelled() {
        let source = FlakySource::new(MemoryImage::new(gradient(8, 8)), 0);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            decode_with_backoff(&source, 1, &cancel),
            Err(BackoffError::Cancelled)
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_region_backoff_unsupported_is_not_retried() {
        let source = FlakySource::new(MemoryImage::new(gradient(8, 8)), 0).without_region();
        let result =
            region_decode_with_backoff(&source, PixelRect::new(0, 0, 4, 4), 1, &CancelToken::new());
        assert_eq!(
            result,
            Err(BackoffError::Decode(DecodeError::RegionUnsupported))
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decode::source::test_support::*;
    use crate::decode::MemoryImage;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_no_downsampling_when_fits(
            w in 1u32..=2048,
            h in 1u32..=2048,
        ) {
            prop_assert_eq!(choose_sample_size(w, h, w, h, 2048), 1);
        }

        #[test]
        fn prop_sample_size_is_power_of_two(
            w in 1u32..20000,
            h in 1u32..20000,
            rw in 0u32..5000,
            rh in 0u32..5000,
        ) {
            let s = choose_sample_size(w, h, rw, rh, 2048);
            prop_assert!(s.is_power_of_two());
            prop_assert!(w / s <= 2048 && h / s <= 2048);
        }

        #[test]
        fn prop_region_backoff_doubles_per_failure(
            failures in 0u32..6,
            initial_exp in 0u32..3,
        ) {
            let initial = 1u32 << initial_exp;
            let source = FlakySource::new(MemoryImage::new(gradient(64, 64)), failures);
            let result = region_decode_with_backoff(
                &source,
                PixelRect::new(0, 0, 64, 64),
                initial,
                &CancelToken::new(),
            ).unwrap();
            prop_assert_eq!(result.sample_size, initial << failures);
        }
    }
}
