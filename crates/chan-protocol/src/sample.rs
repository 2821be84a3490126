//! Sample formats and index widths
//!
//! Payloads travel as raw bits in a `u32`. A [`SampleFormat`] describes how
//! many of those bits are meaningful and how to convert between raw bits and
//! two's-complement sample values.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Width of an audio sample on the stream unless configured otherwise
pub const DEFAULT_SAMPLE_WIDTH: u8 = 24;

/// Number of bits needed to hold any index in `0..count`
///
/// A single-channel group needs no index bits at all.
pub fn index_bits(count: u32) -> u32 {
    if count <= 1 {
        0
    } else {
        u32::BITS - (count - 1).leading_zeros()
    }
}

/// Fixed-width sample encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct SampleFormat {
    width: u8,
}

impl SampleFormat {
    /// Create a format of `width` bits (1..=32)
    pub fn new(width: u8) -> Result<Self, ProtocolError> {
        if (1..=32).contains(&width) {
            Ok(Self { width })
        } else {
            Err(ProtocolError::InvalidSampleWidth(width))
        }
    }

    /// Width in bits
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Mask covering the meaningful payload bits
    pub fn mask(&self) -> u32 {
        if self.width == 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Drop any bits above the sample width
    pub fn truncate(&self, raw: u32) -> u32 {
        raw & self.mask()
    }

    /// Smallest signed value representable
    pub fn min_signed(&self) -> i64 {
        -(1i64 << (self.width - 1))
    }

    /// Largest signed value representable
    pub fn max_signed(&self) -> i64 {
        (1i64 << (self.width - 1)) - 1
    }

    /// Interpret raw payload bits as a two's-complement sample
    pub fn sign_extend(&self, raw: u32) -> i32 {
        let shift = 32 - u32::from(self.width);
        ((raw << shift) as i32) >> shift
    }

    /// Encode a signed sample into raw payload bits
    pub fn from_signed(&self, value: i32) -> Result<u32, ProtocolError> {
        let wide = i64::from(value);
        if wide < self.min_signed() || wide > self.max_signed() {
            return Err(ProtocolError::SampleOutOfRange {
                value: wide,
                width: self.width,
            });
        }
        Ok(self.truncate(value as u32))
    }
}

impl Default for SampleFormat {
    fn default() -> Self {
        Self {
            width: DEFAULT_SAMPLE_WIDTH,
        }
    }
}

impl TryFrom<u8> for SampleFormat {
    type Error = ProtocolError;

    fn try_from(width: u8) -> Result<Self, Self::Error> {
        Self::new(width)
    }
}

impl From<SampleFormat> for u8 {
    fn from(format: SampleFormat) -> Self {
        format.width
    }
}
