//! Burst construction helpers
//!
//! A frame is one burst for one group: sample `i` goes to channel `i`, the
//! first record carries `first` and the final record carries `last`.

use chan_protocol::{ProtocolError, SampleFormat, StreamRecord};

/// Encode one frame of signed samples
pub fn frame(format: &SampleFormat, samples: &[i32]) -> Result<Vec<StreamRecord>, ProtocolError> {
    let len = samples.len();
    samples
        .iter()
        .enumerate()
        .map(|(ch, &value)| {
            Ok(StreamRecord::new(format.from_signed(value)?, ch as u32)
                .with_first(ch == 0)
                .with_last(ch + 1 == len))
        })
        .collect()
}

/// Encode several frames back to back
pub fn frames(
    format: &SampleFormat,
    samples: &[Vec<i32>],
) -> Result<Vec<StreamRecord>, ProtocolError> {
    let mut out = Vec::new();
    for f in samples {
        out.extend(frame(format, f)?);
    }
    Ok(out)
}

/// `count` frames of `channels` samples where each channel ramps by one per
/// frame, starting from `channel * 1000`
///
/// Handy for spotting dropped or duplicated samples by eye.
pub fn ramp_frames(format: &SampleFormat, channels: u32, count: u32) -> Vec<StreamRecord> {
    (0..count)
        .flat_map(|n| {
            (0..channels).map(move |ch| {
                let raw = format.truncate(ch * 1000 + n);
                StreamRecord::new(raw, ch)
                    .with_first(ch == 0)
                    .with_last(ch + 1 == channels)
            })
        })
        .collect()
}
