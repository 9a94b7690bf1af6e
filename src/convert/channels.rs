//! Channel layout adaptation
//!
//! Destination channel `i` copies source channel `i mod N`. That covers the
//! common cases: downmix to mono keeps channel 0 (no averaging), upmix from
//! mono duplicates the one channel. Deterministic, not spatially accurate.

/// Adapt interleaved `samples` from `src_channels` to `dst_channels`.
///
/// A trailing partial frame is dropped.
pub fn adapt_channels<T: Copy>(samples: &[T], src_channels: u16, dst_channels: u16) -> Vec<T> {
    let mut out = Vec::new();
    adapt_channels_into(samples, src_channels, dst_channels, &mut out);
    out
}

/// Like [`adapt_channels`], appending into a caller-owned buffer
pub fn adapt_channels_into<T: Copy>(
    samples: &[T],
    src_channels: u16,
    dst_channels: u16,
    out: &mut Vec<T>,
) {
    let src = src_channels as usize;
    let dst = dst_channels as usize;
    if src == 0 || dst == 0 {
        return;
    }

    let frames = samples.len() / src;
    out.reserve(frames * dst);

    if src == dst {
        out.extend_from_slice(&samples[..frames * src]);
        return;
    }

    for frame in samples.chunks_exact(src) {
        out.extend((0..dst).map(|channel| frame[channel % src]));
    }
}
