//! Conversion between planar channel buffers and the interleaved layout the
//! engine works with.
//!
//! Sample `(frame, channel)` lives at index `frame * channels + channel` of
//! an interleaved buffer.

use crate::Error;

fn window_end(offset: usize, frames: usize) -> Result<usize, Error> {
    offset
        .checked_add(frames)
        .ok_or_else(|| Error::bad_argument("offset and frame count overflow"))
}

/// Fails unless every channel can hold `frames` samples starting at `offset`.
pub(crate) fn check_window(
    lens: impl IntoIterator<Item = usize>,
    offset: usize,
    frames: usize,
) -> Result<(), Error> {
    let end = window_end(offset, frames)?;
    if lens.into_iter().any(|len| len < end) {
        return Err(Error::bad_argument(format!(
            "channel buffer is shorter than {} samples",
            end
        )));
    }

    Ok(())
}

/// Fails unless the buffer set has exactly `expected` channels.
pub(crate) fn check_channels(actual: usize, expected: usize) -> Result<(), Error> {
    if actual != expected {
        return Err(Error::bad_argument(format!(
            "wrong number of channels: expected {}, got {}",
            expected, actual
        )));
    }

    Ok(())
}

/// Reads `frames` samples from each channel starting at `offset` and lays
/// them out frame by frame.
pub fn interleave<C: AsRef<[f32]>>(
    channels: &[C],
    offset: usize,
    frames: usize,
) -> Result<Vec<f32>, Error> {
    if channels.is_empty() {
        return Err(Error::bad_argument("no channel buffers"));
    }

    check_window(channels.iter().map(|it| it.as_ref().len()), offset, frames)?;

    let count = channels.len();
    let mut interleaved = vec![0.0; count * frames];
    for (c, channel) in channels.iter().enumerate() {
        let samples = &channel.as_ref()[offset..offset + frames];
        for (i, sample) in samples.iter().enumerate() {
            interleaved[i * count + c] = *sample;
        }
    }

    Ok(interleaved)
}

/// Writes `frames` interleaved frames into the channel buffers starting at
/// `offset`. The interleaved buffer is read with a stride of
/// `channels.len()`.
pub fn deinterleave<C: AsMut<[f32]>>(
    interleaved: &[f32],
    frames: usize,
    channels: &mut [C],
    offset: usize,
) -> Result<(), Error> {
    if channels.is_empty() {
        return Err(Error::bad_argument("no channel buffers"));
    }

    let count = channels.len();
    let needed = count
        .checked_mul(frames)
        .ok_or_else(|| Error::bad_argument("frame count overflow"))?;

    if interleaved.len() < needed {
        return Err(Error::bad_argument(format!(
            "interleaved buffer holds fewer than {} frames",
            frames
        )));
    }

    check_window(channels.iter_mut().map(|it| it.as_mut().len()), offset, frames)?;

    for (c, channel) in channels.iter_mut().enumerate() {
        let samples = &mut channel.as_mut()[offset..offset + frames];
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample = interleaved[i * count + c];
        }
    }

    Ok(())
}
