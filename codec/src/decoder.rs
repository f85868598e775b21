use std::ffi::c_int;

use crate::{
    ctl::{dispatch, DecoderCtl},
    engine::{Backend, DecoderHandle},
    error::check,
    packet, pcm, Error,
};

/// Maximum packet duration: 120 ms at 48 kHz.
const MAX_FRAMES: usize = 5760;

pub(crate) fn check_layout(sample_rate: u32, channels: usize) -> Result<(i32, c_int), Error> {
    if !(1..=2).contains(&channels) {
        return Err(Error::bad_argument(format!(
            "unsupported channel count: {}",
            channels
        )));
    }

    let sample_rate = i32::try_from(sample_rate)
        .map_err(|_| Error::bad_argument(format!("unsupported sample rate: {}", sample_rate)))?;

    Ok((sample_rate, channels as c_int))
}

/// One native decoder instance.
///
/// Every method calls into the engine and may block; do not call them while
/// holding a lock other threads depend on. The instance is released when the
/// decoder is dropped.
pub struct Decoder<B: Backend> {
    handle: B::Decoder,
    sample_rate: u32,
    channels: usize,
    // Channel count the native instance was allocated for.
    capacity: usize,
}

impl<B: Backend> Decoder<B> {
    pub fn new(sample_rate: u32, channels: usize) -> Result<Self, Error> {
        log::info!(
            "create Decoder: sample rate={}, channels={}",
            sample_rate,
            channels
        );

        let (rate, count) = check_layout(sample_rate, channels)?;
        Ok(Self {
            handle: Self::create_handle(rate, count)?,
            sample_rate,
            channels,
            capacity: channels,
        })
    }

    fn create_handle(sample_rate: i32, channels: c_int) -> Result<B::Decoder, Error> {
        B::Decoder::create(sample_rate, channels).map_err(|status| {
            log::error!("Failed to create Decoder: status={}", status);

            Error::from_status(status).unwrap_or(Error::InternalError)
        })
    }

    /// Re-initializes the decoder with a new layout.
    ///
    /// The native instance is reset in place, unless it was allocated for
    /// fewer channels than requested, in which case a new instance replaces
    /// it. Either way the decoder state afterwards is that of a fresh one.
    pub fn reinit(&mut self, sample_rate: u32, channels: usize) -> Result<(), Error> {
        log::debug!(
            "reinit Decoder: sample rate={}, channels={}",
            sample_rate,
            channels
        );

        let (rate, count) = check_layout(sample_rate, channels)?;
        if channels > self.capacity {
            self.handle = Self::create_handle(rate, count)?;
            self.capacity = channels;
        } else {
            check(self.handle.init(rate, count))?;
        }

        self.sample_rate = sample_rate;
        self.channels = channels;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Decodes one audio packet into `buffers`, one buffer per channel,
    /// writing at most `max_frames` samples per channel starting at `offset`.
    ///
    /// Returns the number of frames written. On error the contents of the
    /// buffer window are unspecified.
    pub fn decode<C: AsMut<[f32]>>(
        &mut self,
        packet: &[u8],
        buffers: &mut [C],
        offset: usize,
        max_frames: usize,
    ) -> Result<usize, Error> {
        self.decode_packet(packet, buffers, offset, max_frames, false)
    }

    /// Like [`Decoder::decode`], but recovers the previous frame from the
    /// in-band forward error correction data of `packet`.
    pub fn decode_fec<C: AsMut<[f32]>>(
        &mut self,
        packet: &[u8],
        buffers: &mut [C],
        offset: usize,
        max_frames: usize,
    ) -> Result<usize, Error> {
        self.decode_packet(packet, buffers, offset, max_frames, true)
    }

    fn decode_packet<C: AsMut<[f32]>>(
        &mut self,
        packet: &[u8],
        buffers: &mut [C],
        offset: usize,
        max_frames: usize,
        fec: bool,
    ) -> Result<usize, Error> {
        // A packet may claim a different layout than the one the instance was
        // set up with, so the layout is checked for every call.
        let channels = packet::channels::<B>(packet)?;
        pcm::check_channels(buffers.len(), channels)?;
        if channels != self.channels {
            return Err(Error::bad_argument(format!(
                "packet has {} channels, decoder is configured for {}",
                channels, self.channels
            )));
        }

        let max_frames = max_frames.min(MAX_FRAMES);
        pcm::check_window(
            buffers.iter_mut().map(|it| it.as_mut().len()),
            offset,
            max_frames,
        )?;

        let mut interleaved = vec![0.0f32; channels * max_frames];
        let frames = check(self.handle.decode_float(
            packet,
            &mut interleaved,
            max_frames as c_int,
            fec,
        ))? as usize;

        pcm::deinterleave(&interleaved, frames, buffers, offset)?;
        Ok(frames)
    }

    pub fn ctl<'a>(&mut self, request: impl Into<DecoderCtl<'a>>) -> Result<(), Error> {
        let request = request.into().request();
        log::debug!("Decoder ctl: request={}", request.opcode());

        dispatch(&mut self.handle, request)
    }

    /// Releases the native instance.
    pub fn destroy(self) {}
}

impl<B: Backend> Drop for Decoder<B> {
    fn drop(&mut self) {
        log::info!("close Decoder");
    }
}
