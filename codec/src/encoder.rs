use std::ffi::c_int;

use crate::{
    ctl::{dispatch, Application, CtlValue, EncoderCtl},
    decoder::check_layout,
    engine::{Backend, EncoderHandle},
    error::check,
    pcm, Error,
};

/// Upper bound for one encoded packet at every supported configuration.
pub const MAX_PACKET_SIZE: usize = 4000;

/// One native encoder instance.
///
/// Every method calls into the engine and may block; do not call them while
/// holding a lock other threads depend on. The application profile given
/// at creation can only be changed later through
/// [`EncoderCtl::SetApplication`].
pub struct Encoder<B: Backend> {
    handle: B::Encoder,
    sample_rate: u32,
    channels: usize,
    max_packet_size: usize,
}

impl<B: Backend> Encoder<B> {
    pub fn new(
        sample_rate: u32,
        channels: usize,
        application: Application,
    ) -> Result<Self, Error> {
        log::info!(
            "create Encoder: sample rate={}, channels={}, application={:?}",
            sample_rate,
            channels,
            application
        );

        let (rate, count) = check_layout(sample_rate, channels)?;
        let handle =
            B::Encoder::create(rate, count, application.to_raw()).map_err(|status| {
                log::error!("Failed to create Encoder: status={}", status);

                Error::from_status(status).unwrap_or(Error::InternalError)
            })?;

        Ok(Self {
            handle,
            sample_rate,
            channels,
            max_packet_size: MAX_PACKET_SIZE,
        })
    }

    /// Caps the size of a single encoded packet. An invalid size leaves the
    /// current cap in place.
    pub fn set_max_packet_size(&mut self, size: usize) -> Result<(), Error> {
        if size == 0 || i32::try_from(size).is_err() {
            return Err(Error::bad_argument(format!(
                "unsupported max packet size: {}",
                size
            )));
        }

        self.max_packet_size = size;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Encodes `frames` samples per channel read from `buffers` at `offset`
    /// into one packet.
    ///
    /// `frames` must be a frame duration the engine accepts (2.5 to 120 ms).
    /// Fails with [`Error::BufferTooSmall`] when the packet would not fit in
    /// the max packet size.
    pub fn encode<C: AsRef<[f32]>>(
        &mut self,
        buffers: &[C],
        offset: usize,
        frames: usize,
    ) -> Result<Vec<u8>, Error> {
        pcm::check_channels(buffers.len(), self.channels)?;

        let frame_size = c_int::try_from(frames)
            .map_err(|_| Error::bad_argument(format!("unsupported frame count: {}", frames)))?;

        let interleaved = pcm::interleave(buffers, offset, frames)?;
        let mut packet = vec![0u8; self.max_packet_size];
        let size = check(self.handle.encode_float(&interleaved, frame_size, &mut packet))? as usize;

        packet.truncate(size);
        Ok(packet)
    }

    pub fn ctl<'a>(&mut self, request: impl Into<EncoderCtl<'a>>) -> Result<(), Error> {
        let request = request.into().request();
        log::debug!("Encoder ctl: request={}", request.opcode());

        dispatch(&mut self.handle, request)
    }

    /// Releases the native instance.
    pub fn destroy(self) {}
}

impl<B: Backend> Drop for Encoder<B> {
    fn drop(&mut self) {
        log::info!("close Encoder");
    }
}
