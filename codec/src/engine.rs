//! The narrow call interface to a native codec engine.
//!
//! Everything here speaks the engine's raw contract: plain integers for
//! parameters and negative integers for failures. Turning that into typed
//! values and [`crate::Error`]s is the job of the session types.
//!
//! Every method on these traits may block for as long as the engine needs.
//! Callers must not hold a lock that the rest of the process depends on
//! while one of them runs.

use std::ffi::c_int;

/// Raw form of the three control call shapes.
pub trait Control {
    /// A control request without argument, such as the state reset.
    fn reset(&mut self, request: c_int) -> c_int;

    /// A read request; the engine writes the current value into `value`.
    fn get(&mut self, request: c_int, value: &mut i32) -> c_int;

    /// A write request.
    fn set(&mut self, request: c_int, value: i32) -> c_int;
}

/// Exclusive owner of one native decoder instance. Dropping it releases the
/// instance.
pub trait DecoderHandle: Control + Send + Sized {
    fn create(sample_rate: i32, channels: c_int) -> Result<Self, c_int>;

    /// Re-initializes the instance in place. Fails with a bad argument status
    /// when `channels` exceeds the count the instance was created for.
    fn init(&mut self, sample_rate: i32, channels: c_int) -> c_int;

    /// Decodes `packet` into the interleaved `pcm` buffer. Returns the number
    /// of frames decoded, or a bad argument status when `pcm` holds fewer
    /// than `frame_size` frames.
    fn decode_float(&mut self, packet: &[u8], pcm: &mut [f32], frame_size: c_int, fec: bool)
        -> c_int;
}

/// Exclusive owner of one native encoder instance. Dropping it releases the
/// instance.
pub trait EncoderHandle: Control + Send + Sized {
    fn create(sample_rate: i32, channels: c_int, application: i32) -> Result<Self, c_int>;

    /// Encodes `frame_size` interleaved frames from `pcm` into `out`. Returns
    /// the number of bytes written, or a bad argument status when `pcm` holds
    /// fewer than `frame_size` frames.
    fn encode_float(&mut self, pcm: &[f32], frame_size: c_int, out: &mut [u8]) -> c_int;
}

/// Binds an engine family together.
pub trait Backend {
    type Decoder: DecoderHandle;
    type Encoder: EncoderHandle;

    /// Human readable engine version.
    fn version() -> String;

    /// Number of channels a compressed packet carries, or a negative status.
    /// An empty packet is invalid.
    fn packet_channels(packet: &[u8]) -> c_int;
}
