use std::{
    ffi::{c_int, CStr},
    ptr::NonNull,
};

use crate::{
    engine::{Backend, Control, DecoderHandle, EncoderHandle},
    sys,
};

/// The system libopus.
pub struct Libopus;

impl Backend for Libopus {
    type Decoder = LibopusDecoder;
    type Encoder = LibopusEncoder;

    fn version() -> String {
        let version = unsafe { sys::opus_get_version_string() };
        if version.is_null() {
            return String::new();
        }

        unsafe { CStr::from_ptr(version) }
            .to_string_lossy()
            .into_owned()
    }

    fn packet_channels(packet: &[u8]) -> c_int {
        // The probe reads the first byte unconditionally.
        if packet.is_empty() {
            return sys::OPUS_INVALID_PACKET;
        }

        unsafe { sys::opus_packet_get_nb_channels(packet.as_ptr()) }
    }
}

/// Whether `len` interleaved samples hold `frame_size` frames.
fn fits(len: usize, frame_size: c_int, channels: c_int) -> bool {
    match (usize::try_from(frame_size), usize::try_from(channels)) {
        (Ok(frames), Ok(channels)) if frames > 0 => frames
            .checked_mul(channels)
            .map_or(false, |samples| samples <= len),
        _ => false,
    }
}

// In the public request range, even opcodes take an `opus_int32` by value
// and odd opcodes a pointer to one. Every other opcode may expect a
// different argument and is refused before the variadic call.
fn is_read_request(request: c_int) -> bool {
    (sys::OPUS_SET_APPLICATION_REQUEST..=sys::OPUS_GET_PHASE_INVERSION_DISABLED_REQUEST)
        .contains(&request)
        && request % 2 == 1
}

fn is_write_request(request: c_int) -> bool {
    (sys::OPUS_SET_APPLICATION_REQUEST..=sys::OPUS_GET_PHASE_INVERSION_DISABLED_REQUEST)
        .contains(&request)
        && request % 2 == 0
        && request != sys::OPUS_RESET_STATE
}

pub struct LibopusDecoder {
    instance: NonNull<sys::OpusDecoder>,
    // The allocation is sized for the channel count given at creation.
    capacity: c_int,
    channels: c_int,
}

// The instance is only ever touched through `&mut self`.
unsafe impl Send for LibopusDecoder {}

impl DecoderHandle for LibopusDecoder {
    fn create(sample_rate: i32, channels: c_int) -> Result<Self, c_int> {
        let mut status = sys::OPUS_OK;
        let decoder = unsafe { sys::opus_decoder_create(sample_rate, channels, &mut status) };
        if status < sys::OPUS_OK {
            return Err(status);
        }

        NonNull::new(decoder)
            .map(|instance| Self {
                instance,
                capacity: channels,
                channels,
            })
            .ok_or(sys::OPUS_ALLOC_FAIL)
    }

    fn init(&mut self, sample_rate: i32, channels: c_int) -> c_int {
        if channels > self.capacity {
            return sys::OPUS_BAD_ARG;
        }

        let status = unsafe { sys::opus_decoder_init(self.instance.as_ptr(), sample_rate, channels) };
        if status == sys::OPUS_OK {
            self.channels = channels;
        }

        status
    }

    fn decode_float(
        &mut self,
        packet: &[u8],
        pcm: &mut [f32],
        frame_size: c_int,
        fec: bool,
    ) -> c_int {
        let Ok(len) = i32::try_from(packet.len()) else {
            return sys::OPUS_BAD_ARG;
        };

        if !fits(pcm.len(), frame_size, self.channels) {
            return sys::OPUS_BAD_ARG;
        }

        unsafe {
            sys::opus_decode_float(
                self.instance.as_ptr(),
                packet.as_ptr(),
                len,
                pcm.as_mut_ptr(),
                frame_size,
                fec as c_int,
            )
        }
    }
}

impl Control for LibopusDecoder {
    fn reset(&mut self, request: c_int) -> c_int {
        if request != sys::OPUS_RESET_STATE {
            return sys::OPUS_UNIMPLEMENTED;
        }

        unsafe { sys::opus_decoder_ctl(self.instance.as_ptr(), request) }
    }

    fn get(&mut self, request: c_int, value: &mut i32) -> c_int {
        if !is_read_request(request) {
            return sys::OPUS_UNIMPLEMENTED;
        }

        unsafe { sys::opus_decoder_ctl(self.instance.as_ptr(), request, value as *mut i32) }
    }

    fn set(&mut self, request: c_int, value: i32) -> c_int {
        if !is_write_request(request) {
            return sys::OPUS_UNIMPLEMENTED;
        }

        unsafe { sys::opus_decoder_ctl(self.instance.as_ptr(), request, value) }
    }
}

impl Drop for LibopusDecoder {
    fn drop(&mut self) {
        unsafe { sys::opus_decoder_destroy(self.instance.as_ptr()) }
    }
}

pub struct LibopusEncoder {
    instance: NonNull<sys::OpusEncoder>,
    channels: c_int,
}

unsafe impl Send for LibopusEncoder {}

impl EncoderHandle for LibopusEncoder {
    fn create(sample_rate: i32, channels: c_int, application: i32) -> Result<Self, c_int> {
        let mut status = sys::OPUS_OK;
        let encoder =
            unsafe { sys::opus_encoder_create(sample_rate, channels, application, &mut status) };
        if status < sys::OPUS_OK {
            return Err(status);
        }

        NonNull::new(encoder)
            .map(|instance| Self { instance, channels })
            .ok_or(sys::OPUS_ALLOC_FAIL)
    }

    fn encode_float(&mut self, pcm: &[f32], frame_size: c_int, out: &mut [u8]) -> c_int {
        if !fits(pcm.len(), frame_size, self.channels) {
            return sys::OPUS_BAD_ARG;
        }

        let max_data_bytes = i32::try_from(out.len()).unwrap_or(i32::MAX);

        unsafe {
            sys::opus_encode_float(
                self.instance.as_ptr(),
                pcm.as_ptr(),
                frame_size,
                out.as_mut_ptr(),
                max_data_bytes,
            )
        }
    }
}

impl Control for LibopusEncoder {
    fn reset(&mut self, request: c_int) -> c_int {
        if request != sys::OPUS_RESET_STATE {
            return sys::OPUS_UNIMPLEMENTED;
        }

        unsafe { sys::opus_encoder_ctl(self.instance.as_ptr(), request) }
    }

    fn get(&mut self, request: c_int, value: &mut i32) -> c_int {
        if !is_read_request(request) {
            return sys::OPUS_UNIMPLEMENTED;
        }

        unsafe { sys::opus_encoder_ctl(self.instance.as_ptr(), request, value as *mut i32) }
    }

    fn set(&mut self, request: c_int, value: i32) -> c_int {
        if !is_write_request(request) {
            return sys::OPUS_UNIMPLEMENTED;
        }

        unsafe { sys::opus_encoder_ctl(self.instance.as_ptr(), request, value) }
    }
}

impl Drop for LibopusEncoder {
    fn drop(&mut self) {
        unsafe { sys::opus_encoder_destroy(self.instance.as_ptr()) }
    }
}
