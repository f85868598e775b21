//! Deterministic stand-in for the native engine.
//!
//! Counters are per thread, so every test observes only its own calls.

use std::{cell::Cell, collections::HashMap, ffi::c_int};

use crate::{
    engine::{Backend, Control, DecoderHandle, EncoderHandle},
    sys::*,
};

thread_local! {
    static NATIVE_CALLS: Cell<usize> = Cell::new(0);
    static LIVE_INSTANCES: Cell<isize> = Cell::new(0);
    static LAST_FEC: Cell<Option<bool>> = Cell::new(None);
}

fn record() {
    NATIVE_CALLS.with(|it| it.set(it.get() + 1));
}

/// Calls into the fake engine made by the current thread.
pub(crate) fn native_calls() -> usize {
    NATIVE_CALLS.with(|it| it.get())
}

/// Instances created and not yet released by the current thread.
pub(crate) fn live_instances() -> isize {
    LIVE_INSTANCES.with(|it| it.get())
}

/// The `fec` flag of the last decode call made by the current thread.
pub(crate) fn last_fec() -> Option<bool> {
    LAST_FEC.with(|it| it.get())
}

fn valid(sample_rate: i32, channels: c_int) -> bool {
    matches!(sample_rate, 8000 | 12000 | 16000 | 24000 | 48000) && matches!(channels, 1 | 2)
}

/// Samples per channel in one fake packet: 20 ms.
pub(crate) fn packet_frames(sample_rate: i32) -> usize {
    sample_rate as usize / 50
}

pub(crate) struct FakeBackend;

impl Backend for FakeBackend {
    type Decoder = FakeDecoder;
    type Encoder = FakeEncoder;

    fn version() -> String {
        "fake-opus 0.0.0".to_string()
    }

    fn packet_channels(packet: &[u8]) -> c_int {
        record();

        match packet.first() {
            None => OPUS_INVALID_PACKET,
            Some(toc) if toc & 0x4 != 0 => 2,
            Some(_) => 1,
        }
    }
}

/// GET opcode paired with a SET opcode.
fn read_opcode(request: c_int) -> c_int {
    match request {
        OPUS_SET_GAIN_REQUEST => OPUS_GET_GAIN_REQUEST,
        request => request + 1,
    }
}

/// Parameter store keyed by GET opcode.
struct Params {
    defaults: Vec<(c_int, i32)>,
    values: HashMap<c_int, i32>,
}

impl Params {
    fn new(defaults: Vec<(c_int, i32)>) -> Self {
        let values = defaults.iter().copied().collect();
        Self { defaults, values }
    }
}

impl Control for Params {
    fn reset(&mut self, request: c_int) -> c_int {
        record();

        if request != OPUS_RESET_STATE {
            return OPUS_UNIMPLEMENTED;
        }

        self.values = self.defaults.iter().copied().collect();
        OPUS_OK
    }

    fn get(&mut self, request: c_int, value: &mut i32) -> c_int {
        record();

        match self.values.get(&request) {
            Some(it) => {
                *value = *it;
                OPUS_OK
            }
            None => OPUS_UNIMPLEMENTED,
        }
    }

    fn set(&mut self, request: c_int, value: i32) -> c_int {
        record();

        match self.values.get_mut(&read_opcode(request)) {
            Some(it) => {
                *it = value;
                OPUS_OK
            }
            None => OPUS_UNIMPLEMENTED,
        }
    }
}

pub(crate) struct FakeDecoder {
    sample_rate: i32,
    capacity: c_int,
    channels: c_int,
    params: Params,
}

impl FakeDecoder {
    fn params(sample_rate: i32) -> Params {
        Params::new(vec![
            (OPUS_GET_SAMPLE_RATE_REQUEST, sample_rate),
            (OPUS_GET_FINAL_RANGE_REQUEST, 0),
            (OPUS_GET_PITCH_REQUEST, 0),
            (OPUS_GET_GAIN_REQUEST, 0),
            (OPUS_GET_LAST_PACKET_DURATION_REQUEST, 0),
            (OPUS_GET_PHASE_INVERSION_DISABLED_REQUEST, 0),
        ])
    }
}

impl DecoderHandle for FakeDecoder {
    fn create(sample_rate: i32, channels: c_int) -> Result<Self, c_int> {
        record();

        if !valid(sample_rate, channels) {
            return Err(OPUS_BAD_ARG);
        }

        LIVE_INSTANCES.with(|it| it.set(it.get() + 1));
        Ok(Self {
            sample_rate,
            capacity: channels,
            channels,
            params: Self::params(sample_rate),
        })
    }

    fn init(&mut self, sample_rate: i32, channels: c_int) -> c_int {
        record();

        if !valid(sample_rate, channels) || channels > self.capacity {
            return OPUS_BAD_ARG;
        }

        self.sample_rate = sample_rate;
        self.channels = channels;
        self.params = Self::params(sample_rate);
        OPUS_OK
    }

    /// Produces 20 ms per packet where interleaved sample `i` has value `i`.
    /// Packets shorter than two bytes are invalid.
    fn decode_float(
        &mut self,
        packet: &[u8],
        pcm: &mut [f32],
        frame_size: c_int,
        fec: bool,
    ) -> c_int {
        record();
        LAST_FEC.with(|it| it.set(Some(fec)));

        let channels = self.channels as usize;
        if frame_size <= 0 || pcm.len() < frame_size as usize * channels {
            return OPUS_BAD_ARG;
        }

        if packet.len() < 2 {
            return OPUS_INVALID_PACKET;
        }

        let frames = packet_frames(self.sample_rate);
        if (frame_size as usize) < frames {
            return OPUS_BUFFER_TOO_SMALL;
        }

        for (i, sample) in pcm[..frames * channels].iter_mut().enumerate() {
            *sample = i as f32;
        }

        self.params
            .values
            .insert(OPUS_GET_LAST_PACKET_DURATION_REQUEST, frames as i32);
        frames as c_int
    }
}

impl Control for FakeDecoder {
    fn reset(&mut self, request: c_int) -> c_int {
        self.params.reset(request)
    }

    fn get(&mut self, request: c_int, value: &mut i32) -> c_int {
        self.params.get(request, value)
    }

    fn set(&mut self, request: c_int, value: i32) -> c_int {
        self.params.set(request, value)
    }
}

impl Drop for FakeDecoder {
    fn drop(&mut self) {
        LIVE_INSTANCES.with(|it| it.set(it.get() - 1));
    }
}

pub(crate) struct FakeEncoder {
    channels: c_int,
    params: Params,
}

impl EncoderHandle for FakeEncoder {
    fn create(sample_rate: i32, channels: c_int, application: i32) -> Result<Self, c_int> {
        record();

        let known = matches!(
            application,
            OPUS_APPLICATION_VOIP | OPUS_APPLICATION_AUDIO | OPUS_APPLICATION_RESTRICTED_LOWDELAY
        );

        if !valid(sample_rate, channels) || !known {
            return Err(OPUS_BAD_ARG);
        }

        LIVE_INSTANCES.with(|it| it.set(it.get() + 1));
        Ok(Self {
            channels,
            params: Params::new(vec![
                (OPUS_GET_APPLICATION_REQUEST, application),
                (OPUS_GET_BITRATE_REQUEST, OPUS_AUTO),
                (OPUS_GET_MAX_BANDWIDTH_REQUEST, OPUS_BANDWIDTH_FULLBAND),
                (OPUS_GET_VBR_REQUEST, 1),
                (OPUS_GET_BANDWIDTH_REQUEST, OPUS_AUTO),
                (OPUS_GET_COMPLEXITY_REQUEST, 9),
                (OPUS_GET_INBAND_FEC_REQUEST, 0),
                (OPUS_GET_PACKET_LOSS_PERC_REQUEST, 0),
                (OPUS_GET_DTX_REQUEST, 0),
                (OPUS_GET_VBR_CONSTRAINT_REQUEST, 1),
                (OPUS_GET_FORCE_CHANNELS_REQUEST, OPUS_AUTO),
                (OPUS_GET_SIGNAL_REQUEST, OPUS_AUTO),
                (OPUS_GET_LOOKAHEAD_REQUEST, 312),
                (OPUS_GET_SAMPLE_RATE_REQUEST, sample_rate),
                (OPUS_GET_FINAL_RANGE_REQUEST, 0),
                (OPUS_GET_LSB_DEPTH_REQUEST, 24),
                (OPUS_GET_PHASE_INVERSION_DISABLED_REQUEST, 0),
            ]),
        })
    }

    /// Emits one byte per eight interleaved samples plus a one byte header.
    fn encode_float(&mut self, pcm: &[f32], frame_size: c_int, out: &mut [u8]) -> c_int {
        record();

        let samples = frame_size as usize * self.channels as usize;
        if frame_size <= 0 || pcm.len() != samples {
            return OPUS_BAD_ARG;
        }

        let size = 1 + samples / 8;
        if size > out.len() {
            return OPUS_BUFFER_TOO_SMALL;
        }

        out[0] = if self.channels == 2 { 0xfc } else { 0xf8 };
        for (byte, chunk) in out[1..size].iter_mut().zip(pcm.chunks(8)) {
            *byte = (chunk[0].clamp(-1.0, 1.0) * 127.0) as i8 as u8;
        }

        size as c_int
    }
}

impl Control for FakeEncoder {
    fn reset(&mut self, request: c_int) -> c_int {
        self.params.reset(request)
    }

    fn get(&mut self, request: c_int, value: &mut i32) -> c_int {
        self.params.get(request, value)
    }

    fn set(&mut self, request: c_int, value: i32) -> c_int {
        self.params.set(request, value)
    }
}

impl Drop for FakeEncoder {
    fn drop(&mut self) {
        LIVE_INSTANCES.with(|it| it.set(it.get() - 1));
    }
}
