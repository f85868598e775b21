//! Typed control calls.
//!
//! A control request is a closed enum per session kind. Each variant is
//! mapped to an engine opcode, a direction and a value domain by the
//! `request` tables below, and a single dispatcher executes the result
//! against any [`Control`] implementation.

use std::ffi::c_int;

use crate::{engine::Control, error::check, sys, Error};

/// Codec-wide tuning preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Application {
    /// Best for most VoIP and videoconference applications.
    Voice,
    /// Best for broadcast and high fidelity applications.
    Audio,
    /// Lowest achievable latency, voice-optimized modes are disabled.
    RestrictedLowDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Auto,
    Voice,
    Music,
}

/// Audio bandwidth, from 4 kHz (narrowband) up to 20 kHz (fullband).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bandwidth {
    Auto,
    Narrowband,
    Mediumband,
    Wideband,
    Superwideband,
    Fullband,
}

/// Conversion between a control value domain and the engine's integer
/// encoding.
pub trait CtlValue: Sized {
    fn to_raw(self) -> i32;

    fn from_raw(raw: i32) -> Result<Self, Error>;
}

impl CtlValue for i32 {
    fn to_raw(self) -> i32 {
        self
    }

    fn from_raw(raw: i32) -> Result<Self, Error> {
        Ok(raw)
    }
}

impl CtlValue for u32 {
    fn to_raw(self) -> i32 {
        self as i32
    }

    // The final range is an unsigned 32-bit value the engine writes through
    // the same int slot.
    fn from_raw(raw: i32) -> Result<Self, Error> {
        Ok(raw as u32)
    }
}

impl CtlValue for bool {
    fn to_raw(self) -> i32 {
        self as i32
    }

    fn from_raw(raw: i32) -> Result<Self, Error> {
        match raw {
            0 => Ok(false),
            1 => Ok(true),
            raw => Err(Error::UnknownValue(raw)),
        }
    }
}

impl CtlValue for Application {
    fn to_raw(self) -> i32 {
        match self {
            Self::Voice => sys::OPUS_APPLICATION_VOIP,
            Self::Audio => sys::OPUS_APPLICATION_AUDIO,
            Self::RestrictedLowDelay => sys::OPUS_APPLICATION_RESTRICTED_LOWDELAY,
        }
    }

    fn from_raw(raw: i32) -> Result<Self, Error> {
        Ok(match raw {
            sys::OPUS_APPLICATION_VOIP => Self::Voice,
            sys::OPUS_APPLICATION_AUDIO => Self::Audio,
            sys::OPUS_APPLICATION_RESTRICTED_LOWDELAY => Self::RestrictedLowDelay,
            raw => return Err(Error::UnknownValue(raw)),
        })
    }
}

impl CtlValue for Signal {
    fn to_raw(self) -> i32 {
        match self {
            Self::Auto => sys::OPUS_AUTO,
            Self::Voice => sys::OPUS_SIGNAL_VOICE,
            Self::Music => sys::OPUS_SIGNAL_MUSIC,
        }
    }

    fn from_raw(raw: i32) -> Result<Self, Error> {
        Ok(match raw {
            sys::OPUS_AUTO => Self::Auto,
            sys::OPUS_SIGNAL_VOICE => Self::Voice,
            sys::OPUS_SIGNAL_MUSIC => Self::Music,
            raw => return Err(Error::UnknownValue(raw)),
        })
    }
}

impl CtlValue for Bandwidth {
    fn to_raw(self) -> i32 {
        match self {
            Self::Auto => sys::OPUS_AUTO,
            Self::Narrowband => sys::OPUS_BANDWIDTH_NARROWBAND,
            Self::Mediumband => sys::OPUS_BANDWIDTH_MEDIUMBAND,
            Self::Wideband => sys::OPUS_BANDWIDTH_WIDEBAND,
            Self::Superwideband => sys::OPUS_BANDWIDTH_SUPERWIDEBAND,
            Self::Fullband => sys::OPUS_BANDWIDTH_FULLBAND,
        }
    }

    fn from_raw(raw: i32) -> Result<Self, Error> {
        Ok(match raw {
            sys::OPUS_AUTO => Self::Auto,
            sys::OPUS_BANDWIDTH_NARROWBAND => Self::Narrowband,
            sys::OPUS_BANDWIDTH_MEDIUMBAND => Self::Mediumband,
            sys::OPUS_BANDWIDTH_WIDEBAND => Self::Wideband,
            sys::OPUS_BANDWIDTH_SUPERWIDEBAND => Self::Superwideband,
            sys::OPUS_BANDWIDTH_FULLBAND => Self::Fullband,
            raw => return Err(Error::UnknownValue(raw)),
        })
    }
}

/// Requests understood by both decoders and encoders.
#[derive(Debug)]
pub enum GenericCtl<'a> {
    /// Resets the codec state to that of a freshly initialized instance.
    ResetState,
    /// Final state of the range coder, for comparing against a reference.
    GetFinalRange(&'a mut u32),
    GetPitch(&'a mut i32),
    GetSampleRate(&'a mut i32),
    /// Bit depth of the signal.
    GetLsbDepth(&'a mut i32),
    SetLsbDepth(i32),
    GetPhaseInversionDisabled(&'a mut bool),
    SetPhaseInversionDisabled(bool),
}

#[derive(Debug)]
pub enum DecoderCtl<'a> {
    Generic(GenericCtl<'a>),
    /// Output gain in Q8 dB units.
    GetGain(&'a mut i32),
    SetGain(i32),
    /// Duration in samples at the output rate of the last decoded packet.
    GetLastPacketDuration(&'a mut i32),
}

#[derive(Debug)]
pub enum EncoderCtl<'a> {
    Generic(GenericCtl<'a>),
    GetBitrate(&'a mut i32),
    SetBitrate(i32),
    /// Computational complexity, 0 to 10.
    GetComplexity(&'a mut i32),
    SetComplexity(i32),
    GetVbr(&'a mut bool),
    SetVbr(bool),
    GetVbrConstraint(&'a mut bool),
    SetVbrConstraint(bool),
    GetForceChannels(&'a mut i32),
    SetForceChannels(i32),
    /// Codec delay in samples.
    GetLookahead(&'a mut i32),
    GetInbandFec(&'a mut bool),
    SetInbandFec(bool),
    GetPacketLossPerc(&'a mut i32),
    SetPacketLossPerc(i32),
    GetDtx(&'a mut bool),
    SetDtx(bool),
    GetBandwidth(&'a mut Bandwidth),
    SetBandwidth(Bandwidth),
    GetMaxBandwidth(&'a mut Bandwidth),
    SetMaxBandwidth(Bandwidth),
    GetSignal(&'a mut Signal),
    SetSignal(Signal),
    GetApplication(&'a mut Application),
    SetApplication(Application),
}

impl<'a> From<GenericCtl<'a>> for DecoderCtl<'a> {
    fn from(value: GenericCtl<'a>) -> Self {
        Self::Generic(value)
    }
}

impl<'a> From<GenericCtl<'a>> for EncoderCtl<'a> {
    fn from(value: GenericCtl<'a>) -> Self {
        Self::Generic(value)
    }
}

/// Receives a raw value read from the engine.
pub(crate) trait CtlSlot {
    fn store(&mut self, raw: i32) -> Result<(), Error>;
}

impl<T: CtlValue> CtlSlot for T {
    fn store(&mut self, raw: i32) -> Result<(), Error> {
        *self = T::from_raw(raw)?;
        Ok(())
    }
}

/// A control request resolved to its opcode and direction.
pub(crate) enum Request<'a> {
    Reset(c_int),
    Get(c_int, &'a mut dyn CtlSlot),
    Set(c_int, i32),
}

impl<'a> Request<'a> {
    fn get<T: CtlValue + 'a>(request: c_int, slot: &'a mut T) -> Self {
        Self::Get(request, slot)
    }

    fn set<T: CtlValue>(request: c_int, value: T) -> Self {
        Self::Set(request, value.to_raw())
    }

    pub(crate) fn opcode(&self) -> c_int {
        match self {
            Self::Reset(op) | Self::Get(op, _) | Self::Set(op, _) => *op,
        }
    }
}

impl<'a> GenericCtl<'a> {
    pub(crate) fn request(self) -> Request<'a> {
        use sys::*;

        match self {
            Self::ResetState => Request::Reset(OPUS_RESET_STATE),
            Self::GetFinalRange(v) => Request::get(OPUS_GET_FINAL_RANGE_REQUEST, v),
            Self::GetPitch(v) => Request::get(OPUS_GET_PITCH_REQUEST, v),
            Self::GetSampleRate(v) => Request::get(OPUS_GET_SAMPLE_RATE_REQUEST, v),
            Self::GetLsbDepth(v) => Request::get(OPUS_GET_LSB_DEPTH_REQUEST, v),
            Self::SetLsbDepth(v) => Request::set(OPUS_SET_LSB_DEPTH_REQUEST, v),
            Self::GetPhaseInversionDisabled(v) => {
                Request::get(OPUS_GET_PHASE_INVERSION_DISABLED_REQUEST, v)
            }
            Self::SetPhaseInversionDisabled(v) => {
                Request::set(OPUS_SET_PHASE_INVERSION_DISABLED_REQUEST, v)
            }
        }
    }
}

impl<'a> DecoderCtl<'a> {
    pub(crate) fn request(self) -> Request<'a> {
        use sys::*;

        match self {
            Self::Generic(ctl) => ctl.request(),
            Self::GetGain(v) => Request::get(OPUS_GET_GAIN_REQUEST, v),
            Self::SetGain(v) => Request::set(OPUS_SET_GAIN_REQUEST, v),
            Self::GetLastPacketDuration(v) => {
                Request::get(OPUS_GET_LAST_PACKET_DURATION_REQUEST, v)
            }
        }
    }
}

impl<'a> EncoderCtl<'a> {
    pub(crate) fn request(self) -> Request<'a> {
        use sys::*;

        match self {
            Self::Generic(ctl) => ctl.request(),
            Self::GetBitrate(v) => Request::get(OPUS_GET_BITRATE_REQUEST, v),
            Self::SetBitrate(v) => Request::set(OPUS_SET_BITRATE_REQUEST, v),
            Self::GetComplexity(v) => Request::get(OPUS_GET_COMPLEXITY_REQUEST, v),
            Self::SetComplexity(v) => Request::set(OPUS_SET_COMPLEXITY_REQUEST, v),
            Self::GetVbr(v) => Request::get(OPUS_GET_VBR_REQUEST, v),
            Self::SetVbr(v) => Request::set(OPUS_SET_VBR_REQUEST, v),
            Self::GetVbrConstraint(v) => Request::get(OPUS_GET_VBR_CONSTRAINT_REQUEST, v),
            Self::SetVbrConstraint(v) => Request::set(OPUS_SET_VBR_CONSTRAINT_REQUEST, v),
            Self::GetForceChannels(v) => Request::get(OPUS_GET_FORCE_CHANNELS_REQUEST, v),
            Self::SetForceChannels(v) => Request::set(OPUS_SET_FORCE_CHANNELS_REQUEST, v),
            Self::GetLookahead(v) => Request::get(OPUS_GET_LOOKAHEAD_REQUEST, v),
            Self::GetInbandFec(v) => Request::get(OPUS_GET_INBAND_FEC_REQUEST, v),
            Self::SetInbandFec(v) => Request::set(OPUS_SET_INBAND_FEC_REQUEST, v),
            Self::GetPacketLossPerc(v) => Request::get(OPUS_GET_PACKET_LOSS_PERC_REQUEST, v),
            Self::SetPacketLossPerc(v) => Request::set(OPUS_SET_PACKET_LOSS_PERC_REQUEST, v),
            Self::GetDtx(v) => Request::get(OPUS_GET_DTX_REQUEST, v),
            Self::SetDtx(v) => Request::set(OPUS_SET_DTX_REQUEST, v),
            Self::GetBandwidth(v) => Request::get(OPUS_GET_BANDWIDTH_REQUEST, v),
            Self::SetBandwidth(v) => Request::set(OPUS_SET_BANDWIDTH_REQUEST, v),
            Self::GetMaxBandwidth(v) => Request::get(OPUS_GET_MAX_BANDWIDTH_REQUEST, v),
            Self::SetMaxBandwidth(v) => Request::set(OPUS_SET_MAX_BANDWIDTH_REQUEST, v),
            Self::GetSignal(v) => Request::get(OPUS_GET_SIGNAL_REQUEST, v),
            Self::SetSignal(v) => Request::set(OPUS_SET_SIGNAL_REQUEST, v),
            Self::GetApplication(v) => Request::get(OPUS_GET_APPLICATION_REQUEST, v),
            Self::SetApplication(v) => Request::set(OPUS_SET_APPLICATION_REQUEST, v),
        }
    }
}

/// Runs a resolved request against an engine instance.
///
/// A read only touches the caller's slot once the engine reported success
/// and the raw value maps into the slot's domain.
pub(crate) fn dispatch<C: Control + ?Sized>(
    target: &mut C,
    request: Request<'_>,
) -> Result<(), Error> {
    match request {
        Request::Reset(op) => {
            check(target.reset(op))?;
        }
        Request::Get(op, slot) => {
            let mut raw = 0;
            check(target.get(op, &mut raw))?;
            slot.store(raw)?;
        }
        Request::Set(op, value) => {
            check(target.set(op, value))?;
        }
    }

    Ok(())
}
