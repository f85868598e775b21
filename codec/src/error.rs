use std::{borrow::Cow, ffi::c_int};

use thiserror::Error;

use crate::sys;

/// Every way a call into this layer can fail.
///
/// The first seven variants correspond one-to-one to the engine's negative
/// status codes. `UnknownValue` is produced here when the engine hands back an
/// integer that has no meaning in an enumerated control domain, and
/// `UnknownEngineError` keeps any status code outside the documented set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("bad argument: {0}")]
    BadArgument(Cow<'static, str>),
    #[error("the output buffer is too small")]
    BufferTooSmall,
    #[error("the codec engine reported an internal error")]
    InternalError,
    #[error("the packet is corrupted or unsupported")]
    InvalidPacket,
    #[error("the request is not implemented by the codec engine")]
    Unimplemented,
    #[error("the codec instance is in an invalid state")]
    InvalidState,
    #[error("the codec engine failed to allocate memory")]
    AllocationFailure,
    #[error("the codec engine returned an unmapped value: {0}")]
    UnknownValue(i32),
    #[error("unknown codec engine error: {0}")]
    UnknownEngineError(i32),
}

impl Error {
    pub(crate) fn bad_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadArgument(message.into())
    }

    /// Maps a native status code. Non-negative codes are successes and
    /// yield `None`.
    pub fn from_status(code: c_int) -> Option<Self> {
        if code >= sys::OPUS_OK {
            return None;
        }

        Some(match code {
            sys::OPUS_BAD_ARG => Self::bad_argument("rejected by the codec engine"),
            sys::OPUS_BUFFER_TOO_SMALL => Self::BufferTooSmall,
            sys::OPUS_INTERNAL_ERROR => Self::InternalError,
            sys::OPUS_INVALID_PACKET => Self::InvalidPacket,
            sys::OPUS_UNIMPLEMENTED => Self::Unimplemented,
            sys::OPUS_INVALID_STATE => Self::InvalidState,
            sys::OPUS_ALLOC_FAIL => Self::AllocationFailure,
            code => Self::UnknownEngineError(code),
        })
    }

    /// The native status code this error stands for, if it came from one.
    pub fn status(&self) -> Option<c_int> {
        Some(match self {
            Self::BadArgument(_) => sys::OPUS_BAD_ARG,
            Self::BufferTooSmall => sys::OPUS_BUFFER_TOO_SMALL,
            Self::InternalError => sys::OPUS_INTERNAL_ERROR,
            Self::InvalidPacket => sys::OPUS_INVALID_PACKET,
            Self::Unimplemented => sys::OPUS_UNIMPLEMENTED,
            Self::InvalidState => sys::OPUS_INVALID_STATE,
            Self::AllocationFailure => sys::OPUS_ALLOC_FAIL,
            Self::UnknownEngineError(code) => *code,
            Self::UnknownValue(_) => return None,
        })
    }
}

/// Passes non-negative results through and turns negative ones into an
/// [`Error`].
pub fn check(code: c_int) -> Result<c_int, Error> {
    match Error::from_status(code) {
        None => Ok(code),
        Some(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_codes_pass_through() {
        assert_eq!(check(0), Ok(0));
        assert_eq!(check(960), Ok(960));
    }

    #[test]
    fn documented_codes_map_to_their_variant() {
        assert!(matches!(check(-1), Err(Error::BadArgument(_))));
        assert_eq!(check(-2), Err(Error::BufferTooSmall));
        assert_eq!(check(-3), Err(Error::InternalError));
        assert_eq!(check(-4), Err(Error::InvalidPacket));
        assert_eq!(check(-5), Err(Error::Unimplemented));
        assert_eq!(check(-6), Err(Error::InvalidState));
        assert_eq!(check(-7), Err(Error::AllocationFailure));
    }

    #[test]
    fn unlisted_codes_are_kept() {
        assert_eq!(check(-42), Err(Error::UnknownEngineError(-42)));
        assert_eq!(Error::UnknownEngineError(-42).status(), Some(-42));
    }

    #[test]
    fn status_round_trips() {
        for code in -7..0 {
            assert_eq!(Error::from_status(code).and_then(|e| e.status()), Some(code));
        }

        assert_eq!(Error::UnknownValue(7).status(), None);
    }
}
