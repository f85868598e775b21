//! Bindings between planar `f32` audio and the native Opus engine.
//!
//! The crate covers the parts of an Opus pipeline that sit at the engine's
//! ABI boundary: container header inspection ([`packet`]), sample layout
//! conversion ([`pcm`]), ownership of decoder and encoder instances
//! ([`Decoder`], [`Encoder`]) and typed control calls ([`ctl`]).
//!
//! The engine itself is reached through the traits in [`engine`]. With the
//! `libopus` feature the system libopus implements them:
//!
//! ```no_run
//! # #[cfg(feature = "libopus")]
//! # fn main() -> Result<(), hylarana_opus::Error> {
//! use hylarana_opus::{ctl::Application, OpusDecoder, OpusEncoder};
//!
//! let mut encoder = OpusEncoder::new(48000, 2, Application::Audio)?;
//! let input = vec![vec![0.0f32; 960]; 2];
//! let packet = encoder.encode(&input, 0, 960)?;
//!
//! let mut decoder = OpusDecoder::new(48000, 2)?;
//! let mut output = vec![vec![0.0f32; 960]; 2];
//! let frames = decoder.decode(&packet, &mut output, 0, 960)?;
//! assert_eq!(frames, 960);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "libopus"))]
//! # fn main() {}
//! ```

pub mod ctl;
pub mod engine;
pub mod packet;
pub mod pcm;

mod decoder;
mod encoder;
mod error;
mod sys;

#[cfg(feature = "libopus")]
mod libopus;

#[cfg(test)]
mod testing;

pub use decoder::Decoder;
pub use encoder::{Encoder, MAX_PACKET_SIZE};
pub use error::{check, Error};

#[cfg(feature = "libopus")]
pub use libopus::{Libopus, LibopusDecoder, LibopusEncoder};

#[cfg(feature = "libopus")]
pub type OpusDecoder = Decoder<Libopus>;

#[cfg(feature = "libopus")]
pub type OpusEncoder = Encoder<Libopus>;

/// Version string of the engine behind `B`.
pub fn version<B: engine::Backend>() -> String {
    B::version()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_comes_from_the_backend() {
        assert_eq!(version::<testing::FakeBackend>(), "fake-opus 0.0.0");
    }
}
