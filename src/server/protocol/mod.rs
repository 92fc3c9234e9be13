//! Wire protocol: the envelope type, its length-prefixed codec, and the
//! command / response vocabulary carried inside it.

pub mod codec;
pub mod commands;
pub mod envelope;

pub use codec::{CodecError, FrameDecoder, decode, encode, write_envelope};
pub use envelope::Envelope;
