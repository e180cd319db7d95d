//! Lecture Protocol - Wire protocol for status broadcasts
//!
//! The daemon pushes one plaintext status line per tick to every
//! connected listener. Lines are `\n`-terminated; the framing helpers in
//! [`framing`] are shared by both ends so frame boundaries never depend
//! on how the transport splits reads.

pub mod framing;
pub mod message;
pub mod parse;

pub use framing::{line_codec, MAX_LINE_LENGTH};
pub use message::StatusLine;
pub use parse::ProtocolError;
