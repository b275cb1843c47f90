//! Wire protocol core for the yrpc remote-procedure-call runtime.
//!
//! This crate is runtime-free: it frames and parses protocol envelopes from a
//! continuous byte stream, models calls and their outcomes, and applies the
//! tag-selected payload codecs. Transports, discovery, and the client/server
//! runtimes live in the extension crates and consume this one.
//!
//! Envelope layout (big-endian, fixed order):
//!
//! ```text
//! magic          3 bytes   constant protocol tag ("yrp")
//! version        1 byte
//! header_length  2 bytes   size of this header, for format evolution
//! full_length    4 bytes   total envelope length including header
//! message_type   1 byte    request | response | heartbeat-request | heartbeat-response
//! serialize_tag  1 byte    selects the payload serializer
//! compress_tag   1 byte    selects the payload compressor (0 = none)
//! request_id     8 bytes   per-client correlation key
//! payload        (full_length - header_length) bytes
//! ```

pub mod constants;
pub mod envelope;
pub mod message;
pub mod serial;
