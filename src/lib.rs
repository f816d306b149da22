//! # binframe
//!
//! binframe encodes typed values into compact, framed binary messages and decodes them
//! back, with explicit byte order and optional checksums.
//!
//! It is built in layers, each usable on its own:
//!
//! | Layer                     | Does                                                        |
//! | ---                       | ---                                                         |
//! | [`cursor`]                | bounds-checked reads and writes in big or little endian     |
//! | [`field`]                 | fixed-width integers and floats, length-prefixed blobs, text|
//! | [`checksum`]              | 8 and 16-bit additive checksums                             |
//! | [`chunk`]                 | tag + length + payload units                                |
//! | [`record`]                | fixed-size records described by a schema                    |
//! | [`message`]               | header, body of chunks or records, checksum trailer         |
//!
//! Everything works on in-memory buffers. Nothing is retained between calls and there is
//! no global state, so independent messages can be encoded and decoded from any number
//! of threads at once.
//!
//! # Usage
//!
//! ```
//! use binframe::prelude::*;
//!
//! let codec = MessageCodec::new(
//!     CodecConfig::new(0xCAFE_BABE).with_checksum(ChecksumWidth::U16),
//! );
//!
//! let chunks = vec![
//!     Chunk::new(1, &b"AB"[..]).unwrap(),
//!     Chunk::new(2, vec![0x00, 0x2A]).unwrap(),
//! ];
//! let buf = codec.encode(0, &Body::Chunks(chunks.clone())).unwrap();
//!
//! let message = codec.decode(&buf).unwrap();
//! assert_eq!(message.header.count, 2);
//! assert_eq!(message.body, Body::Chunks(chunks));
//! ```
//!
//! Fixed-size records need a schema:
//!
//! ```
//! use binframe::prelude::*;
//!
//! let schema = RecordSchema::new(vec![
//!     ("id", FieldType::uint(Width::Four)),
//!     ("offset", FieldType::int(Width::Two)),
//!     ("name", FieldType::text(8)),
//! ])
//! .unwrap();
//!
//! let codec = MessageCodec::new(
//!     CodecConfig::default()
//!         .with_order(Endian::Little)
//!         .with_records(schema.clone()),
//! );
//!
//! let rec = Record::new(vec![Value::from(7u32), Value::from(-12i16), Value::from("probe")]);
//! let buf = codec.encode_records(0, &[rec.clone()]).unwrap();
//! assert_eq!(buf.len(), 12 + schema.record_size());
//!
//! let records = codec.decode(&buf).unwrap().body.into_records().unwrap();
//! assert_eq!(records[0].get(&schema, "name"), Some(&Value::from("probe")));
//! ```
//!
//! # Errors
//!
//! Every operation returns a [`CodecError`] describing where and why it failed. Decoding
//! never hands back a partial result, and a cursor that fails to read a framed value is
//! left where it started.
//!
//! # Specification
//!
//! This section describes the wire format. Every multi-byte value uses the byte order the
//! codec was configured with; big endian is the default.
//!
//! ## Fields
//!
//! | Type                  | Bytes                                                       |
//! | ---                   | ---                                                         |
//! | integer               | 1, 2, 4 or 8, two's complement when signed                  |
//! | float                 | 2, 4 or 8, IEEE-754 binary16/32/64                          |
//! | blob                  | unsigned length prefix of 1, 2, 4 or 8 bytes, then the data |
//! | text                  | exactly `width` bytes of UTF-8, zero padded                 |
//!
//! Text is read up to its first zero byte, so text containing `\0` does not round-trip.
//!
//! ## Chunks
//!
//! | tag  | length | payload        |
//! | ---  | ---    | ---            |
//! | `u8` | `u16`  | `length` bytes |
//!
//! ## Records
//!
//! The fields of the schema, in order, with no separators. Every record of a schema has
//! the same size.
//!
//! ## Messages
//!
//! | magic | version | flags | count | body                    | trailer       |
//! | ---   | ---     | ---   | ---   | ---                     | ---           |
//! | `u32` | `u16`   | `u16` | `u32` | `count` chunks/records  | `u8` or `u16` |
//!
//! The trailer is present only when a checksum width is configured and holds the sum of
//! all bytes before it, modulo 256 or 65536.

#![warn(
    deprecated_in_future,
    unsafe_code,
    unused_labels,
    keyword_idents,
    missing_copy_implementations,
    missing_debug_implementations,
    macro_use_extern_crate,
    unreachable_pub,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces
)]
#![allow(clippy::cast_lossless)]

mod util;

pub mod checksum;
pub mod chunk;
pub mod config;
pub mod cursor;
pub mod errors;
pub mod field;
pub mod float;
pub mod message;
pub mod prelude;
pub mod record;

pub use errors::{CodecError, Result};
pub use message::{decode_message, encode_message, MessageCodec};
