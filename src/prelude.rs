pub use crate::{
    checksum::ChecksumWidth,
    chunk::{decode_all_chunks, decode_chunk, encode_chunk, skip_chunk, write_chunk, Chunk, ChunkIter},
    config::{BodyStyle, CodecConfig},
    cursor::{ByteCursor, ByteWriter, Endian, FixedBuf, WriteBuf},
    errors::CodecError,
    field::*,
    float::Float,
    message::{decode_message, encode_message, peek_header, Body, Message, MessageCodec, MessageHeader},
    record::{decode_all_records, decode_record, encode_record, Record, RecordSchema},
};
pub use bytes::Bytes;
pub use half::f16;
pub use std::convert::TryFrom;
