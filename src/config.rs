//! Configuration for [`MessageCodec`](crate::message::MessageCodec).

use crate::{checksum::ChecksumWidth, cursor::Endian, record::RecordSchema};

/// Magic number used when none is configured.
pub const DEFAULT_MAGIC: u32 = 0xCAFE_BABE;

/// Largest header count accepted by default.
pub const DEFAULT_MAX_COUNT: u32 = 1 << 20;

/// How the items of a message body are laid out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodyStyle {
    /// A sequence of tagged chunks.
    Chunks,
    /// A sequence of fixed-size records sharing one schema.
    Records(RecordSchema),
}

impl BodyStyle {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            BodyStyle::Chunks => "chunks",
            BodyStyle::Records(_) => "records",
        }
    }
}

impl Default for BodyStyle {
    fn default() -> Self { BodyStyle::Chunks }
}

/// Settings shared by every message a codec encodes or decodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    /// Magic number written into, and required from, every header.
    pub magic: u32,

    /// Version written by the codec. Decoding reports it but does not check it.
    pub version: u16,

    /// Byte order of the header, the chunk lengths and all record fields.
    pub order: Endian,

    /// Width of the checksum trailer, or `None` for no trailer.
    pub checksum: Option<ChecksumWidth>,

    /// Layout of the body.
    pub body: BodyStyle,

    /// Reject bytes left over after the declared items.
    ///
    /// Turning this off tolerates trailing bytes, for peers known to pad their output.
    pub exact: bool,

    /// Largest item count a header may declare.
    pub max_count: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            magic: DEFAULT_MAGIC,
            version: 1,
            order: Endian::Big,
            checksum: None,
            body: BodyStyle::Chunks,
            exact: true,
            max_count: DEFAULT_MAX_COUNT,
        }
    }
}

impl CodecConfig {
    /// A chunked configuration with the given magic and defaults elsewhere.
    pub fn new(magic: u32) -> Self {
        Self {
            magic,
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn with_order(mut self, order: Endian) -> Self {
        self.order = order;
        self
    }

    pub fn with_checksum(mut self, width: ChecksumWidth) -> Self {
        self.checksum = Some(width);
        self
    }

    /// Switches the body to fixed-size records of `schema`.
    pub fn with_records(mut self, schema: RecordSchema) -> Self {
        self.body = BodyStyle::Records(schema);
        self
    }

    /// Sets whether trailing bytes after the declared items are an error.
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }
}
