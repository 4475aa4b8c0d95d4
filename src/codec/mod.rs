// Codec strategy layer.
//
// One contract over heterogeneous frame compressors. Every backend applies
// the vertical delta filter before its byte compressor (and the inverse
// after decompression); what differs is buffer sizing, trailer format, and
// integrity checking. The backend is chosen once at construction; there is
// no mid-stream renegotiation, the transport conveys the kind tag and the
// compressed length out-of-band.

use std::borrow::Cow;

use thiserror::Error;

use crate::delta;
use crate::raster::{LANE_WIDTH, RasterLayout, SampleWidth};

#[cfg(feature = "deflate")]
pub mod deflate;
#[cfg(feature = "dictionary")]
pub mod dictionary;
pub mod entropy;
pub mod identity;

#[cfg(feature = "deflate")]
pub use deflate::DeflateCodec;
#[cfg(feature = "dictionary")]
pub use dictionary::DictionaryCodec;
pub use entropy::EntropyCodec;
pub use identity::IdentityCodec;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodecError {
    /// The raster geometry violates a codec precondition.
    #[error("invalid raster layout: {0}")]
    InvalidLayout(String),

    /// The compressed payload is malformed. Always detected before any
    /// output buffer is handed back.
    #[error("corrupt compressed input: {0}")]
    CorruptInput(String),

    /// Decompression produced a length other than `pitch * height`.
    #[error("decompressed size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The deflate payload trailer disagrees with the recomputed checksum.
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The underlying compressor failed on the encode path.
    #[error("compression failed: {0}")]
    CompressionFailed(String),
}

// ---------------------------------------------------------------------------
// Compression kind
// ---------------------------------------------------------------------------

/// Frame compression scheme, fixed at codec construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionKind {
    /// No compression; output aliases the input.
    None,
    /// Delta filter + LZ4 block compression.
    #[cfg(feature = "dictionary")]
    Dictionary,
    /// Delta filter + static Huffman coding.
    Entropy,
    /// Delta filter + DEFLATE with an Adler-32 trailer.
    #[cfg(feature = "deflate")]
    Deflate,
}

impl CompressionKind {
    /// Stable tag for the transport's frame header.
    pub const fn tag(self) -> u8 {
        match self {
            Self::None => 0,
            #[cfg(feature = "dictionary")]
            Self::Dictionary => 1,
            Self::Entropy => 2,
            #[cfg(feature = "deflate")]
            Self::Deflate => 3,
        }
    }

    /// Inverse of [`tag`](Self::tag). Returns `None` for unknown tags and
    /// for kinds whose backing feature is disabled.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::None),
            #[cfg(feature = "dictionary")]
            1 => Some(Self::Dictionary),
            2 => Some(Self::Entropy),
            #[cfg(feature = "deflate")]
            3 => Some(Self::Deflate),
            _ => None,
        }
    }

    /// Human-readable backend name for log lines.
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "identity",
            #[cfg(feature = "dictionary")]
            Self::Dictionary => "lz4",
            Self::Entropy => "huffman",
            #[cfg(feature = "deflate")]
            Self::Deflate => "deflate",
        }
    }

    /// Construct the backend for this kind with the given sample width.
    ///
    /// The instance owns its workspace for its whole lifetime; create one
    /// per stream and keep it for every frame of that stream.
    pub fn codec(self, width: SampleWidth) -> Box<dyn FrameCodec> {
        match self {
            Self::None => Box::new(IdentityCodec::new(width)),
            #[cfg(feature = "dictionary")]
            Self::Dictionary => Box::new(DictionaryCodec::new(width)),
            Self::Entropy => Box::new(EntropyCodec::new(width)),
            #[cfg(feature = "deflate")]
            Self::Deflate => Box::new(DeflateCodec::new(width)),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame output
// ---------------------------------------------------------------------------

/// Result of one compress or decompress call.
///
/// `Borrowed` output aliases the caller's buffer (the identity backend's
/// in-place path); `Owned` output is a fresh allocation the caller now
/// owns. The borrow ties an in-place result to the input buffer, so the
/// next call on the same codec cannot start while this output is alive.
#[derive(Debug)]
pub struct FrameOutput<'a> {
    data: Cow<'a, [u8]>,
}

impl<'a> FrameOutput<'a> {
    pub(crate) fn borrowed(data: &'a [u8]) -> Self {
        Self {
            data: Cow::Borrowed(data),
        }
    }

    pub(crate) fn owned(data: Vec<u8>) -> Self {
        Self {
            data: Cow::Owned(data),
        }
    }

    /// Whether the output aliases the input buffer instead of owning a
    /// fresh allocation. True only for the identity backend.
    pub fn is_inplace(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }

    /// Output bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Output length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take ownership of the output, copying only if it was in-place.
    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_owned()
    }
}

impl std::ops::Deref for FrameOutput<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

// ---------------------------------------------------------------------------
// FrameCodec trait
// ---------------------------------------------------------------------------

/// A frame compression strategy.
///
/// Calls are synchronous and blocking. Workspace is private per-instance
/// mutable state with no internal synchronization; `&mut self` prevents
/// concurrent calls on one instance at compile time, while separate
/// instances may run on separate threads.
pub trait FrameCodec: Send {
    /// The compression scheme this codec was constructed for.
    fn kind(&self) -> CompressionKind;

    /// The sample width this codec was constructed for.
    fn sample_width(&self) -> SampleWidth;

    /// Compress one frame.
    ///
    /// `frame` holds at least `layout.frame_len()` bytes. The rowsize is
    /// rounded up to a multiple of 16 internally. The call may mutate
    /// `frame` in place (the delta-filter step runs on it before the byte
    /// compressor), so the caller must not assume the source is preserved.
    fn compress_frame<'a>(
        &mut self,
        frame: &'a mut [u8],
        layout: RasterLayout,
    ) -> Result<FrameOutput<'a>, CodecError>;

    /// Decompress one frame payload.
    ///
    /// `payload` is exactly the compressed bytes (the transport carries the
    /// length out-of-band). On success the output is exactly
    /// `layout.frame_len()` bytes, equal to the original raster.
    fn decompress_frame<'a>(
        &mut self,
        payload: &'a mut [u8],
        layout: RasterLayout,
    ) -> Result<FrameOutput<'a>, CodecError>;
}

// ---------------------------------------------------------------------------
// Shared precondition checks and delta-filter step
// ---------------------------------------------------------------------------

/// Validate raster geometry common to every backend.
pub(crate) fn check_layout(layout: &RasterLayout) -> Result<(), CodecError> {
    if layout.height <= 2 {
        return Err(CodecError::InvalidLayout(format!(
            "height must exceed 2, got {}",
            layout.height
        )));
    }
    if layout.rowsize == 0 {
        return Err(CodecError::InvalidLayout("rowsize is zero".into()));
    }
    if layout.pitch % LANE_WIDTH != 0 {
        return Err(CodecError::InvalidLayout(format!(
            "pitch {} is not a multiple of {LANE_WIDTH}",
            layout.pitch
        )));
    }
    if layout.padded_rowsize() > layout.pitch {
        return Err(CodecError::InvalidLayout(format!(
            "padded rowsize {} exceeds pitch {}",
            layout.padded_rowsize(),
            layout.pitch
        )));
    }
    Ok(())
}

/// Validate geometry plus the source buffer for a compress call.
pub(crate) fn check_compress_input(frame: &[u8], layout: &RasterLayout) -> Result<(), CodecError> {
    check_layout(layout)?;
    if frame.len() < layout.frame_len() {
        return Err(CodecError::InvalidLayout(format!(
            "frame buffer holds {} bytes, layout needs {}",
            frame.len(),
            layout.frame_len()
        )));
    }
    Ok(())
}

/// Delta-encode the padded rowsize region of a frame in place.
pub(crate) fn filter_encode(frame: &mut [u8], layout: &RasterLayout, width: SampleWidth) {
    delta::encode(
        frame,
        layout.pitch,
        layout.padded_rowsize(),
        layout.height,
        width,
    );
}

/// Delta-decode the padded rowsize region of a frame in place.
pub(crate) fn filter_decode(frame: &mut [u8], layout: &RasterLayout, width: SampleWidth) {
    delta::decode(
        frame,
        layout.pitch,
        layout.padded_rowsize(),
        layout.height,
        width,
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
