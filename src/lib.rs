//! Framepress: delta-filtered frame compression for raw video rasters.
//!
//! Shrinks raw frame pixel buffers before they cross a network link and
//! reconstructs them bit-exactly on the receiving side. The crate provides:
//! - A reversible SIMD delta filter exploiting vertical pixel redundancy
//!   (`delta`)
//! - A strategy layer wrapping byte compressors behind one contract
//!   (`codec`): identity passthrough, LZ4, static Huffman, and DEFLATE with
//!   an Adler-32 trailer
//!
//! Frame transport (headers, scheduling, retries) and the host pipeline
//! that supplies pixel buffers are external collaborators: the transport
//! carries the compression kind and the compressed length out-of-band.
//!
//! # Quick start
//!
//! ```
//! use framepress::{CompressionKind, RasterLayout, SampleWidth};
//!
//! // 4 rows of 64 valid bytes, stride 64, 8-bit samples.
//! let layout = RasterLayout::new(64, 4, 64);
//! let original: Vec<u8> = (0..layout.frame_len()).map(|i| (i / 64) as u8).collect();
//!
//! let mut codec = CompressionKind::Entropy.codec(SampleWidth::U8);
//!
//! // Compression may mutate its input (delta-filter step).
//! let mut frame = original.clone();
//! let mut payload = codec.compress_frame(&mut frame, layout).unwrap().into_vec();
//!
//! let restored = codec.decompress_frame(&mut payload, layout).unwrap();
//! assert_eq!(restored.as_bytes(), &original[..]);
//! ```

pub mod checksum;
pub mod codec;
pub mod delta;
pub mod huffman;
pub mod raster;

pub use codec::{CodecError, CompressionKind, FrameCodec, FrameOutput};
pub use raster::{LANE_WIDTH, RasterLayout, SampleWidth};
