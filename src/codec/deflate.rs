// Deflate backend: delta filter + zlib DEFLATE + Adler-32 trailer.
//
// The compressor runs one single-shot `Finish` pass at best-speed; the
// delta filter has already removed the vertical redundancy, so the cheap
// setting costs little ratio. After the compressed payload a 4-byte
// little-endian Adler-32 of the payload bytes is appended as a trailer.
// Decode strips the trailer, verifies it against a recomputed checksum
// before touching the inflater, then inflates into an exact
// `pitch * height` buffer.
//
// Stream state is allocated once at construction and reset per call, never
// per frame.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use log::debug;

use crate::checksum::{TRAILER_LEN, adler32};
use crate::raster::{RasterLayout, SampleWidth};

use super::{
    CodecError, CompressionKind, FrameCodec, FrameOutput, check_compress_input, check_layout,
    filter_decode, filter_encode,
};

pub struct DeflateCodec {
    width: SampleWidth,
    compressor: Compress,
    decompressor: Decompress,
}

impl DeflateCodec {
    pub fn new(width: SampleWidth) -> Self {
        Self {
            width,
            // Zlib wrapper, 32 KiB window, best-speed.
            compressor: Compress::new(Compression::fast(), true),
            decompressor: Decompress::new(true),
        }
    }
}

impl FrameCodec for DeflateCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Deflate
    }

    fn sample_width(&self) -> SampleWidth {
        self.width
    }

    fn compress_frame<'a>(
        &mut self,
        frame: &'a mut [u8],
        layout: RasterLayout,
    ) -> Result<FrameOutput<'a>, CodecError> {
        check_compress_input(frame, &layout)?;
        filter_encode(frame, &layout, self.width);

        let input = &frame[..layout.frame_len()];
        self.compressor.reset();
        let mut out = Vec::with_capacity(input.len() * 2 + TRAILER_LEN);
        loop {
            let consumed = self.compressor.total_in() as usize;
            let status = self
                .compressor
                .compress_vec(&input[consumed..], &mut out, FlushCompress::Finish)
                .map_err(|e| CodecError::CompressionFailed(format!("deflate: {e}")))?;
            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => out.reserve((input.len() / 2).max(4096)),
            }
        }

        let trailer = adler32(&out);
        out.extend_from_slice(&trailer.to_le_bytes());

        debug!(
            "compressed {} bytes into {} bytes (deflate)",
            input.len(),
            out.len()
        );
        Ok(FrameOutput::owned(out))
    }

    fn decompress_frame<'a>(
        &mut self,
        payload: &'a mut [u8],
        layout: RasterLayout,
    ) -> Result<FrameOutput<'a>, CodecError> {
        check_layout(&layout)?;
        let expected = layout.frame_len();

        if payload.len() <= TRAILER_LEN {
            return Err(CodecError::CorruptInput(format!(
                "deflate payload holds {} bytes, too short for a checksum trailer",
                payload.len()
            )));
        }
        let (body, trailer) = payload.split_at(payload.len() - TRAILER_LEN);
        let stored = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let computed = adler32(body);
        if stored != computed {
            return Err(CodecError::ChecksumMismatch {
                expected: stored,
                actual: computed,
            });
        }

        self.decompressor.reset(true);
        // One spare byte so an over-long stream is observable instead of
        // stalling against a full buffer.
        let mut out = Vec::with_capacity(expected + 1);
        loop {
            let consumed = self.decompressor.total_in() as usize;
            let status = self
                .decompressor
                .decompress_vec(&body[consumed..], &mut out, FlushDecompress::Finish)
                .map_err(|e| CodecError::CorruptInput(format!("inflate: {e}")))?;
            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    if out.len() > expected {
                        return Err(CodecError::SizeMismatch {
                            expected,
                            actual: out.len(),
                        });
                    }
                    if self.decompressor.total_in() as usize == body.len() {
                        return Err(CodecError::CorruptInput(
                            "truncated deflate stream".into(),
                        ));
                    }
                    // Spare output and unread input but no progress: the
                    // stream is broken, not merely short.
                    if matches!(status, Status::BufError) {
                        return Err(CodecError::CorruptInput("stalled deflate stream".into()));
                    }
                }
            }
        }
        if out.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: out.len(),
            });
        }

        filter_decode(&mut out, &layout, self.width);
        debug!(
            "decompressed {} bytes into {} bytes (deflate)",
            payload.len(),
            expected
        );
        Ok(FrameOutput::owned(out))
    }
}
