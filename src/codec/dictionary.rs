// Dictionary backend: delta filter + LZ4 block compression.
//
// Single-pass byte-oriented LZ compression over the full `pitch * height`
// span after the delta filter has decorrelated the rows. The output buffer
// is allocated up front to the classic dictionary worst-case expansion
// bound `in + in/64 + 16 + 3`, which also covers LZ4's own bound
// (`in + in/255 + 16`), so one allocation always suffices.

use log::debug;

use crate::raster::{RasterLayout, SampleWidth};

use super::{
    CodecError, CompressionKind, FrameCodec, FrameOutput, check_compress_input, check_layout,
    filter_decode, filter_encode,
};

/// Worst-case compressed size for `input_len` bytes.
pub fn worst_case_len(input_len: usize) -> usize {
    let classic = input_len + input_len / 64 + 16 + 3;
    classic.max(lz4_flex::block::get_maximum_output_size(input_len))
}

pub struct DictionaryCodec {
    width: SampleWidth,
}

impl DictionaryCodec {
    pub fn new(width: SampleWidth) -> Self {
        Self { width }
    }
}

impl FrameCodec for DictionaryCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Dictionary
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
        let mut out = vec![0u8; worst_case_len(input.len())];
        let written = lz4_flex::block::compress_into(input, &mut out)
            .map_err(|e| CodecError::CompressionFailed(format!("lz4: {e}")))?;
        out.truncate(written);

        debug!(
            "compressed {} bytes into {} bytes (lz4)",
            input.len(),
            written
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

        let mut out = vec![0u8; expected];
        let written = lz4_flex::block::decompress_into(payload, &mut out)
            .map_err(|e| CodecError::CorruptInput(format!("lz4: {e}")))?;
        if written != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: written,
            });
        }

        filter_decode(&mut out, &layout, self.width);
        debug!(
            "decompressed {} bytes into {} bytes (lz4)",
            payload.len(),
            written
        );
        Ok(FrameOutput::owned(out))
    }
}
