// Entropy backend: delta filter + static Huffman coding.
//
// The delta filter concentrates the byte histogram around zero, which is
// exactly where a static Huffman coder earns its keep. The compressed
// stream is opaque (128-byte code-length header plus bitstream); the
// transport carries the compressed length and the decoder reconstructs the
// known `pitch * height` bytes.

use log::debug;

use crate::huffman::{self, HuffmanError};
use crate::raster::{RasterLayout, SampleWidth};

use super::{
    CodecError, CompressionKind, FrameCodec, FrameOutput, check_compress_input, check_layout,
    filter_decode, filter_encode,
};

pub struct EntropyCodec {
    width: SampleWidth,
}

impl EntropyCodec {
    pub fn new(width: SampleWidth) -> Self {
        Self { width }
    }
}

impl From<HuffmanError> for CodecError {
    fn from(e: HuffmanError) -> Self {
        CodecError::CorruptInput(format!("huffman: {e}"))
    }
}

impl FrameCodec for EntropyCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Entropy
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
        let out = huffman::compress(input);

        debug!(
            "compressed {} bytes into {} bytes (huffman)",
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

        let mut out = huffman::decompress(payload, expected)?;

        filter_decode(&mut out, &layout, self.width);
        debug!(
            "decompressed {} bytes into {} bytes (huffman)",
            payload.len(),
            expected
        );
        Ok(FrameOutput::owned(out))
    }
}
