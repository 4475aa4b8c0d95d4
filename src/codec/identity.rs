// Identity backend: no transform, no copy.
//
// The zero-overhead baseline used when compression is disabled. Output
// aliases the caller's buffer in both directions, length `pitch * height`.

use crate::raster::{RasterLayout, SampleWidth};

use super::{CodecError, CompressionKind, FrameCodec, FrameOutput, check_compress_input};

pub struct IdentityCodec {
    width: SampleWidth,
}

impl IdentityCodec {
    pub fn new(width: SampleWidth) -> Self {
        Self { width }
    }
}

impl FrameCodec for IdentityCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::None
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
        Ok(FrameOutput::borrowed(&frame[..layout.frame_len()]))
    }

    fn decompress_frame<'a>(
        &mut self,
        payload: &'a mut [u8],
        layout: RasterLayout,
    ) -> Result<FrameOutput<'a>, CodecError> {
        super::check_layout(&layout)?;
        let expected = layout.frame_len();
        if payload.len() < expected {
            return Err(CodecError::CorruptInput(format!(
                "identity payload holds {} bytes, layout needs {expected}",
                payload.len()
            )));
        }
        Ok(FrameOutput::borrowed(&payload[..expected]))
    }
}
