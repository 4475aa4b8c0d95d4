// Raster buffer geometry and sample layout.
//
// A raster is a contiguous byte region of `height` rows, each holding
// `rowsize` valid bytes, with a row stride of `pitch` bytes. The delta
// filter processes 16-byte column lanes, so `rowsize` is rounded up to a
// multiple of the lane width before any transform runs.

/// Width in bytes of one delta-filter column lane.
pub const LANE_WIDTH: usize = 16;

/// Byte width of one sample component.
///
/// Four-byte samples (e.g. 32-bit float planes) are transformed with 32-bit
/// integer lanes: the delta filter only needs bit-reversibility, not
/// numerically meaningful arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleWidth {
    /// 8-bit integer samples.
    U8,
    /// 16-bit integer samples.
    U16,
    /// 32-bit samples treated as bit patterns.
    U32,
}

impl SampleWidth {
    /// Size of one sample in bytes (1, 2, or 4).
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }

    /// Map a component byte width (1, 2, or 4) to a sample width.
    pub const fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            4 => Some(Self::U32),
            _ => None,
        }
    }
}

/// Geometry of one raster frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterLayout {
    /// Valid bytes per row, before lane padding.
    pub rowsize: usize,
    /// Number of rows. The delta filter requires more than two.
    pub height: usize,
    /// Row stride in bytes. Must be a multiple of 16 and at least the
    /// padded rowsize.
    pub pitch: usize,
}

impl RasterLayout {
    /// Describe a raster of `height` rows of `rowsize` valid bytes with a
    /// stride of `pitch` bytes.
    pub const fn new(rowsize: usize, height: usize, pitch: usize) -> Self {
        Self {
            rowsize,
            height,
            pitch,
        }
    }

    /// Total frame length in bytes (`pitch * height`). This is the span the
    /// byte compressors operate on and the exact decompressed size.
    #[inline]
    pub const fn frame_len(&self) -> usize {
        self.pitch * self.height
    }

    /// `rowsize` rounded up to a multiple of the 16-byte lane width.
    #[inline]
    pub const fn padded_rowsize(&self) -> usize {
        (self.rowsize + LANE_WIDTH - 1) & !(LANE_WIDTH - 1)
    }
}
