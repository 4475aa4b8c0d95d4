// Vertical predictive delta filter.
//
// Replaces each sample with its difference from the sample directly above
// it in the same column (row -1 is implicitly zero), reducing entropy for
// the byte compressors that run afterwards. The inverse is a running prefix
// sum down each column and must run top to bottom, because each row depends
// on the previous row's reconstructed value.
//
// The filter walks 16-byte column lanes and processes one full lane per row
// using platform intrinsics (SSE2 on x86_64, NEON on aarch64) with a scalar
// fallback that is bit-identical. Arithmetic is wraparound at the sample
// width; 4-byte samples reuse the 32-bit integer lanes, which keeps the
// transform bit-reversible for float planes without IEEE addition.

use crate::raster::{LANE_WIDTH, SampleWidth};

/// Function pointer type for a delta-filter pass over one raster.
type FilterFn = fn(&mut [u8], usize, usize, usize);

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Delta-encode `image` in place.
///
/// `rowsize` must already be padded to a multiple of 16 and must not exceed
/// `pitch`. Columns between `rowsize` and `pitch` are left untouched.
///
/// # Panics
/// Panics if `rowsize` is not a multiple of 16, exceeds `pitch`, or the
/// buffer is too short for `height` rows.
pub fn encode(image: &mut [u8], pitch: usize, rowsize: usize, height: usize, width: SampleWidth) {
    if check_geometry(image, pitch, rowsize, height) {
        encode_fn(width)(image, pitch, rowsize, height);
    }
}

/// Exact inverse of [`encode`]: prefix-sum each column in place, top to
/// bottom. Same geometry requirements as [`encode`].
pub fn decode(image: &mut [u8], pitch: usize, rowsize: usize, height: usize, width: SampleWidth) {
    if check_geometry(image, pitch, rowsize, height) {
        decode_fn(width)(image, pitch, rowsize, height);
    }
}

/// Validate lane geometry. Returns false for the degenerate empty cases.
fn check_geometry(image: &[u8], pitch: usize, rowsize: usize, height: usize) -> bool {
    if rowsize == 0 || height == 0 {
        return false;
    }
    assert!(
        rowsize % LANE_WIDTH == 0,
        "rowsize {rowsize} not padded to the {LANE_WIDTH}-byte lane width"
    );
    assert!(rowsize <= pitch, "rowsize {rowsize} exceeds pitch {pitch}");
    let needed = (height - 1) * pitch + rowsize;
    assert!(
        image.len() >= needed,
        "raster buffer too short: need {needed} bytes, have {}",
        image.len()
    );
    true
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Pick the best encode kernel for the current CPU and sample width.
#[inline]
fn encode_fn(width: SampleWidth) -> FilterFn {
    #[cfg(target_arch = "x86_64")]
    {
        // SSE2 is part of the x86_64 baseline.
        return match width {
            SampleWidth::U8 => encode_sse2_call::<1>,
            SampleWidth::U16 => encode_sse2_call::<2>,
            SampleWidth::U32 => encode_sse2_call::<4>,
        };
    }

    #[cfg(target_arch = "aarch64")]
    {
        return match width {
            SampleWidth::U8 => encode_neon_call::<1>,
            SampleWidth::U16 => encode_neon_call::<2>,
            SampleWidth::U32 => encode_neon_call::<4>,
        };
    }

    #[allow(unreachable_code)]
    match width {
        SampleWidth::U8 => encode_scalar::<1>,
        SampleWidth::U16 => encode_scalar::<2>,
        SampleWidth::U32 => encode_scalar::<4>,
    }
}

/// Pick the best decode kernel for the current CPU and sample width.
#[inline]
fn decode_fn(width: SampleWidth) -> FilterFn {
    #[cfg(target_arch = "x86_64")]
    {
        return match width {
            SampleWidth::U8 => decode_sse2_call::<1>,
            SampleWidth::U16 => decode_sse2_call::<2>,
            SampleWidth::U32 => decode_sse2_call::<4>,
        };
    }

    #[cfg(target_arch = "aarch64")]
    {
        return match width {
            SampleWidth::U8 => decode_neon_call::<1>,
            SampleWidth::U16 => decode_neon_call::<2>,
            SampleWidth::U32 => decode_neon_call::<4>,
        };
    }

    #[allow(unreachable_code)]
    match width {
        SampleWidth::U8 => decode_scalar::<1>,
        SampleWidth::U16 => decode_scalar::<2>,
        SampleWidth::U32 => decode_scalar::<4>,
    }
}

// ---------------------------------------------------------------------------
// x86_64 SSE2 kernels (16 bytes per lane per row)
// ---------------------------------------------------------------------------

#[cfg(target_arch = "x86_64")]
#[inline]
fn encode_sse2_call<const W: usize>(image: &mut [u8], pitch: usize, rowsize: usize, height: usize) {
    // Safety: SSE2 is guaranteed on x86_64; geometry checked by the caller.
    unsafe { encode_sse2::<W>(image, pitch, rowsize, height) }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn decode_sse2_call<const W: usize>(image: &mut [u8], pitch: usize, rowsize: usize, height: usize) {
    // Safety: SSE2 is guaranteed on x86_64; geometry checked by the caller.
    unsafe { decode_sse2::<W>(image, pitch, rowsize, height) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn encode_sse2<const W: usize>(
    image: &mut [u8],
    pitch: usize,
    rowsize: usize,
    height: usize,
) {
    use std::arch::x86_64::*;

    unsafe {
        for x in (0..rowsize).step_by(LANE_WIDTH) {
            let mut p = image.as_mut_ptr().add(x);
            let mut top = _mm_setzero_si128();
            for _ in 0..height {
                let cur = _mm_loadu_si128(p as *const __m128i);
                let diff = match W {
                    1 => _mm_sub_epi8(cur, top),
                    2 => _mm_sub_epi16(cur, top),
                    _ => _mm_sub_epi32(cur, top),
                };
                _mm_storeu_si128(p as *mut __m128i, diff);
                top = cur;
                p = p.add(pitch);
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn decode_sse2<const W: usize>(
    image: &mut [u8],
    pitch: usize,
    rowsize: usize,
    height: usize,
) {
    use std::arch::x86_64::*;

    unsafe {
        for x in (0..rowsize).step_by(LANE_WIDTH) {
            let mut p = image.as_mut_ptr().add(x);
            let mut top = _mm_setzero_si128();
            for _ in 0..height {
                let src = _mm_loadu_si128(p as *const __m128i);
                top = match W {
                    1 => _mm_add_epi8(top, src),
                    2 => _mm_add_epi16(top, src),
                    _ => _mm_add_epi32(top, src),
                };
                _mm_storeu_si128(p as *mut __m128i, top);
                p = p.add(pitch);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// aarch64 NEON kernels (16 bytes per lane per row)
// ---------------------------------------------------------------------------

#[cfg(target_arch = "aarch64")]
#[inline]
fn encode_neon_call<const W: usize>(image: &mut [u8], pitch: usize, rowsize: usize, height: usize) {
    // Safety: NEON is mandatory on aarch64; geometry checked by the caller.
    unsafe { encode_neon::<W>(image, pitch, rowsize, height) }
}

#[cfg(target_arch = "aarch64")]
#[inline]
fn decode_neon_call<const W: usize>(image: &mut [u8], pitch: usize, rowsize: usize, height: usize) {
    // Safety: NEON is mandatory on aarch64; geometry checked by the caller.
    unsafe { decode_neon::<W>(image, pitch, rowsize, height) }
}

#[cfg(target_arch = "aarch64")]
unsafe fn encode_neon<const W: usize>(
    image: &mut [u8],
    pitch: usize,
    rowsize: usize,
    height: usize,
) {
    use std::arch::aarch64::*;

    unsafe {
        for x in (0..rowsize).step_by(LANE_WIDTH) {
            let mut p = image.as_mut_ptr().add(x);
            let mut top = vdupq_n_u8(0);
            for _ in 0..height {
                let cur = vld1q_u8(p);
                let diff = match W {
                    1 => vsubq_u8(cur, top),
                    2 => vreinterpretq_u8_u16(vsubq_u16(
                        vreinterpretq_u16_u8(cur),
                        vreinterpretq_u16_u8(top),
                    )),
                    _ => vreinterpretq_u8_u32(vsubq_u32(
                        vreinterpretq_u32_u8(cur),
                        vreinterpretq_u32_u8(top),
                    )),
                };
                vst1q_u8(p, diff);
                top = cur;
                p = p.add(pitch);
            }
        }
    }
}

#[cfg(target_arch = "aarch64")]
unsafe fn decode_neon<const W: usize>(
    image: &mut [u8],
    pitch: usize,
    rowsize: usize,
    height: usize,
) {
    use std::arch::aarch64::*;

    unsafe {
        for x in (0..rowsize).step_by(LANE_WIDTH) {
            let mut p = image.as_mut_ptr().add(x);
            let mut top = vdupq_n_u8(0);
            for _ in 0..height {
                let src = vld1q_u8(p);
                top = match W {
                    1 => vaddq_u8(top, src),
                    2 => vreinterpretq_u8_u16(vaddq_u16(
                        vreinterpretq_u16_u8(top),
                        vreinterpretq_u16_u8(src),
                    )),
                    _ => vreinterpretq_u8_u32(vaddq_u32(
                        vreinterpretq_u32_u8(top),
                        vreinterpretq_u32_u8(src),
                    )),
                };
                vst1q_u8(p, top);
                p = p.add(pitch);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar fallback (bit-identical to the vector kernels)
// ---------------------------------------------------------------------------

fn encode_scalar<const W: usize>(image: &mut [u8], pitch: usize, rowsize: usize, height: usize) {
    for x in (0..rowsize).step_by(LANE_WIDTH) {
        for lane in (0..LANE_WIDTH).step_by(W) {
            let col = x + lane;
            let mut top: u32 = 0;
            let mut off = col;
            for _ in 0..height {
                let cur = read_sample::<W>(image, off);
                write_sample::<W>(image, off, cur.wrapping_sub(top));
                top = cur;
                off += pitch;
            }
        }
    }
}

fn decode_scalar<const W: usize>(image: &mut [u8], pitch: usize, rowsize: usize, height: usize) {
    for x in (0..rowsize).step_by(LANE_WIDTH) {
        for lane in (0..LANE_WIDTH).step_by(W) {
            let col = x + lane;
            let mut top: u32 = 0;
            let mut off = col;
            for _ in 0..height {
                top = top.wrapping_add(read_sample::<W>(image, off));
                write_sample::<W>(image, off, top);
                off += pitch;
            }
        }
    }
}

/// Read one native-endian sample of `W` bytes as a u32.
#[inline(always)]
fn read_sample<const W: usize>(buf: &[u8], pos: usize) -> u32 {
    match W {
        1 => u32::from(buf[pos]),
        2 => u32::from(u16::from_ne_bytes([buf[pos], buf[pos + 1]])),
        _ => u32::from_ne_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]),
    }
}

/// Write the low `W` bytes of `value` native-endian. Truncation makes the
/// scalar arithmetic modulo 2^(8*W), matching the vector lanes.
#[inline(always)]
fn write_sample<const W: usize>(buf: &mut [u8], pos: usize, value: u32) {
    let bytes = value.to_ne_bytes();
    buf[pos..pos + W].copy_from_slice(&bytes[..W]);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
