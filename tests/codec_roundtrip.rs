// Integration tests for the frame codec strategy layer.
//
// These tests verify:
//   - Byte-exact roundtrip for every backend, sample width, and geometry
//   - Delta filter involution through the public API
//   - Identity backend aliasing (in-place, no bytes altered)
//   - Dictionary backend worst-case size bound
//   - Deflate trailer recomputation
//   - Cross-backend equivalence of decompressed output
//   - Precondition and corruption error paths

use framepress::{CompressionKind, RasterLayout, SampleWidth, checksum, delta};
use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};

// ===========================================================================
// Helpers
// ===========================================================================

/// Every compression kind enabled by the current feature set.
fn all_kinds() -> Vec<CompressionKind> {
    let mut kinds = vec![CompressionKind::None, CompressionKind::Entropy];
    #[cfg(feature = "dictionary")]
    kinds.push(CompressionKind::Dictionary);
    #[cfg(feature = "deflate")]
    kinds.push(CompressionKind::Deflate);
    kinds
}

fn random_frame(layout: &RasterLayout, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..layout.frame_len()).map(|_| rng.random()).collect()
}

/// A frame with strong vertical redundancy, the shape the delta filter
/// is designed for.
fn gradient_frame(layout: &RasterLayout) -> Vec<u8> {
    (0..layout.frame_len())
        .map(|i| ((i / layout.pitch) * 2 + (i % layout.pitch) / 16) as u8)
        .collect()
}

fn roundtrip(kind: CompressionKind, width: SampleWidth, layout: RasterLayout, original: &[u8]) {
    let mut codec = kind.codec(width);
    let mut frame = original.to_vec();
    let compressed = codec
        .compress_frame(&mut frame, layout)
        .unwrap_or_else(|e| panic!("{} compress failed: {e}", kind.name()));
    assert!(!compressed.is_empty(), "{} produced no output", kind.name());
    let mut payload = compressed.into_vec();

    let restored = codec
        .decompress_frame(&mut payload, layout)
        .unwrap_or_else(|e| panic!("{} decompress failed: {e}", kind.name()));
    assert_eq!(restored.len(), layout.frame_len());
    assert_eq!(
        restored.as_bytes(),
        original,
        "roundtrip mismatch for {} at {layout:?} / {width:?}",
        kind.name()
    );
}

// ===========================================================================
// Roundtrip law
// ===========================================================================

#[test]
fn roundtrip_every_backend_width_and_geometry() {
    let layouts = [
        RasterLayout::new(16, 3, 16),
        RasterLayout::new(48, 6, 48),
        // Unpadded rowsize and slack between padded rowsize and pitch.
        RasterLayout::new(20, 5, 32),
        RasterLayout::new(33, 7, 64),
    ];
    for kind in all_kinds() {
        for width in [SampleWidth::U8, SampleWidth::U16, SampleWidth::U32] {
            for layout in layouts {
                roundtrip(kind, width, layout, &random_frame(&layout, 11));
                roundtrip(kind, width, layout, &gradient_frame(&layout));
            }
        }
    }
}

#[test]
fn roundtrip_constant_frame() {
    // Delta output is almost all zeros; every backend must still restore
    // the constant frame exactly.
    let layout = RasterLayout::new(64, 16, 64);
    let original = vec![0x80u8; layout.frame_len()];
    for kind in all_kinds() {
        roundtrip(kind, SampleWidth::U8, layout, &original);
    }
}

// ===========================================================================
// Delta filter involution (public API)
// ===========================================================================

#[test]
fn delta_involution() {
    let original = random_frame(&RasterLayout::new(32, 6, 48), 5);
    for width in [SampleWidth::U8, SampleWidth::U16, SampleWidth::U32] {
        let mut image = original.clone();
        delta::encode(&mut image, 48, 32, 6, width);
        delta::decode(&mut image, 48, 32, 6, width);
        assert_eq!(image, original);
    }
}

#[test]
fn delta_concrete_scenario() {
    // 8-bit, height 4, rowsize = pitch = 16, constant-valued rows
    // 10, 12, 11, 20. First differences: 10, 2, 255 (11-12 mod 256), 9.
    let mut image = Vec::new();
    for v in [10u8, 12, 11, 20] {
        image.extend_from_slice(&[v; 16]);
    }
    let pristine = image.clone();

    delta::encode(&mut image, 16, 16, 4, SampleWidth::U8);
    let mut expected = Vec::new();
    for v in [10u8, 2, 255, 9] {
        expected.extend_from_slice(&[v; 16]);
    }
    assert_eq!(image, expected);

    delta::decode(&mut image, 16, 16, 4, SampleWidth::U8);
    assert_eq!(image, pristine);
}

// ===========================================================================
// Identity backend
// ===========================================================================

#[test]
fn identity_is_inplace_and_lossless() {
    let layout = RasterLayout::new(32, 5, 32);
    let original = random_frame(&layout, 3);
    let mut frame = original.clone();
    let mut codec = CompressionKind::None.codec(SampleWidth::U8);

    let out = codec.compress_frame(&mut frame, layout).unwrap();
    assert!(out.is_inplace());
    assert_eq!(out.len(), layout.frame_len());
    assert_eq!(out.as_bytes(), &original[..]);
    drop(out);
    assert_eq!(frame, original, "identity must not alter any byte");
}

#[test]
fn other_backends_allocate_fresh_output() {
    let layout = RasterLayout::new(32, 5, 32);
    for kind in all_kinds() {
        if kind == CompressionKind::None {
            continue;
        }
        let mut frame = gradient_frame(&layout);
        let mut codec = kind.codec(SampleWidth::U8);
        let out = codec.compress_frame(&mut frame, layout).unwrap();
        assert!(!out.is_inplace(), "{} must own its output", kind.name());
    }
}

// ===========================================================================
// Dictionary size bound
// ===========================================================================

#[cfg(feature = "dictionary")]
#[test]
fn dictionary_output_never_exceeds_bound() {
    for (layout, seed) in [
        (RasterLayout::new(16, 3, 16), 1u64),
        (RasterLayout::new(64, 12, 64), 2),
        (RasterLayout::new(128, 32, 128), 3),
    ] {
        let n = layout.frame_len();
        let mut codec = CompressionKind::Dictionary.codec(SampleWidth::U8);

        // Incompressible input is the worst case.
        let mut frame = random_frame(&layout, seed);
        let out = codec.compress_frame(&mut frame, layout).unwrap();
        assert!(
            out.len() <= n + n / 64 + 16 + 3,
            "compressed {} bytes into {}",
            n,
            out.len()
        );
    }
}

// ===========================================================================
// Deflate trailer
// ===========================================================================

#[cfg(feature = "deflate")]
#[test]
fn deflate_trailer_matches_recomputed_checksum() {
    let layout = RasterLayout::new(48, 9, 48);
    let mut frame = gradient_frame(&layout);
    let mut codec = CompressionKind::Deflate.codec(SampleWidth::U8);
    let payload = codec.compress_frame(&mut frame, layout).unwrap().into_vec();

    let split = payload.len() - 4;
    let stored = u32::from_le_bytes(payload[split..].try_into().unwrap());
    assert_eq!(stored, checksum::adler32(&payload[..split]));
}

// ===========================================================================
// Cross-backend equivalence
// ===========================================================================

#[test]
fn all_backends_decompress_to_identical_bytes() {
    let layout = RasterLayout::new(48, 8, 64);
    let original = gradient_frame(&layout);

    let mut outputs = Vec::new();
    let mut sizes = Vec::new();
    for kind in all_kinds() {
        let mut codec = kind.codec(SampleWidth::U16);
        let mut frame = original.clone();
        let mut payload = codec.compress_frame(&mut frame, layout).unwrap().into_vec();
        sizes.push((kind.name(), payload.len()));
        let restored = codec.decompress_frame(&mut payload, layout).unwrap();
        outputs.push(restored.into_vec());
    }

    for pair in outputs.windows(2) {
        assert_eq!(pair[0], pair[1], "backend outputs diverge: {sizes:?}");
    }
    assert_eq!(outputs[0], original);
}

// ===========================================================================
// Error paths
// ===========================================================================

#[test]
fn shallow_rasters_rejected() {
    let layout = RasterLayout::new(16, 2, 16);
    for kind in all_kinds() {
        let mut codec = kind.codec(SampleWidth::U8);
        let mut frame = vec![0u8; layout.frame_len()];
        assert!(
            codec.compress_frame(&mut frame, layout).is_err(),
            "{} accepted height 2",
            kind.name()
        );
    }
}

#[test]
fn misaligned_pitch_rejected() {
    let layout = RasterLayout::new(16, 4, 24);
    for kind in all_kinds() {
        let mut codec = kind.codec(SampleWidth::U8);
        let mut frame = vec![0u8; layout.frame_len()];
        assert!(codec.compress_frame(&mut frame, layout).is_err());
    }
}

#[test]
fn corrupt_payloads_never_return_output() {
    let layout = RasterLayout::new(32, 4, 32);
    for kind in all_kinds() {
        if kind == CompressionKind::None {
            continue;
        }
        let mut codec = kind.codec(SampleWidth::U8);
        let mut garbage = vec![0xA5u8; 64];
        assert!(
            codec.decompress_frame(&mut garbage, layout).is_err(),
            "{} accepted garbage",
            kind.name()
        );
    }
}

// ===========================================================================
// Property tests
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn roundtrip_random_rasters(
        lanes in 1usize..4,
        slack_lanes in 0usize..3,
        height in 3usize..10,
        width_sel in 0usize..3,
        seed in any::<u64>(),
    ) {
        let rowsize = lanes * 16;
        let pitch = rowsize + slack_lanes * 16;
        let layout = RasterLayout::new(rowsize, height, pitch);
        let width = [SampleWidth::U8, SampleWidth::U16, SampleWidth::U32][width_sel];
        let original = random_frame(&layout, seed);

        for kind in all_kinds() {
            let mut codec = kind.codec(width);
            let mut frame = original.clone();
            let mut payload = codec.compress_frame(&mut frame, layout).unwrap().into_vec();
            let restored = codec.decompress_frame(&mut payload, layout).unwrap();
            prop_assert_eq!(restored.as_bytes(), &original[..]);
        }
    }

    #[test]
    fn delta_roundtrip_random(
        lanes in 1usize..5,
        height in 1usize..12,
        width_sel in 0usize..3,
        seed in any::<u64>(),
    ) {
        let rowsize = lanes * 16;
        let width = [SampleWidth::U8, SampleWidth::U16, SampleWidth::U32][width_sel];
        let mut rng = StdRng::seed_from_u64(seed);
        let original: Vec<u8> = (0..rowsize * height).map(|_| rng.random()).collect();

        let mut image = original.clone();
        delta::encode(&mut image, rowsize, rowsize, height, width);
        delta::decode(&mut image, rowsize, rowsize, height, width);
        prop_assert_eq!(image, original);
    }
}
