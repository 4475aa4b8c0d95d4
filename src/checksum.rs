// Adler-32 for the deflate backend's payload trailer.
//
// Uses simd-adler32 (automatic SIMD dispatch) when the `adler32` feature is
// enabled; otherwise a scalar mod-65521 implementation. Both produce
// identical values.

/// Byte length of the trailer appended after a deflate payload.
pub const TRAILER_LEN: usize = 4;

/// Compute the Adler-32 checksum of `data`.
pub fn adler32(data: &[u8]) -> u32 {
    #[cfg(feature = "adler32")]
    {
        let mut hasher = simd_adler32::Adler32::new();
        hasher.write(data);
        hasher.finish()
    }
    #[cfg(not(feature = "adler32"))]
    {
        const MOD_ADLER: u32 = 65521;
        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for &byte in data {
            a = (a + u32::from(byte)) % MOD_ADLER;
            b = (b + a) % MOD_ADLER;
        }
        (b << 16) | a
    }
}
