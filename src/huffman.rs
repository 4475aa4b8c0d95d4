// Static canonical Huffman coding for the entropy backend.
//
// Wire format:
//   [128-byte header]  256 code lengths, packed two 4-bit values per byte
//   [bitstream]        MSB-first canonical codes, one per input byte
//
// Code lengths are capped at 15 bits so they pack into nibbles. The decoder
// needs the exact decompressed length, which the frame transport carries
// out-of-band; there is no terminator symbol.

use thiserror::Error;

/// Byte length of the packed code-length header.
pub const HEADER_LEN: usize = 128;

/// Maximum code length in bits (must fit a 4-bit header nibble).
const MAX_CODE_BITS: u32 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HuffmanError {
    #[error("input shorter than the {HEADER_LEN}-byte code-length header")]
    MissingHeader,
    #[error("code-length table does not describe a prefix code")]
    InvalidTable,
    #[error("bitstream contains an invalid prefix code")]
    InvalidCode,
    #[error("bitstream truncated before the expected output length")]
    Truncated,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compress `input` into a self-describing Huffman stream.
///
/// The output always begins with the 128-byte code-length header, so the
/// result can exceed the input length for small or incompressible data.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut freq = [0u64; 256];
    for &b in input {
        freq[b as usize] += 1;
    }
    let lengths = build_code_lengths(&freq);
    let codes = canonical_codes(&lengths);

    let mut out = Vec::with_capacity(HEADER_LEN + input.len() * 2);
    for pair in lengths.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }

    let mut writer = BitWriter::new(out);
    for &b in input {
        writer.push(codes[b as usize], u32::from(lengths[b as usize]));
    }
    writer.finish()
}

/// Decompress a stream produced by [`compress`] into exactly `out_len` bytes.
pub fn decompress(input: &[u8], out_len: usize) -> Result<Vec<u8>, HuffmanError> {
    if out_len == 0 {
        return Ok(Vec::new());
    }
    if input.len() < HEADER_LEN {
        return Err(HuffmanError::MissingHeader);
    }

    let mut lengths = [0u8; 256];
    for (i, &b) in input[..HEADER_LEN].iter().enumerate() {
        lengths[2 * i] = b >> 4;
        lengths[2 * i + 1] = b & 0x0F;
    }

    let decoder = Decoder::new(&lengths)?;
    let mut reader = BitReader::new(&input[HEADER_LEN..]);
    let mut out = Vec::with_capacity(out_len);
    for _ in 0..out_len {
        out.push(decoder.decode_symbol(&mut reader)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Code construction
// ---------------------------------------------------------------------------

/// Derive length-limited Huffman code lengths from symbol frequencies.
fn build_code_lengths(freq: &[u64; 256]) -> [u8; 256] {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    let mut lengths = [0u8; 256];
    let used: Vec<usize> = (0..256).filter(|&s| freq[s] > 0).collect();
    match used.len() {
        0 => return lengths,
        1 => {
            // A lone symbol still needs one bit so the stream advances.
            lengths[used[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    // Standard heap construction; leaves first, internal nodes appended,
    // parent links let us read leaf depths back out afterwards.
    let mut node_freq: Vec<u64> = used.iter().map(|&s| freq[s]).collect();
    let mut parent: Vec<usize> = vec![usize::MAX; used.len()];
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = node_freq
        .iter()
        .enumerate()
        .map(|(i, &f)| Reverse((f, i)))
        .collect();

    while heap.len() > 1 {
        let Reverse((fa, a)) = heap.pop().unwrap();
        let Reverse((fb, b)) = heap.pop().unwrap();
        let id = node_freq.len();
        node_freq.push(fa + fb);
        parent.push(usize::MAX);
        parent[a] = id;
        parent[b] = id;
        heap.push(Reverse((fa + fb, id)));
    }

    for (i, &sym) in used.iter().enumerate() {
        let mut depth = 0u32;
        let mut node = i;
        while parent[node] != usize::MAX {
            node = parent[node];
            depth += 1;
        }
        lengths[sym] = depth.min(MAX_CODE_BITS) as u8;
    }

    // Clamping to 15 bits can overflow the Kraft budget. Lengthen the
    // deepest codes still under the cap until the lengths describe a valid
    // prefix code again; each step restores 2^(15-len-1) of budget.
    let mut kraft: u64 = used
        .iter()
        .map(|&s| 1u64 << (MAX_CODE_BITS - u32::from(lengths[s])))
        .sum();
    while kraft > 1 << MAX_CODE_BITS {
        let sym = used
            .iter()
            .copied()
            .filter(|&s| u32::from(lengths[s]) < MAX_CODE_BITS)
            .max_by_key(|&s| lengths[s])
            .expect("Kraft overflow with every code at maximum length");
        kraft -= 1 << (MAX_CODE_BITS - u32::from(lengths[sym]) - 1);
        lengths[sym] += 1;
    }

    lengths
}

/// Assign canonical codes: within a length, codes are consecutive and
/// ordered by symbol value.
fn canonical_codes(lengths: &[u8; 256]) -> [u32; 256] {
    let mut bl_count = [0u32; MAX_CODE_BITS as usize + 1];
    for &l in lengths.iter() {
        bl_count[l as usize] += 1;
    }
    bl_count[0] = 0;

    let mut next_code = [0u32; MAX_CODE_BITS as usize + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_CODE_BITS as usize {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    let mut codes = [0u32; 256];
    for (sym, &len) in lengths.iter().enumerate() {
        if len > 0 {
            codes[sym] = next_code[len as usize];
            next_code[len as usize] += 1;
        }
    }
    codes
}

// ---------------------------------------------------------------------------
// Canonical decoder
// ---------------------------------------------------------------------------

struct Decoder {
    counts: [u32; MAX_CODE_BITS as usize + 1],
    first_code: [u32; MAX_CODE_BITS as usize + 1],
    offsets: [u32; MAX_CODE_BITS as usize + 1],
    /// Symbols ordered by (code length, symbol value).
    sorted: Vec<u8>,
}

impl Decoder {
    fn new(lengths: &[u8; 256]) -> Result<Self, HuffmanError> {
        let mut counts = [0u32; MAX_CODE_BITS as usize + 1];
        for &l in lengths.iter() {
            counts[l as usize] += 1;
        }
        counts[0] = 0;

        let kraft: u64 = (1..=MAX_CODE_BITS as usize)
            .map(|len| u64::from(counts[len]) << (MAX_CODE_BITS as usize - len))
            .sum();
        if kraft == 0 || kraft > 1 << MAX_CODE_BITS {
            return Err(HuffmanError::InvalidTable);
        }

        let mut first_code = [0u32; MAX_CODE_BITS as usize + 1];
        let mut offsets = [0u32; MAX_CODE_BITS as usize + 1];
        let mut code = 0u32;
        let mut offset = 0u32;
        for bits in 1..=MAX_CODE_BITS as usize {
            code = (code + counts[bits - 1]) << 1;
            first_code[bits] = code;
            offsets[bits] = offset;
            offset += counts[bits];
        }

        let mut sorted = Vec::with_capacity(offset as usize);
        for len in 1..=MAX_CODE_BITS as usize {
            for (sym, &l) in lengths.iter().enumerate() {
                if l as usize == len {
                    sorted.push(sym as u8);
                }
            }
        }

        Ok(Self {
            counts,
            first_code,
            offsets,
            sorted,
        })
    }

    fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u8, HuffmanError> {
        let mut code = 0u32;
        for len in 1..=MAX_CODE_BITS as usize {
            code = (code << 1) | reader.read_bit()?;
            let count = self.counts[len];
            if count > 0 {
                let first = self.first_code[len];
                if code >= first && code < first + count {
                    let idx = self.offsets[len] + (code - first);
                    return Ok(self.sorted[idx as usize]);
                }
            }
        }
        Err(HuffmanError::InvalidCode)
    }
}

// ---------------------------------------------------------------------------
// Bit I/O (MSB-first)
// ---------------------------------------------------------------------------

struct BitWriter {
    out: Vec<u8>,
    acc: u64,
    nbits: u32,
}

impl BitWriter {
    fn new(out: Vec<u8>) -> Self {
        Self {
            out,
            acc: 0,
            nbits: 0,
        }
    }

    #[inline]
    fn push(&mut self, code: u32, len: u32) {
        self.acc = (self.acc << len) | u64::from(code);
        self.nbits += len;
        while self.nbits >= 8 {
            self.nbits -= 8;
            self.out.push((self.acc >> self.nbits) as u8);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push((self.acc << (8 - self.nbits)) as u8);
        }
        self.out
    }
}

struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    acc: u32,
    nbits: u32,
}

impl<'a> BitReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            acc: 0,
            nbits: 0,
        }
    }

    #[inline]
    fn read_bit(&mut self) -> Result<u32, HuffmanError> {
        if self.nbits == 0 {
            if self.pos >= self.input.len() {
                return Err(HuffmanError::Truncated);
            }
            self.acc = u32::from(self.input[self.pos]);
            self.pos += 1;
            self.nbits = 8;
        }
        self.nbits -= 1;
        Ok((self.acc >> self.nbits) & 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
