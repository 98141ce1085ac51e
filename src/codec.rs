//! LZ-String base64 codec for Excalidraw scenes.
//!
//! The payload format is the one the Obsidian Excalidraw plugin writes into
//! `compressed-json` blocks: the scene JSON as UTF-16 code units, packed by
//! LZ-String's `compressToBase64`.

use std::collections::{HashMap, HashSet};

use crate::error::CodecError;
use crate::scene::Scene;

const BASE64_ALPHABET: &[u8; 65] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";
const BITS_PER_CHAR: u32 = 6;
/// Highest bit of a 6-bit group, where each read starts.
const RESET_VALUE: u32 = 32;

/// Serializes `scene` to JSON and compresses it.
pub fn compress(scene: &Scene) -> Result<String, CodecError> {
    let json = serde_json::to_string(scene)?;
    tracing::debug!(json_len = json.len(), "compressing scene");
    Ok(compress_to_base64(&json))
}

/// Reverses [`compress`]. Any damage to the payload is an error.
pub fn decompress(payload: &str) -> Result<Scene, CodecError> {
    let json = decompress_from_base64(payload)?;
    tracing::debug!(json_len = json.len(), "decompressed scene");
    Ok(serde_json::from_str(&json)?)
}

pub fn compress_to_base64(input: &str) -> String {
    let units: Vec<u16> = input.encode_utf16().collect();
    let mut out = compress_units(&units);
    match out.len() % 4 {
        1 => out.push_str("==="),
        2 => out.push_str("=="),
        3 => out.push('='),
        _ => {}
    }
    out
}

pub fn decompress_from_base64(input: &str) -> Result<String, CodecError> {
    if input.is_empty() {
        return Err(CodecError::Empty);
    }
    let values = input
        .char_indices()
        .map(|(offset, ch)| alphabet_index(ch).ok_or(CodecError::InvalidCharacter { ch, offset }))
        .collect::<Result<Vec<u32>, _>>()?;
    let units = decompress_units(&values)?;
    String::from_utf16(&units).map_err(|_| CodecError::InvalidUtf16)
}

fn alphabet_index(ch: char) -> Option<u32> {
    match ch {
        'A'..='Z' => Some(ch as u32 - 'A' as u32),
        'a'..='z' => Some(ch as u32 - 'a' as u32 + 26),
        '0'..='9' => Some(ch as u32 - '0' as u32 + 52),
        '+' => Some(62),
        '/' => Some(63),
        // Padding carries no bits.
        '=' => Some(0),
        _ => None,
    }
}

// ── Compression ─────────────────────────────────────────────────────

/// Bit sink producing one alphabet character per 6 bits.
struct BitWriter {
    out: String,
    value: u32,
    position: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            value: 0,
            position: 0,
        }
    }

    fn push_bit(&mut self, bit: u32) {
        self.value = (self.value << 1) | (bit & 1);
        if self.position == BITS_PER_CHAR - 1 {
            self.position = 0;
            self.out.push(char::from(BASE64_ALPHABET[self.value as usize]));
            self.value = 0;
        } else {
            self.position += 1;
        }
    }

    /// Writes `count` bits of `value`, least significant first.
    fn push_bits(&mut self, mut value: u32, count: u32) {
        for _ in 0..count {
            self.push_bit(value & 1);
            value >>= 1;
        }
    }

    fn finish(mut self) -> String {
        loop {
            self.value <<= 1;
            if self.position == BITS_PER_CHAR - 1 {
                self.out.push(char::from(BASE64_ALPHABET[self.value as usize]));
                break;
            }
            self.position += 1;
        }
        self.out
    }
}

struct Compressor {
    dictionary: HashMap<Vec<u16>, u32>,
    pending: HashSet<Vec<u16>>,
    enlarge_in: u32,
    dict_size: u32,
    num_bits: u32,
    writer: BitWriter,
}

impl Compressor {
    fn tick(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.num_bits;
            self.num_bits += 1;
        }
    }

    /// Emits the phrase `w`, either as a new literal or a dictionary code.
    fn emit(&mut self, w: &[u16]) {
        if self.pending.remove(w) {
            let unit = u32::from(w[0]);
            if unit < 256 {
                self.writer.push_bits(0, self.num_bits);
                self.writer.push_bits(unit, 8);
            } else {
                self.writer.push_bits(1, self.num_bits);
                self.writer.push_bits(unit, 16);
            }
            self.tick();
        } else {
            let code = self.dictionary.get(w).copied().unwrap_or(0);
            self.writer.push_bits(code, self.num_bits);
        }
        self.tick();
    }
}

fn compress_units(units: &[u16]) -> String {
    let mut state = Compressor {
        dictionary: HashMap::new(),
        pending: HashSet::new(),
        enlarge_in: 2,
        dict_size: 3,
        num_bits: 2,
        writer: BitWriter::new(),
    };
    let mut w: Vec<u16> = Vec::new();

    for &unit in units {
        let c = vec![unit];
        if !state.dictionary.contains_key(&c) {
            state.dictionary.insert(c.clone(), state.dict_size);
            state.dict_size += 1;
            state.pending.insert(c.clone());
        }

        let mut wc = w.clone();
        wc.push(unit);
        if state.dictionary.contains_key(&wc) {
            w = wc;
        } else {
            state.emit(&w);
            state.dictionary.insert(wc, state.dict_size);
            state.dict_size += 1;
            w = c;
        }
    }

    if !w.is_empty() {
        state.emit(&w);
    }

    // End of stream.
    state.writer.push_bits(2, state.num_bits);
    state.writer.finish()
}

// ── Decompression ───────────────────────────────────────────────────

struct BitReader<'a> {
    values: &'a [u32],
    value: u32,
    position: u32,
    index: usize,
}

impl<'a> BitReader<'a> {
    fn new(values: &'a [u32]) -> Self {
        Self {
            values,
            value: values.first().copied().unwrap_or(0),
            position: RESET_VALUE,
            index: 1,
        }
    }

    /// Reads `count` bits, least significant first. Past the end reads zeros.
    fn read(&mut self, count: u32) -> u32 {
        let mut bits = 0;
        for shift in 0..count {
            let bit = self.value & self.position;
            self.position >>= 1;
            if self.position == 0 {
                self.position = RESET_VALUE;
                self.value = self.values.get(self.index).copied().unwrap_or(0);
                self.index += 1;
            }
            if bit > 0 {
                bits |= 1 << shift;
            }
        }
        bits
    }

    fn exhausted(&self) -> bool {
        self.index > self.values.len()
    }
}

fn decompress_units(values: &[u32]) -> Result<Vec<u16>, CodecError> {
    let mut reader = BitReader::new(values);
    // Codes 0..=2 are control codes and never index the dictionary.
    let mut dictionary: Vec<Vec<u16>> = vec![Vec::new(); 3];
    let mut enlarge_in: u32 = 4;
    let mut num_bits: u32 = 3;

    let first = match reader.read(2) {
        0 => reader.read(8) as u16,
        1 => reader.read(16) as u16,
        _ => return Ok(Vec::new()),
    };
    let mut w = vec![first];
    dictionary.push(w.clone());
    let mut result = w.clone();

    loop {
        if reader.exhausted() {
            return Err(CodecError::Truncated);
        }

        let mut code = reader.read(num_bits) as usize;
        match code {
            0 | 1 => {
                let width = if code == 0 { 8 } else { 16 };
                dictionary.push(vec![reader.read(width) as u16]);
                code = dictionary.len() - 1;
                enlarge_in -= 1;
            }
            // A marker assembled from bits past the end is not a real one.
            2 if reader.exhausted() => return Err(CodecError::Truncated),
            2 => return Ok(result),
            _ => {}
        }

        if enlarge_in == 0 {
            enlarge_in = 1 << num_bits;
            num_bits += 1;
        }

        let entry = if code < dictionary.len() && code > 2 {
            dictionary[code].clone()
        } else if code == dictionary.len() {
            let mut entry = w.clone();
            entry.push(w[0]);
            entry
        } else {
            return Err(CodecError::BadReference { code });
        };

        result.extend_from_slice(&entry);
        let mut next = w;
        next.push(entry[0]);
        dictionary.push(next);
        enlarge_in -= 1;
        w = entry;

        if enlarge_in == 0 {
            enlarge_in = 1 << num_bits;
            num_bits += 1;
        }
    }
}
