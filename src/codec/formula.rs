//! Formula Codec
//!
//! Reversible run-length stage with a single reserved escape byte.
//!
//! ## Token Stream
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────┐
//! │ "KOLI" (4)   │ tokens ...                                   │
//! └──────────────┴──────────────────────────────────────────────┘
//!
//!   0xFF 0x00          literal 0xFF
//!   0xFF n v  (n>0)    n copies of v
//!   b         (b≠0xFF) literal b
//! ```

use crate::error::{KolibriError, Result};

use super::FORMULA_MAGIC;

/// Reserved escape byte; never appears unescaped in the token stream
pub const ESCAPE: u8 = 0xFF;

/// Shortest run turned into a run token
pub const MIN_RUN: usize = 3;

/// Longest run a single token can describe
pub const MAX_RUN: usize = 255;

/// Encode `data` into the magic-prefixed token stream
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(FORMULA_MAGIC.len() + data.len() + data.len() / 8);
    out.extend_from_slice(FORMULA_MAGIC);

    let mut pos = 0;
    while pos < data.len() {
        let byte = data[pos];

        if byte == ESCAPE {
            out.extend_from_slice(&[ESCAPE, 0x00]);
            pos += 1;
            continue;
        }

        let run = run_length(&data[pos..]);
        if run >= MIN_RUN {
            out.extend_from_slice(&[ESCAPE, run as u8, byte]);
            pos += run;
        } else {
            out.push(byte);
            pos += 1;
        }
    }

    out
}

/// Decode a token stream produced by [`encode`].
///
/// Input without the magic prefix is returned unchanged. A token cut off
/// by the end of the stream is an error rather than partial output.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    if !has_magic(data) {
        return Ok(data.to_vec());
    }

    let stream = &data[FORMULA_MAGIC.len()..];
    let mut out = Vec::with_capacity(stream.len() + stream.len() / 4);

    let mut pos = 0;
    while pos < stream.len() {
        let byte = stream[pos];
        if byte != ESCAPE {
            out.push(byte);
            pos += 1;
            continue;
        }

        match stream.get(pos + 1) {
            Some(0x00) => {
                out.push(ESCAPE);
                pos += 2;
            }
            Some(&count) => {
                let value = *stream.get(pos + 2).ok_or_else(|| {
                    KolibriError::Codec(format!(
                        "run token at offset {} is missing its value byte",
                        pos
                    ))
                })?;
                out.resize(out.len() + count as usize, value);
                pos += 3;
            }
            None => {
                return Err(KolibriError::Codec(format!(
                    "dangling escape byte at offset {}",
                    pos
                )));
            }
        }
    }

    Ok(out)
}

/// True if `data` starts with the formula magic
pub fn has_magic(data: &[u8]) -> bool {
    data.len() >= FORMULA_MAGIC.len() && &data[..FORMULA_MAGIC.len()] == FORMULA_MAGIC
}

/// Upper bound on the encoded size of `len` input bytes (every byte escaped)
pub fn max_encoded_len(len: usize) -> usize {
    FORMULA_MAGIC.len().saturating_add(len.saturating_mul(2))
}

/// Length of the run of identical bytes at the start of `data`, capped at `MAX_RUN`
fn run_length(data: &[u8]) -> usize {
    let first = data[0];
    data.iter()
        .take(MAX_RUN)
        .take_while(|&&b| b == first)
        .count()
}
