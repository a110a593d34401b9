//! IUPAC nucleotide alphabet validation.
//!
//! Input is normalized by dropping every whitespace character and
//! uppercasing; the result must consist only of the 15 IUPAC codes.

use thiserror::Error;

/// Standard bases plus the ambiguity codes.
pub const IUPAC_ALPHABET: &[u8] = b"ACGTRYSWKMBDHVN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error(
        "Invalid sequence: only IUPAC nucleotide codes (A, C, G, T, R, Y, S, W, K, M, B, D, H, V, N) are allowed (found {found})"
    )]
    InvalidAlphabet { found: String },

    #[error("Sequence is required")]
    Empty,
}

pub fn is_iupac(c: char) -> bool {
    c.is_ascii() && IUPAC_ALPHABET.contains(&(c as u8))
}

/// Strip whitespace, uppercase and check the alphabet.
pub fn normalize_sequence(input: &str) -> Result<String, SequenceError> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();

    let mut bad: Vec<char> = Vec::new();
    for c in normalized.chars().filter(|c| !is_iupac(*c)) {
        if !bad.contains(&c) {
            bad.push(c);
        }
        if bad.len() == 5 {
            break;
        }
    }

    if bad.is_empty() {
        Ok(normalized)
    } else {
        let found = bad.iter().map(|c| format!("'{}'", c)).collect::<Vec<_>>().join(", ");
        Err(SequenceError::InvalidAlphabet { found })
    }
}

/// Like `normalize_sequence` but also rejects input that normalizes to nothing.
pub fn require_sequence(input: &str) -> Result<String, SequenceError> {
    let seq = normalize_sequence(input)?;
    if seq.is_empty() {
        return Err(SequenceError::Empty);
    }
    Ok(seq)
}
