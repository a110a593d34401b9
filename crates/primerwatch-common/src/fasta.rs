//! Multi-record FASTA text parsing for the import forms.
//!
//! Single pass over the lines; bodies are concatenated verbatim (sequence
//! validation is a separate step, see `sequence`).

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastaRecord {
    pub name: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FastaError {
    #[error("FASTA file must contain exactly one sequence (found {found})")]
    NotSingle { found: usize },

    #[error("No FASTA records found")]
    Empty,
}

/// Parse every `>`-headed record. Headers without a body are dropped.
pub fn parse_fasta(text: &str) -> Vec<FastaRecord> {
    let mut records = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut header_index = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('>') {
            flush(&mut current, &mut records);
            header_index += 1;
            let name = header
                .split_whitespace()
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| format!("sequence_{}", header_index));
            current = Some((name, String::new()));
        } else if !line.is_empty() {
            // Text before the first header has no record to belong to.
            if let Some((_, body)) = current.as_mut() {
                body.push_str(line);
            }
        }
    }
    flush(&mut current, &mut records);
    records
}

fn flush(current: &mut Option<(String, String)>, records: &mut Vec<FastaRecord>) {
    if let Some((name, sequence)) = current.take() {
        if !sequence.is_empty() {
            records.push(FastaRecord { name, sequence });
        }
    }
}

/// Parse text that must hold exactly one record (assay reference amplicon).
pub fn parse_single_fasta(text: &str) -> Result<FastaRecord, FastaError> {
    let mut records = parse_fasta(text);
    match records.len() {
        1 => Ok(records.remove(0)),
        found => Err(FastaError::NotSingle { found }),
    }
}

/// Does the text look like FASTA (first non-blank line is a header)?
pub fn looks_like_fasta(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .is_some_and(|l| l.starts_with('>'))
}
