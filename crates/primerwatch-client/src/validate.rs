//! Form input checks run before a request is issued.
//!
//! The backend re-checks everything; these only save a round trip and give
//! the same messages inline.

use primerwatch_common::backend::{NewAssay, NewOligo, NewTaxId};
use primerwatch_common::error::{PrimerwatchError, Result};
use primerwatch_common::fasta::{looks_like_fasta, parse_single_fasta};
use primerwatch_common::sequence::require_sequence;

/// Reference amplicon pulled out of the assay form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpliconDraft {
    pub name: Option<String>,
    pub sequence: String,
}

/// Accept either a single-record FASTA or a bare sequence.
pub fn amplicon_from_input(text: &str) -> Result<AmpliconDraft> {
    if looks_like_fasta(text) {
        let record = parse_single_fasta(text).map_err(|e| PrimerwatchError::validation(e.to_string()))?;
        let sequence = require_sequence(&record.sequence)
            .map_err(|e| PrimerwatchError::validation(e.to_string()))?;
        return Ok(AmpliconDraft { name: Some(record.name), sequence });
    }
    let sequence = require_sequence(text).map_err(|e| PrimerwatchError::validation(e.to_string()))?;
    Ok(AmpliconDraft { name: None, sequence })
}

fn required(label: &str, value: &str) -> Result<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(PrimerwatchError::validation(format!("{} is required", label)));
    }
    Ok(v.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn assay_draft(
    name: &str,
    target_taxid_id: Option<i64>,
    target_gene: Option<&str>,
    amplicon_text: &str,
) -> Result<NewAssay> {
    let name = required("Assay name", name)?;
    let amplicon = amplicon_from_input(amplicon_text)?;
    Ok(NewAssay {
        name,
        target_taxid_id,
        target_gene: optional(target_gene),
        ref_name: amplicon.name,
        ref_sequence: amplicon.sequence,
    })
}

pub fn oligo_draft(name: &str, sequence: &str, assay_id: Option<i64>) -> Result<NewOligo> {
    let name = required("Sequence name", name)?;
    let sequence = require_sequence(sequence).map_err(|e| PrimerwatchError::validation(e.to_string()))?;
    Ok(NewOligo { name, sequence, assay_id })
}

pub fn taxid_draft(taxid: i64, species_name: Option<&str>) -> Result<NewTaxId> {
    if taxid <= 0 {
        return Err(PrimerwatchError::validation("TaxID must be a positive integer"));
    }
    Ok(NewTaxId { taxid, species_name: optional(species_name) })
}
