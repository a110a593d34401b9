//! Same-origin proxy for the NCBI taxonomy lookup.

use axum::{
    extract::{Path, State},
    Json,
};

use primerwatch_client::taxonomy::{parse_taxid, TaxonomyRecord};
use primerwatch_common::error::ApiError;

use crate::state::SharedState;

/// `GET /api/taxonomy/{taxid}` → `{ "taxid", "species_name", "rank" }`
pub async fn api_taxonomy_lookup(
    State(state): State<SharedState>,
    Path(raw): Path<String>,
) -> Result<Json<TaxonomyRecord>, ApiError> {
    let taxid = parse_taxid(&raw)?;
    Ok(Json(state.taxonomy.lookup(taxid).await?))
}
