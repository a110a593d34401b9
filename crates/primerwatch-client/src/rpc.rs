//! HTTP client for the managed backend.
//!
//! Endpoints used:
//!   rpc:   POST {url}/rest/v1/rpc/<function>   (JSON body, `p_`-prefixed params)
//!   token: POST {url}/auth/v1/token?grant_type=password
//!   logout POST {url}/auth/v1/logout
//!
//! Every call carries the project `apikey` header and the caller's bearer token.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use primerwatch_common::backend::*;
use primerwatch_common::entities::*;
use primerwatch_common::error::{classify_backend_message, PrimerwatchError, Result};
use primerwatch_config::BackendConfig;

pub struct RpcClient {
    client: Client,
    base_url: String,
    anon_key: Option<SecretString>,
}

impl RpcClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PrimerwatchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key(),
        })
    }

    fn with_apikey(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.anon_key {
            Some(key) => req.header("apikey", key.expose_secret()),
            None => req,
        }
    }

    /// Invoke one remote procedure and decode its JSON result.
    #[instrument(skip(self, session, params))]
    async fn call(&self, session: &Session, function: &str, params: Value) -> Result<Value> {
        let token = session.token()?;
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        debug!(%url, "rpc call");

        let req = self.with_apikey(self.client.post(&url)).bearer_auth(token).json(&params);
        check_response(req.send().await?, function).await
    }
}

async fn check_response(resp: Response, function: &str) -> Result<Value> {
    let status = resp.status().as_u16();
    let bytes = resp.bytes().await?;
    if status >= 400 {
        let message = error_message(&bytes);
        warn!(function, status, %message, "backend rejected call");
        return Err(classify_backend_message(status, &message));
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pull the human-readable message out of a PostgREST / GoTrue error body.
fn error_message(bytes: &[u8]) -> String {
    if let Ok(body) = serde_json::from_slice::<Value>(bytes) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(m) = body[key].as_str() {
                return m.to_string();
            }
        }
    }
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    if text.is_empty() { "unknown backend error".to_string() } else { text }
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    Ok(serde_json::from_value(body)?)
}

/// Set-returning functions wrap a single row in an array.
fn decode_one<T: DeserializeOwned>(body: Value, what: &str) -> Result<T> {
    match body {
        Value::Array(mut rows) => {
            if rows.is_empty() {
                return Err(PrimerwatchError::NotFound(format!("{} not returned by backend", what)));
            }
            decode(rows.swap_remove(0))
        }
        Value::Null => Err(PrimerwatchError::NotFound(format!("{} not returned by backend", what))),
        other => decode(other),
    }
}

fn decode_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    match body {
        Value::Null => Ok(Vec::new()),
        other => decode(other),
    }
}

// ── Auth ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    id: Uuid,
    email: Option<String>,
}

#[async_trait]
impl AuthProvider for RpcClient {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(PrimerwatchError::validation("Email and password are required"));
        }
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let req = self
            .with_apikey(self.client.post(&url))
            .json(&json!({ "email": email.trim(), "password": password }));
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await?;
        if status >= 400 {
            let message = error_message(&bytes);
            warn!(status, %message, "sign-in rejected");
            // Bad credentials come back as 400 invalid_grant.
            return Err(match status {
                400 | 401 | 422 => PrimerwatchError::Validation(message),
                _ => classify_backend_message(status, &message),
            });
        }
        let token: TokenResponse = serde_json::from_slice(&bytes)?;
        let mut session = Session::bearer(token.access_token);
        if let Some(user) = token.user {
            session.user_id = Some(user.id);
            session.email = user.email;
        }
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<()> {
        let token = session.token()?;
        let url = format!("{}/auth/v1/logout", self.base_url);
        let req = self.with_apikey(self.client.post(&url)).bearer_auth(token);
        check_response(req.send().await?, "logout").await?;
        Ok(())
    }
}

// ── Procedures ────────────────────────────────────────────────────────────────

#[async_trait]
impl SurveillanceBackend for RpcClient {
    async fn create_assay(&self, session: &Session, assay: &NewAssay) -> Result<Assay> {
        let body = self
            .call(session, "create_assay", json!({
                "p_name":            assay.name,
                "p_target_taxid_id": assay.target_taxid_id,
                "p_target_gene":     assay.target_gene,
                "p_ref_name":        assay.ref_name,
                "p_ref_sequence":    assay.ref_sequence,
            }))
            .await?;
        decode_one(body, "assay")
    }

    async fn list_assays(&self, session: &Session) -> Result<Vec<Assay>> {
        decode_list(self.call(session, "get_assays", json!({})).await?)
    }

    async fn get_assay(&self, session: &Session, assay_id: i64) -> Result<AssayDetail> {
        let body = self.call(session, "get_assay", json!({ "p_assay_id": assay_id })).await?;
        decode_one(body, "assay")
    }

    async fn delete_assay(&self, session: &Session, assay_id: i64) -> Result<()> {
        self.call(session, "delete_assay", json!({ "p_assay_id": assay_id })).await?;
        Ok(())
    }

    async fn create_oligo(&self, session: &Session, oligo: &NewOligo) -> Result<Oligo> {
        let body = self
            .call(session, "create_oligo", json!({
                "p_name":     oligo.name,
                "p_sequence": oligo.sequence,
                "p_assay_id": oligo.assay_id,
            }))
            .await?;
        decode_one(body, "oligo")
    }

    async fn list_oligos(&self, session: &Session) -> Result<Vec<Oligo>> {
        decode_list(self.call(session, "get_oligos", json!({})).await?)
    }

    async fn delete_oligo(&self, session: &Session, oligo_id: i64) -> Result<()> {
        self.call(session, "delete_oligo", json!({ "p_oligo_id": oligo_id })).await?;
        Ok(())
    }

    async fn reassign_oligo(
        &self,
        session: &Session,
        oligo_id: i64,
        target: AssayAssignment,
    ) -> Result<Oligo> {
        let body = self.call(session, "reassign_oligo", reassign_params(oligo_id, target)).await?;
        decode_one(body, "oligo")
    }

    async fn create_taxid(&self, session: &Session, entry: &NewTaxId) -> Result<TaxIdEntry> {
        let body = self
            .call(session, "create_taxid", json!({
                "p_taxid":        entry.taxid,
                "p_species_name": entry.species_name,
            }))
            .await?;
        decode_one(body, "taxid")
    }

    async fn list_taxids(&self, session: &Session) -> Result<Vec<TaxIdEntry>> {
        decode_list(self.call(session, "get_taxids", json!({})).await?)
    }

    async fn delete_taxid(&self, session: &Session, taxid_id: i64) -> Result<()> {
        self.call(session, "delete_taxid", json!({ "p_taxid_id": taxid_id })).await?;
        Ok(())
    }

    async fn sync_dashboard(&self, session: &Session) -> Result<SyncSummary> {
        match self.call(session, "sync_dashboard", json!({})).await? {
            Value::Null => Ok(SyncSummary::default()),
            body => decode_one(body, "sync summary"),
        }
    }

    async fn read_dashboard(&self, session: &Session) -> Result<Vec<DashboardEntry>> {
        decode_list(self.call(session, "get_dashboard", json!({})).await?)
    }

    async fn order_job(&self, session: &Session, order: &JobOrder) -> Result<i64> {
        let body = self
            .call(session, "order_job", json!({
                "p_entry_id":      order.entry_id,
                "p_job_type":      order.kind.tag(),
                "p_lookback_days": order.lookback_days,
            }))
            .await?;
        decode_one(body, "job id")
    }

    async fn list_blast_candidates(&self, session: &Session) -> Result<Vec<BlastCandidate>> {
        decode_list(self.call(session, "get_blast_candidates", json!({})).await?)
    }

    async fn order_blast_job(&self, session: &Session, order: &BlastOrder) -> Result<i64> {
        let p = &order.params;
        let body = self
            .call(session, "order_blast_job", json!({
                "p_assay_id":           order.assay_id,
                "p_date_from":          order.date_from,
                "p_date_to":            order.date_to,
                "p_identity":           p.identity_pct,
                "p_coverage":           p.coverage_pct,
                "p_match":              p.match_score,
                "p_mismatch":           p.mismatch_score,
                "p_gap_open":           p.gap_open,
                "p_gap_extend":         p.gap_extend,
                "p_min_oligo_coverage": p.min_oligo_coverage_pct,
            }))
            .await?;
        decode_one(body, "job id")
    }

    async fn list_blast_jobs(&self, session: &Session) -> Result<Vec<BlastJobSummary>> {
        decode_list(self.call(session, "get_blast_jobs", json!({})).await?)
    }

    async fn get_blast_job(&self, session: &Session, job_id: i64) -> Result<BlastJob> {
        let body = self.call(session, "get_blast_job", json!({ "p_job_id": job_id })).await?;
        decode_one(body, "BLAST job")
    }
}

/// `p_assay_id` is always present; unassigning sends an explicit null.
pub fn reassign_params(oligo_id: i64, target: AssayAssignment) -> Value {
    json!({
        "p_oligo_id": oligo_id,
        "p_assay_id": target.as_param(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassign_sends_explicit_null() {
        let params = reassign_params(5, AssayAssignment::Unassign);
        let obj = params.as_object().unwrap();
        assert!(obj.contains_key("p_assay_id"));
        assert!(obj["p_assay_id"].is_null());
        assert_eq!(obj["p_oligo_id"], 5);
    }

    #[test]
    fn test_reassign_sends_target() {
        let params = reassign_params(5, AssayAssignment::Assay(9));
        assert_eq!(params["p_assay_id"], 9);
    }

    #[test]
    fn test_error_message_prefers_postgrest_message() {
        let body = br#"{"code":"P0001","details":null,"hint":null,"message":"assay_id 3 does not exist"}"#;
        assert_eq!(error_message(body), "assay_id 3 does not exist");
    }

    #[test]
    fn test_error_message_gotrue_and_plain_text() {
        let body = br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(error_message(body), "Invalid login credentials");
        assert_eq!(error_message(b"Bad gateway"), "Bad gateway");
        assert_eq!(error_message(b""), "unknown backend error");
    }

    #[test]
    fn test_decode_one_accepts_row_or_array() {
        let n: i64 = decode_one(json!(7), "id").unwrap();
        assert_eq!(n, 7);
        let n: i64 = decode_one(json!([8]), "id").unwrap();
        assert_eq!(n, 8);
        assert!(matches!(
            decode_one::<i64>(json!([]), "id"),
            Err(PrimerwatchError::NotFound(_))
        ));
    }
}
