//! TaxonomyClient error normalisation against local stand-in servers.

use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use primerwatch_client::{TaxonomyClient, TaxonomyError};
use primerwatch_config::TaxonomyConfig;

async fn taxon(Path(id): Path<i64>, headers: HeaderMap) -> Response {
    match id {
        562 => {
            let rank = if headers.contains_key("api-key") { "SPECIES" } else { "NO KEY" };
            Json(json!({
                "taxonomy_nodes": [{
                    "taxonomy": { "tax_id": 562, "organism_name": "Escherichia coli", "rank": rank }
                }]
            }))
            .into_response()
        }
        404 => StatusCode::NOT_FOUND.into_response(),
        777 => Json(json!({ "taxonomy_nodes": [{ "errors": [{ "reason": "TAXID_NOT_FOUND" }] }] }))
            .into_response(),
        502 => StatusCode::BAD_GATEWAY.into_response(),
        999 => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            StatusCode::OK.into_response()
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn config(base_url: String) -> TaxonomyConfig {
    TaxonomyConfig {
        base_url,
        timeout_secs: 1,
        api_key_secret: Some("ncbi-key".into()),
    }
}

async fn spawn_fake() -> TaxonomyClient {
    let app = Router::new().route("/taxonomy/taxon/{id}", get(taxon));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TaxonomyClient::new(&config(format!("http://{}", addr))).unwrap()
}

#[tokio::test]
async fn test_lookup_found_sends_api_key() {
    let client = spawn_fake().await;
    let record = client.lookup(562).await.unwrap();
    assert_eq!(record.species_name, "Escherichia coli");
    assert_eq!(record.rank.as_deref(), Some("species"));
}

#[tokio::test]
async fn test_not_found_variants() {
    let client = spawn_fake().await;
    assert!(matches!(client.lookup(404).await, Err(TaxonomyError::NotFound(404))));
    assert!(matches!(client.lookup(777).await, Err(TaxonomyError::NotFound(777))));
}

#[tokio::test]
async fn test_gateway_errors_are_unreachable_and_others_upstream() {
    let client = spawn_fake().await;
    let err = client.lookup(502).await.unwrap_err();
    assert_eq!(err.status_code(), 503);
    let err = client.lookup(1).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let client = spawn_fake().await;
    let err = client.lookup(999).await.unwrap_err();
    assert!(matches!(err, TaxonomyError::Timeout));
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = TaxonomyClient::new(&config(format!("http://{}", addr))).unwrap();
    let err = client.lookup(562).await.unwrap_err();
    assert!(matches!(err, TaxonomyError::Unreachable(_)));
}

#[tokio::test]
async fn test_non_positive_id_rejected_locally() {
    let client = TaxonomyClient::new(&config("http://127.0.0.1:9".into())).unwrap();
    assert!(matches!(client.lookup(0).await, Err(TaxonomyError::InvalidInput(_))));
}
