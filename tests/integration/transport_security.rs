//! Mutual TLS enforcement.

use mccmnc_lookup::LookupError;

use super::support::{
    client_tls, connect_as, distrustful_client_tls, rogue_client_tls, sample_resolver, start,
    stop, TOKEN,
};
use mccmnc_lookup::SearchClient;

async fn first_lookup(client: Result<SearchClient, LookupError>) -> Result<String, LookupError> {
    client?.get_code_by_number("123").await
}

#[tokio::test]
async fn test_untrusted_client_certificate_is_refused() {
    let handle = start(sample_resolver()).await;

    // With TLS 1.3 the client may only learn of the rejection on first use.
    let result = first_lookup(connect_as(&handle, &rogue_client_tls(), TOKEN).await).await;
    let err = result.unwrap_err();
    assert!(!err.is_not_found());
    assert!(!err.is_auth_failure());

    // The server keeps serving trusted clients.
    let ok = first_lookup(connect_as(&handle, &client_tls(), TOKEN).await).await;
    assert_eq!(ok.unwrap(), "B");

    stop(handle).await;
}

#[tokio::test]
async fn test_client_refuses_untrusted_server() {
    let handle = start(sample_resolver()).await;

    let result = first_lookup(connect_as(&handle, &distrustful_client_tls(), TOKEN).await).await;
    assert!(result.is_err());

    stop(handle).await;
}

#[tokio::test]
async fn test_server_name_must_match() {
    let handle = start(sample_resolver()).await;

    let client = SearchClient::connect_with(
        super::support::endpoint(&handle),
        &client_tls(),
        "not-the-server.example",
        TOKEN,
    )
    .await;
    assert!(first_lookup(client).await.is_err());

    stop(handle).await;
}

#[tokio::test]
async fn test_plaintext_endpoint_is_rejected_by_client() {
    let handle = start(sample_resolver()).await;

    let client = SearchClient::connect_with(
        format!("http://{}", handle.local_addr()),
        &client_tls(),
        super::support::DOMAIN,
        TOKEN,
    )
    .await;
    assert!(first_lookup(client).await.is_err());

    stop(handle).await;
}
