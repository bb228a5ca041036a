//! Bearer token checks on real calls.

use mccmnc_lookup::observability::LookupMetrics;
use mccmnc_lookup::proto::search::v1::search_service_client::SearchServiceClient;
use mccmnc_lookup::proto::search::v1::PhoneNumber;
use mccmnc_lookup::LookupError;
use prometheus::Registry;
use tonic::transport::Endpoint;

use super::support::{
    client_tls, connect, connect_as, endpoint, sample_resolver, start, start_with_metrics, stop,
    DOMAIN, TOKEN,
};

#[tokio::test]
async fn test_call_without_credential_is_rejected() {
    let handle = start(sample_resolver()).await;

    let channel = Endpoint::from_shared(endpoint(&handle))
        .unwrap()
        .tls_config(client_tls().client_tls_config(DOMAIN))
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut raw = SearchServiceClient::new(channel);

    let status = raw
        .get_code_by_number(PhoneNumber {
            phone_number: "123".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(LookupError::from(status), LookupError::MissingCredential));

    drop(raw);
    stop(handle).await;
}

#[tokio::test]
async fn test_wrong_token_is_rejected_for_both_rpcs() {
    let handle = start(sample_resolver()).await;
    let mut client = connect_as(&handle, &client_tls(), "wrong").await.unwrap();

    let unary = client.get_code_by_number("123").await.unwrap_err();
    assert!(matches!(unary, LookupError::InvalidCredential));

    let streaming = client
        .streaming_get_code_by_number(&["123".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(streaming, LookupError::InvalidCredential));

    drop(client);
    stop(handle).await;
}

#[tokio::test]
async fn test_right_token_is_accepted() {
    let handle = start(sample_resolver()).await;
    let mut client = connect_as(&handle, &client_tls(), TOKEN).await.unwrap();

    assert!(client.get_code_by_number("123").await.is_ok());

    drop(client);
    stop(handle).await;
}

#[tokio::test]
async fn test_rejections_and_lookups_are_counted() {
    let metrics = LookupMetrics::new(&Registry::new()).unwrap();
    let handle = start_with_metrics(sample_resolver(), Some(metrics.clone())).await;

    let mut good = connect(&handle).await;
    good.get_code_by_number("123").await.unwrap();
    good.get_code_by_number("9").await.unwrap_err();
    good.streaming_get_code_by_number(&["19".to_string(), "9".to_string()])
        .await
        .unwrap();

    let mut bad = connect_as(&handle, &client_tls(), "wrong").await.unwrap();
    bad.get_code_by_number("123").await.unwrap_err();

    assert_eq!(metrics.lookups.with_label_values(&["unary", "found"]).get(), 1);
    assert_eq!(metrics.lookups.with_label_values(&["unary", "not_found"]).get(), 1);
    assert_eq!(metrics.lookups.with_label_values(&["streaming", "found"]).get(), 1);
    assert_eq!(metrics.lookups.with_label_values(&["streaming", "not_found"]).get(), 1);
    assert_eq!(
        metrics
            .auth_rejections
            .with_label_values(&["AUTH_CREDENTIAL_INVALID"])
            .get(),
        1
    );

    drop(good);
    drop(bad);
    stop(handle).await;
}
