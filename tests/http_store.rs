//! Integration tests for the Vault HTTP client.
//!
//! A wiremock server stands in for the secret store, so these run without a
//! real Vault.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vaultgate::bootstrap::{BootstrapController, BootstrapSettings, BootstrapState};
use vaultgate::platform::Namespace;
use vaultgate::store::{
    AccessToken, HttpSecretStore, SealState, SecretRecord, SecretStore, StoreError, UnsealKey,
};

fn client_for(server: &MockServer) -> HttpSecretStore {
    HttpSecretStore::new(&server.uri(), Duration::from_secs(2)).unwrap()
}

fn vault_errors(messages: &[&str]) -> serde_json::Value {
    json!({ "errors": messages })
}

#[tokio::test]
async fn reads_init_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"initialized": true})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client_for(&server).is_initialized().await.unwrap());
}

#[tokio::test]
async fn initialize_sends_share_config_and_parses_credential() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .and(body_json(json!({"secret_shares": 1, "secret_threshold": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": ["abcd1234"],
            "keys_base64": ["q80SNA=="],
            "root_token": "hvs.newroot"
        })))
        .mount(&server)
        .await;

    let cred = client_for(&server).initialize(1, 1).await.unwrap();
    assert_eq!(cred.root_token.expose(), "hvs.newroot");
    assert_eq!(cred.first_share().unwrap().expose(), "abcd1234");
}

#[tokio::test]
async fn initialize_on_initialized_store_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(vault_errors(&["Vault is already initialized"])),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).initialize(1, 1).await.unwrap_err();
    assert_eq!(err, StoreError::AlreadyInitialized);
}

#[tokio::test]
async fn initialize_validates_threshold_locally() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server).initialize(1, 3).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn unseal_reports_state_and_rejects_bad_share() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/unseal"))
        .and(body_json(json!({"key": "good"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sealed": false, "t": 1, "n": 1, "progress": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/unseal"))
        .and(body_json(json!({"key": "bad"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(vault_errors(&["Unseal failed, invalid key"])),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.unseal(&UnsealKey::new("good")).await.unwrap(),
        SealState::Unsealed
    );
    assert_eq!(
        client.unseal(&UnsealKey::new("bad")).await.unwrap_err(),
        StoreError::InvalidShare("Unseal failed, invalid key".to_string())
    );
}

#[tokio::test]
async fn unseal_on_uninitialized_vault_is_not_an_invalid_share() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/unseal"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(vault_errors(&["Vault is not initialized"])),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .unseal(&UnsealKey::new("k1"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::UnexpectedResponse {
            status: 400,
            message: "Vault is not initialized".to_string()
        }
    );
}

#[tokio::test]
async fn seal_status_maps_states() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/seal-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "shamir", "initialized": true, "sealed": true, "t": 1, "n": 1
        })))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).seal_status().await.unwrap(), SealState::Sealed);
}

#[tokio::test]
async fn write_sends_token_and_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/secret/app"))
        .and(header("X-Vault-Token", "hvs.root"))
        .and(body_json(json!({"message": "Hello World"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .write(
            &AccessToken::new("hvs.root"),
            "secret/app",
            &SecretRecord::with_message("Hello World"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn read_parses_data_and_maps_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/app"))
        .and(header("X-Vault-Token", "hvs.root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_duration": 2764800,
            "data": {"message": "X"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(vault_errors(&[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/forbidden"))
        .respond_with(ResponseTemplate::new(403).set_body_json(vault_errors(&["permission denied"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/sealed"))
        .respond_with(ResponseTemplate::new(503).set_body_json(vault_errors(&["Vault is sealed"])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = AccessToken::new("hvs.root");

    let record = client.read(&token, "secret/app").await.unwrap();
    assert_eq!(record, SecretRecord::with_message("X"));

    assert_eq!(
        client.read(&token, "secret/missing").await.unwrap_err(),
        StoreError::NotFound {
            path: "secret/missing".to_string()
        }
    );
    assert_eq!(
        client.read(&token, "secret/forbidden").await.unwrap_err(),
        StoreError::PermissionDenied {
            path: "secret/forbidden".to_string()
        }
    );
    assert_eq!(
        client.read(&token, "secret/sealed").await.unwrap_err(),
        StoreError::Sealed
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpSecretStore::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.is_initialized().await.unwrap_err();
    assert!(matches!(err, StoreError::Transport(_) | StoreError::Timeout));
    assert!(err.is_transient());
}

#[tokio::test]
async fn bootstrap_against_fresh_vault() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"initialized": false})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": ["k1"], "keys_base64": ["azE="], "root_token": "hvs.fresh"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/unseal"))
        .and(body_json(json!({"key": "k1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sealed": false})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/secret/demo"))
        .and(header("X-Vault-Token", "hvs.fresh"))
        .and(body_json(json!({"message": "Hello World"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let report = BootstrapController::new(
        &client,
        Namespace::new("secret/demo").unwrap(),
        BootstrapSettings::default(),
    )
    .run()
    .await;

    assert_eq!(report.state, BootstrapState::Seeded);
    assert_eq!(report.token.expose(), "hvs.fresh");
}

#[tokio::test]
async fn bootstrap_against_initialized_vault_never_reinitializes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"initialized": true})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/sys/init"))
        .respond_with(ResponseTemplate::new(400))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let report = BootstrapController::new(
        &client,
        Namespace::new("secret/demo").unwrap(),
        BootstrapSettings::default(),
    )
    .run()
    .await;

    assert_eq!(report.state, BootstrapState::Initialized);
}
