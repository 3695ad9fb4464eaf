use chrono::{Duration, Utc};
use pitchcraft::error::AppError;
use pitchcraft::models::{AuthUser, NewPitch, PitchData, PitchId, Session};
use pitchcraft::services::{AuthClient, SignUpOutcome};
use pitchcraft::storage::{PitchStore, SessionStore, SupabaseStore};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn auth_client(server: &MockServer, tmp: &TempDir) -> AuthClient {
    AuthClient::with_client(
        reqwest::Client::new(),
        &server.uri(),
        "anon-key",
        SessionStore::new(tmp.path().join("session.json")),
    )
    .unwrap()
}

fn token_body(access: &str) -> serde_json::Value {
    serde_json::json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": (Utc::now() + Duration::hours(1)).timestamp(),
        "refresh_token": format!("{access}-refresh"),
        "user": { "id": "user-1", "email": "founder@example.com" }
    })
}

fn session() -> Session {
    Session {
        access_token: "user-token".into(),
        refresh_token: "user-refresh".into(),
        expires_at: Utc::now() + Duration::hours(1),
        user: AuthUser {
            id: "user-1".into(),
            email: Some("founder@example.com".into()),
        },
    }
}

fn row(id: serde_json::Value, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "user_id": "user-1",
        "title": name,
        "short_description": "Coffee on autopilot",
        "industry": "Food",
        "tone": "auto",
        "language": "auto",
        "generated_data": { "name": name, "tagline": "Coffee on autopilot" },
        "landing_code": null,
        "created_at": "2025-03-01T12:00:00.123456+00:00"
    })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sign_in_persists_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon-key"))
        .and(body_partial_json(serde_json::json!({
            "email": "founder@example.com",
            "password": "hunter22"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let auth = auth_client(&server, &tmp);
    let mut changes = auth.subscribe();

    let session = auth
        .sign_in_with_password("founder@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.user_id(), "user-1");

    assert!(changes.has_changed().unwrap());
    assert_eq!(
        changes.borrow_and_update().as_ref().map(|s| s.access_token.clone()),
        Some("access-1".to_string())
    );
    assert!(tmp.path().join("session.json").exists());

    // A fresh client picks the stored session up again.
    let restored = auth_client(&server, &tmp);
    assert_eq!(restored.restore().await.unwrap(), Some(session));
}

#[tokio::test]
async fn test_corrupt_session_file_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2")))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("session.json");
    std::fs::write(&file, "{\"access_token\": ").unwrap();

    let auth = auth_client(&server, &tmp);
    assert_eq!(auth.restore().await.unwrap(), None);
    assert!(!file.exists());
    assert!(auth.session().is_none());

    let session = auth
        .sign_in_with_password("founder@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(session.access_token, "access-2");
    assert!(file.exists());
}

#[tokio::test]
async fn test_sign_in_failure_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let auth = auth_client(&server, &tmp);
    let err = auth
        .sign_in_with_password("founder@example.com", "wrong-password")
        .await
        .unwrap_err();
    match err {
        AppError::Auth(message) => assert_eq!(message, "Invalid login credentials"),
        other => panic!("expected Auth, got {other:?}"),
    }
    assert!(auth.session().is_none());
}

#[tokio::test]
async fn test_invalid_credentials_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let auth = auth_client(&server, &tmp);
    let err = auth.sign_in_with_password("founder", "hunter22").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = auth.sign_up("founder@example.com", "123", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_sign_up_requiring_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(query_param("redirect_to", "https://app.example.com/welcome"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "user-2",
            "email": "new@example.com",
            "confirmation_sent_at": "2025-03-01T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let auth = auth_client(&server, &tmp);
    let outcome = auth
        .sign_up(
            "new@example.com",
            "hunter22",
            Some("https://app.example.com/welcome"),
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SignUpOutcome::ConfirmationRequired {
            email: "new@example.com".into()
        }
    );
    assert!(auth.session().is_none());
}

#[tokio::test]
async fn test_sign_up_with_immediate_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-new")))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let auth = auth_client(&server, &tmp);
    let outcome = auth.sign_up("new@example.com", "hunter22", None).await.unwrap();
    assert!(matches!(outcome, SignUpOutcome::SignedIn(ref s) if s.access_token == "access-new"));
    assert!(auth.session().is_some());
}

#[tokio::test]
async fn test_expired_session_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(serde_json::json!({ "refresh_token": "old-refresh" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2")))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = SessionStore::new(tmp.path().join("session.json"));
    store
        .save(&Session {
            access_token: "old".into(),
            refresh_token: "old-refresh".into(),
            expires_at: Utc::now() - Duration::minutes(5),
            user: AuthUser {
                id: "user-1".into(),
                email: None,
            },
        })
        .await
        .unwrap();

    let auth = auth_client(&server, &tmp);
    auth.restore().await.unwrap();
    let current = auth.current_session().await.unwrap().unwrap();
    assert_eq!(current.access_token, "access-2");
    assert_eq!(store.load().await.unwrap().unwrap().access_token, "access-2");
}

#[tokio::test]
async fn test_failed_refresh_signs_out_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error_description": "Invalid Refresh Token"
        })))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = SessionStore::new(tmp.path().join("session.json"));
    let mut stale = session();
    stale.expires_at = Utc::now() - Duration::minutes(5);
    store.save(&stale).await.unwrap();

    let auth = auth_client(&server, &tmp);
    auth.restore().await.unwrap();
    assert!(auth.current_session().await.unwrap().is_none());
    assert!(matches!(
        auth.require_session().await,
        Err(AppError::NotAuthenticated)
    ));
    assert!(!tmp.path().join("session.json").exists());
}

#[tokio::test]
async fn test_sign_out_clears_even_when_remote_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let auth = auth_client(&server, &tmp);
    auth.sign_in_with_password("founder@example.com", "hunter22")
        .await
        .unwrap();
    let mut changes = auth.subscribe();

    auth.sign_out().await.unwrap();
    assert!(changes.has_changed().unwrap());
    assert!(changes.borrow_and_update().is_none());
    assert!(!tmp.path().join("session.json").exists());
}

// ---------------------------------------------------------------------------
// Pitch table
// ---------------------------------------------------------------------------

fn pitch_store(server: &MockServer) -> SupabaseStore {
    SupabaseStore::with_client(
        reqwest::Client::new(),
        &server.uri(),
        "anon-key",
        "pitches",
        &session(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_insert_returns_stored_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/pitches"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({
            "user_id": "user-1",
            "title": "Brewly",
            "industry": "Technology",
            "tone": "auto"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!([row(
                serde_json::json!(7),
                "Brewly"
            )])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let data = PitchData {
        name: "Brewly".into(),
        ..PitchData::default()
    }
    .with_defaults();
    let stored = pitch_store(&server)
        .insert(NewPitch::new("user-1", data, None))
        .await
        .unwrap();
    assert_eq!(stored.id, PitchId::from("7"));
    assert_eq!(stored.display_name(), "Brewly");
}

#[tokio::test]
async fn test_list_filters_by_owner_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pitches"))
        .and(query_param("select", "*"))
        .and(query_param("user_id", "eq.user-1"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            row(serde_json::json!("b2c1"), "Second"),
            row(serde_json::json!("a1b2"), "First"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = pitch_store(&server).list("user-1").await.unwrap();
    let names: Vec<&str> = rows.iter().map(|p| p.display_name()).collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_list_tolerates_rows_with_null_columns() {
    let server = MockServer::start().await;
    let sparse = serde_json::json!({
        "id": 12,
        "user_id": "user-1",
        "title": "Written elsewhere",
        "short_description": null,
        "industry": null,
        "tone": null,
        "language": null,
        "generated_data": null,
        "landing_code": null,
        "created_at": "2025-02-01T08:00:00+00:00"
    });
    Mock::given(method("GET"))
        .and(path("/rest/v1/pitches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            row(serde_json::json!("b2c1"), "Second"),
            sparse,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = pitch_store(&server).list("user-1").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].id, PitchId::from("12"));
    assert_eq!(rows[1].display_name(), "Written elsewhere");
    assert_eq!(rows[1].short_description, PitchData::DEFAULT_TAGLINE);
    assert_eq!(rows[1].industry_label(), "General");
}

#[tokio::test]
async fn test_get_missing_row_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pitches"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let err = pitch_store(&server)
        .get("user-1", &PitchId::from("99"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_delete_scoped_to_owner() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/pitches"))
        .and(query_param("id", "eq.7"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([row(
            serde_json::json!(7),
            "Brewly"
        )])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/pitches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let store = pitch_store(&server);
    store.delete("user-1", &PitchId::from("7")).await.unwrap();
    let err = store.delete("user-1", &PitchId::from("7")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_backend_errors_carry_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pitches"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "code": "PGRST301",
            "message": "JWT expired"
        })))
        .mount(&server)
        .await;

    let err = pitch_store(&server).list("user-1").await.unwrap_err();
    assert!(
        matches!(&err, AppError::Backend { status: 401, message } if message == "JWT expired"),
        "{err:?}"
    );
}
