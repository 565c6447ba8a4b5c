mod common;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use auth::TokenRejection;
use cache::CacheKey;
use cache::InMemoryBackend;
use cache::TtlCache;
use chrono::Utc;
use common::register_command;
use common::TestIdentity;
use identity_service::account::errors::AccountError;
use identity_service::account::errors::UnauthenticatedReason;
use identity_service::account::models::Username;
use identity_service::account::ports::IdentityServicePort;
use serde::Deserialize;
use serde::Serialize;

#[tokio::test]
async fn test_register_returns_profile_without_hash() {
    let identity = TestIdentity::new();

    let profile = identity
        .service
        .register(register_command("alice", "alice@x.com", "s3cret!"))
        .await
        .unwrap();

    let json = serde_json::to_value(&profile).unwrap();
    assert_eq!(json["username"], "alice");
    assert_eq!(json["email"], "alice@x.com");
    assert_eq!(json["is_active"], true);
    assert!(json.get("password_hash").is_none());
    assert!(!json.to_string().contains("$argon2"));
}

#[tokio::test]
async fn test_register_twice_is_conflict() {
    let identity = TestIdentity::new();

    identity
        .service
        .register(register_command("alice", "alice@x.com", "s3cret!"))
        .await
        .unwrap();

    let same_username = identity
        .service
        .register(register_command("alice", "other@x.com", "s3cret!"))
        .await;
    let same_email = identity
        .service
        .register(register_command("alicia", "alice@x.com", "s3cret!"))
        .await;

    assert!(matches!(same_username, Err(AccountError::Conflict)));
    assert!(matches!(same_email, Err(AccountError::Conflict)));
}

#[tokio::test]
async fn test_login_then_resolve_until_expiry() {
    let identity = TestIdentity::new();
    identity
        .service
        .register(register_command("alice", "alice@x.com", "s3cret!"))
        .await
        .unwrap();

    let issued_at = Utc::now();
    let grant = identity
        .service
        .login("alice", "s3cret!", issued_at)
        .await
        .unwrap();
    assert_eq!(grant.token_type, "bearer");

    let principal = identity
        .service
        .resolve(&grant.access_token, issued_at + chrono::Duration::minutes(29))
        .await
        .unwrap();
    assert_eq!(principal.account.username, "alice");
    assert_eq!(principal.token_expires_at, grant.expires_at);

    let expired = identity
        .service
        .resolve(&grant.access_token, issued_at + chrono::Duration::minutes(31))
        .await;
    assert!(matches!(
        expired,
        Err(AccountError::Unauthenticated(UnauthenticatedReason::Token(
            TokenRejection::Expired
        )))
    ));
}

#[tokio::test]
async fn test_bad_credentials_do_not_reveal_which_part_was_wrong() {
    let identity = TestIdentity::new();
    identity
        .service
        .register(register_command("alice", "alice@x.com", "s3cret!"))
        .await
        .unwrap();

    let wrong_password = identity
        .service
        .login("alice", "wrong-password", Utc::now())
        .await
        .unwrap_err();
    let unknown_user = identity
        .service
        .login("bob", "s3cret!", Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AccountError::BadCredentials));
    assert!(matches!(unknown_user, AccountError::BadCredentials));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn test_deactivated_account_stops_resolving() {
    let identity = TestIdentity::new();
    identity
        .service
        .register(register_command("alice", "alice@x.com", "s3cret!"))
        .await
        .unwrap();
    let now = Utc::now();
    let grant = identity.service.login("alice", "s3cret!", now).await.unwrap();

    identity
        .service
        .deactivate(&Username::new("alice".to_string()).unwrap())
        .await
        .unwrap();

    assert!(matches!(
        identity.service.resolve(&grant.access_token, now).await,
        Err(AccountError::Forbidden)
    ));
    assert!(matches!(
        identity.service.login("alice", "s3cret!", now).await,
        Err(AccountError::Forbidden)
    ));
}

#[tokio::test]
async fn test_token_for_deleted_subject_is_unauthenticated() {
    let identity = TestIdentity::new();
    let now = Utc::now();
    let issued = identity.authenticator.issue_token("nobody", now).unwrap();

    assert!(matches!(
        identity.service.resolve(&issued.token, now).await,
        Err(AccountError::Unauthenticated(
            UnauthenticatedReason::UnknownAccount
        ))
    ));
}

#[tokio::test]
async fn test_tampered_token_is_unauthenticated() {
    let identity = TestIdentity::new();
    identity
        .service
        .register(register_command("alice", "alice@x.com", "s3cret!"))
        .await
        .unwrap();
    let now = Utc::now();
    let grant = identity.service.login("alice", "s3cret!", now).await.unwrap();

    let mut tampered = grant.access_token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'Q' } else { 'A' });

    assert!(matches!(
        identity.service.resolve(&tampered, now).await,
        Err(AccountError::Unauthenticated(UnauthenticatedReason::Token(
            TokenRejection::BadSignature
        )))
    ));
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Forecast {
    city: String,
    temperature: f64,
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_forecast_lookups_share_one_fetch() {
    let cache = Arc::new(TtlCache::new(
        Arc::new(InMemoryBackend::new()),
        Duration::from_secs(600),
    ));
    let fetches = Arc::new(AtomicUsize::new(0));
    let key = CacheKey::weather("Paris", "metric", "ru").build();

    let lookups: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .get_or_compute(&key, None, move || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, String>(Forecast {
                            city: "Paris".to_string(),
                            temperature: 12.5,
                        })
                    })
                    .await
            })
        })
        .collect();

    for lookup in lookups {
        let forecast = lookup.await.unwrap().unwrap();
        assert_eq!(forecast.city, "Paris");
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(601)).await;

    let refreshed: Forecast = cache
        .get_or_compute(&key, None, || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(Forecast {
                city: "Paris".to_string(),
                temperature: 9.0,
            })
        })
        .await
        .unwrap();
    assert_eq!(refreshed.temperature, 9.0);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}
