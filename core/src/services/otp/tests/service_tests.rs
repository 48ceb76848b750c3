//! Unit tests for the one-time code service

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::clock::ManualClock;
use crate::domain::value_objects::{Purpose, UserId};
use crate::errors::OtpError;
use crate::repositories::{InMemoryOtpTokenRepository, InMemoryUserRepository, OtpTokenRepository};
use crate::services::otp::{OtpService, OtpServiceConfig};
use crate::services::purpose::{AcknowledgeHandler, EmailVerificationHandler, PurposeRegistry};

use super::mocks::{FixedCodeGenerator, RecordingHandler, UnavailableRepository};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

struct Fixture {
    service: OtpService<InMemoryOtpTokenRepository>,
    repository: Arc<InMemoryOtpTokenRepository>,
    clock: Arc<ManualClock>,
    email_handler: Arc<RecordingHandler>,
    reset_handler: Arc<RecordingHandler>,
}

fn fixture(codes: &[&str]) -> Fixture {
    let repository = Arc::new(InMemoryOtpTokenRepository::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let email_handler = Arc::new(RecordingHandler::new(false));
    let reset_handler = Arc::new(RecordingHandler::new(false));

    let registry = PurposeRegistry::new()
        .register(Purpose::EMAIL_VERIFICATION, email_handler.clone())
        .register(Purpose::PASSWORD_RESET, reset_handler.clone());

    let service = OtpService::new(
        repository.clone(),
        Arc::new(registry),
        OtpServiceConfig::default(),
    )
    .with_clock(clock.clone())
    .with_code_generator(Arc::new(FixedCodeGenerator::new(codes)));

    Fixture {
        service,
        repository,
        clock,
        email_handler,
        reset_handler,
    }
}

#[tokio::test]
async fn test_issue_persists_active_token() {
    let f = fixture(&["482913"]);

    let issued = f
        .service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();

    assert_eq!(issued.code, "482913");
    assert_eq!(issued.expires_at, t0() + Duration::minutes(5));

    let stored = f.repository.find_by_id(issued.token_id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, UserId::new(7));
    assert_eq!(stored.purpose, Purpose::EMAIL_VERIFICATION);
    assert_eq!(stored.created_at, t0());
    assert!(!stored.consumed);
}

#[tokio::test]
async fn test_issue_uses_configured_generator() {
    let repository = Arc::new(InMemoryOtpTokenRepository::new());
    let registry = PurposeRegistry::new().register(
        Purpose::PASSWORD_RESET,
        Arc::new(AcknowledgeHandler::new(Purpose::PASSWORD_RESET)),
    );
    let config = OtpServiceConfig {
        code_length: 8,
        ..OtpServiceConfig::default()
    };
    let service = OtpService::new(repository, Arc::new(registry), config);

    let issued = service
        .issue(UserId::new(1), &Purpose::PASSWORD_RESET)
        .await
        .unwrap();
    assert_eq!(issued.code.len(), 8);
    assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_redeem_succeeds_once_and_runs_side_effect() {
    let f = fixture(&["482913"]);
    f.service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();
    f.clock.advance(Duration::minutes(1));

    assert!(f
        .service
        .redeem(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert!(!f
        .service
        .redeem(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());

    assert_eq!(f.email_handler.calls(), vec![UserId::new(7)]);
    assert!(f.reset_handler.calls().is_empty());
}

#[tokio::test]
async fn test_redeem_after_expiry_fails_without_side_effect() {
    let f = fixture(&["100234"]);
    f.service
        .issue(UserId::new(7), &Purpose::PASSWORD_RESET)
        .await
        .unwrap();
    f.clock.advance(Duration::minutes(6));

    assert!(!f
        .service
        .redeem(UserId::new(7), "100234", &Purpose::PASSWORD_RESET)
        .await
        .unwrap());
    assert!(f.reset_handler.calls().is_empty());
}

#[tokio::test]
async fn test_redeem_expiry_boundary() {
    let f = fixture(&["100234", "555555"]);
    let first = f
        .service
        .issue(UserId::new(7), &Purpose::PASSWORD_RESET)
        .await
        .unwrap();
    let second = f
        .service
        .issue(UserId::new(7), &Purpose::PASSWORD_RESET)
        .await
        .unwrap();
    assert_eq!(first.expires_at, second.expires_at);

    f.clock.set(second.expires_at - Duration::milliseconds(1));
    assert!(f
        .service
        .redeem(UserId::new(7), "555555", &Purpose::PASSWORD_RESET)
        .await
        .unwrap());

    f.clock.set(first.expires_at);
    assert!(!f
        .service
        .redeem(UserId::new(7), "100234", &Purpose::PASSWORD_RESET)
        .await
        .unwrap());
    assert_eq!(f.reset_handler.calls().len(), 1);
}

#[tokio::test]
async fn test_issue_with_unrepresentable_expiry_stores_nothing() {
    let repository = Arc::new(InMemoryOtpTokenRepository::new());
    let registry = PurposeRegistry::new().register(
        Purpose::PASSWORD_RESET,
        Arc::new(AcknowledgeHandler::new(Purpose::PASSWORD_RESET)),
    );
    let config = OtpServiceConfig {
        ttl: Duration::try_seconds(10_i64.pow(13)).unwrap(),
        ..OtpServiceConfig::default()
    };
    let service = OtpService::new(repository.clone(), Arc::new(registry), config)
        .with_clock(Arc::new(ManualClock::new(t0())));

    let result = service
        .issue(UserId::new(7), &Purpose::PASSWORD_RESET)
        .await;

    assert!(matches!(result, Err(OtpError::Configuration { .. })));
    assert!(repository.is_empty().await);
}

#[tokio::test]
async fn test_redeem_never_issued_code() {
    let f = fixture(&["482913"]);

    assert!(!f
        .service
        .redeem(UserId::new(7), "000000", &Purpose::PASSWORD_RESET)
        .await
        .unwrap());
    assert!(f.reset_handler.calls().is_empty());
}

#[tokio::test]
async fn test_mismatch_does_not_burn_token() {
    let f = fixture(&["482913"]);
    f.service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();

    // Wrong user, wrong code, wrong purpose
    assert!(!f
        .service
        .redeem(UserId::new(8), "482913", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert!(!f
        .service
        .redeem(UserId::new(7), "482914", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert!(!f
        .service
        .redeem(UserId::new(7), "482913", &Purpose::PASSWORD_RESET)
        .await
        .unwrap());
    assert!(f.email_handler.calls().is_empty());
    assert!(f.reset_handler.calls().is_empty());

    assert!(f
        .service
        .redeem(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_issue_does_not_invalidate_older_codes() {
    let f = fixture(&["111111", "222222"]);
    f.service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();
    f.service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();

    assert!(f
        .service
        .redeem(UserId::new(7), "111111", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert!(f
        .service
        .redeem(UserId::new(7), "222222", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert_eq!(f.email_handler.calls().len(), 2);
}

#[tokio::test]
async fn test_issue_unknown_purpose() {
    let f = fixture(&["482913"]);
    let result = f
        .service
        .issue(UserId::new(7), &Purpose::new("newsletter_optin"))
        .await;

    match result {
        Err(OtpError::UnknownPurpose { purpose }) => {
            assert_eq!(purpose.as_str(), "newsletter_optin")
        }
        other => panic!("Expected UnknownPurpose, got {other:?}"),
    }
    assert!(f.repository.is_empty().await);
}

#[tokio::test]
async fn test_redeem_unknown_purpose_consumes_nothing() {
    let f = fixture(&["482913"]);
    let issued = f
        .service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();

    assert!(!f
        .service
        .redeem(UserId::new(7), "482913", &Purpose::new("newsletter_optin"))
        .await
        .unwrap());

    let stored = f.repository.find_by_id(issued.token_id).await.unwrap().unwrap();
    assert!(!stored.consumed);
}

#[tokio::test]
async fn test_storage_failure_surfaces_without_side_effect() {
    let repository = Arc::new(UnavailableRepository::default());
    let handler = Arc::new(RecordingHandler::new(false));
    let registry = PurposeRegistry::new().register(Purpose::EMAIL_VERIFICATION, handler.clone());
    let service = OtpService::new(
        repository.clone(),
        Arc::new(registry),
        OtpServiceConfig::default(),
    );

    let issue = service.issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION).await;
    assert!(matches!(issue, Err(OtpError::Storage { .. })));

    let redeem = service
        .redeem(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION)
        .await;
    assert!(matches!(redeem, Err(OtpError::Storage { .. })));

    // Consume is attempted exactly once, never retried
    assert_eq!(repository.consume_attempts.load(Ordering::SeqCst), 1);
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn test_side_effect_failure_keeps_token_consumed() {
    let repository = Arc::new(InMemoryOtpTokenRepository::new());
    let handler = Arc::new(RecordingHandler::new(true));
    let registry = PurposeRegistry::new().register(Purpose::EMAIL_VERIFICATION, handler.clone());
    let service = OtpService::new(
        repository.clone(),
        Arc::new(registry),
        OtpServiceConfig::default(),
    )
    .with_code_generator(Arc::new(FixedCodeGenerator::new(&["482913"])));

    let issued = service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();

    let err = service
        .redeem(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap_err();
    assert!(err.is_consumed());
    assert!(matches!(
        err,
        OtpError::SideEffect { ref purpose, user_id, .. }
            if *purpose == Purpose::EMAIL_VERIFICATION && user_id == UserId::new(7)
    ));

    let stored = repository.find_by_id(issued.token_id).await.unwrap().unwrap();
    assert!(stored.consumed);

    // No second chance: the effect must be reconciled elsewhere
    assert!(!service
        .redeem(UserId::new(7), "482913", &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert_eq!(handler.calls().len(), 1);
}

#[tokio::test]
async fn test_email_verification_scenario() {
    let repository = Arc::new(InMemoryOtpTokenRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let registry = PurposeRegistry::new()
        .register(
            Purpose::EMAIL_VERIFICATION,
            Arc::new(EmailVerificationHandler::new(users.clone())),
        )
        .register(
            Purpose::PASSWORD_RESET,
            Arc::new(AcknowledgeHandler::new(Purpose::PASSWORD_RESET)),
        );
    let service = OtpService::new(repository, Arc::new(registry), OtpServiceConfig::default())
        .with_clock(clock.clone())
        .with_code_generator(Arc::new(FixedCodeGenerator::new(&["482913"])));

    let issued = service
        .issue(UserId::new(7), &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap();
    assert_eq!(issued.code, "482913");

    clock.advance(Duration::minutes(1));
    assert!(service
        .redeem(UserId::new(7), &issued.code, &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
    assert!(users.is_email_verified(UserId::new(7)).await);

    assert!(!service
        .redeem(UserId::new(7), &issued.code, &Purpose::EMAIL_VERIFICATION)
        .await
        .unwrap());
}
