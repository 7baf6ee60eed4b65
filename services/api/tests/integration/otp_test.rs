use chrono::{Duration, Utc};

use quillbox_api::domain::types::{OtpPolicy, OtpPurpose};
use quillbox_api::error::ApiError;
use quillbox_api::usecase::otp::{RequestOtpUseCase, VerifyOtpUseCase};

use crate::helpers::{MockMailer, MockOtpRepo, test_otp};

fn request_uc(otps: MockOtpRepo, mailer: MockMailer) -> RequestOtpUseCase<MockOtpRepo, MockMailer> {
    RequestOtpUseCase {
        otps,
        mailer,
        policy: OtpPolicy::default(),
    }
}

fn verify_uc(otps: MockOtpRepo) -> VerifyOtpUseCase<MockOtpRepo> {
    VerifyOtpUseCase {
        otps,
        policy: OtpPolicy::default(),
    }
}

#[tokio::test]
async fn should_issue_six_digit_code_and_send_it() {
    let repo = MockOtpRepo::empty();
    let codes = repo.handle();
    let mailer = MockMailer::new();
    let sent = mailer.handle();

    request_uc(repo, mailer)
        .execute("a@example.com", OtpPurpose::Login)
        .await
        .unwrap();

    let codes = codes.lock().unwrap();
    assert_eq!(codes.len(), 1);
    let otp = &codes[0];
    assert_eq!(otp.code.len(), 6);
    assert!(otp.code.bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(otp.attempts, 0);
    assert!(!otp.verified);
    assert!(otp.expires_at > Utc::now() + Duration::minutes(9));

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "a@example.com");
    assert_eq!(sent[0].1, otp.code);
}

#[tokio::test]
async fn should_enforce_resend_cooldown() {
    let repo = MockOtpRepo::new(vec![test_otp("a@example.com", "111111", OtpPurpose::Login)]);

    let result = request_uc(repo, MockMailer::new())
        .execute("a@example.com", OtpPurpose::Login)
        .await;

    match result {
        Err(ApiError::OtpCooldown { wait_seconds }) => {
            assert!((1..=10).contains(&wait_seconds), "wait was {wait_seconds}");
        }
        other => panic!("expected OtpCooldown, got {other:?}"),
    }
}

#[tokio::test]
async fn should_replace_previous_code_once_cooldown_passed() {
    let mut old = test_otp("a@example.com", "111111", OtpPurpose::Login);
    old.created_at = Utc::now() - Duration::seconds(60);
    let old_id = old.id;

    let repo = MockOtpRepo::new(vec![old]);
    let codes = repo.handle();

    request_uc(repo, MockMailer::new())
        .execute("a@example.com", OtpPurpose::Login)
        .await
        .unwrap();

    let codes = codes.lock().unwrap();
    assert_eq!(codes.len(), 1, "old code should have been replaced");
    assert_ne!(codes[0].id, old_id);
}

#[tokio::test]
async fn should_not_throttle_across_purposes() {
    let repo = MockOtpRepo::new(vec![test_otp("a@example.com", "111111", OtpPurpose::Login)]);

    request_uc(repo, MockMailer::new())
        .execute("a@example.com", OtpPurpose::EmailVerification)
        .await
        .unwrap();
}

#[tokio::test]
async fn should_roll_back_code_when_mail_delivery_fails() {
    let repo = MockOtpRepo::empty();
    let codes = repo.handle();

    let result = request_uc(repo, MockMailer::failing())
        .execute("a@example.com", OtpPurpose::Login)
        .await;

    assert!(matches!(result, Err(ApiError::MailDelivery(_))));
    assert!(
        codes.lock().unwrap().is_empty(),
        "undelivered code must not survive"
    );
}

#[tokio::test]
async fn should_mark_code_verified_on_correct_guess() {
    let repo = MockOtpRepo::new(vec![test_otp("a@example.com", "123456", OtpPurpose::Login)]);
    let codes = repo.handle();

    verify_uc(repo)
        .execute("a@example.com", OtpPurpose::Login, "123456")
        .await
        .unwrap();

    let codes = codes.lock().unwrap();
    assert_eq!(codes.len(), 1);
    assert!(codes[0].verified);
    assert_eq!(codes[0].attempts, 1);
}

#[tokio::test]
async fn should_count_down_remaining_attempts_on_wrong_guess() {
    let repo = MockOtpRepo::new(vec![test_otp("a@example.com", "123456", OtpPurpose::Login)]);
    let uc = verify_uc(repo);

    let first = uc
        .execute("a@example.com", OtpPurpose::Login, "000000")
        .await;
    assert!(matches!(first, Err(ApiError::WrongOtp { remaining: 2 })));

    let second = uc
        .execute("a@example.com", OtpPurpose::Login, "000000")
        .await;
    assert!(matches!(second, Err(ApiError::WrongOtp { remaining: 1 })));
}

#[tokio::test]
async fn should_delete_code_after_final_wrong_guess() {
    let repo = MockOtpRepo::new(vec![test_otp("a@example.com", "123456", OtpPurpose::Login)]);
    let codes = repo.handle();
    let uc = verify_uc(repo);

    for _ in 0..2 {
        let _ = uc
            .execute("a@example.com", OtpPurpose::Login, "000000")
            .await;
    }
    let third = uc
        .execute("a@example.com", OtpPurpose::Login, "000000")
        .await;
    assert!(matches!(third, Err(ApiError::OtpExhausted)));
    assert!(codes.lock().unwrap().is_empty());

    // Even the correct code is useless now; a new one must be requested.
    let after = uc
        .execute("a@example.com", OtpPurpose::Login, "123456")
        .await;
    assert!(matches!(after, Err(ApiError::InvalidOtp)));
}

#[tokio::test]
async fn should_reject_when_no_pending_code_exists() {
    let result = verify_uc(MockOtpRepo::empty())
        .execute("a@example.com", OtpPurpose::Login, "123456")
        .await;
    assert!(matches!(result, Err(ApiError::InvalidOtp)));
}

#[tokio::test]
async fn should_reject_expired_code() {
    let mut otp = test_otp("a@example.com", "123456", OtpPurpose::Login);
    otp.expires_at = Utc::now() - Duration::seconds(1);

    let result = verify_uc(MockOtpRepo::new(vec![otp]))
        .execute("a@example.com", OtpPurpose::Login, "123456")
        .await;
    assert!(matches!(result, Err(ApiError::InvalidOtp)));
}

#[tokio::test]
async fn should_reject_code_issued_for_other_purpose() {
    let otp = test_otp("a@example.com", "123456", OtpPurpose::EmailVerification);

    let result = verify_uc(MockOtpRepo::new(vec![otp]))
        .execute("a@example.com", OtpPurpose::Login, "123456")
        .await;
    assert!(matches!(result, Err(ApiError::InvalidOtp)));
}

#[tokio::test]
async fn should_purge_expired_and_verified_codes() {
    let mut expired = test_otp("a@example.com", "111111", OtpPurpose::Login);
    expired.expires_at = Utc::now() - Duration::minutes(1);
    let mut consumed = test_otp("b@example.com", "222222", OtpPurpose::Login);
    consumed.verified = true;
    let live = test_otp("c@example.com", "333333", OtpPurpose::Login);

    let repo = MockOtpRepo::new(vec![expired, consumed, live]);
    let codes = repo.handle();

    use quillbox_api::domain::repository::OtpRepository;
    let purged = repo.purge_stale().await.unwrap();
    assert_eq!(purged, 2);
    assert_eq!(codes.lock().unwrap().len(), 1);
}
