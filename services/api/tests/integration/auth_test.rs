use quillbox_api::domain::types::{OtpPolicy, OtpPurpose, PLACEHOLDER_DATE_OF_BIRTH};
use quillbox_api::error::ApiError;
use quillbox_api::usecase::auth::{
    GoogleSignInUseCase, LoginUseCase, ResendOtpUseCase, SignupInput, SignupUseCase,
    VerifyLoginUseCase, VerifySignupUseCase,
};
use quillbox_api::usecase::otp::{RequestOtpUseCase, VerifyOtpUseCase};
use quillbox_api::usecase::token::validate_token;

use crate::helpers::{
    MockGoogle, MockMailer, MockOtpRepo, MockUserRepo, TEST_SECRET, test_otp, test_user,
};

fn signup_uc(
    users: MockUserRepo,
    otps: MockOtpRepo,
    mailer: MockMailer,
) -> SignupUseCase<MockUserRepo, MockOtpRepo, MockMailer> {
    SignupUseCase {
        users,
        otps: otps.clone(),
        request_otp: RequestOtpUseCase {
            otps,
            mailer,
            policy: OtpPolicy::default(),
        },
    }
}

fn signup_input(email: &str) -> SignupInput {
    SignupInput {
        email: email.to_owned(),
        name: "Ada Lovelace".to_owned(),
        date_of_birth: "1990-12-10".to_owned(),
    }
}

// ── Signup ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_unverified_account_and_send_verification_code() {
    let users = MockUserRepo::empty();
    let users_handle = users.handle();
    let otps = MockOtpRepo::empty();
    let codes = otps.handle();
    let mailer = MockMailer::new();
    let sent = mailer.handle();

    let user = signup_uc(users, otps, mailer)
        .execute(signup_input("Ada@Example.com "))
        .await
        .unwrap();

    assert_eq!(user.email, "ada@example.com", "email should be normalized");
    assert!(!user.is_email_verified);
    assert_eq!(users_handle.lock().unwrap().len(), 1);

    let codes = codes.lock().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].purpose, OtpPurpose::EmailVerification);
    assert_eq!(sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_reject_signup_for_verified_email() {
    let users = MockUserRepo::new(vec![test_user("ada@example.com", true)]);

    let result = signup_uc(users, MockOtpRepo::empty(), MockMailer::new())
        .execute(signup_input("ada@example.com"))
        .await;

    assert!(matches!(result, Err(ApiError::UserAlreadyExists)));
}

#[tokio::test]
async fn should_replace_abandoned_unverified_account() {
    let stale = test_user("ada@example.com", false);
    let stale_id = stale.id;
    let users = MockUserRepo::new(vec![stale]);
    let users_handle = users.handle();
    let stale_code = test_otp("ada@example.com", "999999", OtpPurpose::EmailVerification);
    let stale_code_id = stale_code.id;
    let otps = MockOtpRepo::new(vec![stale_code]);
    let codes = otps.handle();

    signup_uc(users, otps, MockMailer::new())
        .execute(signup_input("ada@example.com"))
        .await
        .unwrap();

    let users = users_handle.lock().unwrap();
    assert_eq!(users.len(), 1);
    assert_ne!(users[0].id, stale_id, "stale account should be replaced");

    let codes = codes.lock().unwrap();
    assert_eq!(codes.len(), 1);
    assert_ne!(codes[0].id, stale_code_id, "stale code should be replaced");
}

#[tokio::test]
async fn should_roll_back_account_when_code_cannot_be_delivered() {
    let users = MockUserRepo::empty();
    let users_handle = users.handle();

    let result = signup_uc(users, MockOtpRepo::empty(), MockMailer::failing())
        .execute(signup_input("ada@example.com"))
        .await;

    assert!(matches!(result, Err(ApiError::MailDelivery(_))));
    assert!(
        users_handle.lock().unwrap().is_empty(),
        "account without a deliverable code must be rolled back"
    );
}

#[tokio::test]
async fn should_reject_invalid_signup_fields() {
    let cases = [
        SignupInput {
            email: "not-an-email".to_owned(),
            name: "Ada Lovelace".to_owned(),
            date_of_birth: "1990-12-10".to_owned(),
        },
        SignupInput {
            email: "ada@example.com".to_owned(),
            name: "A".to_owned(),
            date_of_birth: "1990-12-10".to_owned(),
        },
        SignupInput {
            email: "ada@example.com".to_owned(),
            name: "Ada Lovelace".to_owned(),
            date_of_birth: "2020-01-01".to_owned(),
        },
    ];

    for input in cases {
        let result = signup_uc(MockUserRepo::empty(), MockOtpRepo::empty(), MockMailer::new())
            .execute(input)
            .await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}

// ── Verify signup ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_verify_account_and_issue_valid_token() {
    let user = test_user("ada@example.com", false);
    let user_id = user.id;
    let users = MockUserRepo::new(vec![user]);
    let otps = MockOtpRepo::new(vec![test_otp(
        "ada@example.com",
        "123456",
        OtpPurpose::EmailVerification,
    )]);

    let uc = VerifySignupUseCase {
        users,
        verify_otp: VerifyOtpUseCase {
            otps,
            policy: OtpPolicy::default(),
        },
        jwt_secret: TEST_SECRET.to_owned(),
    };
    let output = uc.execute("ada@example.com", "123456").await.unwrap();

    assert!(output.user.is_email_verified);

    let claims = validate_token(&output.token, TEST_SECRET).unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);
    assert_eq!(claims.email, "ada@example.com");
}

#[tokio::test]
async fn should_reject_malformed_otp_before_touching_state() {
    let otps = MockOtpRepo::new(vec![test_otp(
        "ada@example.com",
        "123456",
        OtpPurpose::EmailVerification,
    )]);
    let codes = otps.handle();

    let uc = VerifySignupUseCase {
        users: MockUserRepo::new(vec![test_user("ada@example.com", false)]),
        verify_otp: VerifyOtpUseCase {
            otps,
            policy: OtpPolicy::default(),
        },
        jwt_secret: TEST_SECRET.to_owned(),
    };

    let result = uc.execute("ada@example.com", "12ab56").await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
    assert_eq!(
        codes.lock().unwrap()[0].attempts,
        0,
        "format rejection must not burn an attempt"
    );
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_send_login_code_for_verified_account() {
    let users = MockUserRepo::new(vec![test_user("ada@example.com", true)]);
    let otps = MockOtpRepo::empty();
    let codes = otps.handle();

    let uc = LoginUseCase {
        users,
        request_otp: RequestOtpUseCase {
            otps,
            mailer: MockMailer::new(),
            policy: OtpPolicy::default(),
        },
    };
    let email = uc.execute("Ada@example.COM").await.unwrap();

    assert_eq!(email, "ada@example.com");
    let codes = codes.lock().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0].purpose, OtpPurpose::Login);
}

#[tokio::test]
async fn should_refuse_login_for_unknown_or_unverified_account() {
    let uc = LoginUseCase {
        users: MockUserRepo::empty(),
        request_otp: RequestOtpUseCase {
            otps: MockOtpRepo::empty(),
            mailer: MockMailer::new(),
            policy: OtpPolicy::default(),
        },
    };
    assert!(matches!(
        uc.execute("nobody@example.com").await,
        Err(ApiError::UserNotFound)
    ));

    let uc = LoginUseCase {
        users: MockUserRepo::new(vec![test_user("ada@example.com", false)]),
        request_otp: RequestOtpUseCase {
            otps: MockOtpRepo::empty(),
            mailer: MockMailer::new(),
            policy: OtpPolicy::default(),
        },
    };
    assert!(matches!(
        uc.execute("ada@example.com").await,
        Err(ApiError::EmailNotVerified)
    ));
}

#[tokio::test]
async fn should_complete_login_and_stamp_last_login() {
    let user = test_user("ada@example.com", true);
    let user_id = user.id;
    let users = MockUserRepo::new(vec![user]);
    let users_handle = users.handle();

    let uc = VerifyLoginUseCase {
        users,
        verify_otp: VerifyOtpUseCase {
            otps: MockOtpRepo::new(vec![test_otp(
                "ada@example.com",
                "654321",
                OtpPurpose::Login,
            )]),
            policy: OtpPolicy::default(),
        },
        jwt_secret: TEST_SECRET.to_owned(),
    };
    let output = uc.execute("ada@example.com", "654321").await.unwrap();

    assert_eq!(output.user.id, user_id);
    assert!(
        output.user.last_login.is_some(),
        "response must carry the login just stamped"
    );
    let users = users_handle.lock().unwrap();
    assert!(users[0].last_login.is_some());

    let claims = validate_token(&output.token, TEST_SECRET).unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);
}

// ── Resend ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_resend_with_unknown_purpose() {
    let uc = ResendOtpUseCase {
        users: MockUserRepo::new(vec![test_user("ada@example.com", true)]),
        request_otp: RequestOtpUseCase {
            otps: MockOtpRepo::empty(),
            mailer: MockMailer::new(),
            policy: OtpPolicy::default(),
        },
    };
    let result = uc.execute("ada@example.com", "password_reset").await;
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn should_refuse_login_resend_for_unverified_account() {
    let uc = ResendOtpUseCase {
        users: MockUserRepo::new(vec![test_user("ada@example.com", false)]),
        request_otp: RequestOtpUseCase {
            otps: MockOtpRepo::empty(),
            mailer: MockMailer::new(),
            policy: OtpPolicy::default(),
        },
    };
    let result = uc.execute("ada@example.com", "login").await;
    assert!(matches!(result, Err(ApiError::EmailNotVerified)));

    // Verification resends for the same unverified account are fine.
    let uc = ResendOtpUseCase {
        users: MockUserRepo::new(vec![test_user("ada@example.com", false)]),
        request_otp: RequestOtpUseCase {
            otps: MockOtpRepo::empty(),
            mailer: MockMailer::new(),
            policy: OtpPolicy::default(),
        },
    };
    uc.execute("ada@example.com", "email_verification")
        .await
        .unwrap();
}

// ── Google sign-in ───────────────────────────────────────────────────────────

#[tokio::test]
async fn should_create_verified_account_on_first_google_sign_in() {
    let users = MockUserRepo::empty();
    let users_handle = users.handle();

    let uc = GoogleSignInUseCase {
        users,
        google: MockGoogle::returning("Ada@Example.com", "Ada Lovelace"),
        jwt_secret: TEST_SECRET.to_owned(),
    };
    let output = uc.with_credential("credential").await.unwrap();

    assert!(output.user.is_email_verified);
    assert_eq!(output.user.email, "ada@example.com");
    assert_eq!(output.user.date_of_birth, PLACEHOLDER_DATE_OF_BIRTH);
    assert_eq!(users_handle.lock().unwrap().len(), 1);

    let claims = validate_token(&output.token, TEST_SECRET).unwrap();
    assert_eq!(claims.user_id().unwrap(), output.user.id);
}

#[tokio::test]
async fn should_reuse_existing_account_on_google_sign_in() {
    let existing = test_user("ada@example.com", true);
    let existing_id = existing.id;
    let users = MockUserRepo::new(vec![existing]);
    let users_handle = users.handle();

    let uc = GoogleSignInUseCase {
        users,
        google: MockGoogle::returning("ada@example.com", "Ada Lovelace"),
        jwt_secret: TEST_SECRET.to_owned(),
    };
    let output = uc.with_code("auth-code").await.unwrap();

    assert_eq!(output.user.id, existing_id);
    assert!(
        output.user.last_login.is_some(),
        "response must carry the login just stamped"
    );
    let users = users_handle.lock().unwrap();
    assert_eq!(users.len(), 1, "no duplicate account");
    assert!(users[0].last_login.is_some());
}

#[tokio::test]
async fn should_surface_provider_rejection() {
    let uc = GoogleSignInUseCase {
        users: MockUserRepo::empty(),
        google: MockGoogle::rejecting(),
        jwt_secret: TEST_SECRET.to_owned(),
    };
    let result = uc.with_credential("bad").await;
    assert!(matches!(result, Err(ApiError::GoogleAuth(_))));
}
