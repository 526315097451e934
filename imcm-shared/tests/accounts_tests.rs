//! Account workflow tests against PostgreSQL
//!
//! Run with: cargo test -p imcm-shared --test accounts_tests -- --ignored

mod common;

use chrono::{Duration, Utc};
use common::*;
use imcm_shared::accounts::confirmation::{confirm_email, verify_registration, ConfirmationOutcome};
use imcm_shared::accounts::invite::{
    accept_invite, delete_users, invite_user, promote_user, resolve_target, update_user,
    AcceptInvite, ManageTarget, UpdateUser, INVITE_SUBJECT, REMINDER_SUBJECT,
};
use imcm_shared::accounts::registration::{register_admin, RegisterAdmin};
use imcm_shared::accounts::session::login;
use imcm_shared::accounts::two_factor::{disable_otp, generate_otp, validate_otp, verify_otp};
use imcm_shared::accounts::{AccountError, AccountsConfig};
use imcm_shared::auth::jwt::issue_verification_token;
use imcm_shared::auth::otp::{code_at, unix_now};
use imcm_shared::db::pool::close_pool;
use imcm_shared::models::client::{Client, CreateClient};
use imcm_shared::models::company::{Company, CreateCompany};
use imcm_shared::models::franchise::Franchise;
use imcm_shared::models::invite_token::InviteToken;
use imcm_shared::models::referral::{CreateReferral, Referral, ReferralError};
use imcm_shared::models::user::{User, UserStatus};
use uuid::Uuid;

const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

fn acceptance(email: &str) -> AcceptInvite {
    AcceptInvite {
        email: email.to_string(),
        first_name: "Sam".to_string(),
        last_name: "Rivera".to_string(),
        phone: Some("555-0101".to_string()),
        password: "invitee-password".to_string(),
    }
}

/// Stays clear of a TOTP step boundary so a code generated now is still
/// current when it is checked
async fn wait_for_fresh_step() {
    if unix_now() % 30 > 27 {
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_invite_twice_renews_single_token() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let mailer = RecordingMailer::default();
    let config = AccountsConfig::default();
    let email = unique_email("invitee");

    let first = invite_user(&pool, &mailer, &config, company.id, &email)
        .await
        .expect("First invite failed");
    assert!(!first.renewed);
    assert!(first
        .roster
        .iter()
        .any(|u| u.email == email && u.status == UserStatus::Pending));

    let second = invite_user(&pool, &mailer, &config, company.id, &email.to_uppercase())
        .await
        .expect("Second invite failed");
    assert!(second.renewed);
    assert_eq!(second.token.id, first.token.id);
    assert!(second.token.expires_at >= first.token.expires_at);

    let count = InviteToken::count_for(&pool, company.id, &email)
        .await
        .expect("Count failed");
    assert_eq!(count, 1);

    let pending = second
        .roster
        .iter()
        .filter(|u| u.email == email)
        .count();
    assert_eq!(pending, 1);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, INVITE_SUBJECT);
    assert_eq!(sent[1].subject, REMINDER_SUBJECT);
    assert!(sent[1].text_body.contains(&first.token.id.to_string()));

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_invite_without_admin() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let mailer = RecordingMailer::default();

    let result = invite_user(
        &pool,
        &mailer,
        &AccountsConfig::default(),
        company.id,
        &unique_email("invitee"),
    )
    .await;

    assert!(matches!(result, Err(AccountError::NoCompanyAdmin)));
    assert!(mailer.sent().is_empty());

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_invite_unknown_company() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();

    let result = invite_user(
        &pool,
        &mailer,
        &AccountsConfig::default(),
        Uuid::new_v4(),
        &unique_email("invitee"),
    )
    .await;

    assert!(matches!(result, Err(AccountError::NotFound("Company"))));
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_invite_email_of_other_company_account() {
    let pool = setup_pool().await;
    let mailer = RecordingMailer::default();
    let config = AccountsConfig::default();

    let acme = create_company(&pool).await;
    let acme_admin = create_admin(&pool, acme.id).await;
    let globex = create_company(&pool).await;
    create_admin(&pool, globex.id).await;

    let result = invite_user(&pool, &mailer, &config, globex.id, &acme_admin.email).await;
    assert!(matches!(result, Err(AccountError::EmailInUse(_))));

    let count = InviteToken::count_for(&pool, globex.id, &acme_admin.email)
        .await
        .expect("Count failed");
    assert_eq!(count, 0, "no token without a pending user");

    Company::delete(&pool, acme.id).await.expect("Cleanup failed");
    Company::delete(&pool, globex.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_invite_mail_failure_keeps_invite() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let email = unique_email("invitee");

    let result = invite_user(
        &pool,
        &FailingMailer,
        &AccountsConfig::default(),
        company.id,
        &email,
    )
    .await;
    assert!(matches!(result, Err(AccountError::Mail(_))));

    let token = InviteToken::find_by_company_and_email(&pool, company.id, &email)
        .await
        .expect("Query failed");
    assert!(token.is_some());

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_accept_invite_activates_user() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let mailer = RecordingMailer::default();
    let email = unique_email("invitee");

    let outcome = invite_user(&pool, &mailer, &AccountsConfig::default(), company.id, &email)
        .await
        .expect("Invite failed");

    let user = accept_invite(&pool, outcome.token.id, acceptance(&email))
        .await
        .expect("Accept failed");

    assert_eq!(user.status, UserStatus::Active);
    assert!(user.is_verified);
    assert_eq!(user.first_name, "Sam");
    assert_eq!(user.company_id, Some(company.id));
    assert!(user.password_hash.is_some());

    assert!(!InviteToken::exists(&pool, outcome.token.id)
        .await
        .expect("Query failed"));

    // The token is consumed
    let again = accept_invite(&pool, outcome.token.id, acceptance(&email)).await;
    assert!(matches!(again, Err(AccountError::NotFound(_))));

    let logged_in = login(&pool, &email, "invitee-password")
        .await
        .expect("Login failed");
    assert_eq!(logged_in.id, user.id);

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_accept_expired_invite() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let email = unique_email("invitee");

    let outcome = invite_user(
        &pool,
        &RecordingMailer::default(),
        &AccountsConfig::default(),
        company.id,
        &email,
    )
    .await
    .expect("Invite failed");

    sqlx::query("UPDATE invite_tokens SET expires_at = $2 WHERE id = $1")
        .bind(outcome.token.id)
        .bind(Utc::now() - Duration::minutes(1))
        .execute(&pool)
        .await
        .expect("Failed to expire token");

    let result = accept_invite(&pool, outcome.token.id, acceptance(&email)).await;
    assert!(matches!(result, Err(AccountError::TokenExpired)));

    let user = User::find_by_email(&pool, &email)
        .await
        .expect("Query failed")
        .expect("Pending user missing");
    assert_eq!(user.status, UserStatus::Pending);

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_accept_invite_with_other_email() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let email = unique_email("invitee");

    let outcome = invite_user(
        &pool,
        &RecordingMailer::default(),
        &AccountsConfig::default(),
        company.id,
        &email,
    )
    .await
    .expect("Invite failed");

    let result = accept_invite(&pool, outcome.token.id, acceptance(&unique_email("other"))).await;
    assert!(matches!(result, Err(AccountError::NotFound(_))));

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_concurrent_accepts_activate_once() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let email = unique_email("invitee");

    let outcome = invite_user(
        &pool,
        &RecordingMailer::default(),
        &AccountsConfig::default(),
        company.id,
        &email,
    )
    .await
    .expect("Invite failed");

    let (a, b) = tokio::join!(
        accept_invite(&pool, outcome.token.id, acceptance(&email)),
        accept_invite(&pool, outcome.token.id, acceptance(&email)),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_register_admin_once_per_company() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;

    let form = |email: String| RegisterAdmin {
        first_name: Some("Alex".to_string()),
        last_name: Some("Kim".to_string()),
        email: Some(email),
        password: Some("first-admin-password".to_string()),
        company: Some(company.name.clone()),
        access_token: Some(company.access_token.clone()),
        phone: Some("555-0102".to_string()),
    };

    let admin = register_admin(&pool, form(unique_email("first")))
        .await
        .expect("Registration failed");
    assert_eq!(admin.status, UserStatus::Admin);
    assert!(admin.is_verified);

    let second = register_admin(&pool, form(unique_email("second"))).await;
    assert!(matches!(second, Err(AccountError::AccessTokenAlreadyUsed)));

    let roster = User::list_by_company(&pool, company.id)
        .await
        .expect("Query failed");
    assert_eq!(roster.len(), 1);

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_register_admin_validation() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let existing = create_admin(&pool, company.id).await;

    let result = register_admin(
        &pool,
        RegisterAdmin {
            email: Some(existing.email.clone()),
            ..Default::default()
        },
    )
    .await;

    match result {
        Err(AccountError::Validation(errors)) => {
            assert!(errors.contains(&"first_name can't be empty".to_string()));
            assert!(errors.contains(&"Access Token can't be empty".to_string()));
            assert!(errors.contains(&"Account already exists with this email id.".to_string()));
        }
        other => panic!("Expected validation error, got {:?}", other),
    }

    let wrong_token = register_admin(
        &pool,
        RegisterAdmin {
            first_name: Some("Alex".to_string()),
            last_name: Some("Kim".to_string()),
            email: Some(unique_email("new")),
            password: Some("password".to_string()),
            company: Some(company.name.clone()),
            access_token: Some("imcm_wrong".to_string()),
            phone: Some("555-0102".to_string()),
        },
    )
    .await;
    assert!(matches!(wrong_token, Err(AccountError::NotFound("Company"))));

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_two_factor_lifecycle() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let admin = create_admin(&pool, company.id).await;
    let config = AccountsConfig::default();

    let generated = generate_otp(&pool, &config, admin.id)
        .await
        .expect("Generate failed");
    let secret = generated.otp_base32.clone().expect("Secret missing");
    assert!(generated
        .otp_auth_url
        .as_deref()
        .is_some_and(|url| url.starts_with("otpauth://totp/")));
    assert!(!generated.otp_enabled);

    // Not verified yet
    let early = validate_otp(&pool, admin.id, "000000").await;
    assert!(matches!(early, Err(AccountError::OtpVerificationFailed(_))));

    wait_for_fresh_step().await;
    let now = unix_now();
    let code = code_at(&secret, now).expect("Code failed");
    let verified = verify_otp(&pool, admin.id, &code).await.expect("Verify failed");
    assert!(verified.otp_enabled);
    assert!(verified.otp_verified);

    // One step of drift is accepted at login
    let previous = code_at(&secret, now - 30).expect("Code failed");
    validate_otp(&pool, admin.id, &previous)
        .await
        .expect("Validate with previous step failed");

    let disabled = disable_otp(&pool, admin.id).await.expect("Disable failed");
    assert!(!disabled.otp_enabled);
    assert!(disabled.otp_base32.is_none());

    let after = validate_otp(&pool, admin.id, &code).await;
    assert!(matches!(after, Err(AccountError::OtpNotGenerated)));

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_verify_otp_without_secret() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let admin = create_admin(&pool, company.id).await;

    let result = verify_otp(&pool, admin.id, "123456").await;
    assert!(matches!(result, Err(AccountError::OtpNotGenerated)));

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_promote_update_and_delete_users() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let admin = create_admin(&pool, company.id).await;
    let email = unique_email("invitee");

    let outcome = invite_user(
        &pool,
        &RecordingMailer::default(),
        &AccountsConfig::default(),
        company.id,
        &email,
    )
    .await
    .expect("Invite failed");

    let pending = User::find_by_email(&pool, &email)
        .await
        .expect("Query failed")
        .expect("Pending user missing");
    assert!(matches!(
        promote_user(&pool, pending.id).await,
        Err(AccountError::Validation(_))
    ));

    let member = accept_invite(&pool, outcome.token.id, acceptance(&email))
        .await
        .expect("Accept failed");

    let roster = promote_user(&pool, member.id).await.expect("Promote failed");
    assert!(roster
        .iter()
        .any(|u| u.id == member.id && u.status == UserStatus::Admin));

    let renamed = update_user(
        &pool,
        member.id,
        UpdateUser {
            first_name: "Samantha".to_string(),
            last_name: "Rivera".to_string(),
            email: email.clone(),
        },
    )
    .await
    .expect("Update failed");
    assert_eq!(renamed.first_name, "Samantha");

    let taken = update_user(
        &pool,
        member.id,
        UpdateUser {
            first_name: "Samantha".to_string(),
            last_name: "Rivera".to_string(),
            email: admin.email.clone(),
        },
    )
    .await;
    assert!(matches!(taken, Err(AccountError::EmailInUse(_))));

    assert!(matches!(
        resolve_target(&pool, member.id).await,
        Ok(ManageTarget::User(id)) if id == member.id
    ));
    assert!(matches!(
        resolve_target(&pool, company.id).await,
        Ok(ManageTarget::Company(_))
    ));

    assert!(matches!(
        delete_users(&pool, company.id, &[]).await,
        Err(AccountError::Validation(_))
    ));
    assert!(matches!(
        delete_users(&pool, company.id, &[Uuid::new_v4()]).await,
        Err(AccountError::NotFound("User"))
    ));

    let remaining = delete_users(&pool, company.id, &[member.id])
        .await
        .expect("Delete failed");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, admin.id);

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_deleting_pending_users_revokes_their_invites() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let mailer = RecordingMailer::default();
    let config = AccountsConfig::default();

    let mut invited = Vec::new();
    for prefix in ["solo", "pair-a", "pair-b"] {
        let email = unique_email(prefix);
        let outcome = invite_user(&pool, &mailer, &config, company.id, &email)
            .await
            .expect("Invite failed");
        let user = User::find_by_email(&pool, &email)
            .await
            .expect("Query failed")
            .expect("Pending user missing");
        invited.push((user, outcome.token));
    }

    // One id
    let (solo, solo_token) = &invited[0];
    delete_users(&pool, company.id, &[solo.id])
        .await
        .expect("Delete failed");
    assert!(InviteToken::find_by_id(&pool, solo_token.id)
        .await
        .expect("Query failed")
        .is_none());
    assert!(matches!(
        resolve_target(&pool, solo_token.id).await,
        Err(AccountError::NotFound(_))
    ));

    // Several ids
    let ids: Vec<Uuid> = invited[1..].iter().map(|(user, _)| user.id).collect();
    delete_users(&pool, company.id, &ids)
        .await
        .expect("Delete failed");
    for (user, token) in &invited[1..] {
        let count = InviteToken::count_for(&pool, company.id, &user.email)
            .await
            .expect("Count failed");
        assert_eq!(count, 0, "invite left behind for {}", user.email);
        assert!(InviteToken::find_by_id(&pool, token.id)
            .await
            .expect("Query failed")
            .is_none());
    }

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_renaming_pending_user_moves_invite() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    create_admin(&pool, company.id).await;
    let old_email = unique_email("typo");
    let new_email = unique_email("fixed");

    let outcome = invite_user(
        &pool,
        &RecordingMailer::default(),
        &AccountsConfig::default(),
        company.id,
        &old_email,
    )
    .await
    .expect("Invite failed");
    let pending = User::find_by_email(&pool, &old_email)
        .await
        .expect("Query failed")
        .expect("Pending user missing");

    let updated = update_user(
        &pool,
        pending.id,
        UpdateUser {
            first_name: "Jo".to_string(),
            last_name: "Park".to_string(),
            email: new_email.clone(),
        },
    )
    .await
    .expect("Update failed");
    assert_eq!(updated.email, new_email);
    assert_eq!(updated.status, UserStatus::Pending);

    assert_eq!(
        InviteToken::count_for(&pool, company.id, &old_email)
            .await
            .expect("Count failed"),
        0
    );
    let moved = InviteToken::find_by_company_and_email(&pool, company.id, &new_email)
        .await
        .expect("Query failed")
        .expect("Invite did not follow the new email");
    assert_eq!(moved.id, outcome.token.id);

    let user = accept_invite(&pool, moved.id, acceptance(&new_email))
        .await
        .expect("Accept failed");
    assert_eq!(user.id, pending.id);
    assert_eq!(user.status, UserStatus::Active);

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_email_confirmation() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let user = User::create(
        &pool,
        imcm_shared::models::user::CreateUser {
            company_id: company.id,
            email: unique_email("unverified"),
            password_hash: None,
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            status: UserStatus::Active,
            is_verified: false,
        },
    )
    .await
    .expect("Failed to create user");

    let token = issue_verification_token(user.id, Duration::hours(1), SECRET).expect("Token failed");

    let outcome = confirm_email(&pool, SECRET, &token, user.id)
        .await
        .expect("Confirmation failed");
    assert_eq!(outcome, ConfirmationOutcome::Verified);

    let outcome = confirm_email(&pool, SECRET, &token, user.id)
        .await
        .expect("Confirmation failed");
    assert_eq!(outcome, ConfirmationOutcome::AlreadyVerified);

    let verified = verify_registration(&pool, SECRET, &token)
        .await
        .expect("Verification failed");
    assert!(verified.is_verified);

    let expired =
        issue_verification_token(user.id, Duration::hours(-1), SECRET).expect("Token failed");
    assert!(matches!(
        verify_registration(&pool, SECRET, &expired).await,
        Err(AccountError::ActivationExpired)
    ));
    assert_eq!(
        confirm_email(&pool, SECRET, &expired, user.id)
            .await
            .expect("Confirmation failed"),
        ConfirmationOutcome::Expired
    );

    assert!(matches!(
        confirm_email(&pool, SECRET, &token, Uuid::new_v4()).await,
        Err(AccountError::UserNotFound)
    ));

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_login_rejects_pending_and_wrong_password() {
    let pool = setup_pool().await;
    let company = create_company(&pool).await;
    let admin = create_admin(&pool, company.id).await;

    assert!(matches!(
        login(&pool, &admin.email, "wrong").await,
        Err(AccountError::InvalidCredentials)
    ));
    assert!(matches!(
        login(&pool, &unique_email("nobody"), ADMIN_PASSWORD).await,
        Err(AccountError::InvalidCredentials)
    ));

    let user = login(&pool, &admin.email.to_uppercase(), ADMIN_PASSWORD)
        .await
        .expect("Login failed");
    assert_eq!(user.id, admin.id);

    let reloaded = User::find_by_id(&pool, admin.id)
        .await
        .expect("Query failed")
        .expect("User missing");
    assert!(reloaded.last_login_at.is_some());

    Company::delete(&pool, company.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn test_referral_rules() {
    let pool = setup_pool().await;
    let franchise = Franchise::create(&pool, "Test Franchise")
        .await
        .expect("Failed to create franchise");

    let member = |name: &str| CreateCompany {
        name: format!("{name} {}", Uuid::new_v4().simple()),
        franchise_id: Some(franchise.id),
        ..Default::default()
    };
    let from = Company::create(&pool, member("From")).await.expect("Company failed");
    let to = Company::create(&pool, member("To")).await.expect("Company failed");

    let client = Client::create(
        &pool,
        CreateClient {
            company_id: from.id,
            name: "Jordan Smith".to_string(),
            address: "12 Elm St".to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("Client failed");

    let referral = Referral::create(
        &pool,
        CreateReferral {
            franchise_id: franchise.id,
            referred_from: from.id,
            referred_to: to.id,
            client_id: client.id,
            contacted: false,
        },
    )
    .await
    .expect("Referral failed");
    assert_eq!(referral.referred_to, Some(to.id));

    let received = Referral::list_received(&pool, to.id).await.expect("Query failed");
    assert_eq!(received.len(), 1);

    let reversed = Referral::create(
        &pool,
        CreateReferral {
            franchise_id: franchise.id,
            referred_from: to.id,
            referred_to: from.id,
            client_id: client.id,
            contacted: false,
        },
    )
    .await;
    assert!(matches!(reversed, Err(ReferralError::ClientCompanyMismatch)));

    Company::delete(&pool, from.id).await.expect("Cleanup failed");
    Company::delete(&pool, to.id).await.expect("Cleanup failed");
    Franchise::delete(&pool, franchise.id).await.expect("Cleanup failed");
    close_pool(pool).await;
}
