use vault_domain::rbac::roles::{EDITOR, USER};
use vault_server::domain::repository::{CaptchaStore, UserRepository};
use vault_server::error::VaultError;
use vault_server::usecase::auth::{
    AuthenticateUseCase, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
};
use vault_testing::auth::BearerAuth;

use crate::helpers::{
    CAPTCHA_ANSWER, CAPTCHA_ID, FixedCaptcha, MemoryStore, TEST_JWT_SECRET, token_settings,
};

fn register_usecase(store: &MemoryStore) -> RegisterUseCase<MemoryStore, MemoryStore, FixedCaptcha> {
    let captcha = FixedCaptcha::default();
    captcha.issue();
    RegisterUseCase {
        users: store.clone(),
        roles: store.clone(),
        captcha,
        token: token_settings(),
    }
}

fn login_usecase(store: &MemoryStore) -> LoginUseCase<MemoryStore, FixedCaptcha> {
    let captcha = FixedCaptcha::default();
    captcha.issue();
    LoginUseCase {
        users: store.clone(),
        captcha,
        token: token_settings(),
    }
}

fn authenticate_usecase(store: &MemoryStore) -> AuthenticateUseCase<MemoryStore> {
    AuthenticateUseCase {
        users: store.clone(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
    }
}

fn register_input(username: &str, password: &str, email: Option<&str>) -> RegisterInput {
    RegisterInput {
        username: username.to_owned(),
        password: password.to_owned(),
        email: email.map(str::to_owned),
        captcha_id: CAPTCHA_ID.to_owned(),
        captcha_answer: CAPTCHA_ANSWER.to_owned(),
    }
}

fn login_input(username: &str, password: &str) -> LoginInput {
    LoginInput {
        username: username.to_owned(),
        password: password.to_owned(),
        captcha_id: CAPTCHA_ID.to_owned(),
        captcha_answer: CAPTCHA_ANSWER.to_owned(),
    }
}

// ── Register ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_with_default_role_and_usable_token() {
    let store = MemoryStore::seeded();

    let output = register_usecase(&store)
        .execute(register_input("alice", "secret123", Some(" alice@example.com ")))
        .await
        .unwrap();

    assert_eq!(output.user.role_names(), vec![USER.to_owned()]);
    assert_eq!(output.user.user.email.as_deref(), Some("alice@example.com"));
    assert_ne!(output.user.user.hashed_password, "secret123");

    let principal = authenticate_usecase(&store)
        .execute(&output.access_token)
        .await
        .unwrap();
    assert_eq!(principal.id(), output.user.user.id);
    assert!(principal.permissions.is_empty());
}

#[tokio::test]
async fn should_not_create_user_when_captcha_is_wrong() {
    let store = MemoryStore::seeded();
    let mut input = register_input("alice", "secret123", None);
    input.captcha_answer = "41".to_owned();

    let result = register_usecase(&store).execute(input).await;

    assert!(matches!(result, Err(VaultError::InvalidCaptcha)));
    assert_eq!(store.user_count(), 0);
}

#[tokio::test]
async fn should_reject_taken_username() {
    let store = MemoryStore::seeded();
    store.add_user("alice", &[USER]);

    let result = register_usecase(&store)
        .execute(register_input("alice", "secret123", None))
        .await;

    assert!(matches!(result, Err(VaultError::UsernameTaken)));
}

#[tokio::test]
async fn should_reject_taken_email() {
    let store = MemoryStore::seeded();
    store.add_user_with_email("carol", "shared@example.com");

    let result = register_usecase(&store)
        .execute(register_input("alice", "secret123", Some("shared@example.com")))
        .await;

    assert!(matches!(result, Err(VaultError::EmailTaken)));
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn should_reject_short_password() {
    let store = MemoryStore::seeded();

    let result = register_usecase(&store)
        .execute(register_input("alice", "12345", None))
        .await;

    assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    assert_eq!(store.user_count(), 0);
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_login_with_correct_password() {
    let store = MemoryStore::seeded();
    let bob = store.add_user_with_password("bob", "hunter22", &[EDITOR]);

    let output = login_usecase(&store)
        .execute(login_input("bob", "hunter22"))
        .await
        .unwrap();

    assert_eq!(output.user.user.id, bob);
    let principal = authenticate_usecase(&store)
        .execute(&output.access_token)
        .await
        .unwrap();
    assert!(principal.has("log.edit"));
}

#[tokio::test]
async fn should_reject_wrong_password_and_unknown_user_alike() {
    let store = MemoryStore::seeded();
    store.add_user_with_password("bob", "hunter22", &[USER]);

    let wrong = login_usecase(&store)
        .execute(login_input("bob", "hunter23"))
        .await;
    let unknown = login_usecase(&store)
        .execute(login_input("nobody", "hunter22"))
        .await;

    assert!(matches!(wrong, Err(VaultError::InvalidCredentials)));
    assert!(matches!(unknown, Err(VaultError::InvalidCredentials)));
}

#[tokio::test]
async fn should_refuse_login_of_disabled_user() {
    let store = MemoryStore::seeded();
    let bob = store.add_user_with_password("bob", "hunter22", &[USER]);
    store.disable_user(bob);

    let result = login_usecase(&store)
        .execute(login_input("bob", "hunter22"))
        .await;

    assert!(matches!(result, Err(VaultError::UserDisabled)));
}

#[tokio::test]
async fn should_require_captcha_for_login() {
    let store = MemoryStore::seeded();
    store.add_user_with_password("bob", "hunter22", &[USER]);
    let mut input = login_input("bob", "hunter22");
    input.captcha_id = "stale".to_owned();

    let result = login_usecase(&store).execute(input).await;

    assert!(matches!(result, Err(VaultError::InvalidCaptcha)));
}

// ── Authenticate ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_authenticate_test_bearer_token() {
    let store = MemoryStore::seeded();
    let bob = store.add_user("bob", &[EDITOR]);

    let principal = authenticate_usecase(&store)
        .execute(&BearerAuth::new(bob).token())
        .await
        .unwrap();

    assert_eq!(principal.id(), bob);
    assert!(principal.has("log.create"));
}

#[tokio::test]
async fn should_reject_garbage_and_foreign_tokens() {
    let store = MemoryStore::seeded();
    let bob = store.add_user("bob", &[USER]);
    let usecase = authenticate_usecase(&store);

    let garbage = usecase.execute("not.a.jwt").await;
    let foreign = usecase
        .execute(&BearerAuth::with_secret(bob, "another-secret").token())
        .await;

    assert!(matches!(garbage, Err(VaultError::InvalidToken)));
    assert!(matches!(foreign, Err(VaultError::InvalidToken)));
}

#[tokio::test]
async fn should_reject_token_of_deleted_user() {
    let store = MemoryStore::seeded();
    let bob = store.add_user("bob", &[USER]);
    let token = BearerAuth::new(bob).token();
    UserRepository::delete(&store, bob).await.unwrap();

    let result = authenticate_usecase(&store).execute(&token).await;

    assert!(matches!(result, Err(VaultError::InvalidToken)));
}
