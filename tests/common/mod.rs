use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;

use book_user_api::auth::JwtService;
use book_user_api::mail::{MailError, MailSender};
use book_user_api::user::models::{User, STATE_DISABLED, STATE_ENABLED};
use book_user_api::user::repository::InMemoryUserStore;
use book_user_api::user::service::UserService;
use book_user_api::user::AppState;
use book_user_api::utils::password::security::{PasswordHasher, SaltedMd5Hasher};

pub const SECRET: &str = "test_secret";
pub const SALT: &str = "test_salt";
pub const RESET_PASSWORD: &str = "123456789";

/// Build an initialized test service from app state
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new().app_data($state.clone()).configure(book_user_api::configure),
        )
        .await
    };
}

/// Call the service, returning the status and the JSON envelope
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req).await;
        let status = resp.status();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Log in through the endpoint and return the issued token
macro_rules! login_token {
    ($app:expr, $name:expr, $password:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/user/login")
            .set_json(serde_json::json!({"userName": $name, "userPassword": $password}))
            .to_request();
        let (_, body) = send!($app, req);
        assert_eq!(body["success"], true, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }};
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub content: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send_simple_mail(&self, to: &str, subject: &str, content: &str) -> Result<(), MailError> {
        self.sent.lock().await.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl MailSender for FailingMailer {
    async fn send_simple_mail(&self, _to: &str, _subject: &str, _content: &str) -> Result<(), MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

pub fn stored_user(user_id: i32, name: &str, password: &str, user_state: i32) -> User {
    User {
        user_id,
        user_name: name.to_string(),
        user_password: Some(SaltedMd5Hasher::new(SALT).hash(password).unwrap()),
        user_state,
    }
}

pub struct TestContext {
    pub state: actix_web::web::Data<AppState>,
    pub store: Arc<InMemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
}

/// alice (id 1, enabled, "secret") and bob (id 2, disabled, "secret")
pub fn seeded_with(mailer: Arc<dyn MailSender>) -> (actix_web::web::Data<AppState>, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::with_users(vec![
        stored_user(1, "alice", "secret", STATE_ENABLED),
        stored_user(2, "bob", "secret", STATE_DISABLED),
    ]));

    let users = UserService::new(store.clone(), Arc::new(SaltedMd5Hasher::new(SALT)));
    let state = actix_web::web::Data::new(AppState::new(
        users,
        jwt(),
        mailer,
        RESET_PASSWORD,
    ));

    (state, store)
}

pub fn seeded() -> TestContext {
    let mailer = Arc::new(RecordingMailer::default());
    let (state, store) = seeded_with(mailer.clone());

    TestContext {
        state,
        store,
        mailer,
    }
}

pub fn jwt() -> JwtService {
    JwtService::new(SECRET, Duration::hours(1))
}
