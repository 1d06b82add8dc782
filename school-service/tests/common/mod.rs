use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::JwtHandler;
use auth::TokenService;
use chrono::Duration;
use school_service::domain::user::models::CreateAdminCommand;
use school_service::domain::user::models::EmailAddress;
use school_service::domain::user::models::FullName;
use school_service::domain::user::ports::AuthServicePort;
use school_service::domain::user::ports::EmailSender;
use school_service::domain::user::service::AuthService;
use school_service::inbound::http::router::create_router;
use school_service::inbound::http::router::RouterOptions;
use school_service::outbound::repositories::InMemoryUserDirectory;
use school_service::user::errors::EmailDeliveryError;
use serde_json::json;
use serde_json::Value;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@school.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Email sender that records reset tokens instead of delivering them
#[derive(Default)]
pub struct CapturingEmailSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingEmailSender {
    /// Most recent reset token sent to `email`
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, token)| token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for CapturingEmailSender {
    async fn send_password_reset(
        &self,
        to: &EmailAddress,
        _full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailDeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.as_str().to_string(), reset_token.to_string()));
        Ok(())
    }
}

/// Test settings applied when spawning the application
pub struct TestOptions {
    pub open_student_registration: bool,
    pub reset_token_ttl: Duration,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            open_student_registration: true,
            reset_token_ttl: Duration::minutes(60),
        }
    }
}

/// Test application that spawns a real server backed by the in-memory directory
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub emails: Arc<CapturingEmailSender>,
    pub tokens: Arc<TokenService>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let directory = Arc::new(InMemoryUserDirectory::new());
        let emails = Arc::new(CapturingEmailSender::default());
        let tokens = Arc::new(TokenService::new(
            JwtHandler::new(JWT_SECRET),
            Duration::minutes(30),
        ));

        let auth_service = Arc::new(
            AuthService::new(directory, Arc::clone(&emails), Arc::clone(&tokens))
                .with_reset_token_ttl(options.reset_token_ttl),
        );

        auth_service
            .ensure_default_admin(CreateAdminCommand {
                email: EmailAddress::new(ADMIN_EMAIL.to_string()).unwrap(),
                full_name: FullName::new("System Administrator".to_string()).unwrap(),
                mobile: "+1234567890".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            })
            .await
            .expect("Failed to bootstrap admin");

        let router = create_router(
            auth_service,
            RouterOptions {
                open_student_registration: options.open_student_registration,
            },
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::builder()
                .build()
                .expect("Failed to create reqwest client"),
            emails,
            tokens,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PATCH request with Bearer token
    pub fn patch_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .patch(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Log in and return the access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK, "login failed");

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["accessToken"]
            .as_str()
            .expect("Missing access token")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register a student and return the response body
    pub async fn register_student(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth/register/student")
            .json(&json!({
                "email": email,
                "password": password,
                "fullName": "Alice Student",
                "mobile": "+1234567892",
                "className": "Grade 10",
                "address": "123 School Street"
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register a teacher with the given token
    pub async fn register_teacher(&self, token: &str, email: &str) -> reqwest::Response {
        self.post_authenticated("/auth/register/teacher", token)
            .json(&json!({
                "email": email,
                "password": "teacher123",
                "fullName": "Bob Teacher",
                "mobile": "+1234567891",
                "subject": "Mathematics"
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
