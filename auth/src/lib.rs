//! Authentication utilities library
//!
//! Provides the credential and token primitives of the school identity service:
//! - Password hashing (PBKDF2-HMAC-SHA256, hex `salt || key` encoding)
//! - JWT encoding and validation
//! - Token issuance and verification with expiry windows
//! - One-time URL-safe secrets for password reset flows
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("not_my_password", &hash));
//! ```
//!
//! ## Tokens
//! ```
//! use std::collections::HashMap;
//!
//! use auth::{Claims, JwtHandler, TokenService};
//! use chrono::Duration;
//!
//! let tokens = TokenService::new(
//!     JwtHandler::new(b"secret_key_at_least_32_bytes_long!"),
//!     Duration::minutes(30),
//! );
//!
//! let mut payload = HashMap::new();
//! payload.insert("role".to_string(), "student".to_string());
//!
//! let token = tokens.issue("user123", payload, None).unwrap();
//! let claims: Claims<HashMap<String, String>> = tokens.verify(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.payload["role"], "student");
//! ```

pub mod jwt;
pub mod password;
pub mod secret;
pub mod token;

// Re-export commonly used items
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use secret::generate_url_safe_secret;
pub use token::TokenService;
