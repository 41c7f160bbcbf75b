//! Bearer-token helpers for tests.
//!
//! Mints real HS256 tokens with a fixed test secret so request paths exercise
//! the same validation production uses.

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};

use vault_auth_types::token::issue_access_token;

/// Secret shared by test token issuers and the services under test.
pub const TEST_JWT_SECRET: &str = "vault-test-secret";

/// Identity whose token is attached to test requests.
pub struct BearerAuth {
    pub user_id: i32,
    pub secret: String,
}

impl BearerAuth {
    pub fn new(user_id: i32) -> Self {
        Self {
            user_id,
            secret: TEST_JWT_SECRET.to_owned(),
        }
    }

    pub fn with_secret(user_id: i32, secret: &str) -> Self {
        Self {
            user_id,
            secret: secret.to_owned(),
        }
    }

    /// Signed access token valid for one hour.
    pub fn token(&self) -> String {
        let (token, _) = issue_access_token(self.user_id, &self.secret, 3600).unwrap();
        token
    }

    /// `Authorization` header value.
    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", self.token())).unwrap()
    }

    pub fn headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, self.header_value());
        map
    }
}
