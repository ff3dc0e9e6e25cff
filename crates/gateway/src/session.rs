//! Session guard.
//!
//! Signing in happens outside this crate (magic link / OTP in the browser).
//! All the client needs is the resulting access token, and a check that one
//! exists before any view is built.

use crate::error::GatewayError;

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
}

impl Session {
    /// `None` for an empty or whitespace-only token.
    pub fn from_token(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return None;
        }
        Some(Self {
            access_token: token.trim().to_string(),
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Gate access to the views: no session, no access.
    pub fn require(session: Option<&Session>) -> Result<&Session, GatewayError> {
        session.ok_or(GatewayError::Unauthorized)
    }
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .finish()
    }
}
