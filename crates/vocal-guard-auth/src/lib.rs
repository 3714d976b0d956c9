#![warn(missing_docs)]
//! # vocal-guard-auth
//!
//! ## Purpose
//! Implements authentication primitives for `vocal-guard`: account endpoints,
//! credential flows, and client-side bearer-token expiry inspection.
//!
//! ## Responsibilities
//! - Validate API base-endpoint policy (`http`/`https`, non-empty host).
//! - Execute signup/login/verify/password requests through an injectable
//!   transport abstraction.
//! - Decode the bearer token's embedded expiry claim without verification.
//!
//! ## Data flow
//! UI collects credentials -> [`AuthClient::login`] sends request through
//! [`AuthTransport`] -> response validation produces a
//! [`vocal_guard_core::Session`] consumed by the session lifecycle manager.
//!
//! ## Ownership and lifetimes
//! Request/response values are owned (`String`) to decouple transport and
//! session-manager lifetimes.
//!
//! ## Error model
//! Endpoint policy violations, credential rejections, and transport failures
//! are surfaced as [`AuthError`], allowing the app to prompt reauth or show a
//! recoverable message.
//!
//! ## Security and privacy notes
//! Token expiry decoding reads the unverified JWT payload as a UX
//! optimization only; the backend verify endpoint stays authoritative. This
//! crate never logs credentials or token values.
//!
//! ## Example
//! ```rust
//! use vocal_guard_auth::validate_api_base;
//!
//! assert!(validate_api_base("http://127.0.0.1:8000").is_ok());
//! assert!(validate_api_base("ftp://example.test").is_err());
//! ```

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use vocal_guard_core::Session;

/// Account creation path.
pub const SIGNUP_PATH: &str = "/signup";
/// Credential login path.
pub const LOGIN_PATH: &str = "/login";
/// Bearer-token verification path.
pub const VERIFY_PATH: &str = "/protected";
/// Password reset request path.
pub const FORGOT_PASSWORD_PATH: &str = "/forgot-password";
/// Authenticated password change path.
pub const CHANGE_PASSWORD_PATH: &str = "/user/password";

/// User-provided login credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Login request payload forwarded to the auth transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email for account lookup.
    pub email: String,
    /// Password for credential verification.
    pub password: String,
}

/// Signup request payload forwarded to the auth transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Email for the new account.
    pub email: String,
    /// Password for the new account.
    pub password: String,
    /// Requested display name.
    pub username: String,
}

/// Password reset request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    /// Email of the account to reset.
    pub email: String,
}

/// Authenticated password change payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password, re-verified server-side.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}

/// Raw account response returned by signup and login endpoints.
///
/// Fields other than `token` and `user_id` are optional; older backend
/// revisions omit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    /// Bearer token for protected API calls.
    #[serde(default)]
    pub token: String,
    /// Server-assigned user identifier.
    #[serde(default)]
    pub user_id: String,
    /// Display name chosen at signup, when echoed back.
    #[serde(default)]
    pub username: Option<String>,
    /// Account email, when echoed back.
    #[serde(default)]
    pub email: Option<String>,
}

/// Abstract transport used by the auth client.
///
/// Implementations perform the actual HTTP exchange; the client owns request
/// construction, endpoint policy, and response validation.
pub trait AuthTransport: Send + Sync {
    /// Sends a signup request.
    fn signup(&self, endpoint: &str, request: &SignupRequest)
    -> Result<AccountResponse, AuthError>;

    /// Sends a login request.
    fn login(&self, endpoint: &str, request: &LoginRequest) -> Result<AccountResponse, AuthError>;

    /// Verifies a bearer token against the protected endpoint.
    fn verify(&self, endpoint: &str, bearer_token: &str) -> Result<(), AuthError>;

    /// Requests a password reset email.
    fn forgot_password(
        &self,
        endpoint: &str,
        request: &ForgotPasswordRequest,
    ) -> Result<(), AuthError>;

    /// Changes the account password using an authenticated call.
    fn change_password(
        &self,
        endpoint: &str,
        bearer_token: &str,
        request: &ChangePasswordRequest,
    ) -> Result<(), AuthError>;
}

/// Auth client that validates endpoint policy and executes account flows.
#[derive(Clone)]
pub struct AuthClient {
    base: Url,
    transport: Arc<dyn AuthTransport>,
}

impl AuthClient {
    /// Creates a validated auth client.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidEndpoint`] when the base URL is not
    /// `http`/`https` or has no host.
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn AuthTransport>,
    ) -> Result<Self, AuthError> {
        let base = validate_api_base(&base_url.into())?;
        Ok(Self { base, transport })
    }

    /// Executes login and converts the server response into a session.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptyCredential`] for blank email/password.
    /// Returns [`AuthError::InvalidResponse`] when the response lacks a token
    /// or user id. Propagates transport errors as-is for caller retry/prompt
    /// behavior.
    pub fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.email.trim().is_empty() || credentials.password.trim().is_empty() {
            return Err(AuthError::EmptyCredential);
        }

        let response = self.transport.login(
            &self.endpoint(LOGIN_PATH),
            &LoginRequest {
                email: credentials.email.clone(),
                password: credentials.password.clone(),
            },
        )?;

        self.session_from_response(response, Some(&credentials.email))
    }

    /// Executes signup and converts the server response into a session.
    ///
    /// # Errors
    /// Same contract as [`AuthClient::login`].
    pub fn signup(&self, request: &SignupRequest) -> Result<Session, AuthError> {
        if request.email.trim().is_empty() || request.password.trim().is_empty() {
            return Err(AuthError::EmptyCredential);
        }

        let mut response = self
            .transport
            .signup(&self.endpoint(SIGNUP_PATH), request)?;

        if response.username.is_none() && !request.username.trim().is_empty() {
            response.username = Some(request.username.clone());
        }

        self.session_from_response(response, Some(&request.email))
    }

    /// Verifies a bearer token against the backend.
    ///
    /// # Errors
    /// Propagates the transport error; [`AuthError::Unauthorized`] marks a
    /// rejected token.
    pub fn verify_token(&self, bearer_token: &str) -> Result<(), AuthError> {
        self.transport.verify(&self.endpoint(VERIFY_PATH), bearer_token)
    }

    /// Requests a password reset email for `email`.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptyCredential`] for a blank email; otherwise
    /// propagates the transport error.
    pub fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() {
            return Err(AuthError::EmptyCredential);
        }

        self.transport.forgot_password(
            &self.endpoint(FORGOT_PASSWORD_PATH),
            &ForgotPasswordRequest {
                email: email.to_string(),
            },
        )
    }

    /// Changes the account password. Does not touch session state; the token
    /// stays valid per backend policy.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptyCredential`] when either password is blank;
    /// otherwise propagates the transport error.
    pub fn change_password(
        &self,
        bearer_token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if current_password.trim().is_empty() || new_password.trim().is_empty() {
            return Err(AuthError::EmptyCredential);
        }

        self.transport.change_password(
            &self.endpoint(CHANGE_PASSWORD_PATH),
            bearer_token,
            &ChangePasswordRequest {
                current_password: current_password.to_string(),
                new_password: new_password.to_string(),
            },
        )
    }

    /// Returns the configured API base URL.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Joins an operation path onto the validated base URL.
    pub fn endpoint(&self, path: &str) -> String {
        join_endpoint(&self.base, path)
    }

    fn session_from_response(
        &self,
        response: AccountResponse,
        request_email: Option<&str>,
    ) -> Result<Session, AuthError> {
        if response.token.trim().is_empty() || response.user_id.trim().is_empty() {
            return Err(AuthError::InvalidResponse(
                "response missing token or user id".to_string(),
            ));
        }

        let email = response
            .email
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .or(request_email);

        Session::new(response.token, response.user_id, response.username, email)
            .map_err(|error| AuthError::InvalidResponse(error.to_string()))
    }
}

/// Validates the API base endpoint constraints.
///
/// # Errors
/// Returns [`AuthError::InvalidEndpoint`] for unsupported schemes or URLs
/// without a host.
pub fn validate_api_base(base_url: &str) -> Result<Url, AuthError> {
    let parsed = Url::parse(base_url)
        .map_err(|error| AuthError::InvalidEndpoint(format!("invalid api base url: {error}")))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AuthError::InvalidEndpoint(
            "api base must use http or https".to_string(),
        ));
    }

    if parsed.host_str().is_none() {
        return Err(AuthError::InvalidEndpoint(
            "api base must include a host".to_string(),
        ));
    }

    Ok(parsed)
}

/// Joins an absolute operation path onto a validated base URL.
pub fn join_endpoint(base: &Url, path: &str) -> String {
    match base.join(path) {
        Ok(joined) => joined.to_string(),
        // Invariant: paths used by this workspace are static absolute paths,
        // so join can only fail for a cannot-be-a-base URL, which
        // validate_api_base already rejects.
        Err(_) => format!("{}{path}", base.as_str().trim_end_matches('/')),
    }
}

/// Reads the expiry claim embedded in a bearer token, in epoch milliseconds.
///
/// # Semantics
/// The token is treated as a JWT: the payload segment is base64url-decoded
/// without signature verification and its `exp` claim (epoch seconds) is
/// scaled to milliseconds. Returns `None` for opaque tokens, malformed
/// segments, or payloads without a numeric `exp` — callers treat those as
/// "no locally known expiry" and defer to server-side verification.
pub fn token_expiry_epoch_ms(token: &str) -> Option<u64> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    segments.next()?;

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let expiry_seconds = claims.get("exp")?.as_u64()?;

    expiry_seconds.checked_mul(1_000)
}

/// Returns `true` when the token embeds an expiry that has already passed.
///
/// Tokens without a decodable expiry are never considered locally expired.
pub fn is_token_expired(token: &str, now_ms: u64) -> bool {
    match token_expiry_epoch_ms(token) {
        Some(expiry_ms) => now_ms >= expiry_ms,
        None => false,
    }
}

/// Errors produced by auth client and token inspection logic.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Endpoint violates configuration requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Credentials are missing/blank.
    #[error("email and password must be non-empty")]
    EmptyCredential,
    /// Credential or token was rejected by the backend.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Transport failure reaching the auth backend.
    #[error("auth transport failure: {0}")]
    Transport(String),
    /// Non-2xx response with a structured detail message.
    #[error("auth server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Backend-supplied detail, or a generic fallback.
        message: String,
    },
    /// Response payload violated auth contract expectations.
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Returns `true` when this error marks a rejected credential or token,
    /// as opposed to a transport or server fault.
    pub fn is_credential_rejection(&self) -> bool {
        match self {
            AuthError::Unauthorized(_) => true,
            AuthError::Server { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}
