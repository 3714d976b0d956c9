//! Shared fixtures and mock transports for app integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use vocal_guard_app::{AppConfig, AppRuntime};
use vocal_guard_auth::{
    AccountResponse, AuthError, AuthTransport, ChangePasswordRequest, ForgotPasswordRequest,
    LoginRequest, SignupRequest,
};
use vocal_guard_core::AudioFile;
use vocal_guard_history::{DeleteRequest, HistoryError, HistoryTransport};
use vocal_guard_upload::{UploadEnvelope, UploadError, UploadTransport};

/// Builds a bearer token whose payload embeds the given expiry (seconds).
#[allow(dead_code)]
pub fn jwt_with_exp(expiry_seconds: u64) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!("{{\"exp\":{expiry_seconds}}}"));
    format!("e30.{payload}.sig")
}

/// Builds a deterministic audio file fixture of `size` bytes.
#[allow(dead_code)]
pub fn fixture_audio_file(content_type: &str, size: usize) -> AudioFile {
    AudioFile::new("clip.wav", content_type, vec![7; size]).expect("fixture file should build")
}

/// Builds a valid account response fixture.
#[allow(dead_code)]
pub fn fixture_account_response() -> AccountResponse {
    AccountResponse {
        token: "token-abc".to_string(),
        user_id: "uid-1".to_string(),
        username: Some("ana".to_string()),
        email: Some("ana@example.test".to_string()),
    }
}

/// Builds a two-entry history list payload.
#[allow(dead_code)]
pub fn fixture_history_body() -> String {
    r#"{
        "analyses": [
            {"analysis_id":"a-1","filename":"clip_alpha.wav","is_fake":true,"confidence":0.97,"timestamp":100,"model_used":"standard"},
            {"analysis_id":"a-2","filename":"clip_beta.mp3","is_fake":false,"confidence":88.0,"timestamp":300}
        ]
    }"#
    .to_string()
}

/// Auth transport with scriptable login/verify behavior.
pub struct MockAuthTransport {
    /// Response returned by login and signup.
    pub account_response: AccountResponse,
    /// When set, login and signup are rejected.
    pub reject_login: bool,
    /// When set, token verification is rejected.
    pub reject_verify: bool,
}

impl Default for MockAuthTransport {
    fn default() -> Self {
        Self {
            account_response: fixture_account_response(),
            reject_login: false,
            reject_verify: false,
        }
    }
}

impl AuthTransport for MockAuthTransport {
    fn signup(
        &self,
        _endpoint: &str,
        _request: &SignupRequest,
    ) -> Result<AccountResponse, AuthError> {
        if self.reject_login {
            return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(self.account_response.clone())
    }

    fn login(&self, _endpoint: &str, _request: &LoginRequest) -> Result<AccountResponse, AuthError> {
        if self.reject_login {
            return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(self.account_response.clone())
    }

    fn verify(&self, _endpoint: &str, _bearer_token: &str) -> Result<(), AuthError> {
        if self.reject_verify {
            return Err(AuthError::Unauthorized(
                "Invalid authentication credentials".to_string(),
            ));
        }
        Ok(())
    }

    fn forgot_password(
        &self,
        _endpoint: &str,
        _request: &ForgotPasswordRequest,
    ) -> Result<(), AuthError> {
        Ok(())
    }

    fn change_password(
        &self,
        _endpoint: &str,
        _bearer_token: &str,
        _request: &ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Upload transport that counts calls and replays a scripted outcome.
pub struct RecordingUploadTransport {
    /// Number of envelopes that reached the transport.
    pub calls: Mutex<u32>,
    /// Response body returned on success.
    pub body: String,
    /// When set, every send fails with this HTTP status.
    pub fail_with_status: Option<u16>,
}

impl RecordingUploadTransport {
    /// Creates a transport answering with `body`.
    #[allow(dead_code)]
    pub fn answering(body: &str) -> Self {
        Self {
            calls: Mutex::new(0),
            body: body.to_string(),
            fail_with_status: None,
        }
    }

    /// Creates a transport failing every send with `status`.
    #[allow(dead_code)]
    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            calls: Mutex::new(0),
            body: message.to_string(),
            fail_with_status: Some(status),
        }
    }

    /// Returns how many envelopes reached the transport.
    #[allow(dead_code)]
    pub fn call_count(&self) -> u32 {
        *self.calls.lock().expect("call counter lock should work")
    }
}

impl UploadTransport for RecordingUploadTransport {
    fn send(&self, _envelope: &UploadEnvelope) -> Result<String, UploadError> {
        let mut calls = self.calls.lock().expect("call counter lock should work");
        *calls += 1;

        if let Some(status) = self.fail_with_status {
            return Err(UploadError::Server {
                status,
                message: self.body.clone(),
            });
        }
        Ok(self.body.clone())
    }
}

type ListHook = Box<dyn Fn() + Send + Sync>;

/// History transport with a scripted list body, recordable deletes, and an
/// optional hook fired while the list request is in flight.
pub struct MockHistoryTransport {
    /// List payload returned by `fetch_list`.
    pub list_body: String,
    /// Single-analysis payload returned by `fetch_analysis`.
    pub analysis_body: String,
    /// When set, deletes fail with this HTTP status.
    pub delete_fail_status: Option<u16>,
    delete_calls: Mutex<Vec<Vec<String>>>,
    on_list: Mutex<Option<ListHook>>,
}

impl MockHistoryTransport {
    /// Creates a transport answering the list with `list_body`.
    #[allow(dead_code)]
    pub fn answering(list_body: &str) -> Self {
        Self {
            list_body: list_body.to_string(),
            analysis_body: r#"{"is_fake":false,"confidence":0.5}"#.to_string(),
            delete_fail_status: None,
            delete_calls: Mutex::new(Vec::new()),
            on_list: Mutex::new(None),
        }
    }

    /// Installs a hook fired while the list request is in flight.
    #[allow(dead_code)]
    pub fn set_on_list(&self, hook: ListHook) {
        *self.on_list.lock().expect("hook lock should work") = Some(hook);
    }

    /// Returns the recorded delete requests.
    #[allow(dead_code)]
    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls
            .lock()
            .expect("delete log lock should work")
            .clone()
    }
}

impl HistoryTransport for MockHistoryTransport {
    fn fetch_list(&self, _endpoint: &str, _bearer_token: &str) -> Result<String, HistoryError> {
        if let Some(hook) = self.on_list.lock().expect("hook lock should work").as_ref() {
            hook();
        }
        Ok(self.list_body.clone())
    }

    fn fetch_analysis(&self, _endpoint: &str, _bearer_token: &str) -> Result<String, HistoryError> {
        Ok(self.analysis_body.clone())
    }

    fn delete_analyses(
        &self,
        _endpoint: &str,
        _bearer_token: &str,
        request: &DeleteRequest,
    ) -> Result<(), HistoryError> {
        self.delete_calls
            .lock()
            .expect("delete log lock should work")
            .push(request.analysis_ids.clone());

        if let Some(status) = self.delete_fail_status {
            return Err(HistoryError::Server {
                status,
                message: "delete rejected".to_string(),
            });
        }
        Ok(())
    }
}

/// Builds a runtime configuration rooted at `data_dir`.
#[allow(dead_code)]
pub fn fixture_config(data_dir: &Path) -> AppConfig {
    AppConfig {
        api_base_url: "http://127.0.0.1:8000".to_string(),
        data_dir: data_dir.to_path_buf(),
    }
}

/// Wires a runtime over the given transports.
#[allow(dead_code)]
pub fn fixture_runtime(
    data_dir: &Path,
    auth: Arc<MockAuthTransport>,
    upload: Arc<RecordingUploadTransport>,
    history: Arc<MockHistoryTransport>,
) -> AppRuntime {
    AppRuntime::new(fixture_config(data_dir), auth, upload, history)
        .expect("runtime should build over fixture config")
}

/// Wires a runtime with default mock transports.
#[allow(dead_code)]
pub fn default_runtime(data_dir: &Path) -> AppRuntime {
    fixture_runtime(
        data_dir,
        Arc::new(MockAuthTransport::default()),
        Arc::new(RecordingUploadTransport::answering(
            r#"{"is_fake":true,"confidence":0.87}"#,
        )),
        Arc::new(MockHistoryTransport::answering(&fixture_history_body())),
    )
}
