//! Access tokens for Microsoft Graph.
//!
//! The flow is chosen once from configuration. Both flows cache the token and
//! only go back to the identity platform when it is about to expire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::errors::AuthError;
use super::models::{DeviceCodeResponse, TokenErrorResponse, TokenResponse};
use crate::domain::models::{AuthConfig, AuthMode};

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Added to the poll interval when the platform answers `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);
/// Poll interval when the device-code response does not name one.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

impl CachedToken {
    fn new(response: TokenResponse) -> Self {
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        Self {
            value: response.access_token,
            refresh_at: Instant::now() + lifetime,
        }
    }

    fn fresh(&self) -> Option<&str> {
        (Instant::now() < self.refresh_at).then_some(self.value.as_str())
    }
}

/// Endpoints of one tenant's authority.
#[derive(Debug, Clone)]
struct Endpoints {
    token: String,
    device_code: String,
}

impl Endpoints {
    fn new(authority: &str) -> Self {
        let authority = authority.trim_end_matches('/');
        Self {
            token: format!("{authority}/oauth2/v2.0/token"),
            device_code: format!("{authority}/oauth2/v2.0/devicecode"),
        }
    }
}

/// Callback that shows the device sign-in instructions to the user.
pub type DevicePrompt = Arc<dyn Fn(&str) + Send + Sync>;

/// Client-credential (application) flow.
pub struct ClientCredentialFlow {
    http: Client,
    endpoints: Endpoints,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: Mutex<Option<CachedToken>>,
}

impl ClientCredentialFlow {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().and_then(CachedToken::fresh) {
            return Ok(token.to_string());
        }

        debug!(endpoint = %self.endpoints.token, "requesting client-credential token");
        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", self.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(denial_or_endpoint(status, &body));
        }
        let token: TokenResponse = parse(&body)?;
        let cached = CachedToken::new(token);
        let value = cached.value.clone();
        *cache = Some(cached);
        Ok(value)
    }
}

/// Interactive device-code (delegated) flow.
pub struct DeviceCodeFlow {
    http: Client,
    endpoints: Endpoints,
    client_id: String,
    scopes: String,
    prompt: DevicePrompt,
    cache: Mutex<Option<CachedToken>>,
}

impl DeviceCodeFlow {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().and_then(CachedToken::fresh) {
            return Ok(token.to_string());
        }

        let device = self.start().await?;
        let message = device.message.clone().unwrap_or_else(|| {
            format!(
                "Open {} and enter the code {} to sign in.",
                device.verification_uri, device.user_code
            )
        });
        (self.prompt)(&message);

        let token = self.poll(&device).await?;
        info!("device sign-in completed");
        let cached = CachedToken::new(token);
        let value = cached.value.clone();
        *cache = Some(cached);
        Ok(value)
    }

    async fn start(&self) -> Result<DeviceCodeResponse, AuthError> {
        let response = self
            .http
            .post(&self.endpoints.device_code)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scopes.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(denial_or_endpoint(status, &body));
        }
        parse(&body)
    }

    async fn poll(&self, device: &DeviceCodeResponse) -> Result<TokenResponse, AuthError> {
        let deadline = Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = device
            .interval
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        loop {
            if Instant::now() >= deadline {
                return Err(AuthError::DeviceCodeExpired);
            }
            tokio::time::sleep(interval).await;

            let response = self
                .http
                .post(&self.endpoints.token)
                .form(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", device.device_code.as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            if status.is_success() {
                return parse(&body);
            }

            match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) if err.error == "authorization_pending" => {
                    debug!("device sign-in pending");
                }
                Ok(err) if err.error == "slow_down" => {
                    interval += SLOW_DOWN_STEP;
                    debug!(interval_secs = interval.as_secs(), "slowing down device polling");
                }
                Ok(err) if err.error == "expired_token" => {
                    return Err(AuthError::DeviceCodeExpired);
                }
                _ => return Err(denial_or_endpoint(status, &body)),
            }
        }
    }
}

/// Source of bearer tokens, selected once from `auth.mode`.
pub enum TokenProvider {
    ClientCredential(ClientCredentialFlow),
    DeviceCode(DeviceCodeFlow),
}

impl TokenProvider {
    /// Build the provider for `auth.mode`. Device sign-in instructions go to
    /// stderr.
    pub fn from_config(auth: &AuthConfig, http: Client) -> Result<Self, AuthError> {
        let prompt: DevicePrompt = Arc::new(|message: &str| eprintln!("{message}"));
        Self::with_prompt(auth, http, prompt)
    }

    pub fn with_prompt(
        auth: &AuthConfig,
        http: Client,
        prompt: DevicePrompt,
    ) -> Result<Self, AuthError> {
        let endpoints = Endpoints::new(&auth.authority());
        match auth.mode {
            AuthMode::App => {
                let client_secret = auth
                    .client_secret
                    .clone()
                    .filter(|s| !s.is_empty())
                    .ok_or(AuthError::MissingClientSecret)?;
                Ok(Self::ClientCredential(ClientCredentialFlow {
                    http,
                    endpoints,
                    client_id: auth.client_id.clone(),
                    client_secret,
                    scope: auth.app_scope.clone(),
                    cache: Mutex::new(None),
                }))
            }
            AuthMode::Delegated => Ok(Self::DeviceCode(DeviceCodeFlow {
                http,
                endpoints,
                client_id: auth.client_id.clone(),
                scopes: auth.delegated_scopes.join(" "),
                prompt,
                cache: Mutex::new(None),
            })),
        }
    }

    /// A bearer token, from cache when still fresh.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        match self {
            Self::ClientCredential(flow) => flow.access_token().await,
            Self::DeviceCode(flow) => flow.access_token().await,
        }
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Self::ClientCredential(_) => AuthMode::App,
            Self::DeviceCode(_) => AuthMode::Delegated,
        }
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, AuthError> {
    serde_json::from_str(body).map_err(|e| AuthError::InvalidResponse(e.to_string()))
}

fn denial_or_endpoint(status: reqwest::StatusCode, body: &str) -> AuthError {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) => AuthError::Denied {
            description: err.error_description.unwrap_or_default(),
            code: err.error,
        },
        Err(_) => AuthError::endpoint(status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(mode: AuthMode) -> AuthConfig {
        AuthConfig {
            mode,
            tenant_id: "contoso".to_string(),
            client_id: "client".to_string(),
            client_secret: Some("secret".to_string()),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_endpoints_from_authority() {
        let endpoints = Endpoints::new("https://login.microsoftonline.com/contoso/");
        assert_eq!(
            endpoints.token,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(
            endpoints.device_code,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/devicecode"
        );
    }

    #[test]
    fn test_mode_selects_flow() {
        let app = TokenProvider::from_config(&auth(AuthMode::App), Client::new()).unwrap();
        assert_eq!(app.mode(), AuthMode::App);
        let delegated =
            TokenProvider::from_config(&auth(AuthMode::Delegated), Client::new()).unwrap();
        assert_eq!(delegated.mode(), AuthMode::Delegated);
    }

    #[test]
    fn test_app_mode_without_secret() {
        let mut config = auth(AuthMode::App);
        config.client_secret = None;
        assert!(matches!(
            TokenProvider::from_config(&config, Client::new()),
            Err(AuthError::MissingClientSecret)
        ));
    }

    #[test]
    fn test_cached_token_refreshes_inside_margin() {
        let long = CachedToken::new(TokenResponse {
            access_token: "a".to_string(),
            expires_in: 3600,
        });
        assert_eq!(long.fresh(), Some("a"));
        let short = CachedToken::new(TokenResponse {
            access_token: "b".to_string(),
            expires_in: 30,
        });
        assert_eq!(short.fresh(), None);
    }

    #[test]
    fn test_denial_parsing() {
        let err = denial_or_endpoint(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_client","error_description":"bad secret"}"#,
        );
        assert!(matches!(err, AuthError::Denied { code, .. } if code == "invalid_client"));
        let err = denial_or_endpoint(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(err, AuthError::Endpoint { .. }));
    }
}
