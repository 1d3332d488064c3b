//! OAuth 2.0 PKCE flow for Google APIs.
//!
//! Authorization Code flow with PKCE (RFC 7636) and a loopback redirect, the
//! flow Google supports for installed applications:
//!
//! 1. Bind a callback listener on `127.0.0.1` within a port range
//! 2. Open the consent page with the S256 challenge and a random state
//! 3. Read the `code`/`state` pair from the redirect
//! 4. Exchange the code and verifier for access and refresh tokens
//!
//! The same token endpoint also serves refresh-token grants.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::error::{PhotosError, PhotosResult};

use super::config::OAuthCredentials;
use super::tokens::TokenInfo;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Bytes of entropy in the code verifier (43 chars once encoded).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Bytes of entropy in the CSRF state.
const STATE_LENGTH: usize = 16;

/// How long to wait for the user to finish the consent screen.
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_OK: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h1>Authorization Successful</h1>\
    <p>You can close this window and reload the burst page.</p></body></html>";

const CALLBACK_FAILED: &str = "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h1>Authorization Failed</h1>\
    <p>You can close this window.</p></body></html>";

/// OAuth client for Google APIs.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
    token_url: String,
}

impl OAuthClient {
    /// Creates a new OAuth client with the given credentials.
    pub fn new(
        credentials: OAuthCredentials,
        timeout: Duration,
        user_agent: &str,
    ) -> PhotosResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| PhotosError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            credentials,
            http_client,
            token_url: GOOGLE_TOKEN_URL.to_string(),
        })
    }

    /// Overrides the token endpoint.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Runs the interactive consent flow and returns fresh tokens.
    ///
    /// Opens the system browser on the machine running the server. If that
    /// fails the consent URL is logged so it can be opened by hand.
    ///
    /// # Errors
    ///
    /// Fails when no port in `port_range` can be bound, the user denies
    /// access, the callback times out, the state does not match, or the
    /// code exchange is rejected.
    pub async fn authorize(
        &self,
        scopes: &[String],
        port_range: (u16, u16),
    ) -> PhotosResult<TokenInfo> {
        let pkce = PkceFlow::new();

        let (listener, port) = Self::bind_loopback_server(port_range).await?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
        let auth_url = pkce.build_auth_url(&self.credentials.client_id, &redirect_uri, scopes);

        info!("starting OAuth flow, opening browser");
        debug!("authorization URL: {}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            warn!("open this URL in a browser to authorize access: {}", auth_url);
        }

        let params = Self::wait_for_callback(listener, CALLBACK_TIMEOUT).await?;

        if params.state != pkce.state {
            return Err(PhotosError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        info!("received authorization code, exchanging for tokens");
        let response = self
            .post_token_form(&[
                ("code", params.code.as_str()),
                ("code_verifier", pkce.verifier.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .await?;

        info!("obtained tokens");
        Ok(TokenInfo::new(
            response.access_token,
            response.refresh_token,
            response.expires_in,
            scopes.to_vec(),
        ))
    }

    /// Trades a refresh token for a new access token.
    ///
    /// Returns the access token and its lifetime in seconds, if given.
    pub async fn refresh_token(&self, refresh_token: &str) -> PhotosResult<(String, Option<i64>)> {
        let response = self
            .post_token_form(&[
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        info!("refreshed access token");
        Ok((response.access_token, response.expires_in))
    }

    /// POSTs a grant to the token endpoint with the client credentials added.
    async fn post_token_form(&self, grant: &[(&str, &str)]) -> PhotosResult<TokenResponse> {
        let mut form = vec![
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        form.extend_from_slice(grant);

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| PhotosError::network(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PhotosError::network(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(PhotosError::authentication(format!(
                "token endpoint rejected the grant ({}): {}",
                status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| PhotosError::invalid_response(format!("invalid token response: {}", e)))
    }

    /// Binds the first free port in `port_range` on the loopback interface.
    async fn bind_loopback_server(port_range: (u16, u16)) -> PhotosResult<(TcpListener, u16)> {
        for port in port_range.0..=port_range.1 {
            let Ok(listener) = TcpListener::bind(("127.0.0.1", port)).await else {
                continue;
            };
            // Port 0 asks the OS for any free port
            let port = listener.local_addr().map_or(port, |addr| addr.port());
            debug!("bound loopback server on port {}", port);
            return Ok((listener, port));
        }

        Err(PhotosError::configuration(format!(
            "no available port in range {}-{}",
            port_range.0, port_range.1
        )))
    }

    /// Accepts connections until one carries the OAuth redirect.
    ///
    /// The listener is dropped when this returns, timeout included, so the
    /// port is free for the next flow.
    async fn wait_for_callback(
        listener: TcpListener,
        timeout: Duration,
    ) -> PhotosResult<CallbackParams> {
        let accept = async {
            loop {
                match listener.accept().await {
                    Ok((stream, _)) => {
                        if let Some(result) = Self::handle_callback(stream).await {
                            return result;
                        }
                    }
                    Err(e) => error!("failed to accept connection: {}", e),
                }
            }
        };

        tokio::time::timeout(timeout, accept)
            .await
            .unwrap_or_else(|_| Err(PhotosError::authentication("OAuth callback timeout")))
    }

    /// Handles one connection on the callback listener.
    ///
    /// Returns `None` for requests that are not the redirect (favicon, etc.).
    async fn handle_callback(stream: TcpStream) -> Option<PhotosResult<CallbackParams>> {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).await.ok()?;

        let result = CallbackParams::from_request_line(&request_line)?;

        let page = if result.is_ok() {
            CALLBACK_OK
        } else {
            CALLBACK_FAILED
        };
        let mut stream = reader.into_inner();
        let _ = stream.write_all(page.as_bytes()).await;
        let _ = stream.flush().await;

        Some(result)
    }
}

/// The authorization code and state carried by the redirect.
#[derive(Debug, PartialEq, Eq)]
struct CallbackParams {
    code: String,
    state: String,
}

impl CallbackParams {
    /// Parses `GET /callback?code=...&state=... HTTP/1.1`.
    ///
    /// `None` means the request is not a callback at all.
    fn from_request_line(line: &str) -> Option<PhotosResult<Self>> {
        let mut parts = line.split_whitespace();
        if parts.next() != Some("GET") {
            return None;
        }
        let target = parts.next()?;
        if !target.starts_with("/callback") {
            return None;
        }

        let url = url::Url::parse(&format!("http://127.0.0.1{}", target)).ok()?;
        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "error" => {
                    return Some(Err(PhotosError::authentication(format!(
                        "authorization denied: {}",
                        value
                    ))));
                }
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        Some(match code {
            Some(code) => Ok(Self {
                code,
                state: state.unwrap_or_default(),
            }),
            None => Err(PhotosError::authentication(
                "missing authorization code in callback",
            )),
        })
    }
}

/// PKCE verifier, challenge and CSRF state for one flow.
#[derive(Debug)]
pub struct PkceFlow {
    /// High-entropy random string kept secret until the exchange.
    pub verifier: String,
    /// base64url(SHA-256(verifier)).
    pub challenge: String,
    /// Random value echoed back by the redirect.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new flow with a random verifier and state.
    pub fn new() -> Self {
        let verifier = random_urlsafe(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);

        Self {
            verifier,
            challenge,
            state: random_urlsafe(STATE_LENGTH),
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the Google consent URL.
    ///
    /// Asks for offline access with a forced consent prompt so a refresh
    /// token is always returned.
    pub fn build_auth_url(&self, client_id: &str, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_urlsafe(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
