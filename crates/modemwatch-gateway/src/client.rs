//! Huawei LTE web management API client.
//!
//! Every response may rotate the request verification tokens; every POST
//! must present the current head token. The session id is a cookie.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::Url;
use tracing::debug;

use crate::auth::{PasswordType, encode_password};
use crate::error::{GatewayError, GatewayResult};
use crate::xml;

/// Per-request timeout for management API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const TOKEN_HEADER: &str = "__RequestVerificationToken";
const TOKEN_HEADER_ONE: &str = "__RequestVerificationTokenone";
const TOKEN_HEADER_TWO: &str = "__RequestVerificationTokentwo";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Identity fields reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInformation {
    pub device_name: Option<String>,
    pub serial_number: Option<String>,
    pub hardware_version: Option<String>,
    pub software_version: Option<String>,
}

/// Raw management operations, one HTTP exchange each (login is two).
///
/// Retry and re-authentication policy lives in `GatewaySession`.
#[async_trait]
pub trait GatewayApi: Send {
    /// Establish a session and obtain verification tokens.
    async fn open(&mut self) -> GatewayResult<()>;
    async fn login(&mut self, username: &str, password: &str) -> GatewayResult<()>;
    /// Used as the liveness probe.
    async fn device_information(&mut self) -> GatewayResult<DeviceInformation>;
    /// `Ok` only when the gateway answers `OK`.
    async fn reboot(&mut self) -> GatewayResult<()>;
}

#[derive(Debug)]
pub struct HuaweiClient {
    base_url: Url,
    http: reqwest::Client,
    jar: Arc<Jar>,
    tokens: Vec<String>,
}

impl HuaweiClient {
    pub fn new(url: &str) -> GatewayResult<Self> {
        let mut base_url =
            Url::parse(url.trim()).map_err(|e| GatewayError::InvalidUrl(format!("{url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidUrl(format!(
                "{url}: scheme must be http or https"
            )));
        }
        // Relative joins must keep any path prefix.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url,
            http,
            jar,
            tokens: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidUrl(format!("{path}: {e}")))
    }

    async fn get(&mut self, path: &str) -> GatewayResult<String> {
        let url = self.endpoint(path)?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(GatewayError::transport)?;
        self.finish(path, resp).await
    }

    async fn post(&mut self, path: &str, fields: &[(&str, &str)]) -> GatewayResult<String> {
        let url = self.endpoint(path)?;
        let mut req = self
            .http
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(xml::request_body(fields));
        if let Some(token) = self.next_token() {
            req = req.header(TOKEN_HEADER, token);
        }
        let resp = req.send().await.map_err(GatewayError::transport)?;
        self.finish(path, resp).await
    }

    /// Absorb rotated tokens, read the body, and surface error envelopes.
    async fn finish(&mut self, path: &str, resp: reqwest::Response) -> GatewayResult<String> {
        self.absorb_tokens(resp.headers());
        let status = resp.status();
        let body = resp.text().await.map_err(GatewayError::transport)?;

        if let Some((code, message)) = xml::error_envelope(&body) {
            debug!(%path, code, "gateway returned error envelope");
            return Err(GatewayError::from_code(code, message));
        }
        if !status.is_success() {
            return Err(GatewayError::UnexpectedResponse(format!(
                "{path}: http status {status}"
            )));
        }
        Ok(body)
    }

    fn absorb_tokens(&mut self, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let mut fresh = Vec::new();
        if let Some(one) = header(TOKEN_HEADER_ONE) {
            fresh.push(one);
            fresh.extend(header(TOKEN_HEADER_TWO));
        } else if let Some(list) = header(TOKEN_HEADER) {
            fresh.extend(
                list.split('#')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
            );
        }

        if !fresh.is_empty() {
            self.tokens = fresh;
        }
    }

    /// Head token for the next POST; a spare token is consumed.
    fn next_token(&mut self) -> Option<String> {
        if self.tokens.len() > 1 {
            Some(self.tokens.remove(0))
        } else {
            self.tokens.first().cloned()
        }
    }

    /// Current verification tokens, head first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

#[async_trait]
impl GatewayApi for HuaweiClient {
    async fn open(&mut self) -> GatewayResult<()> {
        match self.get("api/webserver/SesTokInfo").await {
            Ok(body) => {
                if let Some(session) = xml::tag_text(&body, "SesInfo").filter(|s| !s.is_empty()) {
                    self.jar.add_cookie_str(&session, &self.base_url);
                }
                if let Some(token) = xml::tag_text(&body, "TokInfo").filter(|t| !t.is_empty()) {
                    self.tokens = vec![token];
                    debug!(url = %self.base_url, "session token obtained");
                    return Ok(());
                }
            }
            Err(e @ GatewayError::Connection(_)) => return Err(e),
            Err(e) => debug!(error = %e, "SesTokInfo unavailable, falling back to home page"),
        }

        let html = self.get("html/home.html").await?;
        let tokens = xml::csrf_tokens_from_html(&html);
        if tokens.is_empty() {
            debug!(url = %self.base_url, "gateway issued no verification tokens");
        } else {
            self.tokens = tokens;
        }
        Ok(())
    }

    async fn login(&mut self, username: &str, password: &str) -> GatewayResult<()> {
        let state = self.get("api/user/state-login").await?;
        if xml::tag_text(&state, "State").as_deref() == Some("0") {
            debug!("gateway session already logged in");
            return Ok(());
        }

        let kind = xml::tag_text(&state, "password_type")
            .map(|code| PasswordType::from_code(&code))
            .unwrap_or(PasswordType::Sha256);
        let token = self.tokens.first().cloned().unwrap_or_default();
        let encoded = encode_password(username, password, &token, kind);

        let fields = [
            ("Username", username),
            ("Password", encoded.as_str()),
            ("password_type", kind.code()),
        ];
        match self.post("api/user/login", &fields).await {
            Ok(body) if xml::is_ok_response(&body) => Ok(()),
            Ok(body) => Err(GatewayError::Auth(format!(
                "unexpected login response: {}",
                body.trim()
            ))),
            // Already logged in.
            Err(GatewayError::Api { code: 108003, .. }) => Ok(()),
            Err(GatewayError::LoginRequired) => Err(GatewayError::Auth(
                "session rejected during login".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    async fn device_information(&mut self) -> GatewayResult<DeviceInformation> {
        let body = self.get("api/device/information").await?;
        Ok(DeviceInformation {
            device_name: xml::tag_text(&body, "DeviceName"),
            serial_number: xml::tag_text(&body, "SerialNumber"),
            hardware_version: xml::tag_text(&body, "HardwareVersion"),
            software_version: xml::tag_text(&body, "SoftwareVersion"),
        })
    }

    async fn reboot(&mut self) -> GatewayResult<()> {
        let body = self.post("api/device/control", &[("Control", "1")]).await?;
        if xml::is_ok_response(&body) {
            Ok(())
        } else {
            Err(GatewayError::UnexpectedResponse(body.trim().to_string()))
        }
    }
}
