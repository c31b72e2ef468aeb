//! Authenticated HTTP channel to one Gazelle tracker.

use std::time::Duration;

use async_trait::async_trait;
use curry_core::{
    Credential, IndexInfo, MigrationError, MigrationResult, SourceReleaseRecord,
    TorrentDownloader, TrackerEndpoint, UploadPayload,
};
use reqwest::header::{AUTHORIZATION, COOKIE, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error_page::first_error_message;
use crate::form::upload_form;
use crate::wire::{Envelope, TorrentResponse};

const AJAX_PATH: &str = "ajax.php";
const UPLOAD_PATH: &str = "upload.php";
const DOWNLOAD_PATH: &str = "torrents.php";
const LOGIN_MARKER: &str = "login.php";
const TORRENTS_MARKER: &str = "torrents";
const GENERIC_UPLOAD_FAILURE: &str = "unidentified upload error, try uploading manually";

/// One tracker's HTTP session. Never shared across endpoints.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    http: Client,
    endpoint: TrackerEndpoint,
    base_url: Url,
}

impl TrackerClient {
    /// Build a client for `endpoint`.
    ///
    /// Redirects are not followed so login bounces and upload redirects stay
    /// observable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unparsable base URL and `Protocol` when the
    /// HTTP client cannot be built.
    pub fn new(endpoint: TrackerEndpoint, timeout: Duration) -> MigrationResult<Self> {
        let base_url = Url::parse(&format!("{}/", endpoint.base_url.trim_end_matches('/')))
            .map_err(|err| {
                MigrationError::invalid_input(format!("invalid tracker URL '{}'", endpoint.base_url))
                    .with_tracker(endpoint.acronym.clone())
                    .with_source(err)
            })?;
        let http = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| {
                MigrationError::protocol("failed to build HTTP client")
                    .with_tracker(endpoint.acronym.clone())
                    .with_source(err)
            })?;
        Ok(Self {
            http,
            endpoint,
            base_url,
        })
    }

    /// Endpoint this client talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &TrackerEndpoint {
        &self.endpoint
    }

    /// `GET ajax.php?action=<action>&<params>` and return the `response` body.
    ///
    /// # Errors
    ///
    /// `Auth` without a credential or on a login redirect; `Protocol` for any
    /// other non-success status, an unreadable body, or a `failure` envelope.
    pub async fn fetch(&self, action: &str, params: &[(&str, String)]) -> MigrationResult<Value> {
        self.ensure_authenticated()?;
        debug!(tracker = %self.endpoint.acronym, action, "tracker fetch");
        let request = self
            .http
            .get(self.url(AJAX_PATH)?)
            .query(&[("action", action)])
            .query(params);
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_redirection() {
            if redirects_to_login(&response) {
                return Err(self.login_redirect());
            }
            return Err(self.error(MigrationError::protocol(format!(
                "unexpected redirect ({status}) for action '{action}'"
            ))));
        }
        if !status.is_success() {
            return Err(self.error(MigrationError::protocol(format!(
                "action '{action}' failed with status {status}"
            ))));
        }
        let envelope = self.envelope(response).await?;
        if !envelope.is_success() {
            let reason = envelope.error.unwrap_or_else(|| "failure".to_string());
            return Err(self.error(MigrationError::protocol(format!(
                "action '{action}' failed: {reason}"
            ))));
        }
        Ok(envelope.response.unwrap_or(Value::Null))
    }

    /// Keys of the authenticated user.
    ///
    /// # Errors
    ///
    /// As [`Self::fetch`], plus `Protocol` when the body lacks the keys.
    pub async fn fetch_index(&self) -> MigrationResult<IndexInfo> {
        let body = self.fetch("index", &[]).await?;
        serde_json::from_value(body).map_err(|err| {
            self.error(MigrationError::protocol("index response is missing user keys").with_source(err))
        })
    }

    /// Release metadata by torrent id.
    ///
    /// # Errors
    ///
    /// As [`Self::fetch`], plus `Protocol` when the body does not describe a torrent.
    pub async fn fetch_torrent_by_id(&self, torrent_id: u64) -> MigrationResult<SourceReleaseRecord> {
        let body = self.fetch("torrent", &[("id", torrent_id.to_string())]).await?;
        self.record(body)
    }

    /// Release metadata by upper-case info-hash.
    ///
    /// # Errors
    ///
    /// As [`Self::fetch_torrent_by_id`].
    pub async fn fetch_torrent_by_hash(&self, info_hash: &str) -> MigrationResult<SourceReleaseRecord> {
        let body = self
            .fetch("torrent", &[("hash", info_hash.to_ascii_uppercase())])
            .await?;
        self.record(body)
    }

    /// `POST ajax.php?action=<action>` for key-authenticated trackers.
    ///
    /// # Errors
    ///
    /// `Auth` on a login redirect; `Upload` with the server message on a
    /// `failure` envelope or HTTP 500; `Protocol` otherwise.
    pub async fn post_api(
        &self,
        action: &str,
        form: reqwest::multipart::Form,
    ) -> MigrationResult<Value> {
        self.ensure_authenticated()?;
        let request = self
            .http
            .post(self.url(AJAX_PATH)?)
            .query(&[("action", action)])
            .multipart(form);
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_redirection() && redirects_to_login(&response) {
            return Err(self.login_redirect());
        }
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let text = self.body_text(response).await?;
            let message = serde_json::from_str::<Envelope>(&text)
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or_else(|| {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        status.to_string()
                    } else {
                        trimmed.to_string()
                    }
                });
            return Err(self.error(MigrationError::upload(message)));
        }
        if !status.is_success() {
            return Err(self.error(MigrationError::protocol(format!(
                "API action '{action}' failed with status {status}"
            ))));
        }
        let envelope = self.envelope(response).await?;
        if !envelope.is_success() {
            let message = envelope
                .error
                .unwrap_or_else(|| GENERIC_UPLOAD_FAILURE.to_string());
            return Err(self.error(MigrationError::upload(message)));
        }
        Ok(envelope.response.unwrap_or(Value::Null))
    }

    /// Session upload through `upload.php`; returns the new torrent's URL.
    ///
    /// # Errors
    ///
    /// `Auth` on a login redirect; `Upload` when the form comes back with an
    /// error (the red paragraph's text when present); `Protocol` for any other
    /// status.
    pub async fn upload_form(&self, payload: UploadPayload) -> MigrationResult<String> {
        self.ensure_authenticated()?;
        let request = self
            .http
            .post(self.url(UPLOAD_PATH)?)
            .multipart(upload_form(payload)?);
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_redirection() {
            let location = location(&response).unwrap_or_default();
            if location.contains(TORRENTS_MARKER) {
                return Ok(self.absolute(&location));
            }
            if location.contains(LOGIN_MARKER) {
                return Err(self.login_redirect());
            }
        }
        if status == StatusCode::OK {
            let body = self.body_text(response).await?;
            let message = first_error_message(&body).unwrap_or_else(|| {
                warn!(tracker = %self.endpoint.acronym, "upload rejected without an error message");
                GENERIC_UPLOAD_FAILURE.to_string()
            });
            return Err(self.error(MigrationError::upload(message)));
        }
        Err(self.error(MigrationError::protocol(format!(
            "upload failed with status {status}"
        ))))
    }

    /// Upload over whichever transport the credential selects.
    ///
    /// # Errors
    ///
    /// As [`Self::upload_form`] or [`Self::post_api`]; an API success without
    /// a torrent id is `Protocol`.
    pub async fn upload(&self, payload: UploadPayload) -> MigrationResult<String> {
        let location = match self.endpoint.credential {
            Credential::SessionCookie(_) => self.upload_form(payload).await?,
            Credential::ApiKey(_) => {
                let body = self.post_api("upload", upload_form(payload)?).await?;
                let torrent_id = ["torrentid", "torrentId"]
                    .iter()
                    .find_map(|key| body.get(key).and_then(id_value))
                    .ok_or_else(|| {
                        self.error(MigrationError::protocol(
                            "upload response did not include a torrent id",
                        ))
                    })?;
                self.endpoint.torrent_page(torrent_id)
            }
        };
        info!(tracker = %self.endpoint.acronym, %location, "upload accepted");
        Ok(location)
    }

    fn ensure_authenticated(&self) -> MigrationResult<()> {
        if self.endpoint.credential.is_present() {
            Ok(())
        } else {
            Err(self.error(MigrationError::auth("no credential configured")))
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.endpoint.credential {
            Credential::SessionCookie(cookie) => request.header(COOKIE, cookie.trim()),
            Credential::ApiKey(key) => request.header(AUTHORIZATION, key.trim()),
        }
    }

    async fn send(&self, request: RequestBuilder) -> MigrationResult<Response> {
        self.authorize(request).send().await.map_err(|err| {
            let message = if err.is_timeout() {
                "request timed out"
            } else {
                "request failed"
            };
            self.error(MigrationError::protocol(message).with_source(err))
        })
    }

    async fn body_text(&self, response: Response) -> MigrationResult<String> {
        response.text().await.map_err(|err| {
            self.error(MigrationError::protocol("failed to read response body").with_source(err))
        })
    }

    async fn envelope(&self, response: Response) -> MigrationResult<Envelope> {
        let bytes = response.bytes().await.map_err(|err| {
            self.error(MigrationError::protocol("failed to read response body").with_source(err))
        })?;
        serde_json::from_slice(&bytes).map_err(|err| {
            self.error(MigrationError::protocol("response is not a tracker envelope").with_source(err))
        })
    }

    fn record(&self, body: Value) -> MigrationResult<SourceReleaseRecord> {
        serde_json::from_value::<TorrentResponse>(body)
            .map(TorrentResponse::into_record)
            .map_err(|err| {
                self.error(MigrationError::protocol("torrent response is malformed").with_source(err))
            })
    }

    fn url(&self, path: &str) -> MigrationResult<Url> {
        self.base_url.join(path).map_err(|err| {
            self.error(MigrationError::invalid_input(format!("invalid path '{path}'")).with_source(err))
        })
    }

    fn absolute(&self, location: &str) -> String {
        self.base_url
            .join(location)
            .map_or_else(|_| location.to_string(), String::from)
    }

    fn login_redirect(&self) -> MigrationError {
        self.error(MigrationError::auth("session redirected to the login page"))
    }

    fn error(&self, err: MigrationError) -> MigrationError {
        err.with_tracker(self.endpoint.acronym.clone())
    }
}

#[async_trait]
impl TorrentDownloader for TrackerClient {
    async fn download_torrent(
        &self,
        torrent_id: u64,
        authkey: &str,
        passkey: &str,
    ) -> MigrationResult<Vec<u8>> {
        self.ensure_authenticated()?;
        let request = self.http.get(self.url(DOWNLOAD_PATH)?).query(&[
            ("action", "download".to_string()),
            ("id", torrent_id.to_string()),
            ("authkey", authkey.to_string()),
            ("torrent_pass", passkey.to_string()),
        ]);
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_redirection() && redirects_to_login(&response) {
            return Err(self.login_redirect());
        }
        if !status.is_success() {
            return Err(self.error(MigrationError::protocol(format!(
                "torrent download failed with status {status}"
            ))));
        }
        let bytes = response.bytes().await.map_err(|err| {
            self.error(MigrationError::protocol("failed to read torrent download").with_source(err))
        })?;
        debug!(torrent_id, bytes = bytes.len(), "downloaded source torrent");
        Ok(bytes.to_vec())
    }
}

fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn redirects_to_login(response: &Response) -> bool {
    location(response).is_some_and(|target| target.contains(LOGIN_MARKER))
}

fn id_value(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
}
