//! The calls an agent makes to the collector.

use std::time::Duration;

use glance_protocol::{
    CreateChallengeRequest, CreateChallengeResponse, ErrorCode,
    HeartbeatRequest, HeartbeatResponse, ReportWindowRequest,
    ReportWindowResponse, RpcError, UpdatePayload, VerifyChallengeRequest,
    VerifyChallengeResponse, routes,
};
use reqwest::Client;
use reqwest::header::COOKIE;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ClientError;

// ---------------------------------------------------------------------------
// ServerApi
// ---------------------------------------------------------------------------

/// The collector's API as the agent sees it.
///
/// [`ConnectionManager`](crate::ConnectionManager) is generic over this so
/// its fallback and retry rules can be tested without a network.
///
/// Any rejection the collector sends comes back as
/// [`ClientError::Rejected`]; [`ClientError::is_auth_failure`] tells the
/// caller whether a new handshake could help.
pub trait ServerApi: Send + Sync {
    /// Asks for a challenge nonce for `client_id`.
    fn create_challenge(
        &self,
        client_id: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Submits the signed nonce and receives a session.
    fn verify_challenge(
        &self,
        client_id: &str,
        signature: &str,
    ) -> impl Future<Output = Result<VerifyChallengeResponse, ClientError>> + Send;

    /// Reports the focused window under a v1 session.
    fn report_window(
        &self,
        token: &str,
        title: &str,
        os: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Sends a heartbeat under a v1 session. Returns the counter the
    /// collector accepted.
    fn heartbeat(
        &self,
        token: &str,
        count: u64,
    ) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Reports the focused window with the static shared token (v0).
    fn legacy_update(
        &self,
        token: &str,
        title: &str,
        os: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpApi
// ---------------------------------------------------------------------------

/// [`ServerApi`] over HTTP: typed RPC for the handshake and v1 reports,
/// the plain update endpoint for v0.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    client: Client,
}

impl HttpApi {
    /// Creates a client for the collector at `base_url`. Every request
    /// gives up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Posts a JSON RPC request, optionally with a bearer token, and
    /// decodes the JSON response.
    async fn call<Req, Resp>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Req,
    ) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = check_status(request.send().await?).await?;
        Ok(response.json().await?)
    }
}

/// Passes a successful response through; turns anything else into
/// [`ClientError::Rejected`], using the `{code, message}` body when there
/// is one and the HTTP status otherwise.
async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let error = serde_json::from_str::<RpcError>(&text).unwrap_or_else(|_| {
        let message = if text.trim().is_empty() {
            status.to_string()
        } else {
            text.trim().to_string()
        };
        RpcError::new(ErrorCode::from_http_status(status.as_u16()), message)
    });
    Err(ClientError::Rejected(error))
}

impl ServerApi for HttpApi {
    async fn create_challenge(
        &self,
        client_id: &str,
    ) -> Result<String, ClientError> {
        let response: CreateChallengeResponse = self
            .call(
                routes::RPC_CREATE_CHALLENGE,
                None,
                &CreateChallengeRequest {
                    client_id: client_id.to_string(),
                },
            )
            .await?;
        Ok(response.challenge)
    }

    async fn verify_challenge(
        &self,
        client_id: &str,
        signature: &str,
    ) -> Result<VerifyChallengeResponse, ClientError> {
        self.call(
            routes::RPC_VERIFY_CHALLENGE,
            None,
            &VerifyChallengeRequest {
                client_id: client_id.to_string(),
                signature: signature.to_string(),
            },
        )
        .await
    }

    async fn report_window(
        &self,
        token: &str,
        title: &str,
        os: &str,
    ) -> Result<(), ClientError> {
        let _: ReportWindowResponse = self
            .call(
                routes::RPC_REPORT_WINDOW,
                Some(token),
                &ReportWindowRequest {
                    title: title.to_string(),
                    os: os.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn heartbeat(&self, token: &str, count: u64) -> Result<u64, ClientError> {
        let response: HeartbeatResponse = self
            .call(routes::RPC_HEARTBEAT, Some(token), &HeartbeatRequest { count })
            .await?;
        Ok(response.count)
    }

    async fn legacy_update(
        &self,
        token: &str,
        title: &str,
        os: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(routes::LEGACY_UPDATE))
            .header(COOKIE, format!("token={token}"))
            .json(&UpdatePayload {
                title: title.to_string(),
                os: os.to_string(),
            })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
