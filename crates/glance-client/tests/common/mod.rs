//! A scripted in-memory collector for exercising the agent without a
//! network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use glance_auth::ClientSigner;
use glance_client::{ClientConfig, ClientError, ServerApi, TitleSource};
use glance_protocol::{ErrorCode, RpcError, VerifyChallengeResponse};

/// How the mock answers one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Unauthenticated,
    Down,
}

impl Reply {
    fn into_result(self) -> Result<(), ClientError> {
        match self {
            Reply::Ok => Ok(()),
            Reply::Unauthenticated => Err(ClientError::Rejected(RpcError::new(
                ErrorCode::Unauthenticated,
                "invalid or expired token",
            ))),
            Reply::Down => Err(ClientError::Rejected(RpcError::new(
                ErrorCode::Internal,
                "service unavailable",
            ))),
        }
    }
}

#[derive(Debug, Default)]
pub struct MockState {
    /// Every call, in order, e.g. `"report token-1 Firefox"`.
    pub calls: Vec<String>,
    /// Scripted replies; an empty script answers `Ok`.
    pub handshake: VecDeque<Reply>,
    pub reports: VecDeque<Reply>,
    pub heartbeats: VecDeque<Reply>,
    pub legacy: VecDeque<Reply>,
    sessions_issued: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MockApi(pub Arc<Mutex<MockState>>);

impl MockApi {
    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn script(&self, f: impl FnOnce(&mut MockState)) {
        f(&mut self.0.lock().unwrap());
    }

    fn record(&self, call: String) {
        self.0.lock().unwrap().calls.push(call);
    }

    fn next(&self, pick: impl FnOnce(&mut MockState) -> &mut VecDeque<Reply>) -> Reply {
        pick(&mut self.0.lock().unwrap()).pop_front().unwrap_or(Reply::Ok)
    }
}

impl ServerApi for MockApi {
    async fn create_challenge(&self, client_id: &str) -> Result<String, ClientError> {
        self.record(format!("challenge {client_id}"));
        self.next(|s| &mut s.handshake).into_result()?;
        Ok("nonce".to_string())
    }

    async fn verify_challenge(
        &self,
        client_id: &str,
        signature: &str,
    ) -> Result<VerifyChallengeResponse, ClientError> {
        assert!(!signature.is_empty());
        self.record(format!("verify {client_id}"));
        let mut state = self.0.lock().unwrap();
        state.sessions_issued += 1;
        Ok(VerifyChallengeResponse {
            token: format!("token-{}", state.sessions_issued),
            expires_in: 86400,
        })
    }

    async fn report_window(&self, token: &str, title: &str, _os: &str) -> Result<(), ClientError> {
        self.record(format!("report {token} {title}"));
        self.next(|s| &mut s.reports).into_result()
    }

    async fn heartbeat(&self, token: &str, count: u64) -> Result<u64, ClientError> {
        self.record(format!("heartbeat {token} {count}"));
        self.next(|s| &mut s.heartbeats).into_result()?;
        Ok(count)
    }

    async fn legacy_update(&self, token: &str, title: &str, _os: &str) -> Result<(), ClientError> {
        self.record(format!("legacy {token} {title}"));
        self.next(|s| &mut s.legacy).into_result()
    }
}

/// A config with a fresh identity, so `connect()` attempts v1.
pub fn v1_config() -> ClientConfig {
    ClientConfig {
        client_id: "C1".into(),
        private_key: ClientSigner::generate().keypair_base64(),
        legacy_token: "static".into(),
        os: "linux".into(),
        ..ClientConfig::default()
    }
}

/// A config without an identity, so `connect()` goes straight to v0.
pub fn legacy_config() -> ClientConfig {
    ClientConfig {
        legacy_token: "static".into(),
        os: "linux".into(),
        ..ClientConfig::default()
    }
}

/// Plays back a fixed list of titles, repeating the last one.
pub struct ScriptedTitles(pub VecDeque<Result<String, String>>);

impl ScriptedTitles {
    pub fn new(titles: &[&str]) -> Self {
        Self(titles.iter().map(|t| Ok(t.to_string())).collect())
    }
}

impl TitleSource for ScriptedTitles {
    async fn focused_title(&mut self) -> Result<String, ClientError> {
        let next = if self.0.len() > 1 {
            self.0.pop_front()
        } else {
            self.0.front().cloned()
        };
        match next {
            Some(Ok(title)) => Ok(title),
            Some(Err(e)) => Err(ClientError::TitleUnavailable(e)),
            None => Err(ClientError::TitleUnavailable("no window".into())),
        }
    }
}
