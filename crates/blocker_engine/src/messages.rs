//! JSON message protocol between the feed pipeline and the settings collaborator.

use std::collections::BTreeSet;

use blocker_core::{Identity, MatchReason};
use blocker_logging::{blocker_debug, blocker_info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{SettingsStore, StoreError, StoredSettings};

/// Messages addressed to the settings collaborator, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    /// Settings edited elsewhere; replaces the stored record.
    SettingsUpdated { settings: StoredSettings },
    GetBlockWords,
    GetAutoMode,
    GetStatus,
    /// Fire-and-forget.
    IncrementBlockCount,
    #[serde(rename_all = "camelCase")]
    BlockUser {
        username: String,
        reason: MatchReason,
        matched_keyword: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    #[serde(rename_all = "camelCase")]
    BlockWords { block_words: Vec<String> },
    #[serde(rename_all = "camelCase")]
    AutoMode { auto_mode: bool },
    #[serde(rename_all = "camelCase")]
    Status {
        enabled: bool,
        blocked_count: u64,
        blocked_users: BTreeSet<String>,
    },
    Block(BlockAck),
    Ack {},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl BlockAck {
    pub const ALREADY_BLOCKED: &'static str = "alreadyBlocked";
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unexpected reply to {request}: {response:?}")]
    UnexpectedResponse {
        request: &'static str,
        response: Response,
    },
}

/// Request/response link to the settings collaborator.
pub trait SettingsChannel {
    fn request(&mut self, request: Request) -> Result<Response, ChannelError>;
}

/// Answers protocol messages against a [`SettingsStore`].
#[derive(Debug, Clone, Default)]
pub struct Background<S> {
    store: S,
}

impl<S: SettingsStore> Background<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn handle(&mut self, request: Request) -> Result<Response, StoreError> {
        match request {
            Request::SettingsUpdated { settings } => {
                self.store.save(&settings)?;
                Ok(Response::Ack {})
            }
            Request::GetBlockWords => Ok(Response::BlockWords {
                block_words: self.store.load()?.block_words,
            }),
            Request::GetAutoMode => Ok(Response::AutoMode {
                auto_mode: self.store.load()?.auto_mode,
            }),
            Request::GetStatus => {
                let stored = self.store.load()?;
                Ok(Response::Status {
                    enabled: stored.enabled,
                    blocked_count: stored.blocked_count,
                    blocked_users: stored.blocked_users,
                })
            }
            Request::IncrementBlockCount => {
                let mut stored = self.store.load()?;
                stored.blocked_count += 1;
                self.store.save(&stored)?;
                blocker_debug!("Blocked count is now {}", stored.blocked_count);
                Ok(Response::Ack {})
            }
            Request::BlockUser {
                username,
                reason,
                matched_keyword,
            } => {
                let key = Identity::new(&username)
                    .map(|identity| identity.as_str().to_string())
                    .unwrap_or(username);
                let mut stored = self.store.load()?;
                if stored.blocked_users.contains(&key) {
                    return Ok(Response::Block(BlockAck {
                        success: false,
                        reason: Some(BlockAck::ALREADY_BLOCKED),
                    }));
                }
                blocker_info!(
                    "Recorded block of {} ({} matched {:?})",
                    key,
                    reason.as_str(),
                    matched_keyword
                );
                stored.blocked_users.insert(key);
                self.store.save(&stored)?;
                Ok(Response::Block(BlockAck {
                    success: true,
                    reason: None,
                }))
            }
        }
    }

    /// Wire-level entry point: one JSON request in, one JSON response out.
    pub fn handle_json(&mut self, raw: &str) -> Result<String, ChannelError> {
        let request: Request = serde_json::from_str(raw)?;
        let response = self.handle(request)?;
        Ok(serde_json::to_string(&response)?)
    }
}

impl<S: SettingsStore> SettingsChannel for Background<S> {
    fn request(&mut self, request: Request) -> Result<Response, ChannelError> {
        Ok(self.handle(request)?)
    }
}
