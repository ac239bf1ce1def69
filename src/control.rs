//! Target and sensitivity control
//!
//! `ControlClient` runs requests against `/config/target` and
//! `/config/sensitivity` on a background thread; replies come back through a
//! channel. `ChatLog` is the command-log model behind the text input.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver};
use tokio::sync::mpsc as async_mpsc;
use tracing::{debug, error, info, warn};

use crate::config::DashboardConfig;
use crate::core::SensitivityConfig;
use crate::error::ControlError;

pub const WELCOME_TEXT: &str =
    "Welcome! Start detection and type a color blob to detect (e.g., \"red blob\", \"blue blob\", \"green blob\")";
pub const NOT_ACTIVE_TEXT: &str = "Please start detection first";

/// Messages kept in the command log
pub const MAX_CHAT_MESSAGES: usize = 200;

#[derive(Clone, Debug, PartialEq)]
pub enum ControlRequest {
    /// Free-form prompt; the backend picks the first color name it contains
    SetTarget { prompt: String },
    SetSensitivity(SensitivityConfig),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlAck {
    TargetSwitched { color: String, label: Option<String> },
    SensitivityApplied(SensitivityConfig),
}

#[derive(Debug)]
pub struct ControlReply {
    pub request: ControlRequest,
    pub result: Result<ControlAck, ControlError>,
}

#[derive(Serialize)]
struct TargetBody<'a> {
    prompt: &'a str,
}

/// `/config/target` response body
#[derive(Debug, Deserialize)]
struct TargetResponse {
    success: bool,
    #[serde(default)]
    current_target_color: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// `/config/sensitivity` response body
#[derive(Debug, Deserialize)]
struct SensitivityResponse {
    success: bool,
    #[serde(flatten)]
    config: SensitivityConfig,
}

/// Handle to the background control worker
pub struct ControlClient {
    requests: async_mpsc::UnboundedSender<ControlRequest>,
    /// Replies, one per request, in completion order
    pub rx: Receiver<ControlReply>,
}

impl ControlClient {
    pub fn spawn(config: &DashboardConfig) -> Self {
        let (requests, mut request_rx) = async_mpsc::unbounded_channel::<ControlRequest>();
        let (tx, rx) = mpsc::channel();

        let target_url = config.target_url();
        let sensitivity_url = config.sensitivity_url();
        let timeout = config.request_timeout;

        let spawned = std::thread::Builder::new()
            .name("control-client".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(error = %e, "Failed to create tokio runtime");
                        return;
                    }
                };
                rt.block_on(async move {
                    let client = match reqwest::Client::builder().timeout(timeout).build() {
                        Ok(client) => client,
                        Err(e) => {
                            error!(error = %e, "Failed to build HTTP client");
                            return;
                        }
                    };
                    while let Some(request) = request_rx.recv().await {
                        let result = match &request {
                            ControlRequest::SetTarget { prompt } => {
                                set_target(&client, &target_url, prompt).await
                            }
                            ControlRequest::SetSensitivity(cfg) => {
                                set_sensitivity(&client, &sensitivity_url, cfg).await
                            }
                        };
                        if tx.send(ControlReply { request, result }).is_err() {
                            break;
                        }
                    }
                    debug!("Control worker finished");
                });
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn control thread");
        }

        Self { requests, rx }
    }

    /// Queue a request. Returns false if the worker is gone.
    pub fn send(&self, request: ControlRequest) -> bool {
        debug!(?request, "Queueing control request");
        if self.requests.send(request).is_err() {
            warn!("Control worker not running, request dropped");
            return false;
        }
        true
    }
}

/// `POST /config/target`
pub async fn set_target(
    client: &reqwest::Client,
    url: &str,
    prompt: &str,
) -> Result<ControlAck, ControlError> {
    let response = client.post(url).json(&TargetBody { prompt }).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        if let Ok(TargetResponse { error: Some(error), .. }) = parse_target_response(&body) {
            return Err(ControlError::Rejected(error));
        }
        return Err(ControlError::Status(status));
    }

    let resp = parse_target_response(&body)?;
    match resp {
        TargetResponse {
            success: true,
            current_target_color: Some(color),
            label,
            ..
        } => {
            info!(color = %color, "Target switched");
            Ok(ControlAck::TargetSwitched { color, label })
        }
        TargetResponse { error, .. } => {
            let error = error.unwrap_or_else(|| "Unknown error occurred".to_string());
            warn!(prompt, error = %error, "Target change rejected");
            Err(ControlError::Rejected(error))
        }
    }
}

/// `POST /config/sensitivity`
pub async fn set_sensitivity(
    client: &reqwest::Client,
    url: &str,
    config: &SensitivityConfig,
) -> Result<ControlAck, ControlError> {
    let response = client.post(url).json(config).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ControlError::Status(status));
    }
    let body = response.bytes().await?;
    let resp: SensitivityResponse = serde_json::from_slice(&body)?;
    if !resp.success {
        return Err(ControlError::Rejected("Failed to apply settings".to_string()));
    }
    info!(
        min_area = resp.config.min_area,
        min_circularity = resp.config.min_circularity,
        min_solidity = resp.config.min_solidity,
        "Sensitivity applied"
    );
    Ok(ControlAck::SensitivityApplied(resp.config))
}

/// The backend may answer failures as `[body, status_code]`; unwrap that
fn parse_target_response(body: &[u8]) -> Result<TargetResponse, serde_json::Error> {
    let value: Value = serde_json::from_slice(body)?;
    let value = match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };
    serde_json::from_value(value)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Command log shown next to the trail
#[derive(Debug, Clone)]
pub struct ChatLog {
    messages: VecDeque<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    pub fn new() -> Self {
        let mut log = Self {
            messages: VecDeque::new(),
        };
        log.push(ChatRole::System, WELCOME_TEXT);
        log
    }

    /// Handle a submitted line. Returns the request to send, if any.
    pub fn submit(&mut self, input: &str, is_active: bool) -> Option<ControlRequest> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }
        if !is_active {
            self.push(ChatRole::System, format!("⚠ {NOT_ACTIVE_TEXT}"));
            return None;
        }
        self.push(ChatRole::User, prompt);
        Some(ControlRequest::SetTarget {
            prompt: prompt.to_string(),
        })
    }

    pub fn apply_reply(&mut self, reply: &ControlReply) {
        let text = match (&reply.request, &reply.result) {
            (_, Ok(ControlAck::TargetSwitched { color, .. })) => {
                format!("✓ Switched to {color} blob")
            }
            (_, Ok(ControlAck::SensitivityApplied(cfg))) => format!(
                "✓ Settings applied (area {}, circularity {:.2}, solidity {:.2})",
                cfg.min_area, cfg.min_circularity, cfg.min_solidity
            ),
            (ControlRequest::SetTarget { .. }, Err(ControlError::Transport(_))) => {
                "✗ Error: Could not connect to server".to_string()
            }
            (ControlRequest::SetTarget { .. }, Err(e)) => format!("✗ {e}"),
            (ControlRequest::SetSensitivity(_), Err(e)) => {
                format!("✗ Failed to apply settings: {e}")
            }
        };
        self.push(ChatRole::System, text);
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, role: ChatRole, text: impl Into<String>) {
        if self.messages.len() >= MAX_CHAT_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(ChatMessage {
            role,
            text: text.into(),
        });
    }
}
