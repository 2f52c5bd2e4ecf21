//! OpenClaw control gateway integration
//!
//! Control-panel passthroughs (config, channels, skills, tools, agents,
//! cron, sessions, nodes, logs, auth profiles) plus the
//! OpenAI-compatible model listing and chat-completion surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::Operation;

/// Model-id prefix the UI uses to route requests to OpenClaw. Stripped
/// before forwarding to the gateway.
pub const MODEL_PREFIX: &str = "openclaw:";

/// The full OpenClaw operation table.
pub fn operations() -> Vec<Operation> {
    vec![
        // Config
        Operation::get("get_config", "/api/config"),
        Operation::put("update_config", "/api/config").with_body(),
        // Channels
        Operation::get("list_channels", "/api/channels").list(),
        Operation::get("get_channel", "/api/channels/{channel_id}"),
        Operation::put("update_channel", "/api/channels/{channel_id}").with_body(),
        Operation::post("send_channel_message", "/api/channels/{channel_id}/send").with_body(),
        // Skills
        Operation::get("list_skills", "/api/skills").list(),
        Operation::post("enable_skill", "/api/skills/{skill_id}/enable"),
        Operation::post("disable_skill", "/api/skills/{skill_id}/disable"),
        // Agents
        Operation::get("list_agents", "/api/agents").list(),
        Operation::get("get_agent", "/api/agents/{agent_id}"),
        // Cron jobs
        Operation::get("list_cron_jobs", "/api/cron").list(),
        Operation::post("create_cron_job", "/api/cron").with_body(),
        Operation::delete("delete_cron_job", "/api/cron/{job_id}"),
        // Sessions
        Operation::get("list_sessions", "/api/sessions").list(),
        Operation::get("get_session", "/api/sessions/{session_id}"),
        // Nodes
        Operation::get("list_nodes", "/api/nodes").list(),
        // Logs
        Operation::get("tail_logs", "/api/logs?limit={limit}").list(),
        // Auth profiles
        Operation::get("list_auth_profiles", "/api/auth/profiles"),
        // Status
        Operation::get("get_status", "/api/status"),
        // Models & chat
        Operation::get("list_models", "/v1/models").list(),
        Operation::post("chat_completions", "/v1/chat/completions").with_body(),
    ]
}

/// Messaging channel as shown to the UI, normalized from whatever
/// partial shape the gateway reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel id
    pub id: String,
    /// Display name
    pub name: String,
    /// Channel type (telegram, whatsapp, discord, ...)
    #[serde(rename = "type")]
    pub channel_type: String,
    /// Connection status
    pub status: String,
    /// Supported capabilities
    pub capabilities: Vec<String>,
}

impl ChannelInfo {
    /// Normalize a raw gateway channel object, filling defaults for
    /// missing fields.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let str_field = |key: &str, fallback: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            id: value
                .get("id")
                .or_else(|| value.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            name: str_field("name", "Unknown"),
            channel_type: str_field("type", "unknown"),
            status: str_field("status", "unknown"),
            capabilities: value
                .get("capabilities")
                .and_then(Value::as_array)
                .map(|caps| {
                    caps.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Channels advertised when the gateway reports none
pub fn default_channels() -> Vec<ChannelInfo> {
    vec![
        ChannelInfo {
            id: "telegram".to_string(),
            name: "Telegram".to_string(),
            channel_type: "telegram".to_string(),
            status: "connected".to_string(),
            capabilities: vec![
                "text".to_string(),
                "media".to_string(),
                "buttons".to_string(),
            ],
        },
        ChannelInfo {
            id: "whatsapp".to_string(),
            name: "WhatsApp".to_string(),
            channel_type: "whatsapp".to_string(),
            status: "connected".to_string(),
            capabilities: vec!["text".to_string(), "media".to_string()],
        },
    ]
}

/// Send a message through a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendChannelMessageRequest {
    /// Message text
    pub message: String,
    /// Recipient, channel-specific addressing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Attached media reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

/// Skill as shown to the UI, normalized like [`ChannelInfo`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Skill id
    pub id: String,
    /// Display name
    pub name: String,
    /// What the skill does
    pub description: String,
    /// Skill category
    pub category: String,
    /// Whether the skill is currently enabled
    pub enabled: bool,
}

impl SkillInfo {
    /// Normalize a raw gateway skill object.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let str_field = |key: &str, fallback: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            id: value
                .get("id")
                .or_else(|| value.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            name: str_field("name", "Unknown"),
            description: str_field("description", ""),
            category: str_field("category", "general"),
            enabled: value
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(true),
        }
    }
}

fn skill(id: &str, name: &str, description: &str, category: &str) -> SkillInfo {
    SkillInfo {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        enabled: true,
    }
}

/// Skills advertised when the gateway reports none
pub fn default_skills() -> Vec<SkillInfo> {
    vec![
        skill("web-search", "Web Search", "Search the web", "research"),
        skill("browser", "Browser", "Browser automation", "automation"),
        skill("tts", "TTS", "Text to speech", "audio"),
        skill("memory", "Memory", "Persistent memory", "storage"),
    ]
}

/// Tool available through the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool id
    pub id: String,
    /// Display name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Tool category
    pub category: String,
}

fn tool(id: &str, name: &str, description: &str, category: &str) -> ToolInfo {
    ToolInfo {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
    }
}

/// The fixed tool catalog the gateway exposes. The gateway has no
/// discovery endpoint for these.
pub fn tool_catalog() -> Vec<ToolInfo> {
    vec![
        tool("browser", "Browser", "Control browser for automation", "automation"),
        tool("exec", "Shell Execute", "Run shell commands", "system"),
        tool("tts", "Text to Speech", "Convert text to audio", "audio"),
        tool("message", "Messaging", "Send messages to channels", "communication"),
        tool("memory", "Memory", "Persistent storage", "storage"),
        tool("web_search", "Web Search", "Search the web", "research"),
    ]
}

/// Auth profile held by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProfile {
    /// Profile id
    pub id: String,
    /// Provider name
    pub provider: String,
    /// Credential mode: `oauth` or `api_key`
    pub mode: String,
    /// Account email, when the provider reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthProfile {
    /// Normalize one entry of the gateway's profile map.
    #[must_use]
    pub fn from_entry(id: &str, data: &Value) -> Self {
        Self {
            id: id.to_string(),
            provider: data
                .get("provider")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            mode: data
                .get("mode")
                .and_then(Value::as_str)
                .unwrap_or("api_key")
                .to_string(),
            email: data
                .get("email")
                .and_then(Value::as_str)
                .map(String::from),
        }
    }
}

/// OpenAI-style model object exposed on `/v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiModel {
    /// Model id as shown to the UI (prefixed)
    pub id: String,
    /// Always `"model"`
    pub object: String,
    /// Creation timestamp (fixed; the gateway reports none)
    pub created: i64,
    /// Provider name
    pub owned_by: String,
    /// Un-prefixed model id
    pub root: String,
    /// Parent model, unused
    pub parent: Option<String>,
}

impl OpenAiModel {
    /// Build a model object from id and provider.
    #[must_use]
    pub fn new(id: impl Into<String>, root: impl Into<String>, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "model".to_string(),
            created: 1_700_000_000,
            owned_by: owned_by.into(),
            root: root.into(),
            parent: None,
        }
    }
}

/// Models advertised when the gateway is unreachable, so the UI still
/// renders a usable picker.
pub fn default_models() -> Vec<OpenAiModel> {
    vec![
        OpenAiModel::new("openclaw:gpt-5.2", "gpt-5.2", "openai"),
        OpenAiModel::new("openclaw:claude-opus", "claude-opus", "anthropic"),
        OpenAiModel::new("openclaw:gemini-pro", "gemini-pro", "google"),
    ]
}

/// OpenAI-style chat completion request.
///
/// Message content is forwarded untouched; only the `model` field is
/// rewritten (prefix strip) before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model id, possibly `openclaw:`-prefixed
    pub model: String,
    /// Conversation messages, passed through verbatim
    pub messages: Value,
    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Completion token cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    /// Nucleus sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Frequency penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

impl ChatCompletionRequest {
    /// Body forwarded to the gateway, with the service prefix stripped
    /// from the model id.
    #[must_use]
    pub fn forward_body(&self) -> Value {
        let mut forwarded = self.clone();
        if let Some(stripped) = forwarded.model.strip_prefix(MODEL_PREFIX) {
            forwarded.model = stripped.to_string();
        }
        serde_json::to_value(&forwarded).unwrap_or(Value::Null)
    }
}
