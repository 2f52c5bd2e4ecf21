//! Agent Mesh integration
//!
//! Agent lifecycle, inter-agent messaging, file transfer, health
//! monitoring, system updates, and incident reporting. The mesh speaks
//! camelCase on the wire while the bridge's UI surface is snake_case;
//! the request types here translate between the two.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::gateway::Operation;

/// The full Agent Mesh operation table.
pub fn operations() -> Vec<Operation> {
    vec![
        // Agent lifecycle
        Operation::get("list_agents", "/api/agents").list(),
        Operation::post("register_agent", "/api/agents/register").with_body(),
        Operation::get("get_agent", "/api/agents/{agent_id}"),
        Operation::put("update_agent", "/api/agents/{agent_id}").with_body(),
        Operation::delete("delete_agent", "/api/agents/{agent_id}"),
        // Messaging
        Operation::post("send_message", "/api/messages").with_body(),
        Operation::get("list_messages", "/api/messages").list(),
        Operation::get("agent_messages", "/api/agents/{agent_id}/messages").list(),
        Operation::get("agent_inbox", "/api/agents/{agent_id}/inbox").list(),
        Operation::delete("delete_message", "/api/messages/{message_id}"),
        // File transfer
        Operation::post("upload_file", "/api/files/upload").with_body(),
        Operation::get("list_files", "/api/files").list(),
        Operation::get("get_file", "/api/files/{file_id}"),
        Operation::delete("delete_file", "/api/files/{file_id}"),
        // Health monitoring
        Operation::post("report_health", "/api/agents/{agent_id}/health").with_body(),
        Operation::get("get_agent_health", "/api/agents/{agent_id}/health"),
        Operation::get("health_dashboard", "/api/health/dashboard"),
        // System updates
        Operation::get("list_updates", "/api/updates").list(),
        Operation::post("create_update", "/api/updates").with_body(),
        Operation::post("acknowledge_update", "/api/updates/{update_id}/acknowledge").with_body(),
        // Incident reporting
        Operation::post("report_incident", "/api/catastrophe").with_body(),
        Operation::get("recovery_protocols", "/api/catastrophe/protocols"),
    ]
}

/// Register or re-register an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAgentRequest {
    /// Agent name
    pub name: String,
    /// Agent endpoint URL
    pub endpoint: String,
    /// Declared capabilities
    pub capabilities: Vec<String>,
}

/// Partial agent update; unset fields are left untouched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAgentRequest {
    /// New name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New endpoint URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// New capability list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
}

/// Send a message to another agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SendMessageRequest {
    /// Sender agent id
    pub from_agent_id: String,
    /// Recipient agent id
    pub to_agent_id: String,
    /// Message text
    pub message: String,
}

/// Upload a file to the mesh. `content` is pre-encoded text (Base64);
/// the bridge does not decode it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct UploadFileRequest {
    /// File name
    pub filename: String,
    /// Pre-encoded file content
    pub content: String,
    /// Owning agent id
    pub agent_id: String,
}

/// Health metrics reported by an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// CPU utilization
    pub cpu: f64,
    /// Memory utilization
    pub memory: f64,
    /// Disk utilization
    pub disk: f64,
    /// Uptime in seconds
    pub uptime: f64,
    /// Per-service status map
    pub services: HashMap<String, String>,
}

/// Announce a system update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct CreateUpdateRequest {
    /// Version string
    pub version: String,
    /// Release notes
    pub notes: String,
    /// Originating agent id
    pub agent_id: String,
}

/// Acknowledge a system update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct AcknowledgeUpdateRequest {
    /// Acknowledging agent id
    pub agent_id: String,
}

/// Incident severity levels accepted by the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor degradation
    Low,
    /// Partial loss of function
    Medium,
    /// Major loss of function
    High,
    /// Full outage
    Critical,
}

/// Report an incident
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ReportIncidentRequest {
    /// Incident severity
    pub severity: Severity,
    /// What happened
    pub description: String,
    /// Reporting agent id
    pub agent_id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn operation_table_registers_cleanly() {
        let mut registry = crate::gateway::OperationRegistry::new();
        registry
            .register_service(crate::services::MESH, operations())
            .unwrap();
        assert_eq!(registry.len(), 22);
        registry.resolve("mesh", "register_agent").unwrap();
        registry.resolve("mesh", "recovery_protocols").unwrap();
    }

    #[test]
    fn send_message_serializes_to_mesh_wire_names() {
        let request = SendMessageRequest {
            from_agent_id: "a1".to_string(),
            to_agent_id: "a2".to_string(),
            message: "hi".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"fromAgentId": "a1", "toAgentId": "a2", "message": "hi"})
        );
    }

    #[test]
    fn send_message_deserializes_from_ui_snake_case() {
        let request: SendMessageRequest = serde_json::from_value(json!({
            "from_agent_id": "a1",
            "to_agent_id": "a2",
            "message": "hi"
        }))
        .unwrap();
        assert_eq!(request.from_agent_id, "a1");
    }

    #[test]
    fn update_request_drops_unset_fields() {
        let request = UpdateAgentRequest {
            name: Some("scout".to_string()),
            endpoint: None,
            capabilities: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "scout"})
        );
    }

    #[test]
    fn severity_rejects_unknown_levels() {
        assert!(serde_json::from_value::<Severity>(json!("critical")).is_ok());
        assert!(serde_json::from_value::<Severity>(json!("apocalyptic")).is_err());
    }
}
