//! Typed client surface for the agent/tool/model management API.
//!
//! These are plain JSON request/response calls consumed as an external
//! collaborator; failures surface as typed status errors with the parsed
//! server message and no retry policy.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{require_success, ChatApiClient};
use crate::error::ChatApiError;
use crate::url::{join_url, DEFAULT_API_BASE_URL};

/// Agent record returned by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub system_prompt: String,
    pub model: String,
    pub temperature: String,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Tool registration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Builtin,
    Custom,
}

/// Tool record returned by the management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub tool_type: ToolType,
    #[serde(default)]
    pub implementation: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub agent_id: Option<i64>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Partial agent payload for create and update calls.
///
/// Unset fields are omitted from the request body, so an update only touches
/// what the caller filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Partial tool payload for create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<ToolType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
}

/// Available-model descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
}

#[derive(Debug, Deserialize)]
struct ModelsReply {
    models: Vec<ModelInfo>,
}

impl ChatApiClient {
    pub async fn list_agents(&self) -> Result<Vec<Agent>, ChatApiError> {
        self.get_json("agents/").await
    }

    pub async fn list_active_agents(&self) -> Result<Vec<Agent>, ChatApiError> {
        self.get_json("agents/active").await
    }

    pub async fn get_agent(&self, id: i64) -> Result<Agent, ChatApiError> {
        self.get_json(&format!("agents/{id}")).await
    }

    pub async fn create_agent(&self, draft: &AgentDraft) -> Result<Agent, ChatApiError> {
        self.post_json("agents/", draft).await
    }

    pub async fn update_agent(&self, id: i64, draft: &AgentDraft) -> Result<Agent, ChatApiError> {
        self.put_json(&format!("agents/{id}"), draft).await
    }

    pub async fn delete_agent(&self, id: i64) -> Result<(), ChatApiError> {
        self.delete(&format!("agents/{id}")).await
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>, ChatApiError> {
        self.get_json("tools/").await
    }

    pub async fn get_tool(&self, id: i64) -> Result<Tool, ChatApiError> {
        self.get_json(&format!("tools/{id}")).await
    }

    /// Tools bound to one agent.
    pub async fn list_agent_tools(&self, agent_id: i64) -> Result<Vec<Tool>, ChatApiError> {
        self.get_json(&format!("tools/agent/{agent_id}")).await
    }

    pub async fn create_tool(&self, draft: &ToolDraft) -> Result<Tool, ChatApiError> {
        self.post_json("tools/", draft).await
    }

    pub async fn update_tool(&self, id: i64, draft: &ToolDraft) -> Result<Tool, ChatApiError> {
        self.put_json(&format!("tools/{id}"), draft).await
    }

    pub async fn delete_tool(&self, id: i64) -> Result<(), ChatApiError> {
        self.delete(&format!("tools/{id}")).await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ChatApiError> {
        let reply: ModelsReply = self.get_json("models/available").await?;
        Ok(reply.models)
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.config.api_base_url, DEFAULT_API_BASE_URL, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChatApiError> {
        let response = self.http.get(self.endpoint(path)).send().await?;
        let response = require_success(response).await?;
        Ok(response.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ChatApiError> {
        let response = self.http.post(self.endpoint(path)).json(body).send().await?;
        let response = require_success(response).await?;
        Ok(response.json().await?)
    }

    async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ChatApiError> {
        let response = self.http.put(self.endpoint(path)).json(body).send().await?;
        let response = require_success(response).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), ChatApiError> {
        let response = self.http.delete(self.endpoint(path)).send().await?;
        require_success(response).await?;
        Ok(())
    }
}
