//! MCP tool definitions and handlers.
//!
//! Tool definitions come straight from the declarative catalogue in
//! [`schema::TOOLS`]; [`handle_tool_call`] validates the arguments against
//! the same catalogue and only then dispatches to an operation, so an
//! invalid call never reaches the network.
//!
//! ## Tool categories
//!
//! - **Connectivity**: `test_connection`
//! - **Projects**: `list_projects`, `search_projects`, `get_project`,
//!   `create_project`, `update_project`, `delete_project`
//! - **Servers**: `list_servers`, `get_server`, `create_server`,
//!   `update_server`, `delete_server`, deploy config, lock/unlock, power
//!   actions, rescue mode, reinstall, IPMI and out-of-band access
//! - **Catalogue**: `list_plans`, `get_plan`, `list_operating_systems`,
//!   `list_regions`, `get_region`

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::client::LatitudeClient;
use crate::error::{ApiError, OperationError, Stage};
use crate::normalize::ResultEnvelope;
use crate::operations::{account, plans, projects, regions, servers};
use crate::schema::{self, ToolSpec, ValidationError, Validated};

/// `tools/list` payload: name, description and JSON Schema for every tool.
pub fn tool_definitions() -> Vec<Value> {
    schema::TOOLS
        .iter()
        .map(|spec| {
            json!({
                "name": spec.name,
                "description": spec.description,
                "inputSchema": schema::input_schema(spec),
            })
        })
        .collect()
}

/// Result of an MCP tool call, ready to be serialized into a JSON-RPC response.
#[derive(Debug)]
pub struct ToolResult {
    /// MCP content blocks (a single `{"type":"text","text":"..."}` entry).
    pub content: Vec<Value>,
    /// Maps to `isError` in the MCP response.
    pub is_error: bool,
}

impl ToolResult {
    fn success(envelope: &ResultEnvelope) -> Self {
        let text = serde_json::to_string_pretty(envelope).unwrap_or_default();
        Self {
            content: vec![json!({ "type": "text", "text": text })],
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": message })],
            is_error: true,
        }
    }
}

/// Why a tool call failed, and how far it got.
#[derive(Debug, Error)]
enum CallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl CallError {
    /// Lifecycle stage the call failed in.
    fn stage(&self) -> Stage {
        match self {
            Self::UnknownTool(_) => Stage::Received,
            Self::Validation(_) => Stage::Validated,
            Self::Operation(e) => match e.source {
                ApiError::MissingData | ApiError::InvalidResponse(_) => Stage::Normalized,
                _ => Stage::Requested,
            },
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::Validation(_) => "validation",
            Self::Operation(e) => e.source.class(),
        }
    }

    fn details(&self) -> Option<&Value> {
        match self {
            Self::Operation(e) => e.details(),
            _ => None,
        }
    }

    /// Caller-facing text: the message, then any upstream details.
    fn render(&self) -> String {
        let mut text = format!("Error: {self}");
        if let Some(details) = self.details() {
            let pretty = serde_json::to_string_pretty(details).unwrap_or_default();
            text.push_str("\n\nDetails:\n");
            text.push_str(&pretty);
        }
        text
    }
}

/// Dispatch a tool call. Never panics and never returns a protocol error:
/// every failure becomes an `isError` result with secrets redacted.
pub async fn handle_tool_call(name: &str, args: &Value, client: &LatitudeClient) -> ToolResult {
    debug!(tool = name, stage = %Stage::Received, "tool call");

    match call(name, args, client).await {
        Ok(envelope) => {
            debug!(tool = name, stage = %Stage::Returned, "tool call succeeded");
            ToolResult::success(&envelope)
        }
        Err(e) => {
            let text = client.redactor().redact(&e.render());
            warn!(
                tool = name,
                stage = %e.stage(),
                class = e.class(),
                error = %client.redactor().redact(&e.to_string()),
                "tool call failed"
            );
            ToolResult::error(text)
        }
    }
}

async fn call(name: &str, args: &Value, client: &LatitudeClient) -> Result<ResultEnvelope, CallError> {
    let spec = schema::find_tool(name).ok_or_else(|| CallError::UnknownTool(name.to_string()))?;
    let validated = schema::validate(spec, args)?;
    debug!(tool = name, stage = %Stage::Validated, "arguments validated");
    dispatch(spec, validated, client).await
}

async fn dispatch(
    spec: &ToolSpec,
    args: Validated,
    client: &LatitudeClient,
) -> Result<ResultEnvelope, CallError> {
    let envelope = match spec.name {
        "test_connection" => account::test_connection(client).await?,

        "list_projects" => projects::list(client, args.into_typed()?).await?,
        "search_projects" => projects::search(client, args.into_typed()?).await?,
        "get_project" => projects::get(client, args.into_typed()?).await?,
        "create_project" => projects::create(client, args.into_typed()?).await?,
        "update_project" => projects::update(client, args.into_typed()?).await?,
        "delete_project" => projects::delete(client, args.into_typed()?).await?,

        "list_servers" => servers::list(client, args.into_typed()?).await?,
        "get_server" => servers::get(client, args.into_typed()?).await?,
        "create_server" => servers::create(client, args.into_typed()?).await?,
        "update_server" => servers::update(client, args.into_typed()?).await?,
        "delete_server" => servers::delete(client, args.into_typed()?).await?,
        "get_server_deploy_config" => servers::get_deploy_config(client, args.into_typed()?).await?,
        "update_server_deploy_config" => {
            servers::update_deploy_config(client, args.into_typed()?).await?
        }
        "lock_server" => servers::lock(client, args.into_typed()?).await?,
        "unlock_server" => servers::unlock(client, args.into_typed()?).await?,
        "run_server_action" => servers::run_action(client, args.into_typed()?).await?,
        "enter_rescue_mode" => servers::enter_rescue_mode(client, args.into_typed()?).await?,
        "exit_rescue_mode" => servers::exit_rescue_mode(client, args.into_typed()?).await?,
        "reinstall_server" => servers::reinstall(client, args.into_typed()?).await?,
        "generate_ipmi_credentials" => {
            servers::generate_ipmi_credentials(client, args.into_typed()?).await?
        }
        "list_oob_connections" => servers::list_oob_connections(client, args.into_typed()?).await?,
        "create_oob_connection" => servers::create_oob_connection(client, args.into_typed()?).await?,

        "list_plans" => plans::list(client, args.into_typed()?).await?,
        "get_plan" => plans::get(client, args.into_typed()?).await?,
        "list_operating_systems" => plans::list_operating_systems(client, args.into_typed()?).await?,

        "list_regions" => regions::list(client, args.into_typed()?).await?,
        "get_region" => regions::get(client, args.into_typed()?).await?,

        other => return Err(CallError::UnknownTool(other.to_string())),
    };
    Ok(envelope)
}
