//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Reads JSON-RPC 2.0 requests from stdin (one per line) and writes
//! responses to stdout. Requests are handled one at a time, in arrival order.
//!
//! ## Supported methods
//!
//! | Method              | Description                      |
//! |---------------------|----------------------------------|
//! | `initialize`        | Handshake, returns capabilities  |
//! | `tools/list`        | List available tool definitions  |
//! | `tools/call`        | Execute a tool and return result |
//! | `ping`              | Liveness check                   |
//!
//! Notifications (requests without an `id`) are acknowledged silently.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};

use crate::client::LatitudeClient;
use crate::tools;

const SERVER_NAME: &str = "mcp-latitude";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;

/// Run the MCP server on stdio until EOF.
pub async fn run_stdio(client: &LatitudeClient) {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve(reader, writer, client).await;
}

/// Serve line-delimited JSON-RPC from `reader` to `writer` until EOF.
pub async fn serve<R, W>(mut reader: R, mut writer: W, client: &LatitudeClient)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                let response = error_response(Value::Null, PARSE_ERROR, format!("Parse error: {e}"));
                write_response(&mut writer, &response).await;
                continue;
            }
        };

        let Some(id) = request.get("id").cloned() else {
            let method = request.get("method").and_then(Value::as_str).unwrap_or("");
            match method {
                "notifications/initialized" | "notifications/cancelled" => {}
                _ => debug!("ignoring notification: {method}"),
            }
            continue;
        };

        let response = handle_request(&request, id, client).await;
        write_response(&mut writer, &response).await;
    }
}

async fn handle_request(request: &Value, id: Value, client: &LatitudeClient) -> Value {
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let result = match method {
        "initialize" => initialize_result(),
        "tools/list" => json!({ "tools": tools::tool_definitions() }),
        "tools/call" => tools_call_result(request, client).await,
        "ping" => json!({}),
        _ => {
            warn!("unknown method: {method}");
            return error_response(id, METHOD_NOT_FOUND, format!("Method not found: {method}"));
        }
    };
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

async fn tools_call_result(request: &Value, client: &LatitudeClient) -> Value {
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
    let name = params.get("name").and_then(Value::as_str).unwrap_or("");
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    let result = tools::handle_tool_call(name, &args, client).await;

    let mut response = json!({ "content": result.content });
    if result.is_error {
        response["isError"] = json!(true);
    }
    response
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Write one response line and flush.
async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = writer.write_all(output.as_bytes()).await {
        error!("stdout write error: {e}");
    }
    if let Err(e) = writer.flush().await {
        error!("stdout flush error: {e}");
    }
}
