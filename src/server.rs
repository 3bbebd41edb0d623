// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Line-delimited JSON-RPC 2.0 over stdio implementing the MCP tool subset
// role: server/stdio
// inputs: one JSON-RPC message per line on the reader
// outputs: one JSON-RPC response per request line on the writer; notifications get no reply
// side_effects: Reads/writes the provided streams only; logs go to stderr via tracing
// invariants:
// - Nothing but protocol messages is written to the writer
// - tools/call before initialize is rejected with -32002
// errors: -32700 parse error, -32600 invalid request, -32601 unknown method, -32602 bad params, -32002 not initialized
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::tools::{ToolContext, TOOLS};

pub const MCP_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "evergreen-mcp";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
  #[serde(default, rename = "jsonrpc")]
  pub _jsonrpc: Option<String>,
  pub method: String,
  #[serde(default)]
  pub id: Option<Value>,
  #[serde(default)]
  pub params: Option<Value>,
}

pub fn json_rpc_response(id: Option<Value>, result: Value) -> Value {
  json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn json_rpc_error(id: Option<Value>, code: i64, message: &str) -> Value {
  json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

fn tool_text_content(payload: &Value) -> Value {
  let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
  json!({ "type": "text", "text": text })
}

pub struct McpServer {
  initialized: bool,
  tools: ToolContext,
}

impl McpServer {
  pub fn new(tools: ToolContext) -> Self {
    Self {
      initialized: false,
      tools,
    }
  }

  /// Handle one raw line. Returns the response to write, if any.
  pub fn handle_line(&mut self, line: &str) -> Option<Value> {
    let raw: Value = match serde_json::from_str(line) {
      Ok(v) => v,
      Err(e) => {
        warn!("unparseable message: {}", e);
        return Some(json_rpc_error(None, -32700, "Parse error"));
      }
    };
    let id = raw.get("id").cloned();

    match serde_json::from_value::<JsonRpcRequest>(raw) {
      Ok(req) => self.handle(req),
      Err(_) => Some(json_rpc_error(id, -32600, "Invalid Request")),
    }
  }

  pub fn handle(&mut self, request: JsonRpcRequest) -> Option<Value> {
    let method = request.method.as_str();
    debug!(method, "jsonrpc request");

    if method == "initialize" {
      return Some(json_rpc_response(
        request.id,
        json!({
          "protocolVersion": MCP_VERSION,
          "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
          "capabilities": { "tools": {} }
        }),
      ));
    }

    if method == "notifications/initialized" {
      self.initialized = true;
      return None;
    }

    // Other notifications (no id) never get a reply.
    if request.id.is_none() && method.starts_with("notifications/") {
      return None;
    }

    if !self.initialized {
      return Some(json_rpc_error(request.id, -32002, "Server not initialized"));
    }

    match method {
      "ping" => Some(json_rpc_response(request.id, json!({}))),
      "tools/list" => {
        let tools: Vec<Value> = TOOLS.iter().map(|t| t.describe()).collect();
        Some(json_rpc_response(request.id, json!({ "tools": tools })))
      }
      "tools/call" => {
        let Some(params) = request.params.as_ref().and_then(Value::as_object) else {
          return Some(json_rpc_error(request.id, -32602, "params must be an object"));
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
          return Some(json_rpc_error(request.id, -32602, "params.name must be a string"));
        };
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);

        let outcome = self.tools.call_tool(name, &args);
        Some(json_rpc_response(
          request.id,
          json!({
            "content": [tool_text_content(&outcome.payload)],
            "isError": outcome.is_error,
          }),
        ))
      }
      _ => Some(json_rpc_error(request.id, -32601, &format!("Method not found: {}", method))),
    }
  }

  /// Serve until the reader hits EOF.
  pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<()> {
    info!("serving MCP over stdio");

    for line in reader.lines() {
      let line = line.context("reading request line")?;
      if line.trim().is_empty() {
        continue;
      }
      if let Some(resp) = self.handle_line(&line) {
        serde_json::to_writer(&mut writer, &resp).context("writing response")?;
        writer.write_all(b"\n").context("writing response")?;
        writer.flush().context("flushing response")?;
      }
    }

    info!("stdin closed; exiting");
    Ok(())
  }
}
