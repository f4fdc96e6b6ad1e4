//! MCP server implementation.
//!
//! JSON-RPC 2.0 envelope types, routing for the three MCP methods this
//! server supports (`initialize`, `tools/list`, `tools/call`), and the two
//! transports: line-delimited STDIO and HTTP via Actix Web. Both transports
//! feed requests through the same [`dispatch`] function, so protocol
//! behavior cannot drift between them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use actix_web::{
    App, HttpResponse, HttpServer, Result, http::header,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::core::config::ServerConfig;
use crate::tools;

/// MCP protocol revision advertised during initialize.
const PROTOCOL_VERSION: &str = "2024-11-05";

// JSON-RPC 2.0 error codes.
pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request. `id` is absent for notifications.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response. Exactly one of `result` and `error` is present.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Parameters of a `tools/call` request.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Route a request to the matching method handler.
pub fn dispatch(config: &ServerConfig, req: &JsonRpcRequest) -> JsonRpcResponse {
    match req.method.as_str() {
        "initialize" => handle_initialize(config, req.id.clone()),
        "tools/list" => handle_tools_list(req.id.clone()),
        "tools/call" => handle_tools_call(req.id.clone(), req.params.as_ref()),
        other => JsonRpcResponse::error(
            req.id.clone(),
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    }
}

fn handle_initialize(config: &ServerConfig, id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": config.server_name,
                "version": config.server_version
            }
        }),
    )
}

fn handle_tools_list(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::success(id, json!({ "tools": tools::list_tools() }))
}

fn handle_tools_call(id: Option<Value>, params: Option<&Value>) -> JsonRpcResponse {
    let Some(params) = params else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "Invalid params");
    };

    let call: ToolCallParams = match serde_json::from_value(params.clone()) {
        Ok(call) => call,
        Err(e) => {
            return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"));
        }
    };

    match tools::call_tool(&call.name, &call.arguments) {
        Ok(content) => JsonRpcResponse::success(
            id,
            json!({
                "content": content,
                "isError": false
            }),
        ),
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "tool call rejected");
            JsonRpcResponse::error(id, e.json_rpc_code(), e.to_string())
        }
    }
}

/// Health check endpoint for load balancers and monitoring.
async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "python-tools-mcp"
    })))
}

/// Total request count since startup.
async fn metrics(counter: web::Data<AtomicU64>) -> Result<HttpResponse> {
    let count = counter.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(json!({
        "requests_total": count,
        "status": "ok"
    })))
}

/// One-shot Server-Sent Events stream advertising the tool catalog.
async fn sse_tools_discovery() -> Result<HttpResponse> {
    let tools = tools::list_tools();
    let count = tools.len();
    let payload = json!({
        "tools": tools,
        "count": count
    });

    // SSE frame: "data: {json}\n\n"
    let event = Bytes::from(format!("data: {payload}\n\n"));
    let stream = futures_util::stream::once(async move { Ok::<_, actix_web::Error>(event) });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        // Disable nginx buffering so the event is delivered immediately
        .insert_header(("x-accel-buffering", "no"))
        .streaming(stream))
}

/// JSON-RPC endpoint for the HTTP transport.
async fn mcp_handler(
    config: web::Data<ServerConfig>,
    counter: web::Data<AtomicU64>,
    req: web::Json<JsonRpcRequest>,
) -> Result<HttpResponse> {
    counter.fetch_add(1, Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(dispatch(&config, &req)))
}

/// Run the HTTP transport until shutdown.
///
/// Worker count comes from the configuration; connection limits and
/// timeouts are tuned for sustained request traffic.
pub async fn run_http(config: ServerConfig) -> std::io::Result<()> {
    let bind_addr = config.bind_addr();
    let workers = config.effective_workers();

    tracing::info!(
        name = %config.server_name,
        version = %config.server_version,
        %bind_addr,
        workers,
        "starting HTTP transport"
    );

    let config = web::Data::new(config);
    let request_count = web::Data::new(AtomicU64::new(0));

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(request_count.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .wrap(Logger::new("%r %s %Dms"))
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics))
            .route("/sse", web::get().to(sse_tools_discovery))
            .route("/mcp", web::post().to(mcp_handler))
            .route("/", web::post().to(mcp_handler))
            .route("/", web::get().to(health))
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the STDIO transport until stdin closes.
///
/// Reads one JSON-RPC request per line from stdin and writes one response
/// per line to stdout, flushing after each. Requests are handled to
/// completion in arrival order. Notifications (requests without an id) get
/// no response. Logging stays on stderr so the protocol stream is clean.
pub async fn run_stdio(config: ServerConfig) -> std::io::Result<()> {
    tracing::info!(
        name = %config.server_name,
        version = %config.server_version,
        "starting STDIO transport"
    );

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::with_capacity(8192, stdin).lines();
    let stdout = tokio::io::stdout();
    let mut stdout = BufWriter::with_capacity(8192, stdout);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(req) => {
                // Notifications (e.g. notifications/initialized) get no reply.
                if req.id.is_none() {
                    continue;
                }
                let response = dispatch(&config, &req);
                write_response(&mut stdout, &response).await?;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse request line");
                // Answer with a parse error when an id can be recovered from
                // the malformed input; otherwise there is nothing to address.
                if let Ok(partial) = serde_json::from_str::<Value>(&line) {
                    if let Some(id) = partial.get("id") {
                        let response = JsonRpcResponse::error(
                            Some(id.clone()),
                            PARSE_ERROR,
                            format!("Parse error: {e}"),
                        );
                        write_response(&mut stdout, &response).await?;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Write one response line and flush so the host sees it immediately.
async fn write_response<W>(stdout: &mut W, response: &JsonRpcResponse) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(response)?;
    stdout.write_all(json.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        }))
        .unwrap()
    }

    fn dispatch_value(req: &JsonRpcRequest) -> Value {
        serde_json::to_value(dispatch(&ServerConfig::default(), req)).unwrap()
    }

    #[test]
    fn initialize_reports_identity_and_capabilities() {
        let response = dispatch_value(&request("initialize", json!({})));
        let result = &response["result"];
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "test-python-project");
        assert_eq!(result["serverInfo"]["version"], "1.0.0");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_returns_catalog_in_order() {
        let response = dispatch_value(&request("tools/list", json!({})));
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "run_python_test");
        assert_eq!(tools[1]["name"], "format_code");
        assert!(tools[0]["inputSchema"]["properties"]["test_path"].is_object());
    }

    #[test]
    fn tools_call_run_python_test() {
        let response = dispatch_value(&request(
            "tools/call",
            json!({"name": "run_python_test", "arguments": {"test_path": "tests/"}}),
        ));
        let result = &response["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(
            result["content"],
            json!([{"type": "text", "text": "Running Python tests for: tests/"}])
        );
    }

    #[test]
    fn tools_call_run_python_test_verbose() {
        let response = dispatch_value(&request(
            "tools/call",
            json!({"name": "run_python_test", "arguments": {"test_path": "tests/", "verbose": true}}),
        ));
        assert_eq!(
            response["result"]["content"][0]["text"],
            "Running Python tests for: tests/ (verbose mode)"
        );
    }

    #[test]
    fn tools_call_format_code() {
        let response = dispatch_value(&request(
            "tools/call",
            json!({"name": "format_code", "arguments": {"file_path": "a.py"}}),
        ));
        assert_eq!(
            response["result"]["content"],
            json!([{"type": "text", "text": "Formatted Python file: a.py"}])
        );
    }

    #[test]
    fn tools_call_unknown_tool_is_rejected() {
        let response = dispatch_value(&request(
            "tools/call",
            json!({"name": "unknown_tool", "arguments": {}}),
        ));
        assert!(response.get("result").is_none());
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Unknown tool: unknown_tool");
    }

    #[test]
    fn tools_call_missing_argument_is_rejected() {
        let response = dispatch_value(&request(
            "tools/call",
            json!({"name": "run_python_test", "arguments": {}}),
        ));
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert_eq!(
            response["error"]["message"],
            "Missing required argument: test_path"
        );
    }

    #[test]
    fn tools_call_without_params_is_invalid() {
        let req = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call"
        }))
        .unwrap();
        let response = dispatch_value(&req);
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let response = dispatch_value(&request("resources/list", json!({})));
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(response["error"]["message"], "Method not found: resources/list");
    }

    #[test]
    fn response_envelope_omits_absent_fields() {
        let success = serde_json::to_value(JsonRpcResponse::success(
            Some(json!(1)),
            json!({"ok": true}),
        ))
        .unwrap();
        assert!(success.get("error").is_none());

        let error =
            serde_json::to_value(JsonRpcResponse::error(Some(json!(1)), PARSE_ERROR, "bad"))
                .unwrap();
        assert!(error.get("result").is_none());
        assert_eq!(error["jsonrpc"], "2.0");
    }
}
