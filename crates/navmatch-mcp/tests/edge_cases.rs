//! Edge case integration tests for navmatch-mcp.
//!
//! Drives the protocol handler end to end: handshake, tool dispatch,
//! verifier lifecycle, error codes and the batch check.

use std::io::Write;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use navmatch_mcp::config::{load_tasks, ServerConfig};
use navmatch_mcp::protocol::ProtocolHandler;
use navmatch_mcp::session::VerifierSessionManager;
use navmatch_mcp::transport::framing;
use navmatch_mcp::types::*;

const REALTOR_GT: &str =
    "https://www.realtor.com/realestateandhomes-search/Austin_TX/beds-3/baths-2/price-500000-1000000";
const REALTOR_REORDERED: &str =
    "https://www.realtor.com/realestateandhomes-search/Austin_TX/price-500000-1000000/baths-2/beds-3";

// ─────────────────────── helpers ───────────────────────

fn new_handler() -> ProtocolHandler {
    ProtocolHandler::new(Arc::new(Mutex::new(VerifierSessionManager::default())))
}

/// Build an MCP JSON-RPC request.
fn mcp_request(id: i64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params
    })
}

fn init_request() -> Value {
    mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }),
    )
}

/// Send a JSON-RPC message through the handler and return the response.
async fn send(handler: &ProtocolHandler, msg: Value) -> Option<Value> {
    let parsed: JsonRpcMessage = serde_json::from_value(msg).unwrap();
    handler.handle_message(parsed).await
}

async fn send_unwrap(handler: &ProtocolHandler, msg: Value) -> Value {
    send(handler, msg).await.expect("expected response")
}

/// Call a tool and return the raw JSON-RPC response.
async fn call_tool(handler: &ProtocolHandler, name: &str, arguments: Value) -> Value {
    let msg = mcp_request(
        1,
        "tools/call",
        json!({ "name": name, "arguments": arguments }),
    );
    send_unwrap(handler, msg).await
}

/// Call a tool that must succeed and decode its JSON text payload.
async fn call_tool_ok(handler: &ProtocolHandler, name: &str, arguments: Value) -> Value {
    let resp = call_tool(handler, name, arguments).await;
    assert!(resp.get("result").is_some(), "{name} should succeed, got: {resp}");
    let text = resp["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

async fn create_verifier(handler: &ProtocolHandler, ground_truth: Value) -> String {
    let created = call_tool_ok(
        handler,
        "verifier_create",
        json!({ "ground_truth": ground_truth }),
    )
    .await;
    created["verifier_id"].as_str().unwrap().to_string()
}

// ═══════════════════════════════════════════════════════
// PROTOCOL TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_malformed_json() {
    let err = framing::parse_message(r#"{"broken":"#).unwrap_err();
    assert_eq!(err.code(), -32700, "Should be PARSE_ERROR (-32700)");

    assert!(framing::parse_message("").is_err());
    assert!(framing::parse_message(r#"{"jsonrpc":"2.0","id":1,"method":"#).is_err());
}

#[tokio::test]
async fn test_initialize_identifies_server() {
    let handler = new_handler();
    let resp = send_unwrap(&handler, init_request()).await;
    let result = &resp["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "navmatch-mcp");
    assert!(result["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_future_protocol_version() {
    let handler = new_handler();
    let msg = mcp_request(
        0,
        "initialize",
        json!({
            "protocolVersion": "2099-01-01",
            "capabilities": {},
            "clientInfo": { "name": "future-client", "version": "99.0" }
        }),
    );
    let resp = send_unwrap(&handler, msg).await;
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
}

#[tokio::test]
async fn test_notification_gets_no_reply() {
    let handler = new_handler();
    send_unwrap(&handler, init_request()).await;
    let reply = send(&handler, json!({ "jsonrpc": "2.0", "method": "initialized" })).await;
    assert!(reply.is_none());
}

#[tokio::test]
async fn test_unknown_method() {
    let handler = new_handler();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(1, "resources/list", json!({}))).await;
    assert_eq!(resp["error"]["code"], -32601); // METHOD_NOT_FOUND
}

#[tokio::test]
async fn test_unknown_tool() {
    let handler = new_handler();
    send_unwrap(&handler, init_request()).await;

    let resp = call_tool(&handler, "verifier_destroy", json!({})).await;
    assert_eq!(resp["error"]["code"], -32803); // TOOL_NOT_FOUND
}

#[tokio::test]
async fn test_tools_list_names() {
    let handler = new_handler();
    let resp = send_unwrap(&handler, mcp_request(1, "tools/list", json!({}))).await;
    let names: Vec<&str> = resp["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in [
        "verifier_create",
        "verifier_update",
        "verifier_reset",
        "verifier_compute",
        "verifier_close",
        "verifier_list",
        "url_match",
        "url_parse",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }
}

#[tokio::test]
async fn test_missing_params() {
    let handler = new_handler();
    send_unwrap(&handler, init_request()).await;

    let resp = send_unwrap(&handler, mcp_request(1, "tools/call", json!(null))).await;
    assert_eq!(resp["error"]["code"], -32602);

    let resp = call_tool(&handler, "verifier_create", json!({})).await;
    assert_eq!(resp["error"]["code"], -32602, "ground_truth is required: {resp}");

    let resp = call_tool(&handler, "verifier_update", json!({ "verifier_id": "x" })).await;
    assert_eq!(resp["error"]["code"], -32602, "url is required: {resp}");
}

#[tokio::test]
async fn test_unknown_site_and_bad_policy() {
    let handler = new_handler();

    let resp = call_tool(
        &handler,
        "verifier_create",
        json!({ "site": "craigslist", "ground_truth": REALTOR_GT }),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32602);

    let resp = call_tool(
        &handler,
        "verifier_create",
        json!({ "ground_truth": REALTOR_GT, "policy": { "sets": "sometimes" } }),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32602);
    assert!(resp["error"]["message"]
        .as_str()
        .unwrap()
        .contains("policy"));
}

// ═══════════════════════════════════════════════════════
// VERIFIER LIFECYCLE TESTS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_update_compute_lifecycle() {
    let handler = new_handler();
    send_unwrap(&handler, init_request()).await;

    let created = call_tool_ok(
        &handler,
        "verifier_create",
        json!({ "ground_truth": [REALTOR_GT] }),
    )
    .await;
    assert_eq!(created["site"], "realtor");
    assert_eq!(created["ground_truth_count"], 1);
    let id = created["verifier_id"].as_str().unwrap();

    // Before any update the score is zero.
    let result = call_tool_ok(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(result["score"], 0.0);
    assert_eq!(result["details"]["mismatches"][0]["kind"], "no_agent_url");

    let updated = call_tool_ok(
        &handler,
        "verifier_update",
        json!({ "verifier_id": id, "url": REALTOR_REORDERED }),
    )
    .await;
    assert_eq!(updated["status"], "stored");

    let result = call_tool_ok(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(result["score"], 1.0);
    assert_eq!(result["match"], true);
    assert_eq!(result["matchedGroundTruthUrl"], REALTOR_GT);

    call_tool_ok(&handler, "verifier_reset", json!({ "verifier_id": id })).await;
    let result = call_tool_ok(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(result["score"], 0.0);

    call_tool_ok(&handler, "verifier_close", json!({ "verifier_id": id })).await;
    let resp = call_tool(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(resp["error"]["code"], -32850); // VERIFIER_NOT_FOUND
}

#[tokio::test]
async fn test_latest_update_wins() {
    let handler = new_handler();
    let id = create_verifier(&handler, json!(REALTOR_GT)).await;

    for url in [
        REALTOR_GT,
        "https://www.realtor.com/realestateandhomes-search/Austin_TX/beds-4",
    ] {
        call_tool_ok(&handler, "verifier_update", json!({ "verifier_id": id, "url": url })).await;
    }

    let result = call_tool_ok(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(result["match"], false);
}

#[tokio::test]
async fn test_foreign_domain_and_blank_updates_ignored() {
    let handler = new_handler();
    let id = create_verifier(&handler, json!(REALTOR_GT)).await;

    call_tool_ok(&handler, "verifier_update", json!({ "verifier_id": id, "url": REALTOR_GT })).await;

    let foreign = call_tool_ok(
        &handler,
        "verifier_update",
        json!({ "verifier_id": id, "url": "https://www.google.com/search?q=austin+homes" }),
    )
    .await;
    assert_eq!(foreign["status"], "foreign_domain");
    assert_eq!(foreign["stored"], false);

    let blank = call_tool_ok(&handler, "verifier_update", json!({ "verifier_id": id, "url": "  " })).await;
    assert_eq!(blank["status"], "blank");

    // The earlier matching URL is still the one scored.
    let result = call_tool_ok(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(result["score"], 1.0);
}

#[tokio::test]
async fn test_multiple_alternatives() {
    let handler = new_handler();
    let id = create_verifier(
        &handler,
        json!([
            ["https://streeteasy.com/for-rent/manhattan/beds:2"],
            ["https://streeteasy.com/for-rent/manhattan/beds:3"]
        ]),
    )
    .await;

    call_tool_ok(
        &handler,
        "verifier_update",
        json!({ "verifier_id": id, "url": "https://streeteasy.com/for-rent/manhattan/beds:3" }),
    )
    .await;
    let result = call_tool_ok(&handler, "verifier_compute", json!({ "verifier_id": id })).await;
    assert_eq!(result["score"], 1.0);
    assert_eq!(
        result["matchedGroundTruthUrl"],
        "https://streeteasy.com/for-rent/manhattan/beds:3"
    );
}

#[tokio::test]
async fn test_verifier_list_and_limit() {
    let session = VerifierSessionManager::new(ServerConfig { max_verifiers: 2 });
    let handler = ProtocolHandler::new(Arc::new(Mutex::new(session)));

    create_verifier(&handler, json!(REALTOR_GT)).await;
    create_verifier(&handler, json!(REALTOR_GT)).await;

    let resp = call_tool(&handler, "verifier_create", json!({ "ground_truth": REALTOR_GT })).await;
    assert_eq!(resp["error"]["code"], -32600);

    let listed = call_tool_ok(&handler, "verifier_list", json!({})).await;
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["max"], 2);
    assert_eq!(listed["verifiers"][0]["site"], "realtor");
}

#[tokio::test]
async fn test_empty_ground_truth_rejected() {
    let handler = new_handler();
    let resp = call_tool(
        &handler,
        "verifier_create",
        json!({ "site": "redfin", "ground_truth": [] }),
    )
    .await;
    assert_eq!(resp["error"]["code"], -32851); // VERIFICATION_ERROR
}

// ═══════════════════════════════════════════════════════
// ONE-SHOT TOOLS
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_url_match() {
    let handler = new_handler();
    let result = call_tool_ok(
        &handler,
        "url_match",
        json!({
            "agent_url": "https://streeteasy.com/for-rent/manhattan/beds:3",
            "ground_truth": "https://streeteasy.com/for-rent/manhattan/beds:4"
        }),
    )
    .await;
    assert_eq!(result["match"], false);
    let mismatch = &result["details"]["mismatches"][0];
    assert_eq!(mismatch["field"], "beds");
    assert_eq!(mismatch["kind"], "wrong_value");
}

#[tokio::test]
async fn test_url_parse() {
    let handler = new_handler();
    let parsed = call_tool_ok(&handler, "url_parse", json!({ "url": REALTOR_GT })).await;
    assert_eq!(parsed["site"], "realtor");
    assert_eq!(parsed["record"]["category"], "sale");
    assert!(parsed["record"]["filters"].get("beds").is_some());
}

#[tokio::test]
async fn test_shutdown_then_ping() {
    let handler = new_handler();
    create_verifier(&handler, json!(REALTOR_GT)).await;
    let resp = send_unwrap(&handler, mcp_request(9, "shutdown", json!(null))).await;
    assert!(resp.get("result").is_some(), "Shutdown should succeed: {resp}");
    let resp = send_unwrap(&handler, mcp_request(10, "ping", json!(null))).await;
    assert_eq!(resp["id"], 10);
}

// ═══════════════════════════════════════════════════════
// BATCH CHECK
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_check_over_task_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let tasks = json!([
        {
            "task_id": "realtor-reorder",
            "task_generation_config_json": { "gt_url": [REALTOR_GT, REALTOR_REORDERED] }
        },
        {
            "task_id": "streeteasy-diverge",
            "site": "streeteasy",
            "task_generation_config_json": json!({
                "gt_urls": [
                    "https://streeteasy.com/for-rent/manhattan/beds:4",
                    "https://streeteasy.com/for-rent/manhattan/beds:3"
                ]
            }).to_string()
        }
    ]);
    write!(file, "{tasks}").unwrap();

    let loaded = load_tasks(file.path()).unwrap();
    assert_eq!(loaded.len(), 2);

    let mut out = Vec::new();
    let summary = navmatch_mcp::run_check(&loaded, &mut out).unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 1);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("PASS realtor-reorder"));
    assert!(text.contains("FAIL streeteasy-diverge"));
    assert!(text.contains("accuracy: 50.0%"));
}

#[tokio::test]
async fn test_check_missing_task_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_tasks(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("nope.json"));
}
