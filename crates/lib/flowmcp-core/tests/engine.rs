use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flowmcp_core::config::HealthLevel;
use flowmcp_core::control::LiveTestFilters;
use flowmcp_core::handlers::{HandlerError, HandlerInputs, HandlerRegistry, RouteHook, RouteHooks};
use flowmcp_core::reference::{ToolRef, find_first_match, to_canonical_name};
use flowmcp_core::{
    CallOptions, FlowControlPlane, FlowPaths, PreparedCall, RuntimeError, SchemaRuntime, ToolDescriptor,
};
use serde_json::{Map, Value, json};
use tempfile::TempDir;

#[derive(Default)]
struct CountingRuntime {
    calls: AtomicUsize,
    fail_with: Mutex<Option<RuntimeError>>,
    last_call: Mutex<Option<PreparedCall>>,
}

impl CountingRuntime {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail_with(&self, error: RuntimeError) {
        *self.fail_with.lock().expect("runtime lock") = Some(error);
    }

    fn last_call(&self) -> PreparedCall {
        self.last_call
            .lock()
            .expect("runtime lock")
            .clone()
            .expect("runtime was invoked")
    }
}

#[async_trait]
impl SchemaRuntime for CountingRuntime {
    async fn invoke(&self, call: &PreparedCall) -> Result<Value, RuntimeError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_call.lock().expect("runtime lock") = Some(call.clone());
        if let Some(error) = self.fail_with.lock().expect("runtime lock").clone() {
            return Err(error);
        }
        Ok(json!({
            "call": count,
            "source": call.source,
            "route": call.route_name,
            "params": call.parameters,
        }))
    }
}

struct Fixture {
    _home_dir: TempDir,
    _project_dir: TempDir,
    home: PathBuf,
    cwd: PathBuf,
    runtime: Arc<CountingRuntime>,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self::uninitialized();
        let env_path = fixture.home.join(".env");
        fixture.write_json(
            &fixture.home.join("config.json"),
            &json!({
                "envPath": env_path.display().to_string(),
                "flowmcpCore": { "version": "2.0.0", "schemaSpec": "2.0.0" },
                "initialized": "2026-01-01T00:00:00Z",
                "sources": { "demo": { "type": "local", "schemaCount": 1 } }
            }),
        );
        fixture.write_env("OTHER=1\n");
        fixture.schema("demo", "demo.json", &demo_schema());
        fixture
    }

    fn uninitialized() -> Self {
        let home_dir = tempfile::tempdir().unwrap_or_else(|err| panic!("failed to create home dir: {err}"));
        let project_dir = tempfile::tempdir().unwrap_or_else(|err| panic!("failed to create project dir: {err}"));
        Self {
            home: home_dir.path().to_path_buf(),
            cwd: project_dir.path().to_path_buf(),
            _home_dir: home_dir,
            _project_dir: project_dir,
            runtime: Arc::new(CountingRuntime::default()),
        }
    }

    fn write_json(&self, path: &Path, value: &Value) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .unwrap_or_else(|err| panic!("failed to create {}: {err}", parent.display()));
        }
        let body = serde_json::to_string_pretty(value).unwrap_or_else(|err| panic!("failed to serialize fixture: {err}"));
        std::fs::write(path, body).unwrap_or_else(|err| panic!("failed to write {}: {err}", path.display()));
    }

    fn write_env(&self, contents: &str) {
        std::fs::write(self.home.join(".env"), contents).unwrap_or_else(|err| panic!("failed to write env file: {err}"));
    }

    fn schema(&self, source: &str, file: &str, main: &Value) {
        self.write_json(
            &self.home.join("schemas").join(source).join(file),
            &json!({ "main": main }),
        );
    }

    fn local(&self, value: &Value) {
        self.write_json(&self.local_path(), value);
    }

    fn local_path(&self) -> PathBuf {
        self.cwd.join(".flowmcp").join("config.json")
    }

    fn group(&self, tools: &[&str]) {
        self.local(&json!({
            "root": "~/.flowmcp",
            "defaultGroup": "dev",
            "groups": { "dev": { "description": "", "tools": tools } }
        }));
    }

    fn plane(&self) -> FlowControlPlane {
        FlowControlPlane::new(FlowPaths::new(&self.home, &self.cwd), self.runtime.clone())
    }
}

fn demo_schema() -> Value {
    json!({
        "namespace": "demo",
        "name": "Demo",
        "version": "2.0.0",
        "root": "https://api.example.com",
        "routes": {
            "ping": { "method": "GET", "path": "/ping" },
            "getPrice": {
                "method": "GET",
                "path": "/price",
                "parameters": [
                    {
                        "position": { "key": "id", "value": "{{USER_PARAM}}", "location": "query" },
                        "z": { "primitive": "string()", "options": ["optional()"] }
                    }
                ],
                "preload": { "enabled": true, "ttl": 3600 },
                "tests": [ { "_description": "btc price", "id": "btc" } ]
            }
        }
    })
}

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn canonical_names_round_trip_to_routes() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json"]);
    let plane = fixture.plane();

    let tools = plane.resolve_active_tools(None).await.expect("tools resolve");
    let names: Vec<&str> = tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, vec!["ping_demo", "get_price_demo"]);

    for tool in &tools {
        let found = find_first_match(&tools, &tool.name, |candidate: &ToolDescriptor| {
            (candidate.route.as_str(), candidate.namespace.as_str())
        })
        .expect("name resolves");
        assert_eq!((found.namespace.as_str(), found.route.as_str()), (tool.namespace.as_str(), tool.route.as_str()));
        assert_eq!(to_canonical_name(&found.route, &found.namespace), tool.name);
        let reference = ToolRef::parse(&tool.reference).expect("reference parses");
        assert_eq!(reference.route.as_deref(), Some(tool.route.as_str()));
    }
}

#[tokio::test]
async fn second_preload_call_is_served_from_cache() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json::getPrice"]);
    let plane = fixture.plane();

    let first = plane
        .call_tool("get_price_demo", args(json!({ "id": "btc" })), &CallOptions::default())
        .await;
    assert!(first.status, "{first:?}");
    let first_cache = first.cache.clone().expect("preload routes report cache status");
    assert!(!first_cache.hit);
    assert!(first_cache.stored);
    assert_eq!(first_cache.ttl, 3600);

    let second = plane
        .call_tool("get_price_demo", args(json!({ "id": "btc" })), &CallOptions::default())
        .await;
    assert!(second.status);
    assert!(second.cache.as_ref().is_some_and(|cache| cache.hit));
    assert_eq!(second.content, first.content);
    assert_eq!(fixture.runtime.calls(), 1);
}

#[tokio::test]
async fn distinct_parameters_use_distinct_entries() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json::getPrice"]);
    let plane = fixture.plane();
    let options = CallOptions::default();

    let btc = plane.call_tool("get_price_demo", args(json!({ "id": "btc" })), &options).await;
    let eth = plane.call_tool("get_price_demo", args(json!({ "id": "eth" })), &options).await;
    let none = plane.call_tool("get_price_demo", Map::new(), &options).await;

    for result in [&btc, &eth, &none] {
        assert!(result.cache.as_ref().is_some_and(|cache| !cache.hit));
    }
    assert_ne!(btc.content, eth.content);
    assert_eq!(fixture.runtime.calls(), 3);
    assert!(fixture.home.join("cache/demo/demo/getPrice.json").exists());
}

#[tokio::test]
async fn no_cache_never_reports_cache_status() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json"]);
    let plane = fixture.plane();
    let options = CallOptions::default().with_no_cache(true);

    for _ in 0..2 {
        let result = plane.call_tool("get_price_demo", Map::new(), &options).await;
        assert!(result.status);
        assert!(result.cache.is_none());
    }
    assert_eq!(fixture.runtime.calls(), 2);
    assert!(!fixture.home.join("cache").exists());

    let plain = plane.call_tool("ping_demo", Map::new(), &CallOptions::default()).await;
    assert!(plain.status);
    assert!(plain.cache.is_none(), "non-preload routes carry no cache field");
}

#[tokio::test]
async fn refresh_calls_live_and_overwrites() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json"]);
    let plane = fixture.plane();

    let first = plane.call_tool("get_price_demo", Map::new(), &CallOptions::default()).await;
    let refreshed = plane
        .call_tool("get_price_demo", Map::new(), &CallOptions::default().with_refresh(true))
        .await;
    assert_eq!(fixture.runtime.calls(), 2);
    let refreshed_cache = refreshed.cache.clone().expect("cache status");
    assert!(!refreshed_cache.hit);
    assert!(refreshed_cache.stored);
    assert_ne!(refreshed.content, first.content);

    let cached = plane.call_tool("get_price_demo", Map::new(), &CallOptions::default()).await;
    assert!(cached.cache.as_ref().is_some_and(|cache| cache.hit));
    assert_eq!(cached.content, refreshed.content);
    assert_eq!(fixture.runtime.calls(), 2);
}

struct Tagging;

impl RouteHook for Tagging {
    fn before(&self, call: &mut PreparedCall) -> Result<(), HandlerError> {
        call.parameters.insert("tagged".to_string(), json!(true));
        Ok(())
    }

    fn after(&self, data: Value) -> Result<Value, HandlerError> {
        Ok(json!({ "wrapped": data }))
    }
}

fn hooked_schema() -> Value {
    json!({
        "namespace": "hooked",
        "sharedLists": ["chains"],
        "requiredLibraries": ["ethers"],
        "routes": { "ping": { "method": "GET", "path": "/ping" } }
    })
}

#[tokio::test]
async fn missing_shared_lists_still_resolve_hooks() {
    let fixture = Fixture::new();
    fixture.schema("demo", "hooked.json", &hooked_schema());
    fixture.group(&["demo/hooked.json"]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    let registry = HandlerRegistry::new().with_factory(
        "hooked",
        move |inputs: &HandlerInputs| -> Result<RouteHooks, HandlerError> {
            captured
                .lock()
                .expect("capture lock")
                .push((inputs.shared_list("chains").len(), inputs.library::<u8>("ethers").is_none()));
            let mut hooks: RouteHooks = HashMap::new();
            hooks.insert("ping".to_string(), Arc::new(Tagging));
            Ok(hooks)
        },
    );
    let plane = fixture.plane().with_handlers(registry);

    let result = plane.call_tool("ping_hooked", Map::new(), &CallOptions::default()).await;
    assert!(result.status, "{result:?}");
    assert_eq!(*seen.lock().expect("capture lock"), vec![(0, true)]);
    let content = result.content.expect("content");
    assert_eq!(content["wrapped"]["params"]["tagged"], json!(true));
}

#[tokio::test]
async fn failing_handler_factory_is_ignored() {
    let fixture = Fixture::new();
    fixture.schema("demo", "hooked.json", &hooked_schema());
    fixture.group(&["demo/hooked.json"]);
    let registry = HandlerRegistry::new().with_factory(
        "hooked",
        |_: &HandlerInputs| -> Result<RouteHooks, HandlerError> { Err(HandlerError::new("factory bug")) },
    );
    let plane = fixture.plane().with_handlers(registry).with_debug(true);

    let result = plane.call_tool("ping_hooked", Map::new(), &CallOptions::default()).await;
    assert!(result.status, "{result:?}");
    let content = result.content.expect("content");
    assert!(content.get("wrapped").is_none());
    assert_eq!(content["route"], json!("ping"));
}

#[tokio::test]
async fn tools_outside_the_group_are_not_recognized() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json::ping"]);
    let plane = fixture.plane();

    let result = plane.call_tool("ping_demo", Map::new(), &CallOptions::default()).await;
    assert!(result.status, "{result:?}");

    let outside = plane.call_tool("get_price_demo", Map::new(), &CallOptions::default()).await;
    assert!(!outside.status);
    let message = outside.error.expect("error message");
    assert!(message.contains("not recognized"), "{message}");
    assert!(message.contains("demo/demo.json::getPrice"), "{message}");

    plane
        .remove_tools("dev", &["demo/demo.json::ping".to_string()])
        .await
        .expect("tool removed");
    let removed = plane.call_tool("ping_demo", Map::new(), &CallOptions::default()).await;
    assert!(!removed.status);
    let message = removed.error.expect("error message");
    assert!(message.contains("not recognized") || message.contains("No active tools"), "{message}");
}

#[tokio::test]
async fn explicit_references_bypass_groups() {
    let fixture = Fixture::new();
    let plane = fixture.plane();

    let result = plane
        .call_tool("demo/demo.json::ping", Map::new(), &CallOptions::default())
        .await;
    assert!(result.status, "{result:?}");

    let missing = plane
        .call_tool("demo/demo.json::nope", Map::new(), &CallOptions::default())
        .await;
    assert!(!missing.status);
    assert!(missing.error.is_some_and(|error| error.contains("not found")));
}

#[tokio::test]
async fn first_match_wins_on_name_collisions() {
    let fixture = Fixture::new();
    let service = json!({ "namespace": "svc", "routes": { "ping": { "method": "GET", "path": "/ping" } } });
    fixture.schema("alpha", "svc.json", &service);
    fixture.schema("beta", "svc.json", &service);
    fixture.group(&["beta/svc.json::ping", "alpha/svc.json::ping"]);
    let plane = fixture.plane();

    let result = plane.call_tool("ping_svc", Map::new(), &CallOptions::default()).await;
    assert_eq!(result.content.expect("content")["source"], json!("beta"));

    let report = plane.validate_schemas(Some("dev")).await;
    assert!(report.status);
    assert_eq!(report.warnings.len(), 1, "{report:?}");
}

#[tokio::test]
async fn missing_server_params_fail_the_call() {
    let fixture = Fixture::new();
    let keyed = json!({
        "namespace": "keyed",
        "requiredServerParams": ["API_KEY"],
        "headers": { "X-Key": "{{API_KEY}}" },
        "routes": { "ping": { "method": "GET", "path": "/ping" } }
    });
    fixture.schema("demo", "keyed.json", &keyed);
    fixture.group(&["demo/keyed.json"]);
    let plane = fixture.plane();

    let missing = plane.call_tool("ping_keyed", Map::new(), &CallOptions::default()).await;
    assert!(!missing.status);
    let message = missing.error.expect("error message");
    assert!(message.contains("Missing env vars"), "{message}");
    assert!(message.contains("API_KEY"), "{message}");
    assert_eq!(fixture.runtime.calls(), 0);

    fixture.write_env("API_KEY=secret\n");
    let ok = plane.call_tool("ping_keyed", Map::new(), &CallOptions::default()).await;
    assert!(ok.status, "{ok:?}");
    assert_eq!(
        fixture.runtime.last_call().environment.get("API_KEY").map(String::as_str),
        Some("secret")
    );

    fixture.runtime.fail_with(RuntimeError::with_status(401, "Unauthorized"));
    let rejected = plane.call_tool("ping_keyed", Map::new(), &CallOptions::default()).await;
    assert!(!rejected.status);
    assert_eq!(rejected.error.as_deref(), Some("HTTP 401: Unauthorized"));
    assert!(rejected.hint.is_some_and(|hint| hint.contains("API_KEY")));
}

#[tokio::test]
async fn live_tests_stop_at_missing_server_params() {
    let fixture = Fixture::new();
    let keyed = json!({
        "namespace": "keyed",
        "requiredServerParams": ["API_KEY"],
        "routes": { "ping": { "method": "GET", "path": "/ping" } }
    });
    fixture.schema("demo", "keyed.json", &keyed);
    fixture.group(&["demo/keyed.json"]);
    let plane = fixture.plane();

    let report = plane.run_live_tests(None, &LiveTestFilters::default()).await;
    assert!(!report.status, "{report:?}");
    let message = report.error.clone().expect("report error");
    assert!(message.contains("Missing env vars"), "{message}");
    assert!(message.contains("API_KEY"), "{message}");
    assert_eq!(report.failed, 1);
    assert_eq!(fixture.runtime.calls(), 0);

    fixture.write_env("API_KEY=secret\n");
    let report = plane.run_live_tests(None, &LiveTestFilters::default()).await;
    assert!(report.status, "{report:?}");
    assert!(report.error.is_none());
}

#[tokio::test]
async fn unparseable_project_config_leaves_no_active_tools() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.cwd.join(".flowmcp"))
        .unwrap_or_else(|err| panic!("failed to create project config dir: {err}"));
    std::fs::write(fixture.local_path(), r#"{ "defaultGroup": "dev", "#)
        .unwrap_or_else(|err| panic!("failed to write project config: {err}"));
    let plane = fixture.plane();

    let result = plane.call_tool("ping_demo", Map::new(), &CallOptions::default()).await;
    assert!(!result.status);
    let message = result.error.expect("error message");
    assert!(message.contains("No active tools"), "{message}");

    let tools = plane.resolve_active_tools(None).await.expect("resolution tolerates the config");
    assert!(tools.is_empty());

    let explicit = plane
        .call_tool("demo/demo.json::ping", Map::new(), &CallOptions::default())
        .await;
    assert!(explicit.status, "{explicit:?}");

    let status = plane.status().await;
    assert!(status.checks.iter().any(|check| {
        check.level == HealthLevel::Warn && check.message.contains("could not be read")
    }));
}

#[tokio::test]
async fn zero_ttl_preload_routes_cache_stale_entries() {
    let fixture = Fixture::new();
    let stale = json!({
        "namespace": "stale",
        "routes": {
            "snapshot": { "method": "GET", "path": "/snapshot", "preload": { "enabled": true, "ttl": 0 } }
        }
    });
    fixture.schema("demo", "stale.json", &stale);
    fixture.group(&["demo/stale.json"]);
    let plane = fixture.plane();

    for expected_calls in 1..=2 {
        let result = plane.call_tool("snapshot_stale", Map::new(), &CallOptions::default()).await;
        assert!(result.status, "{result:?}");
        let cache = result.cache.expect("cache metadata");
        assert!(!cache.hit);
        assert!(cache.stored);
        assert_eq!(cache.ttl, 0);
        assert_eq!(fixture.runtime.calls(), expected_calls);
    }
}

#[tokio::test]
async fn runtime_failures_without_server_params_carry_no_hint() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json"]);
    fixture.runtime.fail_with(RuntimeError::with_status(500, "boom"));
    let plane = fixture.plane();

    let result = plane.call_tool("ping_demo", Map::new(), &CallOptions::default()).await;
    assert!(!result.status);
    assert!(result.hint.is_none());
    assert!(result.cache.is_none());
}

#[tokio::test]
async fn dangling_default_group_fails_validation() {
    let fixture = Fixture::new();
    fixture.local(&json!({
        "defaultGroup": "x",
        "groups": { "dev": { "tools": ["demo/demo.json::ping"] } }
    }));
    let plane = fixture.plane();

    let report = plane.validate_schemas(None).await;
    assert!(!report.status);
    let message = report.error.expect("error message");
    assert!(message.contains("Default group"), "{message}");
    assert!(message.contains('x'), "{message}");
    assert!(message.contains("not found"), "{message}");

    let explicit = plane.validate_schemas(Some("dev")).await;
    assert!(explicit.status, "{explicit:?}");
}

#[tokio::test]
async fn validation_accepts_paths_and_sources() {
    let fixture = Fixture::new();
    fixture.schema("demo", "broken.json", &json!({ "namespace": "Broken", "routes": {} }));
    let plane = fixture.plane();

    let source = plane.validate_schemas(Some("demo")).await;
    assert_eq!(source.total, 2);
    assert_eq!(source.failed, 1);
    assert!(!source.status);

    let file = fixture.home.join("schemas/demo/demo.json");
    let single = plane.validate_schemas(Some(&file.display().to_string())).await;
    assert!(single.status, "{single:?}");
}

#[tokio::test]
async fn missing_global_config_is_not_initialized() {
    let fixture = Fixture::uninitialized();
    let plane = fixture.plane();

    let result = plane.call_tool("ping_demo", Map::new(), &CallOptions::default()).await;
    assert!(!result.status);
    assert!(result.error.is_some_and(|error| error.contains("not initialized")));
    assert!(plane.resolve_active_tools(None).await.is_err());
}

#[tokio::test]
async fn legacy_groups_are_migrated_on_write() {
    let fixture = Fixture::new();
    fixture.local(&json!({
        "defaultGroup": "dev",
        "custom": { "keep": true },
        "groups": { "dev": { "description": "legacy", "schemas": ["demo/demo.json::ping"] } }
    }));
    let plane = fixture.plane();

    let tools = plane.resolve_active_tools(None).await.expect("legacy group resolves");
    assert_eq!(tools.len(), 1);

    plane
        .add_tools("dev", &["demo/demo.json::getPrice".to_string(), "demo/demo.json::ping".to_string()])
        .await
        .expect("tools added");

    let raw = std::fs::read_to_string(fixture.local_path()).expect("local config written");
    let written: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(
        written["groups"]["dev"]["tools"],
        json!(["demo/demo.json::ping", "demo/demo.json::getPrice"])
    );
    assert!(written["groups"]["dev"].get("schemas").is_none());
    assert_eq!(written["custom"], json!({ "keep": true }));
}

#[tokio::test]
async fn group_lifecycle() {
    let fixture = Fixture::new();
    let plane = fixture.plane();

    let created = plane
        .create_group("dev", "first", &["demo/demo.json::ping".to_string()])
        .await
        .expect("group created");
    assert!(created.is_default);
    assert!(fixture.local_path().exists());

    plane.create_group("prod", "", &[]).await.expect("second group");
    assert!(plane.create_group("prod", "", &[]).await.is_err());
    assert!(plane.create_group("bad", "", &["nope".to_string()]).await.is_err());

    let groups = plane.list_groups().await.expect("groups listed");
    let names: Vec<&str> = groups.iter().map(|group| group.name.as_str()).collect();
    assert_eq!(names, vec!["dev", "prod"]);

    plane.set_default_group("prod").await.expect("default set");
    plane.delete_group("prod").await.expect("group deleted");
    let groups = plane.list_groups().await.expect("groups listed");
    assert_eq!(groups.len(), 1);
    assert!(!groups[0].is_default);
    assert!(plane.delete_group("prod").await.is_err());
}

#[tokio::test]
async fn live_tests_run_uncached_with_metadata_stripped() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json"]);
    let plane = fixture.plane();

    let report = plane.run_live_tests(None, &LiveTestFilters::default()).await;
    assert!(report.status, "{report:?}");
    assert_eq!(report.total, 1);
    assert_eq!(report.cases[0].tool, "get_price_demo");
    assert_eq!(report.cases[0].description.as_deref(), Some("btc price"));
    assert_eq!(fixture.runtime.last_call().parameters, args(json!({ "id": "btc" })));
    assert!(!fixture.home.join("cache").exists());

    let filtered = plane
        .run_live_tests(
            Some("demo/demo.json"),
            &LiveTestFilters {
                namespace: None,
                route: Some("ping".to_string()),
            },
        )
        .await;
    assert!(filtered.status);
    assert_eq!(filtered.total, 0);
}

#[tokio::test]
async fn status_reports_sources_and_active_group() {
    let fixture = Fixture::new();
    fixture.group(&["demo/demo.json"]);
    let plane = fixture.plane();

    let status = plane.status().await;
    assert!(status.status, "{status:?}");
    assert_eq!(status.sources.len(), 1);
    assert_eq!(status.sources[0].schema_files, 1);
    assert_eq!(status.active_group.as_deref(), Some("dev"));
    assert_eq!(status.active_tools, 2);
}

#[tokio::test]
async fn available_tools_span_every_source() {
    let fixture = Fixture::new();
    fixture.schema(
        "other",
        "nested/extra.json",
        &json!({ "namespace": "extra", "routes": { "listItems": { "method": "GET", "path": "/items" } } }),
    );
    let plane = fixture.plane();

    let names: Vec<String> = plane
        .list_available_tools()
        .await
        .into_iter()
        .map(|tool| tool.reference)
        .collect();
    assert_eq!(
        names,
        vec![
            "demo/demo.json::ping",
            "demo/demo.json::getPrice",
            "other/nested/extra.json::listItems",
        ]
    );
}
