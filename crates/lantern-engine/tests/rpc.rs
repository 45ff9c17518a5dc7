//! Integration tests: the JSON request surface against a core-plugin scene.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lantern_core::{PluginError, UniverseId};
use lantern_engine::dispatch;
use lantern_graph::{Plugin, PluginCtx, PluginInit, Scene, SceneConfig};
use lantern_plugins::CorePlugin;
use lantern_store::SceneStore;
use serde_json::{json, Value};

/// The core plugin, failing `init` while `fail` is set.
struct SwitchedCore {
    core: CorePlugin,
    fail: Arc<AtomicBool>,
}

impl Plugin for SwitchedCore {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn digest(&self) -> &str {
        self.core.digest()
    }

    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PluginError::Custom {
                reason: "boom".into(),
            });
        }
        self.core.init(init)
    }

    fn cleanup(&mut self) {
        self.core.cleanup();
    }

    fn handle_request(
        &mut self,
        ctx: &mut PluginCtx<'_>,
        request: &Value,
    ) -> Result<Value, PluginError> {
        self.core.handle_request(ctx, request)
    }
}

struct Client {
    scene: Scene,
}

impl Client {
    fn new() -> Self {
        Self::with_core(Box::new(CorePlugin::new()))
    }

    fn with_core(core: Box<dyn Plugin>) -> Self {
        let config = SceneConfig::new(core);
        Self {
            scene: Scene::new(config, SceneStore::new().unwrap()).unwrap(),
        }
    }

    fn call(&mut self, request: Value) -> Value {
        dispatch(&mut self.scene, &request)
    }

    fn ok(&mut self, request: Value) -> Value {
        let response = self.call(request.clone());
        assert_eq!(
            response["success"],
            json!(true),
            "{request} failed: {response}"
        );
        response
    }

    fn error(&mut self, request: Value) -> String {
        let response = self.call(request.clone());
        response["error"]
            .as_str()
            .unwrap_or_else(|| panic!("{request} unexpectedly succeeded: {response}"))
            .to_owned()
    }

    fn class(&mut self, name: &str) -> Value {
        let library = self.ok(json!({"method": "library"}));
        library["library"][0]["classes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == name)
            .map(|c| c["id"].clone())
            .unwrap_or_else(|| panic!("no class {name}"))
    }

    fn partition(&mut self, name: &str) -> (Value, Value) {
        let id = self.ok(json!({"method": "create_partition", "name": name}))["partition"].clone();
        let partitions = self.ok(json!({"method": "partitions"}));
        let space = partitions["partitions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"] == id)
            .map(|p| p["space"].clone())
            .unwrap();
        (id, space)
    }

    fn add(&mut self, space: &Value, class: &str) -> Value {
        let class = self.class(class);
        self.ok(json!({"method": "add_node", "space": space, "class": class}))["node"].clone()
    }

    fn node<'a>(view: &'a Value, node: &Value) -> &'a Value {
        view["patch_space"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| &n["id"] == node)
            .unwrap()
    }

    fn output(&mut self, space: &Value, node: &Value) -> Value {
        let view = self.ok(json!({"method": "patch_space", "space": space}));
        Self::node(&view, node)["outputs"][0]["id"].clone()
    }

    fn input(&mut self, space: &Value, node: &Value) -> Value {
        let view = self.ok(json!({"method": "patch_space", "space": space}));
        Self::node(&view, node)["inputs"][0]["id"].clone()
    }
}

#[test]
fn channel_scenario_over_requests() {
    let mut c = Client::new();
    let (partition, space) = c.partition("Stage");
    let generator = c.add(&space, "RGB Generator");
    let viewer = c.add(&space, "RGB Viewer");

    let out = c.output(&space, &generator);
    let input = c.input(&space, &viewer);
    c.ok(json!({"method": "wire", "source": {"Output": out}, "sink": {"Input": input}}));

    let channel = c.ok(json!({
        "method": "create_channel",
        "partition": partition,
        "name": "Wash",
        "mode": "Rgb",
        "addresses": [
            {"universe": 1, "address": 0},
            {"universe": 1, "address": 1},
            {"universe": 1, "address": 2}
        ]
    }))["channel"]
        .clone();
    let partitions = c.ok(json!({"method": "partitions"}));
    let facade = partitions["partitions"][0]["channels"][0]["output"].clone();
    assert_eq!(partitions["partitions"][0]["channels"][0]["id"], channel);
    c.ok(json!({"method": "wire", "source": {"Output": out}, "sink": {"FacadeOut": facade}}));

    let core = c.ok(json!({"method": "plugins"}))["plugins"][0]["id"].clone();
    c.ok(json!({
        "method": "plugin_request",
        "plugin": core,
        "payload": {"method": "set_rgb_gen", "node": generator, "value": {"r": 1.0, "g": 0.0, "b": 0.5}}
    }));

    c.scene.render_frame();
    assert_eq!(
        c.scene.universe_buffer(UniverseId(1)),
        Some(&[0xff, 0x00, 0x80][..])
    );

    let view = c.ok(json!({
        "method": "plugin_request",
        "plugin": core,
        "payload": {"method": "get_view", "node": viewer}
    }));
    assert_eq!(
        view["response"]["value"],
        json!({"r": 1.0, "g": 0.0, "b": 0.5})
    );
}

#[test]
fn rejected_wire_reports_error() {
    let mut c = Client::new();
    let (_, space) = c.partition("Stage");
    let int = c.add(&space, "Integer Generator");
    let viewer = c.add(&space, "Float Viewer");
    let out = c.output(&space, &int);
    let input = c.input(&space, &viewer);
    let err = c.error(json!({"method": "wire", "source": {"Output": out}, "sink": {"Input": input}}));
    assert!(err.contains("type mismatch"), "{err}");

    let view = c.ok(json!({"method": "patch_space", "space": space}));
    assert!(view["patch_space"]["edges"].as_array().unwrap().is_empty());
}

#[test]
fn malformed_requests_are_errors() {
    let mut c = Client::new();
    assert!(c.error(json!({"method": "teleport"})).starts_with("malformed request"));
    assert!(c.error(json!({"method": "delete_node"})).starts_with("malformed request"));
    assert!(c.error(json!([1, 2, 3])).starts_with("malformed request"));
}

#[test]
fn facade_editing_round_trip() {
    let mut c = Client::new();
    let (_, space) = c.partition("Stage");
    let child = c.ok(json!({"method": "add_facade", "parent": space, "name": "Group"}))["space"]
        .clone();
    c.ok(json!({"method": "rename_facade", "space": child, "name": "Front"}));
    c.ok(json!({"method": "position_facade", "space": child, "pos": [10.0, 20.0]}));
    c.ok(json!({"method": "pan_patch_space", "space": child, "pan": [1.0, 2.0], "scale": 0.5}));
    let input = c.ok(json!({"method": "create_facade_in", "space": child, "name": "In"}))["input"]
        .clone();
    let output =
        c.ok(json!({"method": "create_facade_out", "space": child, "name": "Out"}))["output"]
            .clone();
    c.ok(json!({"method": "rename_facade_in", "input": input, "name": "Colour In"}));
    c.ok(json!({"method": "rename_facade_out", "output": output, "name": "Colour Out"}));

    let parent = c.ok(json!({"method": "patch_space", "space": space}));
    let facade = &parent["patch_space"]["facades"][0];
    assert_eq!(facade["name"], "Front");
    assert_eq!(facade["pos"], json!([10.0, 20.0]));
    assert_eq!(facade["inputs"][0]["name"], "Colour In");

    let inner = c.ok(json!({"method": "patch_space", "space": child}));
    assert_eq!(inner["patch_space"]["scale"], json!(0.5));
    assert_eq!(inner["patch_space"]["facade_outputs"][0]["name"], "Colour Out");

    c.ok(json!({"method": "delete_facade_in", "input": input}));
    c.ok(json!({"method": "delete_facade_out", "output": output}));
    c.ok(json!({"method": "delete_facade", "space": child}));
    let parent = c.ok(json!({"method": "patch_space", "space": space}));
    assert!(parent["patch_space"]["facades"].as_array().unwrap().is_empty());
}

#[test]
fn node_editing_round_trip() {
    let mut c = Client::new();
    let (_, space) = c.partition("Stage");
    let node = c.add(&space, "Float Generator");
    c.ok(json!({"method": "rename_node", "node": node, "name": "Dimmer"}));
    c.ok(json!({"method": "position_node", "node": node, "pos": [3.0, 4.0]}));
    c.ok(json!({"method": "set_node_colour", "node": node, "colour": "#ff8800"}));

    let view = c.ok(json!({"method": "patch_space", "space": space}));
    let shown = Client::node(&view, &node);
    assert_eq!(shown["name"], "Dimmer");
    assert_eq!(shown["pos"], json!([3.0, 4.0]));
    assert_eq!(shown["colour"], "#ff8800");

    c.ok(json!({"method": "delete_node", "node": node}));
    let view = c.ok(json!({"method": "patch_space", "space": space}));
    assert!(view["patch_space"]["nodes"].as_array().unwrap().is_empty());
    assert!(c
        .error(json!({"method": "rename_node", "node": node, "name": "Gone"}))
        .contains("unknown node"));
}

#[test]
fn partition_and_channel_editing() {
    let mut c = Client::new();
    let (partition, _) = c.partition("Stage");
    c.ok(json!({
        "method": "update_partition",
        "partition": partition,
        "name": "Main Stage",
        "image": "stage.png"
    }));
    let channel = c.ok(json!({
        "method": "create_channel",
        "partition": partition,
        "name": "Dim",
        "mode": "Single",
        "addresses": [{"universe": 4, "address": 5}]
    }))["channel"]
        .clone();
    c.ok(json!({
        "method": "update_channel",
        "channel": channel,
        "name": "Dimmer",
        "mode": "Single",
        "addresses": [{"universe": 4, "address": 9, "sixteen_bit": true}]
    }));
    let err = c.error(json!({
        "method": "update_channel",
        "channel": channel,
        "name": "Dimmer",
        "mode": "Rgb",
        "addresses": [{"universe": 4, "address": 9}]
    }));
    assert!(err.contains("expected 3 addresses"), "{err}");

    let partitions = c.ok(json!({"method": "partitions"}));
    let shown = &partitions["partitions"][0];
    assert_eq!(shown["name"], "Main Stage");
    assert_eq!(shown["image"], "stage.png");
    assert_eq!(shown["channels"][0]["name"], "Dimmer");
    assert_eq!(shown["channels"][0]["addresses"][0]["address"], 9);

    c.ok(json!({"method": "delete_channel", "channel": channel}));
    c.ok(json!({"method": "delete_partition", "partition": partition}));
    let partitions = c.ok(json!({"method": "partitions"}));
    assert!(partitions["partitions"].as_array().unwrap().is_empty());
}

#[test]
fn core_plugin_cannot_be_disabled() {
    let mut c = Client::new();
    let core = c.ok(json!({"method": "plugins"}))["plugins"][0]["id"].clone();
    let err = c.error(json!({"method": "disable_plugin", "plugin": core}));
    assert!(err.contains("core plugin"), "{err}");
    let live = c.ok(json!({"method": "enable_plugin", "plugin": core}));
    assert_eq!(live["live"], json!(true));
}

#[test]
fn reload_rebuilds_from_store() {
    let mut c = Client::new();
    let (_, space) = c.partition("Stage");
    let node = c.add(&space, "Integer Generator");
    let core = c.ok(json!({"method": "plugins"}))["plugins"][0]["id"].clone();
    c.ok(json!({
        "method": "plugin_request",
        "plugin": core,
        "payload": {"method": "set_int_gen", "node": node, "value": 12}
    }));
    c.scene.render_frame();
    assert!(c.scene.frame().0 > 0);

    c.ok(json!({"method": "reload"}));
    assert_eq!(c.scene.frame().0, 0);
    let got = c.ok(json!({
        "method": "plugin_request",
        "plugin": core,
        "payload": {"method": "get_int_gen", "node": node}
    }));
    assert_eq!(got["response"]["value"], json!(12));
}

#[test]
fn failed_reload_refuses_edits_until_reloaded() {
    let fail = Arc::new(AtomicBool::new(false));
    let mut c = Client::with_core(Box::new(SwitchedCore {
        core: CorePlugin::new(),
        fail: Arc::clone(&fail),
    }));
    c.partition("Stage");

    fail.store(true, Ordering::SeqCst);
    let err = c.error(json!({"method": "reload"}));
    assert!(err.starts_with("reload failed"), "{err}");
    let err = c.error(json!({"method": "create_partition", "name": "Balcony"}));
    assert!(err.contains("halted"), "{err}");
    let partitions = c.ok(json!({"method": "partitions"}));
    assert_eq!(partitions["partitions"].as_array().unwrap().len(), 1);
    c.scene.render_frame();
    assert_eq!(c.scene.frame().0, 0);

    fail.store(false, Ordering::SeqCst);
    c.ok(json!({"method": "reload"}));
    c.ok(json!({"method": "create_partition", "name": "Balcony"}));
    let plugins = c.ok(json!({"method": "plugins"}));
    assert_eq!(plugins["plugins"][0]["loaded"], json!(true));
}
