//! Test plugins and scene builders for Lantern development.
//!
//! Provides a small fixture plugin set ([`FixtureCore`], [`ExtraPlugin`],
//! [`FailingPlugin`], [`SwitchedCore`]) and a [`TestScene`] wrapper that builds a scene over
//! a fresh store and exposes the ids tests usually need.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    ComputeCounter, Constant, ExtraPlugin, FailingPlugin, FixtureCore, FloatSum, Mixer, Pass,
    SwitchedCore, CLASS_CONSTANT, CLASS_COUNTER, CLASS_EXTRA_PASS, CLASS_FLOAT_SUM, CLASS_MIXER, CLASS_PASS,
    FLOAT_TYPE, RGB_TYPE,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lantern_core::{ClassId, InputId, NodeId, OutputId, PluginId, SpaceId};
use lantern_graph::{Scene, SceneConfig};
use lantern_store::{PlugOwner, SceneStore};

/// A scene built over the fixture plugins.
pub struct TestScene {
    pub scene: Scene,
    /// Shared count of `Counter` compute calls.
    pub computes: Arc<AtomicUsize>,
}

impl TestScene {
    /// Core fixture only, over an empty store.
    pub fn new() -> Self {
        Self::build(SceneStore::new().expect("empty store"), false)
    }

    /// Core fixture plus [`ExtraPlugin`], which is recorded disabled on
    /// first sight and enabled here before a reload.
    pub fn with_extra() -> Self {
        let mut t = Self::build(SceneStore::new().expect("empty store"), true);
        let extra = t.plugin_id(ExtraPlugin::NAME);
        t.scene.enable_plugin(extra).expect("enable extra");
        t.scene.reconstruct().expect("reload with extra");
        t
    }

    /// Rebuild from an existing store, e.g. one read back from disk.
    pub fn from_store(store: SceneStore, extra: bool) -> Self {
        Self::build(store, extra)
    }

    fn build(store: SceneStore, extra: bool) -> Self {
        let computes = Arc::new(AtomicUsize::new(0));
        let mut config = SceneConfig::new(Box::new(FixtureCore::new(Arc::clone(&computes))));
        if extra {
            config = config.with_plugin(Box::new(ExtraPlugin));
        }
        let scene = Scene::new(config, store).expect("fixture scene");
        Self { scene, computes }
    }

    pub fn compute_calls(&self) -> usize {
        self.computes.load(Ordering::SeqCst)
    }

    pub fn plugin_id(&self, name: &str) -> PluginId {
        self.scene
            .store()
            .plugins
            .find(|p| p.name == name)
            .map(|p| p.id)
            .unwrap_or_else(|| panic!("no plugin named {name}"))
    }

    pub fn class(&self, name: &str) -> ClassId {
        self.scene
            .store()
            .classes
            .find(|c| c.name == name)
            .map(|c| c.id)
            .unwrap_or_else(|| panic!("no class named {name}"))
    }

    /// Add an instance of class `name` to `space`.
    pub fn add(&mut self, space: SpaceId, name: &str) -> NodeId {
        let class = self.class(name);
        self.scene
            .add_instance(space, class)
            .unwrap_or_else(|e| panic!("add {name}: {e}"))
    }

    pub fn input(&self, node: NodeId, n: usize) -> InputId {
        self.scene
            .store()
            .inputs
            .ids_where(|i| i.owner == PlugOwner::Node(node))
            .get(n)
            .copied()
            .unwrap_or_else(|| panic!("node {node} has no input {n}"))
    }

    pub fn output(&self, node: NodeId, n: usize) -> OutputId {
        self.scene
            .store()
            .outputs
            .ids_where(|o| o.owner == PlugOwner::Node(node))
            .get(n)
            .copied()
            .unwrap_or_else(|| panic!("node {node} has no output {n}"))
    }

    /// Set a `Constant` node's colour through the plugin request path.
    pub fn set_constant(&mut self, node: NodeId, rgb: [f64; 3]) {
        let core = self.scene.core_plugin().expect("core loaded");
        self.scene
            .plugin_request(
                core,
                &serde_json::json!({ "node": node.0, "rgb": rgb }),
            )
            .expect("set constant");
    }
}

impl Default for TestScene {
    fn default() -> Self {
        Self::new()
    }
}
