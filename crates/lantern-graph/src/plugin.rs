//! The plugin contract, registration, and enablement.

use std::any::Any;
use std::sync::Arc;

use lantern_core::{ClassId, DataTypeId, NodeId, PluginError, PluginId, Signal, ValidationError};
use lantern_store::{ClassRecord, DataTypeRecord, PluginRecord, PluginScope};
use log::{error, info, warn};
use serde_json::Value as Json;

use crate::class::{ClassSlot, NodeBehavior, NodeFactory};
use crate::error::SceneError;
use crate::scene::{Scene, ScenePhase};

/// A statically linked extension providing data types and node classes.
///
/// # Contract
///
/// - [`init`](Self::init) registers types and classes; registration is
///   rejected anywhere else.
/// - Registration is idempotent by `(plugin, name)`, so `init` runs
///   unchanged on every reconstruction.
/// - [`cleanup`](Self::cleanup) runs before the scene is torn down.
pub trait Plugin: Send + 'static {
    /// Unique name; plugin records are matched by it across restarts.
    fn name(&self) -> &str;

    /// Build digest. A changed digest disables a non-core plugin until the
    /// user re-enables it.
    fn digest(&self) -> &str {
        ""
    }

    /// Register types and classes.
    fn init(&mut self, init: &mut PluginInit<'_>) -> Result<(), PluginError>;

    /// Release plugin-wide resources before teardown.
    fn cleanup(&mut self) {}

    /// Answer a plugin-specific request.
    fn handle_request(
        &mut self,
        ctx: &mut PluginCtx<'_>,
        request: &Json,
    ) -> Result<Json, PluginError> {
        let _ = (ctx, request);
        Err(PluginError::Custom {
            reason: format!("plugin '{}' accepts no requests", self.name()),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PluginSlot {
    pub(crate) id: PluginId,
    pub(crate) provider: usize,
}

/// Registration access handed to [`Plugin::init`].
pub struct PluginInit<'a> {
    pub(crate) scene: &'a mut Scene,
    pub(crate) plugin: PluginId,
}

impl PluginInit<'_> {
    /// The plugin being initialized.
    pub fn plugin(&self) -> PluginId {
        self.plugin
    }

    /// Register a data type. See [`Scene::register_data_type`].
    pub fn register_data_type(&mut self, name: &str, desc: &str) -> Result<DataTypeId, PluginError> {
        self.scene.register_data_type(self.plugin, name, desc)
    }

    /// Register a node class. See [`Scene::register_node_class`].
    pub fn register_node_class(
        &mut self,
        name: &str,
        desc: &str,
        class_index: u32,
        factory: impl NodeFactory + 'static,
    ) -> Result<ClassId, PluginError> {
        self.scene
            .register_node_class(self.plugin, name, desc, class_index, Arc::new(factory))
    }

    /// A core data type by name.
    pub fn core_type(&self, name: &str) -> Option<DataTypeId> {
        self.scene.core_type(name)
    }

    /// The plugin's relational storage.
    pub fn db(&mut self) -> PluginScope<'_> {
        self.scene.store.plugin_db.scope(self.plugin)
    }
}

/// Scene access handed to [`Plugin::handle_request`].
pub struct PluginCtx<'a> {
    pub(crate) scene: &'a mut Scene,
    pub(crate) plugin: PluginId,
}

impl PluginCtx<'_> {
    /// The plugin handling the request.
    pub fn plugin(&self) -> PluginId {
        self.plugin
    }

    /// The payload of `node`, which must be an instance of one of this
    /// plugin's classes.
    pub fn instance_mut<T: NodeBehavior>(&mut self, node: NodeId) -> Result<&mut T, PluginError> {
        self.scene.instance_mut(self.plugin, node)
    }

    /// The current-frame value arriving at input `n` of `node`, or `None`
    /// if that input is not connected.
    pub fn input_value(&mut self, node: NodeId, n: usize) -> Result<Option<Signal>, PluginError> {
        let idx = self.scene.owned_node_slot(self.plugin, node)?;
        let connection = self
            .scene
            .nodes
            .get(idx)
            .and_then(|slot| slot.inputs.get(n).copied())
            .and_then(|input| self.scene.inputs.get(input))
            .and_then(|input| input.connection);
        Ok(connection.map(|output| self.scene.eval_output(output)))
    }

    /// The plugin's relational storage.
    pub fn db(&mut self) -> PluginScope<'_> {
        self.scene.store.plugin_db.scope(self.plugin)
    }
}

impl Scene {
    // ── Registration ─────────────────────────────────────────────

    fn check_registration(
        &self,
        plugin: PluginId,
        name: &str,
        what: &'static str,
    ) -> Result<(), PluginError> {
        if self.phase != ScenePhase::Init {
            return Err(PluginError::RegistrationOutsideInit { plugin });
        }
        if name.is_empty() {
            return Err(PluginError::EmptyName { what });
        }
        Ok(())
    }

    /// Register a data type for `plugin`, or return the existing one.
    ///
    /// Only valid while a plugin's `init` runs.
    pub fn register_data_type(
        &mut self,
        plugin: PluginId,
        name: &str,
        desc: &str,
    ) -> Result<DataTypeId, PluginError> {
        self.check_registration(plugin, name, "data type")?;
        if let Some(existing) = self
            .store
            .data_types
            .find(|t| t.plugin == plugin && t.name == name)
        {
            return Ok(existing.id);
        }
        Ok(self.store.data_types.insert(DataTypeRecord {
            id: DataTypeId::default(),
            plugin,
            name: name.to_owned(),
            desc: desc.to_owned(),
        }))
    }

    /// Register a node class for `plugin`, or return the existing one.
    ///
    /// A class already durable with a live slot is returned unchanged.
    /// Otherwise a class slot is allocated and its index written back.
    /// Only valid while a plugin's `init` runs.
    pub fn register_node_class(
        &mut self,
        plugin: PluginId,
        name: &str,
        desc: &str,
        class_index: u32,
        factory: Arc<dyn NodeFactory>,
    ) -> Result<ClassId, PluginError> {
        self.check_registration(plugin, name, "class")?;
        let existing = self
            .store
            .classes
            .find(|c| c.plugin == plugin && c.name == name)
            .map(|c| (c.id, c.arr_idx));
        let id = match existing {
            Some((id, Some(_))) => return Ok(id),
            Some((id, None)) => id,
            None => self.store.classes.insert(ClassRecord {
                id: ClassId::default(),
                plugin,
                name: name.to_owned(),
                desc: desc.to_owned(),
                class_index,
                arr_idx: None,
            }),
        };

        let (idx, slot) = self.classes.insert().map_err(|e| PluginError::Custom {
            reason: e.to_string(),
        })?;
        *slot = ClassSlot {
            plugin,
            factory: Some(factory),
            enabled: true,
        };
        if let Some(rec) = self.store.classes.get_mut(id) {
            rec.desc = desc.to_owned();
            rec.class_index = class_index;
            rec.arr_idx = Some(idx);
        }
        Ok(id)
    }

    /// A data type registered by the core plugin.
    pub fn core_type(&self, name: &str) -> Option<DataTypeId> {
        let core = self.core?;
        self.store
            .data_types
            .find(|t| t.plugin == core && t.name == name)
            .map(|t| t.id)
    }

    // ── Loading ──────────────────────────────────────────────────

    /// Load the plugin supplied at `provider`.
    ///
    /// Returns the plugin id if it loaded, `None` if it was skipped.
    pub(crate) fn load_plugin(
        &mut self,
        provider: usize,
        is_core: bool,
    ) -> Result<Option<PluginId>, SceneError> {
        let Some(p) = self.providers.get(provider).and_then(Option::as_ref) else {
            return Ok(None);
        };
        let name = p.name().to_owned();
        let digest = p.digest().to_owned();
        if name.is_empty() {
            return Err(PluginError::EmptyName { what: "plugin" }.into());
        }

        let id = match self.store.plugins.find(|r| r.name == name) {
            Some(r) => r.id,
            None => {
                info!(
                    "recording new plugin '{name}' ({})",
                    if is_core { "enabled" } else { "disabled" }
                );
                self.store.plugins.insert(PluginRecord {
                    id: PluginId::default(),
                    name: name.clone(),
                    digest: digest.clone(),
                    enabled: is_core,
                    loaded: false,
                })
            }
        };

        let record = self.store.plugins.require_mut(id)?;
        if record.loaded {
            warn!("plugin '{name}' is already loaded, skipping duplicate");
            return Ok(None);
        }
        if is_core {
            record.enabled = true;
            record.digest = digest;
            self.core = Some(id);
        } else if record.digest != digest {
            if record.enabled {
                warn!("plugin '{name}' changed since it was enabled, disabling");
                record.enabled = false;
            }
            record.digest = digest;
        }
        if !record.enabled {
            info!("plugin '{name}' is disabled, not loading");
            return Ok(None);
        }

        let taken = self.providers.get_mut(provider).and_then(Option::take);
        let Some(mut plugin) = taken else {
            return Ok(None);
        };
        let resume = self.phase;
        self.phase = ScenePhase::Init;
        let result = plugin.init(&mut PluginInit { scene: self, plugin: id });
        self.phase = resume;
        self.providers[provider] = Some(plugin);
        if let Err(e) = result {
            error!("plugin '{name}' failed to initialize: {e}");
            self.set_plugin_classes_enabled(id, false);
            self.store.plugin_db.finalize_all(id);
            return Err(PluginError::InitFailed {
                plugin: name,
                reason: e.to_string(),
            }
            .into());
        }

        self.plugins.insert_with(PluginSlot { id, provider })?;
        if let Some(rec) = self.store.plugins.get_mut(id) {
            rec.loaded = true;
        }
        info!("loaded plugin '{name}' as {id}");
        Ok(Some(id))
    }

    /// Run every loaded plugin's cleanup and release its statements.
    pub(crate) fn cleanup_plugins(&mut self) {
        let loaded: Vec<PluginSlot> = self.plugins.iter().map(|(_, s)| s.clone()).collect();
        for slot in loaded.into_iter().rev() {
            if let Some(plugin) = self.providers.get_mut(slot.provider).and_then(Option::as_mut) {
                plugin.cleanup();
            }
            self.store.plugin_db.finalize_all(slot.id);
        }
        self.plugins.clear();
    }

    // ── Enablement ───────────────────────────────────────────────

    /// Enable `plugin`.
    ///
    /// A plugin that is already loaded is re-enabled immediately; one that
    /// never loaded takes effect at the next reconstruction. Returns
    /// whether the plugin is live now.
    pub fn enable_plugin(&mut self, plugin: PluginId) -> Result<bool, SceneError> {
        self.ensure_running()?;
        let record = self
            .store
            .plugins
            .get_mut(plugin)
            .ok_or(ValidationError::UnknownPlugin { plugin })?;
        record.enabled = true;
        let loaded = record.loaded;
        if loaded {
            self.set_plugin_classes_enabled(plugin, true);
        } else {
            info!("plugin {plugin} enabled; it loads on the next reload");
        }
        Ok(loaded)
    }

    /// Disable `plugin`. Its outputs read as empty and its classes can no
    /// longer be wired or instantiated.
    pub fn disable_plugin(&mut self, plugin: PluginId) -> Result<(), SceneError> {
        self.ensure_running()?;
        if Some(plugin) == self.core {
            return Err(ValidationError::CorePluginLocked.into());
        }
        let record = self
            .store
            .plugins
            .get_mut(plugin)
            .ok_or(ValidationError::UnknownPlugin { plugin })?;
        record.enabled = false;
        self.set_plugin_classes_enabled(plugin, false);
        info!("plugin {plugin} disabled");
        Ok(())
    }

    /// Forward `request` to `plugin`'s request handler.
    pub fn plugin_request(&mut self, plugin: PluginId, request: &Json) -> Result<Json, SceneError> {
        self.ensure_running()?;
        if !self.store.plugins.contains(plugin) {
            return Err(ValidationError::UnknownPlugin { plugin }.into());
        }
        let provider = self
            .plugins
            .iter()
            .find(|(_, s)| s.id == plugin)
            .map(|(_, s)| s.provider)
            .ok_or_else(|| PluginError::Custom {
                reason: format!("plugin {plugin} is not loaded"),
            })?;
        let taken = self.providers.get_mut(provider).and_then(Option::take);
        let Some(mut handler) = taken else {
            return Err(PluginError::Custom {
                reason: format!("plugin {plugin} is busy"),
            }
            .into());
        };
        let result = handler.handle_request(&mut PluginCtx { scene: self, plugin }, request);
        self.providers[provider] = Some(handler);
        Ok(result?)
    }

    // ── Instances ────────────────────────────────────────────────

    /// The live slot of `node`, which must belong to one of `plugin`'s
    /// classes.
    fn owned_node_slot(&self, plugin: PluginId, node: NodeId) -> Result<usize, PluginError> {
        let rec = self
            .store
            .nodes
            .get(node)
            .ok_or(PluginError::ForeignInstance { plugin, node })?;
        let owner = self.store.classes.get(rec.class).map(|c| c.plugin);
        if owner != Some(plugin) {
            return Err(PluginError::ForeignInstance { plugin, node });
        }
        rec.arr_idx.ok_or(PluginError::PayloadType { node })
    }

    /// The payload of `node`, checked against the calling plugin.
    pub fn instance_mut<T: NodeBehavior>(
        &mut self,
        plugin: PluginId,
        node: NodeId,
    ) -> Result<&mut T, PluginError> {
        let idx = self.owned_node_slot(plugin, node)?;
        let behavior = self
            .nodes
            .get_mut(idx)
            .and_then(|slot| slot.behavior.as_mut())
            .ok_or(PluginError::PayloadType { node })?;
        let any: &mut dyn Any = &mut **behavior;
        any.downcast_mut::<T>().ok_or(PluginError::PayloadType { node })
    }
}
