//! Node classes and the per-instance behavior contract.

use std::any::Any;
use std::sync::Arc;

use lantern_core::{ClassId, DataTypeId, InputId, NodeId, OutputId, PluginError, PluginId, Signal};
use lantern_store::PluginScope;

use crate::eval::Pull;
use crate::scene::Scene;

/// Per-instance state and callbacks of a node class.
///
/// One boxed behavior lives in each node's arena slot. The scene calls
/// [`make`](Self::make) once when the node is created, then
/// [`restore`](Self::restore) on creation and on every reconstruction.
/// [`delete`](Self::delete) runs before the node's records are removed and
/// [`clean`](Self::clean) when its slot is released.
pub trait NodeBehavior: Any + Send {
    /// Create the node's plugs and any durable state.
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError>;

    /// Load durable state into the payload.
    fn restore(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let _ = ctx;
        Ok(())
    }

    /// Release runtime resources. Durable state stays.
    fn clean(&mut self) {}

    /// Remove durable state; the node is being deleted.
    fn delete(&mut self, ctx: &mut NodeCtx<'_>) {
        let _ = ctx;
    }

    /// Produce the value of the output created with compute index `func`.
    fn compute(&mut self, func: u32, pull: &mut Pull<'_>) -> Signal;
}

/// Creates fresh behaviors for one class.
pub trait NodeFactory: Send + Sync {
    /// A new, unconfigured payload.
    fn instantiate(&self) -> Box<dyn NodeBehavior>;
}

impl<F> NodeFactory for F
where
    F: Fn() -> Box<dyn NodeBehavior> + Send + Sync,
{
    fn instantiate(&self) -> Box<dyn NodeBehavior> {
        self()
    }
}

#[derive(Default)]
pub(crate) struct ClassSlot {
    pub(crate) plugin: PluginId,
    pub(crate) factory: Option<Arc<dyn NodeFactory>>,
    pub(crate) enabled: bool,
}

/// Scene access handed to node callbacks.
pub struct NodeCtx<'a> {
    pub(crate) scene: &'a mut Scene,
    pub(crate) node: NodeId,
    pub(crate) plugin: PluginId,
}

impl NodeCtx<'_> {
    /// The node being called back.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The plugin owning the node's class.
    pub fn plugin(&self) -> PluginId {
        self.plugin
    }

    /// Add an input plug to the node.
    pub fn add_input(&mut self, name: &str, type_id: DataTypeId) -> Result<InputId, PluginError> {
        self.scene
            .add_instance_input(self.node, name, type_id)
            .map_err(|e| callback_error(self.node, e))
    }

    /// Add an output plug computed by `func`.
    pub fn add_output(
        &mut self,
        name: &str,
        type_id: DataTypeId,
        func: u32,
    ) -> Result<OutputId, PluginError> {
        self.scene
            .add_instance_output(self.node, name, type_id, func)
            .map_err(|e| callback_error(self.node, e))
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

fn callback_error(node: NodeId, e: crate::error::SceneError) -> PluginError {
    match e {
        crate::error::SceneError::Plugin(p) => p,
        other => PluginError::Callback {
            node,
            reason: other.to_string(),
        },
    }
}

impl Scene {
    pub(crate) fn class_slot(&self, class: ClassId) -> Option<&ClassSlot> {
        let idx = self.store.classes.get(class)?.arr_idx?;
        self.classes.get(idx)
    }

    /// Whether instances of `class` may be built, wired, and evaluated.
    pub fn class_enabled(&self, class: ClassId) -> bool {
        self.class_slot(class).is_some_and(|c| c.enabled)
    }

    pub(crate) fn set_plugin_classes_enabled(&mut self, plugin: PluginId, enabled: bool) {
        for (_, slot) in self.classes.iter_mut() {
            if slot.plugin == plugin {
                slot.enabled = enabled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nop;

    impl NodeBehavior for Nop {
        fn make(&mut self, _ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
            Ok(())
        }

        fn compute(&mut self, _func: u32, _pull: &mut Pull<'_>) -> Signal {
            Signal::Float(1.0)
        }
    }

    #[test]
    fn closures_are_factories() {
        let factory: Arc<dyn NodeFactory> = Arc::new(|| Box::new(Nop) as Box<dyn NodeBehavior>);
        let behavior = factory.instantiate();
        let any: &dyn Any = &*behavior;
        assert!(any.downcast_ref::<Nop>().is_some());
    }

    #[test]
    fn default_class_slot_is_disabled() {
        let slot = ClassSlot::default();
        assert!(!slot.enabled);
        assert!(slot.factory.is_none());
    }
}
