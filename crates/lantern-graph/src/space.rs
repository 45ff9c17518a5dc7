//! Patch spaces: nested scopes presented to their parent as facade nodes.

use lantern_core::{SpaceId, ValidationError};
use lantern_store::{PlugOwner, SpaceRecord};
use log::debug;

use crate::error::SceneError;
use crate::scene::Scene;

impl Scene {
    /// Create a space nested in `parent`, shown there as a facade node.
    ///
    /// Spaces directly under the root belong to partitions and are created
    /// with them.
    pub fn add_space(&mut self, parent: SpaceId, name: &str) -> Result<SpaceId, SceneError> {
        self.ensure_running()?;
        if parent.is_root() {
            return Err(ValidationError::RootSpace.into());
        }
        if !self.store.spaces.contains(parent) {
            return Err(ValidationError::UnknownSpace { space: parent }.into());
        }
        let space = self
            .store
            .spaces
            .insert(SpaceRecord::new(Some(parent), name));
        debug!("added space {space} under {parent}");
        Ok(space)
    }

    /// Remove a nested space with everything inside it.
    pub fn remove_space(&mut self, space: SpaceId) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.editable_space(space)?;
        if self.is_partition_space(space) {
            return Err(ValidationError::PartitionSpace { space }.into());
        }
        self.remove_space_tree(space)
    }

    /// Remove `space`, its child spaces, nodes, and facade plugs.
    ///
    /// Facade plugs are removed last so their exterior edges in the parent
    /// are unwired after the interior has been emptied.
    pub(crate) fn remove_space_tree(&mut self, space: SpaceId) -> Result<(), SceneError> {
        for child in self.store.child_spaces(space) {
            self.remove_space_tree(child)?;
        }
        for node in self.store.nodes_in(space) {
            self.remove_instance(node)?;
        }
        for input in self.store.inputs_of(PlugOwner::Facade(space)) {
            self.remove_facade_input(input)?;
        }
        for output in self.store.outputs_of(PlugOwner::Facade(space)) {
            self.drop_facade_output(output)?;
        }
        self.store.spaces.remove(space);
        debug!("removed space {space}");
        Ok(())
    }

    /// Rename a space.
    pub fn rename_space(&mut self, space: SpaceId, name: &str) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.editable_space(space)?.name = name.to_owned();
        Ok(())
    }

    /// Move a space's facade node within its parent.
    pub fn position_space(&mut self, space: SpaceId, pos: [f64; 2]) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.editable_space(space)?.pos = pos;
        Ok(())
    }

    /// Set the pan and scale of the view inside a space.
    pub fn pan_space(&mut self, space: SpaceId, pan: [f64; 2], scale: f64) -> Result<(), SceneError> {
        self.ensure_running()?;
        let rec = self
            .store
            .spaces
            .get_mut(space)
            .ok_or(ValidationError::UnknownSpace { space })?;
        rec.pan = pan;
        rec.scale = scale;
        Ok(())
    }

    fn editable_space(&mut self, space: SpaceId) -> Result<&mut SpaceRecord, ValidationError> {
        if space.is_root() {
            return Err(ValidationError::RootSpace);
        }
        self.store
            .spaces
            .get_mut(space)
            .ok_or(ValidationError::UnknownSpace { space })
    }
}
