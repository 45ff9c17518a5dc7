//! Live plug slots and facade plug editing.
//!
//! Only concrete plugs occupy arena slots. Facade plugs exist as records
//! alone: they carry an alias one layer inward and are resolved by
//! [`trace`](crate::Scene::trace_input) whenever they are used.

use lantern_core::{
    DataTypeId, FrameId, InputId, OutputId, PlugRef, Signal, SpaceId, ValidationError,
};
use lantern_store::{EdgeSink, EdgeSource, InputRecord, OutputRecord, PlugOwner};
use log::debug;

use crate::error::SceneError;
use crate::scene::Scene;

/// A concrete input in the input arena.
#[derive(Clone, Debug, Default)]
pub struct InputSlot {
    /// Record id.
    pub id: InputId,
    /// Owning node's slot.
    pub node: usize,
    /// Carried type.
    pub type_id: Option<DataTypeId>,
    /// Slot of the output feeding this input.
    pub connection: Option<usize>,
}

/// A concrete output in the output arena.
#[derive(Clone, Debug, Default)]
pub struct OutputSlot {
    /// Record id.
    pub id: OutputId,
    /// Owning node's slot.
    pub node: usize,
    /// Carried type.
    pub type_id: Option<DataTypeId>,
    /// Compute function index.
    pub func: u32,
    /// Frame the cached value was computed in.
    pub last_frame: Option<FrameId>,
    /// Cached value.
    pub value: Signal,
    /// Set while the compute function is on the stack.
    pub(crate) evaluating: bool,
}

impl Scene {
    /// The live slot behind concrete input `input`.
    pub fn input_slot(&self, input: InputId) -> Option<&InputSlot> {
        let idx = self.store.inputs.get(input)?.arr_idx?;
        self.inputs.get(idx)
    }

    /// The live slot behind concrete output `output`.
    pub fn output_slot(&self, output: OutputId) -> Option<&OutputSlot> {
        let idx = self.store.outputs.get(output)?.arr_idx?;
        self.outputs.get(idx)
    }

    /// The output currently feeding concrete input `input`.
    pub fn connection_of(&self, input: InputId) -> Option<OutputId> {
        let idx = self.input_slot(input)?.connection?;
        self.outputs.get(idx).map(|o| o.id)
    }

    pub(crate) fn facade_input(
        &self,
        input: InputId,
    ) -> Result<(&InputRecord, SpaceId), ValidationError> {
        let rec = self
            .store
            .inputs
            .get(input)
            .ok_or(ValidationError::UnknownPlug {
                plug: PlugRef::Input(input),
            })?;
        match rec.owner {
            PlugOwner::Facade(space) => Ok((rec, space)),
            PlugOwner::Node(_) => Err(ValidationError::WrongPlugKind {
                plug: PlugRef::Input(input),
                expected_facade: true,
            }),
        }
    }

    pub(crate) fn facade_output(
        &self,
        output: OutputId,
    ) -> Result<(&OutputRecord, SpaceId), ValidationError> {
        let rec = self
            .store
            .outputs
            .get(output)
            .ok_or(ValidationError::UnknownPlug {
                plug: PlugRef::Output(output),
            })?;
        match rec.owner {
            PlugOwner::Facade(space) => Ok((rec, space)),
            PlugOwner::Node(_) => Err(ValidationError::WrongPlugKind {
                plug: PlugRef::Output(output),
                expected_facade: true,
            }),
        }
    }

    fn facade_space(&self, space: SpaceId) -> Result<(), ValidationError> {
        if space.is_root() {
            return Err(ValidationError::RootSpace);
        }
        if !self.store.spaces.contains(space) {
            return Err(ValidationError::UnknownSpace { space });
        }
        Ok(())
    }

    // ── Facade inputs ────────────────────────────────────────────

    /// Add an unaliased facade input to `space`.
    pub fn add_facade_input(&mut self, space: SpaceId, name: &str) -> Result<InputId, SceneError> {
        self.ensure_running()?;
        self.facade_space(space)?;
        let id = self.store.inputs.insert(InputRecord {
            id: InputId::default(),
            owner: PlugOwner::Facade(space),
            type_id: None,
            name: name.to_owned(),
            aliased: None,
            arr_idx: None,
        });
        debug!("added facade input {id} to space {space}");
        Ok(id)
    }

    /// Remove a facade input, unwiring both of its faces first.
    pub fn remove_facade_input(&mut self, input: InputId) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.facade_input(input)?;
        for edge in self.store.edges_into(EdgeSink::Input(input)) {
            self.unwire(edge)?;
        }
        for edge in self.store.edges_from(EdgeSource::FacadeIn(input)) {
            self.unwire(edge)?;
        }
        self.store.inputs.remove(input);
        debug!("removed facade input {input}");
        Ok(())
    }

    /// Rename a facade input.
    pub fn rename_facade_input(&mut self, input: InputId, name: &str) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.facade_input(input)?;
        self.store.inputs.require_mut(input)?.name = name.to_owned();
        Ok(())
    }

    // ── Facade outputs ───────────────────────────────────────────

    /// Add an unaliased facade output to `space`.
    pub fn add_facade_output(&mut self, space: SpaceId, name: &str) -> Result<OutputId, SceneError> {
        self.ensure_running()?;
        self.facade_space(space)?;
        let id = self.store.outputs.insert(OutputRecord {
            id: OutputId::default(),
            owner: PlugOwner::Facade(space),
            type_id: None,
            name: name.to_owned(),
            func: 0,
            aliased: None,
            arr_idx: None,
        });
        debug!("added facade output {id} to space {space}");
        Ok(id)
    }

    /// Remove a facade output, unwiring both of its faces first.
    ///
    /// A channel's output is removed with its channel instead.
    pub fn remove_facade_output(&mut self, output: OutputId) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.facade_output(output)?;
        if self.store.channel_of_output(output).is_some() {
            return Err(ValidationError::ChannelOutput { output }.into());
        }
        self.drop_facade_output(output)
    }

    pub(crate) fn drop_facade_output(&mut self, output: OutputId) -> Result<(), SceneError> {
        for edge in self.store.edges_from(EdgeSource::Output(output)) {
            self.unwire(edge)?;
        }
        for edge in self.store.edges_into(EdgeSink::FacadeOut(output)) {
            self.unwire(edge)?;
        }
        self.store.outputs.remove(output);
        debug!("removed facade output {output}");
        Ok(())
    }

    /// Rename a facade output.
    pub fn rename_facade_output(&mut self, output: OutputId, name: &str) -> Result<(), SceneError> {
        self.ensure_running()?;
        self.facade_output(output)?;
        self.store.outputs.require_mut(output)?.name = name.to_owned();
        Ok(())
    }
}
