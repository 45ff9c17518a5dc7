//! Wiring, unwiring, and trace.
//!
//! An edge joins two plug faces drawn in the same space:
//!
//! ```text
//! source                              sink
//! Output(o)   node output, or  ─────▶ Input(i)      node input, or
//!             child facade exterior                 child facade exterior
//! FacadeIn(f) interior face of  ────▶ FacadeOut(f)  interior face of
//!             this space's input                    this space's output
//! ```
//!
//! Interior edges set a facade's alias; concrete edges (both ends
//! `Output`/`Input`) set `connection` on the traced input slot.

use lantern_core::{EdgeId, InputId, OutputId, PlugRef, SpaceId, ValidationError};
use lantern_store::{EdgeRecord, EdgeSink, EdgeSource, PlugOwner};
use log::debug;

use crate::error::SceneError;
use crate::scene::Scene;

impl Scene {
    // ── Trace ────────────────────────────────────────────────────

    /// Follow facade aliases inward from `input` to the concrete input it
    /// stands for.
    pub fn resolve_input(&self, input: InputId) -> Result<InputId, ValidationError> {
        let mut current = input;
        for _ in 0..=self.store.spaces.len() {
            let rec = self
                .store
                .inputs
                .get(current)
                .ok_or(ValidationError::UnknownPlug {
                    plug: PlugRef::Input(current),
                })?;
            match rec.owner {
                PlugOwner::Node(_) => return Ok(current),
                PlugOwner::Facade(_) => {
                    current = rec.aliased.ok_or(ValidationError::UnaliasedFacade {
                        plug: PlugRef::Input(current),
                    })?;
                }
            }
        }
        Err(ValidationError::UnaliasedFacade {
            plug: PlugRef::Input(input),
        })
    }

    /// Follow facade aliases inward from `output` to the concrete output it
    /// stands for.
    pub fn resolve_output(&self, output: OutputId) -> Result<OutputId, ValidationError> {
        let mut current = output;
        for _ in 0..=self.store.spaces.len() {
            let rec = self
                .store
                .outputs
                .get(current)
                .ok_or(ValidationError::UnknownPlug {
                    plug: PlugRef::Output(current),
                })?;
            match rec.owner {
                PlugOwner::Node(_) => return Ok(current),
                PlugOwner::Facade(_) => {
                    current = rec.aliased.ok_or(ValidationError::UnaliasedFacade {
                        plug: PlugRef::Output(current),
                    })?;
                }
            }
        }
        Err(ValidationError::UnaliasedFacade {
            plug: PlugRef::Output(output),
        })
    }

    /// The input arena slot `input` resolves to.
    ///
    /// Fails if a facade layer is unaliased, a record is missing, or the
    /// concrete plug has no live slot because its class is not loaded.
    pub fn trace_input(&self, input: InputId) -> Result<usize, ValidationError> {
        let concrete = self.resolve_input(input)?;
        self.store
            .inputs
            .get(concrete)
            .and_then(|r| r.arr_idx)
            .filter(|&idx| self.inputs.is_live(idx))
            .ok_or(ValidationError::PlugNotLive {
                plug: PlugRef::Input(concrete),
            })
    }

    /// The output arena slot `output` resolves to.
    pub fn trace_output(&self, output: OutputId) -> Result<usize, ValidationError> {
        let concrete = self.resolve_output(output)?;
        self.store
            .outputs
            .get(concrete)
            .and_then(|r| r.arr_idx)
            .filter(|&idx| self.outputs.is_live(idx))
            .ok_or(ValidationError::PlugNotLive {
                plug: PlugRef::Output(concrete),
            })
    }

    fn check_owner_enabled(&self, owner: PlugOwner) -> Result<(), ValidationError> {
        let PlugOwner::Node(node) = owner else {
            return Ok(());
        };
        let class = self
            .store
            .nodes
            .get(node)
            .ok_or(ValidationError::UnknownNode { node })?
            .class;
        if self.class_enabled(class) {
            Ok(())
        } else {
            Err(ValidationError::ClassDisabled { class })
        }
    }

    fn input_space(&self, input: InputId) -> Result<SpaceId, ValidationError> {
        self.store
            .input_space(input)
            .map_err(|_| ValidationError::UnknownPlug {
                plug: PlugRef::Input(input),
            })
    }

    fn output_space(&self, output: OutputId) -> Result<SpaceId, ValidationError> {
        self.store
            .output_space(output)
            .map_err(|_| ValidationError::UnknownPlug {
                plug: PlugRef::Output(output),
            })
    }

    // ── Wire ─────────────────────────────────────────────────────

    /// Draw an edge from `source` to `sink`.
    ///
    /// Rejected with a [`ValidationError`] and no change to the graph if
    /// both ends are facade interiors, the ends lie in different spaces,
    /// the types differ, a class is disabled, the destination is already
    /// fed, or a facade on the path is unaliased.
    pub fn wire(&mut self, source: EdgeSource, sink: EdgeSink) -> Result<EdgeId, SceneError> {
        self.ensure_running()?;
        let edge = match (source, sink) {
            (EdgeSource::FacadeIn(_), EdgeSink::FacadeOut(_)) => {
                return Err(ValidationError::BothFacadeInterior.into());
            }
            (EdgeSource::FacadeIn(facade), EdgeSink::Input(dest)) => {
                self.wire_facade_in(facade, dest)?
            }
            (EdgeSource::Output(src), EdgeSink::FacadeOut(facade)) => {
                self.wire_facade_out(src, facade)?
            }
            (EdgeSource::Output(src), EdgeSink::Input(dest)) => self.wire_concrete(src, dest)?,
        };
        debug!("wired {source:?} -> {sink:?} as edge {edge}");
        Ok(edge)
    }

    fn wire_facade_in(&mut self, facade: InputId, dest: InputId) -> Result<EdgeId, SceneError> {
        let (rec, space) = self.facade_input(facade)?;
        if rec.aliased.is_some() {
            return Err(ValidationError::AlreadyConnected {
                plug: PlugRef::Input(facade),
            }
            .into());
        }
        let dest_space = self.input_space(dest)?;
        if dest_space != space {
            return Err(ValidationError::CrossScope {
                src_space: space,
                dest_space,
            }
            .into());
        }
        if !self.store.edges_into(EdgeSink::Input(dest)).is_empty() {
            return Err(ValidationError::AlreadyConnected {
                plug: PlugRef::Input(dest),
            }
            .into());
        }
        let concrete = self.resolve_input(dest)?;
        let concrete_rec = self.store.inputs.require(concrete)?;
        let (owner, type_id) = (concrete_rec.owner, concrete_rec.type_id);
        self.check_owner_enabled(owner)?;

        let rec = self.store.inputs.require_mut(facade)?;
        rec.type_id = type_id;
        rec.aliased = Some(dest);
        Ok(self.store.edges.insert(EdgeRecord {
            id: EdgeId::default(),
            space,
            source: EdgeSource::FacadeIn(facade),
            sink: EdgeSink::Input(dest),
        }))
    }

    fn wire_facade_out(&mut self, src: OutputId, facade: OutputId) -> Result<EdgeId, SceneError> {
        let (_, space) = self.facade_output(facade)?;
        if !self.store.edges_into(EdgeSink::FacadeOut(facade)).is_empty() {
            return Err(ValidationError::AlreadyConnected {
                plug: PlugRef::Output(facade),
            }
            .into());
        }
        let src_space = self.output_space(src)?;
        if src_space != space {
            return Err(ValidationError::CrossScope {
                src_space,
                dest_space: space,
            }
            .into());
        }
        let concrete = self.resolve_output(src)?;
        let concrete_rec = self.store.outputs.require(concrete)?;
        let (owner, type_id) = (concrete_rec.owner, concrete_rec.type_id);
        self.check_owner_enabled(owner)?;

        let rec = self.store.outputs.require_mut(facade)?;
        rec.type_id = type_id;
        rec.aliased = Some(src);
        let edge = self.store.edges.insert(EdgeRecord {
            id: EdgeId::default(),
            space,
            source: EdgeSource::Output(src),
            sink: EdgeSink::FacadeOut(facade),
        });

        if self.is_partition_space(space) {
            if let Some(channel) = self.store.channel_of_output(facade) {
                self.bind_channel(channel);
            }
        }
        Ok(edge)
    }

    fn wire_concrete(&mut self, src: OutputId, dest: InputId) -> Result<EdgeId, SceneError> {
        let src_space = self.output_space(src)?;
        let dest_space = self.input_space(dest)?;
        if src_space != dest_space {
            return Err(ValidationError::CrossScope {
                src_space,
                dest_space,
            }
            .into());
        }
        let src_c = self.resolve_output(src)?;
        let dest_c = self.resolve_input(dest)?;
        let src_rec = self.store.outputs.require(src_c)?;
        let dest_rec = self.store.inputs.require(dest_c)?;
        if src_rec.type_id != dest_rec.type_id {
            return Err(ValidationError::TypeMismatch {
                src_type: src_rec.type_id,
                dest_type: dest_rec.type_id,
            }
            .into());
        }
        let (src_owner, dest_owner) = (src_rec.owner, dest_rec.owner);
        self.check_owner_enabled(src_owner)?;
        self.check_owner_enabled(dest_owner)?;
        if !self.store.edges_into(EdgeSink::Input(dest)).is_empty() {
            return Err(ValidationError::AlreadyConnected {
                plug: PlugRef::Input(dest),
            }
            .into());
        }
        let src_idx = self.trace_output(src)?;
        let dest_idx = self.trace_input(dest)?;

        let edge = self.store.edges.insert(EdgeRecord {
            id: EdgeId::default(),
            space: src_space,
            source: EdgeSource::Output(src),
            sink: EdgeSink::Input(dest),
        });
        if let Some(slot) = self.inputs.get_mut(dest_idx) {
            slot.connection = Some(src_idx);
        }
        Ok(edge)
    }

    // ── Unwire ───────────────────────────────────────────────────

    /// Delete `edge`, undoing what wiring it did.
    ///
    /// Removing an interior facade edge first unwires every exterior edge
    /// that depended on the facade's alias.
    pub fn unwire(&mut self, edge: EdgeId) -> Result<(), SceneError> {
        self.ensure_running()?;
        let rec = self
            .store
            .edges
            .get(edge)
            .ok_or(ValidationError::UnknownEdge { edge })?;
        let (source, sink, space) = (rec.source, rec.sink, rec.space);

        match (source, sink) {
            (_, EdgeSink::FacadeOut(facade)) => {
                if self.is_partition_space(space) {
                    self.unbind_channel_output(facade);
                }
                for ext in self.store.edges_from(EdgeSource::Output(facade)) {
                    self.unwire(ext)?;
                }
                let rec = self.store.outputs.require_mut(facade)?;
                rec.aliased = None;
                rec.type_id = None;
            }
            (EdgeSource::FacadeIn(facade), EdgeSink::Input(_)) => {
                for ext in self.store.edges_into(EdgeSink::Input(facade)) {
                    self.unwire(ext)?;
                }
                let rec = self.store.inputs.require_mut(facade)?;
                rec.aliased = None;
                rec.type_id = None;
            }
            (EdgeSource::Output(_), EdgeSink::Input(dest)) => {
                if let Ok(idx) = self.trace_input(dest) {
                    if let Some(slot) = self.inputs.get_mut(idx) {
                        slot.connection = None;
                    }
                }
            }
        }
        self.store.edges.remove(edge);
        debug!("unwired edge {edge}");
        Ok(())
    }
}
