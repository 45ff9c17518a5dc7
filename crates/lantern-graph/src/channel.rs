//! Partitions, channels, universes, and per-frame channel output.

use lantern_core::{
    quantize16, AddressId, ChannelId, OutputId, PartitionId, SpaceId, UniverseId, ValidationError,
};
use lantern_store::{
    AddressRecord, ChannelMode, ChannelRecord, OutputRecord, PartitionRecord, PlugOwner,
    SpaceRecord,
};
use log::{debug, warn};
use smallvec::SmallVec;

use crate::error::{ReconstructionError, SceneError};
use crate::scene::{Scene, ScenePhase};

/// One physical slot requested for a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelAddress {
    /// Universe addressed.
    pub universe: UniverseId,
    /// Slot within the universe.
    pub address: u16,
    /// Whether the value spans `address` and `address + 1`.
    pub sixteen_bit: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct PartitionSlot {
    pub(crate) id: PartitionId,
    pub(crate) space: SpaceId,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ResolvedAddress {
    pub(crate) universe: usize,
    pub(crate) address: usize,
    pub(crate) sixteen_bit: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ChannelSlot {
    pub(crate) facade: OutputId,
    /// Output slot the facade traces to, if bound.
    pub(crate) output: Option<usize>,
    pub(crate) addresses: SmallVec<[ResolvedAddress; 3]>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct UniverseSlot {
    pub(crate) id: UniverseId,
    pub(crate) buffer: Vec<u8>,
}

impl Scene {
    // ── Partitions ───────────────────────────────────────────────

    /// Create a partition and its space under the root.
    pub fn create_partition(&mut self, name: &str) -> Result<PartitionId, SceneError> {
        self.ensure_running()?;
        let space = self
            .store
            .spaces
            .insert(SpaceRecord::new(Some(SpaceId::ROOT), name));
        let id = self.store.partitions.insert(PartitionRecord {
            id: PartitionId::default(),
            name: name.to_owned(),
            space,
            image: None,
        });
        self.partitions.insert_with(PartitionSlot { id, space })?;
        debug!("created partition {id} with space {space}");
        Ok(id)
    }

    /// Rename a partition (and its space) and set its image reference.
    pub fn update_partition(
        &mut self,
        partition: PartitionId,
        name: &str,
        image: Option<String>,
    ) -> Result<(), SceneError> {
        self.ensure_running()?;
        let rec = self
            .store
            .partitions
            .get_mut(partition)
            .ok_or(ValidationError::UnknownPartition { partition })?;
        rec.name = name.to_owned();
        rec.image = image;
        let space = rec.space;
        self.store.spaces.require_mut(space)?.name = name.to_owned();
        Ok(())
    }

    /// Delete a partition with its channels, addresses, and space.
    pub fn delete_partition(&mut self, partition: PartitionId) -> Result<(), SceneError> {
        self.ensure_running()?;
        let space = self
            .store
            .partitions
            .get(partition)
            .ok_or(ValidationError::UnknownPartition { partition })?
            .space;
        for channel in self.store.channels.ids_where(|c| c.partition == partition) {
            self.remove_channel_records(channel)?;
        }
        self.remove_space_tree(space)?;
        self.store.partitions.remove(partition);
        let found = self.partition_index(partition);
        if let Some(idx) = found {
            self.partitions.delete(idx)?;
        }
        self.rebuild_outputs()?;
        debug!("deleted partition {partition}");
        Ok(())
    }

    // ── Channels ─────────────────────────────────────────────────

    fn check_addresses(
        &self,
        mode: ChannelMode,
        addresses: &[ChannelAddress],
    ) -> Result<(), ValidationError> {
        if addresses.len() != mode.address_count() {
            return Err(ValidationError::AddressCount {
                expected: mode.address_count(),
                got: addresses.len(),
            });
        }
        for a in addresses {
            let last = a.address.saturating_add(u16::from(a.sixteen_bit));
            if last > self.max_light_address || (a.sixteen_bit && a.address == u16::MAX) {
                return Err(ValidationError::AddressOutOfRange {
                    universe: a.universe,
                    address: a.address,
                    max: self.max_light_address,
                });
            }
        }
        Ok(())
    }

    fn insert_addresses(&mut self, addresses: &[ChannelAddress]) -> Vec<AddressId> {
        addresses
            .iter()
            .map(|a| {
                self.store.addresses.insert(AddressRecord {
                    id: AddressId::default(),
                    universe: a.universe,
                    address: a.address,
                    sixteen_bit: a.sixteen_bit,
                })
            })
            .collect()
    }

    /// Create a channel on `partition`.
    ///
    /// Adds a facade output named after the channel to the partition's
    /// space; wiring into it binds the channel.
    pub fn create_channel(
        &mut self,
        partition: PartitionId,
        name: &str,
        mode: ChannelMode,
        addresses: &[ChannelAddress],
    ) -> Result<ChannelId, SceneError> {
        self.ensure_running()?;
        let space = self
            .store
            .partitions
            .get(partition)
            .ok_or(ValidationError::UnknownPartition { partition })?
            .space;
        self.check_addresses(mode, addresses)?;

        let output = self.store.outputs.insert(OutputRecord {
            id: OutputId::default(),
            owner: PlugOwner::Facade(space),
            type_id: None,
            name: name.to_owned(),
            func: 0,
            aliased: None,
            arr_idx: None,
        });
        let address_ids = self.insert_addresses(addresses);
        let id = self.store.channels.insert(ChannelRecord {
            id: ChannelId::default(),
            partition,
            name: name.to_owned(),
            mode,
            addresses: address_ids,
            output,
            arr_idx: None,
        });
        self.rebuild_outputs()?;
        debug!("created channel {id} on partition {partition}");
        Ok(id)
    }

    /// Change a channel's name, mode, and addresses.
    pub fn update_channel(
        &mut self,
        channel: ChannelId,
        name: &str,
        mode: ChannelMode,
        addresses: &[ChannelAddress],
    ) -> Result<(), SceneError> {
        self.ensure_running()?;
        if !self.store.channels.contains(channel) {
            return Err(ValidationError::UnknownChannel { channel }.into());
        }
        self.check_addresses(mode, addresses)?;
        let address_ids = self.insert_addresses(addresses);
        let rec = self.store.channels.require_mut(channel)?;
        let old = std::mem::replace(&mut rec.addresses, address_ids);
        rec.name = name.to_owned();
        rec.mode = mode;
        let output = rec.output;
        for a in old {
            self.store.addresses.remove(a);
        }
        self.store.outputs.require_mut(output)?.name = name.to_owned();
        self.rebuild_outputs()?;
        Ok(())
    }

    /// Delete a channel with its addresses and facade output.
    pub fn delete_channel(&mut self, channel: ChannelId) -> Result<(), SceneError> {
        self.ensure_running()?;
        if !self.store.channels.contains(channel) {
            return Err(ValidationError::UnknownChannel { channel }.into());
        }
        self.remove_channel_records(channel)?;
        self.rebuild_outputs()?;
        debug!("deleted channel {channel}");
        Ok(())
    }

    fn remove_channel_records(&mut self, channel: ChannelId) -> Result<(), SceneError> {
        let Some(rec) = self.store.channels.remove(channel) else {
            return Ok(());
        };
        for a in rec.addresses {
            self.store.addresses.remove(a);
        }
        if self.store.outputs.contains(rec.output) {
            self.drop_facade_output(rec.output)?;
        }
        Ok(())
    }

    // ── Registries ───────────────────────────────────────────────

    /// Rebuild the universe and channel arenas from the store.
    pub(crate) fn rebuild_outputs(&mut self) -> Result<(), ReconstructionError> {
        self.channels.clear();
        self.universes.clear();
        for rec in self.store.channels.iter_mut() {
            rec.arr_idx = None;
        }
        self.build_universes()?;
        self.build_channels()
    }

    /// One zeroed universe per addressed id, sized to its highest slot.
    pub(crate) fn build_universes(&mut self) -> Result<(), ReconstructionError> {
        let mut sizes: Vec<(UniverseId, usize)> = Vec::new();
        for channel in self.store.channels.iter() {
            for &address in &channel.addresses {
                let a = self.store.addresses.require(address)?;
                let end = usize::from(a.address) + 1 + usize::from(a.sixteen_bit);
                match sizes.iter_mut().find(|(u, _)| *u == a.universe) {
                    Some((_, size)) => *size = (*size).max(end),
                    None => sizes.push((a.universe, end)),
                }
            }
        }
        sizes.sort_by_key(|(u, _)| *u);
        for (id, size) in sizes {
            self.universes.insert_with(UniverseSlot {
                id,
                buffer: vec![0; size],
            })?;
        }
        Ok(())
    }

    /// Resolve every channel's addresses and bind its facade output.
    pub(crate) fn build_channels(&mut self) -> Result<(), ReconstructionError> {
        for id in self.store.channels.ids() {
            let rec = self.store.channels.require(id)?;
            let (mode, address_ids, facade) = (rec.mode, rec.addresses.clone(), rec.output);
            if address_ids.len() != mode.address_count() {
                return Err(ReconstructionError::Inconsistent {
                    reason: format!(
                        "channel {id} has {} addresses for mode {mode:?}",
                        address_ids.len()
                    ),
                });
            }
            let mut addresses = SmallVec::new();
            for address in address_ids {
                let a = self.store.addresses.require(address)?;
                if a.address.saturating_add(u16::from(a.sixteen_bit)) > self.max_light_address {
                    return Err(ReconstructionError::Inconsistent {
                        reason: format!("address {address} of channel {id} is out of range"),
                    });
                }
                let universe = self
                    .universe_index(a.universe)
                    .ok_or_else(|| ReconstructionError::Inconsistent {
                        reason: format!("universe {} was not built", a.universe),
                    })?;
                addresses.push(ResolvedAddress {
                    universe,
                    address: usize::from(a.address),
                    sixteen_bit: a.sixteen_bit,
                });
            }
            let idx = self.channels.insert_with(ChannelSlot {
                facade,
                output: None,
                addresses,
            })?;
            self.store.channels.require_mut(id)?.arr_idx = Some(idx);
            self.bind_channel(id);
        }
        Ok(())
    }

    pub(crate) fn build_partitions(&mut self) -> Result<(), ReconstructionError> {
        for rec in self.store.partitions.iter() {
            if !self.store.spaces.contains(rec.space) {
                return Err(ReconstructionError::Inconsistent {
                    reason: format!("partition {} has no space {}", rec.id, rec.space),
                });
            }
            self.partitions.insert_with(PartitionSlot {
                id: rec.id,
                space: rec.space,
            })?;
        }
        Ok(())
    }

    fn partition_index(&self, partition: PartitionId) -> Option<usize> {
        self.partitions
            .iter()
            .find(|(_, p)| p.id == partition)
            .map(|(i, _)| i)
    }

    /// Whether `space` belongs to a live partition.
    pub(crate) fn is_partition_space(&self, space: SpaceId) -> bool {
        self.partitions.iter().any(|(_, p)| p.space == space)
    }

    fn universe_index(&self, universe: UniverseId) -> Option<usize> {
        self.universes
            .iter()
            .find(|(_, u)| u.id == universe)
            .map(|(i, _)| i)
    }

    /// Re-trace `channel`'s facade output and bind the result.
    pub(crate) fn bind_channel(&mut self, channel: ChannelId) {
        let Some(idx) = self.store.channels.get(channel).and_then(|c| c.arr_idx) else {
            return;
        };
        let Some(facade) = self.channels.get(idx).map(|c| c.facade) else {
            return;
        };
        let output = match self.trace_output(facade) {
            Ok(output) => Some(output),
            Err(ValidationError::UnaliasedFacade { .. }) => None,
            Err(e) => {
                warn!("channel {channel} left unbound: {e}");
                None
            }
        };
        if let Some(slot) = self.channels.get_mut(idx) {
            slot.output = output;
        }
    }

    pub(crate) fn unbind_channel_output(&mut self, facade: OutputId) {
        for (_, slot) in self.channels.iter_mut() {
            if slot.facade == facade {
                slot.output = None;
            }
        }
    }

    /// The output slot currently bound to `channel`.
    pub fn channel_binding(&self, channel: ChannelId) -> Option<OutputId> {
        let idx = self.store.channels.get(channel)?.arr_idx?;
        let output = self.channels.get(idx)?.output?;
        self.outputs.get(output).map(|o| o.id)
    }

    // ── Frame output ─────────────────────────────────────────────

    /// Advance the frame and write every channel into its universe.
    ///
    /// A channel whose bound output carries the channel type is pulled
    /// through the memoized evaluator and quantized; anything else writes
    /// zero. A failed scene renders nothing and keeps its frame counter.
    pub fn render_frame(&mut self) {
        if self.phase == ScenePhase::Failed {
            return;
        }
        self.advance_frame();
        let channel_type = self.channel_type;
        for idx in self.channels.indices() {
            let Some(slot) = self.channels.get(idx) else {
                continue;
            };
            let (output, addresses) = (slot.output, slot.addresses.clone());
            let colour = output
                .filter(|&o| {
                    channel_type.is_some()
                        && self.outputs.get(o).is_some_and(|s| s.type_id == channel_type)
                })
                .and_then(|o| self.eval_output(o).as_rgb())
                .unwrap_or_default();

            for (address, component) in addresses.iter().zip(colour.components()) {
                let level = quantize16(component);
                let Some(universe) = self.universes.get_mut(address.universe) else {
                    continue;
                };
                let [high, low] = level.to_be_bytes();
                if let Some(byte) = universe.buffer.get_mut(address.address) {
                    *byte = high;
                }
                if address.sixteen_bit {
                    if let Some(byte) = universe.buffer.get_mut(address.address + 1) {
                        *byte = low;
                    }
                }
            }
        }
    }

    /// Every universe buffer, in universe id order.
    pub fn universe_buffers(&self) -> impl Iterator<Item = (UniverseId, &[u8])> + '_ {
        self.universes.iter().map(|(_, u)| (u.id, u.buffer.as_slice()))
    }

    /// The buffer of `universe`, if any channel addresses it.
    pub fn universe_buffer(&self, universe: UniverseId) -> Option<&[u8]> {
        let idx = self.universe_index(universe)?;
        self.universes.get(idx).map(|u| u.buffer.as_slice())
    }
}
