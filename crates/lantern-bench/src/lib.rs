//! Benchmark profiles for the Lantern scene graph.
//!
//! - [`core_scene`]: an empty scene with only the core plugin loaded
//! - [`stage_profile`]: one partition with `channels` RGB channels, each
//!   driven by its own RGB trigger counter, all fed by one shared trigger
//!   generator so the shared ancestor exercises per-frame memoization

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use lantern_core::{ClassId, NodeId, UniverseId};
use lantern_graph::{ChannelAddress, Scene, SceneConfig};
use lantern_plugins::CorePlugin;
use lantern_store::{ChannelMode, EdgeSink, EdgeSource, PlugOwner, SceneStore};

/// RGB channels packed into one 512-slot universe.
pub const CHANNELS_PER_UNIVERSE: usize = 170;

/// An empty scene with the core plugin loaded.
pub fn core_scene() -> Scene {
    let store = SceneStore::new().expect("empty store");
    Scene::new(SceneConfig::new(Box::new(CorePlugin::new())), store).expect("core scene")
}

fn class(scene: &Scene, name: &str) -> ClassId {
    scene
        .store()
        .classes
        .find(|c| c.name == name)
        .map(|c| c.id)
        .unwrap_or_else(|| panic!("core class {name} missing"))
}

fn first_output(scene: &Scene, node: NodeId) -> EdgeSource {
    EdgeSource::Output(scene.store().outputs_of(PlugOwner::Node(node))[0])
}

/// Addresses for RGB channel `i`, packed three slots apiece.
pub fn rgb_addresses(i: usize) -> [ChannelAddress; 3] {
    let universe = UniverseId((i / CHANNELS_PER_UNIVERSE) as u32 + 1);
    let first = ((i % CHANNELS_PER_UNIVERSE) * 3) as u16;
    [0, 1, 2].map(|k| ChannelAddress {
        universe,
        address: first + k,
        sixteen_bit: false,
    })
}

/// A stage of `channels` RGB channels behind one shared trigger.
pub fn stage_profile(channels: usize) -> Scene {
    let mut scene = core_scene();
    let partition = scene.create_partition("Bench").expect("partition");
    let space = scene.store().partitions.get(partition).expect("partition record").space;
    let trigger_class = class(&scene, "Trigger Generator");
    let counter_class = class(&scene, "RGB Trigger");

    let trigger = scene.add_instance(space, trigger_class).expect("trigger");
    let trigger_out = first_output(&scene, trigger);
    for i in 0..channels {
        let counter = scene.add_instance(space, counter_class).expect("counter");
        let input = scene.store().inputs_of(PlugOwner::Node(counter))[0];
        scene
            .wire(trigger_out, EdgeSink::Input(input))
            .expect("trigger wire");
        let channel = scene
            .create_channel(
                partition,
                &format!("Fixture {i}"),
                ChannelMode::Rgb,
                &rgb_addresses(i),
            )
            .expect("channel");
        let facade = scene.store().channels.get(channel).expect("channel record").output;
        scene
            .wire(first_output(&scene, counter), EdgeSink::FacadeOut(facade))
            .expect("channel wire");
    }
    scene
}
