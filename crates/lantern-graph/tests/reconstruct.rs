//! Integration tests: plugin lifecycle, reconstruction, and persistence.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use lantern_core::{PluginError, UniverseId, ValidationError};
use lantern_graph::{
    ChannelAddress, ReconstructionError, Scene, SceneConfig, SceneError, ScenePhase,
};
use lantern_store::{ChannelMode, EdgeSink, EdgeSource, SceneStore};
use lantern_test_utils::{
    ExtraPlugin, FailingPlugin, FixtureCore, SwitchedCore, TestScene, CLASS_CONSTANT,
    CLASS_EXTRA_PASS, CLASS_PASS,
};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("lantern-graph-{}-{name}.json", std::process::id()))
}

#[test]
fn registration_outside_init_is_rejected() {
    let mut t = TestScene::new();
    let core = t.scene.core_plugin().unwrap();
    let err = t.scene.register_data_type(core, "Late Type", "").unwrap_err();
    assert_eq!(err, PluginError::RegistrationOutsideInit { plugin: core });
    assert!(t
        .scene
        .store()
        .data_types
        .find(|d| d.name == "Late Type")
        .is_none());
}

#[test]
fn core_plugin_cannot_be_disabled() {
    let mut t = TestScene::new();
    let core = t.scene.core_plugin().unwrap();
    assert!(matches!(
        t.scene.disable_plugin(core),
        Err(SceneError::Validation(ValidationError::CorePluginLocked))
    ));
}

#[test]
fn new_plugins_start_disabled() {
    let mut t = TestScene::from_store(SceneStore::new().unwrap(), true);
    let extra = t.plugin_id(ExtraPlugin::NAME);
    let view = t.scene.plugins_view();
    let extra_view = view.iter().find(|p| p.id == extra).unwrap();
    assert!(!extra_view.enabled);
    assert!(!extra_view.loaded);

    // Enabling a plugin that never loaded waits for the next reload.
    assert!(!t.scene.enable_plugin(extra).unwrap());
    t.scene.reconstruct().unwrap();
    let class = t.class(CLASS_EXTRA_PASS);
    assert!(t.scene.class_enabled(class));
}

#[test]
fn disabling_blocks_wiring_and_reenabling_restores_it() {
    let mut t = TestScene::with_extra();
    let extra = t.plugin_id(ExtraPlugin::NAME);
    let space = {
        let p = t.scene.create_partition("Stage").unwrap();
        t.scene.store().partitions.get(p).unwrap().space
    };
    let a = t.add(space, CLASS_CONSTANT);
    let x = t.add(space, CLASS_EXTRA_PASS);
    let (out, inp) = (t.output(a, 0), t.input(x, 0));

    t.scene.disable_plugin(extra).unwrap();
    assert!(matches!(
        t.scene.wire(EdgeSource::Output(out), EdgeSink::Input(inp)),
        Err(SceneError::Validation(ValidationError::ClassDisabled { .. }))
    ));
    let class = t.class(CLASS_EXTRA_PASS);
    assert!(matches!(
        t.scene.add_instance(space, class),
        Err(SceneError::Validation(ValidationError::ClassDisabled { .. }))
    ));

    // A reload leaves the disabled plugin out entirely.
    t.scene.reconstruct().unwrap();
    assert_eq!(t.scene.live_nodes(), 1);
    assert!(t.scene.store().nodes.contains(x));

    assert!(!t.scene.enable_plugin(extra).unwrap());
    t.scene.reconstruct().unwrap();
    assert_eq!(t.scene.live_nodes(), 2);
    t.scene
        .wire(EdgeSource::Output(out), EdgeSink::Input(inp))
        .unwrap();
    assert_eq!(t.scene.connection_of(inp), Some(out));
}

#[test]
fn disabled_plugin_outputs_read_empty() {
    let mut t = TestScene::with_extra();
    let extra = t.plugin_id(ExtraPlugin::NAME);
    let p = t.scene.create_partition("Stage").unwrap();
    let space = t.scene.store().partitions.get(p).unwrap().space;
    let a = t.add(space, CLASS_CONSTANT);
    let x = t.add(space, CLASS_EXTRA_PASS);
    t.scene
        .wire(EdgeSource::Output(t.output(a, 0)), EdgeSink::Input(t.input(x, 0)))
        .unwrap();
    t.set_constant(a, [1.0, 1.0, 1.0]);

    t.scene.disable_plugin(extra).unwrap();
    t.scene.advance_frame();
    assert!(t.scene.evaluate(t.output(x, 0)).is_empty());

    assert!(t.scene.enable_plugin(extra).unwrap());
    t.scene.advance_frame();
    assert!(!t.scene.evaluate(t.output(x, 0)).is_empty());
}

#[test]
fn failing_plugin_does_not_stop_the_scene() {
    let config = SceneConfig::new(Box::new(FixtureCore::new(Arc::new(AtomicUsize::new(0)))))
        .with_plugin(Box::new(FailingPlugin));
    let mut scene = Scene::new(config, SceneStore::new().unwrap()).unwrap();
    let failing = scene
        .store()
        .plugins
        .find(|p| p.name == FailingPlugin::NAME)
        .unwrap()
        .id;
    scene.enable_plugin(failing).unwrap();
    scene.reconstruct().unwrap();

    let view = scene.plugins_view();
    assert!(!view.iter().find(|p| p.id == failing).unwrap().loaded);
    assert!(scene.core_plugin().is_some());
    assert_eq!(scene.store().plugin_db.statement_count(), 0);
}

#[test]
fn failed_reload_halts_until_a_reload_succeeds() {
    let fail = Arc::new(AtomicBool::new(false));
    let config = SceneConfig::new(Box::new(SwitchedCore::new(Arc::clone(&fail))));
    let mut scene = Scene::new(config, SceneStore::new().unwrap()).unwrap();
    let stage = scene.create_partition("Stage").unwrap();
    scene
        .create_channel(
            stage,
            "Dimmer",
            ChannelMode::Single,
            &[ChannelAddress {
                universe: UniverseId(1),
                address: 0,
                sixteen_bit: false,
            }],
        )
        .unwrap();
    scene.render_frame();

    fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        scene.reconstruct(),
        Err(ReconstructionError::CorePlugin(_))
    ));
    assert_eq!(scene.phase(), ScenePhase::Failed);
    assert!(matches!(
        scene.create_partition("Balcony"),
        Err(SceneError::Halted)
    ));
    assert!(matches!(
        scene.delete_partition(stage),
        Err(SceneError::Halted)
    ));
    let before = scene.frame();
    scene.render_frame();
    assert_eq!(scene.frame(), before);
    assert_eq!(scene.universe_buffers().count(), 0);
    assert_eq!(scene.store().partitions.len(), 1);

    fail.store(false, Ordering::SeqCst);
    scene.reconstruct().unwrap();
    assert_eq!(scene.phase(), ScenePhase::Run);
    assert_eq!(scene.universe_buffer(UniverseId(1)), Some(&[0][..]));
    scene.create_partition("Balcony").unwrap();
    assert_eq!(scene.store().partitions.len(), 2);
}

#[test]
fn reconstruct_keeps_slots_and_records_in_step() {
    let mut t = TestScene::new();
    let p = t.scene.create_partition("Stage").unwrap();
    let space = t.scene.store().partitions.get(p).unwrap().space;
    let child = t.scene.add_space(space, "Child").unwrap();
    let a = t.add(space, CLASS_CONSTANT);
    let b = t.add(child, CLASS_PASS);
    let c = t.add(space, CLASS_PASS);
    t.scene.remove_instance(c).unwrap();
    let fo = t.scene.add_facade_output(child, "Out").unwrap();
    t.scene
        .wire(EdgeSource::Output(t.output(b, 0)), EdgeSink::FacadeOut(fo))
        .unwrap();
    t.scene.render_frame();

    t.scene.reconstruct().unwrap();
    assert_eq!(t.scene.frame().0, 0);
    assert_eq!(t.scene.live_nodes(), 2);
    for node in [a, b] {
        let rec = t.scene.store().nodes.get(node).unwrap();
        assert!(rec.arr_idx.is_some());
    }
    for rec in t.scene.store().inputs.iter() {
        if let Some(slot) = t.scene.input_slot(rec.id) {
            assert_eq!(slot.id, rec.id);
        }
    }
    for rec in t.scene.store().outputs.iter() {
        if let Some(slot) = t.scene.output_slot(rec.id) {
            assert_eq!(slot.id, rec.id);
        }
    }
    assert_eq!(t.scene.resolve_output(fo), Ok(t.output(b, 0)));
}

#[test]
fn saved_scene_rebuilds_from_disk() {
    let path = temp_path("rebuild");
    let (channel, source) = {
        let mut t = TestScene::new();
        let p = t.scene.create_partition("Stage").unwrap();
        let space = t.scene.store().partitions.get(p).unwrap().space;
        let channel = t
            .scene
            .create_channel(
                p,
                "Wash",
                ChannelMode::Single,
                &[ChannelAddress {
                    universe: UniverseId(7),
                    address: 2,
                    sixteen_bit: false,
                }],
            )
            .unwrap();
        let source = t.add(space, CLASS_CONSTANT);
        let facade = t.scene.store().channels.get(channel).unwrap().output;
        t.scene
            .wire(
                EdgeSource::Output(t.output(source, 0)),
                EdgeSink::FacadeOut(facade),
            )
            .unwrap();
        t.scene.rename_instance(source, "Key light").unwrap();
        t.scene.store().save(&path).unwrap();
        (channel, source)
    };

    let store = SceneStore::open(&path).unwrap();
    let mut t = TestScene::from_store(store, false);
    assert_eq!(t.scene.live_nodes(), 1);
    assert_eq!(t.scene.store().nodes.get(source).unwrap().name, "Key light");
    assert_eq!(t.scene.channel_binding(channel), Some(t.output(source, 0)));

    t.set_constant(source, [1.0, 0.0, 0.0]);
    t.scene.render_frame();
    assert_eq!(
        t.scene.universe_buffer(UniverseId(7)),
        Some(&[0, 0, 0xff][..])
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn views_describe_the_scene() {
    let mut t = TestScene::new();
    let p = t.scene.create_partition("Stage").unwrap();
    let space = t.scene.store().partitions.get(p).unwrap().space;
    let child = t.scene.add_space(space, "Child").unwrap();
    t.scene.add_facade_input(child, "In").unwrap();
    t.add(space, CLASS_CONSTANT);

    let library = t.scene.library();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].classes.len(), 5);
    assert_eq!(library[0].data_types.len(), 2);

    let view = t.scene.patch_space(space).unwrap();
    assert_eq!(view.nodes.len(), 1);
    assert_eq!(view.nodes[0].name, "New Constant");
    assert_eq!(view.facades.len(), 1);
    assert_eq!(view.facades[0].inputs.len(), 1);
    assert!(serde_json::to_value(&view).is_ok());

    assert!(matches!(
        t.scene.patch_space(lantern_core::SpaceId(99)),
        Err(ValidationError::UnknownSpace { .. })
    ));
    assert_eq!(t.scene.partitions_view()[0].name, "Stage");
}
