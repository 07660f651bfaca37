//! Layout saver tests
//!
//! Save/restore behavior over both backends: round trips, parent indices,
//! destructive restores, rejected payloads and the restore-in-progress flag.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{arranged, config, describe, main_id, registry_with, BACKENDS};
use dockyard::dump::LayoutDump;
use dockyard::panel::PanelLocation;
use dockyard::saver::{FileSettings, MemorySettings, SettingsStore, LAYOUT_GROUP, LAYOUT_KEY};
use dockyard::stream::DataStreamWriter;
use dockyard::{
    ApplicationIdentity, DockLocation, DockRegistry, DockTarget, DockWindow, LayoutError,
    LayoutSaver, Rect,
};
use tempfile::TempDir;

// ========================================================================
// Round trip
// ========================================================================

#[test]
fn test_round_trip_reproduces_arrangement() {
    for backend in BACKENDS {
        let mut source = arranged(backend);
        let data = LayoutSaver::new(&mut source).serialize_layout();
        assert!(!data.is_empty(), "{backend:?}: nothing serialized");

        let mut target = registry_with(backend, &["main1", "main2"]);
        assert!(LayoutSaver::new(&mut target).restore_layout(&data));

        assert_eq!(describe(&target), describe(&source), "{backend:?}");
        assert!(target.is_sane(), "{backend:?}: {:?}", target.sanity_issues());
        assert_eq!(LayoutSaver::new(&mut target).serialize_layout(), data);
    }
}

#[test]
fn test_round_trip_through_memory_store() {
    let mut source = arranged(BACKENDS[0]);
    let mut store = MemorySettings::new();
    assert!(LayoutSaver::new(&mut source).save_to_store(&mut store));
    assert!(store.value(LAYOUT_GROUP, LAYOUT_KEY).is_some());

    let mut target = registry_with(BACKENDS[0], &["main1", "main2"]);
    assert!(LayoutSaver::new(&mut target).restore_from_store(&store));
    assert_eq!(describe(&target), describe(&source));
}

#[test]
fn test_restore_across_backends() {
    let mut source = arranged(BACKENDS[0]);
    let data = LayoutSaver::new(&mut source).serialize_layout();

    let mut target = registry_with(BACKENDS[1], &["main1", "main2"]);
    assert!(LayoutSaver::new(&mut target).restore_layout(&data));
    assert_eq!(describe(&target), describe(&source));
}

#[test]
fn test_bare_floating_panel_is_morphed_before_saving() {
    let mut registry = registry_with(BACKENDS[0], &["main1"]);
    registry.float_panel("notes", Rect::new(300, 200, 250, 180)).unwrap();

    let data = LayoutSaver::new(&mut registry).serialize_layout();
    let dump = LayoutDump::decode(&data).unwrap();
    assert_eq!(dump.floating_windows.len(), 1);
    assert_eq!(dump.floating_windows[0].geometry, Rect::new(300, 200, 250, 180));
    assert_eq!(dump.floating_windows[0].layout.panel_names(), vec!["notes"]);

    let host = registry.panel("notes").unwrap().location();
    assert!(matches!(host, PanelLocation::Docked(_)));
}

// ========================================================================
// Parent index
// ========================================================================

#[test]
fn test_floating_parent_follows_recreated_main_window() {
    for backend in BACKENDS {
        let mut registry = arranged(backend);
        let data = LayoutSaver::new(&mut registry).serialize_layout();
        assert_eq!(
            LayoutDump::decode(&data).unwrap().floating_windows[0].parent_index,
            Some(1)
        );

        let old_main2 = main_id(&registry, "main2");
        registry.remove_main_window(old_main2).unwrap();
        let new_main2 = registry.create_main_window("main2").unwrap();
        assert_ne!(old_main2, new_main2);

        assert!(LayoutSaver::new(&mut registry).restore_layout(&data));

        let windows: Vec<_> = registry.floating_windows().collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].parent(), Some(new_main2));
        let main2_native = registry.main_window(new_main2).unwrap().native();
        assert_eq!(
            registry.backend().transient_parent(windows[0].native()),
            Some(main2_native)
        );
        assert!(windows[0].layout().contains("search"));
    }
}

#[test]
fn test_main1_floating_child_scenario() {
    for backend in BACKENDS {
        let mut registry = registry_with(backend, &["main1", "main2"]);
        let main1 = main_id(&registry, "main1");
        registry
            .float_panel_in_window("search", Rect::new(10, 10, 300, 200), Some(main1))
            .unwrap();

        let data = LayoutSaver::new(&mut registry).serialize_layout();
        registry.clear(true);
        assert_eq!(registry.floating_windows().count(), 0);

        assert!(LayoutSaver::new(&mut registry).restore_layout(&data));

        let windows: Vec<_> = registry.floating_windows().collect();
        assert_eq!(windows.len(), 1, "{backend:?}");
        let native = windows[0].native();
        let main1_native = registry.main_window(main1).unwrap().native();
        assert_eq!(registry.backend().transient_parent(native), Some(main1_native));
        assert_eq!(registry.backend().geometry(native), Rect::new(10, 10, 300, 200));
        assert!(registry.backend().is_visible(native));
    }
}

// ========================================================================
// Destructive restore
// ========================================================================

#[test]
fn test_restore_leaves_no_residue() {
    for backend in BACKENDS {
        let mut registry = registry_with(backend, &["main1"]);
        let main1 = main_id(&registry, "main1");
        registry
            .dock_panel("files", DockTarget::main(main1, DockLocation::Left))
            .unwrap();
        let data = LayoutSaver::new(&mut registry).serialize_layout();
        let saved = describe(&registry);

        // A different arrangement on top
        registry
            .dock_panel("editor", DockTarget::main(main1, DockLocation::Right))
            .unwrap();
        registry
            .float_panel_in_window("console", Rect::new(0, 0, 200, 200), Some(main1))
            .unwrap();
        registry.float_panel("notes", Rect::new(50, 50, 200, 200)).unwrap();
        registry
            .dock_panel("outline", DockTarget::main(main1, DockLocation::Top))
            .unwrap();
        registry.close_panel("outline").unwrap();

        assert!(LayoutSaver::new(&mut registry).restore_layout(&data));

        assert_eq!(describe(&registry), saved, "{backend:?}");
        assert_eq!(registry.floating_windows().count(), 0);
        assert!(registry.closed_panels().is_empty());
        for name in ["editor", "console", "notes", "outline"] {
            let panel = registry.panel(name).unwrap();
            assert_eq!(panel.location(), PanelLocation::Unplaced, "{name}");
            assert!(!registry.backend().is_visible(panel.native()), "{name}");
            assert_eq!(registry.backend().parent(panel.native()), None, "{name}");
        }
        assert!(registry.is_sane());
    }
}

#[test]
fn test_closed_panels_are_restored_with_placeholders() {
    let mut source = arranged(BACKENDS[0]);
    let data = LayoutSaver::new(&mut source).serialize_layout();

    let mut target = registry_with(BACKENDS[0], &["main1", "main2"]);
    assert!(LayoutSaver::new(&mut target).restore_layout(&data));

    let notes = target.panel("notes").unwrap();
    assert!(notes.is_closed());
    let position = notes.last_position().unwrap();
    assert_eq!(position.main_window.as_deref(), Some("main1"));
    assert_eq!(position.peer.as_deref(), Some("editor"));
    assert_eq!(position.location, DockLocation::Right);
}

// ========================================================================
// Rejected payloads
// ========================================================================

#[test]
fn test_empty_payload_changes_nothing() {
    for backend in BACKENDS {
        let mut registry = arranged(backend);
        let before = describe(&registry);

        assert!(!LayoutSaver::new(&mut registry).restore_layout(&[]));
        assert!(matches!(
            LayoutSaver::new(&mut registry).try_restore_layout(&[]),
            Err(LayoutError::EmptyPayload)
        ));
        assert_eq!(describe(&registry), before);
    }
}

/// One main window named `main1` with the given rect edges and layout
/// node, no floating windows and no closed panels
fn single_main_window_payload(
    edges: [i32; 4],
    node: impl FnOnce(&mut DataStreamWriter),
) -> Vec<u8> {
    let mut ds = DataStreamWriter::new();
    ds.write_count(1);
    ds.write_string("main1");
    for edge in edges {
        ds.write_i32(edge);
    }
    ds.write_bool(true);
    ds.write_i32(1000);
    ds.write_i32(700);
    node(&mut ds);
    ds.write_count(0);
    ds.write_count(0);
    ds.into_bytes().to_vec()
}

fn write_frame(ds: &mut DataStreamWriter, panels: &[&str]) {
    ds.write_u8(1);
    ds.write_i32(0);
    ds.write_count(panels.len());
    for panel in panels {
        ds.write_string(panel);
    }
}

#[test]
fn test_out_of_range_geometry_fails_restore() {
    for backend in BACKENDS {
        let mut registry = registry_with(backend, &["main1"]);
        let data = single_main_window_payload([i32::MIN, 0, i32::MAX, 10], |ds| {
            write_frame(ds, &["files"])
        });

        assert!(!LayoutSaver::new(&mut registry).restore_layout(&data));
        assert!(matches!(
            LayoutSaver::new(&mut registry).try_restore_layout(&data),
            Err(LayoutError::Stream(_))
        ));
        assert!(!LayoutSaver::restore_in_progress());
        assert!(registry.is_sane(), "{:?}", registry.sanity_issues());
    }
}

#[test]
fn test_maximal_split_extents_restore() {
    for backend in BACKENDS {
        let mut registry = registry_with(backend, &["main1"]);
        let data = single_main_window_payload([0, 0, 999, 699], |ds| {
            ds.write_u8(2);
            ds.write_u8(0);
            ds.write_count(2);
            ds.write_i32(i32::MAX);
            write_frame(ds, &[]);
            ds.write_i32(i32::MAX);
            write_frame(ds, &["files"]);
        });

        assert!(LayoutSaver::new(&mut registry).restore_layout(&data));
        assert!(!LayoutSaver::restore_in_progress());

        let main1 = registry.main_window_by_name("main1").unwrap();
        assert_eq!(main1.layout().panel_names(), vec!["files"]);
        let files = registry.panel("files").unwrap().native();
        assert_eq!(registry.backend().geometry(files), Rect::new(0, 0, 1000, 700));
        assert!(registry.is_sane());
    }
}

#[test]
fn test_unknown_panels_are_skipped() {
    let mut source = arranged(BACKENDS[0]);
    let data = LayoutSaver::new(&mut source).serialize_layout();

    let mut target = DockRegistry::new(config(BACKENDS[0]));
    target.create_main_window("main1").unwrap();
    target.create_main_window("main2").unwrap();
    for name in ["files", "editor", "console"] {
        target.register_panel(name, name).unwrap();
    }

    assert!(LayoutSaver::new(&mut target).restore_layout(&data));
    let main1 = target.main_window_by_name("main1").unwrap();
    assert_eq!(main1.layout().panel_names(), vec!["files", "editor", "console"]);
    // search was the only panel of its floating window
    assert_eq!(target.floating_windows().count(), 0);
    assert!(target.closed_panels().is_empty());
    assert!(target.is_sane());
}

#[test]
fn test_panel_factory_recreates_missing_panels() {
    let mut source = arranged(BACKENDS[1]);
    let data = LayoutSaver::new(&mut source).serialize_layout();

    let mut target = DockRegistry::new(config(BACKENDS[1]));
    target.create_main_window("main1").unwrap();
    target.create_main_window("main2").unwrap();
    target.set_panel_factory(|name| Some(format!("restored {name}")));

    assert!(LayoutSaver::new(&mut target).restore_layout(&data));
    assert_eq!(describe(&target), describe(&source));
    assert_eq!(target.panel("outline").unwrap().title(), "restored outline");
}

#[test]
fn test_insane_registry_is_not_saved() {
    let mut registry = arranged(BACKENDS[0]);
    let main2 = registry.main_window_by_name("main2").unwrap().native();
    registry.backend_mut().destroy(main2);
    assert!(!registry.is_sane());

    assert!(LayoutSaver::new(&mut registry).serialize_layout().is_empty());
    assert!(matches!(
        LayoutSaver::new(&mut registry).try_serialize_layout(),
        Err(LayoutError::InsaneRegistry(_))
    ));

    let mut store = MemorySettings::new();
    assert!(!LayoutSaver::new(&mut registry).save_to_store(&mut store));
    assert_eq!(store.value(LAYOUT_GROUP, LAYOUT_KEY), None);
}

// ========================================================================
// Disk and the restore flag
// ========================================================================

fn disk_config() -> dockyard::DockConfig {
    let mut config = config(BACKENDS[0]);
    config.identity = ApplicationIdentity::new("Acme", "Docks");
    config
}

fn disk_source() -> DockRegistry {
    let mut registry = DockRegistry::new(disk_config());
    let main = registry.create_main_window("main1").unwrap();
    registry.register_panel("files", "Files").unwrap();
    registry
        .dock_panel("files", DockTarget::main(main, DockLocation::Left))
        .unwrap();
    registry
}

/// Registry whose panel factory records the restore flag it observes
fn observing_target(seen: Rc<Cell<Option<bool>>>) -> DockRegistry {
    let mut registry = DockRegistry::new(disk_config());
    registry.create_main_window("main1").unwrap();
    registry.set_panel_factory(move |name| {
        seen.set(Some(LayoutSaver::restore_in_progress()));
        Some(name.to_string())
    });
    registry
}

#[test]
fn test_disk_round_trip_sets_flag_only_during_restore() {
    let temp = TempDir::new().unwrap();
    let mut source = disk_source();
    assert!(LayoutSaver::new(&mut source)
        .with_settings_root(temp.path())
        .save_to_disk());
    assert!(temp.path().join("Acme").join("Docks.json").exists());

    let seen = Rc::new(Cell::new(None));
    let mut target = observing_target(Rc::clone(&seen));

    assert!(!LayoutSaver::restore_in_progress());
    assert!(LayoutSaver::new(&mut target)
        .with_settings_root(temp.path())
        .restore_from_disk());
    assert!(!LayoutSaver::restore_in_progress());

    assert_eq!(seen.get(), Some(true));
    assert_eq!(describe(&target), describe(&source));
}

#[test]
fn test_flag_is_reset_when_restore_fails() {
    let temp = TempDir::new().unwrap();
    let mut source = disk_source();
    let data = LayoutSaver::new(&mut source).serialize_layout();

    // Cut into the closed panel count so the main window phase succeeds
    let mut store = FileSettings::open(temp.path(), &disk_config().identity).unwrap();
    store
        .set_value(LAYOUT_GROUP, LAYOUT_KEY, &data[..data.len() - 2])
        .unwrap();

    let seen = Rc::new(Cell::new(None));
    let mut target = observing_target(Rc::clone(&seen));

    assert!(!LayoutSaver::new(&mut target)
        .with_settings_root(temp.path())
        .restore_from_disk());
    assert_eq!(seen.get(), Some(true));
    assert!(!LayoutSaver::restore_in_progress());
}

#[test]
fn test_disk_save_needs_identity() {
    let temp = TempDir::new().unwrap();
    let mut registry = DockRegistry::new(config(BACKENDS[0]));
    registry.create_main_window("main1").unwrap();

    let mut saver = LayoutSaver::new(&mut registry).with_settings_root(temp.path());
    assert!(!saver.save_to_disk());
    assert!(matches!(saver.try_save_to_disk(), Err(LayoutError::MissingIdentity)));
    assert!(!saver.restore_from_disk());
    assert!(!LayoutSaver::restore_in_progress());
}

#[test]
fn test_disk_save_rejects_identity_outside_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("settings");
    let mut config = config(BACKENDS[0]);
    config.identity = ApplicationIdentity::new("..", "escaped");
    let mut registry = DockRegistry::new(config);
    registry.create_main_window("main1").unwrap();

    let mut saver = LayoutSaver::new(&mut registry).with_settings_root(&root);
    assert!(matches!(saver.try_save_to_disk(), Err(LayoutError::MissingIdentity)));
    assert!(!temp.path().join("escaped.json").exists());
}

#[test]
fn test_missing_saved_layout_fails_restore() {
    let temp = TempDir::new().unwrap();
    let mut registry = disk_source();
    let before = describe(&registry);
    assert!(!LayoutSaver::new(&mut registry)
        .with_settings_root(temp.path())
        .restore_from_disk());
    assert_eq!(describe(&registry), before);
}
