//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use dockyard::window::DockWindow;
use dockyard::{
    BackendKind, DockConfig, DockLocation, DockRegistry, DockTarget, MainWindowId, Rect,
};

pub const BACKENDS: [BackendKind; 2] = [BackendKind::Widgets, BackendKind::Quick];

pub const PANELS: [&str; 6] = ["files", "editor", "console", "outline", "search", "notes"];

pub fn config(backend: BackendKind) -> DockConfig {
    DockConfig {
        backend,
        ..DockConfig::default()
    }
}

/// Registry with the given main windows and every name in [`PANELS`]
/// registered, nothing placed
pub fn registry_with(backend: BackendKind, main_windows: &[&str]) -> DockRegistry {
    let mut registry = DockRegistry::new(config(backend));
    for name in main_windows {
        registry.create_main_window(name).unwrap();
    }
    for name in PANELS {
        registry.register_panel(name, name.to_uppercase()).unwrap();
    }
    registry
}

pub fn main_id(registry: &DockRegistry, name: &str) -> MainWindowId {
    registry.main_window_by_name(name).unwrap().id()
}

/// `main1` holds files | editor over console with outline tabbed on files;
/// search floats in a window parented to `main2`; notes is closed
pub fn arranged(backend: BackendKind) -> DockRegistry {
    let mut registry = registry_with(backend, &["main1", "main2"]);
    let main1 = main_id(&registry, "main1");
    let main2 = main_id(&registry, "main2");

    registry
        .dock_panel("editor", DockTarget::main(main1, DockLocation::Left))
        .unwrap();
    registry
        .dock_panel("files", DockTarget::main(main1, DockLocation::Left))
        .unwrap();
    registry
        .dock_panel("console", DockTarget::main(main1, DockLocation::Bottom))
        .unwrap();
    registry
        .dock_panel(
            "outline",
            DockTarget::main(main1, DockLocation::Tab).relative_to("files"),
        )
        .unwrap();
    registry
        .float_panel_in_window("search", Rect::new(40, 60, 320, 240), Some(main2))
        .unwrap();
    registry
        .dock_panel(
            "notes",
            DockTarget::main(main1, DockLocation::Right).relative_to("editor"),
        )
        .unwrap();
    registry.close_panel("notes").unwrap();
    registry
}

/// Human-readable description of everything a layout restore reproduces:
/// window geometry, visibility, frames and closed panels
pub fn describe(registry: &DockRegistry) -> Vec<String> {
    fn frames(window: &dyn DockWindow) -> String {
        window
            .layout()
            .frames()
            .iter()
            .map(|f| format!("{:?}@{}", f.panels, f.current))
            .collect::<Vec<_>>()
            .join(" ")
    }

    let backend = registry.backend();

    let mut lines = Vec::new();
    for window in registry.main_windows() {
        lines.push(format!(
            "main {} {:?} visible={} {}",
            window.name(),
            backend.geometry(window.native()),
            backend.is_visible(window.native()),
            frames(window)
        ));
    }
    for window in registry.floating_windows() {
        let parent = window
            .parent()
            .and_then(|id| registry.main_window(id))
            .map(|w| w.name().to_string());
        lines.push(format!(
            "floating parent={:?} {:?} visible={} {}",
            parent,
            backend.geometry(window.native()),
            backend.is_visible(window.native()),
            frames(window)
        ));
    }
    lines.push(format!("closed {:?}", registry.closed_panels()));
    lines
}
