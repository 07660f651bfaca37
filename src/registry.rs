//! Dock registry - the catalogue of windows and panels
//!
//! The registry owns every [`MainWindow`], [`FloatingWindow`] and [`Panel`]
//! record plus the ordered list of closed panels. Native objects live in
//! the backend and are only reached through [`NativeId`] handles.
//!
//! Enumeration order is creation order for both window kinds. The layout
//! saver relies on it: a floating window's parent is persisted as the index
//! of that main window in [`DockRegistry::main_windows`].
//!
//! Every panel is in exactly one place: docked in one window's layout,
//! floating bare, closed (with a placeholder) or unplaced.

use std::collections::{HashMap, HashSet};

use crate::backend::{create_backend, Backend, NativeId, NativeKind};
use crate::config::DockConfig;
use crate::error::LayoutError;
use crate::geometry::{Point, Rect, Size};
use crate::layout::{DockLocation, Removal};
use crate::panel::{ClosedPanelRecord, LastPosition, Panel, PanelLocation};
use crate::window::{DockWindow, FloatingWindow, FloatingWindowId, Host, MainWindow, MainWindowId};

/// Creates panels that a restored layout names but the application has not
/// registered yet. Returns the panel title, or `None` to skip the panel.
pub type PanelFactory = Box<dyn FnMut(&str) -> Option<String>>;

/// Where [`DockRegistry::dock_panel`] puts a panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockTarget {
    pub host: Host,
    pub location: DockLocation,
    /// Dock relative to this panel instead of the whole window
    pub relative_to: Option<String>,
}

impl DockTarget {
    pub fn main(id: MainWindowId, location: DockLocation) -> Self {
        Self {
            host: Host::Main(id),
            location,
            relative_to: None,
        }
    }

    pub fn floating(id: FloatingWindowId, location: DockLocation) -> Self {
        Self {
            host: Host::Floating(id),
            location,
            relative_to: None,
        }
    }

    pub fn relative_to(mut self, panel: impl Into<String>) -> Self {
        self.relative_to = Some(panel.into());
        self
    }
}

pub struct DockRegistry {
    config: DockConfig,
    backend: Box<dyn Backend>,
    main_windows: Vec<MainWindow>,
    floating_windows: Vec<FloatingWindow>,
    panels: Vec<Panel>,
    closed: Vec<String>,
    panel_factory: Option<PanelFactory>,
    next_window_id: u64,
}

impl DockRegistry {
    /// Create a registry driving the backend selected in `config`
    pub fn new(config: DockConfig) -> Self {
        let backend = create_backend(config.backend, config.backend_options());
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: DockConfig, backend: Box<dyn Backend>) -> Self {
        Self {
            config,
            backend,
            main_windows: Vec::new(),
            floating_windows: Vec::new(),
            panels: Vec::new(),
            closed: Vec::new(),
            panel_factory: None,
            next_window_id: 1,
        }
    }

    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }

    pub fn set_panel_factory(&mut self, factory: impl FnMut(&str) -> Option<String> + 'static) {
        self.panel_factory = Some(Box::new(factory));
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Main windows in creation order
    pub fn main_windows(&self) -> &[MainWindow] {
        &self.main_windows
    }

    pub fn main_window(&self, id: MainWindowId) -> Option<&MainWindow> {
        self.main_windows.iter().find(|w| w.id() == id)
    }

    pub fn main_window_by_name(&self, name: &str) -> Option<&MainWindow> {
        self.main_windows.iter().find(|w| w.name() == name)
    }

    /// Position of a main window in [`Self::main_windows`]
    pub fn main_window_index(&self, id: MainWindowId) -> Option<usize> {
        self.main_windows.iter().position(|w| w.id() == id)
    }

    /// Floating windows in creation order, excluding those awaiting
    /// deferred deletion
    pub fn floating_windows(&self) -> impl Iterator<Item = &FloatingWindow> + '_ {
        self.floating_windows
            .iter()
            .filter(|w| !self.backend.is_being_deleted(w.native()))
    }

    pub fn floating_window(&self, id: FloatingWindowId) -> Option<&FloatingWindow> {
        self.floating_windows().find(|w| w.id() == id)
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.name() == name)
    }

    /// Closed panel names, oldest first
    pub fn closed_panels(&self) -> &[String] {
        &self.closed
    }

    pub fn window(&self, host: Host) -> Option<&dyn DockWindow> {
        match host {
            Host::Main(id) => self.main_window(id).map(|w| w as &dyn DockWindow),
            Host::Floating(id) => self.floating_window(id).map(|w| w as &dyn DockWindow),
        }
    }

    fn window_mut(&mut self, host: Host) -> Option<&mut dyn DockWindow> {
        match host {
            Host::Main(id) => self
                .main_windows
                .iter_mut()
                .find(|w| w.id() == id)
                .map(|w| w as &mut dyn DockWindow),
            Host::Floating(id) => self
                .floating_windows
                .iter_mut()
                .find(|w| w.id() == id)
                .map(|w| w as &mut dyn DockWindow),
        }
    }

    pub(crate) fn main_window_mut(&mut self, id: MainWindowId) -> Option<&mut MainWindow> {
        self.main_windows.iter_mut().find(|w| w.id() == id)
    }

    pub(crate) fn floating_window_mut(&mut self, id: FloatingWindowId) -> Option<&mut FloatingWindow> {
        self.floating_windows.iter_mut().find(|w| w.id() == id)
    }

    fn panel_index(&self, name: &str) -> Result<usize, LayoutError> {
        self.panels
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| LayoutError::UnknownPanel(name.to_string()))
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_window_id;
        self.next_window_id += 1;
        id
    }

    // ========================================================================
    // Windows and panels
    // ========================================================================

    /// Create a visible main window. Its name must be unique and non-empty.
    pub fn create_main_window(&mut self, name: &str) -> Result<MainWindowId, LayoutError> {
        if name.is_empty() {
            return Err(LayoutError::EmptyName("main window"));
        }
        if self.main_window_by_name(name).is_some() {
            return Err(LayoutError::DuplicateName {
                kind: "main window",
                name: name.to_string(),
            });
        }

        let id = MainWindowId(self.next_id());
        let native = self.backend.create(NativeKind::MainWindow);
        self.backend.set_geometry(
            native,
            Rect::from_origin_size(Point::default(), self.config.main_window_size),
        );
        self.backend.set_visible(native, true);
        self.main_windows.push(MainWindow::new(id, name.to_string(), native));
        self.relayout(Host::Main(id));

        tracing::info!(name, %native, "main window created");
        Ok(id)
    }

    /// Destroy a main window. Its panels become unplaced; floating windows
    /// it parents are destroyed along with it.
    pub fn remove_main_window(&mut self, id: MainWindowId) -> Result<(), LayoutError> {
        let index = self.main_window_index(id).ok_or(LayoutError::StaleWindow)?;

        let orphans: Vec<FloatingWindowId> = self
            .floating_windows
            .iter()
            .filter(|w| w.parent() == Some(id))
            .map(FloatingWindow::id)
            .collect();
        let hosted = |host: Host| match host {
            Host::Main(main) => main == id,
            Host::Floating(floating) => orphans.contains(&floating),
        };

        for panel in &mut self.panels {
            if let PanelLocation::Docked(host) = panel.location {
                if hosted(host) {
                    self.backend.set_visible(panel.native(), false);
                    self.backend.set_parent(panel.native(), None);
                    panel.location = PanelLocation::Unplaced;
                }
            }
        }

        let backend = &mut self.backend;
        self.floating_windows.retain(|w| {
            if orphans.contains(&w.id()) {
                backend.destroy(w.native());
                false
            } else {
                true
            }
        });

        let window = self.main_windows.remove(index);
        self.backend.destroy(window.native());
        tracing::info!(name = window.name(), "main window removed");
        Ok(())
    }

    /// Register a panel under a unique, non-empty name. It starts hidden
    /// and unplaced.
    pub fn register_panel(&mut self, name: &str, title: impl Into<String>) -> Result<(), LayoutError> {
        if name.is_empty() {
            return Err(LayoutError::EmptyName("panel"));
        }
        if self.panel(name).is_some() {
            return Err(LayoutError::DuplicateName {
                kind: "panel",
                name: name.to_string(),
            });
        }
        let native = self.backend.create(NativeKind::Panel);
        self.panels.push(Panel::new(name.to_string(), title.into(), native));
        tracing::debug!(name, %native, "panel registered");
        Ok(())
    }

    pub fn set_panel_minimum_size(&mut self, name: &str, size: Size) -> Result<(), LayoutError> {
        let index = self.panel_index(name)?;
        let panel = &mut self.panels[index];
        panel.minimum_size = size;
        let (native, location) = (panel.native(), panel.location);
        self.backend.set_content_minimum_size(native, size);
        if let PanelLocation::Docked(host) = location {
            self.relayout(host);
        }
        Ok(())
    }

    /// Dock a panel into a window, taking it out of wherever it was.
    /// Docking a closed panel reopens it there.
    pub fn dock_panel(&mut self, name: &str, target: DockTarget) -> Result<(), LayoutError> {
        let index = self.panel_index(name)?;
        let host_native = self
            .window(target.host)
            .map(|w| w.native())
            .ok_or(LayoutError::StaleWindow)?;

        if let Some(relative) = target.relative_to.as_deref() {
            let present = self
                .window(target.host)
                .is_some_and(|w| w.layout().contains(relative));
            if relative == name || !present {
                return Err(LayoutError::UnknownPanel(relative.to_string()));
            }
        }

        // Re-docking the only panel of a window into that same window
        if self.panels[index].location == PanelLocation::Docked(target.host)
            && self
                .window(target.host)
                .is_some_and(|w| w.layout().panel_names().len() == 1)
        {
            return Ok(());
        }

        self.detach_panel(index);
        if self.window(target.host).is_none() {
            return Err(LayoutError::StaleWindow);
        }

        let inserted = self.window_mut(target.host).is_some_and(|w| {
            w.layout_mut()
                .insert(name, target.location, target.relative_to.as_deref())
        });
        if !inserted {
            return Err(LayoutError::UnknownPanel(
                target.relative_to.unwrap_or_else(|| name.to_string()),
            ));
        }

        let panel = &mut self.panels[index];
        panel.location = PanelLocation::Docked(target.host);
        self.backend.set_parent(panel.native(), Some(host_native));
        self.relayout(target.host);

        tracing::debug!(name, host = %target.host, location = ?target.location, "panel docked");
        Ok(())
    }

    /// Float a panel on its own, outside any floating window. Bare panels
    /// are morphed into floating windows before the layout is saved.
    pub fn float_panel(&mut self, name: &str, rect: Rect) -> Result<(), LayoutError> {
        let index = self.panel_index(name)?;
        self.detach_panel(index);

        let panel = &mut self.panels[index];
        panel.location = PanelLocation::FloatingBare;
        panel.floating_geometry = Some(rect);
        let native = panel.native();
        self.backend.set_geometry(native, rect);
        self.backend.set_visible(native, true);

        tracing::debug!(name, ?rect, "panel floating bare");
        Ok(())
    }

    /// Float a panel in a new floating window, optionally tied to a main
    /// window
    pub fn float_panel_in_window(
        &mut self,
        name: &str,
        rect: Rect,
        parent: Option<MainWindowId>,
    ) -> Result<FloatingWindowId, LayoutError> {
        let index = self.panel_index(name)?;
        if parent.is_some_and(|id| self.main_window(id).is_none()) {
            return Err(LayoutError::StaleWindow);
        }
        self.detach_panel(index);

        let id = self.create_floating_window(parent);
        let host = Host::Floating(id);
        let Some(window) = self.floating_window_mut(id) else {
            return Err(LayoutError::StaleWindow);
        };
        window.layout_mut().insert(name, DockLocation::Left, None);
        let window_native = window.native();

        let panel = &mut self.panels[index];
        panel.location = PanelLocation::Docked(host);
        panel.floating_geometry = Some(rect);
        self.backend.set_parent(panel.native(), Some(window_native));
        self.backend.set_geometry(window_native, rect);
        self.backend.set_visible(window_native, true);
        self.relayout(host);

        tracing::debug!(name, window = id.0, "panel floated in a new window");
        Ok(id)
    }

    /// Close a panel, remembering where it was
    pub fn close_panel(&mut self, name: &str) -> Result<(), LayoutError> {
        let index = self.panel_index(name)?;
        let native = self.panels[index].native();

        match self.panels[index].location {
            PanelLocation::Closed => return Ok(()),
            PanelLocation::Docked(host) => {
                let main_window = match host {
                    Host::Main(id) => self.main_window(id).map(|w| w.name().to_string()),
                    Host::Floating(_) => None,
                };
                if let Host::Floating(id) = host {
                    let geometry = self
                        .floating_window(id)
                        .map(|w| self.backend.geometry(w.native()));
                    if geometry.is_some() {
                        self.panels[index].floating_geometry = geometry;
                    }
                }
                let removal = self.take_from_host(index, host);
                self.panels[index].last_position =
                    removal.map(|Removal { peer, location }| LastPosition {
                        main_window,
                        peer,
                        location,
                    });
            }
            PanelLocation::FloatingBare => {
                self.panels[index].floating_geometry = Some(self.backend.geometry(native));
                self.panels[index].last_position = None;
            }
            PanelLocation::Unplaced => {
                self.panels[index].last_position = None;
            }
        }

        self.backend.set_visible(native, false);
        self.backend.set_parent(native, None);
        self.panels[index].location = PanelLocation::Closed;
        self.closed.push(name.to_string());

        tracing::debug!(name, "panel closed");
        Ok(())
    }

    /// Show a closed panel again at its placeholder: next to the panel it
    /// was last docked with, else at the recorded edge of its main window,
    /// else floating at its last floating geometry.
    pub fn reopen_panel(&mut self, name: &str) -> Result<(), LayoutError> {
        let index = self.panel_index(name)?;
        if !self.panels[index].is_closed() {
            return Ok(());
        }
        let position = self.panels[index].last_position.clone();
        let geometry = self.panels[index].floating_geometry;

        if let Some(position) = position {
            if let Some(peer) = position.peer {
                if let Some(PanelLocation::Docked(host)) = self.panel(&peer).map(Panel::location) {
                    let target = DockTarget {
                        host,
                        location: position.location,
                        relative_to: Some(peer),
                    };
                    return self.dock_panel(name, target);
                }
            }
            let main = position
                .main_window
                .as_deref()
                .and_then(|n| self.main_window_by_name(n))
                .map(MainWindow::id);
            if let Some(main) = main {
                return self.dock_panel(name, DockTarget::main(main, position.location));
            }
        }

        let rect = geometry
            .unwrap_or_else(|| Rect::from_origin_size(Point::new(100, 100), self.config.floating_size));
        self.float_panel_in_window(name, rect, None).map(|_| ())
    }

    /// Wrap every bare floating panel into a floating window with the
    /// panel's geometry
    pub fn ensure_all_floating_panels_are_morphed(&mut self) {
        let bare: Vec<usize> = self
            .panels
            .iter()
            .enumerate()
            .filter(|(_, p)| p.location == PanelLocation::FloatingBare)
            .map(|(i, _)| i)
            .collect();

        for index in bare {
            let native = self.panels[index].native();
            let rect = self.backend.geometry(native);
            let visible = self.backend.is_visible(native);

            let name = self.panels[index].name().to_string();

            let id = self.create_floating_window(None);
            let host = Host::Floating(id);
            let Some(window) = self.floating_window_mut(id) else {
                continue;
            };
            window.layout_mut().insert(&name, DockLocation::Left, None);
            let window_native = window.native();

            self.panels[index].location = PanelLocation::Docked(host);
            self.backend.set_parent(native, Some(window_native));
            self.backend.set_geometry(window_native, rect);
            self.backend.set_visible(window_native, visible);
            self.relayout(host);

            tracing::debug!(name = name.as_str(), window = id.0, "bare floating panel morphed");
        }
    }

    /// Perform pending deferred deletions. Floating windows whose native
    /// was destroyed are dropped; returns how many.
    pub fn process_events(&mut self) -> usize {
        let destroyed: HashSet<NativeId> = self.backend.process_events().into_iter().collect();
        if destroyed.is_empty() {
            return 0;
        }

        let before = self.floating_windows.len();
        self.floating_windows
            .retain(|w| !destroyed.contains(&w.native()));
        let removed = before - self.floating_windows.len();

        let lost: Vec<String> = self
            .panels
            .iter()
            .filter(|p| destroyed.contains(&p.native()))
            .map(|p| p.name().to_string())
            .collect();
        for name in &lost {
            tracing::warn!(name = name.as_str(), "panel destroyed with its window");
        }
        self.panels.retain(|p| !destroyed.contains(&p.native()));
        self.closed.retain(|n| !lost.contains(n));

        if removed > 0 {
            tracing::debug!(removed, "floating windows deleted");
        }
        removed
    }

    // ========================================================================
    // Sanity and clearing
    // ========================================================================

    pub fn is_sane(&self) -> bool {
        self.sanity_issues().is_empty()
    }

    /// Every consistency violation found, described for logs
    pub fn sanity_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let mut names = HashSet::new();
        for window in &self.main_windows {
            if window.name().is_empty() {
                issues.push(format!("main window #{} has no name", window.id().0));
            } else if !names.insert(window.name()) {
                issues.push(format!("duplicate main window name '{}'", window.name()));
            }
        }

        let hosts = self
            .main_windows
            .iter()
            .map(|w| (Host::Main(w.id()), w as &dyn DockWindow))
            .chain(
                self.floating_windows()
                    .map(|w| (Host::Floating(w.id()), w as &dyn DockWindow)),
            );

        let mut slots: HashMap<&str, String> = HashMap::new();
        for (host, window) in hosts {
            if !self.backend.exists(window.native()) {
                issues.push(format!("{host} lost its native window"));
            }
            if window.layout().frames().iter().any(|f| f.panels.is_empty()) {
                issues.push(format!("{host} has an empty frame"));
            }
            for name in window.layout().panel_names() {
                match self.panel(name) {
                    None => issues.push(format!("{host} references unregistered panel '{name}'")),
                    Some(panel) if panel.location != PanelLocation::Docked(host) => issues.push(
                        format!("panel '{name}' is in {host} but recorded as {:?}", panel.location),
                    ),
                    Some(_) => {}
                }
                if let Some(previous) = slots.insert(name, host.to_string()) {
                    issues.push(format!("panel '{name}' is in both {previous} and {host}"));
                }
            }
        }

        for window in self.floating_windows() {
            if let Some(parent) = window.parent() {
                if self.main_window(parent).is_none() {
                    issues.push(format!(
                        "floating window #{} has a dead parent #{}",
                        window.id().0,
                        parent.0
                    ));
                }
            }
        }

        for name in &self.closed {
            match self.panel(name) {
                None => issues.push(format!("closed list names unregistered panel '{name}'")),
                Some(panel) if !panel.is_closed() => {
                    issues.push(format!("panel '{name}' is listed as closed but is {:?}", panel.location))
                }
                Some(_) => {}
            }
            if let Some(previous) = slots.insert(name.as_str(), "the closed list".to_string()) {
                issues.push(format!("panel '{name}' is in both {previous} and the closed list"));
            }
        }

        for panel in &self.panels {
            if !self.backend.exists(panel.native()) {
                issues.push(format!("panel '{}' lost its native object", panel.name()));
            }
            match panel.location {
                PanelLocation::Docked(host) => {
                    if !self
                        .window(host)
                        .is_some_and(|w| w.layout().contains(panel.name()))
                    {
                        issues.push(format!("panel '{}' claims {host} but is not in it", panel.name()));
                    }
                }
                PanelLocation::Closed if !self.closed.iter().any(|n| n == panel.name()) => {
                    issues.push(format!("closed panel '{}' is missing from the closed list", panel.name()));
                }
                _ => {}
            }
        }

        issues
    }

    /// Reset to an empty arrangement: every panel hidden and unparented,
    /// floating windows destroyed, closed list emptied and main window
    /// layouts cleared. Main windows and panel registrations survive.
    pub fn clear(&mut self, delete_static_anchors: bool) {
        for panel in &mut self.panels {
            self.backend.set_visible(panel.native(), false);
            self.backend.set_parent(panel.native(), None);
            panel.location = PanelLocation::Unplaced;
            panel.last_position = None;
            panel.floating_geometry = None;
        }

        for window in self.floating_windows.drain(..) {
            self.backend.destroy(window.native());
        }
        self.closed.clear();

        for window in &mut self.main_windows {
            window.layout_mut().clear(delete_static_anchors);
            self.backend
                .set_content_minimum_size(window.native(), Size::default());
        }

        tracing::debug!(delete_static_anchors, "registry cleared");
    }

    // ========================================================================
    // Restore support
    // ========================================================================

    /// Create an empty, hidden floating window
    pub(crate) fn create_floating_window(&mut self, parent: Option<MainWindowId>) -> FloatingWindowId {
        let id = FloatingWindowId(self.next_id());
        let native = self.backend.create(NativeKind::FloatingWindow);
        self.backend
            .set_window_flags(native, self.config.floating_window_flags());

        let parent_native = parent.and_then(|p| self.main_window(p)).map(|w| w.native());
        if let Some(parent_native) = parent_native {
            self.backend.set_transient_parent(native, Some(parent_native));
            self.backend.set_parent(native, Some(parent_native));
        }

        self.floating_windows.push(FloatingWindow::new(
            id,
            native,
            parent_native.and(parent),
        ));
        id
    }

    /// Destroy a floating window right away. Its layout must be empty.
    pub(crate) fn discard_floating_window(&mut self, id: FloatingWindowId) {
        if let Some(index) = self.floating_windows.iter().position(|w| w.id() == id) {
            let window = self.floating_windows.remove(index);
            self.backend.destroy(window.native());
        }
    }

    /// Apply saved geometry and visibility to a window
    pub(crate) fn apply_placement(&mut self, host: Host, rect: Rect, visible: bool) {
        let Some(native) = self.window_mut(host).map(|w| w.native()) else {
            return;
        };
        self.backend.set_geometry(native, rect);
        self.backend.set_visible(native, visible);
    }

    /// Bind the panels named in a freshly read layout to the window: resolve
    /// each name, drop what cannot be resolved, re-parent and lay out.
    pub(crate) fn adopt_layout(&mut self, host: Host) {
        let Some(names) = self.window_mut(host).map(|w| {
            w.layout()
                .panel_names()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        }) else {
            return;
        };

        let mut resolvable = HashSet::new();
        for name in names {
            if self.resolve_restored_panel(&name) {
                resolvable.insert(name);
            }
        }

        let mut seen = HashSet::new();
        let Some(window) = self.window_mut(host) else {
            return;
        };
        let dropped = window
            .layout_mut()
            .retain_panels(|name| resolvable.contains(name) && seen.insert(name.to_string()));
        let window_native = window.native();
        let kept: Vec<String> = window
            .layout()
            .panel_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        for name in dropped {
            tracing::warn!(name = name.as_str(), %host, "panel in saved layout is unknown or already placed, skipping");
        }

        for name in kept {
            if let Some(panel) = self.panels.iter_mut().find(|p| p.name() == name) {
                panel.location = PanelLocation::Docked(host);
                self.backend.set_parent(panel.native(), Some(window_native));
            }
        }
        self.relayout(host);
    }

    /// Re-register a closed panel from a saved record
    pub(crate) fn restore_closed_panel(&mut self, record: ClosedPanelRecord) {
        if !self.resolve_restored_panel(&record.name) {
            tracing::warn!(name = record.name.as_str(), "closed panel is unknown or already placed, skipping");
            return;
        }
        let Some(panel) = self.panels.iter_mut().find(|p| p.name() == record.name) else {
            return;
        };
        panel.floating_geometry = record.floating_geometry;
        panel.last_position = record.last_position;
        panel.location = PanelLocation::Closed;
        self.closed.push(record.name);
    }

    /// A restored name is usable if it names an unplaced panel, or if the
    /// panel factory creates it
    fn resolve_restored_panel(&mut self, name: &str) -> bool {
        if let Some(panel) = self.panel(name) {
            return panel.location == PanelLocation::Unplaced;
        }
        let title = self.panel_factory.as_mut().and_then(|factory| factory(name));
        match title {
            Some(title) => self.register_panel(name, title).is_ok(),
            None => false,
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Remove a panel from wherever it is, leaving it hidden and unplaced
    fn detach_panel(&mut self, index: usize) {
        let native = self.panels[index].native();
        match self.panels[index].location {
            PanelLocation::Docked(host) => {
                self.take_from_host(index, host);
            }
            PanelLocation::FloatingBare => {
                self.panels[index].floating_geometry = Some(self.backend.geometry(native));
            }
            PanelLocation::Closed => {
                let name = self.panels[index].name().to_string();
                self.closed.retain(|n| *n != name);
            }
            PanelLocation::Unplaced => {}
        }
        self.backend.set_visible(native, false);
        self.backend.set_parent(native, None);
        self.panels[index].location = PanelLocation::Unplaced;
    }

    /// Take a docked panel out of its window's layout. An emptied floating
    /// window is hidden, which schedules its deletion.
    fn take_from_host(&mut self, index: usize, host: Host) -> Option<Removal> {
        let name = self.panels[index].name().to_string();
        let native = self.panels[index].native();

        let removal = self
            .window_mut(host)
            .and_then(|w| w.layout_mut().remove(&name));
        self.backend.set_visible(native, false);
        self.backend.set_parent(native, None);
        self.panels[index].location = PanelLocation::Unplaced;

        let emptied = match host {
            Host::Floating(_) => self
                .window(host)
                .filter(|w| w.layout().is_empty())
                .map(|w| w.native()),
            Host::Main(_) => None,
        };
        match emptied {
            Some(window_native) => self.backend.set_visible(window_native, false),
            None => self.relayout(host),
        }
        removal
    }

    /// Push the layout minimum to the window, then place every panel in the
    /// window's content area
    fn relayout(&mut self, host: Host) {
        let title_bar_height = self.config.title_bar_height;
        let Self {
            main_windows,
            floating_windows,
            panels,
            backend,
            ..
        } = self;

        let window: &mut dyn DockWindow = match host {
            Host::Main(id) => match main_windows.iter_mut().find(|w| w.id() == id) {
                Some(window) => window,
                None => return,
            },
            Host::Floating(id) => match floating_windows.iter_mut().find(|w| w.id() == id) {
                Some(window) => window,
                None => return,
            },
        };

        let panel_minimum = |name: &str| {
            panels
                .iter()
                .find(|p| p.name() == name)
                .map(Panel::minimum_size)
                .unwrap_or_default()
        };
        let minimum = window.layout().minimum_size(&panel_minimum);
        let native = window.native();
        backend.set_content_minimum_size(native, minimum);

        let area = window.content_area(backend.geometry(native), title_bar_height);
        for placement in window.layout_mut().layout(area) {
            if let Some(panel) = panels.iter().find(|p| p.name() == placement.panel) {
                backend.set_geometry(panel.native(), placement.rect);
                backend.set_visible(panel.native(), placement.is_current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DockRegistry {
        DockRegistry::new(DockConfig::default())
    }

    fn with_panels(names: &[&str]) -> (DockRegistry, MainWindowId) {
        let mut registry = registry();
        let main = registry.create_main_window("main").unwrap();
        for name in names {
            registry.register_panel(name, name.to_uppercase()).unwrap();
        }
        (registry, main)
    }

    #[test]
    fn test_main_window_names_are_validated() {
        let mut registry = registry();
        registry.create_main_window("main").unwrap();
        assert!(matches!(
            registry.create_main_window("main"),
            Err(LayoutError::DuplicateName { .. })
        ));
        assert!(matches!(
            registry.create_main_window(""),
            Err(LayoutError::EmptyName(_))
        ));
    }

    #[test]
    fn test_dock_relative_to_missing_panel_fails() {
        let (mut registry, main) = with_panels(&["a", "b"]);
        registry
            .dock_panel("a", DockTarget::main(main, DockLocation::Left))
            .unwrap();
        let result = registry.dock_panel(
            "b",
            DockTarget::main(main, DockLocation::Right).relative_to("nope"),
        );
        assert!(matches!(result, Err(LayoutError::UnknownPanel(name)) if name == "nope"));
        assert_eq!(registry.panel("b").unwrap().location(), PanelLocation::Unplaced);
        assert!(registry.is_sane());
    }

    #[test]
    fn test_docked_panels_get_parented_and_placed() {
        let (mut registry, main) = with_panels(&["a", "b"]);
        registry
            .dock_panel("a", DockTarget::main(main, DockLocation::Left))
            .unwrap();
        registry
            .dock_panel("b", DockTarget::main(main, DockLocation::Tab).relative_to("a"))
            .unwrap();

        let window_native = registry.main_window(main).unwrap().native();
        let a = registry.panel("a").unwrap().native();
        let b = registry.panel("b").unwrap().native();
        assert_eq!(registry.backend().parent(a), Some(window_native));
        // Only the current tab is shown
        assert!(!registry.backend().is_visible(a));
        assert!(registry.backend().is_visible(b));
    }

    #[test]
    fn test_emptied_floating_window_is_deleted_later() {
        let (mut registry, _) = with_panels(&["a"]);
        let id = registry
            .float_panel_in_window("a", Rect::new(50, 50, 300, 200), None)
            .unwrap();
        let native = registry.floating_window(id).unwrap().native();

        registry.close_panel("a").unwrap();
        // Awaiting deletion: no longer enumerated, still alive
        assert_eq!(registry.floating_windows().count(), 0);
        assert!(registry.backend().exists(native));

        assert_eq!(registry.process_events(), 1);
        assert!(!registry.backend().exists(native));
        // The panel was taken out before its window went away
        assert!(registry.backend().exists(registry.panel("a").unwrap().native()));
    }

    #[test]
    fn test_remove_main_window_releases_panels() {
        let (mut registry, main) = with_panels(&["a", "b"]);
        registry
            .dock_panel("a", DockTarget::main(main, DockLocation::Left))
            .unwrap();
        registry
            .float_panel_in_window("b", Rect::new(0, 0, 200, 200), Some(main))
            .unwrap();

        registry.remove_main_window(main).unwrap();
        assert!(registry.main_windows().is_empty());
        assert_eq!(registry.floating_windows().count(), 0);
        for name in ["a", "b"] {
            let panel = registry.panel(name).unwrap();
            assert_eq!(panel.location(), PanelLocation::Unplaced);
            assert!(registry.backend().exists(panel.native()));
        }
        assert!(registry.is_sane());
    }

    #[test]
    fn test_clear_keeps_registrations() {
        let (mut registry, main) = with_panels(&["a", "b"]);
        registry
            .dock_panel("a", DockTarget::main(main, DockLocation::Left))
            .unwrap();
        registry.float_panel("b", Rect::new(0, 0, 200, 200)).unwrap();

        registry.clear(true);
        assert_eq!(registry.panels().len(), 2);
        assert!(registry.main_window(main).unwrap().layout().is_empty());
        assert!(registry
            .panels()
            .iter()
            .all(|p| p.location() == PanelLocation::Unplaced));
    }

    #[test]
    fn test_sanity_reports_inconsistent_location() {
        let (mut registry, main) = with_panels(&["a"]);
        registry
            .dock_panel("a", DockTarget::main(main, DockLocation::Left))
            .unwrap();
        registry.panels[0].location = PanelLocation::Unplaced;
        let issues = registry.sanity_issues();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("'a'"));
    }

    #[test]
    fn test_factory_creates_restored_panels() {
        let mut registry = registry();
        registry.set_panel_factory(|name| name.starts_with("doc").then(|| format!("Document {name}")));
        assert!(registry.resolve_restored_panel("doc-1"));
        assert_eq!(registry.panel("doc-1").unwrap().title(), "Document doc-1");
        assert!(!registry.resolve_restored_panel("other"));
    }
}
