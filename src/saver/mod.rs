//! Layout saver - save and restore the whole docking arrangement
//!
//! The byte stream written by [`LayoutSaver::serialize_layout`] is big-endian
//! and `QDataStream` compatible:
//!
//! ```text
//! i32 main window count
//!   string name; rect geometry; bool visible; main window payload
//! i32 floating window count
//!   i32 parent main window index (-1 = none); rect; bool; floating window payload
//! i32 closed panel count
//!   closed panel payload
//! ```
//!
//! Each window's geometry and visibility are applied before its payload is
//! read. Main windows are matched by name and must already exist; floating
//! windows are recreated, and their parent index refers to the position of
//! the main window in the registry's creation order.
//!
//! The facade methods return `bool` and log failures; every one of them has
//! a `try_*` twin returning [`LayoutError`].

mod settings;

use std::path::PathBuf;

use bytes::Bytes;

pub use settings::{FileSettings, MemorySettings, SettingsStore, LAYOUT_GROUP, LAYOUT_KEY};

use crate::config::ApplicationIdentity;
use crate::error::LayoutError;
use crate::panel::ClosedPanelRecord;
use crate::registry::DockRegistry;
use crate::restore_session::{RestorePhase, RestoreSession};
use crate::stream::{DataStreamReader, DataStreamWriter};
use crate::window::{DockWindow, FloatingWindow, Host, LayoutPayload, MainWindow, MainWindowId};

/// Saves and restores the layout of a [`DockRegistry`]
pub struct LayoutSaver<'a> {
    registry: &'a mut DockRegistry,
    settings_root: Option<PathBuf>,
}

impl<'a> LayoutSaver<'a> {
    pub fn new(registry: &'a mut DockRegistry) -> Self {
        Self {
            registry,
            settings_root: None,
        }
    }

    /// Use `root` instead of the default settings directory for the disk
    /// variants
    pub fn with_settings_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.settings_root = Some(root.into());
        self
    }

    /// True while a restore is replaying a layout on this thread
    pub fn restore_in_progress() -> bool {
        crate::restore_session::restore_in_progress()
    }

    // ========================================================================
    // bool facade
    // ========================================================================

    /// Save to the application's settings store. Needs both organization and
    /// application names in the configuration.
    pub fn save_to_disk(&mut self) -> bool {
        report("save layout to disk", self.try_save_to_disk())
    }

    pub fn restore_from_disk(&mut self) -> bool {
        report("restore layout from disk", self.try_restore_from_disk())
    }

    pub fn save_to_store(&mut self, store: &mut dyn SettingsStore) -> bool {
        report("save layout", self.try_save_to_store(store))
    }

    pub fn restore_from_store(&mut self, store: &dyn SettingsStore) -> bool {
        report("restore layout", self.try_restore_from_store(store))
    }

    /// Serialized layout, or empty bytes if the registry is not sane
    pub fn serialize_layout(&mut self) -> Bytes {
        match self.try_serialize_layout() {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("Failed to serialize layout: {}", e);
                Bytes::new()
            }
        }
    }

    /// Replace the current arrangement with the one in `data`
    pub fn restore_layout(&mut self, data: &[u8]) -> bool {
        report("restore layout", self.try_restore_layout(data))
    }

    // ========================================================================
    // Result variants
    // ========================================================================

    pub fn try_save_to_disk(&mut self) -> Result<(), LayoutError> {
        let identity = self.identity()?;
        let mut store = self.open_file_store(&identity)?;
        self.try_save_to_store(&mut store)?;
        tracing::info!("Saved layout to {}", store.path().display());
        Ok(())
    }

    pub fn try_restore_from_disk(&mut self) -> Result<(), LayoutError> {
        let _session = RestoreSession::begin();
        let identity = self.identity()?;
        let store = self.open_file_store(&identity)?;
        self.try_restore_from_store(&store)?;
        tracing::info!("Restored layout from {}", store.path().display());
        Ok(())
    }

    pub fn try_save_to_store(&mut self, store: &mut dyn SettingsStore) -> Result<(), LayoutError> {
        let data = self.try_serialize_layout()?;
        store.set_value(LAYOUT_GROUP, LAYOUT_KEY, &data)?;
        Ok(())
    }

    pub fn try_restore_from_store(&mut self, store: &dyn SettingsStore) -> Result<(), LayoutError> {
        let _session = RestoreSession::begin();
        let data = store.value(LAYOUT_GROUP, LAYOUT_KEY).unwrap_or_default();
        self.try_restore_layout(&data)
    }

    pub fn try_serialize_layout(&mut self) -> Result<Bytes, LayoutError> {
        let issues = self.registry.sanity_issues();
        if !issues.is_empty() {
            return Err(LayoutError::InsaneRegistry(issues));
        }
        self.registry.ensure_all_floating_panels_are_morphed();

        let registry = &*self.registry;
        let backend = registry.backend();
        let mut ds = DataStreamWriter::new();

        ds.write_count(registry.main_windows().len());
        for window in registry.main_windows() {
            ds.write_string(window.name());
            ds.write_rect(backend.geometry(window.native()));
            ds.write_bool(backend.is_visible(window.native()));
            window.write_payload(&mut ds);
        }

        let floating: Vec<&FloatingWindow> = registry.floating_windows().collect();
        ds.write_count(floating.len());
        for window in floating {
            let parent_index = window
                .parent()
                .and_then(|id| registry.main_window_index(id))
                .map_or(-1, |index| index as i32);
            ds.write_i32(parent_index);
            ds.write_rect(backend.geometry(window.native()));
            ds.write_bool(backend.is_visible(window.native()));
            window.write_payload(&mut ds);
        }

        let closed: Vec<ClosedPanelRecord> = registry
            .closed_panels()
            .iter()
            .filter_map(|name| registry.panel(name))
            .map(|panel| panel.closed_record())
            .collect();
        ds.write_count(closed.len());
        for record in &closed {
            ds.write(record);
        }

        tracing::debug!(bytes = ds.len(), "layout serialized");
        Ok(ds.into_bytes())
    }

    /// Destructive restore: the registry is cleared first, then rebuilt from
    /// `data`. Fails without touching anything if `data` is empty.
    pub fn try_restore_layout(&mut self, data: &[u8]) -> Result<(), LayoutError> {
        if data.is_empty() {
            return Err(LayoutError::EmptyPayload);
        }

        let session = RestoreSession::begin();
        session.enter(RestorePhase::Clearing);
        self.registry.clear(true);

        let mut ds = DataStreamReader::new(data);

        session.enter(RestorePhase::RestoringMainWindows);
        let count = ds.read_count("main window")?;
        for _ in 0..count {
            self.restore_main_window(&mut ds)?;
        }

        session.enter(RestorePhase::RestoringFloatingWindows);
        let count = ds.read_count("floating window")?;
        for _ in 0..count {
            self.restore_floating_window(&mut ds)?;
        }

        session.enter(RestorePhase::RestoringClosedPanels);
        let count = ds.read_count("closed panel")?;
        for _ in 0..count {
            let record: ClosedPanelRecord = ds.read()?;
            self.registry.restore_closed_panel(record);
        }

        if !ds.at_end() {
            tracing::warn!(trailing = ds.remaining(), "ignoring trailing bytes after layout");
        }
        tracing::debug!(
            main_windows = self.registry.main_windows().len(),
            floating_windows = self.registry.floating_windows().count(),
            closed = self.registry.closed_panels().len(),
            "layout restored"
        );
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn restore_main_window(&mut self, ds: &mut DataStreamReader<'_>) -> Result<(), LayoutError> {
        let name = ds.read_string()?;
        let rect = ds.read_rect()?;
        let visible = ds.read_bool()?;

        let id = self
            .registry
            .main_window_by_name(&name)
            .map(MainWindow::id)
            .ok_or(LayoutError::UnknownMainWindow(name))?;
        self.registry.apply_placement(Host::Main(id), rect, visible);

        let window = self
            .registry
            .main_window_mut(id)
            .ok_or(LayoutError::StaleWindow)?;
        window.fill_from_stream(ds)?;
        self.registry.adopt_layout(Host::Main(id));
        Ok(())
    }

    fn restore_floating_window(&mut self, ds: &mut DataStreamReader<'_>) -> Result<(), LayoutError> {
        let parent_index = ds.read_i32()?;
        let rect = ds.read_rect()?;
        let visible = ds.read_bool()?;

        let parent = self.parent_at(parent_index);
        let id = self.registry.create_floating_window(parent);
        self.registry
            .apply_placement(Host::Floating(id), rect, visible);

        let window = self
            .registry
            .floating_window_mut(id)
            .ok_or(LayoutError::StaleWindow)?;
        window.fill_from_stream(ds)?;
        self.registry.adopt_layout(Host::Floating(id));

        if self
            .registry
            .floating_window(id)
            .is_some_and(|w| w.layout().is_empty())
        {
            tracing::warn!(window = id.0, "restored floating window has no panels, discarding");
            self.registry.discard_floating_window(id);
        }
        Ok(())
    }

    fn parent_at(&self, index: i32) -> Option<MainWindowId> {
        if index == -1 {
            return None;
        }
        let parent = usize::try_from(index)
            .ok()
            .and_then(|i| self.registry.main_windows().get(i))
            .map(MainWindow::id);
        if parent.is_none() {
            tracing::warn!(index, "floating window parent index out of range, restoring without parent");
        }
        parent
    }

    fn identity(&self) -> Result<ApplicationIdentity, LayoutError> {
        let identity = &self.registry.config().identity;
        if !identity.is_complete() {
            return Err(LayoutError::MissingIdentity);
        }
        Ok(identity.clone())
    }

    fn open_file_store(&self, identity: &ApplicationIdentity) -> Result<FileSettings, LayoutError> {
        let store = match &self.settings_root {
            Some(root) => FileSettings::open(root, identity)?,
            None => FileSettings::open_default(identity)?,
        };
        Ok(store)
    }
}

fn report(action: &str, result: Result<(), LayoutError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to {}: {}", action, e);
            false
        }
    }
}
