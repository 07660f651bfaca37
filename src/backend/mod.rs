//! Backend adapter - one capability surface over two widget representations
//!
//! The docking core never talks to a toolkit directly. It holds a
//! `Box<dyn Backend>` and manipulates native objects through opaque
//! [`NativeId`] handles: geometry, visibility, parenting, minimum sizes,
//! window flags and deferred deletion.
//!
//! ## Implementations
//!
//! - [`WidgetsBackend`]: retained-mode widget tree. Every top-level is a
//!   widget with a native layout manager that stacks the title bar over the
//!   content and enforces minimum sizes.
//! - [`QuickBackend`]: scene-graph item tree. Each top-level is a root item
//!   hosted in a separate native view; there are no layout managers, so the
//!   adapter adds the title bar allowance and clamps sizes itself.
//!
//! The implementation is chosen once, from [`DockConfig::backend`], when the
//! registry is created.
//!
//! [`DockConfig::backend`]: crate::config::DockConfig::backend

mod quick;
mod widgets;

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Size};

pub use quick::QuickBackend;
pub use widgets::WidgetsBackend;

/// Opaque handle to a native object owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(pub u64);

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native#{}", self.0)
    }
}

/// What a native object represents for the docking core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    MainWindow,
    FloatingWindow,
    Panel,
}

/// Which widget representation backs the docking core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Widgets,
    Quick,
}

bitflags! {
    /// Window-manager hints for top-level objects
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        const WINDOW = 1 << 0;
        const TOOL = 1 << 1;
        const FRAMELESS = 1 << 2;
        const STAYS_ON_TOP = 1 << 3;
    }
}

/// Backend construction parameters shared by both implementations
#[derive(Debug, Clone, Copy)]
pub struct BackendOptions {
    /// Height reserved for a floating window's title bar
    pub title_bar_height: i32,
}

/// Toolkit-independent operations over native windows and panels.
///
/// Queries on an unknown handle return defaults; mutations on an unknown
/// handle are ignored with a warning. Handles become unknown once the object
/// has been destroyed.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Create a native object. Panels start hidden and unparented; windows
    /// start hidden at their minimum size.
    fn create(&mut self, kind: NativeKind) -> NativeId;

    /// Destroy an object immediately, along with everything it owns
    fn destroy(&mut self, id: NativeId);

    fn exists(&self, id: NativeId) -> bool;

    fn geometry(&self, id: NativeId) -> Rect;

    /// Apply a geometry, never going below [`Backend::minimum_size`]
    fn set_geometry(&mut self, id: NativeId, rect: Rect);

    fn is_visible(&self, id: NativeId) -> bool;

    /// Show or hide. Hiding a floating window schedules its deferred
    /// deletion unless it is already being torn down or a restore is
    /// replaying visibility.
    fn set_visible(&mut self, id: NativeId, visible: bool);

    /// Ownership parent: destroying the parent destroys the child
    fn parent(&self, id: NativeId) -> Option<NativeId>;

    fn set_parent(&mut self, id: NativeId, parent: Option<NativeId>);

    /// Window-manager transient parent (stacking and focus only)
    fn transient_parent(&self, id: NativeId) -> Option<NativeId>;

    fn set_transient_parent(&mut self, id: NativeId, parent: Option<NativeId>);

    /// Smallest size the object can be given, decorations included
    fn minimum_size(&self, id: NativeId) -> Size;

    /// Minimum size of the hosted content (the docking layout or panel)
    fn set_content_minimum_size(&mut self, id: NativeId, size: Size);

    fn window_flags(&self, id: NativeId) -> WindowFlags;

    fn set_window_flags(&mut self, id: NativeId, flags: WindowFlags);

    /// Screen area where the object is actually visible
    fn visible_bounds(&self, id: NativeId) -> Rect;

    fn is_being_deleted(&self, id: NativeId) -> bool;

    /// Delete on the next [`Backend::process_events`] call
    fn schedule_delete_later(&mut self, id: NativeId);

    /// Run one event-loop turn: perform pending deletions and return every
    /// handle destroyed as a result
    fn process_events(&mut self) -> Vec<NativeId>;
}

/// Instantiate the backend selected by configuration
pub fn create_backend(kind: BackendKind, options: BackendOptions) -> Box<dyn Backend> {
    tracing::debug!(?kind, "creating backend");
    match kind {
        BackendKind::Widgets => Box::new(WidgetsBackend::new(options)),
        BackendKind::Quick => Box::new(QuickBackend::new(options)),
    }
}

/// Deferred-deletion rule shared by both backends: a floating window that
/// goes from shown to hidden deletes itself later, unless a teardown or a
/// restore is already in charge of it.
fn hide_schedules_deletion(
    kind: NativeKind,
    was_visible: bool,
    visible: bool,
    being_deleted: bool,
) -> bool {
    kind == NativeKind::FloatingWindow
        && was_visible
        && !visible
        && !being_deleted
        && !crate::restore_session::restore_in_progress()
}
