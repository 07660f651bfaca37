//! Panels (dock widgets) and their placeholders
//!
//! A panel is a unit of application content. The docking core only knows its
//! name, title, native handle, minimum size and where it currently lives.
//! When a panel is closed, the spot it left is remembered as a
//! [`LastPosition`] so reopening puts it back.

use crate::backend::NativeId;
use crate::error::StreamError;
use crate::geometry::{Rect, Size};
use crate::layout::DockLocation;
use crate::stream::{DataStreamReader, DataStreamWriter, StreamPersist};
use crate::window::Host;

/// Where a panel currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelLocation {
    /// Registered but not shown anywhere
    Unplaced,
    /// Inside a window's layout
    Docked(Host),
    /// Floating on its own, not yet morphed into a floating window
    FloatingBare,
    /// Closed, with its placeholder kept for reopening
    Closed,
}

/// Placeholder for a closed panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPosition {
    /// Main window the panel was docked in (`None` for floating windows)
    pub main_window: Option<String>,
    /// Panel it was tabbed with or docked beside
    pub peer: Option<String>,
    pub location: DockLocation,
}

#[derive(Debug, Clone)]
pub struct Panel {
    name: String,
    title: String,
    native: NativeId,
    pub(crate) minimum_size: Size,
    pub(crate) location: PanelLocation,
    pub(crate) last_position: Option<LastPosition>,
    /// Geometry to use when the panel floats again
    pub(crate) floating_geometry: Option<Rect>,
}

impl Panel {
    pub(crate) fn new(name: String, title: String, native: NativeId) -> Self {
        Self {
            name,
            title,
            native,
            minimum_size: Size::default(),
            location: PanelLocation::Unplaced,
            last_position: None,
            floating_geometry: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn native(&self) -> NativeId {
        self.native
    }

    pub fn minimum_size(&self) -> Size {
        self.minimum_size
    }

    pub fn location(&self) -> PanelLocation {
        self.location
    }

    pub fn last_position(&self) -> Option<&LastPosition> {
        self.last_position.as_ref()
    }

    pub fn floating_geometry(&self) -> Option<Rect> {
        self.floating_geometry
    }

    pub fn is_closed(&self) -> bool {
        self.location == PanelLocation::Closed
    }

    pub(crate) fn closed_record(&self) -> ClosedPanelRecord {
        ClosedPanelRecord {
            name: self.name.clone(),
            floating_geometry: self.floating_geometry,
            last_position: self.last_position.clone(),
        }
    }
}

// ============================================================================
// Closed panel payload
// ============================================================================

/// Persisted state of a closed panel: name, last floating geometry and
/// placeholder.
///
/// ```text
/// string  name
/// rect    floating geometry (empty = none)
/// bool    has placeholder
///   string  main window ("" = none)
///   string  peer panel ("" = none)
///   i32     dock location
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPanelRecord {
    pub name: String,
    pub floating_geometry: Option<Rect>,
    pub last_position: Option<LastPosition>,
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl StreamPersist for ClosedPanelRecord {
    fn write_to(&self, ds: &mut DataStreamWriter) {
        ds.write_string(&self.name);
        ds.write_rect(self.floating_geometry.unwrap_or_default());
        ds.write_bool(self.last_position.is_some());
        if let Some(position) = &self.last_position {
            ds.write_string(position.main_window.as_deref().unwrap_or_default());
            ds.write_string(position.peer.as_deref().unwrap_or_default());
            ds.write_i32(position.location.to_code());
        }
    }

    fn read_from(ds: &mut DataStreamReader<'_>) -> Result<Self, StreamError> {
        let name = ds.read_string()?;
        let geometry = ds.read_rect()?;
        let last_position = if ds.read_bool()? {
            let main_window = non_empty(ds.read_string()?);
            let peer = non_empty(ds.read_string()?);
            let location = DockLocation::from_code(ds.read_i32()?)?;
            Some(LastPosition {
                main_window,
                peer,
                location,
            })
        } else {
            None
        };
        Ok(Self {
            name,
            floating_geometry: (!geometry.is_empty()).then_some(geometry),
            last_position,
        })
    }
}
