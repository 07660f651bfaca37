//! Top-level windows that host docking layouts
//!
//! - [`MainWindow`]: named, created by the application, never recreated by
//!   a restore; the name is its identity across save and restore.
//! - [`FloatingWindow`]: created by the engine when panels float, morph or
//!   get restored; optionally tied to a main window.
//!
//! Both write their layout payload to a stream and refill it from one
//! through [`LayoutPayload`]; the serializer never looks inside.

mod floating_window;
mod main_window;

use std::fmt;

pub use floating_window::FloatingWindow;
pub use main_window::MainWindow;

use crate::backend::NativeId;
use crate::error::StreamError;
use crate::geometry::Rect;
use crate::layout::MultiSplitter;
use crate::stream::{DataStreamReader, DataStreamWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MainWindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloatingWindowId(pub u64);

/// A window that can host panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Host {
    Main(MainWindowId),
    Floating(FloatingWindowId),
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Main(id) => write!(f, "main window #{}", id.0),
            Host::Floating(id) => write!(f, "floating window #{}", id.0),
        }
    }
}

/// Common surface of windows that own a layout
pub trait DockWindow {
    fn native(&self) -> NativeId;

    fn layout(&self) -> &MultiSplitter;

    fn layout_mut(&mut self) -> &mut MultiSplitter;

    /// Area available to the layout, relative to the window
    fn content_area(&self, geometry: Rect, title_bar_height: i32) -> Rect;
}

/// Window-specific layout payload
pub trait LayoutPayload {
    fn write_payload(&self, ds: &mut DataStreamWriter);

    /// Replace the window's layout with the one read from `ds`
    fn fill_from_stream(&mut self, ds: &mut DataStreamReader<'_>) -> Result<(), StreamError>;
}
