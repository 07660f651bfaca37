//! Dockyard - dockable panel layouts with binary persistence
//!
//! Applications arrange named panels inside main windows and floating
//! windows, tab and split them, close and reopen them, and save the whole
//! arrangement as a `QDataStream`-compatible byte stream that can be
//! restored later. The docking core drives native objects through the
//! [`backend::Backend`] trait, which has a widget-tree and a scene-graph
//! implementation.

pub mod backend;
pub mod config;
pub mod config_paths;
pub mod dump;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod panel;
pub mod registry;
pub mod restore_session;
pub mod saver;
pub mod stream;
pub mod window;

// Re-export commonly used types
pub use backend::{Backend, BackendKind};
pub use config::{ApplicationIdentity, DockConfig};
pub use error::LayoutError;
pub use geometry::{Point, Rect, Size};
pub use layout::DockLocation;
pub use registry::{DockRegistry, DockTarget};
pub use restore_session::restore_in_progress;
pub use saver::LayoutSaver;
pub use window::{DockWindow, FloatingWindowId, Host, MainWindowId};
