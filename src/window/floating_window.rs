use super::{DockWindow, FloatingWindowId, LayoutPayload, MainWindowId};
use crate::backend::NativeId;
use crate::error::StreamError;
use crate::geometry::Rect;
use crate::layout::MultiSplitter;
use crate::stream::{DataStreamReader, DataStreamWriter};

/// A frameless top-level window holding panels that were torn off
#[derive(Debug, Clone)]
pub struct FloatingWindow {
    id: FloatingWindowId,
    native: NativeId,
    parent: Option<MainWindowId>,
    layout: MultiSplitter,
}

impl FloatingWindow {
    pub(crate) fn new(id: FloatingWindowId, native: NativeId, parent: Option<MainWindowId>) -> Self {
        Self {
            id,
            native,
            parent,
            layout: MultiSplitter::new(),
        }
    }

    pub fn id(&self) -> FloatingWindowId {
        self.id
    }

    /// Main window this one stays on top of and is cleaned up with
    pub fn parent(&self) -> Option<MainWindowId> {
        self.parent
    }
}

impl DockWindow for FloatingWindow {
    fn native(&self) -> NativeId {
        self.native
    }

    fn layout(&self) -> &MultiSplitter {
        &self.layout
    }

    fn layout_mut(&mut self) -> &mut MultiSplitter {
        &mut self.layout
    }

    /// Everything below the title bar
    fn content_area(&self, geometry: Rect, title_bar_height: i32) -> Rect {
        Rect::new(
            0,
            title_bar_height,
            geometry.width,
            geometry.height.saturating_sub(title_bar_height).max(0),
        )
    }
}

impl LayoutPayload for FloatingWindow {
    fn write_payload(&self, ds: &mut DataStreamWriter) {
        ds.write(&self.layout);
    }

    fn fill_from_stream(&mut self, ds: &mut DataStreamReader<'_>) -> Result<(), StreamError> {
        self.layout = ds.read()?;
        Ok(())
    }
}
