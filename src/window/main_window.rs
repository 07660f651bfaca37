use super::{DockWindow, LayoutPayload, MainWindowId};
use crate::backend::NativeId;
use crate::error::StreamError;
use crate::geometry::Rect;
use crate::layout::MultiSplitter;
use crate::stream::{DataStreamReader, DataStreamWriter};

/// A named application window with a docking area
#[derive(Debug, Clone)]
pub struct MainWindow {
    id: MainWindowId,
    name: String,
    native: NativeId,
    layout: MultiSplitter,
}

impl MainWindow {
    pub(crate) fn new(id: MainWindowId, name: String, native: NativeId) -> Self {
        Self {
            id,
            name,
            native,
            layout: MultiSplitter::new(),
        }
    }

    pub fn id(&self) -> MainWindowId {
        self.id
    }

    /// Stable identity across save and restore
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl DockWindow for MainWindow {
    fn native(&self) -> NativeId {
        self.native
    }

    fn layout(&self) -> &MultiSplitter {
        &self.layout
    }

    fn layout_mut(&mut self) -> &mut MultiSplitter {
        &mut self.layout
    }

    fn content_area(&self, geometry: Rect, _title_bar_height: i32) -> Rect {
        Rect::from_origin_size(Default::default(), geometry.size())
    }
}

impl LayoutPayload for MainWindow {
    fn write_payload(&self, ds: &mut DataStreamWriter) {
        ds.write(&self.layout);
    }

    fn fill_from_stream(&mut self, ds: &mut DataStreamReader<'_>) -> Result<(), StreamError> {
        self.layout = ds.read()?;
        Ok(())
    }
}
