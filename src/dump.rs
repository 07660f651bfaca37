//! Offline decoding of a saved layout
//!
//! [`LayoutDump`] reads the same stream as the layout saver without a live
//! registry, so a saved layout can be inspected (or checked in tests)
//! without creating any window.

use std::fmt;

use crate::error::{LayoutError, StreamError};
use crate::geometry::Rect;
use crate::layout::{LayoutNode, MultiSplitter};
use crate::panel::ClosedPanelRecord;
use crate::stream::DataStreamReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainWindowDump {
    pub name: String,
    pub geometry: Rect,
    pub visible: bool,
    pub layout: MultiSplitter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingWindowDump {
    /// Index into [`LayoutDump::main_windows`], `None` for -1
    pub parent_index: Option<usize>,
    pub geometry: Rect,
    pub visible: bool,
    pub layout: MultiSplitter,
}

/// Every section of a saved layout, decoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutDump {
    pub main_windows: Vec<MainWindowDump>,
    pub floating_windows: Vec<FloatingWindowDump>,
    pub closed_panels: Vec<ClosedPanelRecord>,
}

impl LayoutDump {
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        if data.is_empty() {
            return Err(LayoutError::EmptyPayload);
        }
        let mut ds = DataStreamReader::new(data);
        let mut dump = LayoutDump::default();

        for _ in 0..ds.read_count("main window")? {
            dump.main_windows.push(MainWindowDump {
                name: ds.read_string()?,
                geometry: ds.read_rect()?,
                visible: ds.read_bool()?,
                layout: ds.read()?,
            });
        }

        for _ in 0..ds.read_count("floating window")? {
            let parent_index = match ds.read_i32()? {
                -1 => None,
                index => Some(usize::try_from(index).map_err(|_| StreamError::InvalidTag {
                    what: "parent index",
                    tag: index,
                })?),
            };
            dump.floating_windows.push(FloatingWindowDump {
                parent_index,
                geometry: ds.read_rect()?,
                visible: ds.read_bool()?,
                layout: ds.read()?,
            });
        }

        for _ in 0..ds.read_count("closed panel")? {
            dump.closed_panels.push(ds.read()?);
        }

        Ok(dump)
    }

    /// Every panel name mentioned anywhere, in stream order
    pub fn panel_names(&self) -> Vec<&str> {
        self.main_windows
            .iter()
            .flat_map(|w| w.layout.panel_names())
            .chain(self.floating_windows.iter().flat_map(|w| w.layout.panel_names()))
            .chain(self.closed_panels.iter().map(|c| c.name.as_str()))
            .collect()
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &LayoutNode, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    match node {
        LayoutNode::Frame(frame) => {
            let tabs: Vec<String> = frame
                .panels
                .iter()
                .enumerate()
                .map(|(i, p)| if i == frame.current { format!("*{p}") } else { p.clone() })
                .collect();
            writeln!(f, "{indent}frame [{}]", tabs.join(", "))
        }
        LayoutNode::Split(split) => {
            writeln!(f, "{indent}split {:?}", split.orientation)?;
            for child in &split.children {
                writeln!(f, "{indent}  {}px", child.extent)?;
                write_node(f, &child.node, depth + 2)?;
            }
            Ok(())
        }
    }
}

fn write_layout(f: &mut fmt::Formatter<'_>, layout: &MultiSplitter) -> fmt::Result {
    let size = layout.size();
    writeln!(f, "    layout {}x{}", size.width, size.height)?;
    match layout.root() {
        Some(root) => write_node(f, root, 3),
        None => writeln!(f, "      (empty)"),
    }
}

impl fmt::Display for LayoutDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "main windows: {}", self.main_windows.len())?;
        for window in &self.main_windows {
            let g = window.geometry;
            writeln!(
                f,
                "  '{}' at {},{} {}x{}{}",
                window.name,
                g.x,
                g.y,
                g.width,
                g.height,
                if window.visible { "" } else { " (hidden)" }
            )?;
            write_layout(f, &window.layout)?;
        }

        writeln!(f, "floating windows: {}", self.floating_windows.len())?;
        for (i, window) in self.floating_windows.iter().enumerate() {
            let g = window.geometry;
            let parent = match window.parent_index {
                Some(index) => format!("parent #{index}"),
                None => "no parent".to_string(),
            };
            writeln!(
                f,
                "  #{i} ({parent}) at {},{} {}x{}{}",
                g.x,
                g.y,
                g.width,
                g.height,
                if window.visible { "" } else { " (hidden)" }
            )?;
            write_layout(f, &window.layout)?;
        }

        writeln!(f, "closed panels: {}", self.closed_panels.len())?;
        for record in &self.closed_panels {
            match &record.last_position {
                Some(position) => writeln!(
                    f,
                    "  {} ({:?} of {} in {})",
                    record.name,
                    position.location,
                    position.peer.as_deref().unwrap_or("window"),
                    position.main_window.as_deref().unwrap_or("a floating window"),
                )?,
                None => writeln!(f, "  {}", record.name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DockLocation;
    use crate::stream::DataStreamWriter;

    fn sample() -> Vec<u8> {
        let mut layout = MultiSplitter::new();
        layout.insert("files", DockLocation::Left, None);
        layout.insert("console", DockLocation::Bottom, None);
        layout.layout(Rect::new(0, 0, 400, 300));

        let mut ds = DataStreamWriter::new();
        ds.write_count(1);
        ds.write_string("main1");
        ds.write_rect(Rect::new(10, 10, 400, 300));
        ds.write_bool(true);
        ds.write(&layout);
        ds.write_count(1);
        ds.write_i32(0);
        ds.write_rect(Rect::new(500, 100, 200, 150));
        ds.write_bool(true);
        ds.write(&MultiSplitter::new());
        ds.write_count(0);
        ds.into_bytes().to_vec()
    }

    #[test]
    fn test_decode_sections() {
        let dump = LayoutDump::decode(&sample()).unwrap();
        assert_eq!(dump.main_windows.len(), 1);
        assert_eq!(dump.main_windows[0].name, "main1");
        assert_eq!(dump.floating_windows[0].parent_index, Some(0));
        assert_eq!(dump.panel_names(), vec!["files", "console"]);

        let text = dump.to_string();
        assert!(text.contains("'main1' at 10,10 400x300"));
        assert!(text.contains("#0 (parent #0)"));
    }

    #[test]
    fn test_decode_rejects_empty_and_negative_parent() {
        assert!(matches!(LayoutDump::decode(&[]), Err(LayoutError::EmptyPayload)));

        let mut data = sample();
        // Parent index of the floating window follows the main window section
        let main_len = data.len() - (4 + 4 + 16 + 1 + 8 + 1 + 4);
        data[main_len + 4..main_len + 8].copy_from_slice(&(-5i32).to_be_bytes());
        assert!(LayoutDump::decode(&data).is_err());
    }
}
