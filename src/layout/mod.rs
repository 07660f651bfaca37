//! Multi-splitter layout tree
//!
//! Each window owns one [`MultiSplitter`]: a recursive split of tab frames.
//! Panels are referenced by name, which is also their identity across save
//! and restore, so a layout can be decoded before the panels it names are
//! resolved.
//!
//! ## Geometry
//!
//! Split children store their `extent` along the split axis. A layout pass
//! distributes the available length proportionally to the extents and writes
//! the resulting lengths back, so a layout saved and restored into a window
//! of the same size reproduces the same pixel geometry.
//!
//! ## Stream payload
//!
//! ```text
//! size    layout size at save time
//! node    u8 tag: 0 = empty, 1 = frame, 2 = split
//!   frame: i32 current, i32 count, count x string panel name
//!   split: u8 orientation, i32 count, count x (i32 extent, node)
//! ```

mod node;

pub use node::{DockLocation, Frame, LayoutNode, Orientation, Split, SplitChild};

use crate::error::StreamError;
use crate::geometry::{Rect, Size};
use crate::stream::{DataStreamReader, DataStreamWriter, StreamPersist};

/// Gap between split children
pub const SEPARATOR_THICKNESS: i32 = 5;

/// Smallest size a frame is laid out at, whatever its panels allow
pub const MIN_FRAME_SIZE: Size = Size::new(80, 60);

/// Extent given to nodes before their first layout pass
const DEFAULT_EXTENT: i32 = 100;

/// Guard against hostile payloads
const MAX_NESTING: usize = 64;

const TAG_EMPTY: u8 = 0;
const TAG_FRAME: u8 = 1;
const TAG_SPLIT: u8 = 2;

/// Computed placement of one panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelPlacement {
    pub panel: String,
    /// Rect relative to the window's content area
    pub rect: Rect,
    /// Current tab of its frame (the others are hidden)
    pub is_current: bool,
}

/// Where a panel was before [`MultiSplitter::remove`] took it out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// A panel that stayed behind next to it, if any
    pub peer: Option<String>,
    pub location: DockLocation,
}

/// Recursive split layout of tab frames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiSplitter {
    size: Size,
    root: Option<LayoutNode>,
}

impl MultiSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the layout at the last layout pass (or as restored)
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn root(&self) -> Option<&LayoutNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// All panel names, depth-first
    pub fn panel_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(root) = &self.root {
            root.collect_panels(&mut names);
        }
        names
    }

    pub fn contains(&self, panel: &str) -> bool {
        self.root
            .as_ref()
            .is_some_and(|root| root.path_to(panel).is_some())
    }

    /// Frames in depth-first order
    pub fn frames(&self) -> Vec<&Frame> {
        fn walk<'a>(node: &'a LayoutNode, out: &mut Vec<&'a Frame>) {
            match node {
                LayoutNode::Frame(frame) => out.push(frame),
                LayoutNode::Split(split) => split.children.iter().for_each(|c| walk(&c.node, out)),
            }
        }
        let mut frames = Vec::new();
        if let Some(root) = &self.root {
            walk(root, &mut frames);
        }
        frames
    }

    pub fn frame_containing(&self, panel: &str) -> Option<&Frame> {
        self.frames().into_iter().find(|frame| frame.contains(panel))
    }

    /// Drop every node. With `delete_static_anchors` the outer extent of the
    /// layout is forgotten too, so the next restore or layout pass defines it.
    pub fn clear(&mut self, delete_static_anchors: bool) {
        self.root = None;
        if delete_static_anchors {
            self.size = Size::default();
        }
    }

    /// Insert `panel` at `location` relative to the frame holding
    /// `relative_to`, or relative to the whole layout when `None`.
    /// Returns false if `relative_to` is not in this layout.
    pub fn insert(&mut self, panel: &str, location: DockLocation, relative_to: Option<&str>) -> bool {
        if self.root.is_none() {
            self.root = Some(LayoutNode::Frame(Frame::new(panel)));
            return true;
        }
        let Some(root) = self.root.as_mut() else {
            return false;
        };

        let path = match relative_to {
            Some(target) => match root.path_to(target) {
                Some(path) => path,
                None => return false,
            },
            None => Vec::new(),
        };

        let Some(orientation) = location.orientation() else {
            // Tab into the target frame, or the first frame of the layout
            let frame = match relative_to {
                Some(_) => match root.node_at_mut(&path) {
                    Some(LayoutNode::Frame(frame)) => Some(frame),
                    _ => None,
                },
                None => root.first_frame_mut(),
            };
            let Some(frame) = frame else {
                return false;
            };
            frame.panels.push(panel.to_string());
            frame.current = frame.panels.len() - 1;
            return true;
        };

        let new_node = LayoutNode::Frame(Frame::new(panel));
        let leading = location.is_leading();

        // Beside a nested frame whose parent already splits the right way
        if let Some((&index, parent_path)) = path.split_last() {
            if let Some(LayoutNode::Split(parent)) = root.node_at_mut(parent_path) {
                if parent.orientation == orientation {
                    let half = (parent.children[index].extent / 2).max(1);
                    let kept = &mut parent.children[index].extent;
                    *kept = kept.saturating_sub(half).max(0);
                    let at = if leading { index } else { index + 1 };
                    parent.children.insert(
                        at,
                        SplitChild {
                            extent: half,
                            node: new_node,
                        },
                    );
                    return true;
                }
            }
        }

        // At the outer edge of a root split with the right orientation
        if path.is_empty() {
            if let LayoutNode::Split(split) = &mut *root {
                if split.orientation == orientation {
                    let total: i64 = split
                        .children
                        .iter()
                        .map(|c| i64::from(c.extent.max(0)))
                        .sum();
                    let average = total / split.children.len().max(1) as i64;
                    let extent = i32::try_from(average).unwrap_or(i32::MAX).max(DEFAULT_EXTENT);
                    let at = if leading { 0 } else { split.children.len() };
                    split.children.insert(
                        at,
                        SplitChild {
                            extent,
                            node: new_node,
                        },
                    );
                    return true;
                }
            }
        }

        // Otherwise wrap the target in a new split
        let Some(target) = root.node_at_mut(&path) else {
            return false;
        };
        let existing = std::mem::replace(
            target,
            LayoutNode::Frame(Frame {
                panels: Vec::new(),
                current: 0,
            }),
        );
        let mut children = vec![
            SplitChild {
                extent: DEFAULT_EXTENT,
                node: existing,
            },
            SplitChild {
                extent: DEFAULT_EXTENT,
                node: new_node,
            },
        ];
        if leading {
            children.reverse();
        }
        *target = LayoutNode::Split(Split {
            orientation,
            children,
        });
        true
    }

    /// Take `panel` out of the layout, collapsing whatever it leaves empty
    pub fn remove(&mut self, panel: &str) -> Option<Removal> {
        let root = self.root.as_mut()?;
        let path = root.path_to(panel)?;

        let LayoutNode::Frame(frame) = root.node_at_mut(&path)? else {
            return None;
        };
        let index = frame.panels.iter().position(|p| p == panel)?;
        frame.panels.remove(index);

        let removal = if let Some(peer) = frame.panels.first().cloned() {
            if frame.current > index || frame.current >= frame.panels.len() {
                frame.current = frame.current.saturating_sub(1);
            }
            Removal {
                peer: Some(peer),
                location: DockLocation::Tab,
            }
        } else {
            match path.split_last() {
                Some((&child_index, parent_path)) => {
                    match root.node_at_mut(parent_path) {
                        Some(LayoutNode::Split(parent)) => {
                            // The emptied frame is pruned below; describe it
                            // relative to the sibling that takes its space
                            let sibling_index = if child_index + 1 < parent.children.len() {
                                child_index + 1
                            } else {
                                child_index.saturating_sub(1)
                            };
                            Removal {
                                peer: parent.children[sibling_index]
                                    .node
                                    .first_panel()
                                    .map(str::to_string),
                                location: DockLocation::beside(
                                    parent.orientation,
                                    child_index < sibling_index,
                                ),
                            }
                        }
                        _ => Removal {
                            peer: None,
                            location: DockLocation::Left,
                        },
                    }
                }
                None => Removal {
                    peer: None,
                    location: DockLocation::Left,
                },
            }
        };

        self.root = self.root.take().and_then(LayoutNode::normalized);
        Some(removal)
    }

    /// Make `panel` the current tab of its frame
    pub fn set_current(&mut self, panel: &str) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let Some(path) = root.path_to(panel) else {
            return false;
        };
        match root.node_at_mut(&path) {
            Some(LayoutNode::Frame(frame)) => {
                if let Some(index) = frame.panels.iter().position(|p| p == panel) {
                    frame.current = index;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// Remove every panel for which `keep` returns false; returns the names
    /// that were dropped
    pub fn retain_panels(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        fn walk(node: &mut LayoutNode, keep: &mut dyn FnMut(&str) -> bool, dropped: &mut Vec<String>) {
            match node {
                LayoutNode::Frame(frame) => {
                    let current = frame.current_panel().map(str::to_string);
                    frame.panels.retain(|panel| {
                        let kept = keep(panel.as_str());
                        if !kept {
                            dropped.push(panel.clone());
                        }
                        kept
                    });
                    frame.current = current
                        .and_then(|c| frame.panels.iter().position(|p| *p == c))
                        .unwrap_or(0);
                }
                LayoutNode::Split(split) => {
                    for child in &mut split.children {
                        walk(&mut child.node, keep, dropped);
                    }
                }
            }
        }

        let mut dropped = Vec::new();
        if let Some(root) = self.root.as_mut() {
            walk(root, &mut keep, &mut dropped);
        }
        self.root = self.root.take().and_then(LayoutNode::normalized);
        dropped
    }

    /// Minimum size of the whole layout given each panel's minimum
    pub fn minimum_size(&self, panel_minimum: &dyn Fn(&str) -> Size) -> Size {
        fn node_minimum(node: &LayoutNode, panel_minimum: &dyn Fn(&str) -> Size) -> Size {
            match node {
                LayoutNode::Frame(frame) => frame
                    .panels
                    .iter()
                    .fold(MIN_FRAME_SIZE, |acc, p| acc.expanded_to(panel_minimum(p.as_str()))),
                LayoutNode::Split(split) => {
                    let gaps = i32::try_from(split.children.len().saturating_sub(1)).unwrap_or(i32::MAX);
                    let separators = SEPARATOR_THICKNESS.saturating_mul(gaps);
                    let mins = split.children.iter().map(|c| node_minimum(&c.node, panel_minimum));
                    match split.orientation {
                        Orientation::Horizontal => mins.fold(Size::new(separators, 0), |acc, m| {
                            Size::new(acc.width.saturating_add(m.width), acc.height.max(m.height))
                        }),
                        Orientation::Vertical => mins.fold(Size::new(0, separators), |acc, m| {
                            Size::new(acc.width.max(m.width), acc.height.saturating_add(m.height))
                        }),
                    }
                }
            }
        }

        self.root
            .as_ref()
            .map(|root| node_minimum(root, panel_minimum))
            .unwrap_or_default()
    }

    /// Lay the tree out inside `area` and return where every panel goes.
    /// Extents are updated to the computed lengths.
    pub fn layout(&mut self, area: Rect) -> Vec<PanelPlacement> {
        fn place(node: &mut LayoutNode, rect: Rect, out: &mut Vec<PanelPlacement>) {
            match node {
                LayoutNode::Frame(frame) => {
                    for (i, panel) in frame.panels.iter().enumerate() {
                        out.push(PanelPlacement {
                            panel: panel.clone(),
                            rect,
                            is_current: i == frame.current,
                        });
                    }
                }
                LayoutNode::Split(split) => {
                    let count = split.children.len() as i32;
                    let available = match split.orientation {
                        Orientation::Horizontal => rect.width,
                        Orientation::Vertical => rect.height,
                    };
                    let content = available
                        .saturating_sub(SEPARATOR_THICKNESS.saturating_mul(count - 1))
                        .max(0);
                    let total: i64 = split.children.iter().map(|c| i64::from(c.extent.max(0))).sum();

                    let mut offset = 0;
                    let mut assigned = 0;
                    for (i, child) in split.children.iter_mut().enumerate() {
                        let length = if i as i32 == count - 1 {
                            content - assigned
                        } else if total > 0 {
                            (i64::from(content) * i64::from(child.extent.max(0)) / total) as i32
                        } else {
                            content / count
                        };
                        let child_rect = match split.orientation {
                            Orientation::Horizontal => {
                                Rect::new(rect.x.saturating_add(offset), rect.y, length, rect.height)
                            }
                            Orientation::Vertical => {
                                Rect::new(rect.x, rect.y.saturating_add(offset), rect.width, length)
                            }
                        };
                        child.extent = length;
                        assigned += length;
                        offset = offset.saturating_add(length).saturating_add(SEPARATOR_THICKNESS);
                        place(&mut child.node, child_rect, out);
                    }
                }
            }
        }

        self.size = area.size();
        let mut placements = Vec::new();
        if let Some(root) = self.root.as_mut() {
            place(root, area, &mut placements);
        }
        placements
    }

    /// Build a layout from an explicit tree (normalized on the way in)
    pub fn from_root(size: Size, root: Option<LayoutNode>) -> Self {
        Self {
            size,
            root: root.and_then(LayoutNode::normalized),
        }
    }
}

// ============================================================================
// Stream payload
// ============================================================================

fn write_node(ds: &mut DataStreamWriter, node: Option<&LayoutNode>) {
    match node {
        None => ds.write_u8(TAG_EMPTY),
        Some(LayoutNode::Frame(frame)) => {
            ds.write_u8(TAG_FRAME);
            ds.write_count(frame.current);
            ds.write_count(frame.panels.len());
            for panel in &frame.panels {
                ds.write_string(panel);
            }
        }
        Some(LayoutNode::Split(split)) => {
            ds.write_u8(TAG_SPLIT);
            ds.write_u8(split.orientation.to_code());
            ds.write_count(split.children.len());
            for child in &split.children {
                ds.write_i32(child.extent);
                write_node(ds, Some(&child.node));
            }
        }
    }
}

fn read_node(ds: &mut DataStreamReader<'_>, depth: usize) -> Result<Option<LayoutNode>, StreamError> {
    if depth > MAX_NESTING {
        return Err(StreamError::NestingTooDeep(MAX_NESTING));
    }
    match ds.read_u8()? {
        TAG_EMPTY => Ok(None),
        TAG_FRAME => {
            let current = ds.read_count("current tab")?;
            let count = ds.read_count("tab")?;
            let mut panels = Vec::with_capacity(count.min(256));
            for _ in 0..count {
                panels.push(ds.read_string()?);
            }
            Ok(Some(LayoutNode::Frame(Frame { panels, current })))
        }
        TAG_SPLIT => {
            let orientation = Orientation::from_code(ds.read_u8()?)?;
            let count = ds.read_count("split child")?;
            let mut children = Vec::with_capacity(count.min(256));
            for _ in 0..count {
                // Negative extents carry no meaning; treat them as unsized
                let extent = ds.read_i32()?.max(0);
                if let Some(node) = read_node(ds, depth + 1)? {
                    children.push(SplitChild { extent, node });
                }
            }
            Ok(Some(LayoutNode::Split(Split {
                orientation,
                children,
            })))
        }
        tag => Err(StreamError::InvalidTag {
            what: "layout node",
            tag: i32::from(tag),
        }),
    }
}

impl StreamPersist for MultiSplitter {
    fn write_to(&self, ds: &mut DataStreamWriter) {
        ds.write_size(self.size);
        write_node(ds, self.root.as_ref());
    }

    fn read_from(ds: &mut DataStreamReader<'_>) -> Result<Self, StreamError> {
        let size = ds.read_size()?;
        let root = read_node(ds, 0)?;
        Ok(MultiSplitter::from_root(size, root))
    }
}
