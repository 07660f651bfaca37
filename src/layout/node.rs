//! Layout tree nodes: tab frames and splits

use crate::error::StreamError;

/// Direction in which a split lays out its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children arranged left-to-right
    Horizontal,
    /// Children arranged top-to-bottom
    Vertical,
}

impl Orientation {
    pub(crate) fn to_code(self) -> u8 {
        match self {
            Orientation::Horizontal => 0,
            Orientation::Vertical => 1,
        }
    }

    pub(crate) fn from_code(code: u8) -> Result<Self, StreamError> {
        match code {
            0 => Ok(Orientation::Horizontal),
            1 => Ok(Orientation::Vertical),
            tag => Err(StreamError::InvalidTag {
                what: "orientation",
                tag: i32::from(tag),
            }),
        }
    }
}

/// Where a panel goes relative to a target (a panel, or the whole window)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DockLocation {
    Left,
    Top,
    Right,
    Bottom,
    /// Same frame as the target, as an extra tab
    Tab,
}

impl DockLocation {
    /// Split orientation this location needs; `None` for tabs
    pub fn orientation(self) -> Option<Orientation> {
        match self {
            DockLocation::Left | DockLocation::Right => Some(Orientation::Horizontal),
            DockLocation::Top | DockLocation::Bottom => Some(Orientation::Vertical),
            DockLocation::Tab => None,
        }
    }

    /// True if the new node goes before the target along the split axis
    pub fn is_leading(self) -> bool {
        matches!(self, DockLocation::Left | DockLocation::Top)
    }

    pub(crate) fn to_code(self) -> i32 {
        match self {
            DockLocation::Left => 1,
            DockLocation::Top => 2,
            DockLocation::Right => 3,
            DockLocation::Bottom => 4,
            DockLocation::Tab => 5,
        }
    }

    pub(crate) fn from_code(code: i32) -> Result<Self, StreamError> {
        match code {
            1 => Ok(DockLocation::Left),
            2 => Ok(DockLocation::Top),
            3 => Ok(DockLocation::Right),
            4 => Ok(DockLocation::Bottom),
            5 => Ok(DockLocation::Tab),
            tag => Err(StreamError::InvalidTag {
                what: "dock location",
                tag,
            }),
        }
    }

    /// Location of a removed node relative to the sibling that survives it
    pub(crate) fn beside(orientation: Orientation, removed_was_first: bool) -> Self {
        match (orientation, removed_was_first) {
            (Orientation::Horizontal, true) => DockLocation::Left,
            (Orientation::Horizontal, false) => DockLocation::Right,
            (Orientation::Vertical, true) => DockLocation::Top,
            (Orientation::Vertical, false) => DockLocation::Bottom,
        }
    }
}

/// A tab group: panels referenced by name, one of them current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub panels: Vec<String>,
    pub current: usize,
}

impl Frame {
    pub fn new(panel: impl Into<String>) -> Self {
        Self {
            panels: vec![panel.into()],
            current: 0,
        }
    }

    pub fn current_panel(&self) -> Option<&str> {
        self.panels.get(self.current).map(String::as_str)
    }

    pub fn contains(&self, panel: &str) -> bool {
        self.panels.iter().any(|p| p == panel)
    }

    pub(crate) fn clamp_current(&mut self) {
        if self.current >= self.panels.len() {
            self.current = self.panels.len().saturating_sub(1);
        }
    }
}

/// One child of a split with its share of the split axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitChild {
    /// Length along the split axis, in pixels, at the last layout pass
    pub extent: i32,
    pub node: LayoutNode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub orientation: Orientation,
    pub children: Vec<SplitChild>,
}

/// A node in the layout tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutNode {
    Frame(Frame),
    Split(Split),
}

impl LayoutNode {
    /// Panel names in depth-first order
    pub fn collect_panels<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            LayoutNode::Frame(frame) => out.extend(frame.panels.iter().map(String::as_str)),
            LayoutNode::Split(split) => {
                for child in &split.children {
                    child.node.collect_panels(out);
                }
            }
        }
    }

    pub fn first_panel(&self) -> Option<&str> {
        match self {
            LayoutNode::Frame(frame) => frame.panels.first().map(String::as_str),
            LayoutNode::Split(split) => split.children.iter().find_map(|c| c.node.first_panel()),
        }
    }

    /// Child indices leading to the frame that holds `panel`
    pub(crate) fn path_to(&self, panel: &str) -> Option<Vec<usize>> {
        match self {
            LayoutNode::Frame(frame) => frame.contains(panel).then(Vec::new),
            LayoutNode::Split(split) => split.children.iter().enumerate().find_map(|(i, child)| {
                child.node.path_to(panel).map(|mut rest| {
                    rest.insert(0, i);
                    rest
                })
            }),
        }
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut LayoutNode> {
        match path.split_first() {
            None => Some(self),
            Some((&index, rest)) => match self {
                LayoutNode::Split(split) => split.children.get_mut(index)?.node.node_at_mut(rest),
                LayoutNode::Frame(_) => None,
            },
        }
    }

    pub(crate) fn first_frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            LayoutNode::Frame(frame) => Some(frame),
            LayoutNode::Split(split) => split.children.first_mut()?.node.first_frame_mut(),
        }
    }

    /// Drop empty frames and splits, collapse single-child splits.
    /// Returns `None` if nothing is left.
    pub(crate) fn normalized(self) -> Option<LayoutNode> {
        match self {
            LayoutNode::Frame(mut frame) => {
                if frame.panels.is_empty() {
                    return None;
                }
                frame.clamp_current();
                Some(LayoutNode::Frame(frame))
            }
            LayoutNode::Split(split) => {
                let orientation = split.orientation;
                let mut children: Vec<SplitChild> = Vec::with_capacity(split.children.len());
                // Space vacated by a leading empty child goes to the next survivor
                let mut carry = 0;
                for child in split.children {
                    let extent = child.extent.max(0).saturating_add(carry);
                    carry = 0;
                    match child.node.normalized() {
                        // A nested split with the same orientation merges into this one
                        Some(LayoutNode::Split(inner)) if inner.orientation == orientation => {
                            children.extend(inner.children);
                        }
                        Some(node) => children.push(SplitChild { extent, node }),
                        None => match children.last_mut() {
                            Some(last) => last.extent = last.extent.saturating_add(extent),
                            None => carry = extent,
                        },
                    }
                }
                match children.len() {
                    0 => None,
                    1 => children.pop().map(|child| child.node),
                    _ => Some(LayoutNode::Split(Split {
                        orientation,
                        children,
                    })),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(orientation: Orientation, nodes: Vec<LayoutNode>) -> LayoutNode {
        LayoutNode::Split(Split {
            orientation,
            children: nodes
                .into_iter()
                .map(|node| SplitChild { extent: 100, node })
                .collect(),
        })
    }

    #[test]
    fn test_path_to_nested_frame() {
        let tree = split(
            Orientation::Horizontal,
            vec![
                LayoutNode::Frame(Frame::new("a")),
                split(
                    Orientation::Vertical,
                    vec![
                        LayoutNode::Frame(Frame::new("b")),
                        LayoutNode::Frame(Frame::new("c")),
                    ],
                ),
            ],
        );
        assert_eq!(tree.path_to("c"), Some(vec![1, 1]));
        assert_eq!(tree.path_to("a"), Some(vec![0]));
        assert_eq!(tree.path_to("zzz"), None);
    }

    #[test]
    fn test_normalize_collapses_single_child_split() {
        let tree = split(
            Orientation::Horizontal,
            vec![
                LayoutNode::Frame(Frame {
                    panels: vec![],
                    current: 0,
                }),
                LayoutNode::Frame(Frame::new("b")),
            ],
        );
        assert_eq!(tree.normalized(), Some(LayoutNode::Frame(Frame::new("b"))));
    }

    #[test]
    fn test_normalize_merges_same_orientation() {
        let tree = split(
            Orientation::Horizontal,
            vec![
                LayoutNode::Frame(Frame::new("a")),
                split(
                    Orientation::Horizontal,
                    vec![
                        LayoutNode::Frame(Frame::new("b")),
                        LayoutNode::Frame(Frame::new("c")),
                    ],
                ),
            ],
        );
        let Some(LayoutNode::Split(split)) = tree.normalized() else {
            panic!("expected a split");
        };
        assert_eq!(split.children.len(), 3);
    }

    #[test]
    fn test_location_codes() {
        for location in [
            DockLocation::Left,
            DockLocation::Top,
            DockLocation::Right,
            DockLocation::Bottom,
            DockLocation::Tab,
        ] {
            assert_eq!(DockLocation::from_code(location.to_code()), Ok(location));
        }
        assert!(DockLocation::from_code(0).is_err());
    }
}
