//! Retained-mode widget tree backend
//!
//! Every native object is a widget. Windows own a vertical box layout
//! (title bar over content for floating windows), and that layout is what
//! enforces minimum sizes: the widget can never be resized below it. A
//! window's parent doubles as its transient parent, the way top-level
//! widgets behave; windows are never clipped by their parent.

use std::collections::HashMap;

use super::{hide_schedules_deletion, Backend, BackendKind, BackendOptions, NativeId, NativeKind, WindowFlags};
use crate::geometry::{Rect, Size};

/// Native box layout of a widget
#[derive(Debug, Clone, Copy, Default)]
struct BoxLayout {
    /// Fixed-height title bar row stacked above the content (0 = none)
    title_bar_height: i32,
    content_minimum: Size,
}

impl BoxLayout {
    fn minimum_size(&self) -> Size {
        Size::new(
            self.content_minimum.width,
            self.content_minimum.height.saturating_add(self.title_bar_height),
        )
    }
}

#[derive(Debug)]
struct Widget {
    kind: NativeKind,
    geometry: Rect,
    visible: bool,
    parent: Option<NativeId>,
    flags: WindowFlags,
    layout: BoxLayout,
    being_deleted: bool,
}

impl Widget {
    fn is_window(&self) -> bool {
        self.kind != NativeKind::Panel || self.parent.is_none()
    }
}

#[derive(Debug)]
pub struct WidgetsBackend {
    options: BackendOptions,
    widgets: HashMap<NativeId, Widget>,
    pending_deletes: Vec<NativeId>,
    next_id: u64,
}

impl WidgetsBackend {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            options,
            widgets: HashMap::new(),
            pending_deletes: Vec::new(),
            next_id: 1,
        }
    }

    fn widget(&self, id: NativeId) -> Option<&Widget> {
        self.widgets.get(&id)
    }

    fn widget_mut(&mut self, id: NativeId) -> Option<&mut Widget> {
        let widget = self.widgets.get_mut(&id);
        if widget.is_none() {
            tracing::warn!(%id, "widgets backend: operation on unknown widget");
        }
        widget
    }

    /// True if `id` is `start` or one of its ancestors
    fn is_in_parent_chain(&self, id: NativeId, start: NativeId) -> bool {
        let mut current = Some(start);
        for _ in 0..=self.widgets.len() {
            match current {
                Some(node) if node == id => return true,
                Some(node) => current = self.widget(node).and_then(|w| w.parent),
                None => return false,
            }
        }
        false
    }

    fn children_of(&self, id: NativeId) -> Vec<NativeId> {
        let mut children: Vec<NativeId> = self
            .widgets
            .iter()
            .filter(|(_, w)| w.parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        children.sort();
        children
    }

    fn destroy_tree(&mut self, id: NativeId, destroyed: &mut Vec<NativeId>) {
        if let Some(widget) = self.widgets.get_mut(&id) {
            widget.being_deleted = true;
        } else {
            return;
        }
        for child in self.children_of(id) {
            self.destroy_tree(child, destroyed);
        }
        self.widgets.remove(&id);
        self.pending_deletes.retain(|pending| *pending != id);
        destroyed.push(id);
    }
}

impl Backend for WidgetsBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Widgets
    }

    fn create(&mut self, kind: NativeKind) -> NativeId {
        let id = NativeId(self.next_id);
        self.next_id += 1;

        let layout = BoxLayout {
            title_bar_height: match kind {
                NativeKind::FloatingWindow => self.options.title_bar_height,
                NativeKind::MainWindow | NativeKind::Panel => 0,
            },
            content_minimum: Size::default(),
        };
        let flags = match kind {
            NativeKind::MainWindow | NativeKind::FloatingWindow => WindowFlags::WINDOW,
            NativeKind::Panel => WindowFlags::empty(),
        };

        self.widgets.insert(
            id,
            Widget {
                kind,
                geometry: Rect::from_origin_size(Default::default(), layout.minimum_size()),
                visible: false,
                parent: None,
                flags,
                layout,
                being_deleted: false,
            },
        );
        id
    }

    fn destroy(&mut self, id: NativeId) {
        let mut destroyed = Vec::new();
        self.destroy_tree(id, &mut destroyed);
    }

    fn exists(&self, id: NativeId) -> bool {
        self.widgets.contains_key(&id)
    }

    fn geometry(&self, id: NativeId) -> Rect {
        self.widget(id).map(|w| w.geometry).unwrap_or_default()
    }

    fn set_geometry(&mut self, id: NativeId, rect: Rect) {
        if let Some(widget) = self.widget_mut(id) {
            let size = rect.size().expanded_to(widget.layout.minimum_size());
            widget.geometry = rect.with_size(size);
        }
    }

    fn is_visible(&self, id: NativeId) -> bool {
        self.widget(id).is_some_and(|w| w.visible)
    }

    fn set_visible(&mut self, id: NativeId, visible: bool) {
        let Some(widget) = self.widget_mut(id) else {
            return;
        };
        let was_visible = widget.visible;
        widget.visible = visible;
        if hide_schedules_deletion(widget.kind, was_visible, visible, widget.being_deleted) {
            self.schedule_delete_later(id);
        }
    }

    fn parent(&self, id: NativeId) -> Option<NativeId> {
        self.widget(id).and_then(|w| w.parent)
    }

    fn set_parent(&mut self, id: NativeId, parent: Option<NativeId>) {
        if parent.is_some_and(|p| self.is_in_parent_chain(id, p)) {
            tracing::warn!(%id, ?parent, "widgets backend: refusing a parent that would form a cycle");
            return;
        }
        if let Some(widget) = self.widget_mut(id) {
            widget.parent = parent;
        }
    }

    fn transient_parent(&self, id: NativeId) -> Option<NativeId> {
        self.widget(id)
            .filter(|w| w.kind != NativeKind::Panel)
            .and_then(|w| w.parent)
    }

    fn set_transient_parent(&mut self, id: NativeId, parent: Option<NativeId>) {
        match self.widget(id).map(|w| w.kind) {
            Some(NativeKind::MainWindow | NativeKind::FloatingWindow) => self.set_parent(id, parent),
            Some(NativeKind::Panel) => {
                tracing::debug!(%id, "widgets backend: panels carry no transient parent");
            }
            None => {
                tracing::warn!(%id, "widgets backend: operation on unknown widget");
            }
        }
    }

    fn minimum_size(&self, id: NativeId) -> Size {
        self.widget(id)
            .map(|w| w.layout.minimum_size())
            .unwrap_or_default()
    }

    fn set_content_minimum_size(&mut self, id: NativeId, size: Size) {
        if let Some(widget) = self.widget_mut(id) {
            widget.layout.content_minimum = size;
            // The layout grows the widget when its constraint changes
            let grown = widget.geometry.size().expanded_to(widget.layout.minimum_size());
            widget.geometry = widget.geometry.with_size(grown);
        }
    }

    fn window_flags(&self, id: NativeId) -> WindowFlags {
        self.widget(id).map(|w| w.flags).unwrap_or_default()
    }

    fn set_window_flags(&mut self, id: NativeId, flags: WindowFlags) {
        if let Some(widget) = self.widget_mut(id) {
            widget.flags = flags;
        }
    }

    fn visible_bounds(&self, id: NativeId) -> Rect {
        let Some(widget) = self.widget(id) else {
            return Rect::default();
        };
        if widget.is_window() {
            return widget.geometry;
        }
        match widget.parent.and_then(|p| self.widget(p)) {
            Some(parent) => widget
                .geometry
                .intersected(&Rect::from_origin_size(Default::default(), parent.geometry.size())),
            None => widget.geometry,
        }
    }

    fn is_being_deleted(&self, id: NativeId) -> bool {
        self.widget(id).is_some_and(|w| w.being_deleted)
    }

    fn schedule_delete_later(&mut self, id: NativeId) {
        if let Some(widget) = self.widget_mut(id) {
            widget.being_deleted = true;
            if !self.pending_deletes.contains(&id) {
                tracing::debug!(%id, "widgets backend: deletion scheduled");
                self.pending_deletes.push(id);
            }
        }
    }

    fn process_events(&mut self) -> Vec<NativeId> {
        let pending = std::mem::take(&mut self.pending_deletes);
        let mut destroyed = Vec::new();
        for id in pending {
            self.destroy_tree(id, &mut destroyed);
        }
        destroyed
    }
}
