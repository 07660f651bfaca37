//! Scene-graph item tree backend
//!
//! Native objects are items. A top-level item (main window, floating window,
//! or a panel with no parent item) is the root item of its own native view.
//! Items have no layout managers, so this adapter does the work a layout
//! would do:
//!
//! - floating windows reserve the title bar height on top of the content
//!   minimum,
//! - every geometry request is expanded to the minimum before it reaches the
//!   view, and the root item is sized along with the view.
//!
//! Views keep two parent relationships apart. The transient parent is a
//! window-manager hint; the cleanup parent is the item that destroys the view
//! with it. The view's native window parent is never set by the adapter:
//! that would embed the floating view and clip it to the parent's bounds.

use std::collections::HashMap;

use super::{hide_schedules_deletion, Backend, BackendKind, BackendOptions, NativeId, NativeKind, WindowFlags};
use crate::geometry::{Rect, Size};

#[derive(Debug, Clone, Default)]
struct View {
    geometry: Rect,
    visible: bool,
    flags: WindowFlags,
    transient_parent: Option<NativeId>,
    /// Native window embedding; clips the view to the parent
    native_parent: Option<NativeId>,
}

#[derive(Debug)]
struct Item {
    kind: NativeKind,
    /// Geometry relative to the parent item (root items fill their view)
    geometry: Rect,
    visible: bool,
    parent_item: Option<NativeId>,
    cleanup_parent: Option<NativeId>,
    flags: WindowFlags,
    content_minimum: Size,
    being_deleted: bool,
    view: Option<View>,
}

#[derive(Debug)]
pub struct QuickBackend {
    options: BackendOptions,
    items: HashMap<NativeId, Item>,
    pending_deletes: Vec<NativeId>,
    next_id: u64,
}

impl QuickBackend {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            options,
            items: HashMap::new(),
            pending_deletes: Vec::new(),
            next_id: 1,
        }
    }

    /// Embed a top-level's view into another view's native window.
    ///
    /// Not part of [`Backend`]: the docking core never embeds floating
    /// views, it only sets transient and cleanup parents.
    pub fn set_native_window_parent(&mut self, id: NativeId, parent: Option<NativeId>) {
        if let Some(view) = self.items.get_mut(&id).and_then(|item| item.view.as_mut()) {
            view.native_parent = parent;
        }
    }

    fn item(&self, id: NativeId) -> Option<&Item> {
        self.items.get(&id)
    }

    fn item_mut(&mut self, id: NativeId) -> Option<&mut Item> {
        let item = self.items.get_mut(&id);
        if item.is_none() {
            tracing::warn!(%id, "quick backend: operation on unknown item");
        }
        item
    }

    fn minimum_for(&self, item: &Item) -> Size {
        match item.kind {
            NativeKind::FloatingWindow => {
                item.content_minimum + Size::new(0, self.options.title_bar_height)
            }
            NativeKind::MainWindow | NativeKind::Panel => item.content_minimum,
        }
    }

    /// True if `id` is `start` or one of its cleanup ancestors
    fn is_in_cleanup_chain(&self, id: NativeId, start: NativeId) -> bool {
        let mut current = Some(start);
        for _ in 0..=self.items.len() {
            match current {
                Some(node) if node == id => return true,
                Some(node) => current = self.item(node).and_then(|item| item.cleanup_parent),
                None => return false,
            }
        }
        false
    }

    fn cleanup_children_of(&self, id: NativeId) -> Vec<NativeId> {
        let mut children: Vec<NativeId> = self
            .items
            .iter()
            .filter(|(_, item)| item.cleanup_parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        children.sort();
        children
    }

    fn destroy_tree(&mut self, id: NativeId, destroyed: &mut Vec<NativeId>) {
        match self.items.get_mut(&id) {
            Some(item) => item.being_deleted = true,
            None => return,
        }
        for child in self.cleanup_children_of(id) {
            self.destroy_tree(child, destroyed);
        }
        self.items.remove(&id);
        self.pending_deletes.retain(|pending| *pending != id);
        destroyed.push(id);
    }
}

impl Backend for QuickBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Quick
    }

    fn create(&mut self, kind: NativeKind) -> NativeId {
        let id = NativeId(self.next_id);
        self.next_id += 1;

        let flags = match kind {
            NativeKind::MainWindow | NativeKind::FloatingWindow => WindowFlags::WINDOW,
            NativeKind::Panel => WindowFlags::empty(),
        };
        let mut item = Item {
            kind,
            geometry: Rect::default(),
            visible: false,
            parent_item: None,
            cleanup_parent: None,
            flags,
            content_minimum: Size::default(),
            being_deleted: false,
            view: None,
        };

        // Root items start at the minimum size and fill their view
        let minimum = self.minimum_for(&item);
        item.geometry = Rect::from_origin_size(Default::default(), minimum);
        item.view = Some(View {
            geometry: item.geometry,
            flags,
            ..View::default()
        });

        self.items.insert(id, item);
        id
    }

    fn destroy(&mut self, id: NativeId) {
        let mut destroyed = Vec::new();
        self.destroy_tree(id, &mut destroyed);
    }

    fn exists(&self, id: NativeId) -> bool {
        self.items.contains_key(&id)
    }

    fn geometry(&self, id: NativeId) -> Rect {
        match self.item(id) {
            Some(Item {
                view: Some(view), ..
            }) => view.geometry,
            Some(item) => item.geometry,
            None => Rect::default(),
        }
    }

    fn set_geometry(&mut self, id: NativeId, rect: Rect) {
        let Some(minimum) = self.item(id).map(|item| self.minimum_for(item)) else {
            tracing::warn!(%id, "quick backend: operation on unknown item");
            return;
        };
        // No layouts here: clamp explicitly
        let size = rect.size().expanded_to(minimum);
        if let Some(item) = self.item_mut(id) {
            match item.view.as_mut() {
                Some(view) => {
                    item.geometry = Rect::from_origin_size(Default::default(), size);
                    view.geometry = rect.with_size(size);
                }
                None => item.geometry = rect.with_size(size),
            }
        }
    }

    fn is_visible(&self, id: NativeId) -> bool {
        self.item(id).is_some_and(|item| item.visible)
    }

    fn set_visible(&mut self, id: NativeId, visible: bool) {
        let Some(item) = self.item_mut(id) else {
            return;
        };
        let was_visible = item.visible;
        item.visible = visible;
        if let Some(view) = item.view.as_mut() {
            view.visible = visible;
        }
        // Mirrors the item's visibleChanged handler
        if hide_schedules_deletion(item.kind, was_visible, visible, item.being_deleted) {
            self.schedule_delete_later(id);
        }
    }

    fn parent(&self, id: NativeId) -> Option<NativeId> {
        self.item(id).and_then(|item| item.cleanup_parent)
    }

    fn set_parent(&mut self, id: NativeId, parent: Option<NativeId>) {
        if parent.is_some_and(|p| self.is_in_cleanup_chain(id, p)) {
            tracing::warn!(%id, ?parent, "quick backend: refusing a parent that would form a cycle");
            return;
        }
        let Some(item) = self.item_mut(id) else {
            return;
        };
        item.cleanup_parent = parent;
        if item.kind != NativeKind::Panel {
            // Top-levels stay root items of their own view
            return;
        }

        item.parent_item = parent;
        match (parent, item.view.is_some()) {
            (Some(_), true) => {
                // Reparented into a window: the panel's own view goes away
                item.view = None;
            }
            (None, false) => {
                item.view = Some(View {
                    geometry: item.geometry,
                    visible: item.visible,
                    flags: item.flags,
                    ..View::default()
                });
            }
            _ => {}
        }
    }

    fn transient_parent(&self, id: NativeId) -> Option<NativeId> {
        self.item(id)
            .and_then(|item| item.view.as_ref())
            .and_then(|view| view.transient_parent)
    }

    fn set_transient_parent(&mut self, id: NativeId, parent: Option<NativeId>) {
        if let Some(item) = self.item_mut(id) {
            match item.view.as_mut() {
                Some(view) => view.transient_parent = parent,
                None => tracing::debug!(%id, "quick backend: embedded item has no view"),
            }
        }
    }

    fn minimum_size(&self, id: NativeId) -> Size {
        self.item(id)
            .map(|item| self.minimum_for(item))
            .unwrap_or_default()
    }

    fn set_content_minimum_size(&mut self, id: NativeId, size: Size) {
        let Some(item) = self.item_mut(id) else {
            return;
        };
        item.content_minimum = size;
        // Re-apply the current geometry so the new minimum takes effect
        let current = self.geometry(id);
        self.set_geometry(id, current);
    }

    fn window_flags(&self, id: NativeId) -> WindowFlags {
        match self.item(id) {
            Some(Item {
                view: Some(view), ..
            }) => view.flags,
            Some(item) => item.flags,
            None => WindowFlags::empty(),
        }
    }

    fn set_window_flags(&mut self, id: NativeId, flags: WindowFlags) {
        if let Some(item) = self.item_mut(id) {
            item.flags = flags;
            if let Some(view) = item.view.as_mut() {
                view.flags = flags;
            }
        }
    }

    fn visible_bounds(&self, id: NativeId) -> Rect {
        let Some(item) = self.item(id) else {
            return Rect::default();
        };
        match &item.view {
            Some(view) => match view.native_parent.filter(|p| self.exists(*p)) {
                Some(parent) => {
                    let parent_size = self.geometry(parent).size();
                    view.geometry
                        .intersected(&Rect::from_origin_size(Default::default(), parent_size))
                }
                None => view.geometry,
            },
            None => match item.parent_item {
                Some(parent) => {
                    let parent_size = self.geometry(parent).size();
                    item.geometry
                        .intersected(&Rect::from_origin_size(Default::default(), parent_size))
                }
                None => item.geometry,
            },
        }
    }

    fn is_being_deleted(&self, id: NativeId) -> bool {
        self.item(id).is_some_and(|item| item.being_deleted)
    }

    fn schedule_delete_later(&mut self, id: NativeId) {
        if let Some(item) = self.item_mut(id) {
            item.being_deleted = true;
            if !self.pending_deletes.contains(&id) {
                tracing::debug!(%id, "quick backend: deletion scheduled");
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
