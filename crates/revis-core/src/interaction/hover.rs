//! Hover popup tracking.
//!
//! The pending popup is a countdown stored in the state and advanced by the
//! frame tick. Every pointer move over an item that is not already shown
//! restarts it, so at most one popup is ever pending.

use super::{MouseEvent, MouseEventKind, MousePayload};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Something that can be hovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum HoverItem {
    Node(String),
    Edge(String),
}

impl HoverItem {
    pub fn id(&self) -> &str {
        match self {
            HoverItem::Node(id) | HoverItem::Edge(id) => id,
        }
    }
}

/// A popup that is shown or waiting to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverPopup {
    pub item: HoverItem,
    /// Screen position of the popup.
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingHover {
    popup: HoverPopup,
    remaining: Duration,
}

/// Hover popup and rollover state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverState {
    shown: Option<HoverPopup>,
    pending: Option<PendingHover>,
    /// Item under the pointer right now, regardless of the popup.
    rollover: Option<HoverItem>,
}

impl HoverState {
    /// The popup currently shown.
    pub fn shown(&self) -> Option<&HoverPopup> {
        self.shown.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn rollover(&self) -> Option<&HoverItem> {
        self.rollover.as_ref()
    }

    /// Follow the item under the pointer. Returns `hoverHide` when a shown
    /// popup goes away.
    pub(crate) fn track(
        &mut self,
        target: Option<HoverPopup>,
        delay: Duration,
    ) -> Option<MouseEvent> {
        self.rollover = target.as_ref().map(|popup| popup.item.clone());
        let Some(target) = target else {
            self.pending = None;
            return self.hide();
        };
        if self.shown.as_ref().is_some_and(|shown| shown.item == target.item) {
            self.pending = None;
            return None;
        }
        let hidden = self.hide();
        self.pending = Some(PendingHover {
            popup: target,
            remaining: delay,
        });
        hidden
    }

    /// Drop both the pending and the shown popup.
    pub(crate) fn cancel(&mut self) -> Option<MouseEvent> {
        self.pending = None;
        self.rollover = None;
        self.hide()
    }

    /// Drop the popup silently, e.g. when a press starts a new gesture.
    pub(crate) fn clear(&mut self) {
        self.pending = None;
        self.shown = None;
    }

    /// Count the pending popup down. Returns `hoverShow` once it elapses.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<MouseEvent> {
        let pending = self.pending.as_mut()?;
        pending.remaining = pending.remaining.saturating_sub(dt);
        if !pending.remaining.is_zero() {
            return None;
        }
        let popup = self.pending.take()?.popup;
        log::debug!("Showing hover popup for {:?}", popup.item);
        let event = MouseEvent::new(
            MouseEventKind::HoverShow,
            MousePayload::Hover {
                item: popup.item.clone(),
                position: popup.position,
            },
        );
        self.shown = Some(popup);
        Some(event)
    }

    /// Forget items that no longer exist.
    pub(crate) fn retain(&mut self, exists: impl Fn(&HoverItem) -> bool) {
        if self.pending.as_ref().is_some_and(|p| !exists(&p.popup.item)) {
            self.pending = None;
        }
        if self.shown.as_ref().is_some_and(|p| !exists(&p.item)) {
            self.shown = None;
        }
        if self.rollover.as_ref().is_some_and(|item| !exists(item)) {
            self.rollover = None;
        }
    }

    fn hide(&mut self) -> Option<MouseEvent> {
        let popup = self.shown.take()?;
        Some(MouseEvent::new(
            MouseEventKind::HoverHide,
            MousePayload::Hover {
                item: popup.item,
                position: popup.position,
            },
        ))
    }
}

/// Popup position for an item anchored at `anchor`, kept on screen.
pub fn popup_position(anchor: Point, offset: f64, screen: Size) -> Point {
    let position = anchor + Vec2::new(offset, offset);
    Point::new(
        position.x.clamp(0.0, screen.width.max(0.0)),
        position.y.clamp(0.0, screen.height.max(0.0)),
    )
}
