//! Horizontal card strip scroll state.
//!
//! Offsets are in surface units (pixels, terminal columns, ...) and are
//! never positive: `0` shows the first card at the left edge and the most
//! negative legal value, [`TickerStrip::max_scroll`], shows the last card at
//! the right edge.

use serde::{Deserialize, Serialize};

/// Card geometry on the strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardLayout {
    /// Width of one card.
    pub card_width: f64,
    /// Space between neighbouring cards.
    pub gap: f64,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            card_width: 30.0,
            gap: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    origin: f64,
}

/// Scroll offset, active card and drag gesture of the ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerStrip {
    layout: CardLayout,
    count: usize,
    viewport_width: f64,
    offset: f64,
    active: Option<usize>,
    drag: Option<Drag>,
}

impl TickerStrip {
    /// Strip of `count` cards shown in a viewport `viewport_width` wide. The
    /// first card starts highlighted.
    pub fn new(layout: CardLayout, count: usize, viewport_width: f64) -> Self {
        Self {
            layout,
            count,
            viewport_width: viewport_width.max(0.0),
            offset: 0.0,
            active: (count > 0).then_some(0),
            drag: None,
        }
    }

    /// Card geometry.
    pub fn layout(&self) -> CardLayout {
        self.layout
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when the strip holds no cards.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current (non-positive) scroll offset.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Index of the highlighted card.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Whether a drag gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Visible width of the strip.
    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    /// Left edge of card `index` relative to the start of the track.
    pub fn card_left(&self, index: usize) -> f64 {
        index as f64 * (self.layout.card_width + self.layout.gap)
    }

    /// Total width of all cards and the gaps between them.
    pub fn track_width(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.card_left(self.count - 1) + self.layout.card_width
    }

    /// Most negative legal offset; `0` when every card fits.
    pub fn max_scroll(&self) -> f64 {
        (-(self.track_width() - self.viewport_width)).min(0.0)
    }

    fn clamp(&self, offset: f64) -> f64 {
        offset.clamp(self.max_scroll(), 0.0)
    }

    /// Resize the viewport and keep the offset within the new bounds.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width.max(0.0);
        self.offset = self.clamp(self.offset);
    }

    /// Highlight card `index` and scroll so it sits as close to the centre as
    /// the bounds allow. Out-of-range indices are ignored.
    pub fn focus(&mut self, index: usize) {
        if index >= self.count {
            return;
        }
        self.active = Some(index);
        let target =
            self.card_left(index) - self.viewport_width / 2.0 + self.layout.card_width / 2.0;
        self.offset = self.clamp(-target);
    }

    /// Pointer or touch pressed at `pointer_x`.
    pub fn begin_drag(&mut self, pointer_x: f64) {
        self.drag = Some(Drag {
            origin: pointer_x - self.offset,
        });
    }

    /// Pointer moved; tracks 1:1 while a drag is active. Returns whether the
    /// offset was updated.
    pub fn drag_to(&mut self, pointer_x: f64) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        self.offset = self.clamp(pointer_x - drag.origin);
        true
    }

    /// Pointer released.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Card under viewport coordinate `x`, ignoring clicks that land in gaps.
    pub fn card_at(&self, x: f64) -> Option<usize> {
        if x < 0.0 || x >= self.viewport_width {
            return None;
        }
        let track_x = x - self.offset;
        let stride = self.layout.card_width + self.layout.gap;
        if stride <= 0.0 {
            return None;
        }
        let index = (track_x / stride).floor() as usize;
        let within = track_x - self.card_left(index);
        (index < self.count && within < self.layout.card_width).then_some(index)
    }

    /// Cards at least partly inside the viewport with their viewport x.
    pub fn visible_cards(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.count)
            .map(move |index| (index, self.card_left(index) + self.offset))
            .filter(move |(_, x)| *x + self.layout.card_width > 0.0 && *x < self.viewport_width)
    }
}
