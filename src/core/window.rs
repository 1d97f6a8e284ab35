//! Windowed rendering (list virtualisation).
//!
//! Given a sequence length, a scroll container and a per-item size estimate,
//! [`Virtualizer`] reports which items intersect the viewport plus an
//! overscan margin on each side. It knows nothing about what the items are.
//!
//! Sizes and offsets are in whatever unit the container uses (terminal rows
//! for the dashboard).

/// Anything with a viewport that can be scrolled.
pub trait ScrollContainer {
    /// Visible extent along the scroll axis
    fn viewport_extent(&self) -> usize;
    /// Current scroll position along the scroll axis
    fn scroll_offset(&self) -> usize;
}

/// Plain viewport state, for callers that track scrolling themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub extent: usize,
    pub offset: usize,
}

impl Viewport {
    pub fn new(extent: usize, offset: usize) -> Self {
        Self { extent, offset }
    }
}

impl ScrollContainer for Viewport {
    fn viewport_extent(&self) -> usize {
        self.extent
    }

    fn scroll_offset(&self) -> usize {
        self.offset
    }
}

/// One item to materialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualItem {
    pub index: usize,
    /// Offset of the item's leading edge from the top of the list
    pub start: usize,
    pub size: usize,
}

impl VirtualItem {
    pub fn end(&self) -> usize {
        self.start + self.size
    }
}

/// Where to place an item when scrolling to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollAlign {
    Start,
    End,
    /// Only scroll if the item is not already fully visible
    #[default]
    Auto,
}

#[derive(Debug, Clone)]
pub struct Virtualizer {
    count: usize,
    estimate: usize,
    overscan: usize,
    measured: Vec<Option<usize>>,
    /// `starts[i]` is the leading edge of item `i`; `starts[count]` is the total
    starts: Vec<usize>,
    attached: bool,
}

impl Virtualizer {
    /// A detached virtualizer over `count` items. Sizes below 1 are raised to 1.
    pub fn new(count: usize, estimate: usize, overscan: usize) -> Self {
        let mut v = Self {
            count,
            estimate: estimate.max(1),
            overscan,
            measured: vec![None; count],
            starts: Vec::new(),
            attached: false,
        };
        v.rebuild();
        v
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stop computing ranges until re-attached.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Resize the sequence. Measurements for surviving indices are kept.
    pub fn set_count(&mut self, count: usize) {
        if count == self.count {
            return;
        }
        self.count = count;
        self.measured.resize(count, None);
        self.rebuild();
    }

    /// Replace the estimate used for unmeasured items.
    pub fn set_estimate(&mut self, estimate: usize) {
        let estimate = estimate.max(1);
        if estimate != self.estimate {
            self.estimate = estimate;
            self.rebuild();
        }
    }

    /// Record the real size of one item. Out-of-range indices are ignored.
    pub fn measure(&mut self, index: usize, size: usize) {
        if index >= self.count {
            return;
        }
        let size = size.max(1);
        if self.measured[index] != Some(size) {
            self.measured[index] = Some(size);
            self.rebuild();
        }
    }

    /// Full scrollable extent of the list.
    pub fn total_size(&self) -> usize {
        self.starts.last().copied().unwrap_or(0)
    }

    fn size_of(&self, index: usize) -> usize {
        self.measured[index].unwrap_or(self.estimate)
    }

    fn rebuild(&mut self) {
        self.starts.clear();
        self.starts.reserve(self.count + 1);
        let mut acc = 0usize;
        self.starts.push(acc);
        for index in 0..self.count {
            acc = acc.saturating_add(self.size_of(index));
            self.starts.push(acc);
        }
    }

    fn item(&self, index: usize) -> VirtualItem {
        VirtualItem {
            index,
            start: self.starts[index],
            size: self.size_of(index),
        }
    }

    /// Clamp a scroll position to the scrollable range for a viewport.
    pub fn clamp_offset(&self, offset: usize, extent: usize) -> usize {
        offset.min(self.total_size().saturating_sub(extent))
    }

    /// Items intersecting the viewport, widened by `overscan` on each side
    /// and clamped to `[0, count - 1]`. Empty when detached, when there are
    /// no items, or when the viewport has no extent.
    pub fn virtual_items<C: ScrollContainer + ?Sized>(&self, container: &C) -> Vec<VirtualItem> {
        let extent = container.viewport_extent();
        if !self.attached || self.count == 0 || extent == 0 {
            return Vec::new();
        }

        let offset = self.clamp_offset(container.scroll_offset(), extent);
        let window_end = offset.saturating_add(extent);

        // first item whose trailing edge is past the offset
        let first = self.starts[1..]
            .partition_point(|&end| end <= offset)
            .min(self.count - 1);
        // last item whose leading edge is before the window end
        let last = self.starts[..self.count]
            .partition_point(|&start| start < window_end)
            .saturating_sub(1)
            .max(first);

        let from = first.saturating_sub(self.overscan);
        let to = last.saturating_add(self.overscan).min(self.count - 1);

        (from..=to).map(|index| self.item(index)).collect()
    }

    /// Scroll position that brings `index` into view, or `None` if the
    /// index is out of range.
    pub fn offset_for_index<C: ScrollContainer + ?Sized>(
        &self,
        index: usize,
        align: ScrollAlign,
        container: &C,
    ) -> Option<usize> {
        if index >= self.count {
            return None;
        }
        let extent = container.viewport_extent();
        let current = container.scroll_offset();
        let item = self.item(index);

        let target = match align {
            ScrollAlign::Start => item.start,
            ScrollAlign::End => item.end().saturating_sub(extent),
            ScrollAlign::Auto => {
                if item.start < current {
                    item.start
                } else if item.end() > current.saturating_add(extent) {
                    item.end().saturating_sub(extent)
                } else {
                    current
                }
            }
        };
        Some(self.clamp_offset(target, extent))
    }

    /// Move a viewport so that `index` is visible. Returns `false` if the
    /// index is out of range.
    pub fn scroll_to_index(&self, viewport: &mut Viewport, index: usize, align: ScrollAlign) -> bool {
        match self.offset_for_index(index, align, viewport) {
            Some(offset) => {
                viewport.offset = offset;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attached(count: usize, estimate: usize, overscan: usize) -> Virtualizer {
        let mut v = Virtualizer::new(count, estimate, overscan);
        v.attach();
        v
    }

    fn indices(items: &[VirtualItem]) -> Vec<usize> {
        items.iter().map(|i| i.index).collect()
    }

    #[test]
    fn test_top_of_list() {
        let v = attached(1000, 72, 5);
        let items = v.virtual_items(&Viewport::new(720, 0));
        // 10 visible + 5 overscan below, none above
        assert_eq!(indices(&items), (0..15).collect::<Vec<_>>());
        assert_eq!(items[3].start, 216);
        assert_eq!(v.total_size(), 72_000);
    }

    #[test]
    fn test_middle_of_list() {
        let v = attached(1000, 10, 2);
        // offset 105 → item 10 partially visible through item 20
        let items = v.virtual_items(&Viewport::new(100, 105));
        assert_eq!(indices(&items), (8..=22).collect::<Vec<_>>());
    }

    #[test]
    fn test_bottom_clamps() {
        let v = attached(50, 1, 3);
        let items = v.virtual_items(&Viewport::new(10, 10_000));
        assert_eq!(items.last().unwrap().index, 49);
        assert_eq!(items.first().unwrap().index, 37);
    }

    #[test]
    fn test_detached_and_empty() {
        let mut v = Virtualizer::new(100, 1, 2);
        assert!(v.virtual_items(&Viewport::new(10, 0)).is_empty());

        v.attach();
        assert!(!v.virtual_items(&Viewport::new(10, 0)).is_empty());
        assert!(v.virtual_items(&Viewport::new(0, 0)).is_empty());

        v.detach();
        assert!(v.virtual_items(&Viewport::new(10, 0)).is_empty());

        let empty = attached(0, 1, 2);
        assert!(empty.virtual_items(&Viewport::new(10, 0)).is_empty());
        assert_eq!(empty.total_size(), 0);
    }

    #[test]
    fn test_measure_shifts_offsets() {
        let mut v = attached(10, 2, 0);
        v.measure(1, 5);
        assert_eq!(v.total_size(), 23);
        let items = v.virtual_items(&Viewport::new(100, 0));
        assert_eq!(items[2].start, 7);
        assert_eq!(items[1].size, 5);

        // ignored
        v.measure(99, 5);
        assert_eq!(v.total_size(), 23);
    }

    #[test]
    fn test_set_count_keeps_measurements() {
        let mut v = attached(3, 1, 0);
        v.measure(0, 4);
        v.set_count(5);
        assert_eq!(v.total_size(), 8);
        v.set_count(1);
        assert_eq!(v.total_size(), 4);
    }

    #[test]
    fn test_scroll_to_index() {
        let v = attached(100, 1, 0);
        let mut viewport = Viewport::new(10, 0);

        assert!(v.scroll_to_index(&mut viewport, 5, ScrollAlign::Auto));
        assert_eq!(viewport.offset, 0);

        assert!(v.scroll_to_index(&mut viewport, 25, ScrollAlign::Auto));
        assert_eq!(viewport.offset, 16);

        assert!(v.scroll_to_index(&mut viewport, 3, ScrollAlign::Auto));
        assert_eq!(viewport.offset, 3);

        assert!(v.scroll_to_index(&mut viewport, 40, ScrollAlign::Start));
        assert_eq!(viewport.offset, 40);

        assert!(v.scroll_to_index(&mut viewport, 99, ScrollAlign::Start));
        assert_eq!(viewport.offset, 90);

        assert!(!v.scroll_to_index(&mut viewport, 100, ScrollAlign::Start));
        assert_eq!(viewport.offset, 90);
    }

    proptest! {
        #[test]
        fn prop_range_in_bounds_and_size_bounded(
            count in 0usize..5_000,
            estimate in 1usize..100,
            overscan in 0usize..20,
            extent in 1usize..2_000,
            offset in 0usize..500_000,
        ) {
            let v = attached(count, estimate, overscan);
            let items = v.virtual_items(&Viewport::new(extent, offset));

            let bound = extent.div_ceil(estimate) + 1 + 2 * overscan;
            prop_assert!(items.len() <= bound, "{} > {}", items.len(), bound);

            for pair in items.windows(2) {
                prop_assert_eq!(pair[0].index + 1, pair[1].index);
                prop_assert_eq!(pair[0].end(), pair[1].start);
            }
            for item in &items {
                prop_assert!(item.index < count);
            }
            if count > 0 {
                prop_assert!(!items.is_empty());
            }
        }
    }
}
