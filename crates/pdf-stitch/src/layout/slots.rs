//! Slot assignment: grouping images into pages

use crate::types::PageLayoutConfig;

/// The images that make up one output page, by index into the ordered
/// image sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlots {
    /// Page sized exactly to one image (single-page mode or separate cover)
    Single(usize),
    /// Double-wide page; at least one side is occupied
    Spread {
        left: Option<usize>,
        right: Option<usize>,
    },
}

impl PageSlots {
    /// Source indices in sequence order
    pub fn sources(&self) -> Vec<usize> {
        match *self {
            PageSlots::Single(i) => vec![i],
            PageSlots::Spread { left, right } => {
                let mut out: Vec<usize> = left.into_iter().chain(right).collect();
                out.sort_unstable();
                out
            }
        }
    }

    /// Number of empty halves on this page
    pub fn blank_slots(&self) -> usize {
        match self {
            PageSlots::Single(_) => 0,
            PageSlots::Spread { left, right } => {
                usize::from(left.is_none()) + usize::from(right.is_none())
            }
        }
    }
}

/// Group `count` images into pages.
///
/// Pairs are always consecutive images `(a, b)`; the reading direction only
/// decides which side each one lands on.
pub fn assign_slots(count: usize, layout: PageLayoutConfig) -> Vec<PageSlots> {
    let (double_pages, right_to_left) = layout.mode.resolve();

    if !double_pages {
        return (0..count).map(PageSlots::Single).collect();
    }

    let mut pages = Vec::with_capacity(count / 2 + 1);
    let mut start = 0;

    if layout.separate_cover && count > 0 {
        pages.push(PageSlots::Single(0));
        start = 1;
    }

    for a in (start..count).step_by(2) {
        let b = (a + 1 < count).then_some(a + 1);
        let slots = match (right_to_left, b) {
            (false, b) => PageSlots::Spread {
                left: Some(a),
                right: b,
            },
            (true, Some(b)) => PageSlots::Spread {
                left: Some(b),
                right: Some(a),
            },
            (true, None) => PageSlots::Spread {
                left: None,
                right: Some(a),
            },
        };
        pages.push(slots);
    }

    pages
}
