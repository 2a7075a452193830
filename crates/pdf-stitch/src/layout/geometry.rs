//! Page geometry: canvas sizes and paste offsets
//!
//! All values are in pixels of the (scaled) cropped images. Images are
//! centred vertically and pushed against the outer edge horizontally:
//! left images at `x = 0`, right images flush with the right edge.

use super::PageSlots;

/// Where one image goes on the page canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index of the source image in the ordered sequence
    pub source: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Resolved layout of one output page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub width: u32,
    pub height: u32,
    /// Placements in left-to-right order on the canvas
    pub placements: Vec<Placement>,
}

/// Canvas size of a spread.
///
/// With both sides filled the widths add up; a lone side is doubled so the
/// page keeps the proportions of a full spread.
pub fn spread_canvas(left: Option<(u32, u32)>, right: Option<(u32, u32)>) -> (u32, u32) {
    let mut width = 0;
    let mut height = 0;

    if let Some((w, h)) = left {
        width += if right.is_some() { w } else { w * 2 };
        height = height.max(h);
    }
    if let Some((w, h)) = right {
        width += if left.is_some() { w } else { w * 2 };
        height = height.max(h);
    }

    (width, height)
}

fn centered_y(canvas_height: u32, image_height: u32) -> u32 {
    canvas_height.saturating_sub(image_height) / 2
}

/// Resolve a page's geometry from its slots and the size of each image.
pub fn plan_page(slots: PageSlots, size_of: impl Fn(usize) -> (u32, u32)) -> PagePlan {
    match slots {
        PageSlots::Single(source) => {
            let (width, height) = size_of(source);
            PagePlan {
                width,
                height,
                placements: vec![Placement {
                    source,
                    x: 0,
                    y: 0,
                    width,
                    height,
                }],
            }
        }
        PageSlots::Spread { left, right } => {
            let left_size = left.map(&size_of);
            let right_size = right.map(&size_of);
            let (width, height) = spread_canvas(left_size, right_size);

            let mut placements = Vec::with_capacity(2);
            if let (Some(source), Some((w, h))) = (left, left_size) {
                placements.push(Placement {
                    source,
                    x: 0,
                    y: centered_y(height, h),
                    width: w,
                    height: h,
                });
            }
            if let (Some(source), Some((w, h))) = (right, right_size) {
                placements.push(Placement {
                    source,
                    x: width - w,
                    y: centered_y(height, h),
                    width: w,
                    height: h,
                });
            }

            PagePlan {
                width,
                height,
                placements,
            }
        }
    }
}

/// Plan every page for images of the given sizes
pub fn plan_pages(sizes: &[(u32, u32)], slots: &[PageSlots]) -> Vec<PagePlan> {
    slots
        .iter()
        .map(|&s| plan_page(s, |i| sizes[i]))
        .collect()
}
