use crate::layout::{PageSlots, assign_slots};
use crate::types::*;

/// Count pages for `image_count` images under `layout`
pub fn calculate_statistics(image_count: usize, layout: PageLayoutConfig) -> StitchStatistics {
    let slots = assign_slots(image_count, layout);

    let mut spreads = 0;
    let mut single_pages = 0;
    let mut blank_slots = 0;
    for page in &slots {
        match page {
            PageSlots::Single(_) => single_pages += 1,
            PageSlots::Spread { .. } => {
                let blanks = page.blank_slots();
                if blanks == 0 {
                    spreads += 1;
                }
                blank_slots += blanks;
            }
        }
    }

    StitchStatistics {
        source_images: image_count,
        output_pages: slots.len(),
        spreads,
        single_pages,
        blank_slots,
    }
}
