//! Page composition
//!
//! Stateless: every call starts from the ordered images and the layout and
//! returns fresh pages.

use crate::layout::{PageSlots, assign_slots, plan_page};
use crate::options::ExportOptions;
use crate::record::ImageRecord;
use crate::render::{Page, render_page, scale_image};
use crate::types::*;
use image::DynamicImage;

/// Compose one page from its slots and the decoded crops of its sources.
///
/// `decoded` pairs each source index with its (already scaled) crop.
pub fn compose_page(slots: PageSlots, decoded: &[(usize, DynamicImage)], color: ColorMode) -> Page {
    let find = |source: usize| decoded.iter().find(|(s, _)| *s == source).map(|(_, img)| img);

    let plan = plan_page(slots, |source| {
        find(source)
            .map(|img| (img.width(), img.height()))
            .unwrap_or((0, 0))
    });
    let images: Vec<&DynamicImage> = plan
        .placements
        .iter()
        .filter_map(|p| find(p.source))
        .collect();

    render_page(&plan, &images, color)
}

/// Compose every page from in-memory crops given in sequence order
pub fn compose_pages(crops: &[DynamicImage], layout: PageLayoutConfig, color: ColorMode) -> Vec<Page> {
    assign_slots(crops.len(), layout)
        .into_iter()
        .map(|slots| {
            let decoded: Vec<(usize, DynamicImage)> = slots
                .sources()
                .into_iter()
                .map(|i| (i, crops[i].clone()))
                .collect();
            compose_page(slots, &decoded, color)
        })
        .collect()
}

/// Decode, crop and scale one record the way export does
pub fn prepare_crop(record: &ImageRecord, options: &ExportOptions) -> Result<DynamicImage> {
    let crop = record.crop_image()?;
    Ok(scale_image(crop, options.scale))
}

/// Compose output page `page_index` for the records, decoding only the
/// images that appear on it. Returns `None` past the last page.
pub fn compose_preview_page(
    records: &[ImageRecord],
    layout: PageLayoutConfig,
    options: &ExportOptions,
    page_index: usize,
) -> Result<Option<Page>> {
    let Some(slots) = assign_slots(records.len(), layout).get(page_index).copied() else {
        return Ok(None);
    };

    let mut decoded = Vec::with_capacity(2);
    for source in slots.sources() {
        decoded.push((source, prepare_crop(&records[source], options)?));
    }

    Ok(Some(compose_page(slots, &decoded, options.color_mode())))
}
