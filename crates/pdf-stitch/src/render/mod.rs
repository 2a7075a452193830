//! Pixel rendering
//!
//! Turns page plans and cropped rasters into page images, and draws the
//! margin editor preview.

mod page;
mod preview;

pub use page::{Page, render_page, scale_image, scaled_size};
pub use preview::{CROP_GUIDE_COLOR, crop_preview, render_crop_preview};
