//! Page layout calculation
//!
//! Works on image dimensions only, so every rule here is testable without
//! decoding pixels:
//! - Slot assignment (which images share a page, and on which side)
//! - Page geometry (canvas size and paste offsets)

mod geometry;
mod slots;

pub use geometry::*;
pub use slots::*;
