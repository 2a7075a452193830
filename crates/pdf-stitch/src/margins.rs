//! Crop margin normalization
//!
//! Margin input is order independent: a handle dragged past its partner
//! swaps roles instead of producing a negative-area rectangle.

/// Crop rectangle in source pixel coordinates.
///
/// Always satisfies `left <= right` and `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    /// The whole image
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Turn two horizontal edges `(a, b)` and two vertical edges `(c, d)` into a
/// valid rectangle inside `width x height`.
pub fn normalize(a: i64, b: i64, c: i64, d: i64, width: u32, height: u32) -> CropRect {
    let (left, right) = ordered_edges(a, b, width);
    let (top, bottom) = ordered_edges(c, d, height);
    CropRect {
        left,
        top,
        right,
        bottom,
    }
}

fn ordered_edges(a: i64, b: i64, bound: u32) -> (u32, u32) {
    let clamp = |v: i64| v.clamp(0, bound as i64) as u32;
    (clamp(a.min(b)), clamp(a.max(b)))
}

/// Refit a raw edge value after its bound shrank.
///
/// Values above `bound` drop to `bound - 1`, values within the bound are
/// kept as they are.
pub fn fit_to_bound(value: i64, bound: u32) -> i64 {
    if value > bound as i64 {
        (bound as i64 - 1).max(0)
    } else {
        value
    }
}

/// Raw edge values as entered in the margin editor, in any order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarginInput {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl MarginInput {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Input covering `width x height` entirely
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i64, height as i64)
    }

    /// Resolve against one image's dimensions
    pub fn normalize(&self, width: u32, height: u32) -> CropRect {
        normalize(self.left, self.right, self.top, self.bottom, width, height)
    }

    fn fit_to(self, width: u32, height: u32) -> Self {
        Self {
            left: fit_to_bound(self.left, width),
            top: fit_to_bound(self.top, height),
            right: fit_to_bound(self.right, width),
            bottom: fit_to_bound(self.bottom, height),
        }
    }
}

impl From<CropRect> for MarginInput {
    fn from(rect: CropRect) -> Self {
        Self::new(
            rect.left as i64,
            rect.top as i64,
            rect.right as i64,
            rect.bottom as i64,
        )
    }
}

/// Which records a margin edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginScope {
    /// Every loaded image
    All,
    /// Only the image at this position in the session
    Single(usize),
}

/// State behind the margin editing controls.
///
/// The limits follow the largest image of the loaded batch; each record
/// still clamps the shared input to its own dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarginEditor {
    input: MarginInput,
    max_width: u32,
    max_height: u32,
    apply_to_all: bool,
}

impl Default for MarginEditor {
    fn default() -> Self {
        Self {
            input: MarginInput::default(),
            max_width: 0,
            max_height: 0,
            apply_to_all: true,
        }
    }
}

impl MarginEditor {
    pub fn input(&self) -> MarginInput {
        self.input
    }

    pub fn limits(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    pub fn apply_to_all(&self) -> bool {
        self.apply_to_all
    }

    pub fn set_apply_to_all(&mut self, apply_to_all: bool) {
        self.apply_to_all = apply_to_all;
    }

    /// Store a new raw input, clamped to the editor limits
    pub fn set_input(&mut self, input: MarginInput) -> MarginInput {
        let rect = input.normalize(self.max_width, self.max_height);
        self.input = rect.into();
        self.input
    }

    /// Scope an edit according to the apply-to-all flag
    pub fn scope_for(&self, current: usize) -> MarginScope {
        if self.apply_to_all {
            MarginScope::All
        } else {
            MarginScope::Single(current)
        }
    }

    /// Reset to a fresh batch: limits and input span the whole extent
    pub fn reset(&mut self, max_width: u32, max_height: u32) {
        self.max_width = max_width;
        self.max_height = max_height;
        self.input = MarginInput::full(max_width, max_height);
    }

    /// Change the limits, refitting the current input when they shrink
    pub fn set_limits(&mut self, max_width: u32, max_height: u32) {
        self.max_width = max_width;
        self.max_height = max_height;
        let fitted = self.input.fit_to(max_width, max_height);
        self.input = fitted.normalize(max_width, max_height).into();
    }
}
