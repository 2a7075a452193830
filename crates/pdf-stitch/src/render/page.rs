use crate::layout::PagePlan;
use crate::types::ColorMode;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// A composed output page
#[derive(Debug, Clone)]
pub struct Page {
    /// Source images on this page, left to right
    pub sources: Vec<usize>,
    pub image: DynamicImage,
}

impl Page {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// True for a zero-area page (produced by an empty crop)
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Paint `images` onto a white canvas according to `plan`.
///
/// `images[i]` is pasted at `plan.placements[i]`.
pub fn render_page(plan: &PagePlan, images: &[&DynamicImage], color: ColorMode) -> Page {
    debug_assert_eq!(plan.placements.len(), images.len());

    let image = match color {
        ColorMode::Rgb => {
            let mut canvas = RgbImage::from_pixel(plan.width, plan.height, Rgb([255, 255, 255]));
            for (placement, img) in plan.placements.iter().zip(images) {
                imageops::replace(
                    &mut canvas,
                    &img.to_rgb8(),
                    placement.x as i64,
                    placement.y as i64,
                );
            }
            DynamicImage::ImageRgb8(canvas)
        }
        ColorMode::Grayscale => {
            let mut canvas = GrayImage::from_pixel(plan.width, plan.height, Luma([255]));
            for (placement, img) in plan.placements.iter().zip(images) {
                imageops::replace(
                    &mut canvas,
                    &img.to_luma8(),
                    placement.x as i64,
                    placement.y as i64,
                );
            }
            DynamicImage::ImageLuma8(canvas)
        }
    };

    Page {
        sources: plan.placements.iter().map(|p| p.source).collect(),
        image,
    }
}

/// Size of a `width` x `height` image after scaling by `factor`
pub fn scaled_size(width: u32, height: u32, factor: f32) -> (u32, u32) {
    if factor == 1.0 {
        return (width, height);
    }
    (
        (width as f32 * factor).round() as u32,
        (height as f32 * factor).round() as u32,
    )
}

/// Uniformly rescale an image; sizes round to whole pixels.
pub fn scale_image(image: DynamicImage, factor: f32) -> DynamicImage {
    if factor == 1.0 {
        return image;
    }
    let (width, height) = scaled_size(image.width(), image.height(), factor);
    if width == 0 || height == 0 {
        return DynamicImage::new_rgb8(width, height);
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PageSlots, plan_page};

    fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, 0, 0])))
    }

    #[test]
    fn test_spread_pixels() {
        let images = vec![solid(4, 4, 10), solid(2, 2, 200)];
        let plan = plan_page(
            PageSlots::Spread {
                left: Some(0),
                right: Some(1),
            },
            |i| (images[i].width(), images[i].height()),
        );
        let page = render_page(&plan, &[&images[0], &images[1]], ColorMode::Rgb);
        let rgb = page.image.to_rgb8();

        assert_eq!((page.width(), page.height()), (6, 4));
        assert_eq!(page.sources, vec![0, 1]);
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([10, 0, 0]));
        // right image centred: y = (4 - 2) / 2 = 1
        assert_eq!(rgb.get_pixel(4, 1), &Rgb([200, 0, 0]));
        assert_eq!(rgb.get_pixel(5, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(5, 3), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_lone_image_leaves_other_half_white() {
        let images = vec![solid(3, 2, 0)];
        let plan = plan_page(
            PageSlots::Spread {
                left: Some(0),
                right: None,
            },
            |_| (3, 2),
        );
        let page = render_page(&plan, &[&images[0]], ColorMode::Grayscale);
        let gray = page.image.to_luma8();
        assert_eq!((page.width(), page.height()), (6, 2));
        assert_eq!(gray.get_pixel(5, 1), &Luma([255]));
        assert_ne!(gray.get_pixel(0, 0), &Luma([255]));
    }

    #[test]
    fn test_zero_area_crop_gives_empty_page() {
        let empty = DynamicImage::new_rgb8(0, 5);
        let plan = plan_page(PageSlots::Single(0), |_| (0, 5));
        let page = render_page(&plan, &[&empty], ColorMode::Rgb);
        assert!(page.is_empty());
    }

    #[test]
    fn test_scale_image() {
        let scaled = scale_image(solid(10, 20, 0), 0.5);
        assert_eq!((scaled.width(), scaled.height()), (5, 10));
        let same = scale_image(solid(7, 3, 0), 1.0);
        assert_eq!((same.width(), same.height()), (7, 3));
        let gone = scale_image(solid(7, 3, 0), 0.0);
        assert_eq!((gone.width(), gone.height()), (0, 0));
    }
}
