use chrono::{Duration, Local};
use image::{DynamicImage, Rgb, RgbImage};
use pdf_stitch::layout::{PageSlots, assign_slots, plan_pages};
use pdf_stitch::*;

fn solid(width: u32, height: u32, value: u8) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([value, value, value])))
}

fn ltr() -> PageLayoutConfig {
    PageLayoutConfig::new(LayoutMode::DoublePageLeftToRight, false)
}

#[test]
fn test_margin_order_does_not_matter() {
    let expected = CropRect {
        left: 10,
        top: 20,
        right: 50,
        bottom: 80,
    };
    assert_eq!(normalize(50, 10, 80, 20, 100, 100), expected);
    assert_eq!(normalize(10, 50, 20, 80, 100, 100), expected);
}

#[test]
fn test_margins_clamp_to_image() {
    let crop = normalize(-5, 150, 0, 0, 100, 60);
    assert_eq!((crop.left, crop.right), (0, 100));
}

#[test]
fn test_sort_by_name_is_idempotent() {
    let now = Local::now();
    let records: Vec<ImageRecord> = ["b.png", "a.png", "c.png"]
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let t = now + Duration::seconds(i as i64);
            ImageRecord::new(*name, *name, 10, 10, t, t).unwrap()
        })
        .collect();

    let once = sorted(&records, SortKey::Name);
    let names: Vec<&str> = once.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    assert_eq!(sorted(&once, SortKey::Name), once);
}

#[test]
fn test_single_image_page() {
    let pages = compose_pages(&[solid(200, 300, 42)], PageLayoutConfig::default(), ColorMode::Rgb);
    assert_eq!(pages.len(), 1);
    assert_eq!((pages[0].width(), pages[0].height()), (200, 300));
    assert_eq!(pages[0].image.to_rgb8().get_pixel(199, 299), &Rgb([42, 42, 42]));
}

#[test]
fn test_even_pairs_left_to_right() {
    let sizes = [(100, 100), (120, 100), (100, 100), (80, 100)];
    let plans = plan_pages(&sizes, &assign_slots(4, ltr()));

    assert_eq!(plans.len(), 2);
    assert_eq!((plans[0].width, plans[0].height), (220, 100));
    assert_eq!((plans[0].placements[0].x, plans[0].placements[0].y), (0, 0));
    assert_eq!(plans[0].placements[1].x, 100);
    assert_eq!((plans[1].width, plans[1].height), (180, 100));
    assert_eq!(plans[1].placements[1].x, 100);
}

#[test]
fn test_odd_trailing_image() {
    let sizes = [(100, 100), (100, 100), (90, 100)];
    let plans = plan_pages(&sizes, &assign_slots(3, ltr()));

    assert_eq!(plans.len(), 2);
    assert_eq!((plans[1].width, plans[1].height), (180, 100));
    assert_eq!(plans[1].placements.len(), 1);
    assert_eq!(plans[1].placements[0].x, 0);

    let crops: Vec<DynamicImage> = sizes.iter().map(|&(w, h)| solid(w, h, 0)).collect();
    let pages = compose_pages(&crops, ltr(), ColorMode::Rgb);
    assert_eq!(pages[1].image.to_rgb8().get_pixel(179, 50), &Rgb([255, 255, 255]));
}

#[test]
fn test_separate_cover_keeps_its_size() {
    let layout = PageLayoutConfig::new(LayoutMode::DoublePageLeftToRight, true);
    let sizes = [(70, 90), (100, 100), (100, 100), (100, 100), (100, 100)];
    let slots = assign_slots(5, layout);
    let plans = plan_pages(&sizes, &slots);

    assert_eq!(plans.len(), 3);
    assert_eq!(slots[0], PageSlots::Single(0));
    assert_eq!((plans[0].width, plans[0].height), (70, 90));
}

#[test]
fn test_direction_changes_placement_not_pairing() {
    let crops = [solid(10, 10, 0), solid(10, 10, 200)];
    let rtl = PageLayoutConfig::new(LayoutMode::DoublePageRightToLeft, false);

    let left_first = compose_pages(&crops, ltr(), ColorMode::Rgb);
    let right_first = compose_pages(&crops, rtl, ColorMode::Rgb);

    let pairs = |layout| -> Vec<Vec<usize>> {
        assign_slots(2, layout).iter().map(|s| s.sources()).collect()
    };
    assert_eq!(pairs(ltr()), pairs(rtl));
    assert_ne!(left_first[0].image, right_first[0].image);
    assert_eq!(right_first[0].image.to_rgb8().get_pixel(0, 0), &Rgb([200, 200, 200]));
}

#[test]
fn test_rtl_lone_trailer_sits_right() {
    let rtl = PageLayoutConfig::new(LayoutMode::DoublePageRightToLeft, false);
    let slots = assign_slots(3, rtl);
    assert_eq!(
        slots[1],
        PageSlots::Spread {
            left: None,
            right: Some(2)
        }
    );
}

#[test]
fn test_statistics() {
    let stats = calculate_statistics(5, ltr());
    assert_eq!(stats.output_pages, 3);
    assert_eq!(stats.spreads, 2);
    assert_eq!(stats.blank_slots, 1);
}
