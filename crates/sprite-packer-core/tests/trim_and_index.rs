use image::{DynamicImage, Rgba, RgbaImage};
use sprite_packer_core::prelude::*;

/// 10x10 with an opaque block covering columns 2..=5 and rows 3..=8.
fn sprite() -> DynamicImage {
    let mut img = RgbaImage::new(10, 10);
    for y in 3..=8 {
        for x in 2..=5 {
            img.put_pixel(x, y, Rgba([0, 128, 255, 255]));
        }
    }
    DynamicImage::ImageRgba8(img)
}

fn settings(x: bool, y: bool) -> Settings {
    Settings::builder().padding(0, 0).strip_whitespace(x, y).build()
}

#[test]
fn strips_both_axes() {
    let mut processor = ImageProcessor::new(settings(true, true));
    let rect = processor.add_image(&sprite(), "hero").unwrap().expect("rect");
    assert_eq!((rect.offset_x, rect.offset_y), (2, 3));
    assert_eq!((rect.region_width, rect.region_height), (4, 6));
    assert_eq!((rect.original_width, rect.original_height), (10, 10));
    let image = rect.image.as_ref().expect("pixels kept");
    assert_eq!(image.dimensions(), (4, 6));
    assert_eq!(image.get_pixel(0, 0)[3], 255);
}

#[test]
fn x_trims_columns_only() {
    let mut processor = ImageProcessor::new(settings(true, false));
    let rect = processor.add_image(&sprite(), "hero").unwrap().expect("rect");
    assert_eq!((rect.offset_x, rect.offset_y), (2, 0));
    assert_eq!((rect.region_width, rect.region_height), (4, 10));

    let mut processor = ImageProcessor::new(settings(false, true));
    let rect = processor.add_image(&sprite(), "hero").unwrap().expect("rect");
    assert_eq!((rect.offset_x, rect.offset_y), (0, 3));
    assert_eq!((rect.region_width, rect.region_height), (10, 6));
}

#[test]
fn alpha_threshold_counts_faint_pixels_as_whitespace() {
    let mut img = sprite().to_rgba8();
    img.put_pixel(9, 9, Rgba([255, 255, 255, 10]));
    let settings = Settings::builder()
        .padding(0, 0)
        .strip_whitespace(true, true)
        .alpha_threshold(10)
        .build();
    let mut processor = ImageProcessor::new(settings);
    let rect = processor
        .add_image(&DynamicImage::ImageRgba8(img), "hero")
        .unwrap()
        .expect("rect");
    assert_eq!((rect.region_width, rect.region_height), (4, 6));
}

#[test]
fn duplicate_padding_keeps_a_border_pixel() {
    let settings = Settings::builder()
        .padding(2, 2)
        .duplicate_padding(true)
        .strip_whitespace(true, true)
        .build();
    let mut processor = ImageProcessor::new(settings);
    let rect = processor.add_image(&sprite(), "hero").unwrap().expect("rect");
    assert_eq!((rect.offset_x, rect.offset_y), (1, 2));
    assert_eq!((rect.region_width, rect.region_height), (6, 8));
    assert_eq!((rect.width, rect.height), (8, 10));
}

#[test]
fn blank_images() {
    let blank = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));

    let mut processor = ImageProcessor::new(settings(true, true));
    assert!(processor.add_image(&blank, "empty").unwrap().is_none());
    assert!(processor.rects().is_empty());

    let settings = Settings::builder()
        .padding(0, 0)
        .strip_whitespace(true, true)
        .ignore_blank_images(false)
        .build();
    let mut processor = ImageProcessor::new(settings);
    let rect = processor.add_image(&blank, "empty").unwrap().expect("placeholder");
    assert_eq!((rect.region_width, rect.region_height), (1, 1));
    assert_eq!((rect.original_width, rect.original_height), (1, 1));
    assert_eq!(rect.name, "empty");
}

#[test]
fn numeric_suffix_becomes_index() {
    let mut processor = ImageProcessor::new(Settings::builder().alias(false).build());
    let rect = processor.add_image(&sprite(), "walk_3").unwrap().expect("rect");
    assert_eq!((rect.name.as_str(), rect.index), ("walk", 3));
    let rect = processor.add_image(&sprite(), "idle").unwrap().expect("rect");
    assert_eq!((rect.name.as_str(), rect.index), ("idle", -1));

    let mut processor =
        ImageProcessor::new(Settings::builder().alias(false).use_indexes(false).build());
    let rect = processor.add_image(&sprite(), "walk_3").unwrap().expect("rect");
    assert_eq!((rect.name.as_str(), rect.index), ("walk_3", -1));
}

#[test]
fn non_rgba_input_is_converted() {
    let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(5, 7));
    let mut processor = ImageProcessor::new(Settings::builder().padding(1, 1).build());
    let rect = processor.add_image(&rgb, "opaque").unwrap().expect("rect");
    assert_eq!((rect.width, rect.height), (6, 8));
    assert!(rect.can_rotate);
}
