use image::{DynamicImage, Rgba, RgbaImage};
use sprite_packer_core::prelude::*;

fn solid(w: u32, h: u32, rgba: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(rgba)))
}

#[test]
fn identical_pixels_become_alias() {
    let mut processor = ImageProcessor::new(Settings::default());
    assert!(processor.add_image(&solid(8, 8, [255, 0, 0, 255]), "run_1").unwrap().is_some());
    assert!(processor.add_image(&solid(8, 8, [255, 0, 0, 255]), "run_2").unwrap().is_none());
    assert!(processor.add_image(&solid(8, 8, [0, 255, 0, 255]), "other").unwrap().is_some());

    let rects = processor.rects();
    assert_eq!(rects.len(), 2);
    let run = &rects[0];
    assert_eq!((run.name.as_str(), run.index), ("run", 1));
    assert_eq!(run.aliases.len(), 1);
    let alias = run.aliases.iter().next().unwrap();
    assert_eq!((alias.name.as_str(), alias.index), ("run", 2));
}

#[test]
fn same_pixels_different_shape_are_distinct() {
    let mut processor = ImageProcessor::new(Settings::default());
    processor.add_image(&solid(4, 8, [9, 9, 9, 255]), "a").unwrap();
    processor.add_image(&solid(8, 4, [9, 9, 9, 255]), "b").unwrap();
    assert_eq!(processor.rects().len(), 2);
}

#[test]
fn alias_disabled_keeps_duplicates() {
    let mut processor = ImageProcessor::new(Settings::builder().alias(false).build());
    processor.add_image(&solid(8, 8, [1, 2, 3, 255]), "a").unwrap();
    processor.add_image(&solid(8, 8, [1, 2, 3, 255]), "b").unwrap();
    assert_eq!(processor.rects().len(), 2);
    assert!(processor.rects().iter().all(|r| r.aliases.is_empty()));
}

#[test]
fn clear_forgets_hashes() {
    let mut processor = ImageProcessor::new(Settings::default());
    processor.add_image(&solid(8, 8, [1, 2, 3, 255]), "a").unwrap();
    processor.clear();
    assert!(processor.add_image(&solid(8, 8, [1, 2, 3, 255]), "b").unwrap().is_some());
}

#[test]
fn animation_frames_repeat_as_aliases() {
    let red = solid(6, 6, [255, 0, 0, 255]);
    let blue = solid(6, 6, [0, 0, 255, 255]);
    let frames = vec![(red.clone(), 0.1), (blue, 0.2), (red, 0.1)];

    let mut processor = ImageProcessor::new(Settings::builder().use_indexes(false).build());
    let delay = processor.add_frames_with_delays("anim", &frames).unwrap();
    assert!((delay - 0.1).abs() < 0.01);

    let rects = processor.rects();
    assert_eq!(rects.len(), 2);
    assert_eq!((rects[0].name.as_str(), rects[0].index), ("anim", 0));
    assert_eq!((rects[1].name.as_str(), rects[1].index), ("anim", 1));

    let red_aliases: Vec<i32> = rects[0].aliases.iter().map(|a| a.index).collect();
    assert_eq!(red_aliases, vec![3]);
    let blue_aliases: Vec<i32> = rects[1].aliases.iter().map(|a| a.index).collect();
    assert_eq!(blue_aliases, vec![2]);
}

#[test]
fn animation_settings_are_restored() {
    let blank = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
    let settings = Settings::builder().strip_whitespace(true, true).build();
    let mut processor = ImageProcessor::new(settings);

    processor
        .add_frames_with_delays("fade", &[(blank.clone(), 0.5)])
        .unwrap();
    // blank frames are kept inside animations
    assert_eq!(processor.rects().len(), 1);
    assert_eq!(processor.rects()[0].index, 0);

    // outside, blank images are ignored again
    assert!(processor.add_image(&blank, "gap").unwrap().is_none());
    assert_eq!(processor.rects().len(), 1);
}

#[test]
fn aliases_expand_into_regions() {
    let settings = Settings::builder().pot(false).padding(0, 0).build();
    let mut processor = ImageProcessor::new(settings.clone());
    processor.add_image(&solid(8, 8, [5, 5, 5, 255]), "b").unwrap();
    processor.add_image(&solid(8, 8, [5, 5, 5, 255]), "a").unwrap();
    let pages = pack_rects(processor.into_rects(), &settings).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].output_rects.len(), 1);

    let regions = page_regions(&pages[0]);
    let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"]);
    assert_eq!(regions[0].xy, regions[1].xy);
    assert_eq!(regions[0].size, regions[1].size);
}
