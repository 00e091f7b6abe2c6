use rand::{Rng, SeedableRng};
use sprite_packer_core::prelude::*;

fn random_rects(seed: u64, count: usize) -> Vec<Rect> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| Rect::new(format!("r{i:03}"), rng.gen_range(4..=64), rng.gen_range(4..=64)).pad(2, 2))
        .collect()
}

fn layout(pages: &[Page]) -> Vec<Vec<(String, u32, u32, bool)>> {
    pages
        .iter()
        .map(|p| {
            p.output_rects
                .iter()
                .map(|r| (r.name.clone(), r.x, r.y, r.rotated))
                .collect()
        })
        .collect()
}

#[test]
fn maxrects_repeatable() {
    let settings = Settings::builder()
        .pot(false)
        .rotation(true)
        .with_max_dimensions(256, 256)
        .build();
    let first = pack_rects(random_rects(42, 60), &settings).unwrap();
    let second = pack_rects(random_rects(42, 60), &settings).unwrap();
    assert_eq!(layout(&first), layout(&second));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!((a.width, a.height), (b.width, b.height));
        assert_eq!((a.image_width, a.image_height), (b.image_width, b.image_height));
    }
}

#[test]
fn output_rects_sorted_by_name() {
    let settings = Settings::builder().pot(false).with_max_dimensions(256, 256).build();
    let pages = pack_rects(random_rects(3, 30), &settings).unwrap();
    for page in &pages {
        let names: Vec<&str> = page.output_rects.iter().map(|r| r.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
