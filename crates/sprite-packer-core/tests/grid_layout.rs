use sprite_packer_core::prelude::*;

fn grid_settings() -> Settings {
    Settings::builder()
        .pot(false)
        .padding(0, 0)
        .with_min_dimensions(1, 1)
        .with_max_dimensions(40, 40)
        .grid(true)
        .build()
}

#[test]
fn cells_wrap_into_rows() {
    let rects = vec![
        Rect::new("r0", 10, 10),
        Rect::new("r1", 20, 5),
        Rect::new("r2", 5, 20),
    ];
    let mut packer = packer_for(&grid_settings()).unwrap();
    let pages = packer.pack(rects).unwrap();
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.width, 40);
    assert_eq!(page.height, 40);

    let pos: Vec<(&str, u32, u32)> = page
        .output_rects
        .iter()
        .map(|r| (r.name.as_str(), r.x, r.y))
        .collect();
    // first row is the visual top
    assert_eq!(pos, vec![("r0", 0, 30), ("r1", 20, 35), ("r2", 0, 0)]);
}

#[test]
fn grid_keeps_input_order_across_pages() {
    let rects: Vec<Rect> = (0..9).map(|i| Rect::new(format!("f{i}"), 12, 12)).collect();
    let mut packer = GridPacker::new(grid_settings()).unwrap();
    let pages = packer.pack(rects).unwrap();
    // 3x3 cells of 12 fit in 40x40
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].output_rects.len(), 9);
    let f0 = &pages[0].output_rects[0];
    assert_eq!((f0.x, f0.y), (0, 24));
}

#[test]
fn grid_pages_are_rounded() {
    let settings = Settings::builder()
        .padding(2, 2)
        .with_max_dimensions(64, 64)
        .grid(true)
        .build();
    let rects = vec![Rect::new("a", 10, 10).pad(2, 2)];
    let pages = pack_rects(rects, &settings).unwrap();
    assert_eq!(pages[0].width, 10);
    assert_eq!((pages[0].x, pages[0].y), (2, 2));
    assert_eq!((pages[0].image_width, pages[0].image_height), (16, 16));
}
