use std::collections::VecDeque;
use tracing::{info, instrument};

use super::{Packer, sort_by_name};
use crate::error::{Result, SpritePackerError};
use crate::model::{Page, Rect};
use crate::settings::Settings;

/// Places every rect in a uniform cell sized to the largest rect, row-major in
/// input order. Useful for animation strips that expect fixed frame positions.
pub struct GridPacker {
    settings: Settings,
}

impl GridPacker {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    fn pack_page(
        &self,
        rects: &mut VecDeque<Rect>,
        cell_width: u32,
        cell_height: u32,
        max_width: u32,
        max_height: u32,
    ) -> Page {
        let mut page = Page::default();
        let (mut x, mut y) = (0u32, 0u32);
        while !rects.is_empty() {
            if x + cell_width > max_width {
                y += cell_height;
                if y + cell_height > max_height {
                    break;
                }
                x = 0;
            }
            let Some(mut rect) = rects.pop_front() else {
                break;
            };
            rect.x = x;
            rect.y = y;
            x += cell_width;
            page.width = page.width.max(x);
            page.height = page.height.max(y + cell_height);
            page.output_rects.push(rect);
        }

        // Rows were filled top-down; flip into the bottom-left page space.
        for rect in &mut page.output_rects {
            rect.y = page.height - rect.y - rect.height;
        }

        let used: u64 = page
            .output_rects
            .iter()
            .map(|r| r.width as u64 * r.height as u64)
            .sum();
        let area = page.width as u64 * page.height as u64;
        page.occupancy = if area == 0 {
            0.0
        } else {
            (used as f64 / area as f64) as f32
        };

        page.width = page.width.saturating_sub(self.settings.padding_x);
        page.height = page.height.saturating_sub(self.settings.padding_y);
        sort_by_name(&mut page.output_rects);
        page
    }
}

impl Packer for GridPacker {
    #[instrument(skip_all, fields(rects = rects.len()))]
    fn pack(&mut self, rects: Vec<Rect>) -> Result<Vec<Page>> {
        let s = &self.settings;
        let cell_width = rects.iter().map(|r| r.width).max().unwrap_or(0);
        let cell_height = rects.iter().map(|r| r.height).max().unwrap_or(0);
        if rects.is_empty() {
            return Ok(Vec::new());
        }

        // The trailing padding of the last column/row may hang off the page.
        let (reserve_x, reserve_y) = s.edge_reserve();
        let max_width = s.max_width - reserve_x + s.padding_x;
        let max_height = s.max_height - reserve_y + s.padding_y;
        if cell_width > max_width || cell_height > max_height {
            let widest = rects
                .iter()
                .find(|r| r.width == cell_width || r.height == cell_height);
            return Err(SpritePackerError::ImageTooLarge {
                name: widest.map(|r| r.name.clone()).unwrap_or_default(),
                width: cell_width.saturating_sub(s.padding_x),
                height: cell_height.saturating_sub(s.padding_y),
                limit: format!("grid page size {}x{}", s.max_width, s.max_height),
            });
        }

        let mut queue: VecDeque<Rect> = rects.into();
        let mut pages = Vec::new();
        while !queue.is_empty() {
            let page = self.pack_page(&mut queue, cell_width, cell_height, max_width, max_height);
            info!(
                page = pages.len(),
                width = page.width,
                height = page.height,
                rects = page.output_rects.len(),
                "packed grid page"
            );
            pages.push(page);
        }
        Ok(pages)
    }
}
