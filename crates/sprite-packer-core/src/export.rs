use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::model::{Alias, Page, Rect};

/// One named region of a page as written to an atlas descriptor.
///
/// Coordinates are in final image space with a top-left origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasRegion {
    pub name: String,
    pub rotate: bool,
    /// Top-left corner of the content inside the page image.
    pub xy: (u32, u32),
    /// Unrotated trimmed size.
    pub size: (u32, u32),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<[i32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad: Option<[i32; 4]>,
    pub orig: (u32, u32),
    /// Trim offset from the bottom-left of the original image.
    pub offset: (u32, u32),
    pub index: i32,
}

impl AtlasRegion {
    fn new(page: &Page, rect: &Rect, identity: &Alias) -> Self {
        let (_, placed_height) = rect.placed_region_size();
        let x = page.x + rect.x;
        let y = (page.y + page.height).saturating_sub(rect.y + placed_height);
        let offset_y = identity
            .original_height
            .saturating_sub(rect.region_height + identity.offset_y);
        Self {
            name: identity.name.clone(),
            rotate: rect.rotated,
            xy: (x, y),
            size: (rect.region_width, rect.region_height),
            split: identity.splits,
            pad: identity.pads,
            orig: (identity.original_width, identity.original_height),
            offset: (identity.offset_x, offset_y),
            index: identity.index,
        }
    }
}

/// Descriptor records for every rect on the page and each of its aliases.
/// Rects come in name order, each followed by its aliases in name order.
pub fn page_regions(page: &Page) -> Vec<AtlasRegion> {
    let mut rects: Vec<&Rect> = page.output_rects.iter().collect();
    rects.sort_by(|a, b| a.name.cmp(&b.name));

    let mut regions = Vec::new();
    for rect in rects {
        regions.push(AtlasRegion::new(page, rect, &Alias::from(rect)));
        for alias in &rect.aliases {
            regions.push(AtlasRegion::new(page, rect, alias));
        }
    }
    regions
}

fn pair(v: (u32, u32)) -> Value {
    json!([v.0, v.1])
}

/// Serializes finished pages and their regions as `{ pages: [...] }`.
pub fn to_json(pages: &[Page]) -> Value {
    let pages_val: Vec<Value> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let regions: Vec<Value> = page_regions(page)
                .into_iter()
                .map(|r| {
                    let mut region = json!({
                        "name": r.name,
                        "rotate": r.rotate,
                        "xy": pair(r.xy),
                        "size": pair(r.size),
                        "orig": pair(r.orig),
                        "offset": pair(r.offset),
                        "index": r.index,
                    });
                    if let Some(split) = r.split {
                        region["split"] = json!(split);
                    }
                    if let Some(pad) = r.pad {
                        region["pad"] = json!(pad);
                    }
                    region
                })
                .collect();
            json!({
                "page": i,
                "width": page.image_width,
                "height": page.image_height,
                "occupancy": page.occupancy,
                "regions": regions,
            })
        })
        .collect();
    json!({ "pages": pages_val })
}
