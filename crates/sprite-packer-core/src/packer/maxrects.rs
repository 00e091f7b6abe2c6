//! Maximal-rectangles bin packing with a smallest-page search.
//!
//! `MaxRects` packs a single bin of fixed size. `MaxRectsPacker` wraps it with a
//! binary search over page sizes (trying every heuristic at each size) and a
//! multi-page loop that carries whatever did not fit onto the next page.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument, trace};

use super::search::BinarySearch;
use super::{Packer, sort_by_name};
use crate::error::{Result, SpritePackerError};
use crate::model::{Bounds, Page, Rect};
use crate::settings::Settings;

/// MaxRects free-rectangle choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    /// Fit against the short side of the free rect that leaves the least slack.
    BestShortSideFit,
    /// Fit against the long side of the free rect that leaves the least slack.
    BestLongSideFit,
    /// Smallest free rect that holds the rect.
    BestAreaFit,
    /// Tetris placement: lowest top edge, then leftmost.
    BottomLeft,
    /// Maximize edge contact with the page border and placed rects.
    ContactPoint,
}

impl MaxRectsHeuristic {
    /// Every heuristic, in the order page-size attempts try them.
    pub const ALL: [Self; 5] = [
        Self::BestShortSideFit,
        Self::BestLongSideFit,
        Self::BestAreaFit,
        Self::BottomLeft,
        Self::ContactPoint,
    ];
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// A scored candidate position for one rect. Lower scores are better.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    /// Placed size including padding, post-rotation.
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
    pub score1: i64,
    pub score2: i64,
}

impl Placement {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    fn better_than(&self, other: &Placement) -> bool {
        (self.score1, self.score2) < (other.score1, other.score2)
    }
}

/// Outcome of packing one bin: which inputs were placed where, and which were not.
#[derive(Debug, Clone)]
pub struct BinLayout {
    /// Input index and placement, in placement order.
    pub placed: Vec<(usize, Placement)>,
    /// Input indices that did not fit, in input order.
    pub remaining: Vec<usize>,
    pub occupancy: f32,
    /// Extent of the placed boxes (padding included).
    pub width: u32,
    pub height: u32,
}

/// Maximal rectangles packing of a single bin.
///
/// Free space is tracked as a list of possibly overlapping maximal free
/// rectangles; placing a rect splits every free rectangle it intersects and the
/// list is then pruned of rectangles contained in others.
#[derive(Debug, Clone)]
pub struct MaxRects {
    bin_width: u32,
    bin_height: u32,
    padding_x: u32,
    padding_y: u32,
    rotation: bool,
    free: Vec<Bounds>,
    used: Vec<Bounds>,
    split_scratch: Vec<Bounds>,
}

impl MaxRects {
    pub fn new(width: u32, height: u32, padding_x: u32, padding_y: u32, rotation: bool) -> Self {
        let mut bin = Self {
            bin_width: 0,
            bin_height: 0,
            padding_x,
            padding_y,
            rotation,
            free: Vec::new(),
            used: Vec::new(),
            split_scratch: Vec::new(),
        };
        bin.reset(width, height);
        bin
    }

    /// Empties the bin and resizes it, keeping allocations.
    pub fn reset(&mut self, width: u32, height: u32) {
        self.bin_width = width;
        self.bin_height = height;
        self.used.clear();
        self.free.clear();
        self.free.push(Bounds::new(0, 0, width, height));
    }

    pub fn free_rects(&self) -> &[Bounds] {
        &self.free
    }

    pub fn used_rects(&self) -> &[Bounds] {
        &self.used
    }

    /// Places a single rect at its best position. Order is defined by the caller.
    pub fn insert(&mut self, rect: &Rect, heuristic: MaxRectsHeuristic) -> Option<Placement> {
        let placement = self.score_rect(rect, heuristic)?;
        self.place(&placement.bounds());
        Some(placement)
    }

    /// Repeatedly scores every pending rect and places only the best one, until
    /// nothing else fits. Slow but thorough.
    pub fn pack(&mut self, rects: &[Rect], heuristic: MaxRectsHeuristic) -> BinLayout {
        let mut pending: Vec<usize> = (0..rects.len()).collect();
        let mut placed = Vec::with_capacity(rects.len());
        loop {
            let mut best: Option<(usize, Placement)> = None;
            for (pos, &idx) in pending.iter().enumerate() {
                let Some(candidate) = self.score_rect(&rects[idx], heuristic) else {
                    continue;
                };
                if best.is_none_or(|(_, b)| candidate.better_than(&b)) {
                    best = Some((pos, candidate));
                }
            }
            let Some((pos, placement)) = best else {
                break;
            };
            self.place(&placement.bounds());
            placed.push((pending.remove(pos), placement));
        }
        self.layout(placed, pending)
    }

    /// Greedy single pass in input order. The first rect that does not fit and
    /// every rect after it are left for the next page.
    pub fn pack_in_order(&mut self, rects: &[Rect], heuristic: MaxRectsHeuristic) -> BinLayout {
        let mut placed = Vec::with_capacity(rects.len());
        let mut remaining = Vec::new();
        for (idx, rect) in rects.iter().enumerate() {
            match self.insert(rect, heuristic) {
                Some(placement) => placed.push((idx, placement)),
                None => {
                    remaining.extend(idx..rects.len());
                    break;
                }
            }
        }
        self.layout(placed, remaining)
    }

    fn layout(&self, placed: Vec<(usize, Placement)>, remaining: Vec<usize>) -> BinLayout {
        let width = self.used.iter().map(Bounds::right).max().unwrap_or(0);
        let height = self.used.iter().map(Bounds::top).max().unwrap_or(0);
        BinLayout {
            placed,
            remaining,
            occupancy: self.occupancy(),
            width,
            height,
        }
    }

    /// Ratio of used surface area.
    pub fn occupancy(&self) -> f32 {
        let bin_area = self.bin_width as u64 * self.bin_height as u64;
        if bin_area == 0 {
            return 0.0;
        }
        let used: u64 = self.used.iter().map(|u| u.w as u64 * u.h as u64).sum();
        (used as f64 / bin_area as f64) as f32
    }

    /// Best position for `rect` over all free rects and allowed orientations.
    fn score_rect(&self, rect: &Rect, heuristic: MaxRectsHeuristic) -> Option<Placement> {
        let (width, height) = (rect.width, rect.height);
        // Padding stays on the right/top when the content turns.
        let rotated_width = (height + self.padding_x).saturating_sub(self.padding_y);
        let rotated_height = (width + self.padding_y).saturating_sub(self.padding_x);
        let rotate = rect.can_rotate && self.rotation;

        let mut best: Option<Placement> = None;
        for free in &self.free {
            if free.w >= width && free.h >= height {
                let candidate = self.candidate(free, width, height, false, heuristic);
                if best.is_none_or(|b| candidate.better_than(&b)) {
                    best = Some(candidate);
                }
            }
            if rotate && free.w >= rotated_width && free.h >= rotated_height {
                let candidate = self.candidate(free, rotated_width, rotated_height, true, heuristic);
                if best.is_none_or(|b| candidate.better_than(&b)) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn candidate(
        &self,
        free: &Bounds,
        w: u32,
        h: u32,
        rotated: bool,
        heuristic: MaxRectsHeuristic,
    ) -> Placement {
        let leftover_h = (free.w - w) as i64;
        let leftover_v = (free.h - h) as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let (score1, score2) = match heuristic {
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BestLongSideFit => (long_fit, short_fit),
            MaxRectsHeuristic::BestAreaFit => {
                let area_fit = free.w as i64 * free.h as i64 - w as i64 * h as i64;
                (area_fit, short_fit)
            }
            MaxRectsHeuristic::BottomLeft => ((free.y + h) as i64, free.x as i64),
            MaxRectsHeuristic::ContactPoint => {
                // negated: contact is maximized, scores are minimized
                (-(self.contact_point_score(free.x, free.y, w, h) as i64), 0)
            }
        };
        Placement {
            x: free.x,
            y: free.y,
            width: w,
            height: h,
            rotated,
            score1,
            score2,
        }
    }

    fn contact_point_score(&self, x: u32, y: u32, w: u32, h: u32) -> u32 {
        let mut score = 0;
        if x == 0 || x + w == self.bin_width {
            score += h;
        }
        if y == 0 || y + h == self.bin_height {
            score += w;
        }
        for u in &self.used {
            if u.x == x + w || u.right() == x {
                score += common_interval_length(u.y, u.top(), y, y + h);
            }
            if u.y == y + h || u.top() == y {
                score += common_interval_length(u.x, u.right(), x, x + w);
            }
        }
        score
    }

    fn place(&mut self, node: &Bounds) {
        let mut split = std::mem::take(&mut self.split_scratch);
        split.clear();
        self.free.retain(|free| {
            if !free.intersects(node) {
                return true;
            }
            split_free_node(free, node, &mut split);
            false
        });
        self.free.append(&mut split);
        self.split_scratch = split;

        self.prune_free_list();
        self.used.push(*node);
    }

    /// Drops every free rect contained in another one.
    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Residual free rects of `free` around the intersecting `used` box, each
/// spanning the full extent of `free` along the other axis.
fn split_free_node(free: &Bounds, used: &Bounds, out: &mut Vec<Bounds>) {
    // below
    if used.y > free.y && used.y < free.top() {
        out.push(Bounds::new(free.x, free.y, free.w, used.y - free.y));
    }
    // above
    if used.top() < free.top() {
        out.push(Bounds::new(free.x, used.top(), free.w, free.top() - used.top()));
    }
    // left
    if used.x > free.x && used.x < free.right() {
        out.push(Bounds::new(free.x, free.y, used.x - free.x, free.h));
    }
    // right
    if used.right() < free.right() {
        out.push(Bounds::new(used.right(), free.y, free.right() - used.right(), free.h));
    }
}

/// Length of the overlap of two intervals, 0 when disjoint.
fn common_interval_length(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> u32 {
    a_end.min(b_end).saturating_sub(a_start.max(b_start))
}

/// Packs pages with MaxRects, searching for the smallest page that holds every
/// remaining rect and falling back to a full max-size page plus a follow-up page.
pub struct MaxRectsPacker {
    settings: Settings,
    bin: MaxRects,
}

impl MaxRectsPacker {
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let bin = MaxRects::new(
            0,
            0,
            settings.padding_x,
            settings.padding_y,
            settings.rotation,
        );
        Ok(Self { settings, bin })
    }

    #[instrument(skip_all, fields(rects = rects.len()))]
    fn pack_page(&mut self, rects: Vec<Rect>) -> Result<Page> {
        let s = &self.settings;
        let (padding_x, padding_y) = (s.padding_x, s.padding_y);
        let (reserve_x, reserve_y) = s.edge_reserve();
        // Square pages are bounded by the smaller maximum on both axes.
        let limit = if s.square {
            let side = s.max_width.min(s.max_height);
            (side, side)
        } else {
            (s.max_width, s.max_height)
        };

        let mut min_width = u32::MAX;
        let mut min_height = u32::MAX;
        for rect in &rects {
            let width = rect.width.saturating_sub(padding_x);
            let height = rect.height.saturating_sub(padding_y);
            min_width = min_width.min(width);
            min_height = min_height.min(height);
            check_fits(s, rect, width, height, limit)?;
        }
        min_width = min_width.max(s.min_width);
        min_height = min_height.max(s.min_height);

        // Candidate sizes exclude the trailing padding of the last rect and any
        // edge padding; the bin is adjusted so both are accounted for.
        let adjust_x = padding_x as i64 - reserve_x as i64;
        let adjust_y = padding_y as i64 - reserve_y as i64;
        let fuzziness = if s.fast { 25 } else { 15 };

        let mut page = if s.square {
            let min_size = min_width.max(min_height);
            let max_size = limit.0;
            let mut size_search =
                BinarySearch::new(min_size, max_size, fuzziness, s.pot, s.multiple_of_four);
            let mut best: Option<BinLayout> = None;
            let mut size = Some(size_search.reset());
            while let Some(candidate) = size {
                let side = candidate.min(max_size);
                let result = self.pack_at_size(
                    true,
                    adjusted(side, adjust_x),
                    adjusted(side, adjust_y),
                    &rects,
                );
                debug!(size = side, fits = result.is_some(), "square attempt");
                let failed = result.is_none();
                best = better(best, result);
                size = size_search.next(failed);
            }
            let layout = match best {
                Some(layout) => layout,
                // Rects don't fit on one page; fill a whole page.
                None => self
                    .pack_at_size(
                        false,
                        adjusted(max_size, adjust_x),
                        adjusted(max_size, adjust_y),
                        &rects,
                    )
                    .ok_or(SpritePackerError::OutOfSpace)?,
            };
            let mut page = build_page(rects, layout);
            let side = page.width.max(page.height);
            page.width = side.saturating_sub(padding_x);
            page.height = side.saturating_sub(padding_y);
            page
        } else {
            let (max_w, max_h) = (self.settings.max_width, self.settings.max_height);
            let mut width_search = BinarySearch::new(
                min_width,
                max_w,
                fuzziness,
                self.settings.pot,
                self.settings.multiple_of_four,
            );
            let mut height_search = BinarySearch::new(
                min_height,
                max_h,
                fuzziness,
                self.settings.pot,
                self.settings.multiple_of_four,
            );
            let mut best: Option<BinLayout> = None;
            let mut width = Some(width_search.reset());
            let mut height = height_search.reset().min(max_h);
            loop {
                let mut best_for_height: Option<BinLayout> = None;
                while let Some(candidate) = width {
                    let w = candidate.min(max_w);
                    let result = self.pack_at_size(
                        true,
                        adjusted(w, adjust_x),
                        adjusted(height, adjust_y),
                        &rects,
                    );
                    debug!(width = w, height, fits = result.is_some(), "size attempt");
                    let failed = result.is_none();
                    best_for_height = better(best_for_height, result);
                    width = width_search.next(failed);
                }
                let failed = best_for_height.is_none();
                best = better(best, best_for_height);
                match height_search.next(failed) {
                    Some(h) => height = h.min(max_h),
                    None => break,
                }
                width = Some(width_search.reset());
            }
            let layout = match best {
                Some(layout) => layout,
                None => self
                    .pack_at_size(
                        false,
                        adjusted(max_w, adjust_x),
                        adjusted(max_h, adjust_y),
                        &rects,
                    )
                    .ok_or(SpritePackerError::OutOfSpace)?,
            };
            let mut page = build_page(rects, layout);
            page.width = page.width.saturating_sub(padding_x);
            page.height = page.height.saturating_sub(padding_y);
            page
        };
        sort_by_name(&mut page.output_rects);
        Ok(page)
    }

    /// Tries every heuristic at one bin size and keeps the best occupancy.
    /// With `fully`, only results that place every rect are considered.
    fn pack_at_size(
        &mut self,
        fully: bool,
        width: u32,
        height: u32,
        rects: &[Rect],
    ) -> Option<BinLayout> {
        let mut best = None;
        for heuristic in MaxRectsHeuristic::ALL {
            self.bin.reset(width, height);
            let result = if self.settings.fast {
                self.bin.pack_in_order(rects, heuristic)
            } else {
                self.bin.pack(rects, heuristic)
            };
            trace!(
                ?heuristic,
                width,
                height,
                placed = result.placed.len(),
                occupancy = result.occupancy,
                "heuristic result"
            );
            if fully && !result.remaining.is_empty() {
                continue;
            }
            if result.placed.is_empty() {
                continue;
            }
            best = better(best, Some(result));
        }
        best
    }
}

impl Packer for MaxRectsPacker {
    #[instrument(skip_all, fields(rects = rects.len()))]
    fn pack(&mut self, mut rects: Vec<Rect>) -> Result<Vec<Page>> {
        if self.settings.fast {
            if self.settings.rotation {
                // longest side first when rects may turn
                rects.sort_by(|a, b| b.width.max(b.height).cmp(&a.width.max(a.height)));
            } else {
                rects.sort_by(|a, b| b.width.cmp(&a.width));
            }
        }

        let mut pages = Vec::new();
        while !rects.is_empty() {
            let mut page = self.pack_page(rects)?;
            rects = std::mem::take(&mut page.remaining_rects);
            info!(
                page = pages.len(),
                width = page.width,
                height = page.height,
                rects = page.output_rects.len(),
                occupancy = page.occupancy,
                "packed page"
            );
            pages.push(page);
        }
        Ok(pages)
    }
}

fn check_fits(
    s: &Settings,
    rect: &Rect,
    width: u32,
    height: u32,
    (page_width, page_height): (u32, u32),
) -> Result<()> {
    let (reserve_x, reserve_y) = s.edge_reserve();
    let max_width = page_width.saturating_sub(reserve_x);
    let max_height = page_height.saturating_sub(reserve_y);
    let too_large = |limit: String| SpritePackerError::ImageTooLarge {
        name: rect.name.clone(),
        width,
        height,
        limit,
    };
    let edge = |axis: &str, padding: u32| {
        if s.edge_padding && padding > 0 {
            format!(" and {axis}edge padding {padding}*2")
        } else {
            String::new()
        }
    };
    if s.rotation && rect.can_rotate {
        if (width > max_width || height > max_height) && (width > max_height || height > max_width)
        {
            let padding = if s.edge_padding && (s.padding_x > 0 || s.padding_y > 0) {
                format!(" and edge padding {}*2,{}*2", s.padding_x, s.padding_y)
            } else {
                String::new()
            };
            return Err(too_large(format!(
                "max page size {}x{}{}",
                page_width, page_height, padding
            )));
        }
    } else {
        if width > max_width {
            return Err(too_large(format!(
                "max page width {}{}",
                page_width,
                edge("X ", s.padding_x)
            )));
        }
        if height > max_height {
            return Err(too_large(format!(
                "max page height {}{}",
                page_height,
                edge("Y ", s.padding_y)
            )));
        }
    }
    Ok(())
}

fn adjusted(size: u32, adjust: i64) -> u32 {
    (size as i64 + adjust).clamp(0, u32::MAX as i64) as u32
}

/// Keeps the higher occupancy; ties go to the later result.
fn better(a: Option<BinLayout>, b: Option<BinLayout>) -> Option<BinLayout> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => {
            if a.occupancy > b.occupancy {
                Some(a)
            } else {
                Some(b)
            }
        }
    }
}

/// Moves the placed rects onto a page, assigning their positions.
fn build_page(rects: Vec<Rect>, layout: BinLayout) -> Page {
    let mut slots: Vec<Option<Rect>> = rects.into_iter().map(Some).collect();
    let mut output_rects = Vec::with_capacity(layout.placed.len());
    for (idx, placement) in &layout.placed {
        if let Some(mut rect) = slots[*idx].take() {
            rect.x = placement.x;
            rect.y = placement.y;
            rect.width = placement.width;
            rect.height = placement.height;
            rect.rotated = placement.rotated;
            output_rects.push(rect);
        }
    }
    let remaining_rects = layout
        .remaining
        .iter()
        .filter_map(|&idx| slots[idx].take())
        .collect();
    Page {
        output_rects,
        remaining_rects,
        occupancy: layout.occupancy,
        width: layout.width,
        height: layout.height,
        ..Default::default()
    }
}
