//! Squarified market treemap
//!
//! Greedy and local: a row keeps growing while its worst aspect ratio
//! strictly improves, then it is committed along the shorter side of the
//! remaining free rectangle. Not globally optimal.

use super::models::{LayoutRect, MarketItem};
use std::cmp::Ordering;

/// Target rectangle for a layout pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreemapLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy)]
struct FreeRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl FreeRect {
    fn shorter_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Worst aspect ratio of a row laid along a side of length `side`
fn worst_ratio(row: &[f64], side: f64) -> f64 {
    let total: f64 = row.iter().sum();
    if side <= 0.0 || total <= 0.0 {
        return f64::INFINITY;
    }
    let thickness = total / side;

    row.iter()
        .map(|&area| {
            let length = area / thickness;
            if length <= 0.0 {
                f64::INFINITY
            } else {
                (thickness / length).max(length / thickness)
            }
        })
        .fold(0.0, f64::max)
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

impl TreemapLayout {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Lay out `items`, one rectangle per item, largest first
    ///
    /// Empty when there are no items, the weights sum to zero, or the target
    /// rectangle has no area. Zero-weight items get zero-area rectangles at
    /// the bottom-right corner. Negative or non-finite weights count as zero.
    pub fn layout(&self, items: &[MarketItem]) -> Vec<LayoutRect> {
        let box_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        let total: f64 = items.iter().map(|item| sanitize(item.weight)).sum();
        if !box_ok || total <= 0.0 || !total.is_finite() {
            return Vec::new();
        }

        let mut ordered: Vec<&MarketItem> = items.iter().collect();
        // Stable: equal weights keep input order
        ordered.sort_by(|a, b| {
            sanitize(b.weight)
                .partial_cmp(&sanitize(a.weight))
                .unwrap_or(Ordering::Equal)
        });

        let split = ordered.partition_point(|item| sanitize(item.weight) > 0.0);
        let (weighted, zero) = ordered.split_at(split);

        let scale = self.area() / total;
        let areas: Vec<f64> = weighted.iter().map(|item| sanitize(item.weight) * scale).collect();

        let mut out = Vec::with_capacity(items.len());
        let mut free = FreeRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        };

        let mut start = 0;
        while start < areas.len() {
            let side = free.shorter_side();
            let mut end = start + 1;
            let mut worst = worst_ratio(&areas[start..end], side);
            while end < areas.len() {
                let candidate = worst_ratio(&areas[start..=end], side);
                if candidate < worst {
                    worst = candidate;
                    end += 1;
                } else {
                    break;
                }
            }

            let is_last = end == areas.len();
            Self::place_row(&weighted[start..end], &areas[start..end], &mut free, is_last, &mut out);
            start = end;
        }

        let corner_x = self.x + self.width;
        let corner_y = self.y + self.height;
        out.extend(zero.iter().map(|item| LayoutRect {
            item: (*item).clone(),
            x: corner_x,
            y: corner_y,
            width: 0.0,
            height: 0.0,
        }));

        out
    }

    /// Commit one row and shrink the free rectangle by its thickness
    ///
    /// The last row takes all remaining space and the last item of every row
    /// takes the rest of the row, so rounding never leaves gaps.
    fn place_row(
        items: &[&MarketItem],
        areas: &[f64],
        free: &mut FreeRect,
        is_last: bool,
        out: &mut Vec<LayoutRect>,
    ) {
        let row_area: f64 = areas.iter().sum();

        if free.width >= free.height {
            // Column at the left, items stacked top to bottom
            let thickness = if is_last { free.width } else { row_area / free.height };
            let bottom = free.y + free.height;
            let mut cursor = free.y;
            for (i, (item, area)) in items.iter().zip(areas).enumerate() {
                let height = if i + 1 == items.len() {
                    (bottom - cursor).max(0.0)
                } else {
                    area / thickness
                };
                out.push(LayoutRect {
                    item: (*item).clone(),
                    x: free.x,
                    y: cursor,
                    width: thickness,
                    height,
                });
                cursor += height;
            }
            free.x += thickness;
            free.width = (free.width - thickness).max(0.0);
        } else {
            // Row at the top, items left to right
            let thickness = if is_last { free.height } else { row_area / free.width };
            let right = free.x + free.width;
            let mut cursor = free.x;
            for (i, (item, area)) in items.iter().zip(areas).enumerate() {
                let width = if i + 1 == items.len() {
                    (right - cursor).max(0.0)
                } else {
                    area / thickness
                };
                out.push(LayoutRect {
                    item: (*item).clone(),
                    x: cursor,
                    y: free.y,
                    width,
                    height: thickness,
                });
                cursor += width;
            }
            free.y += thickness;
            free.height = (free.height - thickness).max(0.0);
        }
    }
}
