//! Stateless 2D bin-packing: MaxRects with the Best-Short-Side-Fit
//! heuristic. One call, one answer; nothing is retained between calls, so
//! [`pack`] is safe from any thread and safe to memoize on its inputs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl From<(f64, f64)> for Size {
    fn from((width, height): (f64, f64)) -> Self {
        Size::new(width, height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackOptions {
    /// Size substituted when the lookup has no entry for an item or reports
    /// a non-positive dimension.
    #[serde(default = "default_minimum_item_size")]
    pub minimum_item_size: Size,
    /// Minimum empty space between any two placed items and between items
    /// and the margin boundary.
    #[serde(default)]
    pub padding: f64,
    /// Border kept empty around the container edge.
    #[serde(default)]
    pub margin: f64,
}

fn default_minimum_item_size() -> Size {
    Size::new(200.0, 150.0)
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            minimum_item_size: default_minimum_item_size(),
            padding: 0.0,
            margin: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement<I> {
    pub item: I,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackResult<I> {
    pub placements: Vec<Placement<I>>,
    /// False when at least one item did not fit and was stacked below the
    /// lowest placed item instead. Fallback placements may overlap others;
    /// callers that need strict non-overlap must treat `all_fit = false` as
    /// a failed layout.
    pub all_fit: bool,
    /// Placed item area over total container area, counting only items the
    /// free-rectangle search accommodated. Always within `[0, 1]`.
    pub utilization: f64,
}

/// Unused space inside the container during one packing call.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FreeRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl FreeRect {
    fn fits(&self, w: f64, h: f64) -> bool {
        self.width >= w && self.height >= h
    }

    fn contains(&self, other: &FreeRect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.x + self.width >= other.x + other.width
            && self.y + self.height >= other.y + other.height
    }

    fn overlaps(&self, x: f64, y: f64, w: f64, h: f64) -> bool {
        self.x < x + w && x < self.x + self.width && self.y < y + h && y < self.y + self.height
    }
}

/// Computes non-overlapping placements for `items` inside `container`.
///
/// Items are placed in descending area order (ties keep input order) into
/// the free rectangle that leaves the smallest short-side remainder. The
/// placement footprint includes `options.padding` on the right and bottom;
/// the initial free rectangle excludes `options.margin` on all sides.
/// Deterministic for a fixed input order and fixed sizes.
pub fn pack<I, F>(items: &[I], container: Size, size_of: F, options: &PackOptions) -> PackResult<I>
where
    I: Clone,
    F: Fn(&I) -> Option<Size>,
{
    let margin = options.margin.max(0.0);
    let padding = options.padding.max(0.0);

    let mut free: Vec<FreeRect> = Vec::new();
    let inner = FreeRect {
        x: margin,
        y: margin,
        width: container.width - 2.0 * margin,
        height: container.height - 2.0 * margin,
    };
    if inner.width > 0.0 && inner.height > 0.0 {
        free.push(inner);
    }

    // Larger items first reduces fragmentation; stable sort keeps input
    // order on equal areas.
    let mut order: Vec<(usize, Size)> = items
        .iter()
        .map(|item| effective_size(size_of(item), options))
        .enumerate()
        .collect();
    order.sort_by(|(_, a), (_, b)| {
        b.area().partial_cmp(&a.area()).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut placements: Vec<Placement<I>> = Vec::with_capacity(items.len());
    let mut placed_area = 0.0;
    let mut all_fit = true;

    for (index, size) in order {
        let footprint_w = size.width + padding;
        let footprint_h = size.height + padding;

        match best_short_side_fit(&free, footprint_w, footprint_h) {
            Some(best) => {
                let rect = free[best];
                placements.push(Placement {
                    item: items[index].clone(),
                    x: rect.x,
                    y: rect.y,
                    width: size.width,
                    height: size.height,
                });
                placed_area += size.area();
                split_free_rects(&mut free, rect.x, rect.y, footprint_w, footprint_h);
                prune_contained(&mut free);
            }
            None => {
                all_fit = false;
                // Stack below the lowest placed item. This path does not
                // re-check overlap against other placements.
                let fallback_y = placements
                    .iter()
                    .map(|p| p.y + p.height + padding)
                    .fold(f64::NEG_INFINITY, f64::max);
                let y = if fallback_y.is_finite() { fallback_y } else { margin };
                placements.push(Placement {
                    item: items[index].clone(),
                    x: margin,
                    y,
                    width: size.width,
                    height: size.height,
                });
            }
        }
    }

    let container_area = container.area();
    let utilization = if container_area > 0.0 { placed_area / container_area } else { 0.0 };

    PackResult { placements, all_fit, utilization }
}

fn effective_size(reported: Option<Size>, options: &PackOptions) -> Size {
    match reported {
        Some(size) if size.width > 0.0 && size.height > 0.0 => size,
        _ => options.minimum_item_size,
    }
}

/// Index of the free rectangle leaving the smallest short-side remainder
/// for a `w` x `h` footprint, ties broken by the long-side remainder.
fn best_short_side_fit(free: &[FreeRect], w: f64, h: f64) -> Option<usize> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (i, rect) in free.iter().enumerate() {
        if !rect.fits(w, h) {
            continue;
        }
        let leftover_w = rect.width - w;
        let leftover_h = rect.height - h;
        let short = leftover_w.min(leftover_h);
        let long = leftover_w.max(leftover_h);
        let better = match best {
            None => true,
            Some((_, best_short, best_long)) => {
                short < best_short || (short == best_short && long < best_long)
            }
        };
        if better {
            best = Some((i, short, long));
        }
    }
    best.map(|(i, _, _)| i)
}

/// Clips the occupied footprint out of every overlapping free rectangle,
/// replacing each with up to four slivers (above, below, left, right).
fn split_free_rects(free: &mut Vec<FreeRect>, x: f64, y: f64, w: f64, h: f64) {
    let mut next = Vec::with_capacity(free.len() + 4);
    for rect in free.drain(..) {
        if !rect.overlaps(x, y, w, h) {
            next.push(rect);
            continue;
        }

        let top = y - rect.y;
        if top > 0.0 {
            next.push(FreeRect { height: top, ..rect });
        }
        let bottom = (rect.y + rect.height) - (y + h);
        if bottom > 0.0 {
            next.push(FreeRect { y: y + h, height: bottom, ..rect });
        }
        let left = x - rect.x;
        if left > 0.0 {
            next.push(FreeRect { width: left, ..rect });
        }
        let right = (rect.x + rect.width) - (x + w);
        if right > 0.0 {
            next.push(FreeRect { x: x + w, width: right, ..rect });
        }
    }
    *free = next;
}

/// Drops free rectangles fully contained within another.
fn prune_contained(free: &mut Vec<FreeRect>) {
    let mut i = 0;
    while i < free.len() {
        let mut removed = false;
        let mut j = i + 1;
        while j < free.len() {
            if free[j].contains(&free[i]) {
                free.swap_remove(i);
                removed = true;
                break;
            }
            if free[i].contains(&free[j]) {
                free.swap_remove(j);
            } else {
                j += 1;
            }
        }
        if !removed {
            i += 1;
        }
    }
}
