use std::collections::HashMap;

use smithay::{
    desktop::Window,
    utils::{Logical, Rectangle},
};

/// The four supported tiling algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LayoutKind {
    MasterStack,
    Grid,
    Spiral,
    BinaryTree,
}

impl Default for LayoutKind {
    fn default() -> Self {
        LayoutKind::MasterStack
    }
}

impl LayoutKind {
    pub fn cycle_next(self) -> Self {
        match self {
            LayoutKind::MasterStack => LayoutKind::Grid,
            LayoutKind::Grid => LayoutKind::Spiral,
            LayoutKind::Spiral => LayoutKind::BinaryTree,
            LayoutKind::BinaryTree => LayoutKind::MasterStack,
        }
    }
}

/// Inputs to a single layout computation. Pure data, no window references:
/// the engine never touches a window, only produces rectangles for a slot count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingContext {
    pub area: Rectangle<i32, Logical>,
    pub count: usize,
    pub master_ratio: f32,
    pub master_count: u32,
    pub gap: i32,
    pub border: i32,
}

impl TilingContext {
    fn cache_key(&self, kind: LayoutKind) -> CacheKey {
        CacheKey {
            kind,
            count: self.count,
            w: self.area.size.w,
            h: self.area.size.h,
            ratio_bits: self.master_ratio.to_bits(),
            master_count: self.master_count,
            gap: self.gap,
            border: self.border,
        }
    }
}

/// Per-window output of the tiling engine.
#[derive(Debug, Clone, Copy)]
pub struct LayoutResult {
    pub rect: Rectangle<i32, Logical>,
    pub is_master: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    kind: LayoutKind,
    count: usize,
    w: i32,
    h: i32,
    ratio_bits: u32,
    master_count: u32,
    gap: i32,
    border: i32,
}

/// Memoizes layout computations; any change to the cache key invalidates.
#[derive(Default)]
pub struct LayoutCache {
    entries: HashMap<CacheKey, Vec<LayoutResult>>,
}

impl LayoutCache {
    pub fn get_or_compute(&mut self, kind: LayoutKind, ctx: &TilingContext) -> Vec<LayoutResult> {
        let key = ctx.cache_key(kind);
        if let Some(cached) = self.entries.get(&key) {
            return cached.clone();
        }
        let computed = compute(kind, ctx);
        self.entries.insert(key, computed.clone());
        computed
    }
}

/// Divide `total` into `n` equal slices of size `slice`, separated by `gap`,
/// starting at `origin`. Returns `(offset, slice_size)` pairs.
fn stack_slices(origin: i32, total: i32, n: i32, gap: i32) -> Vec<(i32, i32)> {
    if n <= 0 {
        return Vec::new();
    }
    let slice = (total - (n - 1) * gap) / n;
    (0..n)
        .map(|i| (origin + i * (slice + gap), slice))
        .collect()
}

fn master_stack(ctx: &TilingContext) -> Vec<LayoutResult> {
    let n = ctx.count as i32;
    if n == 0 {
        return Vec::new();
    }
    let area = ctx.area;
    if n == 1 {
        return vec![LayoutResult {
            rect: area,
            is_master: true,
        }];
    }

    let gap = ctx.gap;
    let master_count = (ctx.master_count as i32).min(n).max(1);
    let inner = Rectangle::new(
        (area.loc.x + gap, area.loc.y + gap).into(),
        (area.size.w - 2 * gap, area.size.h - 2 * gap).into(),
    );

    if n <= master_count {
        let rows = stack_slices(inner.loc.y, inner.size.h, n, gap);
        return rows
            .into_iter()
            .map(|(y, h)| LayoutResult {
                rect: Rectangle::new((inner.loc.x, y).into(), (inner.size.w, h).into()),
                is_master: true,
            })
            .collect();
    }

    let master_w = ((inner.size.w as f32) * ctx.master_ratio.clamp(0.1, 0.9)) as i32;
    let stack_w = inner.size.w - master_w - gap;
    let stack_x = inner.loc.x + master_w + gap;

    let mut result = Vec::with_capacity(n as usize);
    for (y, h) in stack_slices(inner.loc.y, inner.size.h, master_count, gap) {
        result.push(LayoutResult {
            rect: Rectangle::new((inner.loc.x, y).into(), (master_w, h).into()),
            is_master: true,
        });
    }
    for (y, h) in stack_slices(inner.loc.y, inner.size.h, n - master_count, gap) {
        result.push(LayoutResult {
            rect: Rectangle::new((stack_x, y).into(), (stack_w, h).into()),
            is_master: false,
        });
    }
    result
}

fn grid(ctx: &TilingContext) -> Vec<LayoutResult> {
    let n = ctx.count;
    if n == 0 {
        return Vec::new();
    }
    let area = ctx.area;
    let gap = ctx.gap;
    if n == 1 {
        return vec![LayoutResult {
            rect: area,
            is_master: true,
        }];
    }

    let cols = (n as f64).sqrt().ceil() as i32;
    let rows = ((n as f64) / (cols as f64)).ceil() as i32;

    let inner_w = area.size.w - (cols + 1) * gap;
    let inner_h = area.size.h - (rows + 1) * gap;
    let cell_w = inner_w / cols;
    let cell_h = inner_h / rows;

    (0..n as i32)
        .map(|i| {
            let col = i % cols;
            let row = i / cols;
            let x = area.loc.x + gap + col * (cell_w + gap);
            let y = area.loc.y + gap + row * (cell_h + gap);
            LayoutResult {
                rect: Rectangle::new((x, y).into(), (cell_w, cell_h).into()),
                is_master: i == 0,
            }
        })
        .collect()
}

fn spiral(ctx: &TilingContext) -> Vec<LayoutResult> {
    let n = ctx.count;
    if n == 0 {
        return Vec::new();
    }
    let gap = ctx.gap;
    let mut result = Vec::with_capacity(n);
    let mut remaining = ctx.area;

    for i in 0..n {
        let last = i == n - 1;
        if last {
            result.push(LayoutResult {
                rect: remaining,
                is_master: i == 0,
            });
            break;
        }
        // odd step index (1-based) splits vertically, even splits horizontally;
        // the very first window (i == 0) always takes master_ratio of the full width.
        let vertical_split = i % 2 == 0;
        if i == 0 {
            let w = ((remaining.size.w as f32) * ctx.master_ratio.clamp(0.1, 0.9)) as i32;
            result.push(LayoutResult {
                rect: Rectangle::new(remaining.loc, (w, remaining.size.h).into()),
                is_master: true,
            });
            remaining = Rectangle::new(
                (remaining.loc.x + w + gap, remaining.loc.y).into(),
                (remaining.size.w - w - gap, remaining.size.h).into(),
            );
        } else if vertical_split {
            let half = (remaining.size.w - gap) / 2;
            result.push(LayoutResult {
                rect: Rectangle::new(remaining.loc, (half, remaining.size.h).into()),
                is_master: false,
            });
            remaining = Rectangle::new(
                (remaining.loc.x + half + gap, remaining.loc.y).into(),
                (remaining.size.w - half - gap, remaining.size.h).into(),
            );
        } else {
            let half = (remaining.size.h - gap) / 2;
            result.push(LayoutResult {
                rect: Rectangle::new(remaining.loc, (remaining.size.w, half).into()),
                is_master: false,
            });
            remaining = Rectangle::new(
                (remaining.loc.x, remaining.loc.y + half + gap).into(),
                (remaining.size.w, remaining.size.h - half - gap).into(),
            );
        }
    }
    result
}

/// Recursive bisection: split the index range in half at each depth, alternating
/// the split axis (vertical at even depth, horizontal at odd depth). Window 0 is master.
fn binary_tree(ctx: &TilingContext) -> Vec<LayoutResult> {
    let n = ctx.count;
    if n == 0 {
        return Vec::new();
    }
    let mut result = vec![None; n];
    recurse(0, n, ctx.area, 0, ctx.gap, &mut result);
    result
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let rect = r.expect("binary_tree must assign every index");
            LayoutResult {
                rect,
                is_master: i == 0,
            }
        })
        .collect()
}

fn recurse(
    start: usize,
    end: usize,
    area: Rectangle<i32, Logical>,
    depth: u32,
    gap: i32,
    out: &mut [Option<Rectangle<i32, Logical>>],
) {
    let count = end - start;
    if count == 0 {
        return;
    }
    if count == 1 {
        out[start] = Some(area);
        return;
    }

    let mid = start + count / 2;
    let vertical = depth % 2 == 0;

    if vertical {
        let left_w = (area.size.w - gap) / 2;
        let right_w = area.size.w - gap - left_w;
        let left = Rectangle::new(area.loc, (left_w, area.size.h).into());
        let right = Rectangle::new(
            (area.loc.x + left_w + gap, area.loc.y).into(),
            (right_w, area.size.h).into(),
        );
        recurse(start, mid, left, depth + 1, gap, out);
        recurse(mid, end, right, depth + 1, gap, out);
    } else {
        let top_h = (area.size.h - gap) / 2;
        let bottom_h = area.size.h - gap - top_h;
        let top = Rectangle::new(area.loc, (area.size.w, top_h).into());
        let bottom = Rectangle::new(
            (area.loc.x, area.loc.y + top_h + gap).into(),
            (area.size.w, bottom_h).into(),
        );
        recurse(start, mid, top, depth + 1, gap, out);
        recurse(mid, end, bottom, depth + 1, gap, out);
    }
}

fn compute(kind: LayoutKind, ctx: &TilingContext) -> Vec<LayoutResult> {
    match kind {
        LayoutKind::MasterStack => master_stack(ctx),
        LayoutKind::Grid => grid(ctx),
        LayoutKind::Spiral => spiral(ctx),
        LayoutKind::BinaryTree => binary_tree(ctx),
    }
}

/// A window paired with its computed rectangle, for the caller (`Workspaces::arrange`)
/// to push geometries/configure without the engine ever touching a `Window`.
pub struct Placement<'a> {
    pub window: &'a Window,
    pub geometry: Rectangle<i32, Logical>,
    pub is_master: bool,
}

pub fn placement<'a, I>(
    kind: LayoutKind,
    cache: &mut LayoutCache,
    windows: I,
    area: Rectangle<i32, Logical>,
    master_ratio: f32,
    master_count: u32,
    gap: i32,
    border: i32,
) -> Vec<Placement<'a>>
where
    I: Iterator<Item = &'a Window> + ExactSizeIterator,
{
    let count = windows.len();
    let ctx = TilingContext {
        area,
        count,
        master_ratio,
        master_count,
        gap,
        border,
    };
    let results = cache.get_or_compute(kind, &ctx);
    windows
        .zip(results.into_iter())
        .map(|(window, r)| Placement {
            window,
            geometry: r.rect,
            is_master: r.is_master,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(w: i32, h: i32) -> Rectangle<i32, Logical> {
        Rectangle::new((0, 0).into(), (w, h).into())
    }

    fn rects_overlap(a: Rectangle<i32, Logical>, b: Rectangle<i32, Logical>) -> bool {
        let a_right = a.loc.x + a.size.w;
        let a_bottom = a.loc.y + a.size.h;
        let b_right = b.loc.x + b.size.w;
        let b_bottom = b.loc.y + b.size.h;
        a.loc.x < b_right && b.loc.x < a_right && a.loc.y < b_bottom && b.loc.y < a_bottom
    }

    fn covers_exactly(area: Rectangle<i32, Logical>, gap: i32, results: &[LayoutResult]) {
        let _ = gap;
        // no two rectangles overlap
        for i in 0..results.len() {
            for j in (i + 1)..results.len() {
                assert!(
                    !rects_overlap(results[i].rect, results[j].rect),
                    "rects {i} and {j} overlap: {:?} {:?}",
                    results[i].rect,
                    results[j].rect
                );
            }
        }
        // every rect lies within the area bounds
        for r in results {
            assert!(r.rect.loc.x >= area.loc.x);
            assert!(r.rect.loc.y >= area.loc.y);
            assert!(r.rect.loc.x + r.rect.size.w <= area.loc.x + area.size.w);
            assert!(r.rect.loc.y + r.rect.size.h <= area.loc.y + area.size.h);
        }
    }

    #[test]
    fn master_stack_single_window_fills_area() {
        let ctx = TilingContext {
            area: area(1920, 1080),
            count: 1,
            master_ratio: 0.6,
            master_count: 1,
            gap: 10,
            border: 2,
        };
        let r = master_stack(&ctx);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].rect, area(1920, 1080));
        assert!(r[0].is_master);
    }

    #[test]
    fn master_stack_three_windows_exact_geometry() {
        let ctx = TilingContext {
            area: area(1920, 1080),
            count: 3,
            master_ratio: 0.6,
            master_count: 1,
            gap: 10,
            border: 2,
        };
        let r = master_stack(&ctx);
        assert_eq!(r.len(), 3);
        assert_eq!(
            r[0].rect,
            Rectangle::new((10, 10).into(), (1140, 1060).into())
        );
        assert!(r[0].is_master);
        assert_eq!(
            r[1].rect,
            Rectangle::new((1160, 10).into(), (750, 525).into())
        );
        assert_eq!(
            r[2].rect,
            Rectangle::new((1160, 545).into(), (750, 525).into())
        );
        covers_exactly(area(1920, 1080), 10, &r);
    }

    #[test]
    fn grid_four_windows_even_cells() {
        let ctx = TilingContext {
            area: area(1000, 1000),
            count: 4,
            master_ratio: 0.5,
            master_count: 1,
            gap: 0,
            border: 0,
        };
        let r = grid(&ctx);
        assert_eq!(r.len(), 4);
        for placement in &r {
            assert_eq!(placement.rect.size.w, 500);
            assert_eq!(placement.rect.size.h, 500);
        }
    }

    #[test]
    fn empty_workspace_yields_no_layouts() {
        for kind in [
            LayoutKind::MasterStack,
            LayoutKind::Grid,
            LayoutKind::Spiral,
            LayoutKind::BinaryTree,
        ] {
            let ctx = TilingContext {
                area: area(1920, 1080),
                count: 0,
                master_ratio: 0.5,
                master_count: 1,
                gap: 10,
                border: 2,
            };
            assert!(compute(kind, &ctx).is_empty());
        }
    }

    #[test]
    fn layout_is_deterministic() {
        let ctx = TilingContext {
            area: area(1920, 1080),
            count: 5,
            master_ratio: 0.55,
            master_count: 2,
            gap: 8,
            border: 2,
        };
        let a = master_stack(&ctx);
        let b = master_stack(&ctx);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.rect, y.rect);
        }
    }

    #[test]
    fn binary_tree_covers_area_without_overlap() {
        let ctx = TilingContext {
            area: area(1920, 1080),
            count: 5,
            master_ratio: 0.5,
            master_count: 1,
            gap: 4,
            border: 2,
        };
        let r = binary_tree(&ctx);
        assert_eq!(r.len(), 5);
        assert!(r[0].is_master);
        covers_exactly(area(1920, 1080), 4, &r);
    }

    #[test]
    fn cache_hit_matches_fresh_computation() {
        let ctx = TilingContext {
            area: area(1920, 1080),
            count: 3,
            master_ratio: 0.6,
            master_count: 1,
            gap: 10,
            border: 2,
        };
        let mut cache = LayoutCache::default();
        let fresh = compute(LayoutKind::MasterStack, &ctx);
        let cached = cache.get_or_compute(LayoutKind::MasterStack, &ctx);
        for (a, b) in fresh.iter().zip(cached.iter()) {
            assert_eq!(a.rect, b.rect);
        }
        let cached_again = cache.get_or_compute(LayoutKind::MasterStack, &ctx);
        for (a, b) in cached.iter().zip(cached_again.iter()) {
            assert_eq!(a.rect, b.rect);
        }
    }
}
