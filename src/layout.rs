// ========================= Grid layout =========================
//
// Blocks are laid out row-major from (margin, margin) with a fixed pitch.
// Cell boundaries carry 1px gridlines; a block fills the cell minus that
// border. The decoder never sees this struct: it splits the rectified photo
// into equal bands and samples band centers (`band_centers`).

use crate::config::GridConfig;
use crate::error::{PaperError, Result};

/// Blocks that fit along one axis.
pub fn block_capacity(dimension: u32, margin: u32, block_size: u32) -> Result<u32> {
    if block_size < 2 {
        return Err(PaperError::InvalidGeometry(format!("block size {block_size}px leaves no room inside the gridlines")));
    }
    let usable = dimension.checked_sub(margin.saturating_mul(2)).unwrap_or(0);
    let cap = usable / block_size;
    if cap == 0 {
        return Err(PaperError::InvalidGeometry(format!(
            "{dimension}px with {margin}px margins holds no {block_size}px blocks"
        )));
    }
    Ok(cap)
}

pub fn check_capacity(data_len: usize, w_cap: u32, h_cap: u32) -> Result<()> {
    let capacity = w_cap as usize * h_cap as usize;
    if data_len > capacity {
        return Err(PaperError::Overflow { needed: data_len, capacity });
    }
    Ok(())
}

/// Inclusive pixel rectangle painted for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Needs a plan that passed `block_capacity`: `w_cap > 0`, `block_size >= 2`.
pub(crate) fn block_rect(index: usize, w_cap: u32, block_size: u32, margin: u32) -> BlockRect {
    debug_assert!(w_cap > 0 && block_size >= 2, "degenerate grid {w_cap} cols of {block_size}px");
    let row = (index / w_cap as usize) as u32;
    let col = (index % w_cap as usize) as u32;
    let x = margin + col * block_size;
    let y = margin + row * block_size;
    BlockRect { x0: x + 1, y0: y + 1, x1: x + block_size - 1, y1: y + block_size - 1 }
}

/// Axis-aligned 1px line, endpoints inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSegment {
    Horizontal { y: u32, x0: u32, x1: u32 },
    Vertical { x: u32, y0: u32, y1: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlan {
    pub margin: u32,
    pub block_size: u32,
    pub w_cap: u32,
    pub h_cap: u32,
}

impl GridPlan {
    pub fn new(cfg: &GridConfig) -> Result<Self> {
        let w_cap = block_capacity(cfg.width, cfg.margin, cfg.block_size)?;
        let h_cap = block_capacity(cfg.height, cfg.margin, cfg.block_size)?;
        Ok(Self { margin: cfg.margin, block_size: cfg.block_size, w_cap, h_cap })
    }

    pub fn capacity(&self) -> usize { self.w_cap as usize * self.h_cap as usize }

    pub fn check(&self, data_len: usize) -> Result<()> { check_capacity(data_len, self.w_cap, self.h_cap) }

    pub fn block_rect(&self, index: usize) -> BlockRect { block_rect(index, self.w_cap, self.block_size, self.margin) }

    /// Rows touched by `data_len` blocks, the last one possibly partial.
    pub fn used_rows(&self, data_len: usize) -> u32 {
        data_len.div_ceil(self.w_cap as usize) as u32
    }

    /// Right / bottom pixel edge of the full-capacity rectangle.
    pub fn page_edges(&self) -> (u32, u32) {
        (self.margin + self.w_cap * self.block_size, self.margin + self.h_cap * self.block_size)
    }

    pub fn data_edge(&self, data_len: usize) -> u32 {
        self.margin + self.used_rows(data_len) * self.block_size
    }

    /// Pixel rectangle `(x, y, w, h)` covering every cell of the grid.
    pub fn capacity_rect(&self) -> (u32, u32, u32, u32) {
        (self.margin, self.margin, self.w_cap * self.block_size, self.h_cap * self.block_size)
    }

    /// Outline of the whole capacity plus a full lattice over the rows that
    /// hold data. Unused capacity shows as an empty framed area.
    pub fn grid_lines(&self, data_len: usize) -> Vec<LineSegment> {
        let m = self.margin;
        let (right, bottom) = self.page_edges();
        let data_edge = self.data_edge(data_len);
        let mut lines = vec![
            LineSegment::Horizontal { y: m, x0: m, x1: right },
            LineSegment::Horizontal { y: bottom, x0: m, x1: right },
            LineSegment::Vertical { x: m, y0: m, y1: bottom },
            LineSegment::Vertical { x: right, y0: m, y1: bottom },
        ];
        for col in 0..=self.w_cap {
            lines.push(LineSegment::Vertical { x: m + col * self.block_size, y0: m, y1: data_edge });
        }
        for row in 0..=self.used_rows(data_len) {
            lines.push(LineSegment::Horizontal { y: m + row * self.block_size, x0: m, x1: right });
        }
        lines
    }
}

/// Center pixel of each of `bands` equal slices of `extent`, rounding half
/// to even, clamped inside the image.
pub fn band_centers(extent: u32, bands: u32) -> Vec<u32> {
    if extent == 0 || bands == 0 { return Vec::new(); }
    let step = extent as f64 / bands as f64;
    (0..bands)
        .map(|i| {
            let c = (i as f64 * step + step / 2.0).round_ties_even();
            (c as u32).min(extent - 1)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GridConfig {
        GridConfig { width: 200, height: 200, margin: 10, block_size: 4, dpi: 300 }
    }

    #[test]
    fn capacity_per_axis() -> anyhow::Result<()> {
        assert_eq!(block_capacity(200, 10, 4)?, 45);
        assert_eq!(block_capacity(2480, 59, 20)?, 118);
        assert_eq!(block_capacity(3508, 59, 20)?, 169);
        Ok(())
    }

    #[test]
    fn degenerate_geometry() {
        assert!(matches!(block_capacity(100, 50, 4), Err(PaperError::InvalidGeometry(_))));
        assert!(matches!(block_capacity(100, 60, 4), Err(PaperError::InvalidGeometry(_))));
        assert!(matches!(block_capacity(100, 10, 81), Err(PaperError::InvalidGeometry(_))));
        assert!(matches!(block_capacity(100, 10, 1), Err(PaperError::InvalidGeometry(_))));
        assert!(matches!(block_capacity(100, 10, 0), Err(PaperError::InvalidGeometry(_))));
    }

    #[test]
    fn capacity_boundary() {
        assert!(check_capacity(45 * 45, 45, 45).is_ok());
        assert!(matches!(
            check_capacity(45 * 45 + 1, 45, 45),
            Err(PaperError::Overflow { needed: 2026, capacity: 2025 })
        ));
    }

    #[test]
    fn rects_are_inset_by_one() {
        assert_eq!(block_rect(0, 45, 4, 10), BlockRect { x0: 11, y0: 11, x1: 13, y1: 13 });
        // second row, third column
        assert_eq!(block_rect(47, 45, 4, 10), BlockRect { x0: 19, y0: 15, x1: 21, y1: 17 });
    }

    #[test]
    #[should_panic(expected = "degenerate grid")]
    fn zero_column_rect_is_a_bug() {
        block_rect(3, 0, 4, 10);
    }

    #[test]
    fn lines_cover_data_rows_only() -> anyhow::Result<()> {
        let plan = GridPlan::new(&small())?;
        let data_len = 46; // one full row and one block of the next
        assert_eq!(plan.used_rows(data_len), 2);
        assert_eq!(plan.data_edge(data_len), 18);
        let lines = plan.grid_lines(data_len);
        let horizontal: Vec<u32> = lines
            .iter()
            .filter_map(|l| match l { LineSegment::Horizontal { y, .. } => Some(*y), _ => None })
            .collect();
        assert_eq!(horizontal, vec![10, 190, 10, 14, 18]);
        let inner_vertical = lines.iter().filter(|l| matches!(l, LineSegment::Vertical { y1: 18, .. })).count();
        assert_eq!(inner_vertical, 46);
        Ok(())
    }

    #[test]
    fn band_centers_hit_block_interiors() -> anyhow::Result<()> {
        let plan = GridPlan::new(&small())?;
        let (_, _, w, _) = plan.capacity_rect();
        let centers = band_centers(w, plan.w_cap);
        assert_eq!(centers.len(), 45);
        assert_eq!(&centers[..3], &[2, 6, 10]);
        for (i, c) in centers.iter().enumerate() {
            let rel = c - i as u32 * plan.block_size;
            assert!(rel >= 1 && rel < plan.block_size, "band {i} center {c}");
        }
        Ok(())
    }

    #[test]
    fn band_centers_round_half_to_even() {
        // 10/2: 2.5 -> 2, 7.5 -> 8 ; 5/2: 1.25 -> 1, 3.75 -> 4
        assert_eq!(band_centers(10, 2), vec![2, 8]);
        assert_eq!(band_centers(5, 2), vec![1, 4]);
        assert!(band_centers(0, 3).is_empty());
    }
}
