// ========================= Page label =========================
//
// The label sits in the top margin: a title on the left, the capacity line on
// the right. Glyph rendering needs a font the caller provides; without one the
// page is simply unlabeled.

use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::RgbImage;
use imageproc::drawing::{draw_text_mut, text_size};

use crate::error::{PaperError, Result};
use crate::palette::INK;

pub const TITLE: &str = "PaperFile data map";

#[derive(Debug, Clone, PartialEq)]
pub struct PageLabel {
    pub w_blocks: u32,
    /// Rows actually holding data
    pub used_rows: u32,
    pub raw_size: usize,
}

impl PageLabel {
    pub fn capacity_line(&self) -> String {
        format!(
            "Capacity: {}x{} ({} blocks, {:?} Kb)",
            self.w_blocks,
            self.used_rows,
            self.w_blocks as u64 * self.used_rows as u64,
            self.raw_size as f64 / 1000.0
        )
    }
}

pub trait LabelPainter {
    fn paint(&self, canvas: &mut RgbImage, label: &PageLabel, margin: u32);
}

/// Leaves the margin blank.
#[derive(Debug, Default)]
pub struct NoLabel;

impl LabelPainter for NoLabel {
    fn paint(&self, _canvas: &mut RgbImage, _label: &PageLabel, _margin: u32) {}
}

pub struct FontLabel {
    font: FontVec,
}

impl FontLabel {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| PaperError::Config(format!("font {}: {e}", path.display())))?;
        Ok(Self { font })
    }
}

impl std::fmt::Debug for FontLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str("FontLabel") }
}

impl LabelPainter for FontLabel {
    fn paint(&self, canvas: &mut RgbImage, label: &PageLabel, margin: u32) {
        // glyphs take two thirds of the top margin
        let px = margin.saturating_sub(margin / 3);
        if px == 0 { return; }
        let scale = PxScale::from(px as f32);
        let line = label.capacity_line();
        let (text_w, _) = text_size(scale, &self.font, &line);
        let right_x = canvas.width() as i64 - (margin as i64 + text_w as i64);
        draw_text_mut(canvas, INK, margin as i32, 0, scale, &self.font, TITLE);
        draw_text_mut(canvas, INK, right_x.max(0) as i32, 0, scale, &self.font, &line);
    }
}
