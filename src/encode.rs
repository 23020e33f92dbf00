// ========================= Encode =========================
//
// read -> internal frame -> zlib -> octal symbols -> marker -> plan ->
// capacity check -> render -> verify -> write. Everything up to the write
// happens in memory; a failure at any stage leaves no file behind.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, warn};

use crate::compress::zlib_compress;
use crate::config::GridConfig;
use crate::decode::decode_rendered;
use crate::error::{PaperError, Result};
use crate::frame::{build_external_frame, build_internal_frame, CALIBRATION_MARKER};
use crate::label::{LabelPainter, PageLabel};
use crate::layout::{GridPlan, LineSegment};
use crate::palette::{BACKGROUND, INK, PALETTE};
use crate::persist::{blake3_hash_bytes, hex32, write_png};
use crate::symbol::bytes_to_symbols;

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    pub grid: GridConfig,
    /// Decode the rendered canvas before writing and compare with the input
    pub verify: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self { Self { grid: GridConfig::default(), verify: true } }
}

#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub canvas: RgbImage,
    pub plan: GridPlan,
    pub label: PageLabel,
    /// Blocks used, calibration marker included
    pub blocks: usize,
    pub compressed_len: usize,
}

/// Digits for one file: marker followed by the symbolized zlib stream.
pub fn frame_payload(name: &str, bytes: &[u8]) -> Result<(Vec<u8>, usize)> {
    let internal = build_internal_frame(name, bytes)?;
    let packed = zlib_compress(&internal)?;
    debug!("internal frame {} bytes -> zlib {} bytes", internal.len(), packed.len());
    Ok((build_external_frame(&bytes_to_symbols(&packed)), packed.len()))
}

fn draw_line(img: &mut RgbImage, line: &LineSegment) {
    let (w, h) = img.dimensions();
    match *line {
        LineSegment::Horizontal { y, x0, x1 } if y < h => {
            for x in x0..=x1.min(w - 1) { img.put_pixel(x, y, INK); }
        }
        LineSegment::Vertical { x, y0, y1 } if x < w => {
            for y in y0..=y1.min(h - 1) { img.put_pixel(x, y, INK); }
        }
        _ => {}
    }
}

/// `digits` must be octal and fit `plan`; `encode_bytes` checks both first.
pub(crate) fn render_page(digits: &[u8], plan: &GridPlan, grid: &GridConfig, label: &PageLabel, painter: &dyn LabelPainter) -> RgbImage {
    debug_assert!(digits.len() <= plan.capacity(), "{} digits exceed grid capacity {}", digits.len(), plan.capacity());
    debug_assert!(digits.iter().all(|&d| (d as usize) < PALETTE.len()), "non-octal digit");
    let mut img = RgbImage::from_pixel(grid.width, grid.height, BACKGROUND);
    painter.paint(&mut img, label, grid.margin);
    for line in plan.grid_lines(digits.len()) { draw_line(&mut img, &line); }

    // Paint blocks row-major; the rest of the capacity stays background
    for (index, &d) in digits.iter().enumerate() {
        let r = plan.block_rect(index);
        let fill = PALETTE[d as usize];
        for y in r.y0..=r.y1 {
            for x in r.x0..=r.x1 { img.put_pixel(x, y, fill); }
        }
    }
    img
}

pub fn encode_bytes(name: &str, bytes: &[u8], opts: &EncodeOptions, painter: &dyn LabelPainter) -> Result<EncodedPage> {
    if bytes.is_empty() { return Err(PaperError::EmptyInput(PathBuf::from(name))); }

    let (digits, compressed_len) = frame_payload(name, bytes)?;

    step!("Planning grid ({}x{} px, margin {} px, block {} px)…", opts.grid.width, opts.grid.height, opts.grid.margin, opts.grid.block_size);
    let plan = GridPlan::new(&opts.grid)?;
    plan.check(digits.len())?;
    ok!("{} blocks needed, grid holds {}x{} = {}", digits.len(), plan.w_cap, plan.h_cap, plan.capacity());
    let in_reserve = digits.len() + CALIBRATION_MARKER.len() > plan.capacity();
    if in_reserve {
        warn!(
            "data reaches the last {} cells, which decoders skip; this page may not read back",
            CALIBRATION_MARKER.len()
        );
    }

    let label = PageLabel { w_blocks: plan.w_cap, used_rows: plan.used_rows(digits.len()), raw_size: bytes.len() };
    step!("Rendering {} blocks…", digits.len());
    let canvas = render_page(&digits, &plan, &opts.grid, &label, painter);

    if opts.verify {
        step!("Reading the rendered page back…");
        let back = decode_rendered(&canvas, &opts.grid).map_err(|e| {
            let cause = if in_reserve {
                format!(
                    "{} blocks reach into the last {} cells of {}, which are never read back",
                    digits.len(),
                    CALIBRATION_MARKER.len(),
                    plan.capacity()
                )
            } else {
                "rendered page does not decode".to_string()
            };
            PaperError::VerificationFailed(format!("{cause}: {e}"))
        })?;
        if back.name != name || back.payload != bytes {
            return Err(PaperError::VerificationFailed(format!(
                "rendered page decodes to {:?} ({} bytes)",
                back.name,
                back.payload.len()
            )));
        }
        ok!("Round-trip verification OK.");
    }

    Ok(EncodedPage { canvas, plan, label, blocks: digits.len(), compressed_len })
}

/// Encodes `input` into `<out_dir>/<file name>.png` and returns that path.
pub fn encode_file(input: &Path, out_dir: &Path, opts: &EncodeOptions, painter: &dyn LabelPainter) -> Result<PathBuf> {
    let filename = input
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| PaperError::InvalidFileName(input.display().to_string()))?
        .to_string();
    step!("Reading {:?}…", filename);
    let bytes = fs::read(input)?;
    if bytes.is_empty() { return Err(PaperError::EmptyInput(input.to_path_buf())); }
    ok!("Input: {} bytes, BLAKE3={}", bytes.len(), hex32(blake3_hash_bytes(&bytes)));

    let page = encode_bytes(&filename, &bytes, opts, painter)?;

    let out = out_dir.join(format!("{filename}.png"));
    step!("Writing PNG to {:?}…", out);
    write_png(&out, &page.canvas, opts.grid.dpi)?;
    ok!("ENCODE COMPLETE → {:?} ({})", out, page.label.capacity_line());
    Ok(out)
}
