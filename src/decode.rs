// ========================= Decode =========================
//
// (rectify) -> (blur, color gain) -> sample band centers row-major ->
// calibrate on the first 8 samples -> classify -> triplets -> inflate until
// the zlib stream ends -> split name/payload -> write.
//
// Calibration must finish before any other sample is classified, and the
// inflater must see bytes in grid order: this path is strictly sequential.

use std::path::Path;

use image::{imageops, Rgb, RgbImage};
use log::{debug, warn};

use crate::compress::StreamInflater;
use crate::config::{GridConfig, SamplingConfig};
use crate::enhance::preprocess;
use crate::error::{PaperError, Result};
use crate::frame::{parse_internal_frame, strip_external_frame, CALIBRATION_MARKER};
use crate::layout::{band_centers, GridPlan};
use crate::palette::Calibration;
use crate::persist::{blake3_hash_bytes, hex32, load_image, write_recovered, WriteOutcome};
use crate::rectify::{rectify, Point};
use crate::symbol::{triplet_to_byte, DIGITS_PER_BYTE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFile {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Where the page pixels come from.
#[derive(Debug, Clone)]
pub enum PageSource {
    /// Photo or scan: optionally rectified, then preprocessed and sampled
    /// with the given density.
    Photo { sampling: SamplingConfig, corners: Option<[Point; 4]> },
    /// Unprinted encoder output read with the encoder's own geometry.
    Rendered(GridConfig),
}

/// One pixel per block at the band centers, row-major.
pub fn sample_blocks(img: &RgbImage, w_blocks: u32, h_blocks: u32) -> Result<Vec<Rgb<u8>>> {
    let (w, h) = img.dimensions();
    if w < w_blocks || h < h_blocks || w_blocks == 0 || h_blocks == 0 {
        return Err(PaperError::InvalidGeometry(format!("cannot split a {w}x{h} image into {w_blocks}x{h_blocks} blocks")));
    }
    let xs = band_centers(w, w_blocks);
    let ys = band_centers(h, h_blocks);
    let mut samples = Vec::with_capacity(xs.len() * ys.len());
    for &y in &ys {
        for &x in &xs { samples.push(*img.get_pixel(x, y)); }
    }
    Ok(samples)
}

/// Turns samples into the external frame's digits. The first 8 samples are
/// the calibration marker; the last 8 are left unread.
pub fn classify_samples(samples: &[Rgb<u8>]) -> Result<Vec<u8>> {
    let reserve = CALIBRATION_MARKER.len();
    if samples.len() < 2 * reserve {
        return Err(PaperError::FrameTooShort(format!("{} blocks sampled, need at least {}", samples.len(), 2 * reserve)));
    }
    let cal = Calibration::from_samples(samples)?;
    debug!("calibration colors: {:?}", cal.references().map(|c| c.0));
    let mut digits = Vec::with_capacity(samples.len() - reserve);
    digits.extend_from_slice(&CALIBRATION_MARKER);
    digits.extend(samples[reserve..samples.len() - reserve].iter().map(|&px| cal.classify(px)));
    Ok(digits)
}

/// Inflates the symbols after the marker, stopping on the zlib end marker.
/// Trailing digits that do not make a whole byte can only be unused capacity
/// and are dropped before framing.
pub fn inflate_digits(digits: &[u8]) -> Result<Vec<u8>> {
    let marker = CALIBRATION_MARKER.len();
    let whole = if digits.len() < marker { digits.len() } else { marker + (digits.len() - marker) / DIGITS_PER_BYTE * DIGITS_PER_BYTE };
    let symbols = strip_external_frame(&digits[..whole])?;
    let mut inflater = StreamInflater::new();
    for triplet in symbols.chunks_exact(DIGITS_PER_BYTE) {
        if inflater.push(triplet_to_byte(triplet)?)? { break; }
    }
    if inflater.is_finished() {
        debug!("zlib stream ended after {} of {} bytes", inflater.consumed(), symbols.len() / DIGITS_PER_BYTE);
    }
    inflater.finish()
}

pub fn decode_samples(samples: &[Rgb<u8>]) -> Result<RecoveredFile> {
    let digits = classify_samples(samples)?;
    let frame = inflate_digits(&digits)?;
    let (name, payload) = parse_internal_frame(&frame)?;
    Ok(RecoveredFile { name, payload })
}

/// Decodes an already rectified photo.
pub fn decode_image(img: &RgbImage, sampling: &SamplingConfig) -> Result<RecoveredFile> {
    sampling.validate()?;
    let prepared = preprocess(img, sampling);
    let samples = sample_blocks(&prepared, sampling.w_blocks, sampling.h_blocks)?;
    decode_samples(&samples)
}

pub fn decode_photo(img: &RgbImage, corners: Option<[Point; 4]>, sampling: &SamplingConfig) -> Result<RecoveredFile> {
    match corners {
        Some(c) => {
            step!("Rectifying page…");
            let flat = rectify(img, c)?;
            ok!("Page rectified to {}x{} px", flat.width(), flat.height());
            decode_image(&flat, sampling)
        }
        None => decode_image(img, sampling),
    }
}

/// Decodes encoder output directly: crops to the block area and samples at
/// the grid's full capacity.
pub fn decode_rendered(canvas: &RgbImage, grid: &GridConfig) -> Result<RecoveredFile> {
    let plan = GridPlan::new(grid)?;
    if canvas.dimensions() != (grid.width, grid.height) {
        warn!("image is {}x{}, grid config expects {}x{}", canvas.width(), canvas.height(), grid.width, grid.height);
    }
    let (x, y, w, h) = plan.capacity_rect();
    if x + w > canvas.width() || y + h > canvas.height() {
        return Err(PaperError::InvalidGeometry(format!("{}x{} image cannot hold the configured grid", canvas.width(), canvas.height())));
    }
    let blocks = imageops::crop_imm(canvas, x, y, w, h).to_image();
    let samples = sample_blocks(&blocks, plan.w_cap, plan.h_cap)?;
    decode_samples(&samples)
}

/// Reads the page at `path` and writes the recovered file into `out_dir`.
pub fn decode_file(path: &Path, out_dir: &Path, source: &PageSource) -> Result<WriteOutcome> {
    step!("Loading {:?}…", path);
    let img = load_image(path)?;
    ok!("Image loaded ({}x{} px)", img.width(), img.height());

    step!("Reading blocks…");
    let recovered = match source {
        PageSource::Photo { sampling, corners } => decode_photo(&img, *corners, sampling)?,
        PageSource::Rendered(grid) => decode_rendered(&img, grid)?,
    };
    ok!(
        "Recovered {:?}: {} bytes, BLAKE3={}",
        recovered.name,
        recovered.payload.len(),
        hex32(blake3_hash_bytes(&recovered.payload))
    );

    let outcome = write_recovered(out_dir, &recovered.name, &recovered.payload)?;
    match &outcome {
        WriteOutcome::Written(p) => ok!("DECODE COMPLETE → {:?}", p),
        WriteOutcome::Unchanged(p) => ok!("DECODE COMPLETE → {:?} (already up to date)", p),
    }
    Ok(outcome)
}
