// ========================= Files in, files out =========================
//
// Nothing is ever written in place: outputs go to a `.tmp` sibling first and
// are renamed once complete, so a failed run leaves no partial file behind.

use std::fs;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use image::RgbImage;
use log::{debug, warn};

use crate::error::{PaperError, Result};

/// Name used when a page carries an empty file name.
pub const FALLBACK_NAME: &str = "decoded.bin";

// ---------- integrity ----------

pub fn blake3_hash_bytes(bytes: &[u8]) -> [u8; 32] {
    let mut h = Hasher::new(); h.update(bytes); *h.finalize().as_bytes()
}

pub fn blake3_hash_file(path: &Path) -> Result<([u8; 32], u64)> {
    let mut f = fs::File::open(path)?;
    let mut h = Hasher::new();
    let mut buf = vec![0u8; 1 << 20];
    let mut total = 0u64;
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 { break; }
        h.update(&buf[..n]);
        total += n as u64;
    }
    Ok((*h.finalize().as_bytes(), total))
}

pub fn hex32(bytes: [u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes { use std::fmt::Write as _; let _ = write!(&mut s, "{:02x}", b); }
    s
}

// ---------- input ----------

/// A file is used as-is; a directory must hold exactly one regular file.
pub fn resolve_input(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        if !path.exists() { return Err(PaperError::NoInput(path.to_path_buf())); }
        return Ok(path.to_path_buf());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_file() { files.push(entry.path()); }
    }
    match files.len() {
        0 => Err(PaperError::NoInput(path.to_path_buf())),
        1 => Ok(files.remove(0)),
        count => Err(PaperError::AmbiguousInput { dir: path.to_path_buf(), count }),
    }
}

/// Where output goes without `-o`: next to an input file, but never into an
/// input directory, which must keep holding a single file.
pub fn default_output_dir(requested: &Path) -> PathBuf {
    if requested.is_dir() { return PathBuf::from("."); }
    requested
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| PaperError::image_io(path, e))?;
    Ok(img.to_rgb8())
}

// ---------- output ----------

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn commit(tmp: &Path, out: &Path) -> Result<()> {
    fs::rename(tmp, out).inspect_err(|_| { let _ = fs::remove_file(tmp); })?;
    Ok(())
}

/// Writes an RGB PNG with a pHYs chunk so printers honor `dpi`.
pub fn write_png(path: &Path, img: &RgbImage, dpi: u32) -> Result<()> {
    let tmp = tmp_sibling(path);
    let res = encode_png(&tmp, img, dpi);
    if let Err(e) = res {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    commit(&tmp, path)
}

fn encode_png(path: &Path, img: &RgbImage, dpi: u32) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut enc = png::Encoder::new(BufWriter::new(file), img.width(), img.height());
    enc.set_color(png::ColorType::Rgb);
    enc.set_depth(png::BitDepth::Eight);
    enc.set_compression(png::Compression::Best);
    if dpi > 0 {
        // pixels per meter, rounded
        let ppm = ((dpi as f64) / 0.0254).round() as u32;
        enc.set_pixel_dims(Some(png::PixelDimensions { xppu: ppm, yppu: ppm, unit: png::Unit::Meter }));
    }
    let mut writer = enc.write_header().map_err(|e| PaperError::image_io(path, e))?;
    writer.write_image_data(img.as_raw()).map_err(|e| PaperError::image_io(path, e))?;
    writer.finish().map_err(|e| PaperError::image_io(path, e))?;
    Ok(())
}

/// Plain bytes, same tmp-then-rename discipline.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_sibling(path);
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    commit(&tmp, path)
}

/// Names coming off a page are untrusted: they must stay a single path
/// component inside the output directory.
pub fn safe_output_name(name: &str) -> Result<&str> {
    if name.is_empty() { return Ok(FALLBACK_NAME); }
    if name == "." || name == ".." || name.contains(['\\', '\0', '/']) {
        return Err(PaperError::InvalidFileName(name.to_string()));
    }
    Ok(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// Target already held identical content
    Unchanged(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self { WriteOutcome::Written(p) | WriteOutcome::Unchanged(p) => p }
    }
}

/// Stores a recovered payload under `out_dir/name`. An existing file with the
/// same content is left alone; a different one is kept and the payload goes
/// to `<name>.restored` instead.
pub fn write_recovered(out_dir: &Path, name: &str, payload: &[u8]) -> Result<WriteOutcome> {
    let desired = safe_output_name(name)?;
    let mut out_path = out_dir.join(desired);
    let want = blake3_hash_bytes(payload);
    if out_path.exists() {
        let (h, l) = blake3_hash_file(&out_path)?;
        if l == payload.len() as u64 && h == want {
            debug!("{:?} already holds the recovered bytes", out_path);
            return Ok(WriteOutcome::Unchanged(out_path));
        }
        warn!("{:?} exists with different content; keeping it", out_path);
        out_path = out_dir.join(format!("{desired}.restored"));
    }
    write_atomically(&out_path, payload)?;
    let (reh, relen) = blake3_hash_file(&out_path)?;
    if relen != payload.len() as u64 || reh != want {
        return Err(PaperError::VerificationFailed(format!("{:?} does not match the recovered bytes after write", out_path)));
    }
    Ok(WriteOutcome::Written(out_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    #[test]
    fn single_file_directory_resolves() -> anyhow::Result<()> {
        let dir = tempdir()?;
        assert!(matches!(resolve_input(dir.path()), Err(PaperError::NoInput(_))));
        fs::write(dir.path().join("key.pem"), b"k")?;
        fs::create_dir(dir.path().join("nested"))?;
        assert_eq!(resolve_input(dir.path())?, dir.path().join("key.pem"));
        fs::write(dir.path().join("other"), b"o")?;
        assert!(matches!(resolve_input(dir.path()), Err(PaperError::AmbiguousInput { count: 2, .. })));
        assert!(matches!(resolve_input(&dir.path().join("missing")), Err(PaperError::NoInput(_))));
        Ok(())
    }

    #[test]
    fn outputs_stay_out_of_input_directories() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let inbox = dir.path().join("inbox");
        fs::create_dir(&inbox)?;
        fs::write(inbox.join("key.pem"), b"k")?;
        assert_eq!(default_output_dir(&inbox), PathBuf::from("."));
        assert_eq!(default_output_dir(&inbox.join("key.pem")), inbox);
        assert_eq!(default_output_dir(Path::new("key.pem")), PathBuf::from("."));
        Ok(())
    }

    #[test]
    fn png_carries_dpi() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("page.png");
        let img = RgbImage::from_pixel(7, 5, Rgb([255, 0, 255]));
        write_png(&path, &img, 300)?;
        assert!(!tmp_sibling(&path).exists());
        let dec = png::Decoder::new(fs::File::open(&path)?);
        let reader = dec.read_info()?;
        let dims = reader.info().pixel_dims.ok_or_else(|| anyhow::anyhow!("pHYs missing"))?;
        assert_eq!(dims.xppu, 11811);
        assert_eq!(load_image(&path)?, img);
        Ok(())
    }

    #[test]
    fn recovered_file_is_idempotent() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let first = write_recovered(dir.path(), "artifact.bin", b"XYZ")?;
        assert_eq!(first, WriteOutcome::Written(dir.path().join("artifact.bin")));
        let second = write_recovered(dir.path(), "artifact.bin", b"XYZ")?;
        assert_eq!(second, WriteOutcome::Unchanged(dir.path().join("artifact.bin")));
        let third = write_recovered(dir.path(), "artifact.bin", b"XYW")?;
        assert_eq!(third.path(), dir.path().join("artifact.bin.restored"));
        assert_eq!(fs::read(dir.path().join("artifact.bin"))?, b"XYZ");
        assert_eq!(fs::read(third.path())?, b"XYW");
        Ok(())
    }

    #[test]
    fn hostile_names_are_refused() -> anyhow::Result<()> {
        let dir = tempdir()?;
        for name in ["..", ".", "..\\evil", "a\0b"] {
            assert!(matches!(write_recovered(dir.path(), name, b"x"), Err(PaperError::InvalidFileName(_))), "{name:?}");
        }
        assert_eq!(write_recovered(dir.path(), "", b"x")?.path(), dir.path().join(FALLBACK_NAME));
        Ok(())
    }

    #[test]
    fn hex_digest() {
        let h = blake3_hash_bytes(b"");
        assert_eq!(hex32(h), "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262");
    }
}
