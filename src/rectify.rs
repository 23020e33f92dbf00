// ========================= Perspective rectification =========================
//
// The four corners of the block grid are picked by the operator (in the CLI
// they are passed on the command line) and collected in a `CornerSession`.
// The quadrilateral they span is warped onto an axis-aligned canvas whose
// size follows the longer of each pair of opposite edges.

use image::RgbImage;
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use log::debug;

use crate::error::{PaperError, Result};
use crate::palette::BACKGROUND;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }

    fn dist(self, other: Point) -> f32 { ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt() }
}

/// Corner picking state: up to four points, resettable, confirmed once full.
#[derive(Debug, Clone, Default)]
pub struct CornerSession {
    points: Vec<Point>,
}

impl CornerSession {
    pub fn new() -> Self { Self::default() }

    /// Returns `false` (and ignores the point) once four are already placed.
    pub fn add_point(&mut self, x: f32, y: f32) -> bool {
        if self.points.len() == 4 { return false; }
        self.points.push(Point::new(x, y));
        true
    }

    pub fn reset(&mut self) { self.points.clear(); }

    pub fn points(&self) -> &[Point] { &self.points }

    /// Confirming with fewer than four points abandons the selection.
    pub fn confirm(self) -> Result<[Point; 4]> {
        match <[Point; 4]>::try_from(self.points) {
            Ok(corners) => Ok(corners),
            Err(_) => Err(PaperError::UserCancelled),
        }
    }

    /// Fills a session from `"x,y x,y x,y x,y"`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut session = Self::new();
        for pair in text.split_whitespace() {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| PaperError::Config(format!("corner {pair:?} is not x,y")))?;
            let num = |v: &str| v.trim().parse::<f32>().map_err(|_| PaperError::Config(format!("corner {pair:?} is not numeric")));
            if !session.add_point(num(x)?, num(y)?) {
                return Err(PaperError::Config(format!("more than four corners in {text:?}")));
            }
        }
        Ok(session)
    }
}

/// Orders arbitrary corners as top-left, top-right, bottom-right, bottom-left.
pub fn order_corners(points: [Point; 4]) -> [Point; 4] {
    let pick = |key: &dyn Fn(&Point) -> f32, max: bool| {
        let mut best = points[0];
        for p in &points[1..] {
            let better = if max { key(p) > key(&best) } else { key(p) < key(&best) };
            if better { best = *p; }
        }
        best
    };
    let sum = |p: &Point| p.x + p.y;
    let diff = |p: &Point| p.y - p.x;
    [pick(&sum, false), pick(&diff, false), pick(&sum, true), pick(&diff, true)]
}

/// Output size: longest top/bottom edge by longest left/right edge.
pub fn target_size(ordered: &[Point; 4]) -> (u32, u32) {
    let [tl, tr, br, bl] = *ordered;
    let w = (br.dist(bl) as u32).max(tr.dist(tl) as u32);
    let h = (tr.dist(br) as u32).max(tl.dist(bl) as u32);
    (w, h)
}

/// Corners must lie on the photo, edges included.
pub fn rectify(img: &RgbImage, corners: [Point; 4]) -> Result<RgbImage> {
    let (iw, ih) = (img.width() as f32, img.height() as f32);
    if let Some(p) = corners.iter().find(|p| !(p.x >= 0.0 && p.x <= iw && p.y >= 0.0 && p.y <= ih)) {
        return Err(PaperError::InvalidGeometry(format!("corner ({}, {}) lies outside the {iw}x{ih} photo", p.x, p.y)));
    }
    let ordered = order_corners(corners);
    let (w, h) = target_size(&ordered);
    if w < 2 || h < 2 {
        return Err(PaperError::InvalidGeometry(format!("selected corners span only {w}x{h}px")));
    }
    let from = ordered.map(|p| (p.x, p.y));
    let (right, bottom) = ((w - 1) as f32, (h - 1) as f32);
    let to = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
    let projection = Projection::from_control_points(from, to)
        .ok_or_else(|| PaperError::InvalidGeometry("selected corners do not form a quadrilateral".into()))?;
    debug!("rectify: {:?} -> {w}x{h}", from);
    let mut out = RgbImage::from_pixel(w, h, BACKGROUND);
    warp_into(img, &projection, Interpolation::Bilinear, BACKGROUND, &mut out);
    Ok(out)
}
