//! paperfile: print a small file as a page of colored blocks, and read it
//! back from a photo of that page.
//!
//! A file becomes `name/bytes`, is zlib-compressed, split into octal digits and
//! drawn as one colored block per digit behind a fixed `01234567` calibration
//! row. Reading a page samples every block center, learns the eight inks from
//! the calibration row, classifies the rest by nearest color and inflates the
//! digits until the zlib stream says it is done.
//!
//! ```no_run
//! use std::path::Path;
//! use paperfile::{decode_file, encode_file, EncodeOptions, NoLabel, PageSource, SamplingConfig};
//!
//! # fn main() -> paperfile::Result<()> {
//! let png = encode_file(Path::new("id_ed25519"), Path::new("out"), &EncodeOptions::default(), &NoLabel)?;
//! // ... print, photograph, crop to the grid ...
//! let source = PageSource::Photo { sampling: SamplingConfig::default(), corners: None };
//! decode_file(&png, Path::new("restored"), &source)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code, rust_2018_idioms)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

// Stage logging: ▶ when a stage starts, ✔ when it is done
macro_rules! step { ($($arg:tt)*) => { ::log::info!("▶ {}", format_args!($($arg)*)) }; }
macro_rules! ok   { ($($arg:tt)*) => { ::log::info!("✔ {}", format_args!($($arg)*)) }; }

pub mod compress;
pub mod config;
pub mod decode;
pub mod encode;
pub mod enhance;
pub mod error;
pub mod exit_codes;
pub mod frame;
pub mod label;
pub mod layout;
pub mod logger;
pub mod palette;
pub mod persist;
pub mod rectify;
pub mod symbol;

pub use config::{GridConfig, PaperConfig, SamplingConfig};
pub use decode::{decode_file, decode_image, decode_photo, decode_rendered, PageSource, RecoveredFile};
pub use encode::{encode_bytes, encode_file, EncodeOptions, EncodedPage};
pub use error::{PaperError, Result};
pub use label::{FontLabel, LabelPainter, NoLabel, PageLabel};
pub use layout::GridPlan;
pub use persist::WriteOutcome;
pub use rectify::{CornerSession, Point};
