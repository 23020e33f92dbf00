// paperfile: one file in, one printable page out, and back again.
//
//   paperfile encode secret.key -o pages/
//   paperfile crop photo.jpg --corners "112,80 2301,95 2330,3390 90,3371" -o flat.png
//   paperfile decode flat.png -o restored/
//   paperfile decode pages/secret.key.png --rendered -o restored/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::error;

use paperfile::exit_codes::{EXIT_ERROR, EXIT_SUCCESS};
use paperfile::persist::{default_output_dir, load_image, resolve_input, write_png};
use paperfile::{
    decode_file, encode_file, logger, rectify, CornerSession, EncodeOptions, FontLabel, LabelPainter, NoLabel,
    PageSource, PaperConfig, PaperError,
};

#[derive(Debug, Parser)]
#[command(name = "paperfile", version, about = "Print small files as colored block grids and read them back from photos")]
struct Cli {
    /// JSON file with `grid` and `sampling` sections; flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn, error or off
    #[arg(long, global = true, env = logger::LOG_ENV, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a file as a page of colored blocks
    Encode(EncodeArgs),
    /// Recover a file from a page image
    Decode(DecodeArgs),
    /// Rectify a photographed page from its four grid corners
    Crop(CropArgs),
}

#[derive(Debug, Args)]
struct EncodeArgs {
    /// File to encode, or a directory holding exactly one file
    input: PathBuf,
    /// Output directory (defaults beside an input file, or to `.` for an input directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    margin: Option<u32>,
    #[arg(long)]
    block_size: Option<u32>,
    #[arg(long)]
    dpi: Option<u32>,
    /// TrueType font for the page label; without it the page is unlabeled
    #[arg(long)]
    font: Option<PathBuf>,
    /// Skip reading the rendered page back before writing it
    #[arg(long)]
    no_verify: bool,
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Page image, or a directory holding exactly one image
    input: PathBuf,
    /// Output directory (defaults beside an input file, or to `.` for an input directory)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Block columns x rows, e.g. 118x169
    #[arg(long, value_parser = parse_blocks)]
    blocks: Option<(u32, u32)>,
    /// Gaussian blur sigma, 0 to disable
    #[arg(long)]
    blur: Option<f32>,
    /// Color saturation gain, 1 to disable
    #[arg(long)]
    color_gain: Option<f32>,
    /// Grid corners in the photo: "x,y x,y x,y x,y"
    #[arg(long)]
    corners: Option<String>,
    /// Input is an unprinted page straight from `encode`
    #[arg(long, conflicts_with_all = ["corners", "blocks"])]
    rendered: bool,
}

#[derive(Debug, Args)]
struct CropArgs {
    /// Photo of a printed page
    input: PathBuf,
    /// Grid corners in the photo: "x,y x,y x,y x,y"
    #[arg(long)]
    corners: String,
    /// Output PNG (defaults to <input>.crop.png)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_blocks(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| format!("{s:?} is not WxH"))?;
    let w = w.trim().parse().map_err(|_| format!("bad block columns in {s:?}"))?;
    let h = h.trim().parse().map_err(|_| format!("bad block rows in {s:?}"))?;
    Ok((w, h))
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logger::init_with_level(&cli.log_level) {
        eprintln!("{e}");
    }
    let code = match real_main(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("{e:#}");
            e.downcast_ref::<PaperError>().map(PaperError::exit_code).unwrap_or(EXIT_ERROR)
        }
    };
    std::process::exit(code);
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = match &cli.config {
        Some(path) => PaperConfig::load(path).with_context(|| format!("loading {path:?}"))?,
        None => PaperConfig::default(),
    };
    match cli.command {
        Command::Encode(args) => run_encode(args, cfg),
        Command::Decode(args) => run_decode(args, cfg),
        Command::Crop(args) => run_crop(args),
    }
}

fn run_encode(args: EncodeArgs, cfg: PaperConfig) -> Result<()> {
    let mut grid = cfg.grid;
    if let Some(v) = args.width { grid.width = v; }
    if let Some(v) = args.height { grid.height = v; }
    if let Some(v) = args.margin { grid.margin = v; }
    if let Some(v) = args.block_size { grid.block_size = v; }
    if let Some(v) = args.dpi { grid.dpi = v; }

    let input = resolve_input(&args.input)?;
    let out_dir = args.output.unwrap_or_else(|| default_output_dir(&args.input));
    let painter: Box<dyn LabelPainter> = match &args.font {
        Some(font) => Box::new(FontLabel::load(font).with_context(|| format!("loading font {font:?}"))?),
        None => Box::new(NoLabel),
    };
    let opts = EncodeOptions { grid, verify: !args.no_verify };
    encode_file(&input, &out_dir, &opts, painter.as_ref()).with_context(|| format!("encoding {input:?}"))?;
    Ok(())
}

fn run_decode(args: DecodeArgs, cfg: PaperConfig) -> Result<()> {
    let input = resolve_input(&args.input)?;
    let out_dir = args.output.unwrap_or_else(|| default_output_dir(&args.input));
    let source = if args.rendered {
        PageSource::Rendered(cfg.grid)
    } else {
        let mut sampling = cfg.sampling;
        if let Some((w, h)) = args.blocks { sampling.w_blocks = w; sampling.h_blocks = h; }
        if let Some(v) = args.blur { sampling.blur_sigma = v; }
        if let Some(v) = args.color_gain { sampling.color_gain = v; }
        let corners = match &args.corners {
            Some(text) => Some(CornerSession::parse(text)?.confirm()?),
            None => None,
        };
        PageSource::Photo { sampling, corners }
    };
    decode_file(&input, &out_dir, &source).with_context(|| format!("decoding {input:?}"))?;
    Ok(())
}

fn run_crop(args: CropArgs) -> Result<()> {
    let corners = CornerSession::parse(&args.corners)?.confirm()?;
    let img = load_image(&args.input)?;
    let flat = rectify::rectify(&img, corners)?;
    let out = args.output.unwrap_or_else(|| args.input.with_extension("crop.png"));
    write_png(&out, &flat, 0)?;
    log::info!("✔ Page rectified to {}x{} px → {:?}", flat.width(), flat.height(), out);
    Ok(())
}
