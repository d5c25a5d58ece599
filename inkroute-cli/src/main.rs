use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use eyre::{Result, WrapErr};
use inkroute::io::convert::{parse_input, result_to_doc};
use inkroute::output::geometry::generate_geometry;
use inkroute::output::raster::{render_masks, Mask, DEFAULT_DPI};
use inkroute::route::router::Router;
use log::info;

#[derive(Debug, Parser)]
#[clap(name = "inkroute", about = "Single-layer PCB autorouter for conductive-ink fabrication.")]
struct Args {
    /// Input design document (JSON). Pass - to read stdin.
    input: String,

    /// Write the conductor mask (copper = white) as a grayscale PNG.
    #[clap(long, value_name = "PNG")]
    positive: Option<PathBuf>,

    /// Write the void mask (copper = black) as a grayscale PNG.
    #[clap(long, value_name = "PNG")]
    negative: Option<PathBuf>,

    /// Dump the world-space conductor polygons as JSON.
    #[clap(long, value_name = "JSON")]
    geometry: Option<PathBuf>,

    /// Raster resolution for the masks.
    #[clap(long, default_value_t = DEFAULT_DPI)]
    dpi: u32,

    /// Override the rip-up attempt budget from the document.
    #[clap(long)]
    max_attempts: Option<usize>,

    /// Append seeded shuffled net orderings to the attempt list.
    #[clap(long)]
    seed: Option<u64>,
}

fn main() -> Result<ExitCode> {
    pretty_env_logger::init_timed();
    color_eyre::install()?;
    let args = Args::parse();

    let json = if args.input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).wrap_err("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.input).wrap_err_with(|| format!("reading {}", args.input))?
    };

    let (pcb, mut cfg) = parse_input(&json)?;
    if let Some(n) = args.max_attempts {
        cfg.max_ripup_attempts = n;
    }
    if args.seed.is_some() {
        cfg.shuffle_seed = args.seed;
    }

    let mut router = Router::with_config(pcb, cfg);
    let result = router.route();
    info!(
        "routed {} traces, {} failed connections in {} attempts",
        result.traces.len(),
        result.failed.len(),
        router.attempts()
    );

    // Masks and geometry are produced even for failing routings; the
    // conductor mask is then an incomplete but correct subset.
    let board = router.pcb().board();
    let geometry =
        generate_geometry(board, router.pcb().constraints(), &result.traces, router.pads());
    if let Some(path) = &args.geometry {
        std::fs::write(path, serde_json::to_string_pretty(&geometry)?)
            .wrap_err_with(|| format!("writing {}", path.display()))?;
    }
    if args.positive.is_some() || args.negative.is_some() {
        let (positive, negative) = render_masks(&geometry, board.width, board.height, args.dpi);
        if let Some(path) = &args.positive {
            write_png(path, &positive)?;
        }
        if let Some(path) = &args.negative {
            write_png(path, &negative)?;
        }
    }

    // Stdout carries only the result document.
    println!("{}", serde_json::to_string_pretty(&result_to_doc(&result))?);
    Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn write_png(path: &Path, mask: &Mask) -> Result<()> {
    let file = File::create(path).wrap_err_with(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), mask.width as u32, mask.height as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&mask.data)?;
    Ok(())
}
