use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use image::RgbImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use core_catalog::catalog::{write_catalog, CatalogAssembler, DocumentWriter, PdfWriter};
use core_catalog::color::{color_or, BLACK, TICK_GREEN, WHITE};
use core_catalog::export::{export_records, export_samples};
use core_catalog::logging::init_logging;
use core_catalog::render::assets::{resolve_resources_dir, Assets};
use core_catalog::render::scale::{DepthScaleRenderer, ScaleParams};
use core_catalog::render::text::LabelFont;
use core_catalog::{process, CatalogConfig, CatalogResult, ProcessedData};

/// Build core photo catalogs from a drilling log and box photographs
#[derive(Parser, Debug)]
#[command(name = "core-catalog", version, about)]
struct Cli {
    /// Configuration file (JSON); defaults to the user config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with the scale, separator and font assets
    #[arg(long, global = true)]
    resources: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Input files shared by `process` and `catalog`
#[derive(Args, Debug)]
struct Inputs {
    /// Core log spreadsheet (.xlsx, .xls, .ods or .csv)
    #[arg(long)]
    data: PathBuf,

    /// Folder with box photos named <well>_<box>[_uf].<ext>
    #[arg(long)]
    photos: PathBuf,

    /// Laboratory samples sheet
    #[arg(long)]
    samples: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process the inputs and report, optionally exporting tables
    Process {
        #[command(flatten)]
        inputs: Inputs,

        /// Write the processed records to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the merged samples to this CSV file
        #[arg(long)]
        samples_export: Option<PathBuf>,
    },

    /// Process the inputs and write the PDF catalog
    Catalog {
        #[command(flatten)]
        inputs: Inputs,

        /// Output document
        #[arg(long)]
        out: PathBuf,
    },

    /// Render a single depth scale to PNG
    Scale {
        #[arg(long, allow_hyphen_values = true)]
        top: f64,

        #[arg(long, allow_hyphen_values = true)]
        bottom: f64,

        /// Core segments per box (1 or 2)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
        segments: Option<u8>,

        /// Box length (m)
        #[arg(long)]
        box_length: Option<f64>,

        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = CatalogConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if !config.is_default() {
        info!("⚙️  Using custom configuration");
    }

    match cli.command {
        Command::Process {
            inputs,
            export,
            samples_export,
        } => {
            let data = run_pipeline(&config, &inputs)?;
            print_summary(&data);

            if let Some(path) = export {
                export_records(&data.dataset, &path)
                    .with_context(|| format!("Failed to export records to {}", path.display()))?;
            }
            if let Some(path) = samples_export {
                match &data.samples {
                    Some(samples) => export_samples(samples, &path)
                        .with_context(|| format!("Failed to export samples to {}", path.display()))?,
                    None => warn!("⚠️  --samples-export given without --samples, nothing exported"),
                }
            }
        }

        Command::Catalog { inputs, out } => {
            // Assets first: a missing asset must fail before any work is done
            let assets = Assets::from_config(&config, cli.resources.as_deref()).context("Failed to load assets")?;
            let data = run_pipeline(&config, &inputs)?;
            print_summary(&data);

            let writer = PdfWriter::new(config.page, assets.font.clone());
            let out = with_extension(out, writer.extension());

            let mut progress = |fraction: f64| {
                eprint!("\r⏳ Building catalog: {:>3.0}%", fraction * 100.0);
                let _ = std::io::stderr().flush();
            };
            let catalog = CatalogAssembler::new(&config, &assets)
                .assemble(&data.dataset, data.samples.as_ref(), &mut progress)
                .context("Failed to assemble catalog")?;
            eprintln!();

            write_catalog(&catalog, &writer, &out)
                .with_context(|| format!("Failed to write catalog to {}", out.display()))?;
            println!("✅ Catalog with {} boxes saved to {}", catalog.len(), out.display());
        }

        Command::Scale {
            top,
            bottom,
            segments,
            box_length,
            out,
        } => {
            let params = ScaleParams::new(
                top,
                bottom,
                segments.unwrap_or(config.segments_per_box),
                box_length.unwrap_or(config.box_length),
            );
            if !(params.box_length.is_finite() && params.box_length > 0.0) {
                anyhow::bail!("--box-length must be > 0");
            }

            let font = scale_font(&config, cli.resources.as_deref()).context("Failed to load label font")?;
            let renderer = DepthScaleRenderer::new(font.face().clone()).with_colors(
                color_or(&config.palette.tick, TICK_GREEN),
                color_or(&config.palette.label, BLACK),
            );
            let strips = renderer.render(&params);
            side_by_side(&strips)
                .save(&out)
                .with_context(|| format!("Failed to save {}", out.display()))?;
            println!("📏 Depth scale saved to {}", out.display());
        }
    }

    Ok(())
}

fn run_pipeline(config: &CatalogConfig, inputs: &Inputs) -> Result<ProcessedData> {
    process(config, &inputs.data, &inputs.photos, inputs.samples.as_deref())
        .with_context(|| format!("Failed to process {}", inputs.data.display()))
}

fn print_summary(data: &ProcessedData) {
    println!(
        "📊 {} records, {} boxes, {} intervals, {} with photos",
        data.dataset.len(),
        data.dataset.box_ids().len(),
        data.intervals.intervals().len(),
        data.matched_records()
    );
    if let Some(well) = data.dataset.well_label() {
        println!("🪨 Well: {}", well);
    }
    if let Some(samples) = &data.samples {
        println!("🧪 {} samples", samples.len());
    }
    for issue in data.sample_issues() {
        println!("   ⚠️  {}", issue);
    }
}

/// Configured label font from the resource directory, else the bundled face
fn scale_font(config: &CatalogConfig, resources: Option<&Path>) -> CatalogResult<LabelFont> {
    match resolve_resources_dir(resources.or(config.resources_dir.as_deref())) {
        Some(dir) => LabelFont::load_or_bundled(&dir.join(&config.assets.font)),
        None => LabelFont::bundled(),
    }
}

/// Place strips next to each other, 10 px apart
fn side_by_side(strips: &[RgbImage]) -> RgbImage {
    const GAP: u32 = 10;
    let width = strips.iter().map(|s| s.width()).sum::<u32>() + GAP * strips.len().saturating_sub(1) as u32;
    let height = strips.iter().map(|s| s.height()).max().unwrap_or(0);

    let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), WHITE);
    let mut x = 0i64;
    for strip in strips {
        image::imageops::replace(&mut canvas, strip, x, 0);
        x += (strip.width() + GAP) as i64;
    }
    canvas
}

/// Add the writer's extension when the output path has none
fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(extension)
    }
}
