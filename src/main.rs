//! Digit OCR command line tool
//!
//! Recognizes digit strings in images, inspects segmentation, and processes
//! whole folders of screenshots into a CSV file.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use digit_ocr::config::{get_config, init_config, load_config};
use digit_ocr::ocr::{crop_region, filter_color_range};
use digit_ocr::worker::{collect_images, run_batch};
use digit_ocr::{
    classifier, extract_symbols, load_image, log, paths, recognize_with_handle, Region,
};

#[derive(Parser, Debug)]
#[command(name = "digit-ocr", version, about = "Reads digit strings from screenshots")]
struct Cli {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the digits in one image
    Recognize {
        image: PathBuf,
        #[command(flatten)]
        region: RegionArgs,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Save the color-filtered mask as a black/white image
        #[arg(long)]
        save_mask: Option<PathBuf>,
        /// Classifier artifact (overrides model_path)
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// List the connected components found in one image
    Segment {
        image: PathBuf,
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Recognize many images in parallel and append the results to a CSV
    Batch {
        /// Image files or directories of images
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// CSV file to append results to
        #[arg(long)]
        csv: PathBuf,
        /// Worker threads (defaults to worker_threads from config)
        #[arg(long)]
        threads: Option<usize>,
        /// Classifier artifact (overrides model_path)
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RegionArgs {
    /// Crop to left,top,width,height before recognizing
    #[arg(long, conflicts_with = "region_file")]
    region: Option<Region>,
    /// Read the crop region from a file containing left,top,width,height
    #[arg(long)]
    region_file: Option<PathBuf>,
}

impl RegionArgs {
    fn resolve(&self) -> Result<Option<Region>> {
        if let Some(region) = self.region {
            return Ok(Some(region));
        }
        let Some(path) = &self.region_file else {
            return Ok(None);
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read region file {}", path.display()))?;
        Ok(Some(Region::parse(&contents)?))
    }
}

/// Loads `path` and crops it to the requested region, if any.
fn load_input(path: &Path, region: &RegionArgs) -> Result<image::RgbImage> {
    let img = load_image(path)?;
    match region.resolve()? {
        Some(region) => {
            log(&format!(
                "Cropping to {}x{} at ({}, {})",
                region.width, region.height, region.left, region.top
            ));
            Ok(crop_region(&img, &region)?)
        }
        None => Ok(img),
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprint!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("digit_ocr.log");
        if let Ok(mut file) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            use std::io::Write;
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    let cli = Cli::parse();

    // Ensure output directories exist
    paths::ensure_directories()?;

    init_config(load_config(cli.config.as_deref())?);

    match cli.command {
        Command::Recognize {
            image,
            region,
            output,
            json,
            save_mask,
            model,
        } => run_recognize(&image, &region, output, json, save_mask, model),
        Command::Segment { image, region } => run_segment(&image, &region),
        Command::Batch {
            inputs,
            csv,
            threads,
            model,
        } => run_batch_command(&inputs, &csv, threads, model),
    }
}

/// Opens and loads the classifier, honoring a `--model` override.
fn load_model(model: Option<PathBuf>) -> Result<classifier::ModelHandle> {
    let mut config = get_config().clone();
    if model.is_some() {
        config.model_path = model;
    }
    let handle = classifier::open_model(&config)?;
    handle.load()?;
    Ok(handle)
}

fn run_recognize(
    image: &Path,
    region: &RegionArgs,
    output: Option<PathBuf>,
    json: bool,
    save_mask: Option<PathBuf>,
    model: Option<PathBuf>,
) -> Result<()> {
    let config = get_config();
    let img = load_input(image, region)?;

    if let Some(mask_path) = &save_mask {
        filter_color_range(&img, &config.color_range)
            .to_luma()
            .save(mask_path)
            .with_context(|| format!("Failed to save mask to {}", mask_path.display()))?;
        log(&format!("Mask saved: {}", mask_path.display()));
    }

    let handle = load_model(model)?;
    let result = recognize_with_handle(&img, &handle, &config.options())?;

    let rendered = if json {
        serde_json::to_string_pretty(&result)?
    } else {
        result.text.clone()
    };

    match output {
        Some(path) => {
            fs::write(&path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log(&format!("Result written to {}", path.display()));
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn run_segment(image: &Path, region: &RegionArgs) -> Result<()> {
    let config = get_config();
    let img = load_input(image, region)?;
    let shape = config.glyph_shape();

    let symbols = extract_symbols(&img, &config.color_range);
    log(&format!("Found {} components", symbols.len()));

    for (i, symbol) in symbols.iter().enumerate() {
        let b = &symbol.bbox;
        println!(
            "{:>3}  left={:<5} top={:<5} {}x{}  pixels={}{}",
            i,
            b.left,
            b.top,
            b.width,
            b.height,
            symbol.bitmap.count_on(),
            if shape.fits(&symbol.bitmap) {
                ""
            } else {
                "  (exceeds glyph shape)"
            }
        );
    }

    Ok(())
}

fn run_batch_command(
    inputs: &[PathBuf],
    csv: &Path,
    threads: Option<usize>,
    model: Option<PathBuf>,
) -> Result<()> {
    let config = get_config();
    let images = collect_images(inputs)?;
    let handle = load_model(model)?;
    let forest = handle.get()?;
    let threads = threads.unwrap_or_else(|| config.effective_worker_threads());

    let summary = run_batch(images, forest, config.options(), threads, csv)?;

    println!(
        "{} images processed, {} failed -> {}",
        summary.processed,
        summary.failed,
        csv.display()
    );

    if summary.failed > 0 && summary.failed == summary.processed {
        return Err(anyhow!("Every image failed; see {}", csv.display()));
    }
    Ok(())
}
