use clap::{Parser, Subcommand};
use fitprint::config::{self, CONFIG_FILE_NAME, Overrides};
use fitprint::imaging::{self, CodecSupport};
use fitprint::output;
use fitprint::process::{BatchDriver, BatchJob, ConvertSettings, DEFAULT_DEST_DIR, ProcessEvent};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fitprint")]
#[command(about = "Batch letterbox photos onto 10x15 cm print canvases")]
#[command(long_about = "\
Batch letterbox photos onto 10x15 cm (4x6 in) print canvases

Every photo under SOURCE is turned upright, scaled to fit entirely inside a
15x10 cm (landscape) or 10x15 cm (portrait) canvas, centered, and padded
with a solid background. Nothing is cropped.

  SOURCE/
  ├── fitprint.toml                # Optional config (see gen-config)
  ├── beach.jpg                    # 4000x3000  → beach_10x15.jpg, 1772x1181 @ 300 dpi
  ├── trip/
  │   └── IMG_0042.png             # 3000x4000  → IMG_0042_10x15.jpg, 1181x1772
  └── output_10x15_jpg/            # Default destination, skipped when scanning

Existing files are never overwritten: a second run writes beach_10x15_1.jpg.
HEIC/HEIF files are listed as skipped when no decoder is available.

Run 'fitprint gen-config' to generate a documented fitprint.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every photo in a folder into a print-ready JPEG
    Convert(ConvertArgs),
    /// List supported input formats and optional decoder availability
    Formats,
    /// Print a stock fitprint.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Folder to read photos from (searched recursively)
    source: PathBuf,

    /// Output folder [default: SOURCE/output_10x15_jpg]
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Print resolution, 72-1200 [default: 300]
    #[arg(long)]
    dpi: Option<u32>,

    /// JPEG quality, 1-100 [default: 95]
    #[arg(long)]
    quality: Option<u32>,

    /// Letterbox color as #rrggbb [default: #ffffff]
    #[arg(long)]
    background: Option<String>,

    /// Config file [default: SOURCE/fitprint.toml if present]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final report as JSON; progress goes to stderr
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => convert(args)?,
        Command::Formats => {
            output::print_formats(imaging::supported_input_extensions(), CodecSupport::detect());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn convert(args: ConvertArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config_path, required) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (args.source.join(CONFIG_FILE_NAME), false),
    };
    let overrides = Overrides {
        dpi: args.dpi,
        quality: args.quality,
        background: args.background.clone(),
    };
    let cfg = config::load_layered(&config_path, required, &overrides)?;

    let settings = ConvertSettings::from_config(&cfg, CodecSupport::detect());
    let job = BatchJob {
        dest_dir: args
            .dest
            .clone()
            .unwrap_or_else(|| args.source.join(DEFAULT_DEST_DIR)),
        source_dir: args.source,
        dpi: cfg.dpi,
    };

    let json = args.json;
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            // In JSON mode the report replaces the summary line
            if json && matches!(event, ProcessEvent::Finished { .. }) {
                continue;
            }
            for line in output::format_process_event(&event) {
                if json {
                    eprintln!("{}", line);
                } else {
                    println!("{}", line);
                }
            }
        }
    });

    let driver = BatchDriver::with_settings(settings);
    let started = driver.start(job, Some(tx));
    let finished = driver.wait();
    printer.join().map_err(|_| "output thread panicked")?;
    started?;

    if let Some(result) = finished {
        let result = result?;
        if json {
            println!("{}", output::format_result_json(&result)?);
        }
    }
    Ok(())
}
