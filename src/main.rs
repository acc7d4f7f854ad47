use clap::Parser;
use emscalebar::config::{DEFAULT_MAX_SIZE, DEFAULT_QUALITY, RunConfig};
use emscalebar::imaging::Quality;
use emscalebar::{batch, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emscalebar")]
#[command(about = "Convert MRC images to JPEG previews with a scale bar")]
#[command(long_about = "\
Convert MRC images to JPEG previews with a scale bar

Each input is contrast enhanced (CLAHE), shrunk so its longer edge is at most
--maxsize pixels, and annotated in the lower-right corner with a black and
white scale bar showing a round physical length.

Outputs are written to --outputdir:

  image.mrc        → image.mrc.jpg
  stack.mrcs (3D)  → stack.mrcs_section0.jpg, stack.mrcs_section1.jpg, ...

Missing or unreadable inputs are skipped with a message; the rest of the
batch still runs. Set RUST_LOG=emscalebar=debug for more detail.")]
#[command(version)]
struct Cli {
    /// MRC files to convert
    #[arg(value_name = "MRCFILES", required = true, num_args = 1..)]
    mrcfiles: Vec<PathBuf>,

    /// Existing directory to write JPEG files into
    #[arg(long, default_value_os_t = default_output_dir())]
    outputdir: PathBuf,

    /// Longest output edge in pixels; larger images are shrunk to fit
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    maxsize: u32,

    /// Number of parallel workers (default: all cores)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    numprocs: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// TrueType/OpenType font for scale bar labels (default: a system sans-serif)
    #[arg(long)]
    font: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            output_dir: self.outputdir.clone(),
            max_size: self.maxsize,
            num_procs: self.numprocs.map(|n| n as usize),
            quality: Quality::new(self.quality),
            font: self.font.clone(),
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("emscalebar=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = cli.run_config();

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });

    let result = batch::run(&cli.mrcfiles, &config, Some(tx));
    // The sender is dropped by now either way, so the printer drains and exits
    if printer.join().is_err() {
        eprintln!("progress printer terminated unexpectedly");
    }

    match result {
        Ok(report) => {
            output::print_summary(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
