use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "fractale", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the raster as ASCII art (`*` bounded, `.` borderline, space divergent).
    Ascii(AsciiArgs),
    /// Write the raster as a grayscale PNG.
    Png(PngArgs),
    /// Render a zoom animation toward a fixed point and encode it as MP4 (needs `ffmpeg`).
    Zoom(ZoomArgs),
    /// Execute a JSON job file.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct AsciiArgs {
    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Sequential)]
    backend: BackendChoice,

    /// Columns.
    #[arg(long, default_value_t = 192)]
    width: u32,

    /// Rows.
    #[arg(long, default_value_t = 64)]
    height: u32,

    /// Viewport corners as `x1,y1,x2,y2` (top-left, bottom-right).
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [-2.0f32, 1.0, 2.0, -1.0]
    )]
    viewport: Vec<f32>,

    /// Worker threads for the threaded backend.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PngArgs {
    /// Output PNG path. Defaults to `render<unix-seconds>.png` in the working directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Sequential)]
    backend: BackendChoice,

    /// Image width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Center of the image as `re,im`.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [0.0f32, 0.0]
    )]
    center: Vec<f32>,

    /// Width of the viewport along the real axis.
    #[arg(long, default_value_t = 4.0)]
    scale: f32,

    /// Worker threads for the threaded backend.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct ZoomArgs {
    /// Output MP4 path.
    #[arg(long, default_value = "zoom.mp4")]
    out: PathBuf,

    /// Backend to use.
    #[arg(long, value_enum, default_value_t = BackendChoice::Sequential)]
    backend: BackendChoice,

    /// Frame width in pixels (even).
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Frame height in pixels (even).
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Zoom target as `re,im`.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [-0.403f32, 0.595]
    )]
    center: Vec<f32>,

    /// Real-axis extent before the first frame.
    #[arg(long, default_value_t = 4.0)]
    start_width: f32,

    /// Fraction of the width removed per frame.
    #[arg(long, default_value_t = 0.03)]
    shrink: f32,

    #[arg(long, default_value_t = 400)]
    frames: u32,

    #[arg(long, default_value_t = 20)]
    fps: u32,

    /// Worker threads for the threaded backend.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input job JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendChoice {
    Sequential,
    Threaded,
    Accelerator,
}

impl From<BackendChoice> for fractale::BackendKind {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Sequential => fractale::BackendKind::Sequential,
            BackendChoice::Threaded => fractale::BackendKind::Threaded,
            BackendChoice::Accelerator => fractale::BackendKind::Accelerator,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Ascii(args) => cmd_ascii(args),
        Command::Png(args) => cmd_png(args),
        Command::Zoom(args) => cmd_zoom(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn make_backend(
    kind: fractale::BackendKind,
    settings: &fractale::BackendSettings,
) -> anyhow::Result<Box<dyn fractale::DrawBackend>> {
    match fractale::create_backend(kind, settings) {
        Ok(b) => Ok(b),
        // Nothing useful can run without the device: stop with the full diagnostic.
        Err(e @ fractale::FractaleError::DeviceInit(_)) => {
            Err(e).context("accelerator initialization failed")
        }
        Err(e) => Err(e.into()),
    }
}

fn render(
    kind: fractale::BackendKind,
    settings: &fractale::BackendSettings,
    dims: fractale::Dimensions,
    viewport: &fractale::Viewport,
) -> anyhow::Result<fractale::Raster> {
    let mut backend = make_backend(kind, settings)?;
    let started = std::time::Instant::now();
    let raster = backend
        .render(dims, viewport)
        .with_context(|| format!("{} draw failed", backend.name()))?;
    tracing::info!(
        backend = backend.name(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "draw done"
    );
    Ok(raster)
}

fn cmd_ascii(args: AsciiArgs) -> anyhow::Result<()> {
    let [x1, y1, x2, y2] = <[f32; 4]>::try_from(args.viewport.as_slice())
        .map_err(|_| anyhow::anyhow!("--viewport takes exactly four values: x1,y1,x2,y2"))?;
    let dims = fractale::Dimensions::new(args.width, args.height)?;
    let viewport = fractale::Viewport::new(
        fractale::PlanePoint::new(x1, y1),
        fractale::PlanePoint::new(x2, y2),
    )?;
    let settings = fractale::BackendSettings {
        threads: args.threads,
        ..Default::default()
    };

    let raster = render(args.backend.into(), &settings, dims, &viewport)?;
    print!("{}", fractale::raster_to_ascii(&raster));
    Ok(())
}

fn cmd_png(args: PngArgs) -> anyhow::Result<()> {
    let [re, im] = <[f32; 2]>::try_from(args.center.as_slice())
        .map_err(|_| anyhow::anyhow!("--center takes exactly two values: re,im"))?;
    let dims = fractale::Dimensions::new(args.width, args.height)?;
    let viewport =
        fractale::Viewport::centered(fractale::PlanePoint::new(re, im), args.scale, dims)?;
    let settings = fractale::BackendSettings {
        threads: args.threads,
        ..Default::default()
    };

    let out = args.out.unwrap_or_else(default_png_path);
    let raster = render(args.backend.into(), &settings, dims, &viewport)?;
    fractale::write_png(&out, &raster)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn default_png_path() -> PathBuf {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("render{secs}.png"))
}

fn cmd_zoom(args: ZoomArgs) -> anyhow::Result<()> {
    let [re, im] = <[f32; 2]>::try_from(args.center.as_slice())
        .map_err(|_| anyhow::anyhow!("--center takes exactly two values: re,im"))?;
    let spec = fractale::ZoomSpec {
        center: fractale::PlanePoint::new(re, im),
        start_width: args.start_width,
        shrink: args.shrink,
        frames: args.frames,
        fps: args.fps,
        dims: fractale::Dimensions::new(args.width, args.height)?,
    };
    let settings = fractale::BackendSettings {
        threads: args.threads,
        ..Default::default()
    };

    let mut backend = make_backend(args.backend.into(), &settings)?;
    let started = std::time::Instant::now();
    fractale::render_zoom(backend.as_mut(), &spec, &args.out)
        .with_context(|| format!("zoom '{}' failed", args.out.display()))?;
    tracing::info!(
        frames = spec.frames,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "zoom done"
    );
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let job = fractale::JobConfig::from_path(&args.in_path)
        .with_context(|| format!("load job '{}'", args.in_path.display()))?;
    let dims = job.dimensions()?;
    let viewport = job.viewport(dims)?;

    let raster = render(job.backend, &job.backend_settings(), dims, &viewport)?;
    match &job.output {
        fractale::OutputSpec::Ascii => print!("{}", fractale::raster_to_ascii(&raster)),
        fractale::OutputSpec::Png { path } => {
            fractale::write_png(path, &raster)?;
            eprintln!("wrote {}", path.display());
        }
    }
    Ok(())
}
