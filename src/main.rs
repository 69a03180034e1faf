use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdfdeck::panic_handler::initialize_panic_handler;
use pdfdeck::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "pdfdeck", version, about = "PDF slide deck rasterizer and rehearsal tool")]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file
    #[arg(long, global = true, default_value = "pdfdeck.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print page count, aspect ratio, title and video links.
    Info {
        pdf: PathBuf,
    },
    /// Rasterize every page for a window size and write PNGs.
    Render(RenderArgs),
    /// Replay a key script through the slide cursor.
    Rehearse {
        pdf: PathBuf,

        /// Comma-separated steps: f, r, hold-f:SECS, hold-r:SECS, hold-b:SECS, wait:SECS
        #[arg(long)]
        script: String,
    },
}

#[derive(Parser, Debug)]
struct RenderArgs {
    pdf: PathBuf,

    /// Window width in pixels
    #[arg(long)]
    width: u32,

    /// Window height in pixels
    #[arg(long)]
    height: u32,

    /// Output directory
    #[arg(long)]
    out: PathBuf,

    /// Only the first N pages
    #[arg(long)]
    pages: Option<usize>,

    /// Also write the blank slide shown past the end
    #[arg(long, default_value_t = false)]
    end_slide: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?,
    )?;
    initialize_panic_handler();

    info!("Starting pdfdeck {}", env!("CARGO_PKG_VERSION"));
    let settings = Settings::load(cli.config.as_deref());

    let result = run(cli.cmd, &settings);
    if let Err(e) = &result {
        error!("{e:?}");
    }
    info!("Shutting down pdfdeck");
    result
}

#[cfg(not(feature = "pdf"))]
fn run(_cmd: Command, _settings: &Settings) -> Result<()> {
    anyhow::bail!("pdfdeck was built without the `pdf` feature")
}

#[cfg(feature = "pdf")]
fn run(cmd: Command, settings: &Settings) -> Result<()> {
    match cmd {
        Command::Info { pdf } => commands::info(&pdf, settings),
        Command::Render(args) => commands::render(args, settings),
        Command::Rehearse { pdf, script } => commands::rehearse(&pdf, &script, settings),
    }
}

#[cfg(feature = "pdf")]
mod commands {
    use std::path::Path;
    use std::time::{Duration, Instant};

    use anyhow::{Context, Result, bail};
    use log::info;

    use pdfdeck::deck::{HeldKeys, NavKey};
    use pdfdeck::inputs::{Cursor, KeyScript};
    use pdfdeck::raster::{
        DocumentSource, MupdfDocument, RasterConfig, Rasterizer, raster_size_for_window,
    };
    use pdfdeck::settings::Settings;

    use super::RenderArgs;

    const RENDER_POLL: Duration = Duration::from_millis(5);

    fn open(path: &Path, config: &RasterConfig) -> Result<MupdfDocument> {
        MupdfDocument::open(path, config.page_limit, config.render_threads)
            .with_context(|| format!("opening {}", path.display()))
    }

    pub fn info(pdf: &Path, settings: &Settings) -> Result<()> {
        let doc = open(pdf, &settings.raster_config(None))?;
        let info = doc.info();
        println!("file:   {}", info.path.display());
        println!("title:  {}", info.title.as_deref().unwrap_or("-"));
        println!("pages:  {}", info.page_count);
        println!("aspect: {:.4}", info.aspect);
        for link in &info.video_links {
            println!("video:  page {} -> {}", link.page + 1, link.path.display());
        }
        Ok(())
    }

    pub fn render(args: RenderArgs, settings: &Settings) -> Result<()> {
        let config = settings.raster_config(args.pages);
        let doc = open(&args.pdf, &config)?;
        let mut raster = Rasterizer::with_source(doc, &config)?;

        let size = raster_size_for_window(raster.aspect(), args.width, args.height);
        if size.width == 0 || size.height == 0 {
            bail!("window {}x{} is too small to render into", args.width, args.height);
        }
        info!("rendering {} at {size}", args.pdf.display());

        let started = Instant::now();
        raster.request_size(size);
        while raster.current_size() != Some(size) {
            if !raster
                .poll()
                .with_context(|| format!("rasterizing {}", args.pdf.display()))?
            {
                std::thread::sleep(RENDER_POLL);
            }
        }
        println!(
            "rendered {} pages at {size} in {:.2} sec.",
            raster.page_count(),
            started.elapsed().as_secs_f64()
        );

        std::fs::create_dir_all(&args.out)
            .with_context(|| format!("creating {}", args.out.display()))?;
        let count = raster.page_count() + usize::from(args.end_slide);
        for index in 0..count {
            let Some(page) = raster.peek(index) else {
                bail!("page {} missing from finished render", index + 1);
            };
            let file = args.out.join(format!("page-{:03}.png", index + 1));
            page.to_rgb_image()?
                .save(&file)
                .with_context(|| format!("writing {}", file.display()))?;
        }
        println!("wrote {count} files to {}", args.out.display());

        raster.shutdown();
        Ok(())
    }

    pub fn rehearse(pdf: &Path, script: &str, settings: &Settings) -> Result<()> {
        let script: KeyScript = script.parse().context("parsing key script")?;
        let doc = open(pdf, &settings.raster_config(None))?;
        let slides = doc.info().page_count;

        let mut cursor = Cursor::with_timing(slides, settings.repeat_timing(), settings.dissolve());
        let mut ticker = settings.ticker();
        let mut keys = HeldKeys::default();
        let frame = settings.fast_tick();

        println!("{slides} slides, frame {:.1} ms", frame.as_secs_f64() * 1e3);
        for (n, step) in script.steps().iter().enumerate() {
            for (dt, reverse, forward) in step.frames(frame) {
                if forward && !keys.forward() || reverse && !keys.reverse() {
                    ticker.on_nav_press();
                }
                set_held(&mut keys, NavKey::Right, forward);
                set_held(&mut keys, NavKey::Left, reverse);
                ticker.tick(&mut cursor, dt, &keys);
            }
            println!(
                "step {:>3}: slide {:>3}/{slides}  blend {:.2}  tick {:.1} ms",
                n + 1,
                cursor.position() + 1,
                cursor.blend(),
                ticker.interval().as_secs_f64() * 1e3
            );
        }
        Ok(())
    }

    fn set_held(keys: &mut HeldKeys, key: NavKey, down: bool) {
        if down {
            keys.press(key);
        } else {
            keys.release(key);
        }
    }
}
