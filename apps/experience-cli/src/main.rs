use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use experience_assets::{AssetLoader, Manifest};
use experience_core::{ExperienceConfig, ExperienceContext, HostEvent};
use experience_host::HeadlessHost;
use experience_render::DebugTextRenderer;
use experience_tools::{DEBUG_HASH, SceneInspector};
use tracing_subscriber::EnvFilter;

/// Simulated frame interval for headless runs.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// How long a headless run waits for resources before giving up.
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "experience-cli", about = "CLI tool for experience operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Check a manifest and the files it names
    Validate {
        /// Resource manifest (.json or .yaml)
        #[arg(short, long)]
        manifest: PathBuf,
        /// Directory manifest paths are relative to (default: the manifest's directory)
        #[arg(short, long)]
        assets: Option<PathBuf>,
    },
    /// Load a manifest and run the experience without a window
    Run {
        /// Resource manifest (.json or .yaml)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Experience config file (.json or .yaml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory manifest paths are relative to
        #[arg(short, long)]
        assets: Option<PathBuf>,
        /// Number of frames to simulate after loading
        #[arg(short, long, default_value = "3")]
        frames: u32,
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Location hash; `#debug` enables the debug panel
        #[arg(long)]
        hash: Option<String>,
        /// Enable the debug panel
        #[arg(long)]
        debug: bool,
    },
}

fn asset_root(manifest: &Path, assets: Option<PathBuf>) -> PathBuf {
    assets.unwrap_or_else(|| {
        manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

fn validate(manifest_path: &Path, assets: Option<PathBuf>) -> anyhow::Result<()> {
    let manifest = Manifest::load(manifest_path)
        .with_context(|| format!("loading {}", manifest_path.display()))?;
    let root = asset_root(manifest_path, assets);
    println!(
        "Manifest: {} ({} resources, root {})",
        manifest_path.display(),
        manifest.len(),
        root.display()
    );

    let mut missing = 0;
    for descriptor in manifest.iter() {
        let status = if descriptor.kind.is_recognized() {
            "ok"
        } else {
            "skipped (unrecognized kind)"
        };
        println!("  {} [{}] {}", descriptor.name, descriptor.kind, status);
        for path in descriptor.resolve(&root) {
            let exists = path.is_file();
            if !exists {
                missing += 1;
            }
            println!(
                "    {} {}",
                if exists { "found  " } else { "MISSING" },
                path.display()
            );
        }
    }
    if missing > 0 {
        bail!("{missing} file(s) missing");
    }
    println!("Valid: OK");
    Ok(())
}

/// One-line load tally. Skipped unknown kinds count as loaded.
fn load_summary(resources: &AssetLoader) -> String {
    let report = resources.report();
    format!(
        "Loaded {}/{} (skipped {}, failed {})",
        resources.loaded(),
        resources.to_load(),
        report.skipped.len(),
        report.failed.len()
    )
}

struct RunArgs {
    manifest: Option<PathBuf>,
    config: Option<PathBuf>,
    assets: Option<PathBuf>,
    frames: u32,
    width: u32,
    height: u32,
    hash: Option<String>,
    debug: bool,
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ExperienceConfig::load(path)?,
        None => ExperienceConfig::default(),
    };
    if let Some(path) = &args.manifest {
        config.manifest =
            Manifest::load(path).with_context(|| format!("loading {}", path.display()))?;
        config.asset_root = asset_root(path, args.assets.clone());
    } else if let Some(dir) = args.assets {
        config.asset_root = dir;
    }
    if let Some(hash) = args.hash {
        config.location_hash = hash;
    }
    if args.debug {
        config.location_hash = DEBUG_HASH.to_string();
    }

    let host = HeadlessHost::new(args.width, args.height);
    let mut context = ExperienceContext::headless();
    let experience = context.get_or_create(&host, &config)?;

    let deadline = Instant::now() + LOAD_TIMEOUT;
    loop {
        let mut exp = experience.borrow_mut();
        exp.handle(&host, HostEvent::Idle)?;
        if exp.world().builds() > 0 {
            break;
        }
        if Instant::now() >= deadline {
            bail!(
                "timed out after {:?} with {}/{} resources resolved",
                LOAD_TIMEOUT,
                exp.resources().resolved(),
                exp.resources().to_load()
            );
        }
        drop(exp);
        std::thread::sleep(Duration::from_millis(5));
    }

    for _ in 0..args.frames {
        host.advance(FRAME_INTERVAL);
        experience
            .borrow_mut()
            .handle(&host, HostEvent::AnimationFrame)?;
    }

    {
        let exp = experience.borrow();
        println!("{}", load_summary(exp.resources()));
        for failure in exp.load_failures() {
            println!("  failed: {} ({})", failure.name, failure.reason);
        }
        for name in exp.resources().items().names() {
            if let Some(asset) = exp.resources().get(name) {
                println!("  {name}: {}", asset.kind_name());
            }
        }
        println!("{}", SceneInspector::summary(exp.scene()));
        println!(
            "Frames: {} rendered, {:.1} fps simulated",
            exp.renderer().frames(),
            exp.ticker().history().fps()
        );
        print!(
            "{}",
            DebugTextRenderer::describe(exp.scene(), &exp.camera().view())
        );
    }

    context.destroy();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("experience-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", experience_common::crate_info());
            println!("notify: {}", experience_notify::crate_info());
            println!("host: {}", experience_host::crate_info());
            println!("scene: {}", experience_scene::crate_info());
            println!("assets: {}", experience_assets::crate_info());
            println!("render: {}", experience_render::crate_info());
            println!("tools: {}", experience_tools::crate_info());
            println!("core: {}", experience_core::crate_info());
        }
        Commands::Validate { manifest, assets } => validate(&manifest, assets)?,
        Commands::Run {
            manifest,
            config,
            assets,
            frames,
            width,
            height,
            hash,
            debug,
        } => run(RunArgs {
            manifest,
            config,
            assets,
            frames,
            width,
            height,
            hash,
            debug,
        })?,
    }

    Ok(())
}
