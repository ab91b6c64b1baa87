use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for experience")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and a headless smoke run
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Run the CLI headless for a few frames
    Smoke {
        /// Manifest to load; an empty experience when omitted
        #[arg(long)]
        manifest: Option<PathBuf>,
        #[arg(long, default_value = "10")]
        frames: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            smoke(None, 3)?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => cargo("cargo doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Smoke { manifest, frames } => smoke(manifest, frames)?,
    }

    Ok(())
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> Running {step}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("{step} failed");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo("cargo fmt --check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "cargo clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("cargo test", &["test", "--workspace"])
}

fn smoke(manifest: Option<PathBuf>, frames: u32) -> Result<()> {
    let frames = frames.to_string();
    let mut args: Vec<&str> = vec![
        "run",
        "-p",
        "experience-cli",
        "--",
        "run",
        "--frames",
        frames.as_str(),
    ];
    let manifest = manifest.map(|p| p.display().to_string());
    if let Some(path) = &manifest {
        args.push("--manifest");
        args.push(path);
    }
    cargo("headless smoke run", &args)
}
