use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::{Command, Stdio};

const PKG_DIR: &str = "extension/static/pkg";
const WASM_TARGET: &str = "wasm32-unknown-unknown";
const SCRIPT_BINS: &[&str] = &["background", "contentscript"];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Keylock autofill task runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build popup, background and content script into extension/static/pkg
    Build {
        /// Debug build (faster, larger)
        #[arg(long)]
        dev: bool,
    },

    /// Run tests
    Test {
        #[command(subcommand)]
        test_type: Option<TestType>,
    },

    /// Run clippy linter
    Clippy,

    /// Remove build output
    Clean,
}

#[derive(Subcommand)]
enum TestType {
    /// Protocol and state tests (native)
    Core,

    /// Run all Rust tests
    Unit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { dev } => build(dev),
        Commands::Test { test_type } => test(test_type),
        Commands::Clippy => clippy(),
        Commands::Clean => clean(),
    }
}

fn build(dev: bool) -> Result<()> {
    let profile = if dev { "debug" } else { "release" };

    println!("🔨 Building popup ({})...", profile);
    let mut popup_args = vec!["build", "extension", "--target", "web", "--out-dir", "static/pkg"];
    if dev {
        popup_args.push("--dev");
    }
    run_cmd("wasm-pack", &popup_args)?;

    println!("🔨 Building background and content script ({})...", profile);
    let mut cargo_args = vec![
        "build",
        "-p",
        "keylock-extension",
        "--bins",
        "--no-default-features",
        "--target",
        WASM_TARGET,
    ];
    if !dev {
        cargo_args.push("--release");
    }
    run_cmd("cargo", &cargo_args)?;

    for bin in SCRIPT_BINS {
        let wasm = format!("target/{}/{}/{}.wasm", WASM_TARGET, profile, bin);
        println!("📦 Generating bindings for {}...", bin);
        run_cmd(
            "wasm-bindgen",
            &["--target", "no-modules", "--out-dir", PKG_DIR, wasm.as_str()],
        )?;
    }

    println!("\n✅ Extension built in {}", PKG_DIR);
    Ok(())
}

fn test(test_type: Option<TestType>) -> Result<()> {
    match test_type {
        Some(TestType::Core) => {
            println!("🧪 Running autofill-core tests...");
            run_cmd("cargo", &["test", "-p", "autofill-core"])?;
        }
        Some(TestType::Unit) | None => {
            println!("🧪 Running all tests...");
            run_cmd("cargo", &["test", "--workspace"])?;
        }
    }
    Ok(())
}

fn clippy() -> Result<()> {
    println!("🔍 Running clippy on workspace (warnings as errors)...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    Ok(())
}

fn clean() -> Result<()> {
    println!("🧹 Removing generated bindings...");
    if let Err(e) = std::fs::remove_dir_all(PKG_DIR) {
        if e.kind() != std::io::ErrorKind::NotFound {
            return Err(e).context(format!("Failed to remove {}", PKG_DIR));
        }
    }

    run_cmd("cargo", &["clean"])?;
    Ok(())
}

// Helper functions
fn run_cmd(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to run: {} {}", program, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", program, args.join(" "));
    }

    Ok(())
}
