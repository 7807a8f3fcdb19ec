use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lambda_packager::archive::list_entries;
use lambda_packager::error::PackageError;
use lambda_packager::installer::{PipInstaller, DEFAULT_PYTHON};
use lambda_packager::logging::{init_global_subscriber, LogArgs};
use lambda_packager::packager::{build_report, clean_previous_run, Packager};
use lambda_packager_core::layout::{
    PackageLayout, DEFAULT_ARCHIVE_FILE, DEFAULT_MANIFEST_FILE, DEFAULT_SOURCE_EXTENSION,
    DEFAULT_STAGING_DIR,
};
use lambda_packager_core::report::report_json;
use lambda_packager_core::runtime::{Architecture, TargetRuntime, DEFAULT_RUNTIME};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "lambda-packager",
    about = "Build the deployment archive for a Python serverless function",
    long_about = "Installs the manifest's dependencies into a staging directory, zips them,\n\
                  appends the top-level source files, and removes the staging directory."
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the deployment archive
    Build {
        #[command(flatten)]
        layout: LayoutArgs,
        /// Target runtime identifier; steers dependency resolution only
        #[arg(long, default_value = DEFAULT_RUNTIME)]
        runtime: String,
        /// Target instruction set architecture
        #[arg(value_enum, long, default_value_t = ArchitectureArg::X86_64)]
        architecture: ArchitectureArg,
        /// Python interpreter used to run pip
        #[arg(long, default_value = DEFAULT_PYTHON)]
        python: String,
        /// Skip checking that pip is runnable before starting
        #[arg(long)]
        skip_preflight: bool,
        /// Print the build report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// List the entries of an existing archive
    Inspect {
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Remove the staging directory and archive left by a previous run
    Clean {
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Working directory holding the manifest and source files
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    /// Manifest file name, relative to the working directory
    #[arg(long, default_value = DEFAULT_MANIFEST_FILE)]
    manifest: String,
    /// Output archive name, relative to the working directory
    #[arg(long, default_value = DEFAULT_ARCHIVE_FILE)]
    archive: String,
    /// Staging directory name, relative to the working directory
    #[arg(long, default_value = DEFAULT_STAGING_DIR)]
    staging_dir: String,
    /// Extension of top-level source files to include
    #[arg(long, default_value = DEFAULT_SOURCE_EXTENSION)]
    source_extension: String,
}

impl LayoutArgs {
    fn into_layout(self) -> PackageLayout {
        PackageLayout {
            working_dir: self.dir,
            manifest_file: self.manifest,
            archive_file: self.archive,
            staging_dir: self.staging_dir,
            source_extension: self.source_extension,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ArchitectureArg {
    #[value(name = "x86_64")]
    X86_64,
    #[value(name = "arm64")]
    Arm64,
}

impl From<ArchitectureArg> for Architecture {
    fn from(value: ArchitectureArg) -> Self {
        match value {
            ArchitectureArg::X86_64 => Self::X86_64,
            ArchitectureArg::Arm64 => Self::Arm64,
        }
    }
}

// ── commands ───────────────────────────────────────────────────────

fn build(
    layout: PackageLayout,
    runtime: TargetRuntime,
    python: String,
    skip_preflight: bool,
    json: bool,
) -> Result<(), PackageError> {
    tracing::info!(runtime = %runtime, dir = %layout.working_dir().display(), "packaging function");
    let runtime_label = runtime.to_string();
    let packager = Packager::new(layout, PipInstaller::new(python, runtime));

    if !skip_preflight {
        packager.preflight()?;
    }
    let outcome = packager.run()?;
    let report = build_report(&outcome, &runtime_label)?;

    tracing::info!(
        archive = %report.archive_path,
        bytes = report.archive_bytes,
        sha256 = %report.archive_sha256,
        sources = report.source_files.len(),
        "packaged artifact"
    );

    if json {
        match report_json(&report) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => tracing::warn!("failed to render build report: {error}"),
        }
    }
    Ok(())
}

fn inspect(layout: PackageLayout) -> Result<(), PackageError> {
    let archive_path = layout.archive_path();
    let entries = list_entries(&archive_path).map_err(|source| PackageError::ArchiveRead {
        path: archive_path.clone(),
        source,
    })?;
    for entry in &entries {
        println!("{entry}");
    }
    tracing::info!(entries = entries.len(), archive = %archive_path.display(), "listed archive");
    Ok(())
}

// ── main ───────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_global_subscriber(cli.log);

    let result = match cli.command {
        Commands::Build {
            layout,
            runtime,
            architecture,
            python,
            skip_preflight,
            json,
        } => match TargetRuntime::parse(&runtime, architecture.into()) {
            Ok(runtime) => build(layout.into_layout(), runtime, python, skip_preflight, json),
            Err(error) => {
                tracing::error!("FATAL {error}");
                return ExitCode::FAILURE;
            }
        },
        Commands::Inspect { layout } => inspect(layout.into_layout()),
        Commands::Clean { layout } => clean_previous_run(&layout.into_layout()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("FATAL {error}");
            ExitCode::from(error.exit_code())
        }
    }
}
