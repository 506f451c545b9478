use clap::{Args, Parser, Subcommand};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bidsify_core::{
    resolve_output_dir, run, CreateConfig, FieldOverrides, Label, Modality, ModalityRules,
    Placement,
};

#[derive(Parser)]
#[command(name = "bidsify")]
#[command(about = "Pattern-match NIfTI directories to create a BIDS dataset")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a BIDS dataset from files matching a path template
    Create(CreateArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Path to NIfTIs with {subject}, {session} and {modality} placeholders
    #[arg(short = 'p', long = "pattern")]
    pattern: String,
    /// Subject label for every file, instead of a {subject} placeholder
    #[arg(short = 's', long)]
    subject: Option<Label>,
    /// Session label for every file, instead of a {session} placeholder (note: `-ss` is
    /// not accepted, use `--session` or `--ss`)
    #[arg(long, visible_alias = "ss")]
    session: Option<Label>,
    /// Modality for every file, instead of a {modality} placeholder
    #[arg(short = 'm', long)]
    modality: Option<String>,
    /// Output directory (default: $BIDSIFY_OUTPUT_DIR, then /output)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
    /// Symlink sources into the dataset instead of copying them
    #[arg(long)]
    symlink: bool,
    /// Raw labels accepted as T1w (comma-separated)
    #[arg(long, value_delimiter = ',')]
    t1w_labels: Vec<String>,
    /// Raw labels accepted as T2w (comma-separated)
    #[arg(long, value_delimiter = ',')]
    t2w_labels: Vec<String>,
    /// Raw labels accepted as FLAIR (comma-separated)
    #[arg(long, value_delimiter = ',')]
    flair_labels: Vec<String>,
    /// Raw labels accepted as PD (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pd_labels: Vec<String>,
}

impl CreateArgs {
    /// Resolve the run configuration; `env_output_dir` is `$BIDSIFY_OUTPUT_DIR`.
    fn into_config(self, env_output_dir: Option<PathBuf>) -> anyhow::Result<CreateConfig> {
        let modality_rules = ModalityRules::default()
            .with_accepted(Modality::T1w, self.t1w_labels)
            .with_accepted(Modality::T2w, self.t2w_labels)
            .with_accepted(Modality::Flair, self.flair_labels)
            .with_accepted(Modality::Pd, self.pd_labels);

        let overrides = FieldOverrides {
            subject: self.subject,
            session: self.session,
            modality: self.modality,
        };

        let placement = if self.symlink {
            Placement::Symlink
        } else {
            Placement::Copy
        };

        Ok(CreateConfig::new(
            self.pattern,
            overrides,
            resolve_output_dir(self.output.or(env_output_dir)),
            placement,
            modality_rules,
        )?)
    }
}

/// Older releases spelled the session flag `-ss`, which clap would read as `-s s`.
fn reject_legacy_session_flag<T: AsRef<OsStr>>(args: &[T]) -> anyhow::Result<()> {
    for arg in args {
        let arg: &OsStr = arg.as_ref();
        if arg == "--" {
            break;
        }
        if arg == "-ss" {
            anyhow::bail!("'-ss' is not supported; use '--session' or '--ss' to set the session");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bidsify=info".parse()?)
                .add_directive("bidsify_core=info".parse()?)
                .add_directive("bidsify_files=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<OsString> = std::env::args_os().collect();
    reject_legacy_session_flag(&args)?;
    let cli = Cli::parse_from(args);

    match cli.command {
        Some(Commands::Create(args)) => {
            let env_output_dir = std::env::var_os("BIDSIFY_OUTPUT_DIR").map(PathBuf::from);
            let config = args.into_config(env_output_dir)?;

            tracing::info!("++ Writing BIDS dataset to {}", config.output_dir().display());
            let summary = run(&config)?;

            if !summary.is_success() {
                for (path, error) in &summary.failures {
                    eprintln!("{}: {}", path.display(), error);
                }
                anyhow::bail!(
                    "{} of {} file(s) could not be converted",
                    summary.failures.len(),
                    summary.matched
                );
            }
        }
        None => {
            println!("Use 'bidsify --help' for commands");
        }
    }

    Ok(())
}
