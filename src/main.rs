use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use promptdir::commands::{self, configure::ConfigArgs};
use promptdir::config::Config;
use promptdir::output::Output;
use promptdir::{GitSync, SnippetStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pd", version)]
#[command(about = "A git-backed prompt snippet manager", long_about = None)]
#[command(after_help = "Run a template directly with: pd [--out FILE] <name> [--key=value ...] [-- trailing text]\nGlobal options must come before the template name.")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Write output to a file instead of stdout
    #[arg(long, global = true, value_name = "FILE")]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List snippets, your own first
    List {
        /// Only list this owner's snippets
        #[arg(long)]
        owner: Option<String>,
    },
    /// Print a snippet (owner/name, or a bare name for your own)
    Read { reference: String },
    /// Write a snippet in your namespace (content from --content or stdin)
    Write {
        reference: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// Copy another user's snippet into your namespace
    Fork { reference: String },
    /// Create a new snippet; fails if it already exists
    New {
        name: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// Edit one of your snippets in $EDITOR
    Edit { reference: String },
    /// Copy a snippet to the clipboard, optionally hydrated
    Copy {
        /// Snippet to copy (fuzzy picker when omitted)
        reference: Option<String>,
        /// Fill placeholders; every placeholder must be given
        #[arg(long)]
        hydrate: bool,
        /// --key=value parameters, then -- and trailing text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Search snippet contents
    Search { query: String },
    /// Pull remote changes and publish pending local ones
    Sync,
    /// Show or update configuration
    Config(ConfigArgs),
    #[command(external_subcommand)]
    Template(Vec<String>),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("PD_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::init()?;
    let out = cli.out;

    match cli.command {
        Commands::Config(args) => {
            commands::configure::configure(config, &Config::config_path()?, args)?;
        }
        Commands::List { owner } => {
            let (mut store, output) = open(&config, out)?;
            commands::list::list_snippets(&mut store, owner.as_deref(), &output)?;
        }
        Commands::Read { reference } => {
            let (mut store, output) = open(&config, out)?;
            commands::read::read_snippet(&mut store, &reference, &output)?;
        }
        Commands::Write { reference, content } => {
            let (mut store, _) = open(&config, out)?;
            commands::write::write_snippet(&mut store, &reference, content)?;
        }
        Commands::Fork { reference } => {
            let (mut store, _) = open(&config, out)?;
            commands::fork::fork_snippet(&mut store, &reference)?;
        }
        Commands::New { name, content } => {
            let (mut store, _) = open(&config, out)?;
            commands::new::new_snippet(&mut store, &name, content)?;
        }
        Commands::Edit { reference } => {
            let (mut store, _) = open(&config, out)?;
            commands::edit::edit_snippet(&mut store, &reference)?;
        }
        Commands::Copy {
            reference,
            hydrate,
            args,
        } => {
            let (mut store, output) = open(&config, out)?;
            // An explicit output file wins over the clipboard.
            let output = if output == Output::Stdout {
                Output::Clipboard
            } else {
                output
            };
            commands::copy::copy_snippet(&mut store, reference, hydrate, &args, &output)?;
        }
        Commands::Search { query } => {
            let (mut store, output) = open(&config, out)?;
            commands::search::search_snippets(&mut store, &query, &output)?;
        }
        Commands::Sync => {
            let (mut store, _) = open(&config, out)?;
            commands::sync::sync_snippets(&mut store)?;
        }
        Commands::Template(words) => {
            let (mut store, output) = open(&config, out)?;
            commands::template::run_template(&mut store, &words, &output)?;
        }
    }

    Ok(())
}

/// Store on the configured remote, plus the output sink (`--out` over config).
fn open(config: &Config, out: Option<PathBuf>) -> Result<(SnippetStore<GitSync>, Output)> {
    let context = config.context()?;
    let output = Output::from_file(out.or_else(|| context.output_file().map(PathBuf::from)));
    Ok((commands::open_store(config, context)?, output))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("✗ {err:#}");
            let code = err
                .downcast_ref::<promptdir::Error>()
                .map_or(1, promptdir::Error::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
