//! crdform CLI - drive Kubernetes custom resources as declarative-configuration resources

use clap::{Parser, Subcommand, ValueEnum};
use crdform_core::ResourceMode;
use std::path::PathBuf;

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

use commands::GlobalOptions;
use commands::apply::ApplyArgs;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Kubernetes custom resources as declarative-configuration resources", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider configuration file (default: ~/.config/crdform/provider.yaml)
    #[arg(long, global = true, env = "CRDFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Additional CRD file(s) to register next to the bundled ones
    #[arg(long = "crds", global = true)]
    crds: Vec<PathBuf>,

    /// Never contact the cluster
    #[arg(long, global = true)]
    offline: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum ModeArg {
    #[default]
    Resource,
    DataSource,
    Manifest,
}

impl From<ModeArg> for ResourceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Resource => ResourceMode::Resource,
            ModeArg::DataSource => ResourceMode::DataSource,
            ModeArg::Manifest => ResourceMode::Manifest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the available type names
    Types {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the attribute schema of a type as JSON
    Schema {
        /// Type name, e.g. kuma_io_mesh_retry_v1alpha1
        type_name: String,

        #[arg(short, long, value_enum, default_value_t)]
        mode: ModeArg,
    },

    /// Validate configuration against a type's schema
    Validate {
        type_name: String,

        /// Configuration file(s) to merge
        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        #[arg(short, long, value_enum, default_value_t)]
        mode: ModeArg,

        /// Output validation results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render the Kubernetes manifest of a configuration
    Render {
        type_name: String,

        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        #[arg(long = "set")]
        set: Vec<String>,

        /// Also write the manifest state to this file
        #[arg(short = 'o', long = "state-out")]
        state_out: Option<PathBuf>,
    },

    /// Create or update a resource with server-side apply
    Apply {
        type_name: String,

        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        #[arg(long = "set")]
        set: Vec<String>,

        /// Prior state; switches from create to update
        #[arg(long)]
        state: Option<PathBuf>,

        /// Write the new state here instead of stdout
        #[arg(short = 'o', long = "state-out")]
        state_out: Option<PathBuf>,
    },

    /// Refresh a state file from the cluster
    Read {
        type_name: String,

        #[arg(long)]
        state: PathBuf,

        #[arg(short = 'o', long = "state-out")]
        state_out: Option<PathBuf>,
    },

    /// Delete the object a state file points to
    Delete {
        type_name: String,

        #[arg(long)]
        state: PathBuf,
    },

    /// Import an existing object by id (`namespace/name` or `name`)
    Import {
        type_name: String,

        id: String,

        #[arg(short = 'o', long = "state-out")]
        state_out: Option<PathBuf>,
    },

    /// Look up an existing object as a data source
    Get {
        type_name: String,

        #[arg(short = 'f', long = "file")]
        files: Vec<PathBuf>,

        #[arg(long = "set")]
        set: Vec<String>,

        #[arg(short = 'o', long = "state-out")]
        state_out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::initialize_logging(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("{:?}", miette::Report::new(e.clone()));
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> error::Result<()> {
    let options = GlobalOptions {
        config: cli.config,
        crds: cli.crds,
        offline: cli.offline,
    };

    match cli.command {
        Commands::Types { json } => commands::types::run(&options, json),

        Commands::Schema { type_name, mode } => {
            commands::schema::run(&options, mode.into(), &type_name)
        }

        Commands::Validate {
            type_name,
            files,
            set,
            mode,
            json,
        } => commands::validate::run(&options, mode.into(), &type_name, &files, &set, json),

        Commands::Render {
            type_name,
            files,
            set,
            state_out,
        } => commands::render::run(&options, &type_name, &files, &set, state_out.as_deref()),

        Commands::Apply {
            type_name,
            files,
            set,
            state,
            state_out,
        } => {
            let args = ApplyArgs {
                type_name: &type_name,
                files: &files,
                set_values: &set,
                prior_state: state.as_deref(),
                state_out: state_out.as_deref(),
            };
            commands::apply::run(&options, args).await
        }

        Commands::Read {
            type_name,
            state,
            state_out,
        } => commands::read::run(&options, &type_name, &state, state_out.as_deref()).await,

        Commands::Delete { type_name, state } => {
            commands::delete::run(&options, &type_name, &state).await
        }

        Commands::Import {
            type_name,
            id,
            state_out,
        } => commands::import::run(&options, &type_name, &id, state_out.as_deref()).await,

        Commands::Get {
            type_name,
            files,
            set,
            state_out,
        } => commands::get::run(&options, &type_name, &files, &set, state_out.as_deref()).await,
    }
}
