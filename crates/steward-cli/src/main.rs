mod commands;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use commands::{Context, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_STORE_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;
use steward_core::install_signal_handler;

#[derive(Debug, Parser)]
#[command(
    name = "steward",
    version,
    about = "Declarative reconciler for logging curation resources"
)]
struct Cli {
    /// Path to the resource store directory.
    #[arg(long, default_value = "~/.local/share/steward")]
    store: String,

    /// Reconciler settings file (TOML).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which cluster configuration a command acts on.
#[derive(Debug, Args)]
struct Target {
    /// Cluster configuration name.
    #[arg(long, default_value = "instance")]
    name: String,
    /// Namespace holding the cluster configuration and its resources.
    #[arg(long, default_value = "openshift-logging")]
    namespace: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Store a cluster configuration, creating or replacing its spec.
    Apply {
        /// Path to the cluster configuration TOML file.
        #[arg(default_value = "cluster.toml")]
        cluster: PathBuf,
    },
    /// Run one reconciliation pass.
    Reconcile {
        #[command(flatten)]
        target: Target,
    },
    /// Reconcile periodically until interrupted.
    Watch {
        #[command(flatten)]
        target: Target,
        /// Seconds between passes.
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
    /// Remove every curation resource the cluster configuration owns.
    Teardown {
        #[command(flatten)]
        target: Target,
    },
    /// Show the curation status recorded on the cluster configuration.
    Status {
        #[command(flatten)]
        target: Target,
    },
    /// List managed resources and whether each scheduled job has drifted.
    Inspect {
        #[command(flatten)]
        target: Target,
    },
    /// Remove resources whose owning cluster configuration no longer exists.
    Gc {
        /// Namespace to sweep.
        #[arg(long, default_value = "openshift-logging")]
        namespace: String,
        /// Only report what would be removed.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") || msg.contains("failed printing to stdout") {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("STEWARD_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    install_signal_handler();

    let store_path = expand_tilde(&cli.store);
    let settings = cli.settings;
    let json = cli.json;
    let open = || Context::open(&store_path, settings.as_deref(), json);

    let result = match cli.command {
        Commands::Apply { cluster } => open().and_then(|ctx| commands::apply::run(&ctx, &cluster)),
        Commands::Reconcile { target } => open().and_then(|ctx| {
            commands::reconcile::run(&ctx, &target.name, &target.namespace)
        }),
        Commands::Watch { target, interval } => open().and_then(|ctx| {
            commands::watch::run(&ctx, &target.name, &target.namespace, interval)
        }),
        Commands::Teardown { target } => open().and_then(|ctx| {
            commands::teardown::run(&ctx, &target.name, &target.namespace)
        }),
        Commands::Status { target } => {
            open().and_then(|ctx| commands::status::run(&ctx, &target.name, &target.namespace))
        }
        Commands::Inspect { target } => {
            open().and_then(|ctx| commands::inspect::run(&ctx, &target.name, &target.namespace))
        }
        Commands::Gc { namespace, dry_run } => {
            open().and_then(|ctx| commands::gc::run(&ctx, &namespace, dry_run))
        }
        // Needs no store.
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };
    exit_code(result)
}

fn exit_code(result: Result<u8, String>) -> ExitCode {
    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:") {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
