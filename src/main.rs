use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use awsps::{
    commands::{self, AddArgs},
    env::platform_persistence,
    paths::Paths,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "awsps")]
#[command(
    about = "Tool used for easily switching between AWS profiles declared in your credentials file for AWS cli"
)]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure your system to use awsps
    Configure,

    /// Show your current AWS profile
    Current,

    /// List your existing AWS profiles. Your current profile is marked with an arrow
    List,

    /// Set the AWS profile used by the AWS cli. Prompts for a selection if no profile is given
    Use {
        /// Name of the profile to activate
        name: Option<String>,
    },

    /// Add an AWS profile and make it available for use with "awsps use"
    Add {
        /// Profile name (prompted for when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Access key id (prompted for when omitted)
        #[arg(long)]
        access_key_id: Option<String>,

        /// Secret access key (prompted for when omitted)
        #[arg(long)]
        secret_access_key: Option<String>,
    },

    /// Remove all awsps configuration
    Uninstall,

    /// Run diagnostics on the awsps setup
    Doctor,

    /// Print a shell completion script
    Completions {
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli, ui: &Ui) -> Result<()> {
    let paths = Paths::new()?;
    let persistence = platform_persistence();

    match cli.command {
        Commands::Configure => commands::configure(&paths, ui, persistence.as_ref()),
        Commands::Current => commands::current(&paths, ui),
        Commands::List => commands::list(&paths, ui),
        Commands::Use { name } => commands::use_profile(&paths, name.as_deref(), ui),
        Commands::Add {
            name,
            access_key_id,
            secret_access_key,
        } => commands::add(
            &paths,
            ui,
            AddArgs {
                name,
                access_key_id,
                secret_access_key,
            },
        ),
        Commands::Uninstall => commands::uninstall(&paths, ui, persistence.as_ref()),
        Commands::Doctor => commands::doctor(&paths, ui),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "awsps", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ui = Ui::new(cli.color, cli.no_color);

    if let Err(e) = run(cli, &ui) {
        ui.err(format!("{:#}", e));
        std::process::exit(1);
    }
}
