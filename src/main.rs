use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use roomgen::commands::config::{self, ConfigArgs};
use roomgen::commands::design::{self, AddArgs, InitArgs, ShowArgs};
use roomgen::commands::scan::{self, ScanArgs};
use roomgen::commands::shop::{self, ShopArgs};
use roomgen::commands::VERSION;
use roomgen::logging::{self, LogArgs};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  roomgen init \"a cozy bedroom with soft blue walls\"\n  roomgen add \"green plant\"\n  roomgen show\n  roomgen scan tool-response.json\n  roomgen completion bash > ~/.local/share/bash-completion/completions/roomgen";

const ADD_HELP_EXAMPLES: &str = "Examples:\n  roomgen add \"wooden nightstand\"\n  roomgen add --dry-run --json \"colorful rug\"";

#[derive(Debug, Parser)]
#[command(
    name = "roomgen",
    version = VERSION,
    about = "Interactive room designer backed by an LLM image tool",
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Describe a new room and render it")]
    Init(InitArgs),
    #[command(about = "Add a component and re-render the room", after_help = ADD_HELP_EXAMPLES)]
    Add(AddArgs),
    #[command(about = "Show the current room")]
    Show(ShowArgs),
    #[command(about = "Extract image URLs from a tool-execution response")]
    Scan(ScanArgs),
    #[command(about = "Look up a shopping link for a component")]
    Shop(ShopArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "roomgen", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "roomgen", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "roomgen", &mut io::stdout()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log);

    let result = match cli.command {
        Commands::Init(args) => design::run_init(args).await,
        Commands::Add(args) => design::run_add(args).await,
        Commands::Show(args) => design::run_show(args),
        Commands::Scan(args) => scan::run(args),
        Commands::Shop(args) => shop::run(args),
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
