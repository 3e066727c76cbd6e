use crate::command::settings::SettingsCommand;
use crate::command::wallpaper::WallpaperCommand;
use crate::{command, config};
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "wengine")]
#[command(about = "Control the Wallpaper Engine plugin for KDE Plasma from the command line")]
#[command(after_help = "Run 'wengine update-list' once to build the wallpaper list.")]
pub struct Cli {
    /// Also print log output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set, pick or inspect wallpapers
    #[command(alias = "wp")]
    Wallpaper {
        #[command(subcommand)]
        command: WallpaperCommand,
    },

    /// Change or read plugin settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Rebuild the wallpaper list from the Steam workshop directory
    UpdateList,

    /// Copy the plugin settings from the Plasma config into the state file
    Pull,

    /// Restore the settings last pulled into the state file
    Undo,

    /// Write an example config to ~/.config/wengine/config.yaml
    Init,

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Wallpaper { command } => command::wallpaper::run(command),
        Commands::Settings { command } => command::settings::run(command),
        Commands::UpdateList => command::update_list::run(),
        Commands::Pull => command::pull::run(),
        Commands::Undo => command::undo::run(),
        Commands::Init => config::Config::init(),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &name, &mut std::io::stdout());
}
