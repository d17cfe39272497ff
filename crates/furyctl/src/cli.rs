use crate::commands::Command;
use crate::tracing::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use furyctl_core::{GitProtocol, Settings};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "furyctl")]
#[command(about = "Resolve, download and validate the Kubernetes Fury Distribution toolchain")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        env = "FURYCTL_OUTDIR",
        help = "Base directory for .furyctl state (defaults to $HOME)"
    )]
    pub outdir: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "FURYCTL_BIN_PATH",
        help = "Directory holding tool binaries (defaults to <outdir>/.furyctl/bin)"
    )]
    pub bin_path: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "FURYCTL_GIT_PROTOCOL",
        default_value = "https",
        value_enum,
        help = "Protocol used to reach the default distribution repository"
    )]
    pub git_protocol: GitProtocolArg,

    #[arg(
        long,
        global = true,
        env = "FURYCTL_DISTRO_LOCATION",
        help = "Distribution location; the official repository is used when unset"
    )]
    pub distro_location: Option<String>,

    #[arg(
        long,
        global = true,
        env = "FURYCTL_DISTRO_PATCHES",
        help = "Location of custom distribution patches, one directory per version"
    )]
    pub distro_patches: Option<String>,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json_logs: bool,

    #[arg(long, global = true, help = "Log the output of every subprocess")]
    pub debug: bool,

    #[arg(
        long,
        global = true,
        env = "FURYCTL_PROBE_TIMEOUT",
        default_value_t = 30,
        help = "Seconds to wait for a tool version probe"
    )]
    pub probe_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GitProtocolArg {
    Https,
    Ssh,
}

impl From<GitProtocolArg> for GitProtocol {
    fn from(arg: GitProtocolArg) -> Self {
        match arg {
            GitProtocolArg::Https => Self::Https,
            GitProtocolArg::Ssh => Self::Ssh,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Show version information")]
    Version,
    #[command(about = "Validate the local environment")]
    Validate {
        #[command(subcommand)]
        subcommand: ValidateCommands,
    },
    #[command(about = "Download distribution artifacts")]
    Download {
        #[command(subcommand)]
        subcommand: DownloadCommands,
    },
    #[command(about = "Dump resolved resources")]
    Dump {
        #[command(subcommand)]
        subcommand: DumpCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ValidateCommands {
    #[command(about = "Check that every pinned tool is installed at the pinned version")]
    Dependencies {
        #[arg(long, short = 'c', help = "Cluster configuration file", default_value = "furyctl.yaml")]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum DownloadCommands {
    #[command(about = "Install the tools pinned by the distribution")]
    Dependencies {
        #[arg(long, short = 'c', help = "Cluster configuration file", default_value = "furyctl.yaml")]
        config: PathBuf,
        #[arg(long, help = "Do not re-validate the tools after installing them")]
        skip_validation: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum DumpCommands {
    #[command(about = "Resolve the distribution and print where it landed")]
    Distribution {
        #[arg(long, short = 'c', help = "Cluster configuration file", default_value = "furyctl.yaml")]
        config: PathBuf,
    },
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Version => Command::Version,
            Commands::Validate { subcommand } => match subcommand {
                ValidateCommands::Dependencies { config } => Command::ValidateDependencies { config },
            },
            Commands::Download { subcommand } => match subcommand {
                DownloadCommands::Dependencies {
                    config,
                    skip_validation,
                } => Command::DownloadDependencies {
                    config,
                    skip_validation,
                },
            },
            Commands::Dump { subcommand } => match subcommand {
                DumpCommands::Distribution { config } => Command::DumpDistribution { config },
            },
        }
    }
}

impl Cli {
    /// Settings shared by every command.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new()
            .with_git_protocol(self.git_protocol.into())
            .with_probe_timeout(Duration::from_secs(self.probe_timeout))
            .with_debug(self.debug);

        if let Some(outdir) = &self.outdir {
            settings = settings.with_outdir(outdir.clone());
        }
        if let Some(bin_path) = &self.bin_path {
            settings = settings.with_bin_path(bin_path.clone());
        }
        if let Some(location) = non_empty(self.distro_location.as_deref()) {
            settings = settings.with_distro_location(location);
        }
        if let Some(location) = non_empty(self.distro_patches.as_deref()) {
            settings = settings.with_distro_patches_location(location);
        }
        settings
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse() -> Cli {
    Cli::parse()
}
