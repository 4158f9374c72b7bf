use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ProviderName;

/// Aspect ratios accepted by Gemini's image config.
pub const ASPECT_RATIOS: [&str; 10] = [
    "1:1", "2:3", "3:2", "3:4", "4:3", "4:5", "5:4", "9:16", "16:9", "21:9",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyTask {
    Set(Option<String>),
    Clear,
    Status,
}

/// Work left for main once arguments are parsed and config is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    Studio,
    Key(KeyTask),
    Topics,
    Prompt(String),
    Generate {
        prompt: String,
        remix: Option<path::PathBuf>,
    },
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Wallcraft")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Wallcraft with environment variable RUST_LOG=wallcraft")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_key() -> Command {
    return Command::new("key")
        .about("Manage the Gemini API key used for every request.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("set")
                .about("Validates a key against Gemini and stores it. Prompts for the key when --key is omitted.")
                .arg(
                    Arg::new("key")
                        .short('k')
                        .long("key")
                        .env("WALLCRAFT_API_KEY")
                        .hide_env_values(true)
                        .num_args(1)
                        .help("The Gemini API key."),
                ),
        )
        .subcommand(Command::new("clear").about("Forgets the stored key."))
        .subcommand(Command::new("status").about("Shows whether a key is stored, without revealing it."));
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about("Generates four wallpapers for a prompt and saves them to the output directory.")
        .arg(
            Arg::new("prompt")
                .help("Description of the wallpaper to generate.")
                .required(true),
        )
        .arg(
            Arg::new("remix")
                .short('r')
                .long("remix")
                .num_args(1)
                .help("Path to a PNG, JPEG or WebP image to remix instead of starting from scratch.")
                .value_parser(value_parser!(path::PathBuf)),
        );
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("wallcraft")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(false)
        .subcommand(Command::new("studio").about("Start the interactive wallpaper studio. This is the default."))
        .subcommand(subcommand_key())
        .subcommand(Command::new("topics").about("Suggests five wallpaper themes."))
        .subcommand(
            Command::new("prompt")
                .about("Crafts a detailed image prompt for a theme.")
                .arg(Arg::new("theme").help("Theme to write a prompt for.").required(true)),
        )
        .subcommand(subcommand_generate())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("WALLCRAFT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Provider.to_string())
                .short('p')
                .long(ConfigKey::Provider.to_string())
                .env("WALLCRAFT_PROVIDER")
                .num_args(1)
                .help(format!("The generative AI provider to use. [default: {}]", Config::default(ConfigKey::Provider)))
                .value_parser(PossibleValuesParser::new(ProviderName::VARIANTS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ProviderURL.to_string())
                .long(ConfigKey::ProviderURL.to_string())
                .env("WALLCRAFT_PROVIDER_URL")
                .num_args(1)
                .help(format!("Provider API URL. Can be swapped to a compatible proxy. [default: {}]", Config::default(ConfigKey::ProviderURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("WALLCRAFT_MODEL")
                .num_args(1)
                .help(format!("Model used for theme suggestions, prompts and key validation. [default: {}]", Config::default(ConfigKey::Model)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ImageModel.to_string())
                .long(ConfigKey::ImageModel.to_string())
                .env("WALLCRAFT_IMAGE_MODEL")
                .num_args(1)
                .help(format!("Model used to render wallpapers. [default: {}]", Config::default(ConfigKey::ImageModel)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::AspectRatio.to_string())
                .short('a')
                .long(ConfigKey::AspectRatio.to_string())
                .env("WALLCRAFT_ASPECT_RATIO")
                .num_args(1)
                .help(format!("Aspect ratio of generated wallpapers. [default: {}]", Config::default(ConfigKey::AspectRatio)))
                .value_parser(PossibleValuesParser::new(ASPECT_RATIOS))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OutputDir.to_string())
                .short('o')
                .long(ConfigKey::OutputDir.to_string())
                .env("WALLCRAFT_OUTPUT_DIR")
                .num_args(1)
                .help(format!("Directory wallpapers are saved to. [default: {}]", Config::default(ConfigKey::OutputDir)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::StoreFile.to_string())
                .long(ConfigKey::StoreFile.to_string())
                .env("WALLCRAFT_STORE_FILE")
                .num_args(1)
                .help(format!("File the API key is persisted to. Leave empty to keep it in memory only. [default: {}]", Config::default(ConfigKey::StoreFile)))
                .global(true),
        );
}

fn required_string(matches: &ArgMatches, id: &str) -> Result<String> {
    if let Some(val) = matches.get_one::<String>(id) {
        return Ok(val.to_string());
    }

    bail!(format!("Missing required argument '{id}'"));
}

/// Parses the command line. Returns `None` when the command was fully handled
/// here and the process should exit.
pub async fn parse() -> Result<Option<Task>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir()
                        .unwrap_or_default()
                        .join("wallcraft/debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some(("key", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match subcmd_matches.subcommand() {
                Some(("set", set_matches)) => {
                    let key = set_matches.get_one::<String>("key").cloned();
                    return Ok(Some(Task::Key(KeyTask::Set(key))));
                }
                Some(("clear", _)) => return Ok(Some(Task::Key(KeyTask::Clear))),
                Some(("status", _)) => return Ok(Some(Task::Key(KeyTask::Status))),
                _ => {
                    subcommand_key().print_long_help()?;
                    return Ok(None);
                }
            }
        }
        Some(("topics", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Task::Topics));
        }
        Some(("prompt", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            let theme = required_string(subcmd_matches, "theme")?;
            return Ok(Some(Task::Prompt(theme)));
        }
        Some(("generate", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Task::Generate {
                prompt: required_string(subcmd_matches, "prompt")?,
                remix: subcmd_matches.get_one::<path::PathBuf>("remix").cloned(),
            }));
        }
        Some(("studio", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return Ok(Some(Task::Studio));
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
            return Ok(Some(Task::Studio));
        }
    }
}
