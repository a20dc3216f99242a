use std::io;
use std::path;

use anyhow::anyhow;
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
use yansi::Paint;

use super::commands;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::DataType;
use crate::domain::models::StatementKind;
use crate::domain::models::TabularDocumentType;
use crate::domain::services::actions::help_text;
use crate::infrastructure::backends::BackendManager;

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
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

/// Resolves the configured agent backend. Only valid after `Config::load`.
pub fn backend_from_config() -> Result<BackendBox> {
    let name = Config::get(ConfigKey::Backend);
    let backend = BackendName::parse(name.to_string())
        .ok_or_else(|| return anyhow!("Unknown backend '{name}'"))?;

    return BackendManager::get(backend);
}

fn arg_string(name: &str, help: &str) -> Arg {
    return Arg::new(name.to_string())
        .long(name.to_string())
        .num_args(1)
        .help(help.to_string());
}

fn arg_flag(name: &str, help: &str) -> Arg {
    return Arg::new(name.to_string())
        .long(name.to_string())
        .action(ArgAction::SetTrue)
        .help(help.to_string());
}

fn arg_statement_kind() -> Arg {
    return arg_string("kind", "Which financial statement.")
        .required(true)
        .value_parser(PossibleValuesParser::new(StatementKind::VARIANTS));
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
        .about("Debug helpers for dcfdesk")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running dcfdesk with environment variable RUST_LOG=dcfdesk")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Open the agent playground. Prompts for an agent when none is configured.")
        .arg(
            Arg::new(ConfigKey::Agent.to_string())
                .short('a')
                .long(ConfigKey::Agent.to_string())
                .env("DCFDESK_AGENT")
                .num_args(1)
                .help("ID of the agent to talk to."),
        )
        .arg(
            Arg::new(ConfigKey::SessionID.to_string())
                .short('s')
                .long(ConfigKey::SessionID.to_string())
                .num_args(1)
                .help("Continue a previous session by ID."),
        );
}

fn subcommand_login() -> Command {
    return Command::new("login")
        .about("Sign in and store the session token. Prompts for anything not passed.")
        .arg(arg_string("username", "Account email."))
        .arg(arg_string("password", "Account password."));
}

fn subcommand_register() -> Command {
    return Command::new("register")
        .about("Create a new account.")
        .arg(arg_string("email", "Account email.").required(true))
        .arg(arg_string("first-name", "First name.").required(true))
        .arg(arg_string("last-name", "Last name.").required(true))
        .arg(arg_string("company", "Company name.").required(true))
        .arg(arg_string("password", "Account password. Prompts when omitted."));
}

fn subcommand_projects() -> Command {
    return Command::new("projects")
        .about("List, create, and inspect valuation projects.")
        .subcommand(
            Command::new("list")
                .about("List projects for the tenant.")
                .arg(
                    arg_string("page-size", "Projects per page.")
                        .value_parser(value_parser!(u32))
                        .default_value("20"),
                )
                .arg(arg_string("page-token", "Token for the next page.")),
        )
        .subcommand(
            Command::new("create")
                .about("Create a project.")
                .arg(arg_string("name", "Project name.").required(true))
                .arg(arg_string("description", "Project description.")),
        )
        .subcommand(Command::new("show").about("Show the configured project."));
}

fn subcommand_documents() -> Command {
    return Command::new("documents")
        .about("Manage the tabular documents attached to a project.")
        .subcommand(Command::new("list").about("List uploaded documents."))
        .subcommand(
            Command::new("upload")
                .about("Upload a spreadsheet or CSV.")
                .arg(arg_string("file", "Path to the file.").required(true))
                .arg(arg_string("name", "Document name.").required(true))
                .arg(
                    arg_string("type", "Document type.")
                        .required(true)
                        .value_parser(PossibleValuesParser::new(TabularDocumentType::VARIANTS)),
                )
                .arg(arg_string("company", "Company the document belongs to.").required(true))
                .arg(arg_string("annotation", "Free text note."))
                .arg(arg_flag("override", "Replace a document with the same name.")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a document.")
                .arg(arg_string("id", "Document ID.").required(true))
                .arg(arg_flag("yes", "Skip the confirmation prompt.")),
        );
}

fn subcommand_parameters() -> Command {
    return Command::new("parameters")
        .about("Read and write raw project parameters.")
        .subcommand(Command::new("list").about("List saved parameters."))
        .subcommand(
            Command::new("get")
                .about("Show one parameter.")
                .arg(arg_string("key", "Parameter key.").required(true)),
        )
        .subcommand(
            Command::new("set")
                .about("Create or update a parameter.")
                .arg(arg_string("key", "Parameter key.").required(true))
                .arg(
                    arg_string("data-type", "Parameter data type.")
                        .required(true)
                        .value_parser(PossibleValuesParser::new(DataType::VARIANTS)),
                )
                .arg(arg_string("value", "Numeric value."))
                .arg(arg_string("text", "Text value.")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a parameter.")
                .arg(arg_string("key", "Parameter key.").required(true)),
        );
}

fn subcommand_assumptions() -> Command {
    return Command::new("assumptions")
        .about("Show or update the DCF assumptions. Percentages are whole numbers, 25 means 25%.")
        .subcommand(Command::new("show").about("Show assumptions merged over the defaults."))
        .subcommand(
            Command::new("set").about("Save assumptions.").arg(
                Arg::new("values")
                    .help("key=value pairs, for example discountRate=9")
                    .num_args(1..)
                    .required(true),
            ),
        );
}

fn subcommand_statements() -> Command {
    return Command::new("statements")
        .about("Edit the income statement and balance sheet grids.")
        .subcommand(
            Command::new("show")
                .about("Show a statement grid.")
                .arg(arg_statement_kind()),
        )
        .subcommand(
            Command::new("set")
                .about("Set one cell. Omit --value to clear it.")
                .arg(arg_statement_kind())
                .arg(arg_string("row", "Row name, for example 'Total Revenue'.").required(true))
                .arg(arg_string("period", "Period end date, YYYY-MM-DD.").required(true))
                .arg(arg_string("value", "Cell value.")),
        );
}

fn subcommand_tables() -> Command {
    return Command::new("tables")
        .about("Browse tables extracted from uploaded documents.")
        .subcommand(Command::new("list").about("List tables."))
        .subcommand(
            Command::new("show")
                .about("Show a table's cells.")
                .arg(arg_string("id", "Table ID.").required(true)),
        );
}

fn subcommand_sessions() -> Command {
    let arg_agent = || {
        return Arg::new("agent")
            .short('a')
            .long("agent")
            .num_args(1)
            .required(true)
            .help("Agent ID.");
    };

    return Command::new("sessions")
        .about("Manage an agent's stored sessions.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("list")
                .about("List sessions for an agent.")
                .arg(arg_agent()),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a session.")
                .arg(arg_agent())
                .arg(arg_string("id", "Session ID.").required(true)),
        );
}

fn arg_global(key: ConfigKey, env: &str, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env.to_string())
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("dcfdesk")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_login())
        .subcommand(Command::new("logout").about("Forget the stored session token."))
        .subcommand(subcommand_register())
        .subcommand(subcommand_projects())
        .subcommand(subcommand_documents())
        .subcommand(subcommand_parameters())
        .subcommand(subcommand_assumptions())
        .subcommand(subcommand_statements())
        .subcommand(Command::new("dcf").about("Show the computed DCF model."))
        .subcommand(subcommand_tables())
        .subcommand(Command::new("agents").about("List the agents on the configured backend."))
        .subcommand(subcommand_sessions())
        .subcommand(Command::new("status").about("Check that the agent backend is reachable."))
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(Command::new("manpages").about("Generates manpages and outputs to stdout."))
        .arg(
            arg_global(
                ConfigKey::Backend,
                "DCFDESK_BACKEND",
                format!(
                    "Agent backend to connect to. [default: {}]",
                    Config::default(ConfigKey::Backend)
                ),
            )
            .short('b')
            .value_parser(PossibleValuesParser::new(BackendName::VARIANTS)),
        )
        .arg(arg_global(
            ConfigKey::ApiURL,
            "DCFDESK_API_URL",
            format!(
                "Base URL of the platform API. [default: {}]",
                Config::default(ConfigKey::ApiURL)
            ),
        ))
        .arg(arg_global(
            ConfigKey::AuthFile,
            "DCFDESK_AUTH_FILE",
            format!(
                "Where the session token is stored. [default: {}]",
                Config::default(ConfigKey::AuthFile)
            ),
        ))
        .arg(
            arg_global(
                ConfigKey::ConfigFile,
                "DCFDESK_CONFIG_FILE",
                format!(
                    "Path to configuration file [default: {}]",
                    Config::default(ConfigKey::ConfigFile)
                ),
            )
            .short('c'),
        )
        .arg(arg_global(
            ConfigKey::Tenant,
            "DCFDESK_TENANT",
            "Tenant ID that owns the projects.".to_string(),
        ))
        .arg(
            arg_global(
                ConfigKey::Project,
                "DCFDESK_PROJECT",
                "Project ID used by project scoped commands and the project backend.".to_string(),
            )
            .short('p'),
        )
        .arg(arg_global(
            ConfigKey::StatusTimeout,
            "DCFDESK_STATUS_TIMEOUT",
            format!(
                "Time to wait in milliseconds before timing out a backend health check. [default: {}]",
                Config::default(ConfigKey::StatusTimeout)
            ),
        ))
        .arg(arg_global(
            ConfigKey::Username,
            "DCFDESK_USERNAME",
            "Your name displayed on your chat bubbles.".to_string(),
        ));
}

/// Applies the chat defaults and resolves the agent, prompting when needed.
/// Returns false when no agent could be chosen.
async fn prepare_chat(matches: &ArgMatches, chat_matches: Option<&ArgMatches>) -> Result<bool> {
    let mut arg_matches = vec![matches];
    if let Some(chat_matches) = chat_matches {
        arg_matches.push(chat_matches);
    }
    Config::load(build(), arg_matches).await?;

    if Config::get_opt(ConfigKey::Agent).is_some() {
        return Ok(true);
    }

    let backend = backend_from_config()?;
    backend.health_check().await?;
    match commands::pick_agent(&backend).await? {
        Some(agent_id) => {
            Config::set(ConfigKey::Agent, &agent_id);
            return Ok(true);
        }
        None => return Ok(false),
    }
}

/// Runs the requested command. Returns true when the playground UI should
/// start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = dirs::cache_dir()
                        .unwrap_or_else(|| return path::PathBuf::from("."))
                        .join("dcfdesk/debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    println!("{}", ConfigKey::VARIANTS.join("\n"));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            return prepare_chat(&matches, Some(subcmd_matches)).await;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("manpages", _)) => {
            clap_mangen::Man::new(build()).render(&mut io::stdout())?;
            return Ok(false);
        }
        Some((name, subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            match name {
                "login" => commands::login(subcmd_matches).await?,
                "logout" => commands::logout()?,
                "register" => commands::register(subcmd_matches).await?,
                "projects" => commands::projects(subcmd_matches).await?,
                "documents" => commands::documents(subcmd_matches).await?,
                "parameters" => commands::parameters(subcmd_matches).await?,
                "assumptions" => commands::assumptions(subcmd_matches).await?,
                "statements" => commands::statements(subcmd_matches).await?,
                "dcf" => commands::dcf().await?,
                "tables" => commands::tables(subcmd_matches).await?,
                "agents" => commands::agents(&backend_from_config()?).await?,
                "sessions" => commands::sessions(subcmd_matches, &backend_from_config()?).await?,
                "status" => commands::status(&backend_from_config()?).await?,
                _ => {
                    build().print_long_help()?;
                }
            }

            return Ok(false);
        }
        None => {
            return prepare_chat(&matches, None).await;
        }
    }
}
