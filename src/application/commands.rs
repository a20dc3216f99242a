#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use chrono::Local;
use chrono::NaiveDateTime;
use clap::ArgMatches;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use dialoguer::Input;
use dialoguer::Password;
use dialoguer::Select;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AgentOption;
use crate::domain::models::AssumptionKey;
use crate::domain::models::BackendBox;
use crate::domain::models::DataType;
use crate::domain::models::DcfAssumptions;
use crate::domain::models::DcfModel;
use crate::domain::models::DocumentUpload;
use crate::domain::models::Parameter;
use crate::domain::models::ParameterUpdate;
use crate::domain::models::Project;
use crate::domain::models::ProjectCreate;
use crate::domain::models::Registration;
use crate::domain::models::SessionEntry;
use crate::domain::models::StatementGrid;
use crate::domain::models::StatementKind;
use crate::domain::models::TableData;
use crate::domain::models::TableInfo;
use crate::domain::models::TabularDocument;
use crate::domain::models::TabularDocumentType;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::Scope;

/// Left aligned text table with a dashed rule under the header.
pub fn format_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| return header.chars().count())
        .collect::<Vec<usize>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if idx < widths.len() {
                widths[idx] = widths[idx].max(cell.chars().count());
            }
        }
    }

    let render = |cells: &[String]| -> String {
        return cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let width = widths.get(idx).copied().unwrap_or(0);
                return format!("{cell:<width$}");
            })
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string();
    };

    let mut lines = vec![render(headers)];
    lines.push(
        widths
            .iter()
            .map(|width| return "-".repeat(*width))
            .collect::<Vec<String>>()
            .join("  "),
    );
    for row in rows {
        lines.push(render(row));
    }

    return lines.join("\n");
}

fn headers(names: &[&str]) -> Vec<String> {
    return names.iter().map(|name| return name.to_string()).collect();
}

fn or_dash(text: Option<&str>) -> String {
    return text
        .filter(|e| return !e.is_empty())
        .unwrap_or("-")
        .to_string();
}

pub fn format_projects(projects: &[Project]) -> String {
    let rows = projects
        .iter()
        .map(|project| {
            return vec![
                project.id.to_string(),
                project.name.to_string(),
                or_dash(Some(project.description.as_str())),
            ];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["ID", "NAME", "DESCRIPTION"]), &rows);
}

pub fn format_documents(documents: &[TabularDocument]) -> String {
    let rows = documents
        .iter()
        .map(|doc| {
            return vec![
                doc.id.to_string(),
                doc.name.to_string(),
                or_dash(doc.document_type.as_deref()),
                or_dash(doc.company.as_deref()),
            ];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["ID", "NAME", "TYPE", "COMPANY"]), &rows);
}

pub fn format_parameters(parameters: &[Parameter]) -> String {
    let rows = parameters
        .iter()
        .map(|param| {
            return vec![
                param.parameter_key.to_string(),
                param.display_value(),
                param.data_type.to_string(),
            ];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["KEY", "VALUE", "TYPE"]), &rows);
}

pub fn format_assumptions(assumptions: &DcfAssumptions) -> String {
    let rows = assumptions
        .iter()
        .map(|(key, value)| {
            let mut text = value.to_string();
            if key.data_type() == DataType::Percentage {
                text = format!("{text}%");
            }
            return vec![key.to_string(), text];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["ASSUMPTION", "VALUE"]), &rows);
}

pub fn format_statement(kind: StatementKind, grid: &StatementGrid) -> String {
    let periods = grid.periods();
    let mut header = vec![kind.to_string().to_uppercase().replace('-', " ")];
    header.extend(periods.iter().cloned());

    let rows = grid
        .rows(kind)
        .iter()
        .map(|row| {
            let mut cells = vec![row.to_string()];
            for period in periods.iter() {
                cells.push(
                    grid.get(row, period)
                        .map(|value| return value.to_string())
                        .unwrap_or_else(|| return "-".to_string()),
                );
            }
            return cells;
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&header, &rows);
}

pub fn format_dcf_model(model: &DcfModel) -> String {
    let mut header = vec!["LINE ITEM".to_string()];
    header.extend(model.periods.iter().map(|period| return period.label.to_string()));

    let rows = model
        .line_items
        .iter()
        .map(|item| {
            let mut cells = vec![item.name.to_string()];
            cells.extend(item.formatted_values());
            return cells;
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&header, &rows);
}

pub fn format_tables(tables: &[TableInfo]) -> String {
    let rows = tables
        .iter()
        .map(|table| {
            return vec![
                table.table_id.to_string(),
                table.table_name.to_string(),
                table.source.to_string(),
                table.row_count.to_string(),
            ];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["ID", "NAME", "SOURCE", "ROWS"]), &rows);
}

pub fn format_table_data(data: &TableData) -> String {
    let header = data
        .columns
        .iter()
        .map(|column| return column.name.to_string())
        .collect::<Vec<String>>();

    return format_grid(&header, &data.cell_texts());
}

pub fn format_agents(agents: &[AgentOption]) -> String {
    let rows = agents
        .iter()
        .map(|agent| {
            let storage = if agent.storage { "yes" } else { "no" };
            return vec![
                agent.value.to_string(),
                agent.label.to_string(),
                or_dash(Some(agent.model.as_str())),
                storage.to_string(),
            ];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["ID", "NAME", "MODEL", "HISTORY"]), &rows);
}

pub fn format_sessions(sessions: &[SessionEntry]) -> String {
    let rows = sessions
        .iter()
        .map(|session| {
            let created = NaiveDateTime::from_timestamp_opt(session.created_at, 0)
                .map(|e| return e.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| return "-".to_string());
            let mut title = session.title.lines().next().unwrap_or_default().to_string();
            if title.chars().count() > 60 {
                title = format!("{}...", title.chars().take(57).collect::<String>());
            }

            return vec![session.session_id.to_string(), created, or_dash(Some(title.as_str()))];
        })
        .collect::<Vec<Vec<String>>>();

    return format_grid(&headers(&["ID", "CREATED", "TITLE"]), &rows);
}

fn print_listing(text: String, is_empty: bool, empty_message: &str) {
    if is_empty {
        println!("{empty_message}");
        return;
    }

    println!("{text}");
}

fn arg(matches: &ArgMatches, name: &str) -> Option<String> {
    return matches.get_one::<String>(name).map(|e| return e.to_string());
}

fn required_arg(matches: &ArgMatches, name: &str) -> Result<String> {
    return arg(matches, name).ok_or_else(|| return anyhow!("--{name} is required"));
}

fn prompt_text(prompt: &str) -> Result<String> {
    let text = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()?;

    return Ok(text);
}

fn prompt_password(confirm: bool) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut prompt = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }

    return Ok(prompt.interact()?);
}

pub async fn login(matches: &ArgMatches) -> Result<()> {
    let username = match arg(matches, "username") {
        Some(username) => username,
        None => prompt_text("Email")?,
    };
    let password = match arg(matches, "password") {
        Some(password) => password,
        None => prompt_password(false)?,
    };

    ApiClient::default().login(&username, &password).await?;
    println!("{}", Paint::green(format!("Signed in as {username}")));

    return Ok(());
}

pub fn logout() -> Result<()> {
    ApiClient::default().logout()?;
    println!("Signed out.");

    return Ok(());
}

pub async fn register(matches: &ArgMatches) -> Result<()> {
    let mut registration = Registration {
        email: required_arg(matches, "email")?,
        first_name: required_arg(matches, "first-name")?,
        last_name: required_arg(matches, "last-name")?,
        company: required_arg(matches, "company")?,
        password: "".to_string(),
    };
    registration.password = match arg(matches, "password") {
        Some(password) => password,
        None => prompt_password(true)?,
    };
    if registration.password.chars().count() < 8 {
        bail!("Password must be at least 8 characters.");
    }

    ApiClient::default().register(&registration).await?;
    println!(
        "{}",
        Paint::green(format!(
            "Registered {}. Run `dcfdesk login` to sign in.",
            registration.email
        ))
    );

    return Ok(());
}

async fn list_projects(api: &ApiClient, page_size: u32, page_token: Option<String>) -> Result<()> {
    let page = api
        .list_projects(
            &Config::require(ConfigKey::Tenant)?,
            page_size,
            page_token.as_deref(),
        )
        .await?;

    print_listing(
        format_projects(&page.items),
        page.items.is_empty(),
        "There are no projects yet. Create one with `dcfdesk projects create`.",
    );
    if page.has_more() {
        println!(
            "\nMore projects available, pass --page-token {}",
            page.next_token.unwrap_or_default()
        );
    }

    return Ok(());
}

pub async fn projects(matches: &ArgMatches) -> Result<()> {
    let api = ApiClient::default();
    match matches.subcommand() {
        Some(("create", create_matches)) => {
            let project = api
                .create_project(
                    &Config::require(ConfigKey::Tenant)?,
                    &ProjectCreate {
                        name: required_arg(create_matches, "name")?,
                        description: arg(create_matches, "description").unwrap_or_default(),
                    },
                )
                .await?;
            println!("Created project {} ({})", project.name, project.id);
        }
        Some(("show", _)) => {
            let project = api.get_project(&Scope::from_config()?).await?;
            println!("{}", format_projects(&[project]));
        }
        Some(("list", list_matches)) => {
            let page_size = list_matches
                .get_one::<u32>("page-size")
                .copied()
                .unwrap_or(20);
            list_projects(&api, page_size, arg(list_matches, "page-token")).await?;
        }
        _ => {
            list_projects(&api, 20, None).await?;
        }
    }

    return Ok(());
}

pub async fn documents(matches: &ArgMatches) -> Result<()> {
    let api = ApiClient::default();
    let scope = Scope::from_config()?;

    match matches.subcommand() {
        Some(("upload", upload_matches)) => {
            let document_type = TabularDocumentType::parse(&required_arg(upload_matches, "type")?)
                .ok_or_else(|| return anyhow!("Unknown document type"))?;
            let upload = DocumentUpload::new(
                PathBuf::from(required_arg(upload_matches, "file")?),
                &required_arg(upload_matches, "name")?,
                document_type,
                &required_arg(upload_matches, "company")?,
                arg(upload_matches, "annotation"),
            )?;

            let existing = api.list_all_documents(&scope).await?;
            if upload.conflicts_with(&existing) && !upload_matches.get_flag("override") {
                bail!(format!(
                    "A document named '{}' already exists. Pass --override to replace it.",
                    upload.name
                ));
            }

            let document = api.upload_document(&scope, &upload).await?;
            println!(
                "{}",
                Paint::green(format!("Uploaded {} ({})", document.name, document.id))
            );
        }
        Some(("delete", delete_matches)) => {
            let id = required_arg(delete_matches, "id")?;
            let confirmed = delete_matches.get_flag("yes")
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("Delete document {id}?"))
                    .default(false)
                    .interact()?;
            if !confirmed {
                return Ok(());
            }

            api.delete_document(&scope, &id).await?;
            println!("Deleted document {id}");
        }
        _ => {
            let documents = api.list_all_documents(&scope).await?;
            print_listing(
                format_documents(&documents),
                documents.is_empty(),
                "No documents uploaded yet. Add one with `dcfdesk documents upload`.",
            );
        }
    }

    return Ok(());
}

pub async fn parameters(matches: &ArgMatches) -> Result<()> {
    let api = ApiClient::default();
    let scope = Scope::from_config()?;

    match matches.subcommand() {
        Some(("get", get_matches)) => {
            let key = required_arg(get_matches, "key")?;
            match api.get_parameter(&scope, &key).await? {
                Some(param) => println!("{}", format_parameters(&[param])),
                None => bail!(format!("Parameter '{key}' is not set")),
            }
        }
        Some(("set", set_matches)) => {
            let key = required_arg(set_matches, "key")?;
            let data_type = DataType::from_str(&required_arg(set_matches, "data-type")?)
                .map_err(|_| return anyhow!("Unknown data type"))?;
            let mut update = ParameterUpdate {
                data_type: Some(data_type),
                ..ParameterUpdate::default()
            };
            if let Some(value) = arg(set_matches, "value") {
                update.parameter_value = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| return anyhow!("--value expects a number, got '{value}'"))?,
                );
            }
            update.parameter_text = arg(set_matches, "text");

            let param = api.save_parameter(&scope, &key, &update).await?;
            println!("{}", format_parameters(&[param]));
        }
        Some(("delete", delete_matches)) => {
            let key = required_arg(delete_matches, "key")?;
            api.delete_parameter(&scope, &key).await?;
            println!("Deleted parameter {key}");
        }
        _ => {
            let parameters = api.list_parameters(&scope).await?;
            print_listing(
                format_parameters(&parameters),
                parameters.is_empty(),
                "No parameters saved for this project.",
            );
        }
    }

    return Ok(());
}

/// Parses `key=value` pairs into a validated assumptions form.
pub fn parse_assumptions(pairs: &[String]) -> Result<DcfAssumptions> {
    let mut assumptions = DcfAssumptions::default();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| return anyhow!("Expected key=value, got '{pair}'"))?;
        let key = AssumptionKey::parse(key.trim())
            .ok_or_else(|| return anyhow!("Unknown assumption '{}'", key.trim()))?;
        assumptions.set(key, value)?;
    }

    return Ok(assumptions);
}

pub async fn assumptions(matches: &ArgMatches) -> Result<()> {
    let api = ApiClient::default();
    let scope = Scope::from_config()?;

    match matches.subcommand() {
        Some(("set", set_matches)) => {
            let pairs = set_matches
                .get_many::<String>("values")
                .map(|values| return values.cloned().collect::<Vec<String>>())
                .unwrap_or_default();
            if pairs.is_empty() {
                bail!("Pass at least one key=value pair");
            }

            let form = parse_assumptions(&pairs)?;
            let saved = api.save_assumptions(&scope, &form).await?;
            println!("{}", Paint::green(format!("Saved {} assumptions", saved.len())));
        }
        _ => {
            let mut form = DcfAssumptions::defaults(Local::now().date_naive());
            form.merge(&api.load_assumptions(&scope).await?);
            println!("{}", format_assumptions(&form));
        }
    }

    return Ok(());
}

fn statement_kind(matches: &ArgMatches) -> Result<StatementKind> {
    let kind = required_arg(matches, "kind")?;
    return StatementKind::parse(&kind).ok_or_else(|| return anyhow!("Unknown statement '{kind}'"));
}

pub async fn statements(matches: &ArgMatches) -> Result<()> {
    let api = ApiClient::default();
    let scope = Scope::from_config()?;

    match matches.subcommand() {
        Some(("set", set_matches)) => {
            let kind = statement_kind(set_matches)?;
            let row = required_arg(set_matches, "row")?;
            let period = required_arg(set_matches, "period")?;
            let value = match arg(set_matches, "value").filter(|e| return !e.trim().is_empty()) {
                Some(value) => Some(
                    value
                        .trim()
                        .parse::<f64>()
                        .map_err(|_| return anyhow!("--value expects a number, got '{value}'"))?,
                ),
                None => None,
            };

            let mut grid = api.load_statement_grid(&scope, kind).await?;
            grid.set(&row, &period, value);
            let saved = api.save_statement(&scope, kind, &grid).await?;
            println!(
                "{}",
                format_statement(kind, &StatementGrid::from_entries(&saved.data))
            );
        }
        Some(("show", show_matches)) => {
            let kind = statement_kind(show_matches)?;
            let grid = api.load_statement_grid(&scope, kind).await?;
            if grid.is_empty() {
                println!("No {kind} data yet. Add values with `dcfdesk statements set`.");
                return Ok(());
            }
            println!("{}", format_statement(kind, &grid));
        }
        _ => {
            bail!("Pick a statements subcommand, see `dcfdesk statements --help`");
        }
    }

    return Ok(());
}

pub async fn dcf() -> Result<()> {
    let model = ApiClient::default()
        .get_dcf_model(&Scope::from_config()?)
        .await?;

    let model = match model {
        Some(model) if !model.line_items.is_empty() => model,
        _ => {
            println!("No DCF results yet. Save assumptions and statements, then run the model.");
            return Ok(());
        }
    };

    for (idx, line) in format_dcf_model(&model).lines().enumerate() {
        let is_key_row = idx >= 2
            && model
                .line_items
                .get(idx - 2)
                .map(|item| return item.is_key_row())
                .unwrap_or(false);
        if idx == 0 || is_key_row {
            println!("{}", Paint::new(line).bold());
        } else {
            println!("{line}");
        }
    }

    return Ok(());
}

pub async fn tables(matches: &ArgMatches) -> Result<()> {
    let api = ApiClient::default();
    let scope = Scope::from_config()?;

    match matches.subcommand() {
        Some(("show", show_matches)) => {
            let data = api
                .get_table_data(&scope, &required_arg(show_matches, "id")?)
                .await?;
            println!("{}", Paint::new(&data.table_name).bold());
            println!("{}", format_table_data(&data));
        }
        _ => {
            let tables = api.list_tables(&scope).await?;
            print_listing(
                format_tables(&tables),
                tables.is_empty(),
                "No tables available for this project.",
            );
        }
    }

    return Ok(());
}

pub async fn agents(backend: &BackendBox) -> Result<()> {
    let agents = backend.list_agents().await?;
    print_listing(
        format_agents(&agents),
        agents.is_empty(),
        "No agents are available.",
    );

    return Ok(());
}

pub async fn sessions(matches: &ArgMatches, backend: &BackendBox) -> Result<()> {
    match matches.subcommand() {
        Some(("delete", delete_matches)) => {
            let agent_id = required_arg(delete_matches, "agent")?;
            let session_id = required_arg(delete_matches, "id")?;
            backend.delete_session(&agent_id, &session_id).await?;
            println!("Deleted session {session_id}");
        }
        Some((_, list_matches)) => {
            let agent_id = required_arg(list_matches, "agent")?;
            let sessions = backend.list_sessions(&agent_id).await?;
            print_listing(
                format_sessions(&sessions),
                sessions.is_empty(),
                "There are no sessions for this agent yet.",
            );
        }
        None => {
            bail!("Pick a sessions subcommand, see `dcfdesk sessions --help`");
        }
    }

    return Ok(());
}

pub async fn status(backend: &BackendBox) -> Result<()> {
    backend.health_check().await?;
    println!(
        "{}",
        Paint::green(format!(
            "The {} backend at {} is up.",
            backend.name(),
            Config::get(ConfigKey::ApiURL)
        ))
    );

    return Ok(());
}

/// Interactive agent picker used when `chat` starts without `--agent`.
pub async fn pick_agent(backend: &BackendBox) -> Result<Option<String>> {
    let agents = backend.list_agents().await?;
    if agents.is_empty() {
        println!("No agents are available.");
        return Ok(None);
    }

    let options = agents
        .iter()
        .map(|agent| return format!("{} ({})", agent.label, agent.model))
        .collect::<Vec<String>>();

    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Which agent would you like to talk to?")
        .default(0)
        .items(&options)
        .interact_opt()?;

    return Ok(idx.map(|idx| return agents[idx].value.to_string()));
}
