//! mountbot entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load the JSON config file and validate every
//!    gateway setting.
//! 2. **Wire observability**: install `tracing-subscriber` with a JSON layer
//!    and, when configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: build the XIVAPI and Sheets clients and
//!    spawn the gateway each subcommand needs. Gateways are owned here and
//!    passed by reference; nothing is global.
//! 4. **Run the subcommand** and drain the gateway before exiting.

mod config;
mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use gateway::ServiceName;
use serde_json::Value;
use sheets::{BatchUpdate, SheetWriter, SheetsClient, SpreadsheetId};
use tracing::info;
use xivapi::{CharacterData, CharacterRequest, Lodestone, XivApiClient};

use crate::config::Config;
use crate::telemetry::Telemetry;

#[derive(Debug, Parser)]
#[command(name = "mountbot", version, about = "Rate-limited XIVAPI lookups and Google Sheets writes")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve character names to Lodestone ids (exact name match).
    Search {
        #[arg(required = true)]
        names: Vec<String>,
        /// Restrict the search to one world.
        #[arg(long)]
        server: Option<String>,
    },
    /// Fetch characters by Lodestone id.
    Lookup {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Optional profile section (AC, FR, FC, FCM, MIMO, PVP). Repeatable.
        #[arg(long = "data")]
        data: Vec<CharacterData>,
    },
    /// Send one batchUpdate to a spreadsheet.
    Write {
        #[arg(long)]
        spreadsheet: String,
        /// JSON file holding either `{"requests": [...]}` or a bare array.
        #[arg(long)]
        requests: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let telemetry = Telemetry::init(config.log_level, config.otlp_endpoint.as_deref())?;

    let outcome = run(cli.command, &config).await;
    if let Err(err) = &outcome {
        tracing::error!(error = %format!("{err:#}"), "command failed");
    }
    telemetry.shutdown();
    outcome
}

async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Search { names, server } => search(config, &names, server.as_deref()).await,
        Command::Lookup { ids, data } => lookup(config, ids, &data).await,
        Command::Write {
            spreadsheet,
            requests,
        } => write(config, &spreadsheet, &requests).await,
    }
}

fn service_name(value: &str) -> anyhow::Result<ServiceName> {
    ServiceName::new(value).context("service name must not be empty")
}

fn lodestone(config: &Config) -> anyhow::Result<Lodestone> {
    let client = XivApiClient::new(config.xivapi_api_key()?)?;
    let settings = config.xivapi.gateway_config("Xivapi")?;
    info!(rate = %settings.rate_limit.rate, mode = ?settings.mode, "starting Lodestone gateway");
    Ok(Lodestone::spawn(service_name(xivapi::SERVICE_NAME)?, client, settings))
}

async fn search(config: &Config, names: &[String], server: Option<&str>) -> anyhow::Result<()> {
    let lodestone = lodestone(config)?;
    let profiles = lodestone.resolve_names(names, server).await?;
    for (name, profile) in names.iter().zip(profiles) {
        match profile {
            Some(profile) => println!("{name}\t{}\t{}", profile.id, profile.server),
            None => println!("{name}\tnot found"),
        }
    }
    lodestone.shutdown().await;
    Ok(())
}

async fn lookup(config: &Config, ids: Vec<String>, data: &[CharacterData]) -> anyhow::Result<()> {
    let lodestone = lodestone(config)?;
    let requests = ids
        .iter()
        .map(|id| {
            data.iter()
                .fold(CharacterRequest::new(id.as_str()), |request, section| {
                    request.with_data(*section)
                })
        })
        .collect();
    let characters = lodestone.get_characters(requests).await?;
    for (id, character) in ids.iter().zip(characters) {
        match character {
            Some(c) => println!(
                "{id}\t{}\tmounts={}\tminions={}",
                c.character.name,
                c.mounts.len(),
                c.minions.len()
            ),
            None => println!("{id}\tnot found"),
        }
    }
    lodestone.shutdown().await;
    Ok(())
}

async fn write(config: &Config, spreadsheet: &str, requests: &Path) -> anyhow::Result<()> {
    let spreadsheet_id = SpreadsheetId::new(spreadsheet)
        .with_context(|| format!("invalid spreadsheet id '{spreadsheet}'"))?;
    let raw = std::fs::read_to_string(requests)
        .with_context(|| format!("reading {}", requests.display()))?;
    let updates = parse_requests(&raw).with_context(|| format!("parsing {}", requests.display()))?;

    let client = SheetsClient::new(config.sheets_access_token()?)?;
    let settings = config.sheets.gateway_config("Sheets")?;
    let writer = SheetWriter::spawn(service_name(sheets::SERVICE_NAME)?, client, settings);

    let token = writer.enqueue(BatchUpdate::new(spreadsheet_id, updates))?;
    println!("{token}");
    writer.shutdown().await;
    Ok(())
}

fn parse_requests(raw: &str) -> anyhow::Result<Vec<Value>> {
    match serde_json::from_str(raw)? {
        Value::Array(requests) => Ok(requests),
        Value::Object(mut body) => match body.remove("requests") {
            Some(Value::Array(requests)) => Ok(requests),
            _ => anyhow::bail!("expected a \"requests\" array"),
        },
        _ => anyhow::bail!("expected an array or an object with a \"requests\" array"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_line_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn lookup_accepts_repeated_data_sections() {
        let cli = Cli::try_parse_from([
            "mountbot", "lookup", "1", "2", "--data", "mimo", "--data", "FCM",
        ])
        .unwrap();

        match cli.command {
            Command::Lookup { ids, data } => {
                assert_eq!(ids, vec!["1", "2"]);
                assert_eq!(
                    data,
                    vec![CharacterData::MountsMinions, CharacterData::FreeCompanyMembers]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }

    #[test]
    fn unknown_data_sections_are_rejected() {
        assert!(Cli::try_parse_from(["mountbot", "lookup", "1", "--data", "XYZ"]).is_err());
    }

    #[test]
    fn batch_files_may_be_wrapped_or_bare() {
        assert_eq!(parse_requests(r#"[{"a": 1}]"#).unwrap().len(), 1);
        assert_eq!(parse_requests(r#"{"requests": [{"a": 1}, {"b": 2}]}"#).unwrap().len(), 2);
        assert!(parse_requests(r#"{"updates": []}"#).is_err());
        assert!(parse_requests("42").is_err());
    }
}
