use aletheia_core::{normalize, TimelineConfig, APP_NAME, APP_VERSION};
use aletheia_kernel::dossier::{format_entry, render_dossier};
use aletheia_kernel::telemetry::{self, TelemetryOptions};
use aletheia_kernel::{AnalysisController, AppConfig, RunOutcome, SessionSnapshot};
use aletheia_provider::OpenRouterProvider;
use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");

    Command::new("aletheia")
        .version(APP_VERSION)
        .about(format!("{APP_NAME} dialectical analysis terminal"))
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit diagnostics as JSON lines on stderr"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug-level diagnostics"),
        )
        .subcommand(
            Command::new("analyze")
                .about("Run a dialectical analysis and stream the narration")
                .arg(
                    Arg::new("query")
                        .required(true)
                        .value_name("QUERY")
                        .help("Market or topic to analyze"),
                )
                .arg(config_arg.clone())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the result as JSON instead of a dossier"),
                )
                .arg(
                    Arg::new("fast")
                        .long("fast")
                        .action(ArgAction::SetTrue)
                        .help("Skip narration pacing"),
                ),
        )
        .subcommand(
            Command::new("normalize")
                .about("Normalize a raw provider payload")
                .arg(
                    Arg::new("path")
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf))
                        .help("Payload file; stdin when omitted"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(config_arg),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    telemetry::init(TelemetryOptions {
        json: matches.get_flag("log-json"),
        verbose: matches.get_flag("verbose"),
    });

    match matches.subcommand() {
        Some(("analyze", args)) => analyze(args).await,
        Some(("normalize", args)) => {
            normalize_payload(args.get_one::<PathBuf>("path"))?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("config", args)) => {
            let config = AppConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
            print!("{}", config.to_toml_string()?);
            Ok(ExitCode::SUCCESS)
        }
        _ => unreachable!("subcommand is required"),
    }
}

async fn analyze(args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let query = args
        .get_one::<String>("query")
        .map(String::as_str)
        .unwrap_or_default();
    let json = args.get_flag("json");

    let mut config = AppConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if args.get_flag("fast") {
        config.engine.timeline = TimelineConfig::instant();
    }

    let provider =
        OpenRouterProvider::new(config.provider.clone()).context("failed to build provider")?;
    if !provider.has_api_key() {
        tracing::warn!("no API key configured; set OPENROUTER_API_KEY");
    }

    let controller = AnalysisController::new(provider, config.engine);
    let mut updates = controller.subscribe();
    let Some(run) = controller.submit(query) else {
        bail!("query must not be empty");
    };

    let mut printed = 0;
    let wait = run.wait();
    tokio::pin!(wait);
    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            Ok(()) = updates.changed() => {
                if !json {
                    let snapshot = updates.borrow_and_update().clone();
                    print_new_entries(&snapshot, &mut printed);
                }
            }
        }
    };

    let snapshot = controller.snapshot();
    if !json {
        print_new_entries(&snapshot, &mut printed);
    }

    match (outcome, snapshot.result) {
        (RunOutcome::Completed, Some(result)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!();
                print!("{}", render_dossier(query, &result));
            }
            Ok(ExitCode::SUCCESS)
        }
        (RunOutcome::Failed(error), _) => {
            tracing::error!(error = %error, "analysis failed");
            Ok(ExitCode::FAILURE)
        }
        (outcome, _) => {
            tracing::error!(?outcome, "analysis did not complete");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_new_entries(snapshot: &SessionSnapshot, printed: &mut usize) {
    for entry in snapshot.entries.iter().skip(*printed) {
        println!("{}", format_entry(entry));
    }
    *printed = (*printed).max(snapshot.entries.len());
}

fn normalize_payload(path: Option<&PathBuf>) -> anyhow::Result<()> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    let raw: serde_json::Value = serde_json::from_str(&text).context("payload is not JSON")?;
    println!("{}", serde_json::to_string_pretty(&normalize(&raw))?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn analyze_flags_parse() {
        let matches = cli()
            .try_get_matches_from(["aletheia", "-v", "analyze", "fintech", "--fast", "--json"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "analyze");
        assert_eq!(args.get_one::<String>("query").unwrap(), "fintech");
        assert!(args.get_flag("fast"));
        assert!(args.get_flag("json"));
    }

    #[test]
    fn analyze_requires_query() {
        assert!(cli().try_get_matches_from(["aletheia", "analyze"]).is_err());
    }
}
