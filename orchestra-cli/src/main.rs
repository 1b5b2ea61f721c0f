use orchestra_cli::{CliError, OrchestraConfig, RunRequest, render_report, run};
use orchestra_loop::CancellationToken;
use std::io::Read;
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("orchestra error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), CliError> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(first) = args.first().cloned() {
        match first.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "run" => {
                args.remove(0);
            }
            flag if flag.starts_with('-') => {}
            other => return Err(CliError::Config(format!("unknown subcommand: {other}"))),
        }
    }

    let mut config_path: Option<PathBuf> = None;
    let mut request = RunRequest::default();
    let mut prompt: Option<String> = None;
    let mut json = false;
    let mut verbose = false;

    let mut remaining = args;
    while let Some(flag) = remaining.first().cloned() {
        remaining.remove(0);
        match flag.as_str() {
            "--config" => config_path = Some(PathBuf::from(take_arg("--config", &mut remaining)?)),
            "--prompt" => prompt = Some(take_arg("--prompt", &mut remaining)?),
            "--budget" => request.budget = Some(parse_arg("--budget", &mut remaining)?),
            "--speed" => request.speed = Some(parse_arg("--speed", &mut remaining)?),
            "--quality" => request.quality = Some(parse_arg("--quality", &mut remaining)?),
            "--max-turns" => request.max_turns = Some(parse_arg("--max-turns", &mut remaining)?),
            "--privacy" => request.privacy = Some(true),
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other => return Err(CliError::Config(format!("unknown flag: {other}"))),
        }
    }

    init_tracing(verbose);

    let config = match config_path {
        Some(path) => OrchestraConfig::from_path(&path)?,
        None => {
            let default_path = PathBuf::from("orchestra.json");
            if default_path.exists() {
                OrchestraConfig::from_path(&default_path)?
            } else {
                OrchestraConfig::default()
            }
        }
    }
    .with_env()?;

    request.prompt = match prompt {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer.trim().to_string()
        }
    };
    if request.prompt.trim().is_empty() {
        return Err(CliError::Config(
            "missing prompt: pass --prompt or pipe stdin".to_string(),
        ));
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = run(&config, &request, &cancel).await?;
    println!("{}", render_report(&result, json)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn take_arg(flag: &str, remaining: &mut Vec<String>) -> Result<String, CliError> {
    if remaining.is_empty() {
        return Err(CliError::Config(format!("missing value for {flag}")));
    }
    Ok(remaining.remove(0))
}

fn parse_arg<T: std::str::FromStr>(flag: &str, remaining: &mut Vec<String>) -> Result<T, CliError> {
    let value = take_arg(flag, remaining)?;
    value
        .parse()
        .map_err(|_| CliError::Config(format!("invalid value for {flag}: {value}")))
}

fn print_usage() {
    println!(
        "orchestra [run] [--config orchestra.json] [--prompt TEXT] [--budget 0-1] [--privacy] \
         [--speed 0-1] [--quality 0-1] [--max-turns N] [--json] [--verbose]"
    );
}
