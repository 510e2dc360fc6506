//! Non-interactive filter binary.
//!
//! Reads items from stdin (or a command after `--`), applies the query
//! once, and prints the ranked matches to stdout. Exits 1 when nothing
//! matched, 2 on usage or configuration errors.

use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use sieve_core::error::Error;
use sieve_core::types::command::CommandSpec;
use sieve_core::types::config::PickerConfig;
use sieve_core::types::item::Item;
use sieve_core::types::source::ItemSource;
use sieve_picker::Session;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: sieve [OPTIONS] [QUERY] [-- PROGRAM [ARGS...]]

Filters items by QUERY and prints the matches in rank order.
Items come from stdin, one per line, unless a command follows `--`;
its stdout is used instead ({q} in ARGS is replaced by QUERY).

options:
  -c, --config FILE   read picker configuration (TOML) from FILE
  -1, --first         print only the best match
  -h, --help          show this help
";

struct Args {
    query: String,
    config: PickerConfig,
    first_only: bool,
    command: Option<CommandSpec>,
}

fn parse_args() -> Result<Option<Args>, Error> {
    let mut raw = std::env::args().skip(1);
    let mut query = String::new();
    let mut config = PickerConfig::default();
    let mut first_only = false;
    let mut command = None;

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print!("{USAGE}");
                return Ok(None);
            }
            "-1" | "--first" => first_only = true,
            "-c" | "--config" => {
                let path = raw.next().ok_or_else(|| {
                    sieve_core::error::ConfigError::MalformedOption(
                        "--config requires a file path".to_string(),
                    )
                })?;
                let text = std::fs::read_to_string(&path)?;
                config = PickerConfig::from_toml_str(&text)?;
            }
            "--" => {
                let mut rest = raw.by_ref();
                let program = rest.next().ok_or_else(|| {
                    sieve_core::error::ConfigError::InvalidSource(
                        "`--` requires a program".to_string(),
                    )
                })?;
                command = Some(CommandSpec::new(&program, rest.collect())?);
            }
            _ if query.is_empty() => query = arg,
            _ => {
                return Err(sieve_core::error::ConfigError::MalformedOption(format!(
                    "unexpected argument: {arg}"
                ))
                .into());
            }
        }
    }

    Ok(Some(Args {
        query,
        config,
        first_only,
        command,
    }))
}

fn read_stdin_items() -> Result<Vec<Item>, Error> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer
        .lines()
        .map(|line| Item::from(line.strip_suffix('\r').unwrap_or(line)))
        .collect())
}

fn run(args: Args) -> Result<bool, Error> {
    let source = match args.command {
        Some(spec) => ItemSource::Command(spec),
        None => ItemSource::List(read_stdin_items()?),
    };

    let mut session = Session::start(source, args.config, Arc::new(|| {}))?;
    session.set_query(&args.query);
    while session.tick() {
        std::thread::sleep(Duration::from_millis(1));
    }

    if let Some(error) = session.last_ingest_error() {
        eprintln!("sieve: item source failed: {error}");
    }

    let matched = session.match_count() > 0;
    for item in session.choose_all() {
        println!("{}", item.display());
        if args.first_only {
            break;
        }
    }
    Ok(matched)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sieve: {err}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("sieve: {err}");
            ExitCode::from(2)
        }
    }
}
