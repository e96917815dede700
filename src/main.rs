use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use class_join_core::app::SUCCESS_MESSAGE;
use class_join_core::error::{ErrorKind, Result};
use class_join_core::interface::HttpClient;
use class_join_core::model::TokenRecord;
use class_join_core::{
    JoinClassForm, JoinConfig, NoWasmClient, Reconciliation, TokenCache, TokenSource,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Join a class with a class code.
#[derive(Debug, Parser)]
#[command(name = "join-class", version)]
struct Cli {
    /// Class code to submit. Without one, codes are read from stdin, one per line.
    code: Option<String>,

    /// Config file (default: ~/.class-join/config.toml if it exists).
    #[arg(long)]
    config: Option<PathBuf>,

    /// API base URL, e.g. https://school.example/api
    #[arg(long, env = "CLASS_JOIN_API_BASE")]
    api_base: Option<String>,

    #[arg(long, env = "CLASS_JOIN_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    #[arg(long, env = "CLASS_JOIN_CSRF_TOKEN", hide_env_values = true)]
    csrf_token: String,

    /// Request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the refreshed token record as JSON after a successful join.
    #[arg(long)]
    print_record: bool,
}

fn load_config(cli: &Cli) -> Result<JoinConfig> {
    let from_file = match &cli.config {
        Some(path) => Some(JoinConfig::load(path)?),
        None => match JoinConfig::default_path() {
            Some(path) if path.exists() => Some(JoinConfig::load(&path)?),
            _ => None,
        },
    };

    let mut config = match (from_file, &cli.api_base) {
        (Some(config), None) => config,
        (Some(config), Some(base)) => JoinConfig {
            api_base: JoinConfig::parse(base)?.api_base,
            ..config
        },
        (None, Some(base)) => JoinConfig::parse(base)?,
        (None, None) => {
            return Err(ErrorKind::ConfigError(
                "no API base: pass --api-base, set CLASS_JOIN_API_BASE or write a config file"
                    .to_string(),
            )
            .into());
        }
    };

    if let Some(ms) = cli.timeout_ms {
        config.request_timeout = Some(Duration::from_millis(ms));
    }
    Ok(config)
}

/// Submit whatever is in the form and report it. Returns whether a class was joined.
async fn submit_and_report(form: &JoinClassForm<NoWasmClient>, print_record: bool) -> bool {
    match form.submit().await {
        Ok(Reconciliation::Joined { record }) => {
            println!("{SUCCESS_MESSAGE}");
            if print_record {
                println!("{}", record.to_value());
            }
            form.dismiss_banner();
            true
        }
        Ok(Reconciliation::AlreadyHandled { .. }) => true,
        Ok(_) => {
            let message = form.notice().map(|n| n.message().to_string()).unwrap_or_default();
            eprintln!("Could not join class: {message}");
            false
        }
        Err(e) => {
            eprintln!("Join request failed: {e}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::debug!("joining through {}", config.join_url()?);

    let record: TokenRecord = serde_json::from_value(serde_json::json!({
        "accessToken": cli.access_token,
    }))?;
    let form = JoinClassForm::new(
        NoWasmClient::new(&config)?,
        config,
        TokenCache::with_record(record),
        TokenSource::ready(cli.csrf_token.clone()),
    );

    if let Some(code) = &cli.code {
        form.set_code(code.as_str());
        let joined = submit_and_report(&form, cli.print_record).await;
        return Ok(if joined { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut failures = 0usize;

    loop {
        stdout.write_all(b"Enter a Class Code: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let code = line.trim();
        if code.is_empty() {
            continue;
        }

        form.set_code(code);
        if !submit_and_report(&form, cli.print_record).await {
            failures += 1;
        }
    }

    form.close();
    Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(config: &std::path::Path, extra: &[&str]) -> Cli {
        let mut args = vec![
            "join-class",
            "--config",
            config.to_str().unwrap(),
            "--access-token",
            "a",
            "--csrf-token",
            "c",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    fn config_file(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api-base = \"https://file.example/api\"\nrequest-timeout-ms = 1500\ntoken-wait-ms = 250\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn config_file_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file(&dir);

        let config = load_config(&cli(&path, &[])).unwrap();

        assert_eq!(config.api_base.as_str(), "https://file.example/api");
        assert_eq!(config.request_timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file(&dir);

        let config = load_config(&cli(
            &path,
            &["--api-base", "https://flag.example/v2", "--timeout-ms", "300"],
        ))
        .unwrap();

        assert_eq!(config.api_base.as_str(), "https://flag.example/v2");
        assert_eq!(config.request_timeout, Some(Duration::from_millis(300)));
        assert_eq!(config.token_wait, Some(Duration::from_millis(250)));
    }

    #[test]
    fn bad_api_base_flag_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file(&dir);

        assert!(load_config(&cli(&path, &["--api-base", "ftp://flag.example"])).is_err());
    }
}
