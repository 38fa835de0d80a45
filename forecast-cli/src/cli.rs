use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, FixedDelay, Interpreter, NoDelay, NominatimClient, NwsClient, ReqwestTransport,
    RunError, Throttle, parse, report,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Geocode, fetch and summarize hourly forecasts")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip the pause after each successful live request.
    #[arg(long, global = true)]
    pub no_throttle: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a directive script (the default).
    Run {
        /// Read directives from this file instead of stdin.
        #[arg(long)]
        script: Option<PathBuf>,
    },

    /// Show where configuration is read from and the effective settings.
    Config,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Some(Command::Config) => {
                let path = match self.config {
                    Some(path) => path,
                    None => Config::config_file_path()?,
                };
                println!("# {}", path.display());
                print!("{}", config.to_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            Some(Command::Run { script: Some(path) }) => {
                let file = File::open(&path)
                    .with_context(|| format!("Failed to open script: {}", path.display()))?;
                execute(&config, self.no_throttle, BufReader::new(file), &mut io::stdout().lock())
                    .await
            }
            Some(Command::Run { script: None }) | None => {
                execute(&config, self.no_throttle, io::stdin().lock(), &mut io::stdout().lock())
                    .await
            }
        }
    }
}

async fn execute(
    config: &Config,
    no_throttle: bool,
    input: impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let transport = Arc::new(ReqwestTransport::new());
    let throttle: Arc<dyn Throttle> =
        if no_throttle { Arc::new(NoDelay) } else { Arc::new(FixedDelay(config.throttle())) };

    let interpreter = Interpreter::new(
        Box::new(NominatimClient::new(&config.nominatim, transport.clone(), throttle.clone())),
        Box::new(NwsClient::new(&config.nws, transport, throttle)),
    );

    let script = parse(input.lines().map_while(Result::ok));
    tracing::debug!(
        immediate = script.immediate.len(),
        statistics = script.statistic_count(),
        "script parsed"
    );

    match interpreter.run(&script, Utc::now(), out).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(RunError::Resolve(err)) => {
            tracing::debug!(error = %err, "run failed");
            report::write_failure(out, &err)?;
            out.flush()?;
            Ok(ExitCode::FAILURE)
        }
        Err(RunError::Output(err)) => Err(err).context("Failed to write output"),
    }
}
