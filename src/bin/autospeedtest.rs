use clap::Parser;
use console::{Term, set_colors_enabled, style};
use std::io::{self, IsTerminal};
use std::process;
use tokio::signal;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use autospeedtest::adapters::speedtest_cli::DEFAULT_PROGRAM;
use autospeedtest::config::{PromptSettings, resolve_tokens};
use autospeedtest::fmt::text::{render_banner, render_schedule};
use autospeedtest::{
    ConsoleSink, CsvLog, ScheduleConfig, Scheduler, SpeedtestCli, SpeedtestError,
};

#[derive(Parser, Debug)]
#[command(name = "autospeedtest")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run speedtest-cli at a fixed interval and log the results to CSV")]
#[command(long_about = Some(
    "Run speedtest-cli at a fixed interval and log the results to CSV.\n\
     \n\
     Settings are given as key:value tokens after the flags:\n\
       timeout:<secs>            per-request timeout of the tool (default 10)\n\
       servers:<id>[,<id>...]    server ids to test, in order (default: best available)\n\
       log:<path>                CSV file (default speedtest-log.csv)\n\
       interval:<n>[s|m|h|d]     time between rounds (default 1h)\n\
       decimalSeparator:<. or ,> decimal separator in the CSV (default .)\n\
       delimiter:<char>          CSV delimiter (default ;)\n\
       gui:true                  ask for the settings interactively\n\
     \n\
     Examples:\n\
       autospeedtest interval:30m servers:1234,5678\n\
       autospeedtest --once log:logs/net.csv delimiter:, decimalSeparator:."
))]
struct Args {
    /// Measurement tool to run
    #[arg(long, default_value = DEFAULT_PROGRAM)]
    tool: String,

    /// Run one round of measurements and exit
    #[arg(long)]
    once: bool,

    /// Disable colored output
    #[arg(long = "no-color", alias = "nocolor")]
    no_color: bool,

    /// Settings as key:value tokens
    #[arg(value_name = "SETTING", trailing_var_arg = true, allow_hyphen_values = true)]
    settings: Vec<String>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let args = Args::parse();

    let want_color = io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && !args.no_color;
    set_colors_enabled(want_color);

    let term = Term::stdout();
    let exit_code = match run(args, &term).await {
        Ok(()) => 0,
        Err(e) => handle_error(&term, e),
    };
    process::exit(exit_code);
}

async fn run(args: Args, term: &Term) -> Result<(), SpeedtestError> {
    term.write_line(&render_banner(env!("CARGO_PKG_VERSION")))
        .ok();

    let resolution = resolve_tokens(&args.settings);
    for rejected in &resolution.rejected {
        warning(term, &rejected.to_string());
    }

    let config = if resolution.gui {
        let mut input = io::stdin().lock();
        let mut output = term.clone();
        let settings = PromptSettings::ask(&mut input, &mut output, &resolution.config)?;
        ScheduleConfig::from_source(&settings)
    } else {
        resolution.config
    };
    if config.separator_clash() {
        warning(
            term,
            &format!(
                "delimiter and decimal separator are both '{}', numbers will be ambiguous",
                config.delimiter
            ),
        );
    }

    let cli = SpeedtestCli::new(&args.tool);
    cli.check_available().await?;

    let log = CsvLog::from_config(&config);
    if let Err(e) = log.ensure_header() {
        // retried before every append
        warning(term, &e.to_string());
    }

    let sink = ConsoleSink::new(term.clone());
    let mut scheduler = Scheduler::new(&config, cli, &log, &sink);

    if args.once {
        scheduler.run_tick().await;
        return Ok(());
    }

    term.write_line(&render_schedule(&config)).ok();
    scheduler
        .run_until(async {
            if signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

fn warning(term: &Term, text: &str) {
    term.write_line(&style(format!("Warning: {text}")).yellow().to_string())
        .ok();
}

fn handle_error(term: &Term, err: SpeedtestError) -> i32 {
    term.write_line(&style(format!("Error: {}", err)).red().bold().to_string())
        .ok();
    if let SpeedtestError::ToolUnavailable { .. } = err {
        term.write_line("Install it with `pip install speedtest-cli` or point --tool at it.")
            .ok();
    }
    2
}
