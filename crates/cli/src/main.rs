mod commands;
mod obs;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{Command, DataArgs};

#[derive(Parser)]
#[command(name = "galaxy-trader")]
#[command(about = "RSI + sentiment backtesting for WhiteBIT markets", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  galaxy-trader fetch --symbol BTC_USDT --timeframe 1h --start 2024-01-01\n  galaxy-trader backtest --config galaxy.toml --sentiment 75 --out result.json\n  galaxy-trader sweep --rsi-periods 7,14,21 --thresholds 50,60,70\n  galaxy-trader signal --config galaxy.toml --balance 5000\n"
)]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true, env = "GALAXY_CONFIG")]
    config: Option<PathBuf>,
    /// Log filter, overridden by GALAXY_LOG.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// Log format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
    /// Also write daily-rolling log files to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Download and cache bars.
    Fetch {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Backtest the RSI + sentiment strategy.
    Backtest {
        #[command(flatten)]
        data: DataArgs,
        /// Sentiment score; fetched from LunarCrush when omitted.
        #[arg(long)]
        sentiment: Option<f64>,
        /// Write the JSON result here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Log every step and trade at debug/info level.
        #[arg(long, default_value_t = false)]
        trace: bool,
    },
    /// Backtest a grid of RSI periods and sentiment thresholds in parallel.
    Sweep {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        sentiment: Option<f64>,
        /// Comma-separated RSI periods.
        #[arg(long, value_delimiter = ',')]
        rsi_periods: Vec<usize>,
        /// Comma-separated galaxy score thresholds.
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<f64>,
    },
    /// Report the latest signal and suggested order size. Never places orders.
    Signal {
        #[command(flatten)]
        data: DataArgs,
        #[arg(long)]
        sentiment: Option<f64>,
        /// Account balance used for sizing.
        #[arg(long, default_value_t = 1000.0)]
        balance: f64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let guard = match obs::init_tracing(&cli.log_level, &cli.log_format, cli.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    let command = match cli.command {
        CliCommand::Fetch { data } => Command::Fetch { data },
        CliCommand::Backtest {
            data,
            sentiment,
            out,
            trace,
        } => Command::Backtest {
            data,
            sentiment,
            out,
            trace,
        },
        CliCommand::Sweep {
            data,
            sentiment,
            rsi_periods,
            thresholds,
        } => Command::Sweep {
            data,
            sentiment,
            rsi_periods,
            thresholds,
        },
        CliCommand::Signal {
            data,
            sentiment,
            balance,
        } => Command::Signal {
            data,
            sentiment,
            balance,
        },
    };

    if let Err(err) = commands::run(command, cli.config.as_deref()).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err:#}");
        // Flush the file writer before exiting
        drop(guard);
        std::process::exit(1);
    }
}
