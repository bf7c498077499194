//! oomreaper one-shot CLI
//!
//! ```text
//! oomreaper probe [--config PATH] [--metrics]   print the subtree's OOM status
//! oomreaper kill  [--config PATH] [--metrics]   run one kill pass unconditionally
//! oomreaper check [--config PATH] [--metrics]   probe, and run a kill pass if under OOM
//! ```
//!
//! `--metrics` prints the Prometheus counters in text format after the run,
//! for a node-exporter textfile collector or similar.
//!
//! Scheduling (how often to `check`) belongs to whatever runs this binary.

use std::path::PathBuf;
use std::process::ExitCode;

use oomreaper::config::{ReaperConfig, DEFAULT_CONFIG_PATH};
use oomreaper::{metrics, security, telemetry, Reaper, VictimOutcome};

enum Command {
    Probe,
    Kill,
    Check,
}

fn usage() -> ExitCode {
    eprintln!("usage: oomreaper <probe|kill|check> [--config PATH] [--metrics]");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let mut command = None;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut export_metrics = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "probe" => command = Some(Command::Probe),
            "kill" => command = Some(Command::Kill),
            "check" => command = Some(Command::Check),
            "--metrics" => export_metrics = true,
            "--config" => match args.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => return usage(),
            },
            _ => return usage(),
        }
    }
    let Some(command) = command else {
        return usage();
    };

    let (config, ctx) = match ReaperConfig::from_file(&config_path)
        .and_then(|config| config.context().map(|ctx| (config, ctx)))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("oomreaper: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = telemetry::init_tracing(config.log_filter.as_deref(), config.json_logs) {
        eprintln!("oomreaper: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match security::preflight() {
        Ok(missing) if !missing.is_empty() => {
            tracing::warn!(missing = ?missing, "Missing capabilities, kills will likely fail");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Could not read process capabilities"),
    }

    let reaper = Reaper::live(ctx);

    let run_pass = match command {
        Command::Kill => true,
        Command::Probe | Command::Check => match reaper.probe_oom() {
            Ok(status) => {
                println!(
                    "{}: {}",
                    reaper.context().subtree_path().display(),
                    if status.is_under_oom() { "under_oom" } else { "ok" }
                );
                matches!(command, Command::Check) && status.is_under_oom()
            }
            Err(e) => {
                tracing::error!(error = %e, "Aborting: OOM control unusable");
                if export_metrics {
                    print!("{}", metrics::gather_text());
                }
                return ExitCode::FAILURE;
            }
        },
    };

    if run_pass {
        match reaper.find_victim() {
            VictimOutcome::Killed(report) => println!(
                "uid {}: {} signaled, {} skipped, {} vanished, {} failures",
                report.uid,
                report.signaled.len(),
                report.skipped.len(),
                report.vanished.len(),
                report.failures.len()
            ),
            VictimOutcome::NoVictim => println!("no victim"),
        }
    }

    if export_metrics {
        print!("{}", metrics::gather_text());
    }

    ExitCode::SUCCESS
}
