use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use std::net::Ipv4Addr;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};

use portprobe::{PortStatus, ProbeConfig, ProbeEngine, ProbeError, ProbeReport, Target};

fn build_cli() -> Command {
    Command::new("portprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Check whether remote TCP ports accept connections and whether local ports are taken")
        .arg(
            Arg::new("entries")
                .value_name("ENTRY")
                .help("Address (localhost:8080, http://site.com, 10.0.0.1:22) or local port number")
                .required(true)
                .num_args(1..),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("MS")
                .help("Connect timeout in milliseconds for address entries")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("bind-timeout")
                .long("bind-timeout")
                .value_name("MS")
                .help("Upper bound in milliseconds for a local bind check")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("bind-address")
                .long("bind-address")
                .value_name("IPV4")
                .help("Local address for port entries (default: primary interface address)")
                .value_parser(clap::value_parser!(Ipv4Addr)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file (default: ~/.portprobe.toml)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("greppable")
                .short('g')
                .long("greppable")
                .help("Greppable output. Only print entries that are open or in use")
                .action(ArgAction::SetTrue)
                .conflicts_with("json"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Report each probe as it completes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
}

/// Merge config file values with command line overrides
fn load_config(matches: &ArgMatches) -> anyhow::Result<ProbeConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ProbeConfig::from_toml_file(path)
            .with_context(|| format!("could not load config {}", path))?,
        None => ProbeConfig::load_default_config(),
    };

    if let Some(&timeout) = matches.get_one::<u64>("timeout") {
        config = config.with_connect_timeout(timeout);
    }
    if let Some(&timeout) = matches.get_one::<u64>("bind-timeout") {
        config = config.with_bind_timeout(timeout);
    }
    if let Some(&address) = matches.get_one::<Ipv4Addr>("bind-address") {
        config = config.with_bind_address(address);
    }

    config.validate()?;
    Ok(config)
}

fn print_report(report: &ProbeReport, greppable: bool) {
    for (target, status) in report.entries() {
        if greppable {
            if status.is_up() {
                println!("{}", target);
            }
            continue;
        }

        let label = match status {
            PortStatus::Open => "open".bright_green().bold(),
            PortStatus::InUse => "in use".bright_yellow().bold(),
            PortStatus::Closed => "closed".bright_red(),
            PortStatus::Free => "free".bright_blue(),
        };
        println!("{:<40} {}", target.to_string().bright_cyan(), label);
    }

    if !greppable {
        println!(
            "{} {}/{} up in {:.2?}",
            "[~]".bright_blue(),
            report.up_count(),
            report.len(),
            report.duration
        );
    }
}

/// Point a validation failure back at the command line argument that caused it
fn rejected_entry(err: ProbeError, entries: &[String]) -> anyhow::Error {
    match err.entry_index().and_then(|i| entries.get(i).map(|entry| (i, entry))) {
        Some((i, entry)) => {
            anyhow::Error::new(err).context(format!("argument {} '{}' rejected", i + 1, entry))
        }
        None => err.into(),
    }
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }

    let config = load_config(&matches)?;
    log::debug!("Using {:?}", config);

    let entries: Vec<String> = matches
        .get_many::<String>("entries")
        .map(|entries| entries.cloned().collect())
        .unwrap_or_default();
    let targets: Vec<Target> = entries.iter().map(|entry| Target::parse(entry)).collect();

    let engine = ProbeEngine::new(config)?;

    let total = targets.len();
    let completed = AtomicUsize::new(0);
    let progress = |up: bool| {
        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        eprintln!(
            "{} {}/{} done ({})",
            "[~]".bright_blue(),
            done,
            total,
            if up { "up" } else { "down" }
        );
    };
    let callback: Option<portprobe::ProbeCallback<'_>> = if matches.get_flag("verbose") {
        Some(&progress)
    } else {
        None
    };

    let report = engine
        .probe_report(&targets, callback)
        .await
        .map_err(|e| rejected_entry(e, &entries))?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, matches.get_flag("greppable"));
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = build_cli().get_matches();

    if let Err(e) = run(matches).await {
        eprintln!("{} {:#}", "[!] ERROR:".bright_red(), e);
        process::exit(1);
    }
}
