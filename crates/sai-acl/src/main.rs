//! acl-xlate: translate SAI ACL requests into switch API calls.
//!
//! Reads a JSON scenario of table and rule requests, runs it against an
//! in-memory switch engine and prints the native translation as JSON.

use clap::Parser;
use log::{error, info};
use sai_acl::{run, AclApi, AclConfig, EmptyMatchPolicy, Scenario};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use switchapi::MemorySwitch;

/// SAI ACL to switch API translator
#[derive(Parser, Debug)]
#[command(name = "acl-xlate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Translation config file (JSON)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Accept rules without match fields
    #[arg(long)]
    allow_wildcard: bool,

    /// Translate rules without installing them
    #[arg(long)]
    dry_run: bool,

    /// Pretty-print the report
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let mut config = match &args.config {
        Some(path) => match AclConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return ExitCode::from(2);
            }
        },
        None => AclConfig::default(),
    };
    if args.allow_wildcard {
        config = config.with_empty_match_policy(EmptyMatchPolicy::AllowWildcard);
    }
    info!("Config: {:?}", config);

    let scenario = match Scenario::from_file(&args.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let api = AclApi::new(Arc::new(MemorySwitch::new()), config);
    let report = run(&api, &scenario, !args.dry_run);

    let output = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to encode report: {}", e);
            return ExitCode::from(2);
        }
    }

    if report.failures() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
