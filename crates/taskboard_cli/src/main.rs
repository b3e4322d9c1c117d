//! CLI smoke entry point.
//!
//! # Responsibility
//! - Dispatch one request through the taskboard request surface.
//! - Print `ping`/version when called without arguments.
//!
//! Usage: `taskboard <METHOD> <PATH> [JSON_BODY]`

use log::error;
use std::process::ExitCode;
use taskboard_api::TaskboardApi;
use taskboard_core::{core_version, init_from_config, ping, CoreConfig};

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        println!("taskboard_core ping={}", ping());
        println!("taskboard_core version={}", core_version());
        return ExitCode::SUCCESS;
    }
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: taskboard <METHOD> <PATH> [JSON_BODY]");
        return ExitCode::from(2);
    }

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::from(2);
        }
    };
    if let Err(err) = init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let api = match TaskboardApi::open(&config) {
        Ok(api) => api,
        Err(err) => {
            error!("event=cli_start module=cli status=error error={err}");
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let body = args.get(2).map(String::as_str).unwrap_or_default();
    let response = api.handle(&args[0], &args[1], body);
    println!("{} {}", response.status, response.content_type);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    if !response.body.is_empty() {
        println!();
        println!("{}", response.body);
    }

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
