use std::process::ExitCode;

use terracost::Config;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::load();
    log::debug!("loaded {config:?}");

    if let Err(e) = terracost::run(std::env::args(), &config) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
