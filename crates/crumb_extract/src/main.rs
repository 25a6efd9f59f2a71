use std::env;
use std::io;
use std::process::ExitCode;

use crumb_extract::{parse_args, run, usage_text, CliCommand};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    let args = env::args().skip(1).collect::<Vec<_>>();
    let result = match parse_args(&args) {
        Ok(CliCommand::Help) => {
            println!("{}", usage_text());
            Ok(())
        }
        Ok(CliCommand::Extract(options)) => run(&options, &mut io::stdout()),
        Err(message) => Err(message),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}
