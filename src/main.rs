use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use wifi_locate::{
    Budgets, Config, NmcliWireless, Orchestrator, Settings, SystemLocationHost, emit, format_line,
};

#[derive(Parser)]
#[command(name = "wifi-locate")]
#[command(about = "Print the associated WiFi network and, optionally, a WiFi-derived location")]
#[command(version)]
struct Cli {
    /// Also try to determine the device position
    #[arg(long)]
    location: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn init_logging(settings: &Settings) {
    let mut builder = env_logger::Builder::new();

    if settings.debug {
        builder.filter_level(LevelFilter::Debug);
    } else if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    } else {
        builder.filter_level(LevelFilter::Off);
    }

    builder
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(cli: &Cli, settings: &Settings) -> Result<()> {
    let config = Config::load_or_default(cli.config.as_deref());

    // Without host bindings there is no result to print at all
    let mut host = SystemLocationHost::new(&config)?;

    let result = Orchestrator::new(&mut host, &NmcliWireless, Budgets::from(&config.timeouts))
        .run(cli.location);
    drop(host);

    emit(&format_line(&result), settings.output_file.as_deref())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    init_logging(&settings);

    match run(&cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
