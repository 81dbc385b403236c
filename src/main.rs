use component_detection::cli::commands::{CliArgs, Commands};
use component_detection::cli::handlers::{handle_detect, handle_show};
use component_detection::util::logging::{init_logging, parse_level, LoggingConfig};
use component_detection::{DetectorConfig, VERSION};

use clap::Parser;
use tracing::{debug, error, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let config = DetectorConfig::default();
    init_logging_from_args(&args, &config);

    debug!("component-detection v{} starting", VERSION);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        std::process::exit(2);
    }

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args, config).await,
        Commands::Show(show_args) => handle_show(show_args, config).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs, config: &DetectorConfig) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&config.log_level)
    };

    init_logging(LoggingConfig {
        level,
        use_json: config.log_format == "json",
        ..Default::default()
    });
}
