use clap::Parser;
use simple_pipelines::cli::{Cli, Commands, demo_command, log_command};
use simple_pipelines::error::BoxError;
use simple_pipelines::logging::trace;
use tracing::error;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let file_layer = trace::create_trace_log_file().ok().map(|log_file| {
        fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_filter(EnvFilter::new("debug"))
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_level(true)
                .with_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                ),
        )
        .with(file_layer)
        .init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BoxError> {
    let args = Cli::parse();
    match args.cmd {
        Commands::Log {
            message,
            config,
            level,
            fields,
        } => {
            log_command(message, config, level, fields)?;
        }
        Commands::Demo {
            input,
            column,
            threshold,
            config,
        } => {
            demo_command(input, column, threshold, config)?;
        }
    }
    Ok(())
}
