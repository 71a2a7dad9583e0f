use clap::Parser;
use screen_trace::cli::commands::{cmd_capture, cmd_convert, cmd_extract, cmd_info, cmd_record};
use screen_trace::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());
    let serial = cli.serial.as_deref();

    match cli.command {
        Commands::Record {
            app,
            task,
            output_root,
            scale,
            script,
        } => {
            cmd_record(
                &config,
                serial,
                &app,
                task,
                output_root.as_deref(),
                scale,
                script.as_deref(),
            )?;
        }
        Commands::Capture {
            app,
            task,
            ui_no,
            output_root,
        } => {
            cmd_capture(&config, serial, &app, task, ui_no, output_root.as_deref())?;
        }
        Commands::Convert { input, output } => {
            cmd_convert(&input, output.as_deref())?;
        }
        Commands::Extract {
            input,
            format,
            output,
        } => {
            cmd_extract(&input, &format, output.as_deref())?;
        }
        Commands::Info => {
            cmd_info(&config, serial)?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the level picked by `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
