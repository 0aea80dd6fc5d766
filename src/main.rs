use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;

fn main() -> Result<()> {
    let cfg = scroll_canvas::config::Config::parse();
    cfg.validate()?;
    init_logging(cfg.log_file.as_deref())?;

    log::info!("starting with {:?}", cfg);
    scroll_canvas::app::run(cfg)
}

/// The terminal owns stdout and stderr while running, so logs go to a file when one is
/// given, and to stderr only when `RUST_LOG` asks for them.
fn init_logging(log_file: Option<&str>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create log file {path}"))?;
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
        None if std::env::var_os("RUST_LOG").is_some() => env_logger::init(),
        None => {}
    }
    Ok(())
}
