use anyhow::Context;

use lantern::{AppConfig, LoggingConfig, init_logging, run};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = AppConfig::from_args().context("invalid command line")?;
    log::info!("starting {} ({}x{})", config.title, config.width, config.height);

    run(config).context("lantern stopped with an error")?;
    Ok(())
}
