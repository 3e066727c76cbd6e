use anyhow::Result;
use tracing::{error, info};
use wengine::{cli, logger};

fn main() -> Result<()> {
    let cli = cli::Cli::parse_args();
    logger::init(cli.verbose)?;
    info!(args = ?std::env::args().collect::<Vec<_>>(), "wengine start");

    match cli::run(cli) {
        Ok(result) => {
            info!("wengine finished successfully");
            Ok(result)
        }
        Err(err) => {
            error!(error = ?err, "wengine failed");
            Err(err)
        }
    }
}
