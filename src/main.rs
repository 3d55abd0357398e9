use sndtui::{
    config::Config,
    logging::initialize_logging,
    ui::{app::App, hook::install_hooks},
};
use tracing::info;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenv::dotenv().ok();
    install_hooks()?;
    initialize_logging()?;

    let config = Config::from_env();
    info!("starting against {}", config.api_base);

    let mut app = App::new(config).await?;
    app.run().await?;

    Ok(())
}
