use tracing::info;

use regist::codec::Codec;
use regist::config::get_config;
use regist::errors::RegistResult;
use regist::pipeline::ActivationPipeline;
use regist::server::{init_logging, ActivationServer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> RegistResult<()> {
    let config = get_config()?;

    // Initialize logging
    init_logging(&config.logging);

    let pipeline = ActivationPipeline::new(Codec::from_config(&config.crypto)?);
    let server = ActivationServer::bind(&config.server, pipeline).await?;
    info!(addr = %server.local_addr()?, "Listening for activation requests");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
