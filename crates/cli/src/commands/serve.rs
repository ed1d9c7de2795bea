//! `groundwire serve` — run the HTTP gateway.

use std::sync::Arc;

use groundwire_config::AppConfig;
use groundwire_gateway::GatewayState;
use tracing::info;

use crate::wiring;

pub async fn run(config: AppConfig, port_override: Option<u16>) -> anyhow::Result<()> {
    let (orchestrator, _) = wiring::build_orchestrator(&config);

    let host = config.gateway.host.clone();
    let port = port_override.unwrap_or(config.gateway.port);

    info!(
        store = %config.store.backend,
        model = %config.pipeline.model.model,
        "Starting gateway"
    );

    groundwire_gateway::serve(Arc::new(GatewayState { orchestrator }), &host, port).await?;
    Ok(())
}
