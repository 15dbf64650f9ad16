use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use clinica_core::CoreConfig;
use clinica_core::config::{
    consultation_fee_from_env_value, flag_from_env_value, gateway_name_from_env_value,
    id_seed_from_env_value, video_provider_name_from_env_value,
};
use clinica_core::constants::DEFAULT_REST_ADDR;

/// Main entry point for the clinica application
///
/// Resolves the core configuration once, wires the use cases to in-memory adapters and serves
/// the REST API with OpenAPI/Swagger UI.
///
/// # Environment Variables
/// - `CLINICA_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINICA_ID_SEED`: first generated entity id (default: 1)
/// - `CLINICA_CONSULTATION_FEE`: fee charged when a payment omits the amount (default: 150.00)
/// - `CLINICA_GATEWAY_NAME`: name reported by the payment gateway (default: "FakeGateway")
/// - `CLINICA_VIDEO_PROVIDER`: name reported by the video-conference provider (default: "FakeMeet")
/// - `CLINICA_SEED_CATALOGUE`: load the starter medication/exam catalogue (default: true)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, binding or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinica=info".parse()?)
                .add_directive("clinica_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CLINICA_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let cfg = Arc::new(CoreConfig::new(
        id_seed_from_env_value(std::env::var("CLINICA_ID_SEED").ok())?,
        consultation_fee_from_env_value(std::env::var("CLINICA_CONSULTATION_FEE").ok())?,
        gateway_name_from_env_value(std::env::var("CLINICA_GATEWAY_NAME").ok())?,
        video_provider_name_from_env_value(std::env::var("CLINICA_VIDEO_PROVIDER").ok())?,
        flag_from_env_value(std::env::var("CLINICA_SEED_CATALOGUE").ok(), true)?,
    )?);

    tracing::info!(
        fee = %cfg.consultation_fee(),
        gateway = %cfg.gateway_name(),
        "-- Starting clinica REST API on {}",
        rest_addr
    );

    let app = router(AppState::in_memory(cfg)?);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
