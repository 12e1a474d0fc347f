//! Spa gateway example
//!
//! Wires three spa items to their RCI channels and starts the service:
//! 1. ItemRegistry holds the items and feeds change events to the gateway
//! 2. SyncEngine maps items to channels with Watkins transcoders
//! 3. GatewayService polls the gateway on a schedule
//!
//! Point RCIBRIDGE_URL at a live gateway before running.

use std::sync::Arc;

use rcibridge_core::{ItemRegistry, ItemValue, TokioScheduler};
use rcibridge_gateway::{GatewayConfig, GatewayService, ItemBinding, RciClient, SyncEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rcibridge_gateway=debug".into()),
        )
        .init();

    let url = std::env::var("RCIBRIDGE_URL").unwrap_or_else(|_| "http://localhost:8080".into());
    let config = GatewayConfig::new(url, "idigi_dia");

    let registry = Arc::new(ItemRegistry::new());
    registry
        .register_with_value("spa.temp", ItemValue::Float(37.0))
        .await;
    registry.register("spa.pump").await;
    registry.register("spa.lights").await;

    let client = Arc::new(RciClient::new(&config)?);
    let mut engine = SyncEngine::new(client, registry.clone(), &config);
    engine.bind_item(
        "spa.temp",
        &ItemBinding::new()
            .with_listen("spa.set_temp_f")
            .with_send("spa.set_temp")
            .with_encoder("watkins_set_temp_relative")
            .with_decoder("watkins_temp_f_to_c"),
    );
    engine.bind_item(
        "spa.pump",
        &ItemBinding::new()
            .with_listen("spa.pump1_speed")
            .with_decoder("watkins_pump_speed"),
    );
    engine.bind_item(
        "spa.lights",
        &ItemBinding::new()
            .with_listen("spa.mz_lights_on")
            .with_send("spa.set_mz_light")
            .with_encoder("watkins_set_all_lights")
            .with_decoder("watkins_all_lights_on"),
    );

    let scheduler = TokioScheduler::new();
    let service =
        GatewayService::start(Arc::new(engine), registry.clone(), &scheduler, &config).await;

    println!("gateway running against {}; ctrl-c to stop", config.url);
    tokio::signal::ctrl_c().await?;

    service.stop().await;
    scheduler.shutdown().await;
    let stats = service.stats();
    println!(
        "polls: {} refreshes: {} sets: {} updates: {}",
        stats.polls, stats.refreshes, stats.sets, stats.updates_pushed
    );
    Ok(())
}
