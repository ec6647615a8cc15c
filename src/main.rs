//! LexPar aggregator: binary entrypoint.
//! Boots the Axum HTTP server over the canonical data store.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    lexpar_aggregator::telemetry::init_tracing();

    let router = lexpar_aggregator::app()
        .await
        .map_err(shuttle_runtime::Error::Custom)?;

    Ok(router.into())
}
