use cfn_athena_shared::athena::SdkAthena;
use cfn_athena_shared::config::Config;
use cfn_athena_shared::types::CustomResourceRequest;
use cfn_athena_shared::AppState;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Instrument;
use tracing_subscriber::{fmt, prelude::*, reload, Registry};

mod cfn_response;

type LogHandle = reload::Handle<LevelFilter, Registry>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env();

    // Level is swapped per invocation when the event carries a LogLevel
    let (filter, log_handle) = reload::Layer::new(config.log_level.as_level_filter());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    // Initialize AWS clients once at startup
    let aws_config = aws_config::load_from_env().await;
    let athena = SdkAthena::from_conf(&aws_config, config.athena_endpoint_url.as_deref());
    let state = AppState::new(athena, config);
    let http = reqwest::Client::new();

    run(service_fn(move |event: LambdaEvent<CustomResourceRequest>| {
        let state = Arc::clone(&state);
        let log_handle = log_handle.clone();
        let http = http.clone();
        async move { function_handler(event, state, log_handle, http).await }
    }))
    .await
}

async fn function_handler(
    event: LambdaEvent<CustomResourceRequest>,
    state: Arc<AppState>,
    log_handle: LogHandle,
    http: reqwest::Client,
) -> Result<(), Error> {
    let (request, _context) = event.into_parts();

    let level = request.log_level().unwrap_or(state.config.log_level);
    if let Err(e) = log_handle.reload(level.as_level_filter()) {
        tracing::warn!("Could not apply log level {:?}: {}", level, e);
    }

    let span = tracing::info_span!(
        "custom_resource",
        request_id = %request.request_id,
        resource_type = %request.resource_type,
        logical_id = %request.logical_resource_id,
    );

    async {
        let response = cfn_athena_shared::respond(state.athena.as_ref(), &request).await;
        cfn_response::send(&http, &request.response_url, &response).await?;
        Ok::<(), Error>(())
    }
    .instrument(span)
    .await
}
