use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use repo_dashboard::application::use_cases::list_repository_summaries::ListRepositorySummariesInteractor;
use repo_dashboard::application::use_cases::stream_repository_summaries::StreamRepositorySummariesInteractor;
use repo_dashboard::infrastructures::adapters::primary::web::{AppState, create_router};
use repo_dashboard::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create OTLP exporter: {}", e))?;
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .build();
    let tracer = provider.tracer("repo-dashboard");

    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(telemetry)
        .with(fmt_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let initialize_span = info_span!("initialize");
    let _enter = initialize_span.enter();
    info!("Application starting");

    let github_token = env::var("GITHUB_TOKEN")
        .map_err(|e| anyhow::anyhow!("Failed to read GITHUB_TOKEN: {}", e))?;

    // Comma-separated owner logins whose repositories the site shows
    let owners: Vec<String> = env::var("REPO_OWNERS")
        .map_err(|e| anyhow::anyhow!("Failed to read REPO_OWNERS: {}", e))?
        .split(',')
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .map(String::from)
        .collect();
    if owners.is_empty() {
        return Err(anyhow::anyhow!("REPO_OWNERS contains no owner logins"));
    }
    info!("Tracking repositories of {} owner(s)", owners.len());

    // Build dependencies
    let github_api_adapter = Arc::new(GitHubApiAdapter::new(
        "https://api.github.com".to_string(),
        github_token,
    ));
    let list_use_case = Arc::new(ListRepositorySummariesInteractor::new(
        github_api_adapter,
        owners,
    ));
    let stream_use_case = Arc::new(StreamRepositorySummariesInteractor::new(
        list_use_case.clone(),
    ));
    let app_state = Arc::new(AppState {
        list_use_case,
        stream_use_case,
    });

    // Create router
    let app = create_router(app_state);

    // Start server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
