//! HTTP Server for the fronteiras API.
//!
//! Serves the transformed census views as JSON. Rendering and charts belong
//! to the page that consumes them.
//!
//! # API Endpoints
//!
//! | Method | Path                      | Description                          |
//! |--------|---------------------------|--------------------------------------|
//! | GET    | `/health`                 | Health check                         |
//! | GET    | `/api/saldo`              | State balances and ranking           |
//! | GET    | `/api/origens`            | State origins table, as read         |
//! | GET    | `/api/matriz`             | Region x region migration matrix     |
//! | GET    | `/api/municipios`         | Municipality names                   |
//! | GET    | `/api/municipios/{nome}`  | Origins of one municipality          |
//! | GET    | `/api/imigrantes`         | Immigrants by nationality            |
//! | GET    | `/api/cache`              | Table cache contents                 |
//! | GET    | `/api/logs`               | SSE stream for pipeline logs         |

use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde::Serialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{
    empty_response, error_response, ApiResponse, MunicipalityList, StateBalanceData, TableData,
};
use crate::cache::TABLE_CACHE;
use crate::config::Config;
use crate::error::{LoadResult, LookupError, ServerError, ServerResult};
use crate::transform::crosstab::{MatrixView, MigrationMatrix};
use crate::transform::lookup::{lookup_municipality, municipality_names, MunicipalityProfile};
use crate::transform::pipeline::{
    immigrant_view, load_display_table, load_immigrant_counts, load_migrant_origins,
    load_municipality_origins, load_state_balances, rank_by_balance, ImmigrantView,
};

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match &self {
            ServerError::Lookup(LookupError::NotFound(name)) => {
                let message = format!("Nenhum dado encontrado para o município '{}'", name);
                (StatusCode::NOT_FOUND, Json(empty_response(&message))).into_response()
            }
            ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, Json(error_response(&self.to_string()))).into_response()
            }
            ServerError::Load(_) | ServerError::Internal(_) => {
                log_error(self.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&self.to_string())))
                    .into_response()
            }
        }
    }
}

/// Build the router over a configuration.
pub fn router(config: Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/saldo", get(get_state_balances))
        .route("/api/origens", get(get_state_origins))
        .route("/api/matriz", get(get_matrix))
        .route("/api/municipios", get(get_municipality_names))
        .route("/api/municipios/{nome}", get(get_municipality))
        .route("/api/imigrantes", get(get_immigrants))
        .route("/api/cache", get(get_cache))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let data_dir = config.data_dir.display().to_string();
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Fronteiras server running on http://localhost:{}", port);
    println!("   Data directory: {}", data_dir);
    println!("   GET  /api/saldo             - State balances");
    println!("   GET  /api/origens           - State origins table");
    println!("   GET  /api/matriz            - Migration matrix");
    println!("   GET  /api/municipios[/nome] - Municipality origins");
    println!("   GET  /api/imigrantes        - Immigrants by nationality");
    println!("   GET  /api/logs              - SSE log stream");
    println!("   GET  /health                - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run a file-backed loader off the async workers.
async fn blocking<T, F>(load: F) -> ServerResult<T>
where
    F: FnOnce() -> LoadResult<T> + Send + 'static,
    T: Send + 'static,
{
    let loaded = tokio::task::spawn_blocking(load)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(loaded?)
}

fn respond<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "fronteiras",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "saldo": "GET /api/saldo",
            "origens": "GET /api/origens",
            "matriz": "GET /api/matriz",
            "municipios": "GET /api/municipios",
            "municipio": "GET /api/municipios/{nome}",
            "imigrantes": "GET /api/imigrantes",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn get_state_balances(State(state): State<AppState>) -> ApiResult<StateBalanceData> {
    let path = state.config.state_balance_path();
    let states = blocking(move || load_state_balances(&path)).await?;
    let ranking = rank_by_balance(&states);
    respond(StateBalanceData { states, ranking })
}

async fn get_state_origins(State(state): State<AppState>) -> ApiResult<TableData> {
    let path = state.config.state_origins_path();
    let table = blocking(move || load_display_table(&path)).await?;
    respond(TableData::from(table))
}

async fn get_matrix(State(state): State<AppState>) -> ApiResult<MatrixView> {
    let path = state.config.migrant_origin_path();
    let records = blocking(move || load_migrant_origins(&path)).await?;
    let matrix = MigrationMatrix::build(&records);
    if matrix.ignored_records > 0 {
        log_info(format!(
            "Matrix ignored {} record(s) with unknown region labels",
            matrix.ignored_records
        ));
    }
    respond(matrix.view())
}

async fn get_municipality_names(State(state): State<AppState>) -> ApiResult<MunicipalityList> {
    let path = state.config.municipality_origin_path();
    let records = blocking(move || load_municipality_origins(&path)).await?;
    respond(MunicipalityList::from(municipality_names(&records)))
}

async fn get_municipality(
    State(state): State<AppState>,
    Path(nome): Path<String>,
) -> ApiResult<MunicipalityProfile> {
    if nome.trim().is_empty() {
        return Err(ServerError::BadRequest("empty municipality name".to_string()));
    }
    let path = state.config.municipality_origin_path();
    let records = blocking(move || load_municipality_origins(&path)).await?;
    let profile = lookup_municipality(&records, &nome)?;
    respond(profile)
}

async fn get_immigrants(State(state): State<AppState>) -> ApiResult<ImmigrantView> {
    let path = state.config.immigrant_count_path();
    let records = blocking(move || load_immigrant_counts(&path)).await?;
    respond(immigrant_view(&records))
}

async fn get_cache() -> Json<Value> {
    Json(json!({
        "stats": TABLE_CACHE.stats(),
        "entries": TABLE_CACHE.entries(),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip what they missed.
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;

    #[test]
    fn test_not_found_is_404() {
        let err = ServerError::from(LookupError::NotFound("Xique-Xique".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_load_error_is_500() {
        let err = ServerError::from(LoadError::SchemaMismatch {
            table: "saldo_migratorio".to_string(),
            missing: vec!["uf".to_string()],
        });
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bad_request_is_400() {
        let err = ServerError::BadRequest("empty".to_string());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blocking_maps_load_errors() {
        let result: ServerResult<()> = blocking(|| {
            Err(LoadError::SchemaMismatch {
                table: "t".to_string(),
                missing: vec![],
            })
        })
        .await;
        assert!(matches!(result, Err(ServerError::Load(_))));
    }

    #[test]
    fn test_router_builds() {
        let _ = router(Config::default());
    }
}
