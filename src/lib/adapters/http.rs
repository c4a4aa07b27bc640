use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_server::tls_rustls::RustlsConfig;
use tower_http::cors::CorsLayer;

use crate::core::{NewUser, RegistryError, User, UserRegistry, UserUpdate};
use crate::storage::UserRepository;

#[cfg(feature = "tracing")]
use tracing::info;

/// REST surface over a [`UserRegistry`]. One instance owns the registry;
/// `serve`/`serve_tls` bind and run until the task is dropped.
pub struct HttpServer<R: UserRepository + 'static> {
    registry: Arc<UserRegistry<R>>,
}

impl<R: UserRepository + 'static> HttpServer<R> {
    pub fn new(registry: UserRegistry<R>) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health))
            .nest("/api", api_routes::<R>())
            .layer(CorsLayer::permissive());
        #[cfg(feature = "tracing")]
        let router = router.layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::extract::Request| {
                    let uri = request.uri().to_string();
                    tracing::info_span!("http_request", method = ?request.method(), uri)
                },
            ),
        );
        router.with_state(self.registry.clone())
    }

    pub async fn serve(&self, addr: &str) -> Result<(), RegistryError> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        #[cfg(feature = "tracing")]
        info!(addr = %addr, "HTTP server started");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    pub async fn serve_tls(
        &self,
        addr: SocketAddr,
        cert_path: PathBuf,
        key_path: PathBuf,
    ) -> Result<(), RegistryError> {
        let config = RustlsConfig::from_pem_file(cert_path, key_path).await?;
        #[cfg(feature = "tracing")]
        info!(addr = %addr, "HTTPS server started");
        axum_server::bind_rustls(addr, config)
            .serve(self.router().into_make_service())
            .await?;
        Ok(())
    }
}

fn api_routes<R: UserRepository + 'static>() -> Router<Arc<UserRegistry<R>>> {
    Router::new()
        .route("/users", get(list_users::<R>).post(create_user::<R>))
        .route(
            "/users/{id}",
            get(get_user::<R>)
                .put(update_user::<R>)
                .delete(delete_user::<R>),
        )
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn list_users<R: UserRepository>(
    State(registry): State<Arc<UserRegistry<R>>>,
) -> Result<Json<Vec<User>>, RegistryError> {
    Ok(Json(registry.list().await?))
}

async fn create_user<R: UserRepository>(
    State(registry): State<Arc<UserRegistry<R>>>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), RegistryError> {
    Ok((StatusCode::CREATED, Json(registry.add(body).await?)))
}

async fn get_user<R: UserRepository>(
    State(registry): State<Arc<UserRegistry<R>>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, RegistryError> {
    Ok(Json(registry.get(id).await?))
}

async fn update_user<R: UserRepository>(
    State(registry): State<Arc<UserRegistry<R>>>,
    Path(id): Path<i64>,
    Json(patch): Json<UserUpdate>,
) -> Result<Json<User>, RegistryError> {
    Ok(Json(registry.update(id, patch).await?))
}

async fn delete_user<R: UserRepository>(
    State(registry): State<Arc<UserRegistry<R>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, RegistryError> {
    registry.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(serde::Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl RegistryError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        (
            self.status(),
            Json(ErrorBody {
                error: self.kind(),
                message: &message,
            }),
        )
            .into_response()
    }
}
