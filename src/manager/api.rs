use std::{collections::HashMap, future::Future, net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
    Json,
};
use tokio::{net::TcpListener, sync::Mutex};
use tower_http::auth::{AsyncAuthorizeRequest, AsyncRequireAuthorizationLayer};

use crate::{common, error, info, log, option, task};

#[derive(Clone)]
struct APIState {
    host: Arc<task::PluginHost>,
    logger: Arc<Box<dyn log::Logger>>,
}

pub(super) struct APIServer {
    state: APIState,
    listen: SocketAddr,
    secret: Option<String>,
    canceller: Mutex<Option<common::Canceller>>,
}

impl APIServer {
    pub(super) fn new(
        host: Arc<task::PluginHost>,
        logger: Box<dyn log::Logger>,
        options: option::APIServerOptions,
    ) -> Self {
        Self {
            state: APIState {
                host,
                logger: Arc::new(logger),
            },
            listen: options.listen,
            secret: options.secret,
            canceller: Mutex::new(None),
        }
    }

    fn get_router(&self) -> axum::Router {
        let mut router = router(self.state.clone());

        // Auth
        if let Some(secret) = &self.secret {
            router = router.layer(AsyncRequireAuthorizationLayer::new(AuthMiddleware {
                secret: secret.clone(),
            }))
        }

        router
    }

    pub(super) async fn start(&self) -> anyhow::Result<()> {
        let tcp_listener = TcpListener::bind(&self.listen).await?;
        info!(self.state.logger, "API server listen on {}", self.listen);
        let router = self.get_router();
        let (canceller, canceller_guard) = common::Canceller::new();
        let logger = self.state.logger.clone();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp_listener, router.into_make_service())
                .with_graceful_shutdown(canceller_guard.into_cancelled_owned())
                .await
            {
                error!(logger, "API server failed: {}", e);
            }
        });
        self.canceller.lock().await.replace(canceller);
        Ok(())
    }

    pub(super) async fn close(&self) {
        if let Some(mut canceller) = self.canceller.lock().await.take() {
            canceller.cancel_and_wait().await;
        }
    }
}

fn router(state: APIState) -> axum::Router {
    axum::Router::new()
        .route(
            "/api/v1/version",
            axum::routing::get(|| async {
                let mut data = HashMap::with_capacity(2);
                data.insert("version", crate::build_info::PKG_VERSION);
                data.insert("git_commit_id", crate::build_info::SHORT_COMMIT);
                common::GenericResponse::new(http::StatusCode::OK, data)
            }),
        )
        .route("/api/v1/plugin", axum::routing::get(list_plugin))
        .route("/api/v1/plugin/:tag/info", axum::routing::get(info_plugin))
        .route(
            "/api/v1/plugin/:tag/execute",
            axum::routing::post(execute_task),
        )
        .route("/api/v1/plugin/:tag/cancel", axum::routing::post(cancel_task))
        .route(
            "/api/v1/plugin/:tag/endpoint",
            axum::routing::post(endpoint_request),
        )
        .fallback(axum::routing::any(|| async move {
            common::GenericResponse::from(http::StatusCode::NOT_FOUND)
        }))
        .with_state(state)
}

fn error_response(err: task::TaskError) -> Response {
    let status = if err.is_not_found() {
        http::StatusCode::NOT_FOUND
    } else if matches!(err, task::TaskError::NotSupported) {
        http::StatusCode::NOT_IMPLEMENTED
    } else {
        http::StatusCode::INTERNAL_SERVER_ERROR
    };
    common::GenericResponse::error(status, err).into_response()
}

fn reply(result: Result<task::Response, task::TaskError>) -> Response {
    match result {
        Ok(response) => {
            common::GenericResponse::new(http::StatusCode::OK, response).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn list_plugin(State(state): State<APIState>) -> impl IntoResponse {
    common::GenericResponse::new(http::StatusCode::OK, state.host.tags())
}

async fn info_plugin(State(state): State<APIState>, Path(tag): Path<String>) -> Response {
    match state.host.info(&tag) {
        Ok(info) => common::GenericResponse::new(http::StatusCode::OK, info).into_response(),
        Err(err) => error_response(err),
    }
}

async fn execute_task(
    State(state): State<APIState>,
    Path(tag): Path<String>,
    Json(request): Json<task::ExecuteTaskRequest>,
) -> Response {
    // detached, so a dropped connection does not abort the step midway
    let host = state.host.clone();
    let handle = tokio::spawn(async move { host.execute_task(&tag, request).await });
    match handle.await {
        Ok(result) => reply(result),
        Err(e) => {
            error!(state.logger, "execute task aborted: {}", e);
            common::GenericResponse::error(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "task aborted",
            )
            .into_response()
        }
    }
}

async fn cancel_task(
    State(state): State<APIState>,
    Path(tag): Path<String>,
    Json(request): Json<task::CancelTaskRequest>,
) -> Response {
    reply(state.host.cancel_plugin_task(&tag, request))
}

async fn endpoint_request(
    State(state): State<APIState>,
    Path(tag): Path<String>,
    Json(request): Json<task::EndpointRequest>,
) -> Response {
    reply(state.host.endpoint_request(&tag, request).await)
}

#[derive(Clone)]
pub(crate) struct AuthMiddleware {
    secret: String,
}

impl AsyncAuthorizeRequest<Body> for AuthMiddleware {
    type RequestBody = Body;
    type ResponseBody = Body;
    type Future = std::pin::Pin<
        Box<
            dyn Future<
                    Output = Result<Request<Self::RequestBody>, http::Response<Self::ResponseBody>>,
                > + Send,
        >,
    >;

    fn authorize(&mut self, request: http::Request<Body>) -> Self::Future {
        let secret = self.secret.clone();
        Box::pin(async move {
            let authorized = request
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_start_matches("Bearer ") == secret)
                .unwrap_or(false);
            if authorized {
                return Ok(request);
            }
            let mut response = Response::new(Body::empty());
            *response.status_mut() = http::StatusCode::UNAUTHORIZED;
            Err(response)
        })
    }
}
