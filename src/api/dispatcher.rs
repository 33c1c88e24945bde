//! Request dispatcher: routing and the two link flows.
//!
//! # Routes
//!
//! | Path                     | Method | Flow                  |
//! |--------------------------|--------|-----------------------|
//! | `/short-link[/]`         | POST   | create short link     |
//! | `/short-link[/]`         | other  | 405                   |
//! | anything else            | GET    | redirect by short code|
//! | anything else            | other  | 405                   |
//!
//! Handler errors are caught here and emitted as their [`Reply`]; transport
//! errors abort the request and are returned to the caller.

use http::Method;
use tracing::{debug, error, info};

use crate::api::connection::{Connection, Scope, TransportError, read_body};
use crate::api::dto::shorten::ShortenRequest;
use crate::api::response::{Reply, emit};
use crate::error::{AppError, NON_FIELD};
use crate::state::AppState;

pub const SHORT_LINK_PATH: &str = "/short-link";

const MSG_HOST_REQUIRED: &str = "Host header is required.";

/// Route selected for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    CreateLink,
    Redirect { code: String },
    MethodNotAllowed,
}

impl Route {
    pub fn resolve(method: &Method, path: &str) -> Self {
        let is_short_link = path == SHORT_LINK_PATH
            || path.strip_suffix('/') == Some(SHORT_LINK_PATH);

        if is_short_link {
            if *method == Method::POST {
                Route::CreateLink
            } else {
                Route::MethodNotAllowed
            }
        } else if *method == Method::GET {
            Route::Redirect {
                code: path.trim_matches('/').to_string(),
            }
        } else {
            Route::MethodNotAllowed
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Drives one request from scope to emitted response.
#[derive(Clone)]
pub struct RequestDispatcher {
    state: AppState,
}

impl RequestDispatcher {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Handles a single request, emitting exactly one response on `conn`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the body could not be read or the
    /// response could not be sent. No response is emitted after a receive
    /// failure.
    pub async fn dispatch<C: Connection + ?Sized>(
        &self,
        scope: &Scope,
        conn: &mut C,
    ) -> Result<(), TransportError> {
        let reply = match self.route(scope, conn).await {
            Ok(reply) => reply,
            Err(DispatchError::App(err)) => {
                if matches!(err, AppError::Internal { .. } | AppError::Conflict { .. }) {
                    error!("{} {} failed: {}", scope.method, scope.path, err);
                } else {
                    debug!("{} {} rejected: {}", scope.method, scope.path, err);
                }
                Reply::Error(err)
            }
            Err(DispatchError::Transport(err)) => return Err(err),
        };

        emit(conn, reply).await
    }

    async fn route<C: Connection + ?Sized>(
        &self,
        scope: &Scope,
        conn: &mut C,
    ) -> Result<Reply, DispatchError> {
        match Route::resolve(&scope.method, &scope.path) {
            Route::CreateLink => self.create_link(scope, conn).await,
            Route::Redirect { code } => Ok(self.redirect(scope, &code).await?),
            Route::MethodNotAllowed => Err(AppError::MethodNotAllowed.into()),
        }
    }

    async fn create_link<C: Connection + ?Sized>(
        &self,
        scope: &Scope,
        conn: &mut C,
    ) -> Result<Reply, DispatchError> {
        let body = read_body(conn).await?;
        let request = ShortenRequest::from_body(&body)?;

        let host = scope
            .host()
            .ok_or_else(|| AppError::field(NON_FIELD, MSG_HOST_REQUIRED))?;

        let code = self
            .state
            .link_service
            .create_short_link(&request.url)
            .await?;

        let short_link = format!("{}://{}/{}", scope.scheme, host, code);
        info!("Short link {} -> {}", short_link, request.url);

        Ok(Reply::Created { short_link })
    }

    async fn redirect(&self, scope: &Scope, code: &str) -> Result<Reply, AppError> {
        let client_id = scope.client_id();
        if !self.state.rate_limiter.admit(&client_id).await {
            return Err(AppError::RateLimited);
        }

        match self.state.link_service.resolve_short_link(code).await? {
            Some(location) => Ok(Reply::Redirect { location }),
            None => Err(AppError::NotFound),
        }
    }
}
