use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth::external::{ExternalAuthProvider, GoogleProvider};
use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::identity::{EmailSender, LoggingEmailSender, UserManager};
use crate::middleware::{authenticate, require_auth, AuthUser};
use crate::pipeline::{DomainEventHandler, EventDispatcher, RequestContext, Sender};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub tokens: TokenService,
    pub users: UserManager,
    pub email: Arc<dyn EmailSender>,
    pub events: EventDispatcher,
    pub google: Option<Arc<dyn ExternalAuthProvider>>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: DatabaseManager) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.token_secret()?);
        let users = UserManager::new(db.pool().clone(), tokens.clone(), &config.security);
        let google = config
            .google()
            .map(|credentials| Arc::new(GoogleProvider::new(credentials)) as Arc<dyn ExternalAuthProvider>);
        if google.is_none() {
            tracing::info!("Google sign-in is not configured");
        }

        Ok(Self {
            tokens,
            users,
            email: Arc::new(LoggingEmailSender),
            events: EventDispatcher::with_logging(),
            google,
            config,
            db,
        })
    }

    pub fn with_email_sender(mut self, email: Arc<dyn EmailSender>) -> Self {
        self.email = email;
        self
    }

    pub fn with_external_provider(mut self, provider: Arc<dyn ExternalAuthProvider>) -> Self {
        self.google = Some(provider);
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn DomainEventHandler>) -> Self {
        self.events = self.events.register(handler);
        self
    }

    /// Pipeline sender acting as the given user
    pub fn sender(&self, user: Option<&AuthUser>) -> Sender {
        let ctx = RequestContext::new(
            self.db.pool().clone(),
            Arc::new(self.users.clone()),
            self.events.clone(),
        )
        .with_user(user.map(|u| u.id.clone()));

        Sender::new(ctx, Duration::from_millis(self.config.api.slow_request_threshold_ms))
    }
}

/// The complete HTTP application
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .merge(public_routes())
        .merge(users_public_routes())
        // Protected (authenticated)
        .merge(
            Router::new()
                .merge(users_manage_routes())
                .merge(todo_list_routes())
                .merge(todo_item_routes())
                .merge(weather_forecast_routes())
                .route_layer(middleware::from_fn(require_auth)),
        )
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config));

    if config.security.require_https {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=2592000"),
        ));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root_get))
        .route("/api", get(public::api_get))
        .route("/health", get(public::health_get))
}

fn users_public_routes() -> Router<AppState> {
    use public::users;

    Router::new()
        .route("/api/Users/register", post(users::register_post))
        .route("/api/Users/login", post(users::login_post))
        .route("/api/Users/refresh", post(users::refresh_post))
        .route("/api/Users/confirmEmail", get(users::confirm_email_get))
        .route("/api/Users/resendConfirmationEmail", post(users::resend_confirmation_email_post))
        .route("/api/Users/forgotPassword", post(users::forgot_password_post))
        .route("/api/Users/resetPassword", post(users::reset_password_post))
        .route("/api/Users/logout", post(users::logout_post))
        // External sign-in
        .route("/api/Users/sign-in/google", get(users::google_sign_in_get))
        .route("/api/Users/sign-in/google/callback", get(users::google_callback_get))
}

fn users_manage_routes() -> Router<AppState> {
    use protected::manage;

    Router::new()
        .route("/api/Users/manage/info", get(manage::info_get).post(manage::info_post))
        .route("/api/Users/manage/2fa", post(manage::two_factor_post))
}

fn todo_list_routes() -> Router<AppState> {
    use protected::todo_lists;

    Router::new()
        .route(
            "/api/TodoLists",
            get(todo_lists::todo_lists_get)
                .post(todo_lists::todo_lists_post)
                .delete(todo_lists::todo_lists_delete),
        )
        .route(
            "/api/TodoLists/:id",
            put(todo_lists::todo_list_put).delete(todo_lists::todo_list_delete),
        )
}

fn todo_item_routes() -> Router<AppState> {
    use protected::todo_items;

    Router::new()
        .route(
            "/api/TodoItems",
            get(todo_items::todo_items_get).post(todo_items::todo_items_post),
        )
        .route(
            "/api/TodoItems/:id",
            put(todo_items::todo_item_put).delete(todo_items::todo_item_delete),
        )
        .route("/api/TodoItems/UpdateDetail/:id", put(todo_items::todo_item_detail_put))
}

fn weather_forecast_routes() -> Router<AppState> {
    Router::new().route(
        "/api/WeatherForecasts",
        get(protected::weather_forecasts::weather_forecasts_get),
    )
}

/// Development mirrors any origin; elsewhere only the configured origins. Credentials always allowed.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::mirror_request());

    if config.security.allow_any_origin {
        return cors.allow_origin(AllowOrigin::mirror_request());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    cors.allow_origin(AllowOrigin::list(origins))
}
