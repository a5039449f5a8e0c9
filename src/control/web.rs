use axum::{
    Json,
    Router,
    http::StatusCode as Code,
    extract::State,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic}
};
use tokio::sync::watch;
use crate::control::{
    Status,
    fn_queue::{self, Override},
    phase::{LightOutput, Phase},
};

type Response<T> = Result<T, (Code, &'static str)>;

/// shared with every handler
#[derive(Debug, Clone)]
pub struct AppState {
    queue: fn_queue::Queue,
    status: watch::Receiver<Status>,
    /// sha256 of the bridge user name
    password: String,
}

impl AppState {
    pub fn new(queue: fn_queue::Queue, status: watch::Receiver<Status>, bridge_username: &str) -> Self {
        Self { queue, status, password: sha256::digest(bridge_username) }
    }
}

/// require basic authorization with password equal to sha256 of the bridge user name (case insensitive)
fn authorize(auth: &Authorization<Basic>, state: &AppState) -> Response<()> {
    if !auth.0.password().eq_ignore_ascii_case(&state.password) {
        return Err((Code::UNAUTHORIZED, "password in basic authorization header is incorrect. expected sha256 of the hue bridge user name (case insensitive)."));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/state",
    responses((
        status = 200,
        description = "Get phase and output of the latest tick.",
        body = Status
    ))
)]
async fn get_state(State(state): State<AppState>) -> Json<Status> {
    Json(state.status.borrow().clone())
}

#[utoipa::path(
    post,
    path = "/wake-up",
    responses((
        status = 200,
        description = "Wake up now and stay awake until the next bedtime window. Applied on the next tick, which starts right away. Return response message."
    )),
    security(("authorization" = [])) // require auth
)]
async fn post_wake_up(
    TypedHeader(auth): TypedHeader<Authorization<Basic>>,
    State(state): State<AppState>
) -> Response<&'static str> {
    authorize(&auth, &state)?;
    state.queue.enqueue(Override::WakeUp).await;
    tracing::info!("queued {:?}", Override::WakeUp);
    Ok("queued waking up")
}

#[utoipa::path(
    post,
    path = "/sleep",
    responses((
        status = 200,
        description = "Go to sleep now and stay asleep until the next wake up window. Applied on the next tick, which starts right away. Return response message."
    )),
    security(("authorization" = [])) // require auth
)]
async fn post_sleep(
    TypedHeader(auth): TypedHeader<Authorization<Basic>>,
    State(state): State<AppState>
) -> Response<&'static str> {
    authorize(&auth, &state)?;
    state.queue.enqueue(Override::Sleep).await;
    tracing::info!("queued {:?}", Override::Sleep);
    Ok("queued going to sleep")
}

/// all routes including swagger ui
pub fn router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use axum::response::Redirect;
    use utoipa_swagger_ui::SwaggerUi;
    use utoipa::{
        OpenApi,
        openapi::security::{SecurityScheme, Http, HttpAuthScheme}
    };

    /// utility struct for utoipa to register basic http authorization.
    /// this is necessary for showing an "Authorize" button in swagger-ui.
    struct AuthHint;
    impl utoipa::Modify for AuthHint {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme(
                    "authorization",
                    SecurityScheme::Http(Http::new(HttpAuthScheme::Basic))
                );
            }
        }
    }

    // set up utoipa swagger ui
    #[derive(OpenApi)]
    #[openapi(
        // use security scheme for basic http authorization
        modifiers(&AuthHint),
        paths(
            // functions with #[utoipa::path(...)]
            get_state,
            post_wake_up,
            post_sleep
        ),
        components(schemas(
            // enums/structs with #[derive(utoipa::ToSchema)]
            Status,
            Phase,
            LightOutput
        )),
        tags((name = "lamp-schedule-server", description = "API for overriding the day/night light schedule"))
    )]
    struct ApiDoc;

    Router::new()

        // swagger ui
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/openapi.json", ApiDoc::openapi()))

        // temporarily redirect root to swagger ui
        .route("/", get(|| async { Redirect::temporary("/swagger-ui") }))

        // actual api
        .route("/state", get(get_state))
        .route("/wake-up", post(post_wake_up))
        .route("/sleep", post(post_sleep))
        .with_state(state)
}

/// never terminates unless the server fails
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
