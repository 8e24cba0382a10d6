//! Router assembly

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use registry_core::repositories::UserRepository;

use crate::handlers::{health, users};
use crate::state::AppState;

pub fn router<R: UserRepository + 'static>(state: AppState<R>) -> Router {
    let api = Router::new()
        .route(
            "/users",
            post(users::create_user::<R>).get(users::list_users::<R>),
        )
        .route("/users/search", get(users::search_users::<R>))
        .route(
            "/users/{id}",
            get(users::get_user::<R>)
                .put(users::update_user::<R>)
                .delete(users::delete_user::<R>),
        );

    Router::new()
        .route("/", get(health::root::<R>))
        .route("/health", get(health::health_check))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
