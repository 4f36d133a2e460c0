use axum::Router;

pub mod admin;
pub mod deals;
pub mod points;
pub mod regions;
pub mod system;
pub mod users;

/// Router for every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/regions", regions::router())
        .nest("/points", points::router())
        .nest("/deals", deals::router())
        .nest("/users", users::router())
        .nest("/auth", users::auth_router())
        .nest("/admin", admin::router())
}
