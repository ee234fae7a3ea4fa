pub mod chat;
pub mod health;
pub mod login;

use crate::state::AppState;
use axum::Router;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(chat::routes(state.clone()))
        .merge(login::routes(state))
        .merge(health::routes())
}
