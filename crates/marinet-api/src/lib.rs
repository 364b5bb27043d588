pub mod ai_tutor;
pub mod auth;
pub mod error;
pub mod gemini;
pub mod groups;
pub mod middleware;
pub mod notifications;
pub mod posts;
pub mod routes;
pub mod state;
pub mod tutor;
pub mod uploads;
pub mod users;
pub mod views;
pub mod votes;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, AppStateInner};
