//! Server-rendered pages and htmx fragments over the case-work operations.

mod handlers;
mod render;
pub mod server;
pub mod types;

pub use render::Templates;
pub use server::{AppState, build_router, start_server};
