pub mod email;
pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod targeting;

pub use routes::create_router;
