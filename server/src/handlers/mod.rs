pub mod json_response;
pub mod routes;
pub mod sse;

pub use self::routes::build_router;
