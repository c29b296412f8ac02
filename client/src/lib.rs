pub mod reconcile;
pub mod sse;
