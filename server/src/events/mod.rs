pub mod scheduler;
pub mod store;

pub use self::store::EventStore;
