pub mod subscription;
pub mod wire;

pub use self::subscription::{
    StreamError, Subscription, SubscriptionBuilder, SubscriptionState,
};
pub use self::wire::{WireFrame, WireParser};
