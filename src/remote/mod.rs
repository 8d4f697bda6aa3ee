mod bridge;
mod client;
#[cfg(test)]
pub mod fake;
mod item;

pub use bridge::BridgeClient;
pub use client::AccountTier;
pub use client::RemoteError;
pub use client::RemoteListClient;
pub use item::InputRef;
pub use item::ItemDescriptor;
