pub mod bridge;
pub mod client;
pub mod fake;

pub use bridge::{DeviceBridge, StreamEnd};
pub use client::AdbClient;
pub use fake::FakeBridge;
