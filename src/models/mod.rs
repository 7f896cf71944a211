// Persisted rows, request payloads and response shapes

pub mod assignment;
pub mod calendar;
pub mod client;
pub mod dates;
pub mod exercise;
pub mod import;
pub mod program;
pub mod progress;
pub mod user;
pub mod workout;

pub use assignment::*;
pub use calendar::*;
pub use client::*;
pub use dates::*;
pub use exercise::*;
pub use import::*;
pub use program::*;
pub use progress::*;
pub use user::*;
pub use workout::*;
