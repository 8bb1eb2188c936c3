pub mod connection;
pub mod handler;
pub mod hub;
pub mod presence;

pub use connection::{ClientHandle, ConnectionLimits, Session};
pub use hub::Hub;
