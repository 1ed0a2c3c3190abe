pub mod congestion;
pub mod config;
pub mod err;
pub mod receiver;
pub mod rtt;
pub mod sender;
pub mod transport;
pub mod wire;
pub mod window;

pub use err::Error;
