pub mod flight;
pub mod hardware;
