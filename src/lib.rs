pub mod config;
pub mod fitts;
pub mod healer;
pub mod keystroke;
pub mod model;
pub mod profile;
pub mod script;
pub mod store;
pub mod trajectory;
pub mod transport;
