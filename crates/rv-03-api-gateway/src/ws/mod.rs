//! WebSocket transport.
//!
//! Channel membership is derived from the authenticated identity; clients
//! never choose what they receive.

pub mod handler;

pub use handler::{respond, ws_upgrade, ClientAction, ClientFrame, WebSocketHandler, WsParams};
