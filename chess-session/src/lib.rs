mod connection;
mod dispatcher;
mod hub;
mod message;
mod registry;

pub use connection::{ChannelConnection, ChannelEvent, CloseCode, Connection};
pub use dispatcher::EventDispatcher;
pub use hub::{SessionHub, TERMINAL_CLOSE_DELAY};
pub use message::{ClientMessage, ServerMessage};

#[cfg(test)]
pub use connection::MockConnection;
