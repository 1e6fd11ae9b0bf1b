use crate::message::ServerMessage;
use async_trait::async_trait;
use common::Error;

/// A handle to one real-time connection, abstracted away from whatever
/// transport framed it (spec §4.9 talks only in terms of "a connection").
///
/// The HTTP/WebSocket layer provides the concrete implementation; this
/// crate only needs to be able to push a framed message and find out
/// whether the connection is still alive.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&self, message: &ServerMessage) -> Result<(), Error>;

    /// The close code/reason pair named in spec §4.9 ("normal",
    /// "policy violation"). Implementations that cannot close gracefully
    /// (e.g. already-dropped channels) may treat this as a no-op.
    async fn close(&self, code: CloseCode);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CloseCode {
    Normal,
    PolicyViolation,
}

/// An in-memory [`Connection`] backed by an unbounded channel, used by
/// tests and by any transport that wants to decouple the hub from the
/// socket write half.
pub struct ChannelConnection {
    sender: tokio::sync::mpsc::UnboundedSender<ChannelEvent>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ChannelEvent {
    Message(ServerMessage),
    Closed(CloseCode),
}

impl ChannelConnection {
    pub fn new(sender: tokio::sync::mpsc::UnboundedSender<ChannelEvent>) -> Self {
        ChannelConnection { sender }
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    async fn send(&self, message: &ServerMessage) -> Result<(), Error> {
        self.sender
            .send(ChannelEvent::Message(message.clone()))
            .map_err(|_| Error::Transient("connection channel closed".into()))
    }

    async fn close(&self, code: CloseCode) {
        let _ = self.sender.send(ChannelEvent::Closed(code));
    }
}

#[cfg(test)]
mockall::mock! {
    pub Connection {
        pub fn send(&self, message: ServerMessage) -> Result<(), Error>;
        pub fn close(&self, code: CloseCode);
    }
}

#[cfg(test)]
#[async_trait]
impl Connection for MockConnection {
    async fn send(&self, message: &ServerMessage) -> Result<(), Error> {
        MockConnection::send(self, message.clone())
    }

    async fn close(&self, code: CloseCode) {
        MockConnection::close(self, code)
    }
}
