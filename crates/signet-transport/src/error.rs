use std::io;

/// Why moving a frame failed.
///
/// Every variant except `FrameTooLarge` wraps the underlying I/O error as
/// its `source`, so callers that only care "was it the network?" can treat
/// them alike.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("bind failed: {0}")]
    BindFailed(#[source] io::Error),

    /// A client connected but the WebSocket handshake failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),

    /// An outbound connection could not be opened.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] io::Error),

    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// The peer sent a frame larger than the connection accepts.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
}
