//! Traits for dialing an endpoint.

use crate::io::{AsyncRead, AsyncWrite};

/// Trait for connecting to a host and port.
pub trait Connector {
    type Connection: AsyncRead + AsyncWrite;

    /// Connect to a host and port.
    async fn connect(&self, host: &str, port: u16) -> std::io::Result<Self::Connection>;

    /// Connect to a host and port from a fixed local port.
    ///
    /// NFS servers exporting with `secure` only accept calls originating
    /// from reserved ports (below 1024), which requires binding the local
    /// end explicitly.
    async fn connect_with_port(
        &self,
        host: &str,
        port: u16,
        local_port: u16,
    ) -> std::io::Result<Self::Connection>;
}
