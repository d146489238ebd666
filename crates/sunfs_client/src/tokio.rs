//! Wrappers for tokio's types.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::io::{AsyncRead as TokioAsyncRead, AsyncWrite as TokioAsyncWrite};
use tokio::net::{TcpSocket, TcpStream};

use crate::io::{AsyncRead, AsyncWrite};
use crate::net::Connector;

/// Wraps a tokio [`AsyncRead`](TokioAsyncRead)/[`AsyncWrite`](TokioAsyncWrite)
/// implementor to provide this crate's [`AsyncRead`] and [`AsyncWrite`].
pub struct TokioIo<T>(T);

impl<T> TokioIo<T> {
    pub const fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T> AsyncRead for TokioIo<T>
where
    T: TokioAsyncRead + Unpin,
{
    async fn async_read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        tokio::io::AsyncReadExt::read(&mut self.0, buf).await
    }
}

impl<T> AsyncWrite for TokioIo<T>
where
    T: TokioAsyncWrite + Unpin,
{
    async fn async_write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        tokio::io::AsyncWriteExt::write(&mut self.0, buf).await
    }
}

/// Connects with tokio's [`TcpStream`].
pub struct TokioConnector;

impl Connector for TokioConnector {
    type Connection = TokioIo<TcpStream>;

    async fn connect(&self, host: &str, port: u16) -> std::io::Result<Self::Connection> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr).await?;
        Ok(TokioIo::new(stream))
    }

    async fn connect_with_port(
        &self,
        host: &str,
        port: u16,
        local_port: u16,
    ) -> std::io::Result<Self::Connection> {
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let (socket, local) = match addr {
            SocketAddr::V4(_) => (
                TcpSocket::new_v4()?,
                SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), local_port),
            ),
            SocketAddr::V6(_) => (
                TcpSocket::new_v6()?,
                SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), local_port),
            ),
        };
        socket.bind(local)?;

        let stream = socket.connect(addr).await?;
        Ok(TokioIo::new(stream))
    }
}
