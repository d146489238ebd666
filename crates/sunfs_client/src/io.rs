//! Asynchronous I/O traits the RPC channel is generic over.

/// Trait to read bytes asynchronously.
pub trait AsyncRead {
    /// Read bytes from the stream into the provided buffer.
    async fn async_read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Read exactly the number of bytes needed to fill the buffer.
    async fn async_read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        let mut buf = buf;
        while !buf.is_empty() {
            let n = self.async_read(buf).await?;
            if n == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }
}

/// Trait to write bytes asynchronously.
pub trait AsyncWrite {
    /// Write bytes to the stream from the provided buffer.
    async fn async_write(&mut self, buf: &[u8]) -> std::io::Result<usize>;

    /// Write the whole buffer to the stream.
    async fn async_write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let mut buf = buf;
        while !buf.is_empty() {
            let n = self.async_write(buf).await?;
            if n == 0 {
                return Err(std::io::ErrorKind::WriteZero.into());
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}
