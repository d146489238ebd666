use sunfs_types::portmap::{IPPROTO_TCP, PMAP_PROG, PROGRAM, VERSION, mapping};
use sunfs_types::xdr::{Pack, Unpack, Void};

use crate::error::{Error, PortmapError};
use crate::io::{AsyncRead, AsyncWrite};
use crate::rpc::RpcClient;

/// Client for the portmapper service.
#[derive(Debug)]
pub struct PortmapperClient<IO> {
    rpc: RpcClient<IO>,
}

impl<IO> PortmapperClient<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    pub fn new(io: IO) -> Self {
        Self {
            rpc: RpcClient::new(io),
        }
    }

    pub async fn null(&mut self) -> Result<(), Error> {
        let _ = self
            .call::<Void, Void>(PMAP_PROG::PMAPPROC_NULL, Void)
            .await?;
        Ok(())
    }

    /// Resolves the TCP port a program version is registered on.
    pub async fn getport(&mut self, prog: u32, vers: u32) -> Result<u16, Error> {
        let args = mapping {
            prog,
            vers,
            prot: IPPROTO_TCP,
            port: 0,
        };

        let port = self
            .call::<mapping, u32>(PMAP_PROG::PMAPPROC_GETPORT, args)
            .await?;

        match u16::try_from(port) {
            Ok(0) => Err(PortmapError::ProgramUnavailable.into()),
            Ok(port) => Ok(port),
            Err(_) => Err(PortmapError::InvalidPortValue(port).into()),
        }
    }

    async fn call<C, R>(&mut self, proc: PMAP_PROG, args: C) -> Result<R, Error>
    where
        C: Pack,
        R: Unpack,
    {
        self.rpc
            .call::<C, R>(PROGRAM, VERSION, proc as u32, &args)
            .await
    }
}
