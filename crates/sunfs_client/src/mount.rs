use sunfs_types::mount::{MOUNT_PROGRAM, PROGRAM, VERSION, dirpath, mountres3, mountres3_ok};
use sunfs_types::rpc::opaque_auth;
use sunfs_types::xdr::{Pack, Unpack, Void};

use crate::error::Error;
use crate::io::{AsyncRead, AsyncWrite};
use crate::rpc::RpcClient;

/// Client for the MOUNT3 service.
#[derive(Debug)]
pub struct MountClient<IO> {
    rpc: RpcClient<IO>,
}

impl<IO> MountClient<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    pub fn new(io: IO) -> Self {
        Self {
            rpc: RpcClient::new(io),
        }
    }

    /// Creates a mount client with the given credential and verifier.
    pub fn new_with_auth(
        io: IO,
        credential: opaque_auth<'static>,
        verifier: opaque_auth<'static>,
    ) -> Self {
        Self {
            rpc: RpcClient::new_with_auth(io, credential, verifier),
        }
    }

    pub async fn null(&mut self) -> Result<(), Error> {
        let _ = self
            .call::<Void, Void>(MOUNT_PROGRAM::MOUNTPROC3_NULL, Void)
            .await?;
        Ok(())
    }

    /// Mounts an export and returns the root file handle the server issued.
    pub async fn mnt(&mut self, dirpath_: dirpath<'_>) -> Result<mountres3_ok<'static>, Error> {
        let result = self
            .call::<dirpath, mountres3>(MOUNT_PROGRAM::MOUNTPROC3_MNT, dirpath_)
            .await?;

        match result {
            mountres3::Ok(ok) => Ok(ok),
            mountres3::Err(status) => Err(Error::Mount(status)),
        }
    }

    pub async fn umnt(&mut self, dirpath_: dirpath<'_>) -> Result<(), Error> {
        let _ = self
            .call::<dirpath, Void>(MOUNT_PROGRAM::MOUNTPROC3_UMNT, dirpath_)
            .await?;
        Ok(())
    }

    async fn call<C, R>(&mut self, proc: MOUNT_PROGRAM, args: C) -> Result<R, Error>
    where
        C: Pack,
        R: Unpack,
    {
        self.rpc
            .call::<C, R>(PROGRAM, VERSION, proc as u32, &args)
            .await
    }
}
