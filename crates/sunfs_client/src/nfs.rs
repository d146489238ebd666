use sunfs_types::nfs3::{
    ACCESS3args, ACCESS3res, CREATE3args, CREATE3res, FSINFO3args, FSINFO3res, GETATTR3args,
    GETATTR3res, LOOKUP3args, LOOKUP3res, MKDIR3args, MKDIR3res, NFS_PROGRAM, PROGRAM,
    READDIRPLUS3args, READDIRPLUS3res, READLINK3args, READLINK3res, REMOVE3args, REMOVE3res,
    RENAME3args, RENAME3res, RMDIR3args, RMDIR3res, SETATTR3args, SETATTR3res, VERSION,
};
use sunfs_types::rpc::opaque_auth;
use sunfs_types::xdr::{Pack, Unpack, Void};

use crate::error::Error;
use crate::io::{AsyncRead, AsyncWrite};
use crate::rpc::RpcClient;

/// A typed NFSv3 procedure-call client: one method per procedure, each
/// owning the exact wire shape of its arguments and reply.
pub struct Nfs3Client<IO> {
    rpc: RpcClient<IO>,
}

impl<IO> Nfs3Client<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    pub fn new(io: IO) -> Self {
        Self {
            rpc: RpcClient::new(io),
        }
    }

    /// Creates a client whose calls carry the given credential and verifier.
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
            .call::<Void, Void>(NFS_PROGRAM::NFSPROC3_NULL, Void)
            .await?;
        Ok(())
    }

    pub async fn getattr(&mut self, args: GETATTR3args) -> Result<GETATTR3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_GETATTR, args).await
    }

    pub async fn setattr(&mut self, args: SETATTR3args) -> Result<SETATTR3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_SETATTR, args).await
    }

    pub async fn lookup(&mut self, args: LOOKUP3args<'_>) -> Result<LOOKUP3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_LOOKUP, args).await
    }

    pub async fn access(&mut self, args: ACCESS3args) -> Result<ACCESS3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_ACCESS, args).await
    }

    pub async fn readlink(&mut self, args: READLINK3args) -> Result<READLINK3res<'static>, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_READLINK, args).await
    }

    pub async fn create(&mut self, args: CREATE3args<'_>) -> Result<CREATE3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_CREATE, args).await
    }

    pub async fn mkdir(&mut self, args: MKDIR3args<'_>) -> Result<MKDIR3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_MKDIR, args).await
    }

    pub async fn remove(&mut self, args: REMOVE3args<'_>) -> Result<REMOVE3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_REMOVE, args).await
    }

    pub async fn rmdir(&mut self, args: RMDIR3args<'_>) -> Result<RMDIR3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_RMDIR, args).await
    }

    pub async fn rename(&mut self, args: RENAME3args<'_, '_>) -> Result<RENAME3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_RENAME, args).await
    }

    pub async fn readdirplus(
        &mut self,
        args: READDIRPLUS3args,
    ) -> Result<READDIRPLUS3res<'static>, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_READDIRPLUS, args).await
    }

    pub async fn fsinfo(&mut self, args: FSINFO3args) -> Result<FSINFO3res, Error> {
        self.call(NFS_PROGRAM::NFSPROC3_FSINFO, args).await
    }

    async fn call<C, R>(&mut self, proc: NFS_PROGRAM, args: C) -> Result<R, Error>
    where
        C: Pack,
        R: Unpack,
    {
        self.rpc
            .call::<C, R>(PROGRAM, VERSION, proc as u32, &args)
            .await
    }
}
