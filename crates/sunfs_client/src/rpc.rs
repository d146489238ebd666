//! The ONC-RPC channel.

use std::fmt::Debug;
use std::io::Cursor;

use sunfs_types::rpc::{
    RPC_VERSION_2, accept_stat_data, call_body, fragment_header, msg_body, opaque_auth, reply_body,
    rpc_msg,
};
use sunfs_types::xdr::{Pack, Unpack};

use crate::error::{Error, RpcError};
use crate::io::{AsyncRead, AsyncWrite};

/// An RPC client bound to one transport stream.
///
/// Calls are strictly sequential: a call writes one record and then reads
/// one record, so the channel carries at most one transaction at a time.
pub struct RpcClient<IO> {
    io: IO,
    xid: u32,
    credential: opaque_auth<'static>,
    verifier: opaque_auth<'static>,
}

impl<IO> Debug for RpcClient<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.debug_struct("RpcClient").field("xid", &self.xid).finish()
    }
}

impl<IO> RpcClient<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    /// Creates a new RPC client with `AUTH_NULL` credentials. The XID starts
    /// at a random value.
    pub fn new(io: IO) -> Self {
        Self::new_with_auth(io, opaque_auth::default(), opaque_auth::default())
    }

    /// Creates a new RPC client with the given credential and verifier.
    pub fn new_with_auth(
        io: IO,
        credential: opaque_auth<'static>,
        verifier: opaque_auth<'static>,
    ) -> Self {
        Self {
            io,
            xid: rand::random(),
            credential,
            verifier,
        }
    }

    /// Calls a remote procedure: packs `args` after the call header, then
    /// reads and decodes the matching reply body.
    pub async fn call<C, R>(&mut self, prog: u32, vers: u32, proc: u32, args: &C) -> Result<R, Error>
    where
        C: Pack,
        R: Unpack,
    {
        let call = call_body {
            rpcvers: RPC_VERSION_2,
            prog,
            vers,
            proc,
            cred: self.credential.borrow(),
            verf: self.verifier.borrow(),
        };
        let msg = rpc_msg {
            xid: self.xid,
            body: msg_body::CALL(call),
        };
        self.xid = self.xid.wrapping_add(1);

        Self::send_call(&mut self.io, &msg, args).await?;
        Self::recv_reply::<R>(&mut self.io, msg.xid).await
    }

    async fn send_call<T>(io: &mut IO, msg: &rpc_msg<'_, '_>, args: &T) -> Result<(), Error>
    where
        T: Pack,
    {
        let total_len = msg.packed_size() + args.packed_size();
        if total_len % 4 != 0 {
            return Err(RpcError::WrongLength.into());
        }
        let Ok(fragment_len) = u32::try_from(total_len) else {
            return Err(RpcError::WrongLength.into());
        };

        let header = fragment_header::new(fragment_len, true);
        let mut buf = Vec::with_capacity(total_len + 4);
        header.pack(&mut buf)?;
        msg.pack(&mut buf)?;
        args.pack(&mut buf)?;
        if buf.len() - 4 != total_len {
            return Err(RpcError::WrongLength.into());
        }

        io.async_write_all(&buf).await?;
        Ok(())
    }

    async fn recv_reply<T>(io: &mut IO, xid: u32) -> Result<T, Error>
    where
        T: Unpack,
    {
        // A record may arrive split into several fragments.
        let mut record = Vec::new();
        loop {
            let mut buf = [0u8; 4];
            io.async_read_exact(&mut buf).await?;
            let header = fragment_header::from(buf);

            let offset = record.len();
            record.resize(offset + header.fragment_length() as usize, 0);
            io.async_read_exact(&mut record[offset..]).await?;

            if header.is_last() {
                break;
            }
        }

        let record_len = record.len() as u64;
        let mut cursor = Cursor::new(record);
        let (reply_msg, _) = rpc_msg::unpack(&mut cursor)?;

        if reply_msg.xid != xid {
            return Err(RpcError::UnexpectedXid.into());
        }

        let reply = match reply_msg.body {
            msg_body::REPLY(reply_body::MSG_ACCEPTED(reply)) => reply,
            msg_body::REPLY(reply_body::MSG_DENIED(rejected)) => return Err(rejected.into()),
            msg_body::CALL(_) => return Err(RpcError::UnexpectedCall.into()),
        };

        if !matches!(reply.reply_data, accept_stat_data::SUCCESS) {
            let err = RpcError::try_from(reply.reply_data)
                .unwrap_or(RpcError::SystemErr);
            return Err(err.into());
        }

        let (value, _) = T::unpack(&mut cursor)?;
        if cursor.position() != record_len {
            let pos = cursor.position();
            return Err(RpcError::NotFullyParsed {
                buf: cursor.into_inner(),
                pos,
            }
            .into());
        }
        Ok(value)
    }
}
