#![allow(
    non_camel_case_types,
    clippy::large_enum_variant,
    clippy::upper_case_acronyms
)]

//! ONC-RPC message types as defined in RFC 5531, plus the TCP record-marking
//! header of §11.

use sunfs_macros::XdrCodec;

use crate::xdr::{Opaque, Pack, Read, Result, Unpack, Write};

pub const RPC_VERSION_2: u32 = 2;

/// Record-marking header: a 31-bit fragment length with the high bit flagging
/// the final fragment of a record.
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
pub struct fragment_header {
    pub header: u32,
}

impl fragment_header {
    pub const LAST_FLAG: u32 = 0x8000_0000;
    pub const LENGTH_MASK: u32 = 0x7FFF_FFFF;

    /// # Panics
    ///
    /// Panics if `length` exceeds the 31-bit fragment limit.
    #[must_use]
    pub fn new(length: u32, last: bool) -> Self {
        assert!(length <= Self::LENGTH_MASK);
        let mut header = length;
        if last {
            header |= Self::LAST_FLAG;
        }
        Self { header }
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.header & Self::LAST_FLAG != 0
    }

    #[must_use]
    pub const fn fragment_length(&self) -> u32 {
        self.header & Self::LENGTH_MASK
    }
}

impl From<[u8; 4]> for fragment_header {
    fn from(bytes: [u8; 4]) -> Self {
        Self {
            header: u32::from_be_bytes(bytes),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum msg_type {
    CALL = 0,
    REPLY = 1,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum reply_stat {
    MSG_ACCEPTED = 0,
    MSG_DENIED = 1,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum accept_stat {
    SUCCESS = 0,
    PROG_UNAVAIL = 1,
    PROG_MISMATCH = 2,
    PROC_UNAVAIL = 3,
    GARBAGE_ARGS = 4,
    SYSTEM_ERR = 5,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum reject_stat {
    RPC_MISMATCH = 0,
    AUTH_ERROR = 1,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum auth_stat {
    AUTH_OK = 0,
    AUTH_BADCRED = 1,
    AUTH_REJECTEDCRED = 2,
    AUTH_BADVERF = 3,
    AUTH_REJECTEDVERF = 4,
    AUTH_TOOWEAK = 5,
    AUTH_INVALIDRESP = 6,
    AUTH_FAILED = 7,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum auth_flavor {
    AUTH_NULL = 0,
    AUTH_UNIX = 1,
    AUTH_SHORT = 2,
    AUTH_DES = 3,
}

/// An authentication credential or verifier: a flavor plus an opaque body
/// whose interpretation depends on the flavor.
#[derive(Clone, Debug, XdrCodec)]
pub struct opaque_auth<'a> {
    pub flavor: auth_flavor,
    pub body: Opaque<'a>,
}

impl Default for opaque_auth<'static> {
    fn default() -> Self {
        Self {
            flavor: auth_flavor::AUTH_NULL,
            body: Opaque::borrowed(&[]),
        }
    }
}

impl opaque_auth<'static> {
    /// Builds an `AUTH_UNIX` credential from the given identity.
    ///
    /// # Panics
    ///
    /// Panics if the identity cannot be packed, which would require a
    /// machine name longer than 4 GiB.
    #[must_use]
    pub fn auth_unix(auth: &auth_unix) -> Self {
        let mut body = Vec::with_capacity(auth.packed_size());
        auth.pack(&mut body).expect("failed to pack auth_unix");
        Self {
            flavor: auth_flavor::AUTH_UNIX,
            body: Opaque::owned(body),
        }
    }

    #[must_use]
    pub fn borrow(&self) -> opaque_auth<'_> {
        opaque_auth {
            flavor: self.flavor,
            body: Opaque::borrowed(self.body.as_ref()),
        }
    }
}

/// The body of an `AUTH_UNIX` credential (RFC 5531 appendix A).
#[derive(Clone, Debug, XdrCodec)]
pub struct auth_unix {
    pub stamp: u32,
    pub machinename: Opaque<'static>,
    pub uid: u32,
    pub gid: u32,
    pub gids: Vec<u32>,
}

impl Default for auth_unix {
    fn default() -> Self {
        Self {
            stamp: 0,
            machinename: Opaque::borrowed(b""),
            uid: 0,
            gid: 0,
            gids: vec![],
        }
    }
}

#[derive(Debug, XdrCodec)]
pub struct call_body<'a> {
    pub rpcvers: u32,
    pub prog: u32,
    pub vers: u32,
    pub proc: u32,
    pub cred: opaque_auth<'a>,
    pub verf: opaque_auth<'a>,
}

#[derive(Debug, XdrCodec)]
pub struct accepted_reply<'a> {
    pub verf: opaque_auth<'a>,
    pub reply_data: accept_stat_data,
}

#[derive(Debug)]
pub enum accept_stat_data {
    SUCCESS,
    PROG_UNAVAIL,
    PROG_MISMATCH { low: u32, high: u32 },
    PROC_UNAVAIL,
    GARBAGE_ARGS,
    SYSTEM_ERR,
}

impl Pack for accept_stat_data {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::PROG_MISMATCH { .. } => 8,
            _ => 0,
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::SUCCESS => accept_stat::SUCCESS.pack(out)?,
            Self::PROG_UNAVAIL => accept_stat::PROG_UNAVAIL.pack(out)?,
            Self::PROG_MISMATCH { low, high } => {
                accept_stat::PROG_MISMATCH.pack(out)? + low.pack(out)? + high.pack(out)?
            }
            Self::PROC_UNAVAIL => accept_stat::PROC_UNAVAIL.pack(out)?,
            Self::GARBAGE_ARGS => accept_stat::GARBAGE_ARGS.pack(out)?,
            Self::SYSTEM_ERR => accept_stat::SYSTEM_ERR.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for accept_stat_data {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (stat, mut read) = accept_stat::unpack(input)?;
        let body = match stat {
            accept_stat::SUCCESS => Self::SUCCESS,
            accept_stat::PROG_UNAVAIL => Self::PROG_UNAVAIL,
            accept_stat::PROG_MISMATCH => {
                let (low, n) = u32::unpack(input)?;
                read += n;
                let (high, n) = u32::unpack(input)?;
                read += n;
                Self::PROG_MISMATCH { low, high }
            }
            accept_stat::PROC_UNAVAIL => Self::PROC_UNAVAIL,
            accept_stat::GARBAGE_ARGS => Self::GARBAGE_ARGS,
            accept_stat::SYSTEM_ERR => Self::SYSTEM_ERR,
        };
        Ok((body, read))
    }
}

#[derive(Debug)]
pub enum rejected_reply {
    RPC_MISMATCH { low: u32, high: u32 },
    AUTH_ERROR(auth_stat),
}

impl Pack for rejected_reply {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::RPC_MISMATCH { .. } => 8,
            Self::AUTH_ERROR(_) => 4,
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::RPC_MISMATCH { low, high } => {
                reject_stat::RPC_MISMATCH.pack(out)? + low.pack(out)? + high.pack(out)?
            }
            Self::AUTH_ERROR(stat) => reject_stat::AUTH_ERROR.pack(out)? + stat.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for rejected_reply {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (stat, mut read) = reject_stat::unpack(input)?;
        let body = match stat {
            reject_stat::RPC_MISMATCH => {
                let (low, n) = u32::unpack(input)?;
                read += n;
                let (high, n) = u32::unpack(input)?;
                read += n;
                Self::RPC_MISMATCH { low, high }
            }
            reject_stat::AUTH_ERROR => {
                let (stat, n) = auth_stat::unpack(input)?;
                read += n;
                Self::AUTH_ERROR(stat)
            }
        };
        Ok((body, read))
    }
}

#[derive(Debug)]
pub enum reply_body<'a> {
    MSG_ACCEPTED(accepted_reply<'a>),
    MSG_DENIED(rejected_reply),
}

impl Pack for reply_body<'_> {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::MSG_ACCEPTED(reply) => reply.packed_size(),
            Self::MSG_DENIED(reply) => reply.packed_size(),
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::MSG_ACCEPTED(reply) => reply_stat::MSG_ACCEPTED.pack(out)? + reply.pack(out)?,
            Self::MSG_DENIED(reply) => reply_stat::MSG_DENIED.pack(out)? + reply.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for reply_body<'_> {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (stat, mut read) = reply_stat::unpack(input)?;
        let body = match stat {
            reply_stat::MSG_ACCEPTED => {
                let (reply, n) = accepted_reply::unpack(input)?;
                read += n;
                Self::MSG_ACCEPTED(reply)
            }
            reply_stat::MSG_DENIED => {
                let (reply, n) = rejected_reply::unpack(input)?;
                read += n;
                Self::MSG_DENIED(reply)
            }
        };
        Ok((body, read))
    }
}

#[derive(Debug)]
pub enum msg_body<'a, 'b> {
    CALL(call_body<'a>),
    REPLY(reply_body<'b>),
}

impl Pack for msg_body<'_, '_> {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::CALL(call) => call.packed_size(),
            Self::REPLY(reply) => reply.packed_size(),
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::CALL(call) => msg_type::CALL.pack(out)? + call.pack(out)?,
            Self::REPLY(reply) => msg_type::REPLY.pack(out)? + reply.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for msg_body<'_, '_> {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (kind, mut read) = msg_type::unpack(input)?;
        let body = match kind {
            msg_type::CALL => {
                let (call, n) = call_body::unpack(input)?;
                read += n;
                Self::CALL(call)
            }
            msg_type::REPLY => {
                let (reply, n) = reply_body::unpack(input)?;
                read += n;
                Self::REPLY(reply)
            }
        };
        Ok((body, read))
    }
}

#[derive(Debug, XdrCodec)]
pub struct rpc_msg<'a, 'b> {
    pub xid: u32,
    pub body: msg_body<'a, 'b>,
}
