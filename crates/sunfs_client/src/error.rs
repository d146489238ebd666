//! Error types.

use std::error::Error as StdError;
use std::fmt;

use sunfs_types::nfs3::nfsstat3;
use sunfs_types::rpc::{accept_stat_data, rejected_reply};

#[derive(Debug)]
pub enum Error {
    /// Transport error from the underlying stream.
    Io(std::io::Error),
    /// Malformed or unexpected bytes while encoding or decoding.
    Xdr(sunfs_types::xdr::Error),
    /// The RPC layer rejected or mangled a call.
    Rpc(RpcError),
    /// The portmapper could not resolve a program to a port.
    Portmap(PortmapError),
    /// The MOUNT3 service refused the mount.
    Mount(sunfs_types::mount::mountstat3),
    /// A nonzero NFS3 status in a reply.
    Nfs(nfsstat3),
    /// Path resolution encountered a symlink cycle.
    SymlinkLoop,
    /// A rename source or destination resolved to the mount root.
    RenameRoot,
}

impl Error {
    /// True when the error says the object is absent: `NFS3ERR_NOENT`, or
    /// `NFS3ERR_STALE` for an object whose handle has been invalidated.
    #[must_use]
    pub fn is_not_exist(&self) -> bool {
        matches!(
            self,
            Self::Nfs(nfsstat3::NFS3ERR_NOENT | nfsstat3::NFS3ERR_STALE)
        )
    }

    /// True when the error says the object is not a directory.
    #[must_use]
    pub fn is_not_dir(&self) -> bool {
        matches!(self, Self::Nfs(nfsstat3::NFS3ERR_NOTDIR))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::Xdr(e) => e.fmt(f),
            Self::Rpc(e) => e.fmt(f),
            Self::Portmap(e) => e.fmt(f),
            Self::Mount(e) => write!(f, "mount error: {e}"),
            Self::Nfs(e) => write!(f, "NFS3 error: {e:?}"),
            Self::SymlinkLoop => write!(f, "symlink loop detected"),
            Self::RenameRoot => write!(f, "cannot rename the mount root"),
        }
    }
}

impl StdError for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<sunfs_types::xdr::Error> for Error {
    fn from(e: sunfs_types::xdr::Error) -> Self {
        Self::Xdr(e)
    }
}

impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        Self::Rpc(e)
    }
}

impl From<PortmapError> for Error {
    fn from(e: PortmapError) -> Self {
        Self::Portmap(e)
    }
}

impl From<rejected_reply> for Error {
    fn from(e: rejected_reply) -> Self {
        Self::Rpc(e.into())
    }
}

#[derive(Debug)]
pub enum RpcError {
    UnexpectedCall,
    Auth,
    RpcMismatch,
    WrongLength,
    UnexpectedXid,
    NotFullyParsed { buf: Vec<u8>, pos: u64 },
    ProgUnavail,
    ProgMismatch,
    ProcUnavail,
    GarbageArgs,
    SystemErr,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCall => write!(f, "unexpected CALL message in reply"),
            Self::Auth => write!(f, "authentication error"),
            Self::RpcMismatch => write!(f, "RPC version mismatch"),
            Self::WrongLength => write!(f, "wrong length in RPC message"),
            Self::UnexpectedXid => write!(f, "unexpected XID in RPC reply"),
            Self::NotFullyParsed { buf, pos } => {
                write!(f, "reply not fully parsed: {pos} of {} bytes", buf.len())
            }
            Self::ProgUnavail => write!(f, "program unavailable"),
            Self::ProgMismatch => write!(f, "program version mismatch"),
            Self::ProcUnavail => write!(f, "procedure unavailable"),
            Self::GarbageArgs => write!(f, "garbage arguments"),
            Self::SystemErr => write!(f, "system error"),
        }
    }
}

impl StdError for RpcError {}

impl From<rejected_reply> for RpcError {
    fn from(e: rejected_reply) -> Self {
        match e {
            rejected_reply::RPC_MISMATCH { .. } => Self::RpcMismatch,
            rejected_reply::AUTH_ERROR(_) => Self::Auth,
        }
    }
}

impl TryFrom<accept_stat_data> for RpcError {
    type Error = ();

    fn try_from(value: accept_stat_data) -> Result<Self, Self::Error> {
        match value {
            accept_stat_data::SUCCESS => Err(()),
            accept_stat_data::PROG_UNAVAIL => Ok(Self::ProgUnavail),
            accept_stat_data::PROG_MISMATCH { .. } => Ok(Self::ProgMismatch),
            accept_stat_data::PROC_UNAVAIL => Ok(Self::ProcUnavail),
            accept_stat_data::GARBAGE_ARGS => Ok(Self::GarbageArgs),
            accept_stat_data::SYSTEM_ERR => Ok(Self::SystemErr),
        }
    }
}

#[derive(Debug)]
pub enum PortmapError {
    ProgramUnavailable,
    InvalidPortValue(u32),
}

impl fmt::Display for PortmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgramUnavailable => write!(f, "program unavailable"),
            Self::InvalidPortValue(value) => write!(f, "invalid port value: {value}"),
        }
    }
}

impl StdError for PortmapError {}
