//! The XDR (RFC 4506) codec the wire types are encoded with.
//!
//! Everything is positional: values pack to and unpack from a plain byte
//! stream with no framing of their own, which is what lets reply bodies be
//! decoded in place against a sequential reader.

pub(crate) mod error;
pub(crate) mod list;
pub(crate) mod opaque;
pub(crate) mod primitives;
pub(crate) mod traits;
pub(crate) mod util;
pub(crate) mod void;

// Re-exported so that protocol modules can `use crate::xdr::{Read, Write}`.
pub use std::io::{Read, Write};

/// Derive macro implementing [`Pack`] and [`Unpack`].
pub use sunfs_macros::XdrCodec;

pub use self::error::Error;
pub use self::list::{BoundedList, List};
pub use self::opaque::Opaque;
pub use self::traits::{Pack, Unpack};
pub use self::void::Void;

pub type Result<T, E = Error> = std::result::Result<T, E>;
