#![doc = include_str!("../README.md")]
#![allow(async_fn_in_trait)]

pub mod error;
pub mod io;
pub(crate) mod mount;
pub mod net;
pub(crate) mod nfs;
pub(crate) mod portmapper;
pub mod rpc;
pub(crate) mod target;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use mount::*;
pub use nfs::*;
pub use portmapper::*;
pub use target::*;
