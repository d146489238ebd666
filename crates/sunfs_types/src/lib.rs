#![doc = include_str!("../README.md")]

// The derive macro emits paths rooted at `sunfs_types`, which this alias
// makes resolvable from within the crate itself.
extern crate self as sunfs_types;

pub mod mount;
pub mod nfs3;
pub mod portmap;
pub mod rpc;
pub mod xdr;
