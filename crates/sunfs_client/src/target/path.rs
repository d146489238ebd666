//! Symlink-aware path resolution.

use std::future::Future;
use std::pin::Pin;

use sunfs_types::nfs3::{fattr3, mode3, nfs_fh3};
use tracing::trace;

use super::Target;
use crate::error::Error;
use crate::io::{AsyncRead, AsyncWrite};

// The file-type bits of a mode, and the value that marks a symlink.
const MODE_TYPE_MASK: mode3 = 0o170_000;
const MODE_TYPE_SYMLINK: mode3 = 0o120_000;

/// Byte-wise file handle equality.
///
/// Handles are opaque; two handles name the same object exactly when their
/// length and content match.
#[must_use]
pub fn same_handle(a: &nfs_fh3, b: &nfs_fh3) -> bool {
    a.data.as_ref() == b.data.as_ref()
}

fn is_symlink(attr: &fattr3) -> bool {
    attr.mode & MODE_TYPE_MASK == MODE_TYPE_SYMLINK
}

/// The outcome of a full path walk.
pub(crate) struct Walked {
    /// Attributes of the terminal object; `None` when the walk never issued
    /// a `LOOKUP` because every component was empty or `.`.
    pub attr: Option<fattr3>,
    /// Handle of the terminal object, symlinks dereferenced.
    pub fh: nfs_fh3,
    /// The last path component seen, symlinks not rewritten.
    pub name: String,
    /// Handle of the directory the last component was resolved in.
    pub parent: nfs_fh3,
}

impl<IO> Target<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    /// Resolves `path` from the mount root, dereferencing every symlink
    /// encountered, the final component included.
    pub(crate) async fn walk_root(&mut self, path: &str) -> Result<Walked, Error> {
        let root = self.root().clone();
        let mut origins = Vec::new();
        self.walk(root, path.to_owned(), &mut origins).await
    }

    /// Resolves everything up to the final component and returns the
    /// `(parent handle, final name)` pair a mutating procedure needs,
    /// without looking the final name up.
    pub(crate) async fn walk_parent(&mut self, path: &str) -> Result<(nfs_fh3, String), Error> {
        let (prefix, name) = split_path(path);
        let walked = self.walk_root(prefix).await?;
        Ok((walked.fh, name.to_owned()))
    }

    /// Walks `path` component by component from `start`.
    ///
    /// `origins` records the handle of every symlink whose target is being
    /// resolved further up the call stack; looking up any of them again
    /// means the chain has cycled.
    pub(crate) fn walk<'a>(
        &'a mut self,
        start: nfs_fh3,
        path: String,
        origins: &'a mut Vec<nfs_fh3>,
    ) -> Pin<Box<dyn Future<Output = Result<Walked, Error>> + 'a>> {
        Box::pin(async move {
            let mut current = start;
            let mut parent = current.clone();
            let mut attr: Option<fattr3> = None;
            let mut name = String::new();

            for component in path.split('/') {
                component.clone_into(&mut name);
                parent = current.clone();

                // The walk is anchored at the root of the mount, so empty
                // components and `.` stay where they are. `..` is passed
                // through to the server like any other name.
                if component.is_empty() || component == "." {
                    continue;
                }

                let entry = self.lookup_fh(&parent, component.as_bytes()).await?;
                current = entry.object;
                attr = entry.obj_attributes.into_option();

                if attr.as_ref().is_some_and(is_symlink) {
                    if origins.iter().any(|origin| same_handle(origin, &current)) {
                        trace!("symlink cycle at {component}");
                        return Err(Error::SymlinkLoop);
                    }

                    let link_target = self.readlink_fh(&current).await?;
                    trace!("{component} -> {link_target}");

                    // Targets re-resolve from the mount root, absolute or
                    // not, with this link's handle recorded for cycle
                    // detection while its target is walked.
                    origins.push(current.clone());
                    let root = self.root().clone();
                    let resolved = self.walk(root, link_target, origins).await;
                    origins.pop();

                    let resolved = resolved?;
                    current = resolved.fh;
                    attr = resolved.attr;
                }
            }

            Ok(Walked {
                attr,
                fh: current,
                name,
                parent,
            })
        })
    }
}

/// Splits a path at its final slash into `(prefix, final component)`.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}
