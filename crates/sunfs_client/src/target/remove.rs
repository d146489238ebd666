//! Recursive directory removal.

use std::future::Future;
use std::pin::Pin;

use sunfs_types::nfs3::{Nfs3Option, entryplus3, ftype3, nfs_fh3};
use tracing::debug;

use super::Target;
use crate::error::Error;
use crate::io::{AsyncRead, AsyncWrite};

impl<IO> Target<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    /// Removes the directory at `path` and everything beneath it, bottom-up.
    ///
    /// Removing a path that is already gone succeeds; removing a
    /// non-directory fails with `NFS3ERR_NOTDIR` (use [`Target::remove`]
    /// for files). The traversal is not atomic: an error partway through
    /// surfaces immediately and leaves the subtree partially emptied on
    /// the server.
    pub async fn remove_all(&mut self, path: &str) -> Result<(), Error> {
        let (parent, name) = self.walk_parent(path).await?;

        // The easy path: an empty directory, or one that is already gone.
        match self.rmdir_entry(&parent, name.as_bytes()).await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_not_exist() => return Ok(()),
            Err(err) if err.is_not_dir() => return Err(err),
            Err(_) => {}
        }

        let mut origins = Vec::new();
        let walked = self.walk(parent.clone(), name.clone(), &mut origins).await?;
        self.remove_tree(walked.fh).await?;

        // The subtree is gone; the directory itself can go now.
        self.rmdir_entry(&parent, name.as_bytes()).await
    }

    /// Empties the directory `dir` recursively, in the order the server
    /// returned its entries.
    fn remove_tree<'a>(
        &'a mut self,
        dir: nfs_fh3,
    ) -> Pin<Box<dyn Future<Output = Result<(), Error>> + 'a>> {
        Box::pin(async move {
            let entries = self.read_dir_plus_by_fh(&dir).await?;

            for entry in entries {
                let entryplus3 {
                    name,
                    name_attributes,
                    name_handle,
                    ..
                } = entry;

                if name.as_ref() == b".".as_slice() || name.as_ref() == b"..".as_slice() {
                    continue;
                }

                let is_dir = matches!(
                    name_attributes.as_option().map(|attr| attr.type_),
                    Some(ftype3::NF3DIR)
                );

                let result = if is_dir {
                    if let Nfs3Option::Some(child) = name_handle {
                        self.remove_tree(child).await?;
                    }
                    self.rmdir_entry(&dir, name.as_ref()).await
                } else {
                    self.remove_entry(&dir, name.as_ref()).await
                };

                if let Err(err) = result {
                    debug!(
                        "failed to delete {}: {err}",
                        String::from_utf8_lossy(name.as_ref())
                    );
                    return Err(err);
                }
            }

            Ok(())
        })
    }
}
