//! The path-oriented NFSv3 target layer.
//!
//! A [`Target`] binds an RPC channel to one mounted export and translates
//! filesystem operations on slash-separated paths into sequences of NFSv3
//! procedure calls. Nothing is cached between calls except the `FSINFO`
//! reply fetched at construction; every attribute a method returns reflects
//! the object at the instant the server served that call.

mod path;
mod remove;

pub use path::same_handle;

use sunfs_types::mount::{self, dirpath};
use sunfs_types::nfs3::{
    self, ACCESS3args, CREATE3args, FSINFO3args, FSINFO3resok, GETATTR3args, LOOKUP3args,
    LOOKUP3resok, MKDIR3args, Nfs3Option, Nfs3Result, READDIRPLUS3args, READLINK3args,
    REMOVE3args, RENAME3args, RMDIR3args, SETATTR3args, cookieverf3, count3, createhow3,
    diropargs3, entryplus3, fattr3, mode3, nfs_fh3, sattr3, size3,
};
use sunfs_types::rpc::opaque_auth;
use sunfs_types::xdr::Opaque;
use tracing::{debug, trace};

use crate::error::Error;
use crate::io::{AsyncRead, AsyncWrite};
use crate::net::Connector;
use crate::nfs::Nfs3Client;
use crate::portmapper::PortmapperClient;
use crate::MountClient;

// Conservative request sizes most servers respect; large directories are
// drained through pagination rather than bigger buffers.
const READDIR_DIRCOUNT: count3 = 512;
const READDIR_MAXCOUNT: count3 = 4096;

// POSIX permission bits; everything above is owned by the object type.
const MODE_PERM_MASK: mode3 = 0o777;

/// Reads the status discriminant of a reply and turns a nonzero status into
/// a typed error, discarding the failure body.
pub(crate) fn nfs_ok<T, E>(res: Nfs3Result<T, E>) -> Result<T, Error> {
    match res {
        Nfs3Result::Ok(val) => Ok(val),
        Nfs3Result::Err((status, _)) => Err(Error::Nfs(status)),
    }
}

/// A stateful client endpoint bound to one mounted export.
pub struct Target<IO> {
    client: Nfs3Client<IO>,
    root: nfs_fh3,
    dirpath: String,
    fsinfo: FSINFO3resok,
}

impl<IO> Target<IO>
where
    IO: AsyncRead + AsyncWrite,
{
    /// Dials the server and mounts `mount_path`.
    ///
    /// Resolves the MOUNT3 and NFSv3 ports through the portmapper, obtains
    /// the root file handle with `MNT`, then opens the NFS channel and
    /// fetches `FSINFO`. The credential is carried on both the mount and
    /// the NFS channel.
    pub async fn connect<C>(
        connector: C,
        host: &str,
        mount_path: &str,
        credential: opaque_auth<'static>,
    ) -> Result<Self, Error>
    where
        C: Connector<Connection = IO>,
    {
        let pmap_io = connector
            .connect(host, sunfs_types::portmap::PMAP_PORT)
            .await?;
        let mut portmapper = PortmapperClient::new(pmap_io);
        let mount_port = portmapper
            .getport(mount::PROGRAM, mount::VERSION)
            .await?;
        let nfs_port = portmapper.getport(nfs3::PROGRAM, nfs3::VERSION).await?;

        let mount_io = connector.connect(host, mount_port).await?;
        let mut mount_client =
            MountClient::new_with_auth(mount_io, credential.clone(), opaque_auth::default());
        let mount_res = mount_client
            .mnt(dirpath(Opaque::borrowed(mount_path.as_bytes())))
            .await?;
        let root = nfs_fh3 {
            data: Opaque::owned(mount_res.fhandle.0.into_owned()),
        };

        let nfs_io = connector.connect(host, nfs_port).await?;
        let client = Nfs3Client::new_with_auth(nfs_io, credential, opaque_auth::default());
        Self::with_client(client, root, mount_path).await
    }

    /// Binds a target to an already-dialed NFS channel and root handle,
    /// issuing the one `FSINFO` call the target caches.
    pub async fn with_client(
        mut client: Nfs3Client<IO>,
        root: nfs_fh3,
        dir_path: impl Into<String>,
    ) -> Result<Self, Error> {
        let fsinfo = nfs_ok(
            client
                .fsinfo(FSINFO3args {
                    fsroot: root.clone(),
                })
                .await?,
        )?;
        let dir_path = dir_path.into();
        debug!(
            "{dir_path}: fsinfo rtmax={} wtmax={} dtpref={} maxfilesize={}",
            fsinfo.rtmax, fsinfo.wtmax, fsinfo.dtpref, fsinfo.maxfilesize
        );

        Ok(Self {
            client,
            root,
            dirpath: dir_path,
            fsinfo,
        })
    }

    /// The root file handle of the mounted export. Never changes after
    /// construction.
    #[must_use]
    pub fn root(&self) -> &nfs_fh3 {
        &self.root
    }

    /// The mount path this target was constructed with.
    #[must_use]
    pub fn dirpath(&self) -> &str {
        &self.dirpath
    }

    /// The server's `FSINFO` reply, fetched once at construction.
    #[must_use]
    pub fn fsinfo(&self) -> &FSINFO3resok {
        &self.fsinfo
    }

    /// Resolves `path` to a file handle, following symlinks.
    ///
    /// The attributes are those reported by the final `LOOKUP`; they are
    /// `None` only when the path names the mount root itself, which is
    /// resolved without issuing any call.
    pub async fn lookup(&mut self, path: &str) -> Result<(Option<fattr3>, nfs_fh3), Error> {
        let walked = self.walk_root(path).await?;
        Ok((walked.attr, walked.fh))
    }

    /// Resolves `path` and fetches fresh attributes for it.
    pub async fn getattr(&mut self, path: &str) -> Result<(fattr3, nfs_fh3), Error> {
        let (_, fh) = self.lookup(path).await?;
        let attr = self.getattr_by_fh(&fh).await?;
        Ok((attr, fh))
    }

    pub async fn getattr_by_fh(&mut self, fh: &nfs_fh3) -> Result<fattr3, Error> {
        let res = nfs_ok(
            self.client
                .getattr(GETATTR3args { object: fh.clone() })
                .await?,
        )?;
        Ok(res.obj_attributes)
    }

    /// Applies the set fields of `attributes` to the object. The ctime
    /// guard is always off; callers wanting optimistic concurrency must
    /// layer it above.
    pub async fn setattr_by_fh(&mut self, fh: &nfs_fh3, attributes: sattr3) -> Result<(), Error> {
        let _ = nfs_ok(
            self.client
                .setattr(SETATTR3args {
                    object: fh.clone(),
                    new_attributes: attributes,
                    guard: Nfs3Option::None,
                })
                .await?,
        )?;
        Ok(())
    }

    /// Checks the access rights in `access` (an `ACCESS3_*` bitmask) and
    /// returns the subset the server grants.
    pub async fn access(&mut self, path: &str, access: u32) -> Result<u32, Error> {
        let (_, fh) = self.lookup(path).await?;
        let res = nfs_ok(
            self.client
                .access(ACCESS3args {
                    object: fh,
                    access,
                })
                .await?,
        )?;
        Ok(res.access)
    }

    /// Reads the target of the symlink at `path`, verbatim.
    ///
    /// The final component is looked up without dereferencing, so this
    /// reads the link itself rather than whatever it points at.
    pub async fn readlink(&mut self, path: &str) -> Result<String, Error> {
        let (parent, name) = self.walk_parent(path).await?;
        let entry = self.lookup_fh(&parent, name.as_bytes()).await?;
        self.readlink_fh(&entry.object).await
    }

    /// Creates a regular file, returning its handle if the server sent one.
    pub async fn create(&mut self, path: &str, perm: mode3) -> Result<Option<nfs_fh3>, Error> {
        let (parent, name) = self.walk_parent(path).await?;
        self.create_by_fh(&parent, &name, perm).await
    }

    /// Creates a regular file and sets its size in the same call, saving
    /// the extra `SETATTR` round trip a truncate would otherwise cost.
    pub async fn create_truncate(
        &mut self,
        path: &str,
        perm: mode3,
        size: size3,
    ) -> Result<Option<nfs_fh3>, Error> {
        let (parent, name) = self.walk_parent(path).await?;
        let attributes = sattr3 {
            mode: Nfs3Option::Some(perm & MODE_PERM_MASK),
            size: Nfs3Option::Some(size),
            ..sattr3::default()
        };
        self.create_with_attributes(&parent, &name, attributes)
            .await
    }

    pub async fn create_by_fh(
        &mut self,
        dir: &nfs_fh3,
        name: &str,
        perm: mode3,
    ) -> Result<Option<nfs_fh3>, Error> {
        let attributes = sattr3 {
            mode: Nfs3Option::Some(perm & MODE_PERM_MASK),
            ..sattr3::default()
        };
        self.create_with_attributes(dir, name, attributes).await
    }

    async fn create_with_attributes(
        &mut self,
        dir: &nfs_fh3,
        name: &str,
        attributes: sattr3,
    ) -> Result<Option<nfs_fh3>, Error> {
        let res = nfs_ok(
            self.client
                .create(CREATE3args {
                    where_: diropargs3 {
                        dir: dir.clone(),
                        name: name.as_bytes().into(),
                    },
                    how: createhow3::UNCHECKED(attributes),
                })
                .await?,
        )?;
        debug!("create({name}): created");
        Ok(res.obj.into_option())
    }

    /// Creates a directory, returning its handle if the server sent one.
    pub async fn mkdir(&mut self, path: &str, perm: mode3) -> Result<Option<nfs_fh3>, Error> {
        let (parent, name) = self.walk_parent(path).await?;
        self.mkdir_by_parent_fh(&parent, &name, perm).await
    }

    pub async fn mkdir_by_parent_fh(
        &mut self,
        dir: &nfs_fh3,
        name: &str,
        perm: mode3,
    ) -> Result<Option<nfs_fh3>, Error> {
        let res = nfs_ok(
            self.client
                .mkdir(MKDIR3args {
                    where_: diropargs3 {
                        dir: dir.clone(),
                        name: name.as_bytes().into(),
                    },
                    attributes: sattr3 {
                        mode: Nfs3Option::Some(perm & MODE_PERM_MASK),
                        ..sattr3::default()
                    },
                })
                .await?,
        )?;
        debug!("mkdir({name}): created");
        Ok(res.obj.into_option())
    }

    /// Lists a directory completely, paging through `READDIRPLUS` as many
    /// times as the server requires.
    pub async fn read_dir_plus(&mut self, dir: &str) -> Result<Vec<entryplus3<'static>>, Error> {
        let (_, fh) = self.lookup(dir).await?;
        self.read_dir_plus_by_fh(&fh).await
    }

    pub async fn read_dir_plus_by_fh(
        &mut self,
        dir: &nfs_fh3,
    ) -> Result<Vec<entryplus3<'static>>, Error> {
        let mut entries = Vec::new();
        let mut cookie = 0;
        let mut cookieverf = cookieverf3::default();

        loop {
            let res = nfs_ok(
                self.client
                    .readdirplus(READDIRPLUS3args {
                        dir: dir.clone(),
                        cookie,
                        cookieverf,
                        dircount: READDIR_DIRCOUNT,
                        maxcount: READDIR_MAXCOUNT,
                    })
                    .await?,
            )?;

            // The verifier echoed on the next page is the one this page
            // carried; the cursor is the cookie of the last entry seen.
            cookieverf = res.cookieverf;
            let eof = res.reply.eof;
            for entry in res.reply.entries.into_inner() {
                cookie = entry.cookie;
                entries.push(entry);
            }

            if eof {
                break;
            }
            trace!("readdirplus: more entries after cookie {cookie}");
        }

        Ok(entries)
    }

    /// Removes the non-directory entry at `path`.
    pub async fn remove(&mut self, path: &str) -> Result<(), Error> {
        let (parent, name) = self.walk_parent(path).await?;
        self.remove_entry(&parent, name.as_bytes()).await
    }

    /// Removes the empty directory at `path`.
    pub async fn rmdir(&mut self, path: &str) -> Result<(), Error> {
        let (parent, name) = self.walk_parent(path).await?;
        self.rmdir_entry(&parent, name.as_bytes()).await
    }

    /// Renames `from_path` to `to_path`, atomically on the server side.
    ///
    /// Fails with [`Error::RenameRoot`] before issuing `RENAME` when either
    /// side resolves to the mount root itself.
    pub async fn rename(&mut self, from_path: &str, to_path: &str) -> Result<(), Error> {
        let from = self.walk_root(from_path).await?;
        if is_root_name(&from.name) {
            return Err(Error::RenameRoot);
        }

        let (to_dir, to_name) = self.walk_parent(to_path).await?;
        if is_root_name(&to_name) {
            return Err(Error::RenameRoot);
        }

        self.rename_by_fh(&from.parent, &from.name, &to_dir, &to_name)
            .await
    }

    pub async fn rename_by_fh(
        &mut self,
        from_dir: &nfs_fh3,
        from_name: &str,
        to_dir: &nfs_fh3,
        to_name: &str,
    ) -> Result<(), Error> {
        let _ = nfs_ok(
            self.client
                .rename(RENAME3args {
                    from: diropargs3 {
                        dir: from_dir.clone(),
                        name: from_name.as_bytes().into(),
                    },
                    to: diropargs3 {
                        dir: to_dir.clone(),
                        name: to_name.as_bytes().into(),
                    },
                })
                .await?,
        )?;
        debug!("rename({from_name} -> {to_name}): renamed");
        Ok(())
    }

    pub(crate) async fn lookup_fh(
        &mut self,
        dir: &nfs_fh3,
        name: &[u8],
    ) -> Result<LOOKUP3resok, Error> {
        nfs_ok(
            self.client
                .lookup(LOOKUP3args {
                    what: diropargs3 {
                        dir: dir.clone(),
                        name: name.into(),
                    },
                })
                .await?,
        )
    }

    pub(crate) async fn readlink_fh(&mut self, fh: &nfs_fh3) -> Result<String, Error> {
        let res = nfs_ok(
            self.client
                .readlink(READLINK3args { symlink: fh.clone() })
                .await?,
        )?;
        let target =
            String::from_utf8(res.data.as_ref().to_vec()).map_err(sunfs_types::xdr::Error::from)?;
        Ok(target)
    }

    async fn remove_entry(&mut self, dir: &nfs_fh3, name: &[u8]) -> Result<(), Error> {
        let _ = nfs_ok(
            self.client
                .remove(REMOVE3args {
                    object: diropargs3 {
                        dir: dir.clone(),
                        name: name.into(),
                    },
                })
                .await?,
        )?;
        Ok(())
    }

    async fn rmdir_entry(&mut self, dir: &nfs_fh3, name: &[u8]) -> Result<(), Error> {
        let _ = nfs_ok(
            self.client
                .rmdir(RMDIR3args {
                    object: diropargs3 {
                        dir: dir.clone(),
                        name: name.into(),
                    },
                })
                .await?,
        )?;
        Ok(())
    }
}

// A final component that resolves to the start of the walk rather than
// naming an entry in some directory.
fn is_root_name(name: &str) -> bool {
    name.is_empty() || name == "."
}
