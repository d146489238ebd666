#![allow(
    non_camel_case_types,
    clippy::large_enum_variant,
    clippy::upper_case_acronyms
)]

//! NFS version 3 protocol types as defined in RFC 1813, restricted to the
//! procedures a path-oriented client issues.

use sunfs_macros::XdrCodec;

use crate::xdr::{List, Opaque, Pack, Read, Result, Unpack, Write};

pub const PROGRAM: u32 = 100_003;
pub const VERSION: u32 = 3;

pub const NFS3_FHSIZE: usize = 64;
pub const NFS3_COOKIEVERFSIZE: usize = 8;
pub const NFS3_CREATEVERFSIZE: usize = 8;

pub const ACCESS3_READ: u32 = 0x01;
pub const ACCESS3_LOOKUP: u32 = 0x02;
pub const ACCESS3_MODIFY: u32 = 0x04;
pub const ACCESS3_EXTEND: u32 = 0x08;
pub const ACCESS3_DELETE: u32 = 0x10;
pub const ACCESS3_EXECUTE: u32 = 0x20;

pub const FSF3_LINK: u32 = 0x01;
pub const FSF3_SYMLINK: u32 = 0x02;
pub const FSF3_HOMOGENEOUS: u32 = 0x08;
pub const FSF3_CANSETTIME: u32 = 0x10;

pub type cookie3 = u64;
pub type count3 = u32;
pub type fileid3 = u64;
pub type gid3 = u32;
pub type mode3 = u32;
pub type size3 = u64;
pub type uid3 = u32;

/// Result union shared by every procedure reply: an `nfsstat3` discriminant
/// followed by the ok body on `NFS3_OK` and by the fail body otherwise.
#[derive(Debug)]
pub enum Nfs3Result<T, E> {
    Ok(T),
    Err((nfsstat3, E)),
}

impl<T, E: std::fmt::Debug> Nfs3Result<T, E> {
    /// # Panics
    ///
    /// Panics if the result is an error.
    pub fn unwrap(self) -> T {
        match self {
            Self::Ok(val) => val,
            Self::Err((status, body)) => panic!("NFS3 error: {status:?}, body: {body:?}"),
        }
    }
}

impl<T: Pack, E: Pack> Pack for Nfs3Result<T, E> {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::Ok(val) => val.packed_size(),
            Self::Err((_, body)) => body.packed_size(),
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::Ok(val) => nfsstat3::NFS3_OK.pack(out)? + val.pack(out)?,
            Self::Err((status, body)) => status.pack(out)? + body.pack(out)?,
        };
        Ok(len)
    }
}

impl<T: Unpack, E: Unpack> Unpack for Nfs3Result<T, E> {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (status, mut read) = nfsstat3::unpack(input)?;
        match status {
            nfsstat3::NFS3_OK => {
                let (val, n) = T::unpack(input)?;
                read += n;
                Ok((Self::Ok(val), read))
            }
            _ => {
                let (body, n) = E::unpack(input)?;
                read += n;
                Ok((Self::Err((status, body)), read))
            }
        }
    }
}

/// XDR optional data: a boolean discriminant followed by the payload iff
/// true. Servers use it for attributes and handles they may omit.
#[derive(Debug, Clone, Default)]
pub enum Nfs3Option<T> {
    Some(T),
    #[default]
    None,
}

impl<T> Nfs3Option<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Some(val) => Some(val),
            Self::None => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Some(val) => Some(val),
            Self::None => None,
        }
    }

    /// # Panics
    ///
    /// Panics if the value is absent.
    pub fn unwrap(self) -> T {
        self.into_option().expect("value is not set")
    }
}

impl<T: Pack> Pack for Nfs3Option<T> {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::Some(val) => val.packed_size(),
            Self::None => 0,
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::Some(val) => true.pack(out)? + val.pack(out)?,
            Self::None => false.pack(out)?,
        };
        Ok(len)
    }
}

impl<T: Unpack> Unpack for Nfs3Option<T> {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (set, mut read) = bool::unpack(input)?;
        if set {
            let (val, n) = T::unpack(input)?;
            read += n;
            Ok((Self::Some(val), read))
        } else {
            Ok((Self::None, read))
        }
    }
}

pub type pre_op_attr = Nfs3Option<wcc_attr>;
pub type post_op_attr = Nfs3Option<fattr3>;
pub type post_op_fh3 = Nfs3Option<nfs_fh3>;
pub type sattrguard3 = Nfs3Option<nfstime3>;
pub type set_mode3 = Nfs3Option<mode3>;
pub type set_uid3 = Nfs3Option<uid3>;
pub type set_gid3 = Nfs3Option<gid3>;
pub type set_size3 = Nfs3Option<size3>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum nfsstat3 {
    NFS3_OK = 0,
    NFS3ERR_PERM = 1,
    NFS3ERR_NOENT = 2,
    NFS3ERR_IO = 5,
    NFS3ERR_NXIO = 6,
    NFS3ERR_ACCES = 13,
    NFS3ERR_EXIST = 17,
    NFS3ERR_XDEV = 18,
    NFS3ERR_NODEV = 19,
    NFS3ERR_NOTDIR = 20,
    NFS3ERR_ISDIR = 21,
    NFS3ERR_INVAL = 22,
    NFS3ERR_FBIG = 27,
    NFS3ERR_NOSPC = 28,
    NFS3ERR_ROFS = 30,
    NFS3ERR_MLINK = 31,
    NFS3ERR_NAMETOOLONG = 63,
    NFS3ERR_NOTEMPTY = 66,
    NFS3ERR_DQUOT = 69,
    NFS3ERR_STALE = 70,
    NFS3ERR_REMOTE = 71,
    NFS3ERR_BADHANDLE = 10001,
    NFS3ERR_NOT_SYNC = 10002,
    NFS3ERR_BAD_COOKIE = 10003,
    NFS3ERR_NOTSUPP = 10004,
    NFS3ERR_TOOSMALL = 10005,
    NFS3ERR_SERVERFAULT = 10006,
    NFS3ERR_BADTYPE = 10007,
    NFS3ERR_JUKEBOX = 10008,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum ftype3 {
    NF3REG = 1,
    NF3DIR = 2,
    NF3BLK = 3,
    NF3CHR = 4,
    NF3LNK = 5,
    NF3SOCK = 6,
    NF3FIFO = 7,
}

/// An opaque server-issued file handle, at most [`NFS3_FHSIZE`] octets.
/// Equality is byte-wise; the client never interprets the contents.
#[derive(Clone, Debug, Eq, PartialEq, XdrCodec)]
pub struct nfs_fh3 {
    pub data: Opaque<'static>,
}

impl Default for nfs_fh3 {
    fn default() -> Self {
        Self {
            data: Opaque::borrowed(&[]),
        }
    }
}

#[derive(Debug, Eq, PartialEq, XdrCodec)]
pub struct filename3<'a>(pub Opaque<'a>);

impl From<Vec<u8>> for filename3<'static> {
    fn from(name: Vec<u8>) -> Self {
        Self(Opaque::owned(name))
    }
}

impl<'a> From<&'a [u8]> for filename3<'a> {
    fn from(name: &'a [u8]) -> Self {
        Self(Opaque::borrowed(name))
    }
}

impl AsRef<[u8]> for filename3<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl PartialEq<[u8]> for filename3<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.0.as_ref() == other
    }
}

#[derive(Clone, Debug, Eq, PartialEq, XdrCodec)]
pub struct nfspath3<'a>(pub Opaque<'a>);

impl From<Vec<u8>> for nfspath3<'static> {
    fn from(path: Vec<u8>) -> Self {
        Self(Opaque::owned(path))
    }
}

impl<'a> From<&'a [u8]> for nfspath3<'a> {
    fn from(path: &'a [u8]) -> Self {
        Self(Opaque::borrowed(path))
    }
}

impl AsRef<[u8]> for nfspath3<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

#[derive(Clone, Default, Debug, Eq, PartialEq, XdrCodec)]
pub struct nfstime3 {
    pub seconds: u32,
    pub nseconds: u32,
}

impl TryFrom<std::time::SystemTime> for nfstime3 {
    type Error = std::time::SystemTimeError;

    fn try_from(time: std::time::SystemTime) -> std::result::Result<Self, Self::Error> {
        time.duration_since(std::time::UNIX_EPOCH)
            .map(|duration| Self {
                seconds: u32::try_from(duration.as_secs()).unwrap_or(u32::MAX),
                nseconds: duration.subsec_nanos(),
            })
    }
}

#[derive(Clone, Default, Debug, Eq, PartialEq, XdrCodec)]
pub struct specdata3 {
    pub specdata1: u32,
    pub specdata2: u32,
}

#[derive(Debug, Clone, XdrCodec)]
pub struct fattr3 {
    pub type_: ftype3,
    pub mode: mode3,
    pub nlink: u32,
    pub uid: uid3,
    pub gid: gid3,
    pub size: size3,
    pub used: size3,
    pub rdev: specdata3,
    pub fsid: u64,
    pub fileid: fileid3,
    pub atime: nfstime3,
    pub mtime: nfstime3,
    pub ctime: nfstime3,
}

#[derive(Debug, XdrCodec)]
pub struct wcc_attr {
    pub size: size3,
    pub mtime: nfstime3,
    pub ctime: nfstime3,
}

/// Weak cache consistency data. Decoded to drain the reply stream; this
/// client does not interpret it.
#[derive(Debug, Default, XdrCodec)]
pub struct wcc_data {
    pub before: pre_op_attr,
    pub after: post_op_attr,
}

#[derive(Debug, Clone, Default, XdrCodec)]
pub struct sattr3 {
    pub mode: set_mode3,
    pub uid: set_uid3,
    pub gid: set_gid3,
    pub size: set_size3,
    pub atime: set_atime,
    pub mtime: set_mtime,
}

#[derive(Debug, Clone, Default)]
pub enum set_atime {
    #[default]
    DONT_CHANGE, // = 0
    SET_TO_SERVER_TIME,           // = 1
    SET_TO_CLIENT_TIME(nfstime3), // = 2
}

impl Pack for set_atime {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::SET_TO_CLIENT_TIME(time) => time.packed_size(),
            _ => 0,
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::DONT_CHANGE => 0u32.pack(out)?,
            Self::SET_TO_SERVER_TIME => 1u32.pack(out)?,
            Self::SET_TO_CLIENT_TIME(time) => 2u32.pack(out)? + time.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for set_atime {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (tag, mut read) = u32::unpack(input)?;
        match tag {
            0 => Ok((Self::DONT_CHANGE, read)),
            1 => Ok((Self::SET_TO_SERVER_TIME, read)),
            2 => {
                let (time, n) = nfstime3::unpack(input)?;
                read += n;
                Ok((Self::SET_TO_CLIENT_TIME(time), read))
            }
            _ => Err(crate::xdr::Error::InvalidEnumValue(tag)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum set_mtime {
    #[default]
    DONT_CHANGE, // = 0
    SET_TO_SERVER_TIME,           // = 1
    SET_TO_CLIENT_TIME(nfstime3), // = 2
}

impl Pack for set_mtime {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::SET_TO_CLIENT_TIME(time) => time.packed_size(),
            _ => 0,
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::DONT_CHANGE => 0u32.pack(out)?,
            Self::SET_TO_SERVER_TIME => 1u32.pack(out)?,
            Self::SET_TO_CLIENT_TIME(time) => 2u32.pack(out)? + time.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for set_mtime {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (tag, mut read) = u32::unpack(input)?;
        match tag {
            0 => Ok((Self::DONT_CHANGE, read)),
            1 => Ok((Self::SET_TO_SERVER_TIME, read)),
            2 => {
                let (time, n) = nfstime3::unpack(input)?;
                read += n;
                Ok((Self::SET_TO_CLIENT_TIME(time), read))
            }
            _ => Err(crate::xdr::Error::InvalidEnumValue(tag)),
        }
    }
}

#[derive(Debug, Eq, PartialEq, XdrCodec)]
pub struct diropargs3<'a> {
    pub dir: nfs_fh3,
    pub name: filename3<'a>,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, XdrCodec)]
pub struct cookieverf3(pub [u8; NFS3_COOKIEVERFSIZE]);

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, XdrCodec)]
pub struct createverf3(pub [u8; NFS3_CREATEVERFSIZE]);

#[derive(Copy, Clone, Debug, Eq, PartialEq, XdrCodec)]
#[repr(u32)]
pub enum createmode3 {
    UNCHECKED = 0,
    GUARDED = 1,
    EXCLUSIVE = 2,
}

#[derive(Debug)]
pub enum createhow3 {
    UNCHECKED(sattr3),
    GUARDED(sattr3),
    EXCLUSIVE(createverf3),
}

impl Pack for createhow3 {
    fn packed_size(&self) -> usize {
        4 + match self {
            Self::UNCHECKED(attr) | Self::GUARDED(attr) => attr.packed_size(),
            Self::EXCLUSIVE(verf) => verf.packed_size(),
        }
    }

    fn pack(&self, out: &mut impl Write) -> Result<usize> {
        let len = match self {
            Self::UNCHECKED(attr) => createmode3::UNCHECKED.pack(out)? + attr.pack(out)?,
            Self::GUARDED(attr) => createmode3::GUARDED.pack(out)? + attr.pack(out)?,
            Self::EXCLUSIVE(verf) => createmode3::EXCLUSIVE.pack(out)? + verf.pack(out)?,
        };
        Ok(len)
    }
}

impl Unpack for createhow3 {
    fn unpack(input: &mut impl Read) -> Result<(Self, usize)> {
        let (mode, mut read) = createmode3::unpack(input)?;
        let how = match mode {
            createmode3::UNCHECKED => {
                let (attr, n) = sattr3::unpack(input)?;
                read += n;
                Self::UNCHECKED(attr)
            }
            createmode3::GUARDED => {
                let (attr, n) = sattr3::unpack(input)?;
                read += n;
                Self::GUARDED(attr)
            }
            createmode3::EXCLUSIVE => {
                let (verf, n) = createverf3::unpack(input)?;
                read += n;
                Self::EXCLUSIVE(verf)
            }
        };
        Ok((how, read))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, XdrCodec)]
pub struct GETATTR3args {
    pub object: nfs_fh3,
}

#[derive(Debug, XdrCodec)]
pub struct GETATTR3resok {
    pub obj_attributes: fattr3,
}

pub type GETATTR3res = Nfs3Result<GETATTR3resok, crate::xdr::Void>;

#[derive(Debug, XdrCodec)]
pub struct SETATTR3args {
    pub object: nfs_fh3,
    pub new_attributes: sattr3,
    pub guard: sattrguard3,
}

#[derive(Debug, XdrCodec)]
pub struct SETATTR3resok {
    pub obj_wcc: wcc_data,
}

#[derive(Debug, XdrCodec)]
pub struct SETATTR3resfail {
    pub obj_wcc: wcc_data,
}

pub type SETATTR3res = Nfs3Result<SETATTR3resok, SETATTR3resfail>;

#[derive(Debug, Eq, PartialEq, XdrCodec)]
pub struct LOOKUP3args<'a> {
    pub what: diropargs3<'a>,
}

#[derive(Debug, XdrCodec)]
pub struct LOOKUP3resok {
    pub object: nfs_fh3,
    pub obj_attributes: post_op_attr,
    pub dir_attributes: post_op_attr,
}

#[derive(Debug, Default, XdrCodec)]
pub struct LOOKUP3resfail {
    pub dir_attributes: post_op_attr,
}

pub type LOOKUP3res = Nfs3Result<LOOKUP3resok, LOOKUP3resfail>;

#[derive(Debug, XdrCodec)]
pub struct ACCESS3args {
    pub object: nfs_fh3,
    pub access: u32,
}

#[derive(Debug, XdrCodec)]
pub struct ACCESS3resok {
    pub obj_attributes: post_op_attr,
    pub access: u32,
}

#[derive(Debug, XdrCodec)]
pub struct ACCESS3resfail {
    pub obj_attributes: post_op_attr,
}

pub type ACCESS3res = Nfs3Result<ACCESS3resok, ACCESS3resfail>;

#[derive(Clone, Debug, Eq, PartialEq, XdrCodec)]
pub struct READLINK3args {
    pub symlink: nfs_fh3,
}

#[derive(Debug, XdrCodec)]
pub struct READLINK3resok<'a> {
    pub symlink_attributes: post_op_attr,
    pub data: nfspath3<'a>,
}

#[derive(Debug, Default, XdrCodec)]
pub struct READLINK3resfail {
    pub symlink_attributes: post_op_attr,
}

pub type READLINK3res<'a> = Nfs3Result<READLINK3resok<'a>, READLINK3resfail>;

#[derive(Debug, XdrCodec)]
pub struct CREATE3args<'a> {
    pub where_: diropargs3<'a>,
    pub how: createhow3,
}

#[derive(Debug, XdrCodec)]
pub struct CREATE3resok {
    pub obj: post_op_fh3,
    pub obj_attributes: post_op_attr,
    pub dir_wcc: wcc_data,
}

#[derive(Debug, XdrCodec)]
pub struct CREATE3resfail {
    pub dir_wcc: wcc_data,
}

pub type CREATE3res = Nfs3Result<CREATE3resok, CREATE3resfail>;

#[derive(Debug, XdrCodec)]
pub struct MKDIR3args<'a> {
    pub where_: diropargs3<'a>,
    pub attributes: sattr3,
}

#[derive(Debug, XdrCodec)]
pub struct MKDIR3resok {
    pub obj: post_op_fh3,
    pub obj_attributes: post_op_attr,
    pub dir_wcc: wcc_data,
}

#[derive(Debug, XdrCodec)]
pub struct MKDIR3resfail {
    pub dir_wcc: wcc_data,
}

pub type MKDIR3res = Nfs3Result<MKDIR3resok, MKDIR3resfail>;

#[derive(Debug, Eq, PartialEq, XdrCodec)]
pub struct REMOVE3args<'a> {
    pub object: diropargs3<'a>,
}

#[derive(Debug, XdrCodec)]
pub struct REMOVE3resok {
    pub dir_wcc: wcc_data,
}

#[derive(Debug, XdrCodec)]
pub struct REMOVE3resfail {
    pub dir_wcc: wcc_data,
}

pub type REMOVE3res = Nfs3Result<REMOVE3resok, REMOVE3resfail>;

#[derive(Debug, Eq, PartialEq, XdrCodec)]
pub struct RMDIR3args<'a> {
    pub object: diropargs3<'a>,
}

#[derive(Debug, XdrCodec)]
pub struct RMDIR3resok {
    pub dir_wcc: wcc_data,
}

#[derive(Debug, XdrCodec)]
pub struct RMDIR3resfail {
    pub dir_wcc: wcc_data,
}

pub type RMDIR3res = Nfs3Result<RMDIR3resok, RMDIR3resfail>;

#[derive(Debug, Eq, PartialEq, XdrCodec)]
pub struct RENAME3args<'a, 'b> {
    pub from: diropargs3<'a>,
    pub to: diropargs3<'b>,
}

#[derive(Debug, XdrCodec)]
pub struct RENAME3resok {
    pub fromdir_wcc: wcc_data,
    pub todir_wcc: wcc_data,
}

#[derive(Debug, XdrCodec)]
pub struct RENAME3resfail {
    pub fromdir_wcc: wcc_data,
    pub todir_wcc: wcc_data,
}

pub type RENAME3res = Nfs3Result<RENAME3resok, RENAME3resfail>;

#[derive(Debug, XdrCodec)]
pub struct READDIRPLUS3args {
    pub dir: nfs_fh3,
    pub cookie: cookie3,
    pub cookieverf: cookieverf3,
    pub dircount: count3,
    pub maxcount: count3,
}

#[derive(Debug, XdrCodec)]
pub struct entryplus3<'a> {
    pub fileid: fileid3,
    pub name: filename3<'a>,
    pub cookie: cookie3,
    pub name_attributes: post_op_attr,
    pub name_handle: post_op_fh3,
}

#[derive(Debug, XdrCodec)]
pub struct dirlistplus3<'a> {
    pub entries: List<entryplus3<'a>>,
    pub eof: bool,
}

#[derive(Debug, XdrCodec)]
pub struct READDIRPLUS3resok<'a> {
    pub dir_attributes: post_op_attr,
    pub cookieverf: cookieverf3,
    pub reply: dirlistplus3<'a>,
}

#[derive(Debug, Default, XdrCodec)]
pub struct READDIRPLUS3resfail {
    pub dir_attributes: post_op_attr,
}

pub type READDIRPLUS3res<'a> = Nfs3Result<READDIRPLUS3resok<'a>, READDIRPLUS3resfail>;

#[derive(Clone, Debug, Eq, PartialEq, XdrCodec)]
pub struct FSINFO3args {
    pub fsroot: nfs_fh3,
}

#[derive(Debug, XdrCodec)]
pub struct FSINFO3resok {
    pub obj_attributes: post_op_attr,
    pub rtmax: u32,
    pub rtpref: u32,
    pub rtmult: u32,
    pub wtmax: u32,
    pub wtpref: u32,
    pub wtmult: u32,
    pub dtpref: u32,
    pub maxfilesize: size3,
    pub time_delta: nfstime3,
    pub properties: u32,
}

#[derive(Debug, XdrCodec)]
pub struct FSINFO3resfail {
    pub obj_attributes: post_op_attr,
}

pub type FSINFO3res = Nfs3Result<FSINFO3resok, FSINFO3resfail>;

/// Procedure numbers of NFS program 100003 version 3.
#[derive(Debug, Copy, Clone, PartialEq, Eq, XdrCodec)]
#[repr(u32)]
pub enum NFS_PROGRAM {
    NFSPROC3_NULL = 0,
    NFSPROC3_GETATTR = 1,
    NFSPROC3_SETATTR = 2,
    NFSPROC3_LOOKUP = 3,
    NFSPROC3_ACCESS = 4,
    NFSPROC3_READLINK = 5,
    NFSPROC3_READ = 6,
    NFSPROC3_WRITE = 7,
    NFSPROC3_CREATE = 8,
    NFSPROC3_MKDIR = 9,
    NFSPROC3_SYMLINK = 10,
    NFSPROC3_MKNOD = 11,
    NFSPROC3_REMOVE = 12,
    NFSPROC3_RMDIR = 13,
    NFSPROC3_RENAME = 14,
    NFSPROC3_LINK = 15,
    NFSPROC3_READDIR = 16,
    NFSPROC3_READDIRPLUS = 17,
    NFSPROC3_FSSTAT = 18,
    NFSPROC3_FSINFO = 19,
    NFSPROC3_PATHCONF = 20,
    NFSPROC3_COMMIT = 21,
}
