//! An in-memory NFSv3 server for exercising the client against real wire
//! bytes. Every connection the mock connector hands out is served by the
//! same task loop, which answers portmap, MOUNT3 and NFSv3 calls out of a
//! shared in-memory filesystem.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use sunfs_client::Target;
use sunfs_client::net::Connector;
use sunfs_client::tokio::TokioIo;
use sunfs_types::nfs3::{
    self, ACCESS3args, ACCESS3res, ACCESS3resok, CREATE3args, CREATE3res, CREATE3resok,
    FSINFO3args, FSINFO3res, FSINFO3resok, FSF3_HOMOGENEOUS, FSF3_SYMLINK, GETATTR3args,
    GETATTR3res, GETATTR3resok, LOOKUP3args, LOOKUP3res, LOOKUP3resfail, LOOKUP3resok,
    MKDIR3args, MKDIR3res, MKDIR3resfail, MKDIR3resok, NFS_PROGRAM, Nfs3Option, Nfs3Result,
    READDIRPLUS3args, READDIRPLUS3res, READDIRPLUS3resfail, READDIRPLUS3resok, READLINK3args,
    READLINK3res, READLINK3resfail, READLINK3resok, REMOVE3args, REMOVE3res, REMOVE3resfail,
    REMOVE3resok, RENAME3args, RENAME3res, RENAME3resfail, RENAME3resok, RMDIR3args, RMDIR3res,
    RMDIR3resfail, RMDIR3resok, SETATTR3args, SETATTR3res, SETATTR3resfail, SETATTR3resok,
    cookieverf3, createhow3, dirlistplus3, entryplus3, fattr3, fileid3, ftype3, mode3, nfs_fh3,
    nfsstat3, nfstime3, specdata3, wcc_data,
};
use sunfs_types::rpc::{
    accept_stat_data, accepted_reply, call_body, fragment_header, msg_body, opaque_auth,
    reply_body, rpc_msg,
};
use sunfs_types::xdr::{BoundedList, Opaque, Pack, Unpack, Void};
use sunfs_types::{mount, portmap};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

const MOUNT_PORT: u32 = 1048;
const NFS_PORT: u32 = 2049;
const COOKIE_VERF: cookieverf3 = cookieverf3([7; 8]);

const MODE_TYPE_DIR: mode3 = 0o040_000;
const MODE_TYPE_REG: mode3 = 0o100_000;
const MODE_TYPE_SYMLINK: mode3 = 0o120_000;

#[derive(Debug)]
enum NodeKind {
    File(Vec<u8>),
    Dir(Vec<fileid3>),
    Symlink(Vec<u8>),
}

#[derive(Debug)]
struct Node {
    name: Vec<u8>,
    parent: fileid3,
    mode: mode3,
    uid: u32,
    gid: u32,
    kind: NodeKind,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub total: u64,
    pub readdirplus: u64,
}

#[derive(Debug)]
pub struct Fs {
    nodes: HashMap<fileid3, Node>,
    root: fileid3,
    next_id: fileid3,
    pub counters: Counters,
}

impl Fs {
    fn new() -> Self {
        let root = 1;
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                name: b"/".to_vec(),
                parent: root,
                mode: 0o755,
                uid: 0,
                gid: 0,
                kind: NodeKind::Dir(Vec::new()),
            },
        );
        Self {
            nodes,
            root,
            next_id: root + 1,
            counters: Counters::default(),
        }
    }

    fn insert(&mut self, parent: fileid3, name: &[u8], mode: mode3, kind: NodeKind) -> fileid3 {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                name: name.to_vec(),
                parent,
                mode,
                uid: 1000,
                gid: 1000,
                kind,
            },
        );
        match &mut self.nodes.get_mut(&parent).expect("parent exists").kind {
            NodeKind::Dir(children) => children.push(id),
            _ => panic!("parent is not a directory"),
        }
        id
    }

    fn unlink(&mut self, id: fileid3) {
        let parent = self.nodes[&id].parent;
        if let Some(node) = self.nodes.get_mut(&parent) {
            if let NodeKind::Dir(children) = &mut node.kind {
                children.retain(|child| *child != id);
            }
        }
        self.nodes.remove(&id);
    }

    fn child_by_name(&self, dir: fileid3, name: &[u8]) -> Option<fileid3> {
        let node = self.nodes.get(&dir)?;
        let NodeKind::Dir(children) = &node.kind else {
            return None;
        };
        children
            .iter()
            .copied()
            .find(|child| self.nodes[child].name == name)
    }

    /// Resolves a slash-separated path literally, no symlink following.
    fn path_id(&self, path: &str) -> Option<fileid3> {
        let mut current = self.root;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = self.child_by_name(current, component.as_bytes())?;
        }
        Some(current)
    }

    fn attr(&self, id: fileid3) -> fattr3 {
        let node = &self.nodes[&id];
        let (type_, type_bits, size, nlink) = match &node.kind {
            NodeKind::File(content) => (ftype3::NF3REG, MODE_TYPE_REG, content.len() as u64, 1),
            NodeKind::Dir(_) => (ftype3::NF3DIR, MODE_TYPE_DIR, 0, 2),
            NodeKind::Symlink(target) => {
                (ftype3::NF3LNK, MODE_TYPE_SYMLINK, target.len() as u64, 1)
            }
        };
        fattr3 {
            type_,
            mode: type_bits | node.mode,
            nlink,
            uid: node.uid,
            gid: node.gid,
            size,
            used: size,
            rdev: specdata3::default(),
            fsid: 1,
            fileid: id,
            atime: now(),
            mtime: now(),
            ctime: now(),
        }
    }

    fn fh(id: fileid3) -> nfs_fh3 {
        nfs_fh3 {
            data: Opaque::owned(id.to_be_bytes().to_vec()),
        }
    }

    fn id_of(fh: &nfs_fh3) -> Option<fileid3> {
        let bytes: [u8; 8] = fh.data.as_ref().try_into().ok()?;
        Some(fileid3::from_be_bytes(bytes))
    }

    /// The full listing of a directory: `.` and `..` first, then children
    /// in insertion order.
    fn listing(&self, dir: fileid3) -> Option<Vec<(Vec<u8>, fileid3)>> {
        let node = self.nodes.get(&dir)?;
        let NodeKind::Dir(children) = &node.kind else {
            return None;
        };
        let mut out = vec![(b".".to_vec(), dir), (b"..".to_vec(), node.parent)];
        for child in children {
            out.push((self.nodes[child].name.clone(), *child));
        }
        Some(out)
    }
}

fn now() -> nfstime3 {
    nfstime3::try_from(SystemTime::now()).unwrap_or_default()
}

/// Hands out in-memory duplex connections, each served by the same mock
/// server state regardless of the port dialed.
pub struct MockConnector {
    fs: Arc<Mutex<Fs>>,
}

impl Connector for MockConnector {
    type Connection = TokioIo<DuplexStream>;

    async fn connect(&self, _host: &str, _port: u16) -> std::io::Result<Self::Connection> {
        let (client_io, server_io) = duplex(1024 * 1024);
        let fs = self.fs.clone();
        tokio::spawn(async move {
            if let Err(err) = serve(server_io, &fs).await {
                eprintln!("mock server error: {err}");
            }
        });
        Ok(TokioIo::new(client_io))
    }

    async fn connect_with_port(
        &self,
        host: &str,
        port: u16,
        _local_port: u16,
    ) -> std::io::Result<Self::Connection> {
        self.connect(host, port).await
    }
}

async fn serve(mut io: DuplexStream, fs: &Mutex<Fs>) -> anyhow::Result<()> {
    loop {
        let mut header = [0u8; 4];
        match io.read_exact(&mut header).await {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let header = fragment_header::from(header);
        anyhow::ensure!(header.is_last(), "multi-fragment calls not expected");

        let mut record = vec![0u8; header.fragment_length() as usize];
        io.read_exact(&mut record).await?;

        let mut cursor = Cursor::new(record);
        let (msg, _) = rpc_msg::unpack(&mut cursor)?;
        let msg_body::CALL(call) = msg.body else {
            anyhow::bail!("expected CALL");
        };

        let reply = dispatch(fs, &call, &mut cursor)?;
        let frame = encode_reply(msg.xid, reply);
        io.write_all(&frame).await?;
    }
}

enum Reply {
    Success(Vec<u8>),
    Accept(accept_stat_data),
}

fn dispatch(
    fs: &Mutex<Fs>,
    call: &call_body<'_>,
    args: &mut Cursor<Vec<u8>>,
) -> anyhow::Result<Reply> {
    match call.prog {
        portmap::PROGRAM => dispatch_portmap(call.proc, args),
        mount::PROGRAM => dispatch_mount(fs, call.proc, args),
        nfs3::PROGRAM => dispatch_nfs(fs, call.proc, args),
        _ => Ok(Reply::Accept(accept_stat_data::PROG_UNAVAIL)),
    }
}

fn dispatch_portmap(proc: u32, args: &mut Cursor<Vec<u8>>) -> anyhow::Result<Reply> {
    match proc {
        x if x == portmap::PMAP_PROG::PMAPPROC_NULL as u32 => Ok(Reply::Success(packed(&Void)?)),
        x if x == portmap::PMAP_PROG::PMAPPROC_GETPORT as u32 => {
            let (mapping, _) = portmap::mapping::unpack(args)?;
            let port = match mapping.prog {
                mount::PROGRAM => MOUNT_PORT,
                nfs3::PROGRAM => NFS_PORT,
                _ => 0,
            };
            Ok(Reply::Success(packed(&port)?))
        }
        _ => Ok(Reply::Accept(accept_stat_data::PROC_UNAVAIL)),
    }
}

fn dispatch_mount(
    fs: &Mutex<Fs>,
    proc: u32,
    args: &mut Cursor<Vec<u8>>,
) -> anyhow::Result<Reply> {
    match proc {
        x if x == mount::MOUNT_PROGRAM::MOUNTPROC3_NULL as u32 => {
            Ok(Reply::Success(packed(&Void)?))
        }
        x if x == mount::MOUNT_PROGRAM::MOUNTPROC3_MNT as u32 => {
            let (_dirpath, _) = mount::dirpath::unpack(args)?;
            let root = fs.lock().unwrap().root;
            let res = mount::mountres3::Ok(mount::mountres3_ok {
                fhandle: mount::fhandle3(Opaque::owned(root.to_be_bytes().to_vec())),
                auth_flavors: vec![0],
            });
            Ok(Reply::Success(packed(&res)?))
        }
        x if x == mount::MOUNT_PROGRAM::MOUNTPROC3_UMNT as u32 => {
            let (_dirpath, _) = mount::dirpath::unpack(args)?;
            Ok(Reply::Success(packed(&Void)?))
        }
        _ => Ok(Reply::Accept(accept_stat_data::PROC_UNAVAIL)),
    }
}

fn dispatch_nfs(fs: &Mutex<Fs>, proc: u32, args: &mut Cursor<Vec<u8>>) -> anyhow::Result<Reply> {
    let mut fs = fs.lock().unwrap();
    fs.counters.total += 1;

    let body = match proc {
        x if x == NFS_PROGRAM::NFSPROC3_NULL as u32 => packed(&Void)?,
        x if x == NFS_PROGRAM::NFSPROC3_GETATTR as u32 => {
            let (args, _) = GETATTR3args::unpack(args)?;
            packed(&handle_getattr(&fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_SETATTR as u32 => {
            let (args, _) = SETATTR3args::unpack(args)?;
            packed(&handle_setattr(&mut fs, args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_LOOKUP as u32 => {
            let (args, _) = LOOKUP3args::unpack(args)?;
            packed(&handle_lookup(&fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_ACCESS as u32 => {
            let (args, _) = ACCESS3args::unpack(args)?;
            packed(&handle_access(&fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_READLINK as u32 => {
            let (args, _) = READLINK3args::unpack(args)?;
            packed(&handle_readlink(&fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_CREATE as u32 => {
            let (args, _) = CREATE3args::unpack(args)?;
            packed(&handle_create(&mut fs, args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_MKDIR as u32 => {
            let (args, _) = MKDIR3args::unpack(args)?;
            packed(&handle_mkdir(&mut fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_REMOVE as u32 => {
            let (args, _) = REMOVE3args::unpack(args)?;
            packed(&handle_remove(&mut fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_RMDIR as u32 => {
            let (args, _) = RMDIR3args::unpack(args)?;
            packed(&handle_rmdir(&mut fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_RENAME as u32 => {
            let (args, _) = RENAME3args::unpack(args)?;
            packed(&handle_rename(&mut fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_READDIRPLUS as u32 => {
            fs.counters.readdirplus += 1;
            let (args, _) = READDIRPLUS3args::unpack(args)?;
            packed(&handle_readdirplus(&fs, &args))?
        }
        x if x == NFS_PROGRAM::NFSPROC3_FSINFO as u32 => {
            let (args, _) = FSINFO3args::unpack(args)?;
            packed(&handle_fsinfo(&fs, &args))?
        }
        _ => return Ok(Reply::Accept(accept_stat_data::PROC_UNAVAIL)),
    };
    Ok(Reply::Success(body))
}

fn handle_getattr(fs: &Fs, args: &GETATTR3args) -> GETATTR3res {
    match Fs::id_of(&args.object).filter(|id| fs.nodes.contains_key(id)) {
        Some(id) => Nfs3Result::Ok(GETATTR3resok {
            obj_attributes: fs.attr(id),
        }),
        None => Nfs3Result::Err((nfsstat3::NFS3ERR_STALE, Void)),
    }
}

fn handle_setattr(fs: &mut Fs, args: SETATTR3args) -> SETATTR3res {
    let Some(id) = Fs::id_of(&args.object).filter(|id| fs.nodes.contains_key(id)) else {
        return Nfs3Result::Err((
            nfsstat3::NFS3ERR_STALE,
            SETATTR3resfail {
                obj_wcc: wcc_data::default(),
            },
        ));
    };

    let new = args.new_attributes;
    let node = fs.nodes.get_mut(&id).expect("checked above");
    if let Nfs3Option::Some(mode) = new.mode {
        node.mode = mode & 0o7777;
    }
    if let Nfs3Option::Some(uid) = new.uid {
        node.uid = uid;
    }
    if let Nfs3Option::Some(gid) = new.gid {
        node.gid = gid;
    }
    if let Nfs3Option::Some(size) = new.size {
        if let NodeKind::File(content) = &mut node.kind {
            content.resize(size as usize, 0);
        }
    }

    Nfs3Result::Ok(SETATTR3resok {
        obj_wcc: wcc_data::default(),
    })
}

fn handle_lookup(fs: &Fs, args: &LOOKUP3args<'_>) -> LOOKUP3res {
    let fail = |status| Nfs3Result::Err((status, LOOKUP3resfail::default()));

    let Some(dir) = Fs::id_of(&args.what.dir).filter(|id| fs.nodes.contains_key(id)) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };
    let dir_node = &fs.nodes[&dir];
    let NodeKind::Dir(_) = dir_node.kind else {
        return fail(nfsstat3::NFS3ERR_NOTDIR);
    };

    let name = args.what.name.as_ref();
    let object = if name == b".".as_slice() {
        Some(dir)
    } else if name == b"..".as_slice() {
        Some(dir_node.parent)
    } else {
        fs.child_by_name(dir, name)
    };

    match object {
        Some(id) => Nfs3Result::Ok(LOOKUP3resok {
            object: Fs::fh(id),
            obj_attributes: Nfs3Option::Some(fs.attr(id)),
            dir_attributes: Nfs3Option::Some(fs.attr(dir)),
        }),
        None => fail(nfsstat3::NFS3ERR_NOENT),
    }
}

fn handle_access(fs: &Fs, args: &ACCESS3args) -> ACCESS3res {
    match Fs::id_of(&args.object).filter(|id| fs.nodes.contains_key(id)) {
        Some(id) => Nfs3Result::Ok(ACCESS3resok {
            obj_attributes: Nfs3Option::Some(fs.attr(id)),
            access: args.access & 0x3F,
        }),
        None => Nfs3Result::Err((
            nfsstat3::NFS3ERR_STALE,
            nfs3::ACCESS3resfail {
                obj_attributes: Nfs3Option::None,
            },
        )),
    }
}

fn handle_readlink(fs: &Fs, args: &READLINK3args) -> READLINK3res<'static> {
    let Some(id) = Fs::id_of(&args.symlink).filter(|id| fs.nodes.contains_key(id)) else {
        return Nfs3Result::Err((nfsstat3::NFS3ERR_STALE, READLINK3resfail::default()));
    };
    match &fs.nodes[&id].kind {
        NodeKind::Symlink(target) => Nfs3Result::Ok(READLINK3resok {
            symlink_attributes: Nfs3Option::Some(fs.attr(id)),
            data: target.clone().into(),
        }),
        _ => Nfs3Result::Err((nfsstat3::NFS3ERR_INVAL, READLINK3resfail::default())),
    }
}

fn handle_create(fs: &mut Fs, args: CREATE3args<'_>) -> CREATE3res {
    let fail = |status| {
        Nfs3Result::Err((
            status,
            nfs3::CREATE3resfail {
                dir_wcc: wcc_data::default(),
            },
        ))
    };

    let Some(dir) = Fs::id_of(&args.where_.dir).filter(|id| fs.nodes.contains_key(id)) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };
    if !matches!(fs.nodes[&dir].kind, NodeKind::Dir(_)) {
        return fail(nfsstat3::NFS3ERR_NOTDIR);
    }

    let attributes = match args.how {
        createhow3::UNCHECKED(attr) | createhow3::GUARDED(attr) => attr,
        createhow3::EXCLUSIVE(_) => return fail(nfsstat3::NFS3ERR_NOTSUPP),
    };
    let mode = match attributes.mode {
        Nfs3Option::Some(mode) => mode & 0o7777,
        Nfs3Option::None => 0o644,
    };

    let name = args.where_.name.as_ref();
    let id = match fs.child_by_name(dir, name) {
        Some(existing) => {
            if matches!(fs.nodes[&existing].kind, NodeKind::Dir(_)) {
                return fail(nfsstat3::NFS3ERR_EXIST);
            }
            existing
        }
        None => fs.insert(dir, name, mode, NodeKind::File(Vec::new())),
    };

    if let Nfs3Option::Some(size) = attributes.size {
        if let NodeKind::File(content) = &mut fs.nodes.get_mut(&id).expect("just created").kind {
            content.resize(size as usize, 0);
        }
    }

    Nfs3Result::Ok(CREATE3resok {
        obj: Nfs3Option::Some(Fs::fh(id)),
        obj_attributes: Nfs3Option::Some(fs.attr(id)),
        dir_wcc: wcc_data::default(),
    })
}

fn handle_mkdir(fs: &mut Fs, args: &MKDIR3args<'_>) -> MKDIR3res {
    let fail = |status| {
        Nfs3Result::Err((
            status,
            MKDIR3resfail {
                dir_wcc: wcc_data::default(),
            },
        ))
    };

    let Some(dir) = Fs::id_of(&args.where_.dir).filter(|id| fs.nodes.contains_key(id)) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };
    if !matches!(fs.nodes[&dir].kind, NodeKind::Dir(_)) {
        return fail(nfsstat3::NFS3ERR_NOTDIR);
    }

    let name = args.where_.name.as_ref();
    if fs.child_by_name(dir, name).is_some() {
        return fail(nfsstat3::NFS3ERR_EXIST);
    }

    let mode = match args.attributes.mode {
        Nfs3Option::Some(mode) => mode & 0o7777,
        Nfs3Option::None => 0o755,
    };
    let id = fs.insert(dir, name, mode, NodeKind::Dir(Vec::new()));

    Nfs3Result::Ok(MKDIR3resok {
        obj: Nfs3Option::Some(Fs::fh(id)),
        obj_attributes: Nfs3Option::Some(fs.attr(id)),
        dir_wcc: wcc_data::default(),
    })
}

fn handle_remove(fs: &mut Fs, args: &REMOVE3args<'_>) -> REMOVE3res {
    let fail = |status| {
        Nfs3Result::Err((
            status,
            REMOVE3resfail {
                dir_wcc: wcc_data::default(),
            },
        ))
    };

    let Some(dir) = Fs::id_of(&args.object.dir).filter(|id| fs.nodes.contains_key(id)) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };
    let Some(id) = fs.child_by_name(dir, args.object.name.as_ref()) else {
        return fail(nfsstat3::NFS3ERR_NOENT);
    };
    if matches!(fs.nodes[&id].kind, NodeKind::Dir(_)) {
        return fail(nfsstat3::NFS3ERR_ISDIR);
    }

    fs.unlink(id);
    Nfs3Result::Ok(REMOVE3resok {
        dir_wcc: wcc_data::default(),
    })
}

fn handle_rmdir(fs: &mut Fs, args: &RMDIR3args<'_>) -> RMDIR3res {
    let fail = |status| {
        Nfs3Result::Err((
            status,
            RMDIR3resfail {
                dir_wcc: wcc_data::default(),
            },
        ))
    };

    let Some(dir) = Fs::id_of(&args.object.dir).filter(|id| fs.nodes.contains_key(id)) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };
    let Some(id) = fs.child_by_name(dir, args.object.name.as_ref()) else {
        return fail(nfsstat3::NFS3ERR_NOENT);
    };
    match &fs.nodes[&id].kind {
        NodeKind::Dir(children) if children.is_empty() => {}
        NodeKind::Dir(_) => return fail(nfsstat3::NFS3ERR_NOTEMPTY),
        _ => return fail(nfsstat3::NFS3ERR_NOTDIR),
    }

    fs.unlink(id);
    Nfs3Result::Ok(RMDIR3resok {
        dir_wcc: wcc_data::default(),
    })
}

fn handle_rename(fs: &mut Fs, args: &RENAME3args<'_, '_>) -> RENAME3res {
    let fail = |status| {
        Nfs3Result::Err((
            status,
            RENAME3resfail {
                fromdir_wcc: wcc_data::default(),
                todir_wcc: wcc_data::default(),
            },
        ))
    };

    let from_dir = Fs::id_of(&args.from.dir).filter(|id| fs.nodes.contains_key(id));
    let to_dir = Fs::id_of(&args.to.dir).filter(|id| fs.nodes.contains_key(id));
    let (Some(from_dir), Some(to_dir)) = (from_dir, to_dir) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };

    let Some(src) = fs.child_by_name(from_dir, args.from.name.as_ref()) else {
        return fail(nfsstat3::NFS3ERR_NOENT);
    };

    if let Some(dest) = fs.child_by_name(to_dir, args.to.name.as_ref()) {
        match &fs.nodes[&dest].kind {
            NodeKind::Dir(children) if !children.is_empty() => {
                return fail(nfsstat3::NFS3ERR_NOTEMPTY);
            }
            _ => fs.unlink(dest),
        }
    }

    // Relink under the destination directory.
    if let NodeKind::Dir(children) = &mut fs.nodes.get_mut(&from_dir).expect("checked").kind {
        children.retain(|child| *child != src);
    }
    let node = fs.nodes.get_mut(&src).expect("source exists");
    node.parent = to_dir;
    node.name = args.to.name.as_ref().to_vec();
    if let NodeKind::Dir(children) = &mut fs.nodes.get_mut(&to_dir).expect("checked").kind {
        children.push(src);
    }

    Nfs3Result::Ok(RENAME3resok {
        fromdir_wcc: wcc_data::default(),
        todir_wcc: wcc_data::default(),
    })
}

fn handle_readdirplus(fs: &Fs, args: &READDIRPLUS3args) -> READDIRPLUS3res<'static> {
    let fail = |status| Nfs3Result::Err((status, READDIRPLUS3resfail::default()));

    let Some(dir) = Fs::id_of(&args.dir).filter(|id| fs.nodes.contains_key(id)) else {
        return fail(nfsstat3::NFS3ERR_STALE);
    };
    let Some(listing) = fs.listing(dir) else {
        return fail(nfsstat3::NFS3ERR_NOTDIR);
    };

    if args.cookie != 0 && args.cookieverf != COOKIE_VERF {
        return fail(nfsstat3::NFS3ERR_BAD_COOKIE);
    }
    let start = args.cookie as usize;
    if start > listing.len() {
        return fail(nfsstat3::NFS3ERR_BAD_COOKIE);
    }

    let mut bounded = BoundedList::new(args.maxcount as usize);
    let mut eof = true;
    let mut pushed = 0usize;
    for (index, (name, id)) in listing.iter().enumerate().skip(start) {
        let entry = entryplus3 {
            fileid: *id,
            name: name.clone().into(),
            cookie: (index + 1) as u64,
            name_attributes: Nfs3Option::Some(fs.attr(*id)),
            name_handle: Nfs3Option::Some(Fs::fh(*id)),
        };
        if bounded.try_push(entry).is_err() {
            eof = false;
            break;
        }
        pushed += 1;
    }

    if pushed == 0 && !eof {
        return fail(nfsstat3::NFS3ERR_TOOSMALL);
    }

    Nfs3Result::Ok(READDIRPLUS3resok {
        dir_attributes: Nfs3Option::Some(fs.attr(dir)),
        cookieverf: COOKIE_VERF,
        reply: dirlistplus3 {
            entries: bounded.into_inner(),
            eof,
        },
    })
}

fn handle_fsinfo(fs: &Fs, args: &FSINFO3args) -> FSINFO3res {
    let Some(id) = Fs::id_of(&args.fsroot).filter(|id| fs.nodes.contains_key(id)) else {
        return Nfs3Result::Err((
            nfsstat3::NFS3ERR_STALE,
            nfs3::FSINFO3resfail {
                obj_attributes: Nfs3Option::None,
            },
        ));
    };
    Nfs3Result::Ok(FSINFO3resok {
        obj_attributes: Nfs3Option::Some(fs.attr(id)),
        rtmax: 512 * 1024,
        rtpref: 128 * 1024,
        rtmult: 4096,
        wtmax: 512 * 1024,
        wtpref: 128 * 1024,
        wtmult: 4096,
        dtpref: 4096,
        maxfilesize: u64::MAX / 2,
        time_delta: nfstime3 {
            seconds: 0,
            nseconds: 1,
        },
        properties: FSF3_SYMLINK | FSF3_HOMOGENEOUS,
    })
}

fn packed(value: &impl Pack) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(value.packed_size());
    value.pack(&mut buf)?;
    Ok(buf)
}

fn encode_reply(xid: u32, reply: Reply) -> Vec<u8> {
    let (reply_data, body) = match reply {
        Reply::Success(body) => (accept_stat_data::SUCCESS, body),
        Reply::Accept(stat) => (stat, Vec::new()),
    };
    let msg = rpc_msg {
        xid,
        body: msg_body::REPLY(reply_body::MSG_ACCEPTED(accepted_reply {
            verf: opaque_auth::default(),
            reply_data,
        })),
    };

    let len = msg.packed_size() + body.len();
    let mut frame = Vec::with_capacity(len + 4);
    fragment_header::new(len as u32, true)
        .pack(&mut frame)
        .expect("pack into Vec");
    msg.pack(&mut frame).expect("pack into Vec");
    frame.extend_from_slice(&body);
    frame
}

/// A connected [`Target`] plus direct access to the server-side filesystem
/// for seeding state and inspecting call counts.
pub struct TestContext {
    target: Target<TokioIo<DuplexStream>>,
    fs: Arc<Mutex<Fs>>,
}

impl TestContext {
    pub async fn setup() -> anyhow::Result<Self> {
        init_logging();
        let fs = Arc::new(Mutex::new(Fs::new()));
        let connector = MockConnector { fs: fs.clone() };
        let target =
            Target::connect(connector, "testhost", "/export", opaque_auth::default()).await?;
        Ok(Self { target, fs })
    }

    /// Creates a file directly in the server filesystem.
    pub fn seed_file(&self, path: &str, content: &[u8]) {
        let (dir, name) = path.rsplit_once('/').expect("absolute path");
        let mut fs = self.fs.lock().unwrap();
        let parent = fs.path_id(dir).expect("parent exists");
        fs.insert(parent, name.as_bytes(), 0o644, NodeKind::File(content.to_vec()));
    }

    /// Creates a directory directly in the server filesystem.
    pub fn seed_dir(&self, path: &str) {
        let (dir, name) = path.rsplit_once('/').expect("absolute path");
        let mut fs = self.fs.lock().unwrap();
        let parent = fs.path_id(dir).expect("parent exists");
        fs.insert(parent, name.as_bytes(), 0o755, NodeKind::Dir(Vec::new()));
    }

    /// Creates a symlink directly in the server filesystem.
    pub fn seed_symlink(&self, path: &str, link_target: &str) {
        let (dir, name) = path.rsplit_once('/').expect("absolute path");
        let mut fs = self.fs.lock().unwrap();
        let parent = fs.path_id(dir).expect("parent exists");
        fs.insert(
            parent,
            name.as_bytes(),
            0o777,
            NodeKind::Symlink(link_target.as_bytes().to_vec()),
        );
    }

    /// Whether a path (resolved literally, no symlink following) exists on
    /// the server.
    pub fn server_has(&self, path: &str) -> bool {
        self.fs.lock().unwrap().path_id(path).is_some()
    }

    /// A connector dialing fresh channels into the same server state, for
    /// tests that drive the protocol clients directly.
    pub fn connector(&self) -> MockConnector {
        MockConnector {
            fs: self.fs.clone(),
        }
    }

    pub fn nfs_calls(&self) -> u64 {
        self.fs.lock().unwrap().counters.total
    }

    pub fn readdirplus_calls(&self) -> u64 {
        self.fs.lock().unwrap().counters.readdirplus
    }
}

impl Deref for TestContext {
    type Target = Target<TokioIo<DuplexStream>>;

    fn deref(&self) -> &Self::Target {
        &self.target
    }
}

impl DerefMut for TestContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.target
    }
}

static LOGGING: std::sync::Once = std::sync::Once::new();

pub fn init_logging() {
    LOGGING.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    });
}
