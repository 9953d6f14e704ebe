use core::fmt;
use core::mem::size_of;

use crate::common::name::NameMatch;
use crate::error::{DevTreeError, Result};
use crate::host::{NulStrOps, StrOps};
use crate::priv_util::SliceRead;
use crate::spec::{fdt_header, FdtTok, FDT_CELL_SIZE, FDT_MAGIC, MAX_NODE_DEPTH};

use super::iters::DevTreeReserveEntryIter;
use super::parse::{advance, next_token, prop_size, read_node_name};
use super::DevTreeNode;

/// Name reported for the root node, whose encoded name is empty.
pub const ROOT_NODE_NAME: &str = "/";

macro_rules! get_be32_field {
    ( $f:ident, $s:ident , $buf:expr ) => {
        $buf.read_be_u32(offset_of!($s, $f))
    };
}

/// A parseable Flattened Device Tree.
///
/// This is a view over a caller owned buffer. It is created once by validating the header and
/// is never modified afterwards. Nodes and properties found through it borrow from the buffer.
///
/// This parser was written according to the v0.3 specification provided at
/// https://www.devicetree.org/
#[derive(Copy, Clone)]
pub struct DevTree<'dt> {
    /// The blob, cut down to the header's `totalsize`.
    buf: &'dt [u8],
    ops: &'dt dyn StrOps,
    off_dt_struct: usize,
    end_dt_struct: usize,
    off_dt_strings: usize,
    end_dt_strings: usize,
}

impl<'dt> PartialEq for DevTree<'dt> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.buf, other.buf)
    }
}

impl<'dt> fmt::Debug for DevTree<'dt> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevTree")
            .field("totalsize", &self.buf.len())
            .field("version", &self.version())
            .field("off_dt_struct", &self.off_dt_struct)
            .field("off_dt_strings", &self.off_dt_strings)
            .finish()
    }
}

/// Returns the end of a block given its start and optional declared size, clamped to `limit`.
fn block_end(start: usize, size: u32, limit: usize) -> usize {
    match size {
        0 => limit,
        size => start.saturating_add(size as usize).min(limit),
    }
}

impl<'dt> DevTree<'dt> {
    pub const MIN_HEADER_SIZE: usize = size_of::<fdt_header>();

    /// Verify the magic header of a Device Tree buffer
    #[inline]
    pub fn verify_magic(buf: &[u8]) -> Result<()> {
        if get_be32_field!(magic, fdt_header, buf)? != FDT_MAGIC {
            Err(DevTreeError::InvalidMagicNumber)
        } else {
            Ok(())
        }
    }

    /// Using the provided byte slice this method will:
    ///
    /// 1. Verify that the slice begins with the magic Device Tree header
    /// 2. Return the reported `totalsize` field of the Device Tree header
    ///
    /// When parsing a FDT, it's possible that the actual size of the device tree may be unknown.
    /// For that reason, this method can be called before constructing the [`DevTree`]. For this
    /// read to take place, the provided buffer must be at least [`Self::MIN_HEADER_SIZE`] long.
    #[inline]
    pub fn read_totalsize(buf: &[u8]) -> Result<usize> {
        if buf.len() < Self::MIN_HEADER_SIZE {
            return Err(DevTreeError::InvalidParameter("Buffer is smaller than an FDT header"));
        }
        Self::verify_magic(buf)?;
        Ok(get_be32_field!(totalsize, fdt_header, buf)? as usize)
    }

    /// Construct the parseable DevTree object from the provided byte slice, comparing names with
    /// [`NulStrOps`].
    ///
    /// The buffer may be longer than the device tree. It may not be shorter than the header's
    /// `totalsize`.
    #[inline]
    pub fn new(buf: &'dt [u8]) -> Result<Self> {
        Self::with_str_ops(buf, &NulStrOps)
    }

    /// Construct the parseable DevTree object, measuring and comparing names through `ops`.
    pub fn with_str_ops(buf: &'dt [u8], ops: &'dt dyn StrOps) -> Result<Self> {
        let totalsize = Self::read_totalsize(buf).map_err(|e| {
            warn!("rejecting device tree: {}", e);
            e
        })?;
        if totalsize < Self::MIN_HEADER_SIZE {
            return Err(DevTreeError::ParseError);
        }
        let buf = buf.get(..totalsize).ok_or_else(|| {
            warn!(
                "device tree totalsize {:#x} exceeds the {:#x} byte buffer",
                totalsize,
                buf.len()
            );
            DevTreeError::InvalidOffset
        })?;

        let off_dt_struct = get_be32_field!(off_dt_struct, fdt_header, buf)? as usize;
        let off_dt_strings = get_be32_field!(off_dt_strings, fdt_header, buf)? as usize;
        if off_dt_struct >= totalsize
            || off_dt_strings > totalsize
            || off_dt_struct % FDT_CELL_SIZE != 0
        {
            warn!(
                "device tree blocks out of bounds: struct {:#x}, strings {:#x}, totalsize {:#x}",
                off_dt_struct, off_dt_strings, totalsize
            );
            return Err(DevTreeError::ParseError);
        }

        let size_dt_struct = get_be32_field!(size_dt_struct, fdt_header, buf)?;
        let size_dt_strings = get_be32_field!(size_dt_strings, fdt_header, buf)?;
        let ret = Self {
            buf,
            ops,
            off_dt_struct,
            end_dt_struct: block_end(off_dt_struct, size_dt_struct, totalsize),
            off_dt_strings,
            end_dt_strings: block_end(off_dt_strings, size_dt_strings, totalsize),
        };

        debug!(
            "device tree v{}: totalsize {:#x}, struct {:#x}..{:#x}, strings {:#x}..{:#x}",
            ret.version(),
            totalsize,
            ret.off_dt_struct,
            ret.end_dt_struct,
            ret.off_dt_strings,
            ret.end_dt_strings
        );
        Ok(ret)
    }

    fn header_field(&self, offset: usize) -> u32 {
        // The constructor guarantees the whole header lies inside `buf`.
        self.buf.read_be_u32(offset).unwrap_or_default()
    }

    /// Returns the totalsize field of the Device Tree. This is the number of bytes of the device
    /// tree structure.
    #[inline]
    #[must_use]
    pub fn totalsize(&self) -> usize {
        self.buf.len()
    }

    /// Returns the rsvmap offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_mem_rsvmap(&self) -> usize {
        self.header_field(offset_of!(fdt_header, off_mem_rsvmap)) as usize
    }

    /// Returns the dt_struct offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_struct(&self) -> usize {
        self.off_dt_struct
    }

    /// Returns the dt_strings offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_strings(&self) -> usize {
        self.off_dt_strings
    }

    /// Returns the magic field of the Device Tree
    #[inline]
    #[must_use]
    pub fn magic(&self) -> u32 {
        self.header_field(offset_of!(fdt_header, magic))
    }

    /// Returns the version field of the Device Tree
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.header_field(offset_of!(fdt_header, version))
    }

    /// Returns the boot_cpuid_phys field of the Device Tree
    #[inline]
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.header_field(offset_of!(fdt_header, boot_cpuid_phys))
    }

    /// Returns the last_comp_version field of the Device Tree
    #[inline]
    #[must_use]
    pub fn last_comp_version(&self) -> u32 {
        self.header_field(offset_of!(fdt_header, last_comp_version))
    }

    /// Returns the size_dt_strings field of the Device Tree
    #[inline]
    #[must_use]
    pub fn size_dt_strings(&self) -> u32 {
        self.header_field(offset_of!(fdt_header, size_dt_strings))
    }

    /// Returns the size_dt_struct field of the Device Tree
    #[inline]
    #[must_use]
    pub fn size_dt_struct(&self) -> u32 {
        self.header_field(offset_of!(fdt_header, size_dt_struct))
    }

    /// Returns the device tree bytes, `totalsize` long.
    #[inline]
    pub fn buf(&self) -> &'dt [u8] {
        self.buf
    }

    /// Returns the string primitives this tree was built with.
    #[inline]
    pub fn str_ops(&self) -> &'dt dyn StrOps {
        self.ops
    }

    /// Returns the device tree bytes up to the end of the structure block.
    ///
    /// Offsets stay relative to the start of the blob, but no walk can read past the structure
    /// block into whatever follows it.
    pub(crate) fn structs(&self) -> &'dt [u8] {
        &self.buf[..self.end_dt_struct]
    }

    /// Returns the strings block. Property name offsets are relative to its start.
    pub(crate) fn strings(&self) -> &'dt [u8] {
        &self.buf[self.off_dt_strings..self.end_dt_strings]
    }

    /// Returns an iterator over the Dev Tree "5.3 Memory Reservation Blocks"
    #[must_use]
    pub fn reserved_entries(&self) -> DevTreeReserveEntryIter<'_, 'dt> {
        DevTreeReserveEntryIter::new(self)
    }

    /// Returns the root [`DevTreeNode`] object of the device tree (if it exists).
    ///
    /// The structure block is scanned cell by cell for the first `FDT_BEGIN_NODE`. The root is
    /// reported as [`ROOT_NODE_NAME`].
    pub fn root(&self) -> Result<Option<DevTreeNode<'_, 'dt>>> {
        let mut off = self.off_dt_struct;
        while off + FDT_CELL_SIZE <= self.end_dt_struct {
            if self.buf.read_be_u32(off)? == FdtTok::BeginNode as u32 {
                return Ok(Some(DevTreeNode::new(
                    self,
                    off,
                    ROOT_NODE_NAME.as_bytes(),
                )));
            }
            off += FDT_CELL_SIZE;
        }
        Ok(None)
    }

    /// Returns the node at `path`, a `/` separated list of node names starting at the root.
    ///
    /// Each component is looked up with [`DevTreeNode::child_by_name`] using `mode`. Empty
    /// components are ignored, so `"/"` and `""` both name the root.
    pub fn node_by_path(&self, path: &str, mode: NameMatch) -> Result<Option<DevTreeNode<'_, 'dt>>> {
        trace!("looking up device tree path {:?}", path);
        let mut node = match self.root()? {
            Some(root) => root,
            None => return Ok(None),
        };
        for component in path.split('/').filter(|c| !c.is_empty()) {
            node = match node.child_by_name(component, mode)? {
                Some(child) => child,
                None => return Ok(None),
            };
        }
        Ok(Some(node))
    }

    /// Returns the number of `FDT_BEGIN_NODE` records reachable from the root.
    ///
    /// The root's subtree is scanned token by token, so arbitrarily deep input cannot exhaust the
    /// stack. Nesting past [`MAX_NODE_DEPTH`] is rejected with [`DevTreeError::ParseError`], as it
    /// is when measuring a node.
    pub fn node_count(&self) -> Result<usize> {
        let root = match self.root()? {
            Some(root) => root,
            None => return Ok(0),
        };

        let buf = self.structs();
        let mut count = 0;
        let mut depth = 0;
        let mut off = root.offset();
        loop {
            off = match self.token_at(off)? {
                FdtTok::BeginNode => {
                    count += 1;
                    depth += 1;
                    if depth > MAX_NODE_DEPTH {
                        warn!("device tree nested deeper than {} nodes", MAX_NODE_DEPTH);
                        return Err(DevTreeError::ParseError);
                    }
                    read_node_name(buf, self.ops, off)?.1
                }
                FdtTok::EndNode => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(count);
                    }
                    advance(off, 1)?
                }
                FdtTok::Prop => advance(off, prop_size(buf, off)?)?,
                FdtTok::Nop => advance(off, 1)?,
                FdtTok::End => {
                    warn!("FDT_END inside the node at offset {:#x}", off);
                    return Err(DevTreeError::ParseError);
                }
            };
        }
    }

    /// Returns the token at `off`, first checking that it lies inside the structure block.
    pub(crate) fn token_at(&self, off: usize) -> Result<FdtTok> {
        if off < self.off_dt_struct || off >= self.end_dt_struct {
            return Err(DevTreeError::InvalidOffset);
        }
        next_token(self.structs(), off)
    }
}
