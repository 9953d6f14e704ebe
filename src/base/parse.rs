//! Low level flattened device tree walking functions.
//!
//! Nodes in the structure block carry no length prefix. The extent of a node is found by scanning
//! every token inside it, and all navigation is built on that scan:
//!
//! - [`prop_size`] measures a single `FDT_PROP` record.
//! - [`node_size`] measures a whole node, recursing into its children.
//!
//! All offsets are byte offsets into the device tree buffer and every read is bounds checked.
//! Sizes are returned in cells (see [`FDT_CELL_SIZE`]).

use core::mem::size_of;

use num_traits::FromPrimitive;

use crate::error::{DevTreeError, Result};
use crate::host::StrOps;
use crate::priv_util::{cells_for, SliceRead};
use crate::spec::{fdt_prop_header, FdtTok, FDT_CELL_SIZE, MAX_NODE_DEPTH};

/// A property record as laid out after its `FDT_PROP` token.
pub struct ParsedProp<'a> {
    pub prop_buf: &'a [u8],
    pub name_offset: usize,
}

/// Moves `off` forward by `cells` cells, failing rather than wrapping.
#[inline]
pub(crate) fn advance(off: usize, cells: usize) -> Result<usize> {
    cells
        .checked_mul(FDT_CELL_SIZE)
        .and_then(|bytes| off.checked_add(bytes))
        .ok_or(DevTreeError::InvalidOffset)
}

/// Decodes the token at `off`.
pub fn next_token(buf: &[u8], off: usize) -> Result<FdtTok> {
    let raw = buf.read_be_u32(off)?;
    FromPrimitive::from_u32(raw).ok_or_else(|| {
        warn!("invalid structure block token {:#x} at offset {:#x}", raw, off);
        DevTreeError::ParseError
    })
}

/// Returns the offset of the first token at or after `off` which is not `FDT_NOP`.
pub fn skip_nops(buf: &[u8], mut off: usize) -> Result<usize> {
    while next_token(buf, off)? == FdtTok::Nop {
        off += FDT_CELL_SIZE;
    }
    Ok(off)
}

/// Reads the name of the node whose `FDT_BEGIN_NODE` token sits at `off`.
///
/// Returns the name (without its terminator) and the offset of the first token after the padded
/// name.
pub fn read_node_name<'a>(buf: &'a [u8], ops: &dyn StrOps, off: usize) -> Result<(&'a [u8], usize)> {
    let name_off = advance(off, 1)?;
    let tail = buf.get(name_off..).ok_or(DevTreeError::InvalidOffset)?;
    let len = match ops.strlen(tail) {
        Some(len) if len < tail.len() => len,
        _ => {
            warn!("unterminated node name at offset {:#x}", name_off);
            return Err(DevTreeError::ParseError);
        }
    };

    // The terminator is always part of the padded name.
    let end = advance(name_off, len / FDT_CELL_SIZE + 1)?;
    if end > buf.len() {
        return Err(DevTreeError::InvalidOffset);
    }
    Ok((&tail[..len], end))
}

/// Returns the number of cells consumed by the property record at `off`: its token, the length
/// and name offset fields, and its padded data.
///
/// Returns `0` if `off` does not hold an `FDT_PROP` token.
pub fn prop_size(buf: &[u8], off: usize) -> Result<usize> {
    if next_token(buf, off)? != FdtTok::Prop {
        return Ok(0);
    }

    let len = buf.read_be_u32(off + FDT_CELL_SIZE)? as usize;
    let header_cells = size_of::<fdt_prop_header>() / FDT_CELL_SIZE;
    Ok(1 + header_cells + cells_for(len, FDT_CELL_SIZE))
}

/// Reads the property record whose `FDT_PROP` token sits at `off`.
pub fn read_prop<'a>(buf: &'a [u8], off: usize) -> Result<ParsedProp<'a>> {
    if next_token(buf, off)? != FdtTok::Prop {
        return Err(DevTreeError::ParseError);
    }

    let len = buf.read_be_u32(off + FDT_CELL_SIZE)? as usize;
    let name_offset = buf.read_be_u32(off + 2 * FDT_CELL_SIZE)? as usize;

    let data = off + FDT_CELL_SIZE + size_of::<fdt_prop_header>();
    let prop_buf = data
        .checked_add(len)
        .and_then(|end| buf.get(data..end))
        .ok_or(DevTreeError::InvalidOffset)?;

    Ok(ParsedProp {
        prop_buf,
        name_offset,
    })
}

/// Returns the number of cells from the `FDT_BEGIN_NODE` token at `off` through its matching
/// `FDT_END_NODE`, inclusive.
///
/// The node's name, its properties and all of its descendants are scanned. Nothing is cached;
/// every call rescans the whole subtree.
pub fn node_size(buf: &[u8], ops: &dyn StrOps, off: usize) -> Result<usize> {
    node_size_at_depth(buf, ops, off, 0)
}

fn node_size_at_depth(buf: &[u8], ops: &dyn StrOps, off: usize, depth: usize) -> Result<usize> {
    if depth >= MAX_NODE_DEPTH {
        warn!("device tree nested deeper than {} nodes", MAX_NODE_DEPTH);
        return Err(DevTreeError::ParseError);
    }
    if next_token(buf, off)? != FdtTok::BeginNode {
        return Err(DevTreeError::ParseError);
    }

    let (_, mut cur) = read_node_name(buf, ops, off)?;
    loop {
        cur = match next_token(buf, cur)? {
            FdtTok::Nop => advance(cur, 1)?,
            FdtTok::Prop => advance(cur, prop_size(buf, cur)?)?,
            FdtTok::BeginNode => advance(cur, node_size_at_depth(buf, ops, cur, depth + 1)?)?,
            FdtTok::EndNode => break,
            FdtTok::End => {
                warn!("FDT_END inside the node at offset {:#x}", off);
                return Err(DevTreeError::ParseError);
            }
        };
    }

    // Include the FDT_END_NODE itself.
    Ok((cur - off) / FDT_CELL_SIZE + 1)
}

/// Returns the offset of the first token inside the node at `off` which follows its name and is
/// not `FDT_NOP`.
pub(crate) fn node_body(buf: &[u8], ops: &dyn StrOps, off: usize) -> Result<usize> {
    let (_, cur) = read_node_name(buf, ops, off)?;
    skip_nops(buf, cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NulStrOps;

    // BEGIN_NODE "a" { PROP len=5 nameoff=0 "hello"; NOP; BEGIN_NODE "" {}; } END
    const TOKENS: [u32; 13] = [
        1, 0x6100_0000, // "a\0\0\0"
        3, 5, 0, 0x6865_6c6c, 0x6f00_0000, // "hello" padded to two cells
        4, 1, 0, // child with an empty name
        2, 2, 9,
    ];

    fn blob() -> [u8; 52] {
        let mut out = [0u8; 52];
        for (i, tok) in TOKENS.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&tok.to_be_bytes());
        }
        out
    }

    #[test]
    fn measures_props_and_nested_nodes() {
        let buf = blob();
        let buf = &buf[..];
        assert_eq!(prop_size(buf, 8), Ok(5));
        assert_eq!(prop_size(buf, 0), Ok(0));
        assert_eq!(node_size(buf, &NulStrOps, 32), Ok(3));
        assert_eq!(node_size(buf, &NulStrOps, 0), Ok(12));
        assert_eq!(next_token(buf, 48), Ok(FdtTok::End));
    }

    #[test]
    fn reads_prop_record() {
        let buf = blob();
        let prop = read_prop(&buf[..], 8).unwrap();
        assert_eq!(prop.prop_buf, b"hello");
        assert_eq!(prop.name_offset, 0);
    }

    #[test]
    fn node_name_padding() {
        let buf = blob();
        let (name, next) = read_node_name(&buf[..], &NulStrOps, 0).unwrap();
        assert_eq!(name, b"a");
        assert_eq!(next, 8);
        let (name, next) = read_node_name(&buf[..], &NulStrOps, 32).unwrap();
        assert_eq!(name, b"");
        assert_eq!(next, 40);
    }

    #[test]
    fn truncated_node_is_an_error() {
        let buf = blob();
        assert_eq!(
            node_size(&buf[..40], &NulStrOps, 0),
            Err(DevTreeError::InvalidOffset)
        );
        assert!(node_size(&buf[..], &NulStrOps, 8).is_err());
    }

    #[test]
    fn unknown_token_is_an_error() {
        let mut buf = blob();
        buf[28..32].copy_from_slice(&7u32.to_be_bytes());
        assert_eq!(
            node_size(&buf[..], &NulStrOps, 0),
            Err(DevTreeError::ParseError)
        );
    }
}
