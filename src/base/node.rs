#[cfg(doc)]
use super::*;

use core::str::from_utf8;

use crate::base::iters::{DevTreeNodeChildIter, DevTreeNodePropIter};
use crate::base::parse::{
    advance, node_body, node_size, prop_size, read_node_name, read_prop, skip_nops,
};
use crate::base::{DevTree, DevTreeProp};
use crate::common::name::{split_unit_address, NameMatch};
use crate::error::{DevTreeError, Result};
use crate::prelude::*;
use crate::spec::{FdtTok, FDT_CELL_SIZE};

use core::cmp::Ordering;

/// A handle to a Device Tree Node within the device tree.
///
/// The handle is a cursor at the node's `FDT_BEGIN_NODE` token. Neither children nor size are
/// cached; both are found again by scanning each time they are asked for.
#[derive(Clone, Copy, Debug)]
pub struct DevTreeNode<'a, 'dt: 'a> {
    fdt: &'a DevTree<'dt>,
    offset: usize,
    name: &'dt [u8],
}

impl<'a, 'dt: 'a> PartialEq for DevTreeNode<'a, 'dt> {
    fn eq(&self, other: &Self) -> bool {
        self.fdt == other.fdt && self.offset == other.offset
    }
}

impl<'a, 'dt: 'a> DevTreeNode<'a, 'dt> {
    pub(super) fn new(fdt: &'a DevTree<'dt>, offset: usize, name: &'dt [u8]) -> Self {
        Self { fdt, offset, name }
    }

    /// Builds the node whose `FDT_BEGIN_NODE` token sits at `offset`, reading its name.
    pub(super) fn at(fdt: &'a DevTree<'dt>, offset: usize) -> Result<Self> {
        let (name, _) = read_node_name(fdt.structs(), fdt.str_ops(), offset)?;
        Ok(Self::new(fdt, offset, name))
    }

    /// Returns the name of the `DevTreeNode` (including unit address tag)
    #[inline]
    pub fn name(&self) -> Result<&'dt str> {
        from_utf8(self.name).map_err(DevTreeError::from)
    }

    /// Returns the raw name of the node, without its terminator.
    #[inline]
    #[must_use]
    pub fn name_bytes(&self) -> &'dt [u8] {
        self.name
    }

    /// Returns the name with any `@unit-address` suffix removed.
    pub fn unit_name(&self) -> Result<&'dt str> {
        Ok(from_utf8(split_unit_address(self.name).0)?)
    }

    /// Returns the unit address following the `@`, if the name has one.
    pub fn unit_address(&self) -> Result<Option<&'dt str>> {
        match split_unit_address(self.name).1 {
            Some(addr) => Ok(Some(from_utf8(addr)?)),
            None => Ok(None),
        }
    }

    /// Returns the byte offset of this node's `FDT_BEGIN_NODE` token within the device tree.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the device tree this node belongs to.
    #[inline]
    #[must_use]
    pub fn fdt(&self) -> &'a DevTree<'dt> {
        self.fdt
    }

    /// Returns the number of cells this node occupies in the structure block, from its
    /// `FDT_BEGIN_NODE` through its matching `FDT_END_NODE`.
    pub fn encoded_cells(&self) -> Result<usize> {
        node_size(self.fdt.structs(), self.fdt.str_ops(), self.offset)
    }

    /// Returns the first child of this node, or `None` if it has no children.
    ///
    /// Properties and `FDT_NOP` tokens preceding the first child are skipped.
    pub fn first_child(&self) -> Result<Option<DevTreeNode<'a, 'dt>>> {
        let buf = self.fdt.structs();
        let mut cur = self.body_offset()?;
        loop {
            match self.fdt.token_at(cur)? {
                FdtTok::Nop => cur += FDT_CELL_SIZE,
                FdtTok::Prop => cur = skip_prop(buf, cur)?,
                FdtTok::BeginNode => return Ok(Some(Self::at(self.fdt, cur)?)),
                FdtTok::EndNode => return Ok(None),
                FdtTok::End => return Err(DevTreeError::ParseError),
            }
        }
    }

    /// Returns the node following this one under the same parent, or `None` if this is the last
    /// child.
    ///
    /// This node's whole subtree is rescanned to find where it ends.
    pub fn next_sibling(&self) -> Result<Option<DevTreeNode<'a, 'dt>>> {
        let buf = self.fdt.structs();
        let cells = self.encoded_cells()?;
        let next = skip_nops(buf, advance(self.offset, cells)?)?;
        match self.fdt.token_at(next)? {
            FdtTok::BeginNode => Ok(Some(Self::at(self.fdt, next)?)),
            _ => Ok(None),
        }
    }

    /// Returns the first child whose name matches `name` under `mode`.
    ///
    /// With [`NameMatch::Lenient`], `"cpu"` finds a child named `"cpu@0"`.
    pub fn child_by_name(&self, name: &str, mode: NameMatch) -> Result<Option<DevTreeNode<'a, 'dt>>> {
        trace!("looking up child {:?} ({:?})", name, mode);
        let ops = self.fdt.str_ops();
        self.children()
            .find(|child| Ok(mode.matches(ops, name.as_bytes(), child.name)))
    }

    /// Returns the property of this node named `name`, or `None` if the node has none.
    ///
    /// Only this node's own properties are searched. The scan stops at its first child or at its
    /// `FDT_END_NODE`, whichever comes first.
    pub fn prop_by_name(&self, name: &str) -> Result<Option<DevTreeProp<'a, 'dt>>> {
        trace!("looking up property {:?}", name);
        let ops = self.fdt.str_ops();
        self.props().find(|prop| {
            Ok(ops.strcmp(name.as_bytes(), prop.name_bytes()?) == Ordering::Equal)
        })
    }

    /// Returns an iterator over this node's children [`DevTreeNode`]
    #[must_use]
    pub fn children(&self) -> DevTreeNodeChildIter<'a, 'dt> {
        DevTreeNodeChildIter::new(*self)
    }

    /// Returns an iterator over this node's [`DevTreeProp`]
    #[must_use]
    pub fn props(&self) -> DevTreeNodePropIter<'a, 'dt> {
        DevTreeNodePropIter::new(*self)
    }

    /// Returns the property whose `FDT_PROP` token sits at `off`.
    pub(super) fn prop_at(&self, off: usize) -> Result<DevTreeProp<'a, 'dt>> {
        let parsed = read_prop(self.fdt.structs(), off)?;
        Ok(DevTreeProp::new(
            *self,
            off,
            parsed.prop_buf,
            parsed.name_offset,
        ))
    }

    /// Returns the offset of the first token after this node's name and any `FDT_NOP`s.
    pub(super) fn body_offset(&self) -> Result<usize> {
        node_body(self.fdt.structs(), self.fdt.str_ops(), self.offset)
    }
}

/// Returns the offset of the first non-`FDT_NOP` token after the property at `off`.
pub(super) fn skip_prop(buf: &[u8], off: usize) -> Result<usize> {
    let next = advance(off, prop_size(buf, off)?)?;
    skip_nops(buf, next)
}
