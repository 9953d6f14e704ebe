//! Iterative parsers of a [`DevTree`].
use core::mem::size_of;

use crate::prelude::*;

use crate::base::node::skip_prop;
use crate::base::{DevTree, DevTreeNode, DevTreeProp};
use crate::error::{DevTreeError, Result};
use crate::spec::{fdt_reserve_entry, FdtTok};

/// One entry of the memory reservation map, decoded to native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveEntry {
    pub address: u64,
    pub size: u64,
}

/// An iterator over the entries of the memory reservation map.
///
/// Iteration ends at the first all-zero entry.
#[derive(Clone)]
pub struct DevTreeReserveEntryIter<'a, 'dt: 'a> {
    offset: usize,
    done: bool,
    fdt: &'a DevTree<'dt>,
}

impl<'a, 'dt: 'a> DevTreeReserveEntryIter<'a, 'dt> {
    pub(crate) fn new(fdt: &'a DevTree<'dt>) -> Self {
        Self {
            offset: fdt.off_mem_rsvmap(),
            done: false,
            fdt,
        }
    }
}

impl<'a, 'dt: 'a> FallibleIterator for DevTreeReserveEntryIter<'a, 'dt> {
    type Item = ReserveEntry;
    type Error = DevTreeError;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }

        let buf = self.fdt.buf();
        let entry = ReserveEntry {
            address: buf.read_be_u64(self.offset + offset_of!(fdt_reserve_entry, address))?,
            size: buf.read_be_u64(self.offset + offset_of!(fdt_reserve_entry, size))?,
        };
        if entry.address == 0 && entry.size == 0 {
            self.done = true;
            return Ok(None);
        }
        self.offset += size_of::<fdt_reserve_entry>();
        Ok(Some(entry))
    }
}

#[derive(Clone)]
enum ChildCursor<'a, 'dt: 'a> {
    Parent(DevTreeNode<'a, 'dt>),
    Sibling(DevTreeNode<'a, 'dt>),
    Done,
}

/// An iterator over the direct children of a [`DevTreeNode`].
///
/// Each step after the first rescans the previous child's subtree.
#[derive(Clone)]
pub struct DevTreeNodeChildIter<'a, 'dt: 'a> {
    cursor: ChildCursor<'a, 'dt>,
}

impl<'a, 'dt: 'a> DevTreeNodeChildIter<'a, 'dt> {
    pub(crate) fn new(parent: DevTreeNode<'a, 'dt>) -> Self {
        Self {
            cursor: ChildCursor::Parent(parent),
        }
    }
}

impl<'a, 'dt: 'a> FallibleIterator for DevTreeNodeChildIter<'a, 'dt> {
    type Item = DevTreeNode<'a, 'dt>;
    type Error = DevTreeError;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        let next = match self.cursor {
            ChildCursor::Parent(ref parent) => parent.first_child(),
            ChildCursor::Sibling(ref prev) => prev.next_sibling(),
            ChildCursor::Done => return Ok(None),
        };

        // Stop after an error as well as at the end.
        self.cursor = ChildCursor::Done;
        let next = next?;
        if let Some(node) = next {
            self.cursor = ChildCursor::Sibling(node);
        }
        Ok(next)
    }
}

/// An iterator over the properties of a single [`DevTreeNode`].
///
/// Iteration ends at the node's first child or its `FDT_END_NODE`.
#[derive(Clone)]
pub struct DevTreeNodePropIter<'a, 'dt: 'a> {
    node: DevTreeNode<'a, 'dt>,
    /// Offset of the next token to inspect. `None` until the node's name has been skipped.
    offset: Option<usize>,
    done: bool,
}

impl<'a, 'dt: 'a> DevTreeNodePropIter<'a, 'dt> {
    pub(crate) fn new(node: DevTreeNode<'a, 'dt>) -> Self {
        Self {
            node,
            offset: None,
            done: false,
        }
    }

    fn next_prop(&mut self) -> Result<Option<DevTreeProp<'a, 'dt>>> {
        let off = match self.offset {
            Some(off) => off,
            None => self.node.body_offset()?,
        };

        match self.node.fdt().token_at(off)? {
            FdtTok::Prop => {
                let prop = self.node.prop_at(off)?;
                self.offset = Some(skip_prop(self.node.fdt().structs(), off)?);
                Ok(Some(prop))
            }
            FdtTok::BeginNode | FdtTok::EndNode => Ok(None),
            // Leading and trailing NOPs are already skipped.
            FdtTok::Nop | FdtTok::End => Err(DevTreeError::ParseError),
        }
    }
}

impl<'a, 'dt: 'a> FallibleIterator for DevTreeNodePropIter<'a, 'dt> {
    type Error = DevTreeError;
    type Item = DevTreeProp<'a, 'dt>;

    fn next(&mut self) -> Result<Option<Self::Item>> {
        if self.done {
            return Ok(None);
        }
        let res = self.next_prop();
        if !matches!(res, Ok(Some(_))) {
            self.done = true;
        }
        res
    }
}
