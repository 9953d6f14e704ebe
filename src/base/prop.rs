use crate::base::{DevTree, DevTreeNode};
use crate::prelude::*;

/// A handle to a [`DevTreeNode`]'s Device Tree Property
#[derive(Clone, Copy, Debug)]
pub struct DevTreeProp<'a, 'dt: 'a> {
    node: DevTreeNode<'a, 'dt>,
    offset: usize,
    propbuf: &'dt [u8],
    nameoff: usize,
}

impl<'a, 'dt: 'a> PartialEq for DevTreeProp<'a, 'dt> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.offset == other.offset
    }
}

impl<'r, 'dt: 'r> PropReader<'dt> for DevTreeProp<'r, 'dt> {
    type NodeType = DevTreeNode<'r, 'dt>;

    #[inline]
    fn propbuf(&self) -> &'dt [u8] {
        self.propbuf
    }

    #[inline]
    fn nameoff(&self) -> usize {
        self.nameoff
    }

    #[inline]
    fn fdt(&self) -> &DevTree<'dt> {
        self.node.fdt()
    }

    /// Returns the node which this property is attached to
    #[inline]
    fn node(&self) -> DevTreeNode<'r, 'dt> {
        self.node
    }
}

impl<'a, 'dt: 'a> DevTreeProp<'a, 'dt> {
    pub(super) fn new(
        node: DevTreeNode<'a, 'dt>,
        offset: usize,
        propbuf: &'dt [u8],
        nameoff: usize,
    ) -> Self {
        Self {
            node,
            offset,
            propbuf,
            nameoff,
        }
    }

    /// Returns the byte offset of this property's `FDT_PROP` token within the device tree.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}
