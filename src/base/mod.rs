//! Device tree walking utils that operate directly on the FDT.
//!
//! # Overview
//!
//! Every operation in this module is a forward scan over the structure block. Nothing is
//! indexed or cached: a [`DevTreeNode`] is only a cursor at its `FDT_BEGIN_NODE` token, and its
//! size, children and properties are found again each time they are asked for. Skipping over a
//! node to reach its next sibling rescans the node's whole subtree.
//!
//! # Examples
//!
//! ## Initialization
//!
//! ```
//! use fdt_walk::prelude::*;
//! use fdt_walk::base::*;
//!
//! # let fdt: &[u8] = &[];
//! // Create the device tree parser
//! let devtree = DevTree::new(fdt)
//!     .expect("Buffer does not contain a device tree.");
//! ```
//!
//! ## Named lookup
//!
//! Find the first `cpu` node regardless of its unit address, and read its `reg`:
//! ```
//! # use fdt_walk::prelude::*;
//! # use fdt_walk::base::*;
//! # fn f(devtree: &DevTree) -> fdt_walk::error::Result<()> {
//! let cpus = devtree.node_by_path("/cpus", NameMatch::Strict)?.expect("no /cpus");
//! let cpu = cpus.child_by_name("cpu", NameMatch::Lenient)?.expect("no cpu");
//! if let Some(reg) = cpu.prop_by_name("reg")? {
//!     log::info!("{}: reg = {:#x}", cpu.name()?, reg.get_u32(0)?);
//! }
//! # Ok(())
//! # }
//! ```

#[doc(hidden)]
pub mod node;
#[doc(hidden)]
pub mod prop;
#[doc(hidden)]
pub mod tree;

pub mod iters;
pub mod parse;

#[doc(inline)]
pub use crate::common::name::NameMatch;
#[doc(inline)]
pub use node::*;
#[doc(inline)]
pub use prop::*;
#[doc(inline)]
pub use tree::*;
