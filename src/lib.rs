//! A read-only walker for Flattened Device Tree (FDT, DTB) blobs.
//!
//! The walker borrows a caller owned buffer and never allocates. Nodes are located by scanning
//! the structure block's token stream, see [`base`] for the navigation API and [`base::parse`]
//! for the underlying scan.
//!
//! ```
//! use fdt_walk::prelude::*;
//! use fdt_walk::base::DevTree;
//!
//! # fn f(blob: &[u8]) -> fdt_walk::error::Result<()> {
//! let devtree = DevTree::new(blob)?;
//! let root = devtree.root()?.expect("device tree has no root node");
//! let mut children = root.children();
//! while let Some(child) = children.next()? {
//!     log::info!("{}", child.name()?);
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate memoffset;
#[macro_use]
extern crate static_assertions;
#[macro_use]
extern crate log;

pub mod base;
pub mod error;
pub mod host;
pub mod prelude;
pub mod spec;

mod common;
mod priv_util;
