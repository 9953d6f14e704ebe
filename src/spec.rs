#![allow(non_camel_case_types)]

use endian_type_rs::types::{u32_be, u64_be};
use num_derive::FromPrimitive;

pub const FDT_MAGIC: u32 = 0xd00d_feed;

/// Every token, name and property record in the structure block is padded to this size.
pub const FDT_CELL_SIZE: usize = 4;

/// Deepest nesting the subtree size calculator will recurse into.
pub const MAX_NODE_DEPTH: usize = 256;

#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdtTok {
    BeginNode = 0x1,
    EndNode = 0x2,
    Prop = 0x3,
    Nop = 0x4,
    End = 0x9,
}

// These definitions only describe the wire layout. Fields are decoded through
// `SliceRead` at the offsets given by `offset_of!`, never through a cast.

// As defined by the Devicetree Specification, section 5.
#[repr(C)]
pub struct fdt_header {
    pub magic: u32_be,
    pub totalsize: u32_be,
    pub off_dt_struct: u32_be,
    pub off_dt_strings: u32_be,
    pub off_mem_rsvmap: u32_be,
    pub version: u32_be,
    pub last_comp_version: u32_be,
    pub boot_cpuid_phys: u32_be,
    pub size_dt_strings: u32_be,
    pub size_dt_struct: u32_be,
}

#[repr(C)]
pub struct fdt_prop_header {
    pub len: u32_be,
    pub nameoff: u32_be,
}

#[repr(C)]
pub struct fdt_reserve_entry {
    pub address: u64_be,
    pub size: u64_be,
}

assert_eq_size!(fdt_header, [u8; 40]);
assert_eq_size!(fdt_prop_header, [u8; 8]);
assert_eq_size!(fdt_reserve_entry, [u8; 16]);

/// A phandle is a `u32` reference from one node to another.
pub type Phandle = u32;
