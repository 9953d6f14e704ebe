//! Builds small device tree blobs for the integration tests.
#![allow(dead_code)]

const FDT_MAGIC: u32 = 0xd00d_feed;
const HEADER_SIZE: usize = 40;

pub const BEGIN_NODE: u32 = 1;
pub const END_NODE: u32 = 2;
pub const PROP: u32 = 3;
pub const NOP: u32 = 4;
pub const END: u32 = 9;

/// Byte offsets of header fields patched by the tests.
pub const SIZE_DT_STRINGS: usize = 32;
pub const SIZE_DT_STRUCT: usize = 36;

pub fn header_field(blob: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&blob[offset..offset + 4]);
    u32::from_be_bytes(raw)
}

pub fn set_header_field(blob: &mut [u8], offset: usize, value: u32) {
    blob[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

#[derive(Default)]
pub struct DtbBuilder {
    structs: Vec<u8>,
    strings: Vec<u8>,
    reserved: Vec<(u64, u64)>,
    boot_cpuid: u32,
}

fn pad(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

impl DtbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(&mut self, word: u32) -> &mut Self {
        self.structs.extend_from_slice(&word.to_be_bytes());
        self
    }

    pub fn begin_node(&mut self, name: &str) -> &mut Self {
        self.word(BEGIN_NODE);
        self.structs.extend_from_slice(name.as_bytes());
        self.structs.push(0);
        pad(&mut self.structs);
        self
    }

    pub fn end_node(&mut self) -> &mut Self {
        self.word(END_NODE)
    }

    pub fn nop(&mut self) -> &mut Self {
        self.word(NOP)
    }

    fn name_offset(&mut self, name: &str) -> u32 {
        let mut off = 0;
        while off < self.strings.len() {
            let end = off + self.strings[off..].iter().position(|&b| b == 0).unwrap();
            if &self.strings[off..end] == name.as_bytes() {
                return off as u32;
            }
            off = end + 1;
        }
        let off = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        off
    }

    pub fn prop(&mut self, name: &str, value: &[u8]) -> &mut Self {
        let nameoff = self.name_offset(name);
        self.word(PROP);
        self.word(value.len() as u32);
        self.word(nameoff);
        self.structs.extend_from_slice(value);
        pad(&mut self.structs);
        self
    }

    pub fn prop_empty(&mut self, name: &str) -> &mut Self {
        self.prop(name, &[])
    }

    pub fn prop_u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.prop(name, &value.to_be_bytes())
    }

    pub fn prop_cells(&mut self, name: &str, cells: &[u32]) -> &mut Self {
        let bytes: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes().to_vec()).collect();
        self.prop(name, &bytes)
    }

    pub fn prop_str(&mut self, name: &str, value: &str) -> &mut Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.prop(name, &bytes)
    }

    pub fn reserve(&mut self, address: u64, size: u64) -> &mut Self {
        self.reserved.push((address, size));
        self
    }

    pub fn boot_cpuid(&mut self, id: u32) -> &mut Self {
        self.boot_cpuid = id;
        self
    }

    /// Lays out header, reservation map, structure block (terminated by `FDT_END`) and strings.
    pub fn finish(&self) -> Vec<u8> {
        let mut rsvmap = Vec::new();
        for &(address, size) in self.reserved.iter().chain(std::iter::once(&(0, 0))) {
            rsvmap.extend_from_slice(&address.to_be_bytes());
            rsvmap.extend_from_slice(&size.to_be_bytes());
        }

        let mut structs = self.structs.clone();
        structs.extend_from_slice(&END.to_be_bytes());

        let off_mem_rsvmap = HEADER_SIZE;
        let off_dt_struct = off_mem_rsvmap + rsvmap.len();
        let off_dt_strings = off_dt_struct + structs.len();
        let totalsize = off_dt_strings + self.strings.len();

        let header = [
            FDT_MAGIC,
            totalsize as u32,
            off_dt_struct as u32,
            off_dt_strings as u32,
            off_mem_rsvmap as u32,
            17,
            16,
            self.boot_cpuid,
            self.strings.len() as u32,
            structs.len() as u32,
        ];

        let mut out = Vec::with_capacity(totalsize);
        for field in header.iter() {
            out.extend_from_slice(&field.to_be_bytes());
        }
        out.extend_from_slice(&rsvmap);
        out.extend_from_slice(&structs);
        out.extend_from_slice(&self.strings);
        out
    }
}

/// A chain of `depth` nodes, each the only child of the one before.
pub fn nested_blob(depth: usize) -> Vec<u8> {
    let mut builder = DtbBuilder::new();
    builder.begin_node("");
    for _ in 1..depth {
        builder.begin_node("n");
    }
    for _ in 0..depth {
        builder.end_node();
    }
    builder.finish()
}

/// `/ { cpus { #address-cells = <1>; }; };`
pub fn cpus_blob() -> Vec<u8> {
    DtbBuilder::new()
        .begin_node("")
        .begin_node("cpus")
        .prop_u32("#address-cells", 1)
        .end_node()
        .end_node()
        .finish()
}

/// A tree shaped like a small virtual machine, with properties, NOPs and unit addresses.
pub fn machine_blob() -> Vec<u8> {
    DtbBuilder::new()
        .reserve(0x8000_0000, 0x20_0000)
        .reserve(0x8800_0000, 0x1000)
        .boot_cpuid(1)
        .begin_node("")
        .prop_u32("#address-cells", 2)
        .nop()
        .prop_u32("#size-cells", 2)
        .prop_str("compatible", "riscv-virtio")
        .begin_node("chosen")
        .prop_str("bootargs", "console=ttyS0")
        .end_node()
        .begin_node("memory@80000000")
        .prop_str("device_type", "memory")
        .prop_cells("reg", &[0x0, 0x8000_0000, 0x0, 0x800_0000])
        .end_node()
        .nop()
        .begin_node("cpus")
        .prop_u32("#address-cells", 1)
        .prop_u32("#size-cells", 0)
        .begin_node("cpu@0")
        .prop_u32("reg", 0)
        .prop_str("status", "okay")
        .begin_node("interrupt-controller")
        .prop_empty("interrupt-controller")
        .prop_u32("phandle", 3)
        .end_node()
        .end_node()
        .nop()
        .nop()
        .begin_node("cpu@1")
        .prop_u32("reg", 1)
        .end_node()
        .end_node()
        .begin_node("soc")
        .prop("compatible", b"simple-bus\0virt,soc\0")
        .prop_empty("ranges")
        .begin_node("uart@10000000")
        .prop_cells("reg", &[0x0, 0x1000_0000, 0x0, 0x100])
        .prop_str("compatible", "ns16550a")
        .end_node()
        .begin_node("uart")
        .prop_str("compatible", "ns16550a")
        .end_node()
        .end_node()
        .end_node()
        .finish()
}
