use crate::common::MemoryBlockDevice;
use bootmap::{BlockPointer, DiskType, Geometry, PointerFormat};

pub const KERNEL_ADDR: u64 = 0x10000;
pub const PARMFILE_ADDR: u64 = 0x1000;
pub const INITRD_ADDR: u64 = 0x80_0000;
pub const STAGE3_ADDR: u64 = 0xa000;
/// Stage 3 load PSW, addresses the kernel once masked
pub const KERNEL_PSW: u64 = 0x0008_0000_8001_0000;
/// PSW of the execute entry, jumps into stage 3
pub const STAGE3_PSW: u64 = 0x0008_0000_8000_a050;

pub const TYPE_EXECUTE: u8 = 0x01;
pub const TYPE_LOAD: u8 = 0x02;

/// Run of consecutive blocks: `count` additional blocks follow `block`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub block: u64,
    pub count: u16,
}

impl Extent {
    pub fn single(block: u64) -> Self {
        Self { block, count: 0 }
    }
}

/// Boot program with the usual zipl component layout
#[derive(Debug, Clone, Default)]
pub struct StandardProgram {
    pub kernel: Vec<u8>,
    pub initrd: Option<Vec<u8>>,
    pub parmfile: Option<Vec<u8>>,
    /// Blocks per extent when laying out component data
    pub extent_blocks: u64,
}

/// Lays out boot maps the way zipl writes them
pub struct BootmapBuilder {
    disk_type: DiskType,
    block_size: usize,
    geometry: Geometry,
    data: Vec<u8>,
    next_block: u64,
}

impl BootmapBuilder {
    pub fn new(disk_type: DiskType, block_size: usize, geometry: Geometry) -> Self {
        // block 0 holds the MBR (linear) or the IPL record (CHS); block 1 is
        // the DASD boot record at CHS(0, 0, 2)
        let next_block = if disk_type.is_chs() { 2 } else { 1 };
        Self {
            disk_type,
            block_size,
            geometry,
            data: vec![0u8; next_block as usize * block_size],
            next_block,
        }
    }

    pub fn scsi(block_size: usize) -> Self {
        Self::new(DiskType::Scsi, block_size, Geometry::default())
    }

    pub fn fba() -> Self {
        Self::new(DiskType::Fba, 512, Geometry::default())
    }

    pub fn eckd(block_size: usize, geometry: Geometry) -> Self {
        Self::new(DiskType::EckdCompatible, block_size, geometry)
    }

    pub fn disk_type(&self) -> DiskType {
        self.disk_type
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn format(&self) -> PointerFormat {
        self.disk_type.pointer_format().expect("bootable disk type")
    }

    /// Pointer value a reader should decode for `extent`
    pub fn pointer(&self, extent: Extent) -> BlockPointer {
        let size = self.block_size as u16;
        if self.disk_type.is_chs() {
            let (cyl, head, sec) = self.chs(extent.block);
            BlockPointer::Chs {
                cyl,
                head,
                sec,
                size,
                block_count: extent.count as u8,
            }
        } else {
            BlockPointer::Linear {
                block: extent.block,
                size,
                block_count: extent.count,
            }
        }
    }

    fn chs(&self, block: u64) -> (u16, u16, u8) {
        let sectors = u64::from(self.geometry.sectors);
        let heads = u64::from(self.geometry.heads);
        let sec = (block % sectors + 1) as u8;
        let head = ((block / sectors) % heads) as u16;
        let cyl = (block / (sectors * heads)) as u16;
        (cyl, head, sec)
    }

    /// Packed big-endian encoding of `extent`, all zero for `None`
    pub fn encode(&self, extent: Option<Extent>) -> Vec<u8> {
        let mut raw = vec![0u8; self.format().size()];
        let Some(extent) = extent else {
            return raw;
        };
        let size = self.block_size as u16;
        match self.format() {
            PointerFormat::Scsi => {
                raw[0..8].copy_from_slice(&extent.block.to_be_bytes());
                raw[8..10].copy_from_slice(&size.to_be_bytes());
                raw[10..12].copy_from_slice(&extent.count.to_be_bytes());
            }
            PointerFormat::Fba => {
                raw[0..4].copy_from_slice(&(extent.block as u32).to_be_bytes());
                raw[4..6].copy_from_slice(&size.to_be_bytes());
                raw[6..8].copy_from_slice(&extent.count.to_be_bytes());
            }
            PointerFormat::Eckd => {
                let (cyl, head, sec) = self.chs(extent.block);
                raw[0..2].copy_from_slice(&cyl.to_be_bytes());
                raw[2..4].copy_from_slice(&head.to_be_bytes());
                raw[4] = sec;
                raw[5..7].copy_from_slice(&size.to_be_bytes());
                raw[7] = extent.count as u8;
            }
        }
        raw
    }

    /// Reserve `blocks` consecutive blocks
    pub fn alloc(&mut self, blocks: u64) -> u64 {
        let first = self.next_block;
        self.next_block += blocks;
        self.data.resize(self.next_block as usize * self.block_size, 0);
        first
    }

    /// Copy `bytes` to the device starting at `block`
    pub fn write_at(&mut self, block: u64, bytes: &[u8]) {
        let offset = block as usize * self.block_size;
        if self.data.len() < offset + bytes.len() {
            self.data.resize(offset + bytes.len(), 0);
        }
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Store `data` in extents of `extent_blocks` blocks
    ///
    /// A spare block is left between extents so that no two extents are
    /// contiguous on disk.
    pub fn add_data(&mut self, data: &[u8], extent_blocks: u64) -> Vec<Extent> {
        let extent_len = extent_blocks as usize * self.block_size;
        let mut extents = Vec::new();
        for chunk in data.chunks(extent_len) {
            let blocks = chunk.len().div_ceil(self.block_size) as u64;
            let block = self.alloc(blocks);
            self.write_at(block, chunk);
            self.alloc(1);
            extents.push(Extent {
                block,
                count: (blocks - 1) as u16,
            });
        }
        extents
    }

    /// Write a chain of one-block segment tables addressing `extents`
    ///
    /// Returns the first table.
    pub fn add_segment_tables(&mut self, extents: &[Extent]) -> Extent {
        let ptr_size = self.format().size();
        let slots = self.block_size / ptr_size;
        let per_table = slots - 1;
        let tables = extents.len().div_ceil(per_table).max(1);
        let first = self.alloc(tables as u64);

        for table in 0..tables {
            let mut block = vec![0u8; self.block_size];
            let chunk = extents.iter().skip(table * per_table).take(per_table);
            for (slot, extent) in chunk.enumerate() {
                block[slot * ptr_size..(slot + 1) * ptr_size]
                    .copy_from_slice(&self.encode(Some(*extent)));
            }
            if table + 1 < tables {
                let next = Extent::single(first + table as u64 + 1);
                block[(slots - 1) * ptr_size..slots * ptr_size]
                    .copy_from_slice(&self.encode(Some(next)));
            }
            self.write_at(first + table as u64, &block);
        }
        Extent::single(first)
    }

    /// Store a component and return its first segment table
    pub fn add_component(&mut self, data: &[u8], extent_blocks: u64) -> Extent {
        let extents = self.add_data(data, extent_blocks);
        self.add_segment_tables(&extents)
    }

    /// Write a component table with `(segment table, type, address)` entries
    pub fn add_component_table(
        &mut self,
        opt: u8,
        entries: &[(Option<Extent>, u8, u64)],
    ) -> Extent {
        let mut block = vec![0u8; self.block_size];
        block[0..4].copy_from_slice(b"zIPL");
        block[4] = opt;
        for (n, (ptr, kind, address)) in entries.iter().enumerate() {
            let entry = (n + 1) * 32;
            let raw = self.encode(*ptr);
            block[entry..entry + raw.len()].copy_from_slice(&raw);
            block[entry + 23] = *kind;
            block[entry + 24..entry + 32].copy_from_slice(&address.to_be_bytes());
        }
        let table = self.alloc(1);
        self.write_at(table, &block);
        Extent::single(table)
    }

    /// Stage 3 loader image carrying the parameter block
    pub fn stage3_image(
        parm_addr: u64,
        initrd_addr: u64,
        initrd_len: u64,
        load_psw: u64,
    ) -> Vec<u8> {
        let mut image = vec![0u8; 512];
        image[0..8].copy_from_slice(&parm_addr.to_be_bytes());
        image[8..16].copy_from_slice(&initrd_addr.to_be_bytes());
        image[16..24].copy_from_slice(&initrd_len.to_be_bytes());
        image[24..32].copy_from_slice(&load_psw.to_be_bytes());
        image[32..].fill(0xc3);
        image
    }

    /// Lay out `program` and return its component table
    pub fn add_standard_program(&mut self, program: &StandardProgram) -> Extent {
        let extent_blocks = program.extent_blocks.max(1);
        let mut entries = Vec::new();

        let kernel = self.add_component(&program.kernel, extent_blocks);
        entries.push((Some(kernel), TYPE_LOAD, KERNEL_ADDR));

        let mut parm_addr = 0;
        if let Some(parmfile) = &program.parmfile {
            let ptr = self.add_component(parmfile, extent_blocks);
            entries.push((Some(ptr), TYPE_LOAD, PARMFILE_ADDR));
            parm_addr = PARMFILE_ADDR;
        }

        let (mut initrd_addr, mut initrd_len) = (0, 0);
        if let Some(initrd) = &program.initrd {
            let ptr = self.add_component(initrd, extent_blocks);
            entries.push((Some(ptr), TYPE_LOAD, INITRD_ADDR));
            initrd_addr = INITRD_ADDR;
            initrd_len = initrd.len() as u64;
        }

        let stage3 = Self::stage3_image(parm_addr, initrd_addr, initrd_len, KERNEL_PSW);
        let stage3 = self.add_component(&stage3, 1);
        entries.push((Some(stage3), TYPE_LOAD, STAGE3_ADDR));
        entries.push((None, TYPE_EXECUTE, STAGE3_PSW));

        self.add_component_table(0, &entries)
    }

    /// Write program table and boot record and produce the device
    pub fn build(mut self, programs: &[Option<Extent>]) -> MemoryBlockDevice {
        let ptr_size = self.format().size();
        let mut table = vec![0u8; self.block_size];
        table[0..4].copy_from_slice(b"zIPL");
        for (n, program) in programs.iter().enumerate() {
            let slot = (n + 1) * ptr_size;
            table[slot..slot + ptr_size].copy_from_slice(&self.encode(*program));
        }
        let table_block = self.alloc(1);
        self.write_at(table_block, &table);
        self.set_program_table(Extent::single(table_block));

        if self.disk_type.is_chs() {
            let geo = self.geometry;
            let blocks = u64::from(geo.heads) * u64::from(geo.sectors) * u64::from(geo.cylinders);
            assert!(self.next_block <= blocks, "boot map exceeds disk geometry");
            self.data.resize(blocks as usize * self.block_size, 0);
        } else {
            // spare block so that the device end is never hit by accident
            self.alloc(1);
        }
        MemoryBlockDevice::new(self.data, self.block_size)
    }

    /// Point the boot record at `table`
    pub fn set_program_table(&mut self, table: Extent) {
        let raw = self.encode(Some(table));
        if self.disk_type.is_chs() {
            let mut record = vec![0u8; self.block_size];
            record[0..4].copy_from_slice(b"\xc9\xd7\xd3\xf1"); // "IPL1" in EBCDIC
            record[4..4 + raw.len()].copy_from_slice(&raw);
            self.write_at(1, &record);
        } else {
            let mut mbr = vec![0u8; self.block_size];
            mbr[0..4].copy_from_slice(b"zIPL");
            mbr[16..16 + raw.len()].copy_from_slice(&raw);
            mbr[510] = 0x55;
            mbr[511] = 0xAA;
            self.write_at(0, &mbr);
        }
    }
}
