//! Program table and component table tests

mod common;

use bootmap::{
    ComponentKind, ComponentTable, Disk, Error, Geometry, IplType, PointerFormat,
    ProgramTable,
};
use common::builder::{TYPE_EXECUTE, TYPE_LOAD};
use common::{BootmapBuilder, Extent, MemoryBlockDevice};

fn eckd_geometry() -> Geometry {
    Geometry {
        heads: 15,
        sectors: 12,
        cylinders: 4,
    }
}

fn open(builder: &BootmapBuilder, device: MemoryBlockDevice) -> Disk<MemoryBlockDevice> {
    Disk::open(device, builder.disk_type(), builder.geometry()).unwrap()
}

#[test]
fn test_program_table_entries_in_order() {
    let builder = BootmapBuilder::fba();
    let programs = [Some(Extent::single(3)), None, Some(Extent::single(7))];
    let expected: Vec<_> = programs
        .iter()
        .map(|p| p.map(|extent| builder.pointer(extent)))
        .collect();
    let reference = BootmapBuilder::fba();
    let device = builder.build(&programs);

    let mut disk = open(&reference, device);
    let table = ProgramTable::read(&mut disk).unwrap();

    assert_eq!(table.len(), ProgramTable::capacity(PointerFormat::Fba));
    for (index, ptr) in expected.iter().enumerate() {
        assert_eq!(table.entry(index), *ptr);
    }
    assert_eq!(table.entry(3), None);
    assert_eq!(table.iter().map(|(index, _)| index).collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn test_eckd_program_table_capacity() {
    let builder = BootmapBuilder::eckd(4096, eckd_geometry());
    let reference = BootmapBuilder::eckd(4096, eckd_geometry());
    let programs: Vec<_> = (0..55).map(|n| Some(Extent::single(100 + n))).collect();
    let device = builder.build(&programs);

    let mut disk = open(&reference, device);
    let table = ProgramTable::read(&mut disk).unwrap();

    assert_eq!(table.len(), 55);
    assert_eq!(table.iter().count(), 55);
    assert_eq!(table.entry(54), Some(reference.pointer(Extent::single(154))));
}

#[test]
fn test_program_table_pointer_must_be_single_block() {
    let reference = BootmapBuilder::scsi(512);
    let mut device = BootmapBuilder::scsi(512).build(&[]);
    let table_block = device.data.len() as u64 / 512 - 2;
    let raw = reference.encode(Some(Extent { block: table_block, count: 1 }));
    device.data[16..32].copy_from_slice(&raw);

    let mut disk = open(&reference, device);
    let err = ProgramTable::read(&mut disk).unwrap_err();
    assert_eq!(err, Error::Format("Error - invalid program table pointer".to_string()));
}

#[test]
fn test_program_table_bad_magic() {
    let reference = BootmapBuilder::scsi(512);
    let mut device = BootmapBuilder::scsi(512).build(&[]);
    let table_block = device.data.len() as u64 / 512 - 2;
    device.block_mut(table_block)[0] = 0;

    let mut disk = open(&reference, device);
    let err = ProgramTable::read(&mut disk).unwrap_err();
    assert_eq!(err.message(), "Error - invalid magic number in program table");
}

#[test]
fn test_component_table() {
    let mut builder = BootmapBuilder::eckd(4096, eckd_geometry());
    let kernel = builder.add_component(&[1u8; 100], 1);
    let table = builder.add_component_table(
        0,
        &[
            (Some(kernel), TYPE_LOAD, 0x10000),
            (None, TYPE_EXECUTE, 0x0008_0000_8001_0000),
        ],
    );
    let table_ptr = builder.pointer(table);
    let kernel_ptr = builder.pointer(kernel);
    let reference = BootmapBuilder::eckd(4096, eckd_geometry());
    let device = builder.build(&[Some(table)]);

    let mut disk = open(&reference, device);
    let table = ComponentTable::read(&mut disk, &table_ptr).unwrap();

    assert_eq!(table.ipl_type, IplType::Ordinary);
    assert_eq!(table.entries[0].segment_ptr, Some(kernel_ptr));
    assert_eq!(table.entries[0].kind, Some(ComponentKind::Load));
    assert_eq!(table.entries[0].address, 0x10000);
    assert_eq!(table.entries[1].kind, Some(ComponentKind::Execute));
    assert_eq!(table.entries[1].load_psw(), 0x0008_0000_8001_0000);
    assert_eq!(table.entries[2].kind, None);
    assert_eq!(table.execute_index(), Some(1));
}

#[test]
fn test_component_table_pointer_must_be_single_block() {
    let mut builder = BootmapBuilder::fba();
    let table = builder.add_component_table(0, &[]);
    let ptr = builder.pointer(Extent { block: table.block, count: 1 });
    let reference = BootmapBuilder::fba();
    let device = builder.build(&[Some(table)]);

    let mut disk = open(&reference, device);
    let err = ComponentTable::read(&mut disk, &ptr).unwrap_err();
    assert_eq!(err.message(), "Error - invalid component table pointer");
}

#[test]
fn test_component_table_bad_magic() {
    let mut builder = BootmapBuilder::fba();
    let table = builder.add_component_table(0, &[]);
    let ptr = builder.pointer(table);
    let reference = BootmapBuilder::fba();
    let mut device = builder.build(&[Some(table)]);
    device.block_mut(table.block)[1] = b'X';

    let mut disk = open(&reference, device);
    let err = ComponentTable::read(&mut disk, &ptr).unwrap_err();
    assert_eq!(err.message(), "Error - invalid magic number in component table");
}

#[test]
fn test_component_table_invalid_pointer() {
    let reference = BootmapBuilder::fba();
    let device = BootmapBuilder::fba().build(&[]);
    let mut disk = open(&reference, device);

    let beyond = reference.pointer(Extent::single(1 << 20));
    let err = ComponentTable::read(&mut disk, &beyond).unwrap_err();
    assert_eq!(err.message(), "Error reading block from disk - invalid block pointer");
}
