use assert_into::AssertInto;
use static_assertions::const_assert;
use std::mem;
use zerocopy::{
    byteorder::little_endian::U32, FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned,
};

pub const UF2_MAGIC_START0: u32 = 0x0A324655;
pub const UF2_MAGIC_START1: u32 = 0x9E5D5157;
pub const UF2_MAGIC_END: u32 = 0x0AB16F30;

pub const UF2_FLAG_NOT_MAIN_FLASH: u32 = 0x00000001;
pub const UF2_FLAG_FILE_CONTAINER: u32 = 0x00001000;
pub const UF2_FLAG_FAMILY_ID_PRESENT: u32 = 0x00002000;
pub const UF2_FLAG_MD5_PRESENT: u32 = 0x00004000;

pub const UF2_BLOCK_SIZE: usize = 512;
pub const UF2_DATA_SIZE: usize = 476;

/// Bytes of image data carried by each block. The data area is larger, the rest is zero padding.
pub const PAYLOAD_SIZE: usize = 256;

/// Erase granularity of the target flash.
pub const FLASH_SECTOR_SIZE: usize = 4096;

/// The mask announcement is repeated until it covers one whole flash sector.
pub const MASK_BLOCK_REPLICAS: usize = FLASH_SECTOR_SIZE / PAYLOAD_SIZE;

pub type Uf2BlockData = [u8; UF2_DATA_SIZE];

#[repr(C)]
#[derive(Clone, Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Uf2BlockHeader {
    pub magic_start0: U32,
    pub magic_start1: U32,
    pub flags: U32,
    pub target_addr: U32,
    pub payload_size: U32,
    pub block_no: U32,
    pub num_blocks: U32,
    pub file_size: U32, // or familyID
}

#[repr(C)]
#[derive(Clone, Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Uf2BlockFooter {
    pub magic_end: U32,
}

#[repr(C)]
#[derive(Clone, Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Uf2Block {
    pub header: Uf2BlockHeader,
    pub data: Uf2BlockData,
    pub footer: Uf2BlockFooter,
}

const_assert!(mem::size_of::<Uf2BlockHeader>() == 32);
const_assert!(mem::size_of::<Uf2Block>() == UF2_BLOCK_SIZE);
const_assert!(PAYLOAD_SIZE <= UF2_DATA_SIZE);
const_assert!(FLASH_SECTOR_SIZE == MASK_BLOCK_REPLICAS * PAYLOAD_SIZE);

impl Uf2Block {
    /// Builds a block with all magics in place and the data area zeroed.
    pub fn new(
        flags: u32,
        target_addr: u32,
        block_no: u32,
        num_blocks: u32,
        file_size: u32,
        payload: &[u8],
    ) -> Self {
        assert!(payload.len() <= UF2_DATA_SIZE);

        let mut data: Uf2BlockData = [0; UF2_DATA_SIZE];
        data[..payload.len()].copy_from_slice(payload);

        Self {
            header: Uf2BlockHeader {
                magic_start0: U32::new(UF2_MAGIC_START0),
                magic_start1: U32::new(UF2_MAGIC_START1),
                flags: U32::new(flags),
                target_addr: U32::new(target_addr),
                payload_size: U32::new(payload.len().assert_into()),
                block_no: U32::new(block_no),
                num_blocks: U32::new(num_blocks),
                file_size: U32::new(file_size),
            },
            data,
            footer: Uf2BlockFooter {
                magic_end: U32::new(UF2_MAGIC_END),
            },
        }
    }

    pub fn has_valid_magic(&self) -> bool {
        self.header.magic_start0.get() == UF2_MAGIC_START0
            && self.header.magic_start1.get() == UF2_MAGIC_START1
            && self.footer.magic_end.get() == UF2_MAGIC_END
    }

    pub fn family_id(&self) -> Option<u32> {
        if self.header.flags.get() & UF2_FLAG_FAMILY_ID_PRESENT != 0 {
            Some(self.header.file_size.get())
        } else {
            None
        }
    }

    /// The valid part of the data area.
    ///
    /// Panics if `payload_size` is larger than the data area, [`crate::reader::read_blocks`]
    /// rejects such blocks.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.header.payload_size.get() as usize]
    }
}
