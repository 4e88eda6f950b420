use assert_into::AssertInto;
use log::*;
use zerocopy::IntoBytes;

use crate::uf2::{
    Uf2Block, MASK_BLOCK_REPLICAS, PAYLOAD_SIZE, UF2_BLOCK_SIZE, UF2_FLAG_FAMILY_ID_PRESENT,
};

/// What the last header word of every block carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    FamilyId(u32),
    FileSize(u32),
}

impl BlockTag {
    fn flags(self) -> u32 {
        match self {
            BlockTag::FamilyId(_) => UF2_FLAG_FAMILY_ID_PRESENT,
            BlockTag::FileSize(_) => 0,
        }
    }

    fn value(self) -> u32 {
        match self {
            BlockTag::FamilyId(id) => id,
            BlockTag::FileSize(size) => size,
        }
    }
}

/// One payload destined for `target_addr`, not yet placed in a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    target_addr: u32,
    payload: Vec<u8>,
}

impl Block {
    pub fn new(target_addr: u32, payload: &[u8]) -> Self {
        assert!(
            payload.len() <= PAYLOAD_SIZE,
            "payload of {} bytes exceeds block capacity",
            payload.len()
        );

        Self {
            target_addr,
            payload: payload.to_vec(),
        }
    }

    pub fn target_addr(&self) -> u32 {
        self.target_addr
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_len(&self) -> u32 {
        self.payload.len().assert_into()
    }
}

/// Splits `image` into blocks laid out from `base_address` onwards.
///
/// Callers make sure the image fits below the end of the 32-bit address space.
pub fn data_blocks(image: &[u8], base_address: u32) -> Vec<Block> {
    image
        .chunks(PAYLOAD_SIZE)
        .enumerate()
        .map(|(chunk_no, chunk)| {
            let offset: u32 = (chunk_no * PAYLOAD_SIZE).assert_into();
            Block::new(base_address + offset, chunk)
        })
        .collect()
}

/// The mask announcement, one sector worth of identical blocks at `mask_address`.
pub fn mask_blocks(mask_address: u32, mask: u32) -> Vec<Block> {
    vec![Block::new(mask_address, &mask.to_le_bytes()); MASK_BLOCK_REPLICAS]
}

/// A block together with its place in the finished stream.
#[derive(Debug, Clone, Copy)]
pub struct NumberedBlock<'a> {
    pub block: &'a Block,
    pub block_no: u32,
    pub num_blocks: u32,
}

impl NumberedBlock<'_> {
    pub fn encode(&self, tag: BlockTag) -> Uf2Block {
        Uf2Block::new(
            tag.flags(),
            self.block.target_addr,
            self.block_no,
            self.num_blocks,
            tag.value(),
            &self.block.payload,
        )
    }
}

/// The complete, ordered list of blocks for one output file.
///
/// Numbering only exists here, so nothing can be encoded before the total is known.
#[derive(Debug, Clone, Default)]
pub struct BlockSequence {
    blocks: Vec<Block>,
}

impl BlockSequence {
    /// Mask blocks go first, data blocks follow.
    pub fn new(mask_blocks: Vec<Block>, data_blocks: Vec<Block>) -> Self {
        let mut blocks = mask_blocks;
        blocks.extend(data_blocks);
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NumberedBlock<'_>> {
        let num_blocks: u32 = self.blocks.len().assert_into();
        self.blocks
            .iter()
            .enumerate()
            .map(move |(block_no, block)| NumberedBlock {
                block,
                block_no: block_no.assert_into(),
                num_blocks,
            })
    }

    /// Serializes every block, in order, into one buffer.
    pub fn encode(&self, tag: BlockTag) -> Vec<u8> {
        let mut output = Vec::with_capacity(self.blocks.len() * UF2_BLOCK_SIZE);

        for numbered in self.iter() {
            debug!(
                "Block {} / {} {:#010x} ({} bytes)",
                numbered.block_no,
                numbered.num_blocks,
                numbered.block.target_addr,
                numbered.block.payload.len()
            );

            output.extend_from_slice(numbered.encode(tag).as_bytes());
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_blocks_split_at_capacity() {
        let image: Vec<u8> = (0..600u32).map(|i| i as u8).collect();
        let blocks = data_blocks(&image, 0x10040000);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].target_addr(), 0x10040000);
        assert_eq!(blocks[1].target_addr(), 0x10040100);
        assert_eq!(blocks[2].target_addr(), 0x10040200);
        assert_eq!(blocks[0].payload_len(), 256);
        assert_eq!(blocks[2].payload_len(), 88);
        assert_eq!(blocks[2].payload(), &image[512..]);

        let last = blocks.last().unwrap();
        assert_eq!(last.target_addr() + last.payload_len(), 0x10040000 + 600);
    }

    #[test]
    fn data_blocks_exact_multiple() {
        let blocks = data_blocks(&[0xff; 512], 0);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.payload_len() == 256));
    }

    #[test]
    fn empty_image_has_no_data_blocks() {
        assert!(data_blocks(&[], 0x10040000).is_empty());
    }

    #[test]
    fn mask_blocks_are_identical() {
        let blocks = mask_blocks(0x1003F000, 511);

        assert_eq!(blocks.len(), 16);
        for block in &blocks {
            assert_eq!(block, &blocks[0]);
            assert_eq!(block.target_addr(), 0x1003F000);
            assert_eq!(block.payload(), &[0xff, 0x01, 0x00, 0x00]);
        }
    }

    #[test]
    fn sequence_numbers_whole_stream() {
        let sequence = BlockSequence::new(mask_blocks(0x1003F000, 511), data_blocks(&[1; 300], 0));

        assert_eq!(sequence.len(), 18);
        for (expected, numbered) in sequence.iter().enumerate() {
            assert_eq!(numbered.block_no as usize, expected);
            assert_eq!(numbered.num_blocks, 18);
        }

        let first_data = sequence.iter().nth(16).unwrap();
        assert_eq!(first_data.block.target_addr(), 0);
    }

    #[test]
    fn encode_uses_tag() {
        let sequence = BlockSequence::new(Vec::new(), data_blocks(&[7; 10], 0x2000));

        let tagged = sequence.encode(BlockTag::FamilyId(0xe48bff56));
        assert_eq!(tagged.len(), UF2_BLOCK_SIZE);
        assert_eq!(&tagged[8..12], &UF2_FLAG_FAMILY_ID_PRESENT.to_le_bytes());
        assert_eq!(&tagged[28..32], &0xe48bff56u32.to_le_bytes());

        let sized = sequence.encode(BlockTag::FileSize(10));
        assert_eq!(&sized[8..12], &[0, 0, 0, 0]);
        assert_eq!(&sized[28..32], &[10, 0, 0, 0]);
        assert_eq!(&sized[16..20], &[10, 0, 0, 0]);
        assert_eq!(&sized[32..42], &[7; 10]);
    }

    #[test]
    #[should_panic]
    fn oversized_payload() {
        Block::new(0, &[0; PAYLOAD_SIZE + 1]);
    }
}
