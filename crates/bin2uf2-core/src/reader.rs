use zerocopy::FromBytes;

use crate::{
    uf2::{Uf2Block, MASK_BLOCK_REPLICAS, UF2_BLOCK_SIZE, UF2_DATA_SIZE},
    Bin2Uf2Error,
};

/// A mask announcement found at the start of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskAnnouncement {
    pub address: u32,
    pub mask: u32,
}

/// Parses a UF2 stream back into its blocks, checking framing but not numbering.
pub fn read_blocks(bytes: &[u8]) -> Result<Vec<Uf2Block>, Bin2Uf2Error> {
    if bytes.len() % UF2_BLOCK_SIZE != 0 {
        return Err(Bin2Uf2Error::TruncatedBlock(bytes.len() / UF2_BLOCK_SIZE));
    }

    bytes
        .chunks_exact(UF2_BLOCK_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let block = Uf2Block::read_from_bytes(chunk)
                .map_err(|_| Bin2Uf2Error::TruncatedBlock(index))?;

            if !block.has_valid_magic() {
                return Err(Bin2Uf2Error::BadMagic(index));
            }

            let size = block.header.payload_size.get();
            if size as usize > UF2_DATA_SIZE {
                return Err(Bin2Uf2Error::PayloadTooLarge { block: index, size });
            }

            Ok(block)
        })
        .collect()
}

/// Looks for the run of identical 4 byte blocks that opens a stream with a mask announcement.
pub fn mask_announcement(blocks: &[Uf2Block]) -> Option<MaskAnnouncement> {
    let leading = blocks.get(..MASK_BLOCK_REPLICAS)?;
    let first = &leading[0];
    let payload: [u8; 4] = first.payload().try_into().ok()?;

    let same = leading.iter().all(|block| {
        block.header.target_addr.get() == first.header.target_addr.get()
            && block.payload() == payload
    });

    // A data block at the same address would make this an image, not an announcement.
    let followed_by_data = blocks
        .get(MASK_BLOCK_REPLICAS)
        .map_or(true, |next| next.header.target_addr.get() != first.header.target_addr.get());

    if same && followed_by_data {
        Some(MaskAnnouncement {
            address: first.header.target_addr.get(),
            mask: u32::from_le_bytes(payload),
        })
    } else {
        None
    }
}
