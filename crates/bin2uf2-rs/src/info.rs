use std::{collections::BTreeSet, fs, path::Path};

use bin2uf2_core::{
    reader::{mask_announcement, read_blocks},
    uf2::{
        Uf2Block, MASK_BLOCK_REPLICAS, UF2_FLAG_FAMILY_ID_PRESENT, UF2_FLAG_FILE_CONTAINER,
        UF2_FLAG_MD5_PRESENT, UF2_FLAG_NOT_MAIN_FLASH,
    },
    Bin2Uf2Error, Family,
};
use log::{info, warn};

const FLAG_NAMES: &[(u32, &str)] = &[
    (UF2_FLAG_NOT_MAIN_FLASH, "not-main-flash"),
    (UF2_FLAG_FILE_CONTAINER, "file-container"),
    (UF2_FLAG_FAMILY_ID_PRESENT, "family-id"),
    (UF2_FLAG_MD5_PRESENT, "md5"),
];

fn flag_names(flags: u32) -> Vec<&'static str> {
    FLAG_NAMES
        .iter()
        .filter(|(flag, _)| flags & flag != 0)
        .map(|(_, name)| *name)
        .collect()
}

fn family_name(id: u32) -> String {
    match Family::from_id(id) {
        Some(family) => format!("{:?} ({:#010x})", family, id),
        None => format!("{:#010x}", id),
    }
}

/// First and one-past-last address covered by `blocks`.
fn address_span(blocks: &[Uf2Block]) -> Option<(u64, u64)> {
    let start = blocks.iter().map(|b| b.header.target_addr.get() as u64).min()?;
    let end = blocks
        .iter()
        .map(|b| b.header.target_addr.get() as u64 + b.header.payload_size.get() as u64)
        .max()?;
    Some((start, end))
}

pub fn info(input_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input_path).map_err(Bin2Uf2Error::FailedToRead)?;
    let blocks = read_blocks(&bytes)?;

    info!("{}: {} blocks", input_path.display(), blocks.len());

    for (index, block) in blocks.iter().enumerate() {
        if block.header.block_no.get() as usize != index
            || block.header.num_blocks.get() as usize != blocks.len()
        {
            warn!(
                "Block {} is numbered {} / {}",
                index,
                block.header.block_no.get(),
                block.header.num_blocks.get()
            );
        }
    }

    let flags: BTreeSet<_> = blocks
        .iter()
        .flat_map(|b| flag_names(b.header.flags.get()))
        .collect();
    if !flags.is_empty() {
        info!("Flags: {}", flags.into_iter().collect::<Vec<_>>().join(", "));
    }

    let families: BTreeSet<_> = blocks.iter().filter_map(Uf2Block::family_id).collect();
    for family in families {
        info!("Family: {}", family_name(family));
    }

    let data = match mask_announcement(&blocks) {
        Some(announcement) => {
            info!(
                "Mask announcement at {:#010x}: {:#010x}",
                announcement.address, announcement.mask
            );
            &blocks[MASK_BLOCK_REPLICAS..]
        }
        None => &blocks[..],
    };

    if let Some((start, end)) = address_span(data) {
        let payload: u64 = data.iter().map(|b| b.payload().len() as u64).sum();
        info!(
            "Data: {:#010x}..{:#010x}, {} bytes in {} blocks",
            start,
            end,
            payload,
            data.len()
        );
    }

    Ok(())
}
