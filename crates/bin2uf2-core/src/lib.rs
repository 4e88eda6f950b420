use crate::{
    block::{data_blocks, mask_blocks, BlockSequence, BlockTag},
    config::Config,
    mask::address_mask,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

use assert_into::AssertInto;
use log::*;
use thiserror::Error;

pub mod block;
pub mod config;
pub mod mask;
pub mod reader;
pub mod uf2;

pub use config::Family;

#[derive(Error, Debug)]
pub enum Bin2Uf2Error {
    #[error("Failed to read input")]
    FailedToRead(std::io::Error),
    #[error("Failed to write to output")]
    FailedToWrite(std::io::Error),
    #[error("Image of {len} bytes at {base_address:#010x} runs past the end of the address space")]
    ImageTooLarge { base_address: u32, len: usize },
    #[error("Unable to derive an output path from {0:?}")]
    NoOutputPath(PathBuf),
    #[error("Block {0} is truncated")]
    TruncatedBlock(usize),
    #[error("Block {0} has bad magic numbers")]
    BadMagic(usize),
    #[error("Block {block} claims a payload of {size} bytes")]
    PayloadTooLarge { block: usize, size: u32 },
}

/// Lays out `image` as a numbered block stream, mask announcement first when configured.
pub fn build_block_sequence(image: &[u8], config: &Config) -> Result<BlockSequence, Bin2Uf2Error> {
    let end = config.base_address as u64 + image.len() as u64;
    if end > 1 << 32 {
        return Err(Bin2Uf2Error::ImageTooLarge {
            base_address: config.base_address,
            len: image.len(),
        });
    }

    let mask = address_mask(image.len().assert_into());
    debug!("Address mask for {} bytes is {:#010x}", image.len(), mask);

    let mask_blocks = match config.mask_address {
        Some(mask_address) => mask_blocks(mask_address, mask),
        None => {
            debug!("Mask announcement disabled");
            Vec::new()
        }
    };

    Ok(BlockSequence::new(
        mask_blocks,
        data_blocks(image, config.base_address),
    ))
}

/// Serializes the whole sequence and hands it to `output` in one write.
pub fn write_output(
    sequence: &BlockSequence,
    tag: BlockTag,
    mut output: impl Write,
) -> Result<(), Bin2Uf2Error> {
    let bytes = sequence.encode(tag);

    output
        .write_all(&bytes)
        .map_err(Bin2Uf2Error::FailedToWrite)?;
    output.flush().map_err(Bin2Uf2Error::FailedToWrite)
}

/// Converts a flat binary into a uf2 stream, returning the number of blocks written.
pub fn bin2uf2(
    image: &[u8],
    output: impl Write,
    config: &Config,
) -> Result<usize, Bin2Uf2Error> {
    let sequence = build_block_sequence(image, config)?;
    write_output(&sequence, config.block_tag(image.len()), output)?;
    Ok(sequence.len())
}

/// The uf2 file that sits next to `input`.
pub fn output_path(input: &Path) -> Result<PathBuf, Bin2Uf2Error> {
    let no_output_path = || Bin2Uf2Error::NoOutputPath(input.to_owned());

    let file_name = input.file_name().ok_or_else(no_output_path)?;
    let parent = input.parent().ok_or_else(no_output_path)?;

    Ok(parent.join(file_name).with_extension("uf2"))
}
