use clap::ValueEnum;

use crate::block::BlockTag;

/// Flash offset where image data begins unless told otherwise.
pub const DEFAULT_BASE_ADDRESS: u32 = 0x10040000;

/// Flash offset of the mask announcement unless told otherwise.
pub const DEFAULT_MASK_ADDRESS: u32 = 0x1003F000;

/// Raw mask address that turns the mask announcement off.
pub const MASK_ADDRESS_DISABLED: u32 = 0xFFFFFFFF;

// See https://github.com/microsoft/uf2/blob/master/utils/uf2families.json for list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum Family {
    /// Raspberry Pi RP2040
    RP2040 = 0xe48bff56,

    /// Raspberry Pi Microcontrollers: Absolute (unpartitioned) download
    RP2XXX_ABSOLUTE = 0xe48bff57,

    /// Raspberry Pi Microcontrollers: Data partition download
    RP2XXX_DATA = 0xe48bff58,

    /// Raspberry Pi RP2350, Secure Arm image
    RP2350_ARM_S = 0xe48bff59,

    /// Raspberry Pi RP2350, RISC-V image
    RP2350_RISCV = 0xe48bff5a,

    /// Raspberry Pi RP2350, Non-secure Arm image
    RP2350_ARM_NS = 0xe48bff5b,
}

impl Default for Family {
    fn default() -> Self {
        Self::RP2040
    }
}

impl Family {
    pub fn from_id(id: u32) -> Option<Self> {
        Self::value_variants()
            .iter()
            .copied()
            .find(|family| *family as u32 == id)
    }
}

/// Everything the conversion needs to know besides the image itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Flash address of the first image byte.
    pub base_address: u32,
    /// Where the mask announcement goes, `None` leaves it out.
    pub mask_address: Option<u32>,
    /// Family ID stamped on every block. Without one the header carries the image size instead.
    pub family: Option<Family>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_address: DEFAULT_BASE_ADDRESS,
            mask_address: Some(DEFAULT_MASK_ADDRESS),
            family: Some(Family::default()),
        }
    }
}

impl Config {
    /// Image sizes that do not fit the header word saturate to `u32::MAX`.
    pub fn block_tag(&self, image_len: usize) -> BlockTag {
        match self.family {
            Some(family) => BlockTag::FamilyId(family as u32),
            None => BlockTag::FileSize(u32::try_from(image_len).unwrap_or(u32::MAX)),
        }
    }
}

pub fn mask_address_from_raw(raw: u32) -> Option<u32> {
    if raw == MASK_ADDRESS_DISABLED {
        None
    } else {
        Some(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_disables_mask() {
        assert_eq!(mask_address_from_raw(MASK_ADDRESS_DISABLED), None);
        assert_eq!(
            mask_address_from_raw(DEFAULT_MASK_ADDRESS),
            Some(DEFAULT_MASK_ADDRESS)
        );
        assert_eq!(mask_address_from_raw(0), Some(0));
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.base_address, 0x10040000);
        assert_eq!(config.mask_address, Some(0x1003F000));
        assert_eq!(config.block_tag(300), BlockTag::FamilyId(0xe48bff56));
    }

    #[test]
    fn file_size_without_family() {
        let config = Config {
            family: None,
            ..Config::default()
        };
        assert_eq!(config.block_tag(300), BlockTag::FileSize(300));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn file_size_saturates() {
        let config = Config {
            family: None,
            ..Config::default()
        };
        assert_eq!(
            config.block_tag(u32::MAX as usize),
            BlockTag::FileSize(u32::MAX)
        );
        assert_eq!(config.block_tag(1 << 32), BlockTag::FileSize(u32::MAX));
    }

    #[test]
    fn family_lookup() {
        assert_eq!(Family::from_id(0xe48bff5a), Some(Family::RP2350_RISCV));
        assert_eq!(Family::from_id(0x68ed2b88), None);
    }
}
