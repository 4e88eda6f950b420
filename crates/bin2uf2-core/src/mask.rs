/// Returns `P - 1` where `P` is the smallest power of two not below `file_length`.
///
/// Empty and single byte images both get a mask of zero. Anything longer than `1 << 32`
/// saturates to `u32::MAX`, the whole 32-bit address space.
pub fn address_mask(file_length: u64) -> u32 {
    if file_length == 0 {
        return 0;
    }
    if file_length > 1 << 32 {
        return u32::MAX;
    }

    let mut n = file_length - 1;
    let mut bits = 0;
    while n != 0 {
        n >>= 1;
        bits += 1;
    }

    ((1u64 << bits) - 1) as u32
}
