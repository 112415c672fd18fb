/// RFC 1071 internet checksum, as used by the IP and ICMP headers.
///
/// The buffer is summed as big-endian 16-bit words. An odd trailing byte is
/// padded with a zero byte for the summation only. Carries above bit 15 are
/// folded back into the low 16 bits until none remain, and the one's
/// complement of the folded sum is returned.
pub(crate) fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for word in chunks.by_ref() {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// A buffer with the correct checksum embedded sums to zero.
pub(crate) fn verify(data: &[u8]) -> bool {
    internet_checksum(data) == 0
}
