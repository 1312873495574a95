//! Hex rendering used by the communication log.

/// Renders `bytes` as two lowercase hex digits per byte with no separators.
///
/// # Examples
///
/// ```rust
/// use vhci_core::to_hex;
///
/// assert_eq!(to_hex(&[0x01, 0xAB]), "01ab");
/// assert_eq!(to_hex(&[]), "");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    ::hex::encode(bytes)
}
