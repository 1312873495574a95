//! Text for native platform error codes.
//!
//! The hardware runtime reports failures as raw numeric codes.  The session
//! shows a message next to the code; this table covers the codes a virtual
//! controller realistically returns.

/// Platform code for an invalid device handle.
pub const ERROR_INVALID_HANDLE: u32 = 6;

/// Platform code for a device that is present but not connected.
pub const ERROR_DEVICE_NOT_CONNECTED: u32 = 1167;

/// Returns a human-readable message for a platform error `code`.
///
/// Codes outside the table render as `"Unknown error (N)"`.
pub fn platform_error_message(code: u32) -> String {
    let text = match code {
        0 => "The operation completed successfully.",
        1 => "Incorrect function.",
        2 => "The system cannot find the file specified.",
        5 => "Access is denied.",
        ERROR_INVALID_HANDLE => "The handle is invalid.",
        8 => "Not enough memory resources are available to process this command.",
        21 => "The device is not ready.",
        31 => "A device attached to the system is not functioning.",
        87 => "The parameter is incorrect.",
        121 => "The semaphore timeout period has expired.",
        ERROR_DEVICE_NOT_CONNECTED => "The device is not connected.",
        other => return format!("Unknown error ({other})"),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_has_fixed_text() {
        assert_eq!(platform_error_message(5), "Access is denied.");
        assert_eq!(platform_error_message(ERROR_INVALID_HANDLE), "The handle is invalid.");
    }

    #[test]
    fn test_unknown_code_includes_number() {
        assert_eq!(platform_error_message(4242), "Unknown error (4242)");
    }
}
