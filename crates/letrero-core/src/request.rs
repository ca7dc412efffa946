//! Form extraction from raw HTTP request bytes.
//!
//! Any request carrying `msg=` anywhere is treated as a form submission,
//! whatever its method or path.

use core::str;

use heapless::String;

use crate::message::{CapacityError, MessageText};

/// Bytes read from a connection in a single receive.
pub const REQUEST_BUFFER_BYTES: usize = 1024;

/// Marker of the form field carrying the new text.
pub const FORM_FIELD: &str = "msg=";

/// Returns the longest valid UTF-8 prefix of the received bytes.
///
/// A fixed-size read can cut a multi-byte character in half.
pub fn request_text(bytes: &[u8]) -> &str {
    match str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
    }
}

pub fn is_form_submission(request: &str) -> bool {
    request.contains(FORM_FIELD)
}

/// Raw (still encoded) value following the first `msg=`, up to the next space.
pub fn form_value(request: &str) -> Option<&str> {
    let start = request.find(FORM_FIELD)? + FORM_FIELD.len();
    let rest = &request[start..];
    let end = rest.find(' ').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Extracts and decodes the submitted message.
///
/// `Ok(None)` means a plain page fetch.
pub fn extract_message(request: &str) -> Result<Option<MessageText>, CapacityError> {
    let Some(raw) = form_value(request) else {
        return Ok(None);
    };

    let mut decoded = MessageText::new();
    percent_decode(raw, &mut decoded)?;
    Ok(Some(decoded))
}

/// Form-decodes `input` into `out`.
///
/// `+` becomes a space and `%XX` the character with code point `0xXX`. A `%`
/// not followed by two hex digits is copied through unchanged.
pub fn percent_decode<const N: usize>(
    input: &str,
    out: &mut String<N>,
) -> Result<(), CapacityError> {
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        let decoded = match c {
            '+' => ' ',
            '%' => {
                let rest = chars.as_str();
                match decode_hex_pair(rest.as_bytes()) {
                    Some(byte) => {
                        // Both digits are ASCII, so index 2 is a char boundary.
                        chars = rest[2..].chars();
                        char::from(byte)
                    }
                    None => '%',
                }
            }
            other => other,
        };

        out.push(decoded).map_err(|_| CapacityError)?;
    }

    Ok(())
}

fn decode_hex_pair(bytes: &[u8]) -> Option<u8> {
    let high = hex_value(*bytes.first()?)?;
    let low = hex_value(*bytes.get(1)?)?;
    Some((high << 4) | low)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
