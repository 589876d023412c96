use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use super::error::DecodeError;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// URL-safe alphabet, padding optional
pub const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
/// Standard alphabet, padding optional
pub const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Decode base64 text, URL-safe alphabet first and the standard one as fallback.
///
/// Line breaks and surrounding whitespace are ignored; subscription payloads
/// are frequently wrapped at 76 columns.
pub fn base64_decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    URL_SAFE_LENIENT
        .decode(&cleaned)
        .or_else(|_| STANDARD_LENIENT.decode(&cleaned))
        .map_err(|e| DecodeError::Base64(e.to_string()))
}

pub fn base64_decode_str(input: &str) -> Result<String, DecodeError> {
    let bytes = base64_decode(input)?;
    String::from_utf8(bytes).map_err(|e| DecodeError::Base64(e.to_string()))
}

/// Base64 for SSR parameter values: re-pad to a multiple of four, then decode.
pub fn base64_decode_padded(input: &str) -> Result<String, DecodeError> {
    let mut padded = input.trim().to_string();
    let rem = padded.len() % 4;
    if rem != 0 {
        padded.push_str(&"=".repeat(4 - rem));
    }
    base64_decode_str(&padded)
}

/// Query-style unescape: `+` is a space, `%XX` is a byte.
///
/// Malformed escapes leave the input untouched.
pub fn percent_decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Split `host:port`, accepting `[v6]:port`.
pub fn parse_host_port(s: &str) -> Result<(String, u16), DecodeError> {
    let (host, port_str) = if let Some(rest) = s.strip_prefix('[') {
        let end = rest.find(']').ok_or(DecodeError::MissingSeparator(']'))?;
        let port_str = rest[end + 1..]
            .strip_prefix(':')
            .ok_or(DecodeError::MissingSeparator(':'))?;
        (&rest[..end], port_str)
    } else {
        s.rsplit_once(':').ok_or(DecodeError::MissingSeparator(':'))?
    };
    Ok((host.to_string(), parse_port(port_str)?))
}

pub fn parse_port(s: &str) -> Result<u16, DecodeError> {
    let s = s.trim();
    s.parse::<u16>()
        .map_err(|_| DecodeError::InvalidPort(s.to_string()))
}

/// Parse go-ini style booleans; anything unrecognized is `None`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "y" | "YES" | "yes" | "Yes" | "ON" | "on"
        | "On" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "n" | "NO" | "no" | "No" | "OFF"
        | "off" | "Off" => Some(false),
        _ => None,
    }
}
