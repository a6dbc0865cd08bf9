use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemeError {
    #[error("unsupported URI scheme in {0}")]
    Unsupported(String),
    #[error("bad data URI")]
    BadDataUri,
}

/// Where the bytes behind a glTF URI live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Scheme<'a> {
    // Data uri with optional mime type
    Data(Option<&'a str>, Vec<u8>),
    // Percent decoded path relative to the document
    Relative(String),
    // Percent decoded absolute path
    Absolute(String),
}

fn has_prefix(uri: &str, prefix: &str) -> bool {
    uri.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim.
pub(crate) fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn decode_path(path: &str) -> String {
    String::from_utf8_lossy(&percent_decode(path)).into_owned()
}

impl<'a> TryFrom<&'a str> for Scheme<'a> {
    type Error = SchemeError;

    fn try_from(uri: &'a str) -> Result<Self, Self::Error> {
        if !uri.contains(':') {
            return Ok(Scheme::Relative(decode_path(uri)));
        }
        if has_prefix(uri, "data:") {
            // Data URI: rfc2397
            let content = &uri[5..];
            let Some((param, value)) = content.split_once(',') else {
                return Err(SchemeError::BadDataUri);
            };
            match param.split_once(';') {
                Some((mime, encoding)) if encoding.eq_ignore_ascii_case("base64") => {
                    let data = STANDARD
                        .decode(value)
                        .map_err(|_| SchemeError::BadDataUri)?;
                    let mime = (!mime.is_empty()).then_some(mime);
                    Ok(Scheme::Data(mime, data))
                }
                Some(_) => Err(SchemeError::BadDataUri),
                // Plain payload, mime is left to content sniffing
                None => Ok(Scheme::Data(None, percent_decode(value))),
            }
        } else if has_prefix(uri, "file://") {
            Ok(Scheme::Absolute(decode_path(&uri[7..])))
        } else if has_prefix(uri, "file:") {
            Ok(Scheme::Absolute(decode_path(&uri[5..])))
        } else {
            Err(SchemeError::Unsupported(uri.to_string()))
        }
    }
}
