//! Credential redaction for connection strings.
//!
//! Connection strings arrive from callers and may embed passwords. Nothing
//! derived from them may reach logs or error responses unredacted.

use url::Url;

const MASK: &str = "****";

/// Masks the password of a connection URL.
///
/// Unparseable input is replaced entirely, since its credential layout is
/// unknown.
pub fn redact_connection_string(connection_string: &str) -> String {
    match Url::parse(connection_string) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some(MASK));
            }
            parsed.to_string()
        }
        Err(_) => "<redacted>".to_string(),
    }
}

/// Removes every trace of `connection_string` from a driver message.
///
/// Replaces the full string, its redacted form's original, and the password
/// (raw and percent-decoded) wherever they occur.
pub fn scrub(message: &str, connection_string: &str) -> String {
    let mut out = message.to_string();
    if !connection_string.is_empty() {
        out = out.replace(connection_string, &redact_connection_string(connection_string));
    }

    if let Ok(parsed) = Url::parse(connection_string) {
        if let Some(password) = parsed.password().filter(|p| !p.is_empty()) {
            out = out.replace(password, MASK);
            if let Ok(decoded) = urlencoding::decode(password) {
                if !decoded.is_empty() {
                    out = out.replace(decoded.as_ref(), MASK);
                }
            }
        }
    }
    out
}
