//! Parsing the context-policy string set into a [`ContextPolicy`]: the
//! same token set (`"0-cfa"`, `"1-cfa"`, ..., `"1c1o"`) across, with an
//! unrecognized token becoming a `PtaError` rather than a panic.

use crate::domain::ContextPolicy;
use crate::errors::{PtaError, PtaResult};

/// Parse a policy token, e.g. `"0-cfa"`, `"2-cfa"`, `"1-obj"`, `"2-type"`,
/// `"1-rcv"`, `"1c1o"` (hybrid: 1 call-string site, 1 object depth).
pub fn parse_policy(token: &str) -> PtaResult<ContextPolicy> {
    let token = token.trim();
    if token == "0-cfa" {
        return Ok(ContextPolicy::Insensitive);
    }
    if let Some(k) = token.strip_suffix("-cfa") {
        let k: u8 = k.parse().map_err(|_| PtaError::unknown_policy(token))?;
        return Ok(ContextPolicy::CallString(k));
    }
    if let Some(k) = token.strip_suffix("-obj") {
        let k: u8 = k.parse().map_err(|_| PtaError::unknown_policy(token))?;
        return Ok(ContextPolicy::Object(k));
    }
    if let Some(k) = token.strip_suffix("-type") {
        let k: u8 = k.parse().map_err(|_| PtaError::unknown_policy(token))?;
        return Ok(ContextPolicy::Type(k));
    }
    if let Some(k) = token.strip_suffix("-rcv") {
        let k: u8 = k.parse().map_err(|_| PtaError::unknown_policy(token))?;
        return Ok(ContextPolicy::Receiver(k));
    }
    if let Some(rest) = parse_hybrid(token) {
        return Ok(rest);
    }
    Err(PtaError::unknown_policy(token))
}

/// `"<call_k>c<obj_depth>o"`, e.g. `"1c1o"`, `"2c0o"`.
fn parse_hybrid(token: &str) -> Option<ContextPolicy> {
    let c_pos = token.find('c')?;
    let o_pos = token.find('o')?;
    if o_pos <= c_pos + 1 || !token.ends_with('o') {
        return None;
    }
    let call_k: u8 = token[..c_pos].parse().ok()?;
    let obj_depth: u8 = token[c_pos + 1..o_pos].parse().ok()?;
    Some(ContextPolicy::Hybrid { call_k, obj_depth })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insensitive() {
        assert!(matches!(parse_policy("0-cfa").unwrap(), ContextPolicy::Insensitive));
    }

    #[test]
    fn parses_call_string() {
        assert!(matches!(parse_policy("2-cfa").unwrap(), ContextPolicy::CallString(2)));
    }

    #[test]
    fn parses_object_and_type_and_receiver() {
        assert!(matches!(parse_policy("1-obj").unwrap(), ContextPolicy::Object(1)));
        assert!(matches!(parse_policy("2-type").unwrap(), ContextPolicy::Type(2)));
        assert!(matches!(parse_policy("1-rcv").unwrap(), ContextPolicy::Receiver(1)));
    }

    #[test]
    fn parses_hybrid() {
        match parse_policy("1c1o").unwrap() {
            ContextPolicy::Hybrid { call_k, obj_depth } => {
                assert_eq!(call_k, 1);
                assert_eq!(obj_depth, 1);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn rejects_unknown_token() {
        assert!(parse_policy("2-fca").is_err());
        assert!(parse_policy("").is_err());
    }
}
