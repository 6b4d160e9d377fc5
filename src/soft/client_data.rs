use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

pub(crate) const TYPE_CREATE: &str = "webauthn.create";
pub(crate) const TYPE_GET: &str = "webauthn.get";

/// Serialize collected client data the way browsers do: `type`, `challenge`,
/// `origin`, `crossOrigin`, in that order and without whitespace.
pub(crate) fn collect_client_data(ty: &str, challenge: &[u8], origin: &str) -> Vec<u8> {
    let origin = serde_json::Value::String(origin.to_string());
    format!(
        r#"{{"type":"{ty}","challenge":"{}","origin":{origin},"crossOrigin":false}}"#,
        URL_SAFE_NO_PAD.encode(challenge),
    )
    .into_bytes()
}

/// Effective domain of an origin such as `https://example.com:8443`.
pub(crate) fn origin_host(origin: &str) -> &str {
    let rest = origin.split_once("://").map_or(origin, |(_, rest)| rest);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    host.rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map_or(host, |(h, _)| h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_data_layout() {
        let cd = collect_client_data(TYPE_GET, &[0u8; 32], "https://example.com");
        let text = String::from_utf8(cd).unwrap();
        assert_eq!(
            text,
            r#"{"type":"webauthn.get","challenge":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA","origin":"https://example.com","crossOrigin":false}"#
        );
    }

    #[test]
    fn test_client_data_is_valid_json() {
        let cd = collect_client_data(TYPE_CREATE, b"abc", "https://we\"ird");
        let v: serde_json::Value = serde_json::from_slice(&cd).unwrap();
        assert_eq!(v["type"], "webauthn.create");
        assert_eq!(v["origin"], "https://we\"ird");
    }

    #[test]
    fn test_origin_host() {
        assert_eq!(origin_host("https://example.com"), "example.com");
        assert_eq!(origin_host("https://localhost:8443"), "localhost");
        assert_eq!(origin_host("https://a.example.com/path?q"), "a.example.com");
        assert_eq!(origin_host("example.org"), "example.org");
    }
}
