pub(crate) struct UpPrompt {
    pub title: String,
    pub description: String,
}

pub(crate) fn make_credential_prompt(rp_id: &str, rp_name: Option<&str>, user_display: Option<&str>) -> UpPrompt {
    let site = match rp_name {
        Some(name) => format!("{name} ({rp_id})"),
        None => rp_id.to_string(),
    };
    let account = user_display.unwrap_or("(unknown)");
    UpPrompt {
        title: "passkey-custody".to_string(),
        description: format!("Create passkey\n\nSite: {site}\nAccount: {account}\n\nPress OK to create, or Cancel to deny."),
    }
}

pub(crate) fn get_assertion_prompt(rp_id: &str, user_display: Option<&str>, blob_write: bool) -> UpPrompt {
    let account = user_display.unwrap_or("(unknown)");
    let action = if blob_write {
        "Store data in passkey"
    } else {
        "Use passkey"
    };
    UpPrompt {
        title: "passkey-custody".to_string(),
        description: format!("{action}\n\nSite: {rp_id}\nAccount: {account}\n\nPress OK to continue, or Cancel to deny."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_credential_prompt_names_site() {
        let p = make_credential_prompt("example.com", Some("Example"), Some("Alice"));
        assert!(p.description.contains("Example (example.com)"));
        assert!(p.description.contains("Alice"));
    }

    #[test]
    fn test_get_assertion_prompt_flags_blob_write() {
        let write = get_assertion_prompt("example.com", None, true);
        let plain = get_assertion_prompt("example.com", None, false);
        assert!(write.description.starts_with("Store data in passkey"));
        assert!(plain.description.starts_with("Use passkey"));
        assert!(plain.description.contains("(unknown)"));
    }
}
