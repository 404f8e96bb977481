use anyhow::{Result, anyhow};

/// Canonical CNAME form used in identifiers and API calls: trimmed, no
/// trailing dot, IDNA ASCII, lowercase.
pub fn normalize_cname(input: &str) -> Result<String> {
    let trimmed = input.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(anyhow!("cname is required"));
    }
    let ascii = idna::domain_to_ascii(trimmed)
        .map_err(|err| anyhow!("invalid cname: {err}"))?;
    Ok(ascii.to_lowercase())
}

pub fn normalize_cname_for_display(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('.');
    let (unicode, _) = idna::domain_to_unicode(trimmed);
    unicode.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_cname, normalize_cname_for_display};

    #[test]
    fn normalize_lowercases_and_strips_dot() {
        assert_eq!(normalize_cname("App.Example.COM.").unwrap(), "app.example.com");
    }

    #[test]
    fn normalize_converts_idn_to_ascii() {
        assert_eq!(normalize_cname("testé.example.com").unwrap(), "xn--test-epa.example.com");
    }

    #[test]
    fn normalize_rejects_empty() {
        assert!(normalize_cname("  .").is_err());
        assert!(normalize_cname("").is_err());
    }

    #[test]
    fn display_form_restores_unicode() {
        assert_eq!(
            normalize_cname_for_display("xn--test-epa.example.com"),
            "testé.example.com"
        );
    }
}
