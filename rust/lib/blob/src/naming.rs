//! Stored-name generation for uploaded files.
//!
//! A stored name is `{unix_millis}-{8 hex chars}-{sanitized original}`,
//! e.g. `1718000000000-3fa9c2d1-service_report.pdf`. The random segment
//! keeps two uploads of the same file in the same millisecond apart.

const MAX_ORIGINAL_LEN: usize = 120;

/// Build a collision-resistant stored name for an uploaded file.
pub fn stored_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let rand = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", millis, &rand[..8], sanitize(original_name))
}

/// Reduce a client-supplied file name to a safe flat name: last path
/// component only, `[A-Za-z0-9._-]` kept, everything else replaced by `_`.
fn sanitize(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.len() != cleaned.len() {
        cleaned = trimmed.to_string();
    }
    if cleaned.len() > MAX_ORIGINAL_LEN {
        let cut = cleaned.len() - MAX_ORIGINAL_LEN;
        cleaned = cleaned[cut..].to_string();
    }
    if cleaned.is_empty() {
        cleaned.push_str("file");
    }
    cleaned
}

/// Whether `name` is acceptable as a flat blob key: non-empty, no path
/// separators, no parent references, not hidden.
pub fn is_valid_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_name_keeps_original_suffix() {
        let name = stored_name("service report.pdf");
        assert!(name.ends_with("-service_report.pdf"), "{}", name);
        let parts: Vec<&str> = name.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().is_ok());
        assert_eq!(parts[1].len(), 8);
        assert!(is_valid_stored_name(&name));
    }

    #[test]
    fn same_original_never_collides() {
        let a = stored_name("photo.jpg");
        let b = stored_name("photo.jpg");
        assert_ne!(a, b);
    }

    #[test]
    fn sanitize_strips_paths_and_hidden_prefix() {
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\Users\\x\\scan.png"), "scan.png");
        assert_eq!(sanitize(".bashrc"), "bashrc");
        assert_eq!(sanitize(""), "file");
        assert_eq!(sanitize("ünï code.txt"), "_n__code.txt");
    }

    #[test]
    fn invalid_names() {
        assert!(!is_valid_stored_name(""));
        assert!(!is_valid_stored_name("a/b"));
        assert!(!is_valid_stored_name("..\\x"));
        assert!(!is_valid_stored_name(".."));
        assert!(!is_valid_stored_name(".hidden"));
        assert!(is_valid_stored_name("1700000000000-abcd1234-x.pdf"));
    }
}
