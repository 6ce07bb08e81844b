/// Resolve a sender against the receiver allow-list.
///
/// Matching is case-insensitive and ignores a leading `@` on either side.
/// Returns the alias as written in the allow-list so that every map keyed by
/// alias sees one spelling. An empty allow-list admits nobody.
#[must_use]
pub fn resolve_alias<'a>(sender: &str, allowlist: &'a [String]) -> Option<&'a str> {
    let sender = normalize(sender);
    if sender.is_empty() {
        return None;
    }
    allowlist
        .iter()
        .map(String::as_str)
        .find(|entry| normalize(entry) == sender)
}

/// `true` if the sender appears in the allow-list.
#[must_use]
pub fn is_allowed(sender: &str, allowlist: &[String]) -> bool {
    resolve_alias(sender, allowlist).is_some()
}

fn normalize(alias: &str) -> String {
    alias.trim().trim_start_matches('@').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> Vec<String> {
        vec!["Alice".into(), "@bob".into()]
    }

    #[test]
    fn empty_allowlist_admits_nobody() {
        assert!(!is_allowed("anyone", &[]));
    }

    #[test]
    fn exact_match_case_insensitive() {
        assert_eq!(resolve_alias("alice", &list()), Some("Alice"));
        assert_eq!(resolve_alias("ALICE", &list()), Some("Alice"));
        assert!(!is_allowed("charlie", &list()));
    }

    #[test]
    fn at_prefix_ignored() {
        assert_eq!(resolve_alias("bob", &list()), Some("@bob"));
        assert_eq!(resolve_alias("@alice", &list()), Some("Alice"));
    }

    #[test]
    fn no_prefix_matching() {
        assert!(!is_allowed("ali", &list()));
        assert!(!is_allowed("alice2", &list()));
        assert!(!is_allowed("", &list()));
    }
}
