use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap()
});

/// Replace `${ENV_VAR}` placeholders with process environment values.
///
/// Unresolvable variables are left as-is so validation can point at them.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Replace `${ENV_VAR}` placeholders using a custom lookup.
pub fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(input, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Names of `${VAR}` placeholders still present after substitution.
#[must_use]
pub fn unresolved_vars(input: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .collect()
}
