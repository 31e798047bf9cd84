//! Prefix bindings and IRI resolution.

use std::collections::BTreeMap;

use serde::Serialize;

/// Prefix → namespace bindings for one document.
///
/// Built fresh for every parse; nothing is shared between calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PrefixMap {
    bindings: BTreeMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` (without the colon; `""` is the empty prefix).
    /// Returns the previous namespace when the prefix is rebound.
    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Option<String> {
        self.bindings.insert(prefix.into(), namespace.into())
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.bindings.contains_key(prefix)
    }

    /// Expand `prefix:local` into a full IRI.
    pub fn expand(&self, prefix: &str, local: &str) -> Option<String> {
        self.namespace(prefix).map(|ns| join_namespace(ns, local))
    }

    /// Expand a `prefix:local` string.
    pub fn expand_curie(&self, curie: &str) -> Option<String> {
        let (prefix, local) = curie.split_once(':')?;
        self.expand(prefix, local)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Append a local name to a namespace.
///
/// Namespaces ending in `#`, `/`, `:` or `?`/`=` are concatenated directly;
/// anything else gets a `#` separator so `<http://ex.org/onto>` and
/// `<http://ex.org/onto#>` produce the same IRIs.
pub fn join_namespace(namespace: &str, local: &str) -> String {
    match namespace.chars().last() {
        None | Some('#' | '/' | ':' | '?' | '=') => format!("{}{}", namespace, local),
        Some(_) => format!("{}#{}", namespace, local),
    }
}

/// True when `iri` starts with a URI scheme (`http:`, `urn:`, ...).
pub fn is_absolute(iri: &str) -> bool {
    let Some((scheme, _)) = iri.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolve `reference` against an optional base IRI.
///
/// Handles the forms that appear in practice: fragment-only (`#x`),
/// absolute-path (`/x`), and relative-path (`x`) references. Without a base the
/// reference is returned unchanged.
pub fn resolve_iri(base: Option<&str>, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_string();
    }
    let Some(base) = base else {
        return reference.to_string();
    };
    if reference.is_empty() {
        return base.to_string();
    }

    if reference.starts_with('#') {
        let without_fragment = base.split('#').next().unwrap_or(base);
        return format!("{}{}", without_fragment, reference);
    }

    if let Some(rest) = reference.strip_prefix("//") {
        let scheme = base.split(':').next().unwrap_or("http");
        return format!("{}://{}", scheme, rest);
    }

    if reference.starts_with('/') {
        // scheme://authority
        if let Some(idx) = base.find("://") {
            let after = &base[idx + 3..];
            let authority_end = after.find('/').map(|i| idx + 3 + i).unwrap_or(base.len());
            return format!("{}{}", &base[..authority_end], reference);
        }
        return reference.to_string();
    }

    let without_fragment = base.split('#').next().unwrap_or(base);
    let authority_start = without_fragment.find("://").map(|i| i + 3).unwrap_or(0);
    match without_fragment.rfind('/') {
        Some(idx) if idx >= authority_start => {
            format!("{}{}", &without_fragment[..=idx], reference)
        }
        _ => format!("{}/{}", without_fragment, reference),
    }
}
