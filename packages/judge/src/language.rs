//! Fixed mapping between language names and Judge0 language ids.

/// Supported languages: (canonical name, Judge0 id).
pub const LANGUAGES: &[(&str, u32)] = &[("JAVA", 62), ("PYTHON", 70), ("C++", 52)];

/// Judge0 id for a language name. Lookup is case-insensitive and ignores
/// surrounding whitespace.
pub fn language_id(name: &str) -> Option<u32> {
    let name = name.trim();
    LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}

/// Canonical name for a Judge0 language id.
pub fn language_name(id: u32) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(_, known)| *known == id)
        .map(|(name, _)| *name)
}

/// Canonical (upper-case) name and id for a language name.
pub fn canonical_language(name: &str) -> Option<(&'static str, u32)> {
    let id = language_id(name)?;
    language_name(id).map(|canonical| (canonical, id))
}
