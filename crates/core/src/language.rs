//! Response languages.

use std::fmt::{self, Display};

/// A language the reply can be rendered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Language {
    /// English name, as shown in the selector.
    pub name: &'static str,
    /// ISO 639-1 code.
    pub code: &'static str,
}

impl Language {
    const fn new(name: &'static str, code: &'static str) -> Self {
        Self { name, code }
    }

    /// Whether this is the language the model answers in, so the reply
    /// needs no translation.
    #[inline]
    pub fn is_default(&self) -> bool {
        self.code == DEFAULT_LANGUAGE.code
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// The language replies arrive in.
pub const DEFAULT_LANGUAGE: Language = Language::new("English", "en");

/// Every selectable response language, in selector order.
pub const LANGUAGES: [Language; 17] = [
    DEFAULT_LANGUAGE,
    Language::new("Hindi", "hi"),
    Language::new("Bengali", "bn"),
    Language::new("Telugu", "te"),
    Language::new("Tamil", "ta"),
    Language::new("Gujarati", "gu"),
    Language::new("Kannada", "kn"),
    Language::new("Punjabi", "pa"),
    Language::new("Odia", "or"),
    Language::new("Malayalam", "ml"),
    Language::new("Spanish", "es"),
    Language::new("French", "fr"),
    Language::new("German", "de"),
    Language::new("Italian", "it"),
    Language::new("Portuguese", "pt"),
    Language::new("Arabic", "ar"),
    Language::new("Russian", "ru"),
];

/// Looks a language up by code or by (case-insensitive) name.
pub fn find_language(query: &str) -> Option<&'static Language> {
    let query = query.trim();
    LANGUAGES.iter().find(|language| {
        language.code.eq_ignore_ascii_case(query)
            || language.name.eq_ignore_ascii_case(query)
    })
}
