//! Supported target languages and language-tag matching.

use serde::Serialize;

/// A selectable target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    /// BCP 47 tag, e.g. `"en-US"`, `"fr-FR"`.
    pub code: &'static str,

    /// Display name.
    pub name: &'static str,
}

/// Languages offered in the session UI. The first entry is the default.
pub const LANGUAGES: &[Language] = &[
    Language { code: "en-US", name: "English" },
    Language { code: "es-ES", name: "Spanish" },
    Language { code: "fr-FR", name: "French" },
    Language { code: "de-DE", name: "German" },
    Language { code: "it-IT", name: "Italian" },
    Language { code: "pt-BR", name: "Portuguese" },
    Language { code: "nl-NL", name: "Dutch" },
    Language { code: "pl-PL", name: "Polish" },
    Language { code: "tr-TR", name: "Turkish" },
    Language { code: "ru-RU", name: "Russian" },
    Language { code: "ja-JP", name: "Japanese" },
    Language { code: "ko-KR", name: "Korean" },
    Language { code: "zh-CN", name: "Chinese" },
    Language { code: "ar-SA", name: "Arabic" },
    Language { code: "hi-IN", name: "Hindi" },
];

/// Primary subtag of a BCP 47 tag: `"fr-FR"` → `"fr"`.
///
/// Used for best-effort voice matching — a `"fr-CA"` voice is an acceptable
/// match for a `"fr-FR"` target.
#[must_use]
pub fn primary_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}
