use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Languages the assistant can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Telugu,
    Tamil,
    Kannada,
    Malayalam,
    Bengali,
    Marathi,
    Gujarati,
    Punjabi,
    Urdu,
    Odia,
    Assamese,
    Sanskrit,
}

impl Language {
    pub const ALL: [Language; 14] = [
        Language::English,
        Language::Hindi,
        Language::Telugu,
        Language::Tamil,
        Language::Kannada,
        Language::Malayalam,
        Language::Bengali,
        Language::Marathi,
        Language::Gujarati,
        Language::Punjabi,
        Language::Urdu,
        Language::Odia,
        Language::Assamese,
        Language::Sanskrit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Telugu => "telugu",
            Language::Tamil => "tamil",
            Language::Kannada => "kannada",
            Language::Malayalam => "malayalam",
            Language::Bengali => "bengali",
            Language::Marathi => "marathi",
            Language::Gujarati => "gujarati",
            Language::Punjabi => "punjabi",
            Language::Urdu => "urdu",
            Language::Odia => "odia",
            Language::Assamese => "assamese",
            Language::Sanskrit => "sanskrit",
        }
    }

    /// Two-letter code understood by the translation service.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Telugu => "te",
            Language::Tamil => "ta",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Bengali => "bn",
            Language::Marathi => "mr",
            Language::Gujarati => "gu",
            Language::Punjabi => "pa",
            Language::Urdu => "ur",
            Language::Odia => "or",
            Language::Assamese => "as",
            Language::Sanskrit => "sa",
        }
    }

    pub fn is_english(self) -> bool {
        self == Language::English
    }

    /// Lenient lookup: unknown names resolve to English.
    pub fn from_name_or_default(name: &str) -> Language {
        name.parse().unwrap_or(Language::English)
    }
}

impl FromStr for Language {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.name() == wanted)
            .ok_or(ApiError::UnsupportedLanguage(wanted))
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
