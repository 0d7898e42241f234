use std::fmt;
use std::str::FromStr;

/// The nine languages a summary can be produced in. The declaration order is
/// the menu order users pick from by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Hindi,
    English,
    Marathi,
    Tamil,
    Telugu,
    Bengali,
    Gujarati,
    Kannada,
    Punjabi,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::Hindi,
        Language::English,
        Language::Marathi,
        Language::Tamil,
        Language::Telugu,
        Language::Bengali,
        Language::Gujarati,
        Language::Kannada,
        Language::Punjabi,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::Hindi => "hi",
            Language::English => "en",
            Language::Marathi => "mr",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
            Language::Kannada => "kn",
            Language::Punjabi => "pa",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Hindi => "हिंदी (Hindi)",
            Language::English => "English",
            Language::Marathi => "मराठी (Marathi)",
            Language::Tamil => "தமிழ் (Tamil)",
            Language::Telugu => "తెలుగు (Telugu)",
            Language::Bengali => "বাংলা (Bengali)",
            Language::Gujarati => "ગુજરાતી (Gujarati)",
            Language::Kannada => "ಕನ್ನಡ (Kannada)",
            Language::Punjabi => "ਪੰਜਾਬੀ (Punjabi)",
        }
    }

    /// Parse a chat reply as a menu position (1-9).
    pub fn from_menu_choice(reply: &str) -> Option<Language> {
        let choice: usize = reply.trim().parse().ok()?;
        if (1..=Self::ALL.len()).contains(&choice) {
            Some(Self::ALL[choice - 1])
        } else {
            None
        }
    }

    /// Numbered selection menu sent to the user after transcription.
    pub fn menu() -> String {
        let mut menu = String::from("🌐 *Select your preferred language:*\n\n");
        for (i, language) in Self::ALL.iter().enumerate() {
            menu.push_str(&format!("{}. {}\n", i + 1, language.display_name()));
        }
        menu.push_str("\nReply with the number (1-9)");
        menu
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hi" => Ok(Language::Hindi),
            "en" => Ok(Language::English),
            "mr" => Ok(Language::Marathi),
            "ta" => Ok(Language::Tamil),
            "te" => Ok(Language::Telugu),
            "bn" => Ok(Language::Bengali),
            "gu" => Ok(Language::Gujarati),
            "kn" => Ok(Language::Kannada),
            "pa" => Ok(Language::Punjabi),
            _ => Err(format!("Unsupported language code: {}", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
