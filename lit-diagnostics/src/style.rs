// Themes: token class -> terminal style

use colored::{Color, ColoredString, Colorize};
use lit_lexer::TokenClass;
use std::collections::HashMap;

/// Terminal style for one token class
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub fg: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub dim: bool,
}

impl Style {
    pub const fn plain() -> Self {
        Self {
            fg: None,
            bold: false,
            italic: false,
            dim: false,
        }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            fg: Some(Color::TrueColor { r, g, b }),
            bold: false,
            italic: false,
            dim: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    /// Apply this style to `text`
    pub fn paint(&self, text: &str) -> ColoredString {
        let mut out = text.normal();
        if let Some(color) = self.fg {
            out = out.color(color);
        }
        if self.bold {
            out = out.bold();
        }
        if self.italic {
            out = out.italic();
        }
        if self.dim {
            out = out.dimmed();
        }
        out
    }
}

/// Anything that can answer "how should this token class look"
pub trait StyleProvider: Send + Sync {
    fn style(&self, class: TokenClass) -> Style;
}

/// Named token-class palette
#[derive(Debug, Clone)]
pub struct Theme {
    name: String,
    styles: HashMap<TokenClass, Style>,
}

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            styles: HashMap::new(),
        }
    }

    pub fn with(mut self, class: TokenClass, style: Style) -> Self {
        self.styles.insert(class, style);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a built-in theme by name (case-insensitive)
    pub fn by_name(name: &str) -> Result<Self, ThemeError> {
        match name.to_ascii_lowercase().as_str() {
            "cyberpunk" => Ok(Self::cyberpunk()),
            "monokai" => Ok(Self::monokai()),
            "dracula" => Ok(Self::dracula()),
            "monochrome" => Ok(Self::monochrome()),
            _ => {
                let candidates: Vec<String> = BUILTIN_THEMES.iter().map(|s| s.to_string()).collect();
                Err(ThemeError::Unknown {
                    name: name.to_string(),
                    suggestions: fuzzy::find_similar_names(name, &candidates, 0.7, 3),
                })
            }
        }
    }

    /// Neon pink, blue and green on dark
    pub fn cyberpunk() -> Self {
        Self::new("cyberpunk")
            .with(TokenClass::Comment, Style::rgb(0x77, 0x77, 0xaa))
            .with(TokenClass::Keyword, Style::rgb(0xff, 0x22, 0x66))
            .with(TokenClass::Constant, Style::rgb(0xff, 0xcc, 0x33))
            .with(TokenClass::Type, Style::rgb(0x00, 0xcc, 0xff))
            .with(TokenClass::Name, Style::rgb(0x00, 0xcc, 0xff))
            .with(TokenClass::Lifetime, Style::rgb(0xff, 0x22, 0x66))
            .with(TokenClass::String, Style::rgb(0x33, 0xff, 0x99))
            .with(TokenClass::Number, Style::rgb(0xff, 0xcc, 0x33))
            .with(TokenClass::Punctuation, Style::rgb(0xee, 0xee, 0xff))
            .with(TokenClass::Operator, Style::rgb(0xff, 0x22, 0x66))
            .with(TokenClass::Error, Style::rgb(0xff, 0x22, 0x66))
    }

    pub fn monokai() -> Self {
        Self::new("monokai")
            .with(TokenClass::Comment, Style::rgb(0x75, 0x71, 0x5e).italic())
            .with(TokenClass::Keyword, Style::rgb(0xf9, 0x26, 0x72))
            .with(TokenClass::Constant, Style::rgb(0xae, 0x81, 0xff))
            .with(TokenClass::Type, Style::rgb(0xa6, 0xe2, 0x2e))
            .with(TokenClass::Name, Style::rgb(0xf8, 0xf8, 0xf2))
            .with(TokenClass::Lifetime, Style::rgb(0xfd, 0x97, 0x1f))
            .with(TokenClass::String, Style::rgb(0xe6, 0xdb, 0x74))
            .with(TokenClass::Number, Style::rgb(0xae, 0x81, 0xff))
            .with(TokenClass::Punctuation, Style::rgb(0xf8, 0xf8, 0xf2))
            .with(TokenClass::Operator, Style::rgb(0xf9, 0x26, 0x72))
            .with(TokenClass::Error, Style::rgb(0xf9, 0x26, 0x72).bold())
    }

    pub fn dracula() -> Self {
        Self::new("dracula")
            .with(TokenClass::Comment, Style::rgb(0x62, 0x72, 0xa4))
            .with(TokenClass::Keyword, Style::rgb(0xff, 0x79, 0xc6))
            .with(TokenClass::Constant, Style::rgb(0xbd, 0x93, 0xf9))
            .with(TokenClass::Type, Style::rgb(0x8b, 0xe9, 0xfd))
            .with(TokenClass::Name, Style::rgb(0xf8, 0xf8, 0xf2))
            .with(TokenClass::Lifetime, Style::rgb(0xff, 0xb8, 0x6c))
            .with(TokenClass::String, Style::rgb(0xf1, 0xfa, 0x8c))
            .with(TokenClass::Number, Style::rgb(0xbd, 0x93, 0xf9))
            .with(TokenClass::Punctuation, Style::rgb(0xf8, 0xf8, 0xf2))
            .with(TokenClass::Operator, Style::rgb(0xff, 0x79, 0xc6))
            .with(TokenClass::Error, Style::rgb(0xff, 0x55, 0x55))
    }

    /// No colour, only weight
    pub fn monochrome() -> Self {
        Self::new("monochrome")
            .with(TokenClass::Keyword, Style::plain().bold())
            .with(TokenClass::Comment, Style::plain().italic())
            .with(TokenClass::Error, Style::plain().bold())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::cyberpunk()
    }
}

impl StyleProvider for Theme {
    fn style(&self, class: TokenClass) -> Style {
        self.styles.get(&class).copied().unwrap_or_default()
    }
}

/// Names accepted by [`Theme::by_name`]
pub const BUILTIN_THEMES: &[&str] = &["cyberpunk", "monokai", "dracula", "monochrome"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThemeError {
    #[error("unknown theme `{name}`{}", did_you_mean(.suggestions))]
    Unknown {
        name: String,
        suggestions: Vec<String>,
    },
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(", did you mean `{}`?", suggestions.join("`, `"))
    }
}

/// Fuzzy matching utilities for "did you mean?" suggestions
pub mod fuzzy {
    use strsim::jaro_winkler;

    /// Find similar names using fuzzy matching (Jaro-Winkler distance)
    /// Returns up to `max_suggestions` names with similarity > threshold
    pub fn find_similar_names(
        target: &str,
        candidates: &[String],
        threshold: f64,
        max_suggestions: usize,
    ) -> Vec<String> {
        let target = target.to_ascii_lowercase();
        let mut scored: Vec<(String, f64)> = candidates
            .iter()
            .map(|candidate| (candidate.clone(), jaro_winkler(&target, candidate)))
            .filter(|(_, score)| *score > threshold)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(max_suggestions)
            .map(|(name, _)| name)
            .collect()
    }
}
