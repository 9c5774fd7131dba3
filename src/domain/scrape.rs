use serde::{Deserialize, Serialize};

/// Minimum number of characters a source must produce before its text is used.
pub const USABLE_TEXT_FLOOR: usize = 100;

/// Output of a single menu source (restaurant website or map page).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub text: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<BrandColors>,
}

impl ScrapeResult {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// The text of this result, if it reaches the usable floor.
    pub fn usable_text(&self, floor: usize) -> Option<&str> {
        let text = self.text.trim();
        (text.chars().count() >= floor).then_some(text)
    }
}

/// Primary/secondary/accent color triple, always as `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl BrandColors {
    /// Build a palette from sampled CSS colors in priority order.
    ///
    /// Unparseable, transparent, pure white and pure black samples are skipped
    /// and duplicates collapse. Missing slots reuse the previous color, so a
    /// single usable sample fills the whole triple.
    pub fn from_samples<S: AsRef<str>>(samples: &[S]) -> Option<Self> {
        let mut palette: Vec<String> = Vec::new();
        for sample in samples {
            let Some(color) = normalize_color(sample.as_ref()) else {
                continue;
            };
            if color == "#ffffff" || color == "#000000" || palette.contains(&color) {
                continue;
            }
            palette.push(color);
        }

        let primary = palette.first()?.clone();
        let secondary = palette.get(1).cloned().unwrap_or_else(|| primary.clone());
        let accent = palette.get(2).cloned().unwrap_or_else(|| secondary.clone());
        Some(Self {
            primary,
            secondary,
            accent,
        })
    }
}

/// Normalize `#rgb`, `#rrggbb`, `rgb(...)` and `rgba(...)` into `#rrggbb`.
pub fn normalize_color(raw: &str) -> Option<String> {
    let raw = raw.trim().to_ascii_lowercase();

    if let Some(hex) = raw.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            3 => Some(hex.chars().fold(String::from("#"), |mut acc, c| {
                acc.push(c);
                acc.push(c);
                acc
            })),
            6 => Some(format!("#{hex}")),
            _ => None,
        };
    }

    let inner = raw
        .strip_prefix("rgba(")
        .or_else(|| raw.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    if let Some(alpha) = parts.get(3) {
        let alpha: f32 = alpha.trim_end_matches('%').parse().ok()?;
        if alpha == 0.0 {
            return None;
        }
    }

    let mut hex = String::from("#");
    for part in &parts[..3] {
        let value: f32 = part.parse().ok()?;
        hex.push_str(&format!("{:02x}", value.clamp(0.0, 255.0).round() as u8));
    }
    Some(hex)
}

/// Merged output of both sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedContent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<BrandColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_url: Option<String>,
}

impl CombinedContent {
    pub fn has_branding(&self) -> bool {
        self.logo.as_deref().is_some_and(|l| !l.is_empty()) || self.colors.is_some()
    }
}

/// Everything a scrape run produced, kept per source for debugging.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub website: Option<ScrapeResult>,
    pub map: Option<ScrapeResult>,
    pub combined: CombinedContent,
    /// Whether the website contributed usable text.
    pub has_website_content: bool,
}
