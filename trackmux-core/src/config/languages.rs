//! Language priority tiers.
//!
//! A tier is an equivalence class of language tags: the ISO 639-1 code, both
//! ISO 639-2 codes and the English name of one language all land in the same
//! tier, so `fr`, `fra`, `fre` and `French` rank identically. Tags are only
//! ever compared against tiers, never against each other.

use std::fmt;

/// (English name, ISO 639-1, ISO 639-2/T, ISO 639-2/B)
const LANGUAGE_TABLE: &[(&str, &str, &str, &str)] = &[
    ("arabic", "ar", "ara", "ara"),
    ("chinese", "zh", "zho", "chi"),
    ("czech", "cs", "ces", "cze"),
    ("danish", "da", "dan", "dan"),
    ("dutch", "nl", "nld", "dut"),
    ("english", "en", "eng", "eng"),
    ("finnish", "fi", "fin", "fin"),
    ("french", "fr", "fra", "fre"),
    ("german", "de", "deu", "ger"),
    ("greek", "el", "ell", "gre"),
    ("hebrew", "he", "heb", "heb"),
    ("hindi", "hi", "hin", "hin"),
    ("hungarian", "hu", "hun", "hun"),
    ("italian", "it", "ita", "ita"),
    ("japanese", "ja", "jpn", "jpn"),
    ("korean", "ko", "kor", "kor"),
    ("norwegian", "no", "nor", "nor"),
    ("polish", "pl", "pol", "pol"),
    ("portuguese", "pt", "por", "por"),
    ("romanian", "ro", "ron", "rum"),
    ("russian", "ru", "rus", "rus"),
    ("spanish", "es", "spa", "spa"),
    ("swedish", "sv", "swe", "swe"),
    ("thai", "th", "tha", "tha"),
    ("turkish", "tr", "tur", "tur"),
    ("ukrainian", "uk", "ukr", "ukr"),
    ("vietnamese", "vi", "vie", "vie"),
];

/// Tags that explicitly declare the language as unknown.
const UNDETERMINED_TAGS: &[&str] = &["und", "unk", "unknown", "mis", "zxx"];

/// Default target language.
pub const DEFAULT_TARGET_LANGUAGE: &str = "fr";

fn normalize(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Every spelling equivalent to `tag`. Unknown tags map to themselves.
#[must_use]
pub fn language_equivalents(tag: &str) -> Vec<String> {
    let needle = normalize(tag);
    LANGUAGE_TABLE
        .iter()
        .find(|(name, iso1, iso2t, iso2b)| {
            [*name, *iso1, *iso2t, *iso2b].contains(&needle.as_str())
        })
        .map(|(name, iso1, iso2t, iso2b)| {
            let mut tags = vec![iso1.to_string(), iso2t.to_string()];
            if iso2b != iso2t {
                tags.push(iso2b.to_string());
            }
            tags.push(name.to_string());
            tags
        })
        .unwrap_or_else(|| vec![needle])
}

/// One rank in the priority list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTier {
    pub label: String,
    tags: Vec<String>,
}

impl PriorityTier {
    /// Tier holding every spelling of `language`.
    pub fn for_language(language: &str) -> Self {
        Self {
            label: normalize(language),
            tags: language_equivalents(language),
        }
    }

    /// Tier with an explicit tag set.
    pub fn with_tags<I, S>(label: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            label: label.into(),
            tags: tags.into_iter().map(|t| normalize(t.as_ref())).collect(),
        }
    }

    /// Placeholder tier that matches nothing until configured.
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tags: Vec::new(),
        }
    }

    /// Case-insensitive, whitespace-trimmed membership test.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        let needle = normalize(tag);
        !needle.is_empty() && self.tags.iter().any(|t| *t == needle)
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Ordered tier list for one stream kind. Lower rank is higher priority.
///
/// Layout: target language, original language (placeholder unless set), each
/// secondary language in the order given, explicit "undetermined" tags. Any
/// tag outside these tiers, and a missing tag, gets [`Self::fallback_rank`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePriority {
    tiers: Vec<PriorityTier>,
}

impl LanguagePriority {
    pub fn new(target: &str, original: Option<&str>, secondary: &[String]) -> Self {
        let mut tiers = Vec::with_capacity(secondary.len() + 3);
        tiers.push(PriorityTier::for_language(target));
        tiers.push(match original {
            Some(lang) if !lang.trim().is_empty() => PriorityTier::for_language(lang),
            _ => PriorityTier::empty("original"),
        });
        tiers.extend(
            secondary
                .iter()
                .filter(|lang| !lang.trim().is_empty())
                .map(|lang| PriorityTier::for_language(lang)),
        );
        tiers.push(PriorityTier::with_tags("undetermined", UNDETERMINED_TAGS));
        Self { tiers }
    }

    /// Builds a priority list from arbitrary tiers; the first is the target.
    pub fn from_tiers(tiers: Vec<PriorityTier>) -> Self {
        Self { tiers }
    }

    /// Rank of a language tag: index of the first tier that contains it.
    #[must_use]
    pub fn rank(&self, tag: Option<&str>) -> usize {
        tag.and_then(|t| self.tiers.iter().position(|tier| tier.matches(t)))
            .unwrap_or_else(|| self.fallback_rank())
    }

    /// Rank shared by untagged and unmatched streams.
    #[must_use]
    pub fn fallback_rank(&self) -> usize {
        self.tiers.len()
    }

    #[must_use]
    pub fn tiers(&self) -> &[PriorityTier] {
        &self.tiers
    }

    /// Label of the highest-priority tier.
    #[must_use]
    pub fn target_label(&self) -> &str {
        self.tiers.first().map_or("", |t| t.label.as_str())
    }
}

impl Default for LanguagePriority {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_LANGUAGE, None, &[])
    }
}

impl fmt::Display for LanguagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self
            .tiers
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.label.as_str())
            .collect();
        write!(f, "{}", labels.join(" > "))
    }
}
