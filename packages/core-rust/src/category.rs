//! Category records and category-family resolution.
//!
//! Category families drive the hard-coded override rules. A family is
//! resolved once from the main category slug; slug substring matching is
//! only a fallback for legacy category ids that predate the canonical slugs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Canonical slug of the board games main category.
pub const BOARD_GAMES_SLUG: &str = "kutu-oyunlari";
/// Canonical slug of the consoles main category.
pub const CONSOLES_SLUG: &str = "konsollar";
/// Canonical slug of the handheld consoles main category.
pub const HANDHELDS_SLUG: &str = "el-konsollari";

/// Category family tag selecting the override rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryFamily {
    /// Board games: player counts and game name.
    BoardGames,
    /// Home consoles (also holds some handhelds historically).
    Consoles,
    /// Handheld consoles.
    Handhelds,
    /// No override rules.
    Generic,
}

impl CategoryFamily {
    /// Resolves the family from a main category slug.
    #[must_use]
    pub fn resolve(main_slug: &str) -> Self {
        let slug = main_slug.trim().to_lowercase();
        match slug.as_str() {
            BOARD_GAMES_SLUG => Self::BoardGames,
            CONSOLES_SLUG => Self::Consoles,
            HANDHELDS_SLUG => Self::Handhelds,
            _ => Self::from_legacy_slug(&slug),
        }
    }

    /// Substring matching for legacy slugs such as `kutu-oyunu` or `oyun-konsolu`.
    fn from_legacy_slug(slug: &str) -> Self {
        if slug.contains("kutu") || slug.contains("board") {
            Self::BoardGames
        } else if slug.contains("el-konsol") || slug.contains("handheld") {
            Self::Handhelds
        } else if slug.contains("konsol") || slug.contains("console") {
            Self::Consoles
        } else {
            Self::Generic
        }
    }

    /// Whether the console field set applies.
    #[must_use]
    pub fn has_console_fields(self) -> bool {
        matches!(self, Self::Consoles | Self::Handhelds)
    }
}

/// Console sub-category group, used for per-field visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsoleGroup {
    PlayStation,
    Xbox,
    Nintendo,
    Retro,
    Vr,
    /// Spare parts and repair services.
    PartsService,
    Other,
}

/// Sub-category ids with a known group.
const CONSOLE_GROUPS: &[(&str, ConsoleGroup)] = &[
    ("konsollar__playstation", ConsoleGroup::PlayStation),
    ("konsollar__xbox", ConsoleGroup::Xbox),
    ("konsollar__nintendo", ConsoleGroup::Nintendo),
    ("konsollar__retro", ConsoleGroup::Retro),
    ("konsollar__vr", ConsoleGroup::Vr),
    ("konsollar__parca-servis", ConsoleGroup::PartsService),
    ("konsollar__handheld", ConsoleGroup::Other),
    ("konsollar__diger", ConsoleGroup::Other),
    ("el-konsollari__nintendo", ConsoleGroup::Nintendo),
    ("el-konsollari__sony", ConsoleGroup::PlayStation),
    ("el-konsollari__pc", ConsoleGroup::Other),
    ("el-konsollari__retro", ConsoleGroup::Retro),
    ("el-konsollari__parca-servis", ConsoleGroup::PartsService),
];

impl ConsoleGroup {
    /// Resolves the group of a console sub-category.
    ///
    /// Exact id lookup first, then substring matching for legacy ids.
    /// Parts/service wins over brand words so `parca-playstation` is a
    /// parts listing.
    #[must_use]
    pub fn resolve(sub_category_id: Option<&str>) -> Self {
        let Some(id) = sub_category_id.map(|s| s.trim().to_lowercase()) else {
            return Self::Other;
        };
        if let Some((_, group)) = CONSOLE_GROUPS.iter().find(|(known, _)| *known == id) {
            return *group;
        }

        if ["parca", "parça", "servis", "service", "tamir", "parts"]
            .iter()
            .any(|w| id.contains(w))
        {
            Self::PartsService
        } else if id.contains("playstation") || id.contains("sony") {
            Self::PlayStation
        } else if id.contains("xbox") || id.contains("microsoft") {
            Self::Xbox
        } else if id.contains("nintendo") {
            Self::Nintendo
        } else if id.contains("retro") || id.contains("klasik") {
            Self::Retro
        } else if id.ends_with("__vr") || id.contains("sanal-gerceklik") {
            Self::Vr
        } else {
            Self::Other
        }
    }
}

/// A category or sub-category record from the category collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Document id; for main categories this is the slug.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Pre-folded lower-case name, when the writer stored one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_lower: Option<String>,
    /// Parent category id; `None` for main categories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Disabled categories are invisible.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Explicit sort position.
    #[serde(default)]
    pub order: i64,
}

fn default_enabled() -> bool {
    true
}

impl Category {
    /// Family of this category when used as a main category.
    #[must_use]
    pub fn family(&self) -> CategoryFamily {
        CategoryFamily::resolve(&self.id)
    }

    fn sort_name(&self) -> String {
        self.name_lower
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| turkish_lowercase(&self.name))
    }
}

/// Returns the enabled categories under `parent` (main categories for `None`),
/// sorted by `order` and then by Turkish-collated name.
#[must_use]
pub fn visible_sorted(categories: &[Category], parent: Option<&str>) -> Vec<Category> {
    let mut visible: Vec<(Vec<u32>, &Category)> = categories
        .iter()
        .filter(|c| c.enabled && c.parent_id.as_deref() == parent)
        .map(|c| (collation_key(&c.sort_name()), c))
        .collect();

    visible.sort_by(|(ka, a), (kb, b)| match a.order.cmp(&b.order) {
        Ordering::Equal => ka.cmp(kb),
        other => other,
    });

    visible.into_iter().map(|(_, c)| c.clone()).collect()
}

/// Lower-cases with Turkish dotted/dotless I rules.
#[must_use]
pub fn turkish_lowercase(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'I' => 'ı',
            'İ' => 'i',
            other => other,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

const TURKISH_ALPHABET: &str = "abcçdefgğhıijklmnoöprsştuüvyz";

/// Sort key placing Turkish letters in alphabet order. Other characters
/// sort by code point; digits and punctuation come first.
fn collation_key(lower: &str) -> Vec<u32> {
    lower
        .chars()
        .map(|c| match TURKISH_ALPHABET.chars().position(|a| a == c) {
            // Alphabet has 29 letters; the cast cannot truncate.
            #[allow(clippy::cast_possible_truncation)]
            Some(pos) => 0x10_0000 + pos as u32,
            None if c.is_alphabetic() => 0x20_0000 + u32::from(c),
            None => u32::from(c),
        })
        .collect()
}
