//! Hard-coded per-category field overrides.
//!
//! Board games and consoles carry fixed fields that live outside the
//! per-category schema. An [`OverridePlan`] is resolved from
//! `(main slug, sub-category, console model)` and decides which of those
//! fields are shown and which model names are offered. Every consumer
//! (renderer, validator, serializer, form state) works from the same plan,
//! so resolution must be deterministic.
//!
//! Override-owned keys are removed from the generic schema loop entirely;
//! a schema field with the same key is never rendered, validated or saved.

use std::collections::BTreeSet;

use crate::category::{CategoryFamily, ConsoleGroup};
use crate::schema::FieldType;

/// Input kind of an override field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    /// Free text with an optional character limit.
    Text { max_length: Option<usize> },
    /// Whole number within inclusive bounds.
    Integer { min: i64, max: i64 },
    /// One of a fixed option list.
    Select(&'static [&'static str]),
    /// One of the plan's model options.
    Model,
    /// Yes/no.
    Boolean,
}

impl OverrideKind {
    /// Field type used when coercing the value for persistence.
    #[must_use]
    pub fn field_type(self) -> FieldType {
        match self {
            Self::Text { .. } => FieldType::Text,
            Self::Integer { .. } => FieldType::Number,
            Self::Select(_) | Self::Model => FieldType::Select,
            Self::Boolean => FieldType::Boolean,
        }
    }
}

/// One hard-coded override field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: OverrideKind,
    /// Checked by the override validation pass when the field is visible.
    pub required: bool,
}

pub const GAME_NAME: &str = "gameName";
pub const MIN_PLAYERS: &str = "minPlayers";
pub const MAX_PLAYERS: &str = "maxPlayers";
pub const PLAY_TIME: &str = "playTime";
pub const MIN_AGE: &str = "minAge";

pub const CONSOLE_MODEL: &str = "consoleModel";
pub const STORAGE: &str = "storage";
pub const CONTROLLER_COUNT: &str = "controllerCount";
pub const PURCHASE_YEAR: &str = "purchaseYear";
pub const WARRANTY_STATUS: &str = "warrantyStatus";
pub const USAGE_LEVEL: &str = "usageLevel";
pub const BATTERY_HEALTH: &str = "batteryHealth";
pub const SCREEN_CONDITION: &str = "screenCondition";
pub const STICK_DRIFT: &str = "stickDrift";

/// Fallback when nothing more specific is known for a sub-category.
pub const OTHER_MODEL: &str = "Diğer";

const BOARD_GAME_FIELDS: &[OverrideField] = &[
    OverrideField {
        key: GAME_NAME,
        label: "Oyun adı",
        kind: OverrideKind::Text { max_length: Some(120) },
        required: false,
    },
    OverrideField {
        key: MIN_PLAYERS,
        label: "En az oyuncu",
        kind: OverrideKind::Integer { min: 1, max: 99 },
        required: true,
    },
    OverrideField {
        key: MAX_PLAYERS,
        label: "En fazla oyuncu",
        kind: OverrideKind::Integer { min: 1, max: 99 },
        required: true,
    },
    OverrideField {
        key: PLAY_TIME,
        label: "Oyun süresi",
        kind: OverrideKind::Select(&["30 dk altı", "30-60 dk", "60-120 dk", "120 dk üzeri"]),
        required: false,
    },
    OverrideField {
        key: MIN_AGE,
        label: "Yaş sınırı",
        kind: OverrideKind::Integer { min: 0, max: 99 },
        required: false,
    },
];

const CONSOLE_FIELDS: &[OverrideField] = &[
    OverrideField {
        key: CONSOLE_MODEL,
        label: "Model",
        kind: OverrideKind::Model,
        required: true,
    },
    OverrideField {
        key: STORAGE,
        label: "Depolama",
        kind: OverrideKind::Select(&[
            "Yok", "32 GB", "64 GB", "128 GB", "256 GB", "500 GB", "512 GB", "825 GB", "1 TB",
            "2 TB",
        ]),
        required: false,
    },
    OverrideField {
        key: CONTROLLER_COUNT,
        label: "Kol sayısı",
        kind: OverrideKind::Integer { min: 0, max: 8 },
        required: false,
    },
    OverrideField {
        key: PURCHASE_YEAR,
        label: "Satın alma yılı",
        kind: OverrideKind::Integer { min: 1970, max: 2100 },
        required: false,
    },
    OverrideField {
        key: WARRANTY_STATUS,
        label: "Garanti durumu",
        kind: OverrideKind::Select(&["Garantili", "Garantisi bitmiş", "Bilinmiyor"]),
        required: false,
    },
    OverrideField {
        key: USAGE_LEVEL,
        label: "Kullanım durumu",
        kind: OverrideKind::Select(&["Az kullanılmış", "Orta", "Yoğun"]),
        required: false,
    },
    OverrideField {
        key: BATTERY_HEALTH,
        label: "Pil sağlığı",
        kind: OverrideKind::Select(&["Çok iyi", "İyi", "Orta", "Zayıf"]),
        required: false,
    },
    OverrideField {
        key: SCREEN_CONDITION,
        label: "Ekran durumu",
        kind: OverrideKind::Select(&["Çiziksiz", "Hafif çizik", "Belirgin çizik", "Kırık"]),
        required: false,
    },
    OverrideField {
        key: STICK_DRIFT,
        label: "Analog kayması",
        kind: OverrideKind::Boolean,
        required: false,
    },
];

/// Models that are handheld devices regardless of the category they were
/// filed under. Shared by the consoles and handhelds families.
pub const HANDHELD_MODELS: &[&str] = &[
    "Switch Lite",
    "Switch OLED",
    "Switch",
    "Steam Deck",
    "Steam Deck OLED",
    "ROG Ally",
    "Legion Go",
    "PS Vita",
    "PSP",
    "Nintendo 3DS",
    "Nintendo 2DS",
    "Game Boy Advance",
];

const PLAYSTATION_MODELS: &[&str] = &[
    "PS5 Pro", "PS5", "PS5 Slim", "PS4 Pro", "PS4 Slim", "PS4", "PS3", "PS2", OTHER_MODEL,
];
const XBOX_MODELS: &[&str] = &[
    "Xbox Series X",
    "Xbox Series S",
    "Xbox One X",
    "Xbox One S",
    "Xbox One",
    "Xbox 360",
    OTHER_MODEL,
];
const NINTENDO_MODELS: &[&str] = &["Switch OLED", "Switch", "Switch Lite", "Wii U", "Wii", OTHER_MODEL];
const RETRO_MODELS: &[&str] = &[
    "Atari 2600",
    "Sega Mega Drive",
    "Super Nintendo",
    "Nintendo NES",
    "PlayStation 1",
    OTHER_MODEL,
];
const VR_MODELS: &[&str] = &[
    "PlayStation VR2",
    "PlayStation VR",
    "Meta Quest 3",
    "Meta Quest 2",
    OTHER_MODEL,
];
const FALLBACK_MODELS: &[&str] = &[OTHER_MODEL];

/// Model lists keyed by exact sub-category id.
const MODELS_BY_SUB_CATEGORY: &[(&str, &[&str])] = &[
    ("konsollar__playstation", PLAYSTATION_MODELS),
    ("konsollar__xbox", XBOX_MODELS),
    ("konsollar__nintendo", NINTENDO_MODELS),
    (
        "konsollar__handheld",
        &[
            "Switch Lite",
            "Steam Deck",
            "Steam Deck OLED",
            "ROG Ally",
            "Legion Go",
            "PS Vita",
            "PSP",
            "Nintendo 3DS",
            OTHER_MODEL,
        ],
    ),
    ("konsollar__retro", RETRO_MODELS),
    ("konsollar__vr", VR_MODELS),
    (
        "el-konsollari__nintendo",
        &[
            "Switch Lite",
            "Switch OLED",
            "Switch",
            "Nintendo 3DS",
            "Nintendo 2DS",
            "Game Boy Advance",
            OTHER_MODEL,
        ],
    ),
    (
        "el-konsollari__pc",
        &["Steam Deck", "Steam Deck OLED", "ROG Ally", "Legion Go", OTHER_MODEL],
    ),
    ("el-konsollari__sony", &["PS Vita", "PSP", OTHER_MODEL]),
];

/// Which toggleable console fields are shown. `consoleModel` is always
/// shown for console families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ConsoleFieldVisibility {
    pub storage: bool,
    pub controller_count: bool,
    pub purchase_year: bool,
    pub warranty_status: bool,
    pub usage_level: bool,
    pub battery_health: bool,
    pub screen_condition: bool,
    pub stick_drift: bool,
}

impl ConsoleFieldVisibility {
    /// Visibility for a family/group pair, before model-driven reveals.
    fn for_group(family: CategoryFamily, group: ConsoleGroup) -> Self {
        let handheld_family = family == CategoryFamily::Handhelds;
        match group {
            ConsoleGroup::PartsService => Self::default(),
            ConsoleGroup::Retro => Self {
                storage: false,
                controller_count: !handheld_family,
                purchase_year: true,
                warranty_status: false,
                usage_level: true,
                battery_health: handheld_family,
                screen_condition: handheld_family,
                stick_drift: handheld_family,
            },
            _ => Self {
                storage: true,
                controller_count: !handheld_family,
                purchase_year: true,
                warranty_status: true,
                usage_level: true,
                battery_health: handheld_family,
                screen_condition: handheld_family,
                stick_drift: handheld_family,
            },
        }
    }

    fn reveal_handheld_fields(&mut self) {
        self.battery_health = true;
        self.screen_condition = true;
        self.stick_drift = true;
    }

    /// Visibility of a console field key. Unknown keys are not toggleable.
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        match key {
            CONSOLE_MODEL => true,
            STORAGE => self.storage,
            CONTROLLER_COUNT => self.controller_count,
            PURCHASE_YEAR => self.purchase_year,
            WARRANTY_STATUS => self.warranty_status,
            USAGE_LEVEL => self.usage_level,
            BATTERY_HEALTH => self.battery_health,
            SCREEN_CONDITION => self.screen_condition,
            STICK_DRIFT => self.stick_drift,
            _ => false,
        }
    }
}

/// Whether `model` is a handheld device.
#[must_use]
pub fn is_handheld_model(model: &str) -> bool {
    let model = model.trim();
    HANDHELD_MODELS.iter().any(|m| m.eq_ignore_ascii_case(model))
}

/// Model options for a console sub-category.
///
/// Lookup order: exact sub-category id, console group, brand words in the
/// id (legacy ids), and finally a single "Other" option.
#[must_use]
pub fn model_options(sub_category_id: Option<&str>) -> &'static [&'static str] {
    let id = sub_category_id.map(|s| s.trim().to_lowercase()).unwrap_or_default();

    if let Some((_, models)) = MODELS_BY_SUB_CATEGORY.iter().find(|(known, _)| *known == id) {
        return models;
    }

    match ConsoleGroup::resolve(sub_category_id) {
        ConsoleGroup::PlayStation => return PLAYSTATION_MODELS,
        ConsoleGroup::Xbox => return XBOX_MODELS,
        ConsoleGroup::Nintendo => return NINTENDO_MODELS,
        ConsoleGroup::Retro => return RETRO_MODELS,
        ConsoleGroup::Vr => return VR_MODELS,
        ConsoleGroup::PartsService | ConsoleGroup::Other => {}
    }

    if id.contains("playstation") || id.contains("sony") || id.contains("-ps") {
        PLAYSTATION_MODELS
    } else if id.contains("xbox") || id.contains("microsoft") {
        XBOX_MODELS
    } else if id.contains("nintendo") || id.contains("switch") {
        NINTENDO_MODELS
    } else {
        FALLBACK_MODELS
    }
}

/// Resolved override decisions for one `(slug, sub-category, model)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverridePlan {
    family: CategoryFamily,
    group: Option<ConsoleGroup>,
    console_model: Option<String>,
    visibility: ConsoleFieldVisibility,
    model_options: &'static [&'static str],
}

impl OverridePlan {
    /// Resolves the plan from the main category slug.
    #[must_use]
    pub fn resolve(
        main_slug: &str,
        sub_category_id: Option<&str>,
        console_model: Option<&str>,
    ) -> Self {
        Self::for_family(CategoryFamily::resolve(main_slug), sub_category_id, console_model)
    }

    /// Resolves the plan from an already-resolved family.
    #[must_use]
    pub fn for_family(
        family: CategoryFamily,
        sub_category_id: Option<&str>,
        console_model: Option<&str>,
    ) -> Self {
        let console_model = console_model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        if !family.has_console_fields() {
            return Self {
                family,
                group: None,
                console_model,
                visibility: ConsoleFieldVisibility::default(),
                model_options: &[],
            };
        }

        let group = ConsoleGroup::resolve(sub_category_id);
        let mut visibility = ConsoleFieldVisibility::for_group(family, group);
        if console_model.as_deref().is_some_and(is_handheld_model) {
            visibility.reveal_handheld_fields();
        }

        Self {
            family,
            group: Some(group),
            console_model,
            visibility,
            model_options: model_options(sub_category_id),
        }
    }

    /// A plan with no override fields.
    #[must_use]
    pub fn none() -> Self {
        Self::for_family(CategoryFamily::Generic, None, None)
    }

    #[must_use]
    pub fn family(&self) -> CategoryFamily {
        self.family
    }

    /// Console group; `None` outside console families.
    #[must_use]
    pub fn group(&self) -> Option<ConsoleGroup> {
        self.group
    }

    #[must_use]
    pub fn console_model(&self) -> Option<&str> {
        self.console_model.as_deref()
    }

    #[must_use]
    pub fn console_visibility(&self) -> ConsoleFieldVisibility {
        self.visibility
    }

    /// Model names offered by the `consoleModel` control.
    #[must_use]
    pub fn model_options(&self) -> &'static [&'static str] {
        self.model_options
    }

    /// All override fields of the family in declared order, shown or not.
    #[must_use]
    pub fn fields(&self) -> &'static [OverrideField] {
        match self.family {
            CategoryFamily::BoardGames => BOARD_GAME_FIELDS,
            CategoryFamily::Consoles | CategoryFamily::Handhelds => CONSOLE_FIELDS,
            CategoryFamily::Generic => &[],
        }
    }

    /// Looks up an override field of this family by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&'static OverrideField> {
        self.fields().iter().find(|f| f.key == key)
    }

    /// Whether an override field is currently shown.
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        match self.family {
            CategoryFamily::BoardGames => BOARD_GAME_FIELDS.iter().any(|f| f.key == key),
            CategoryFamily::Consoles | CategoryFamily::Handhelds => self.visibility.is_visible(key),
            CategoryFamily::Generic => false,
        }
    }

    /// Override fields currently shown, in declared order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &'static OverrideField> + '_ {
        self.fields().iter().filter(|f| self.is_visible(f.key))
    }

    /// Override-owned keys that are currently hidden.
    pub fn hidden_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields()
            .iter()
            .filter(|f| !self.is_visible(f.key))
            .map(|f| f.key)
    }

    /// Every override-owned key, shown or hidden. Generic schema fields
    /// with these keys are skipped.
    #[must_use]
    pub fn skip_keys(&self) -> BTreeSet<&'static str> {
        self.fields().iter().map(|f| f.key).collect()
    }

    /// Whether `model` is one of the offered model names.
    #[must_use]
    pub fn offers_model(&self, model: &str) -> bool {
        self.model_options.iter().any(|m| *m == model)
    }
}
