#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Predicted crime category table and risk tier definitions.
//!
//! The classifier emits a numeric category id. This crate maps that id to
//! the display descriptor shown to users: name, risk tier, colors, icon and
//! a short description. The table is a compile-time constant, so there is
//! no way to mutate it at runtime.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Color used for categories the table doesn't know about.
pub const FALLBACK_COLOR_HEX: &str = "#6b7280";

/// Icon used for categories the table doesn't know about.
pub const FALLBACK_ICON: &str = "❓";

/// Risk tier reported alongside a predicted category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskTier {
    /// Minor, non-violent offenses
    Low,
    /// Property and narcotics offenses
    Medium,
    /// Sexual offenses
    High,
    /// Violent, life-threatening offenses
    Critical,
}

/// The five categories the classifier was trained on, keyed by the numeric
/// id the model emits.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CrimeCategory {
    /// Narcotics and substance-related offenses
    DrugCrime = 0,
    /// Miscellaneous non-violent offenses
    OtherCrime = 1,
    /// Theft, burglary, and property damage
    PropertyCrime = 2,
    /// Sexual offenses and exploitation
    SexCrime = 3,
    /// Violent assaults and life-threatening offenses
    ViolentCrime = 4,
}

impl CrimeCategory {
    /// Returns the numeric id the classifier uses for this category.
    #[must_use]
    pub const fn id(self) -> i64 {
        self as i64
    }

    /// Looks up the category for a classifier id.
    #[must_use]
    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(Self::DrugCrime),
            1 => Some(Self::OtherCrime),
            2 => Some(Self::PropertyCrime),
            3 => Some(Self::SexCrime),
            4 => Some(Self::ViolentCrime),
            _ => None,
        }
    }

    /// Returns the static display descriptor for this category.
    #[must_use]
    pub fn descriptor(self) -> &'static CategoryDescriptor {
        &CATEGORY_TABLE[self as usize]
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::DrugCrime,
            Self::OtherCrime,
            Self::PropertyCrime,
            Self::SexCrime,
            Self::ViolentCrime,
        ]
    }
}

/// Display metadata for a predicted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDescriptor {
    /// Classifier id this descriptor was resolved for.
    pub id: i64,
    /// Human-readable category name.
    pub name: Cow<'static, str>,
    /// Primary display color.
    pub color_hex: &'static str,
    /// Darker shade used for gradients and borders.
    pub dark_color_hex: Option<&'static str>,
    /// Emoji shown next to the category name.
    pub icon: &'static str,
    /// Risk tier, `None` for categories outside the table.
    pub risk_tier: Option<RiskTier>,
    /// One-line description of the category.
    pub description: Option<&'static str>,
}

impl CategoryDescriptor {
    /// Risk tier to report for this category. Categories outside the table
    /// default to [`RiskTier::Medium`].
    #[must_use]
    pub fn risk_level(&self) -> RiskTier {
        self.risk_tier.unwrap_or(RiskTier::Medium)
    }

    /// Whether this descriptor was synthesized for an unknown id.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        CrimeCategory::from_id(self.id).is_none()
    }
}

static CATEGORY_TABLE: [CategoryDescriptor; 5] = [
    CategoryDescriptor {
        id: 0,
        name: Cow::Borrowed("Drug Crime"),
        color_hex: "#10b981",
        dark_color_hex: Some("#059669"),
        icon: "💊",
        risk_tier: Some(RiskTier::Medium),
        description: Some("Narcotics and substance-related offenses"),
    },
    CategoryDescriptor {
        id: 1,
        name: Cow::Borrowed("Other Crime"),
        color_hex: "#6b7280",
        dark_color_hex: Some("#4b5563"),
        icon: "📄",
        risk_tier: Some(RiskTier::Low),
        description: Some("Miscellaneous non-violent offenses"),
    },
    CategoryDescriptor {
        id: 2,
        name: Cow::Borrowed("Property Crime"),
        color_hex: "#f59e0b",
        dark_color_hex: Some("#d97706"),
        icon: "💰",
        risk_tier: Some(RiskTier::Medium),
        description: Some("Theft, burglary, and property damage"),
    },
    CategoryDescriptor {
        id: 3,
        name: Cow::Borrowed("Sex Crime"),
        color_hex: "#8b5cf6",
        dark_color_hex: Some("#7c3aed"),
        icon: "🔒",
        risk_tier: Some(RiskTier::High),
        description: Some("Sexual offenses and exploitation"),
    },
    CategoryDescriptor {
        id: 4,
        name: Cow::Borrowed("Violent Crime"),
        color_hex: "#ef4444",
        dark_color_hex: Some("#dc2626"),
        icon: "⚔️",
        risk_tier: Some(RiskTier::Critical),
        description: Some("Violent assaults and life-threatening offenses"),
    },
];

/// Resolves a classifier category id to its display descriptor.
///
/// Ids outside the table are not an error: they get a synthesized
/// `"Category {id}"` descriptor with neutral colors and a placeholder icon.
#[must_use]
pub fn resolve(id: i64) -> CategoryDescriptor {
    CrimeCategory::from_id(id).map_or_else(
        || CategoryDescriptor {
            id,
            name: Cow::Owned(format!("Category {id}")),
            color_hex: FALLBACK_COLOR_HEX,
            dark_color_hex: None,
            icon: FALLBACK_ICON,
            risk_tier: None,
            description: None,
        },
        |category| category.descriptor().clone(),
    )
}
