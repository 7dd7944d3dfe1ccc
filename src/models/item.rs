use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of images accepted on a listing
pub const MAX_IMAGES: usize = 5;

pub const SIZES: &[&str] = &[
    "XS", "S", "M", "L", "XL", "XXL", "6", "7", "8", "9", "10", "11", "12", "One Size",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Tops,
    Bottoms,
    Dresses,
    Outerwear,
    Shoes,
    Accessories,
    Activewear,
    Formal,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Tops,
        Category::Bottoms,
        Category::Dresses,
        Category::Outerwear,
        Category::Shoes,
        Category::Accessories,
        Category::Activewear,
        Category::Formal,
    ];

    /// Display label, identical to the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tops => "Tops",
            Category::Bottoms => "Bottoms",
            Category::Dresses => "Dresses",
            Category::Outerwear => "Outerwear",
            Category::Shoes => "Shoes",
            Category::Accessories => "Accessories",
            Category::Activewear => "Activewear",
            Category::Formal => "Formal",
        }
    }

    /// Starting point for the suggested point value of a listing
    pub fn base_points(self) -> i64 {
        match self {
            Category::Tops => 25,
            Category::Bottoms => 30,
            Category::Dresses => 35,
            Category::Outerwear => 45,
            Category::Shoes => 40,
            Category::Accessories => 20,
            Category::Activewear => 30,
            Category::Formal => 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "Like New")]
    LikeNew,
    Excellent,
    Good,
    Fair,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::LikeNew,
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
    ];

    /// Condition multiplier in tenths (1.2 => 12)
    pub fn multiplier_tenths(self) -> i64 {
        match self {
            Condition::LikeNew => 12,
            Condition::Excellent => 10,
            Condition::Good => 8,
            Condition::Fair => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    PendingSwap,
    Redeemed,
    PendingApproval,
    Rejected,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::PendingSwap => "pending_swap",
            ItemStatus::Redeemed => "redeemed",
            ItemStatus::PendingApproval => "pending_approval",
            ItemStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub item_type: String,
    pub size: String,
    pub condition: Condition,
    pub point_value: i64,
    pub status: ItemStatus,
    pub images: Vec<String>,
    pub tags: BTreeSet<String>,
    pub location: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Case-insensitive substring match over title, description and tags.
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemData {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    /// Falls back to the category name when blank
    #[serde(default)]
    pub item_type: String,
    pub size: String,
    pub condition: Condition,
    pub point_value: i64,
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub location: Option<String>,
}

/// Owner edits. Status and point value are not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub item_type: Option<String>,
    pub size: Option<String>,
    pub condition: Option<Condition>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub location: Option<String>,
}

/// Trims tags and drops blanks
pub fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
