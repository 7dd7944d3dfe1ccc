use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::item::{normalize_tags, MAX_IMAGES};
use crate::models::{Category, Condition, CreateItemData, Item, ItemStatus, UpdateItemData};
use crate::services::ledger::MAX_POINTS;
use crate::services::marketplace::Marketplace;

/// Narrowing filters for browsing. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<Category>,
    pub size: Option<String>,
    pub condition: Option<Condition>,
    pub min_points: Option<i64>,
    pub max_points: Option<i64>,
}

impl SearchFilters {
    pub fn matches(&self, item: &Item) -> bool {
        self.category.map_or(true, |c| item.category == c)
            && self.size.as_deref().map_or(true, |s| item.size == s)
            && self.condition.map_or(true, |c| item.condition == c)
            && self.min_points.map_or(true, |min| item.point_value >= min)
            && self.max_points.map_or(true, |max| item.point_value <= max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
    #[serde(rename = "points-low")]
    PointsLow,
    #[serde(rename = "points-high")]
    PointsHigh,
}

/// Result of a catalog search.
///
/// Holds a snapshot of the available items; `iter` applies the query lazily
/// and can be called any number of times.
#[derive(Debug, Clone)]
pub struct ItemSearch {
    candidates: Vec<Item>,
    needle: String,
    filters: SearchFilters,
}

impl ItemSearch {
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.candidates
            .iter()
            .filter(move |item| item.matches_text(&self.needle) && self.filters.matches(item))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn sorted(&self, order: SortOrder) -> Vec<Item> {
        let mut items: Vec<Item> = self.iter().cloned().collect();
        match order {
            SortOrder::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Oldest => items.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortOrder::PointsLow => items.sort_by_key(|item| item.point_value),
            SortOrder::PointsHigh => items.sort_by(|a, b| b.point_value.cmp(&a.point_value)),
        }
        items
    }
}

/// Suggested listing price: category base scaled by condition, rounded
pub fn suggested_point_value(category: Category, condition: Condition) -> i64 {
    (category.base_points() * condition.multiplier_tenths() + 5) / 10
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> Result<()> {
    if images.is_empty() {
        return Err(AppError::Validation(
            "At least one image is required".to_string(),
        ));
    }
    if images.len() > MAX_IMAGES {
        return Err(AppError::Validation(format!(
            "At most {} images are allowed",
            MAX_IMAGES
        )));
    }
    for image in images {
        url::Url::parse(image)
            .map_err(|e| AppError::Validation(format!("Invalid image URI {:?}: {}", image, e)))?;
    }
    Ok(())
}

pub(crate) fn validate_point_value(point_value: i64) -> Result<()> {
    if point_value < 1 {
        return Err(AppError::Validation(
            "Point value must be at least 1".to_string(),
        ));
    }
    if point_value > MAX_POINTS {
        return Err(AppError::Validation(format!(
            "Point value must be at most {}",
            MAX_POINTS
        )));
    }
    Ok(())
}

fn validate_listing(data: &CreateItemData) -> Result<()> {
    require_text("Title", &data.title)?;
    require_text("Description", &data.description)?;
    require_text("Size", &data.size)?;
    validate_point_value(data.point_value)?;
    validate_images(&data.images)
}

impl Marketplace {
    /// Lists an owner-submitted item; it waits in `pending_approval` for moderation
    #[tracing::instrument(skip(self, data), fields(owner_id = %data.owner_id))]
    pub fn create_item(&self, data: CreateItemData) -> Result<Item> {
        self.insert_listing(data, ItemStatus::PendingApproval)
    }

    /// Lists an item that skips moderation (seed data, admin listings)
    #[tracing::instrument(skip(self, data), fields(owner_id = %data.owner_id))]
    pub fn create_approved_item(&self, data: CreateItemData) -> Result<Item> {
        self.insert_listing(data, ItemStatus::Available)
    }

    fn insert_listing(&self, data: CreateItemData, status: ItemStatus) -> Result<Item> {
        validate_listing(&data)?;

        let now = self.now();
        let item_type = if data.item_type.trim().is_empty() {
            data.category.as_str().to_string()
        } else {
            data.item_type
        };

        let item = Item {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            title: data.title.trim().to_string(),
            description: data.description,
            category: data.category,
            item_type,
            size: data.size,
            condition: data.condition,
            point_value: data.point_value,
            status,
            images: data.images,
            tags: normalize_tags(data.tags),
            location: data.location,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let _guard = self.lock_workflow();
        self.store().insert_item(item.clone())?;

        tracing::info!(item_id = %item.id, status = %item.status, "Item listed");

        Ok(item)
    }

    pub fn find_item(&self, id: Uuid) -> Result<Item> {
        self.require_item(id)
    }

    /// Merges owner edits into an item
    #[tracing::instrument(skip(self, data), fields(item_id = %id))]
    pub fn update_item(&self, id: Uuid, data: UpdateItemData) -> Result<Item> {
        if let Some(title) = &data.title {
            require_text("Title", title)?;
        }
        if let Some(description) = &data.description {
            require_text("Description", description)?;
        }
        if let Some(size) = &data.size {
            require_text("Size", size)?;
        }
        if let Some(images) = &data.images {
            validate_images(images)?;
        }

        let _guard = self.lock_workflow();
        let mut item = self.require_item(id)?;

        if let Some(title) = data.title {
            item.title = title.trim().to_string();
        }
        if let Some(description) = data.description {
            item.description = description;
        }
        if let Some(category) = data.category {
            item.category = category;
        }
        if let Some(item_type) = data.item_type {
            item.item_type = item_type;
        }
        if let Some(size) = data.size {
            item.size = size;
        }
        if let Some(condition) = data.condition {
            item.condition = condition;
        }
        if let Some(images) = data.images {
            item.images = images;
        }
        if let Some(tags) = data.tags {
            item.tags = normalize_tags(tags);
        }
        if let Some(location) = data.location {
            item.location = Some(location);
        }
        item.updated_at = self.now();

        self.store().save_item(item.clone())?;

        tracing::info!(item_id = %item.id, "Item updated");

        Ok(item)
    }

    /// Removes an item. Swap requests that reference it are left as they are.
    #[tracing::instrument(skip(self), fields(item_id = %id))]
    pub fn delete_item(&self, id: Uuid) -> Result<()> {
        let _guard = self.lock_workflow();
        if !self.store().delete_item(id)? {
            return Err(AppError::NotFound(format!("item {}", id)));
        }

        tracing::info!(item_id = %id, "Item deleted");

        Ok(())
    }

    /// All items, newest first, optionally narrowed to one status
    pub fn list_items(&self, status: Option<ItemStatus>) -> Result<Vec<Item>> {
        let items = self.store().list_items()?;
        Ok(match status {
            Some(status) => items.into_iter().filter(|i| i.status == status).collect(),
            None => items,
        })
    }

    pub fn items_by_owner(&self, owner_id: Uuid) -> Result<Vec<Item>> {
        Ok(self
            .store()
            .list_items()?
            .into_iter()
            .filter(|item| item.owner_id == owner_id)
            .collect())
    }

    /// Searches available items. Ordering is left to the caller.
    pub fn search_items(&self, query: &str, filters: SearchFilters) -> Result<ItemSearch> {
        let candidates = self.list_items(Some(ItemStatus::Available))?;

        Ok(ItemSearch {
            candidates,
            needle: query.to_lowercase(),
            filters,
        })
    }

    /// Other available items in the same category
    pub fn related_items(&self, id: Uuid, limit: usize) -> Result<Vec<Item>> {
        let item = self.require_item(id)?;

        Ok(self
            .list_items(Some(ItemStatus::Available))?
            .into_iter()
            .filter(|other| other.id != item.id && other.category == item.category)
            .take(limit)
            .collect())
    }
}
