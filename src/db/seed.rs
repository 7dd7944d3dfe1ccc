use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Category, Condition, CreateItemData, Item, NewPointTransaction, PointTransaction,
    TransactionType,
};
use crate::services::user_directory::UserDirectory;
use crate::services::Marketplace;

/// Owner of the demo listings, matching `InMemoryUserDirectory::demo`
pub const ALICE_ID: Uuid = Uuid::from_u128(1);
pub const BOB_ID: Uuid = Uuid::from_u128(2);

fn pexels(photo: u32) -> String {
    format!(
        "https://images.pexels.com/photos/{photo}/pexels-photo-{photo}.jpeg?w=400&h=400&fit=crop"
    )
}

#[allow(clippy::too_many_arguments)]
fn listing(
    owner_id: Uuid,
    title: &str,
    description: &str,
    category: Category,
    item_type: &str,
    size: &str,
    condition: Condition,
    point_value: i64,
    photos: &[u32],
    tags: &[&str],
    location: &str,
) -> CreateItemData {
    CreateItemData {
        owner_id,
        title: title.to_string(),
        description: description.to_string(),
        category,
        item_type: item_type.to_string(),
        size: size.to_string(),
        condition,
        point_value,
        images: photos.iter().copied().map(pexels).collect(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        location: Some(location.to_string()),
    }
}

fn demo_listings() -> Vec<CreateItemData> {
    vec![
        listing(
            ALICE_ID,
            "Vintage Denim Jacket",
            "Beautiful vintage denim jacket in excellent condition. Perfect for layering and has that worn-in comfort that only gets better with time.",
            Category::Outerwear,
            "Jacket",
            "M",
            Condition::Good,
            45,
            &[1040945, 1926769],
            &["vintage", "denim", "casual"],
            "San Francisco, CA",
        ),
        listing(
            BOB_ID,
            "Floral Summer Dress",
            "Light and airy summer dress with beautiful floral pattern. Perfect for warm weather and special occasions.",
            Category::Dresses,
            "Casual Dress",
            "S",
            Condition::LikeNew,
            35,
            &[985635],
            &["floral", "summer", "feminine"],
            "New York, NY",
        ),
        listing(
            ALICE_ID,
            "Classic White Sneakers",
            "Clean, minimalist white sneakers that go with everything. Barely worn and in excellent condition.",
            Category::Shoes,
            "Sneakers",
            "8",
            Condition::Excellent,
            50,
            &[1478442],
            &["white", "sneakers", "minimalist"],
            "San Francisco, CA",
        ),
        listing(
            BOB_ID,
            "Wool Blend Sweater",
            "Cozy wool blend sweater in a beautiful heather gray. Perfect for chilly days and professional settings.",
            Category::Tops,
            "Sweater",
            "L",
            Condition::Good,
            40,
            &[1926769],
            &["wool", "cozy", "professional"],
            "New York, NY",
        ),
        listing(
            ALICE_ID,
            "Designer Handbag",
            "Authentic designer handbag in pristine condition. Features multiple compartments and adjustable strap.",
            Category::Accessories,
            "Handbag",
            "One Size",
            Condition::LikeNew,
            80,
            &[1598507],
            &["designer", "luxury", "handbag"],
            "San Francisco, CA",
        ),
    ]
}

/// Lists the demo items as already approved
pub fn seed_demo_items(market: &Marketplace) -> Result<Vec<Item>> {
    let items = demo_listings()
        .into_iter()
        .map(|data| market.create_approved_item(data))
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(count = items.len(), "Seeded demo items");

    Ok(items)
}

/// Records each directory user's current points as an opening ledger entry,
/// so a fresh ledger agrees with the balances the directory starts with.
pub async fn seed_opening_balances(
    market: &Marketplace,
    users: &dyn UserDirectory,
) -> Result<Vec<PointTransaction>> {
    let mut entries = Vec::new();
    for user in users.list_users().await? {
        if user.points <= 0 {
            continue;
        }
        entries.push(market.add_point_transaction(NewPointTransaction {
            user_id: user.id,
            item_id: None,
            points_amount: user.points,
            transaction_type: TransactionType::Bonus,
            description: "Opening balance".to_string(),
            transaction_date: None,
        })?);
    }

    tracing::info!(count = entries.len(), "Seeded opening balances");

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemStatus;
    use crate::services::catalog::SearchFilters;
    use crate::services::user_directory::memory::DEMO_STARTING_POINTS;
    use crate::services::user_directory::InMemoryUserDirectory;

    #[test]
    fn test_seed_lists_five_available_items() {
        let market = Marketplace::in_memory();

        let items = seed_demo_items(&market).unwrap();

        assert_eq!(items.len(), 5);
        assert!(items.iter().all(|i| i.status == ItemStatus::Available));
        assert_eq!(market.items_by_owner(ALICE_ID).unwrap().len(), 3);
        assert_eq!(market.items_by_owner(BOB_ID).unwrap().len(), 2);
    }

    #[test]
    fn test_seeded_items_are_searchable() {
        let market = Marketplace::in_memory();
        seed_demo_items(&market).unwrap();

        let search = market.search_items("denim", SearchFilters::default()).unwrap();
        assert_eq!(search.count(), 1);

        let shoes = market
            .search_items(
                "",
                SearchFilters {
                    category: Some(Category::Shoes),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(shoes.iter().next().map(|i| i.title.as_str()), Some("Classic White Sneakers"));
    }

    #[tokio::test]
    async fn test_opening_balances_match_demo_users() {
        let market = Marketplace::in_memory();
        let users = InMemoryUserDirectory::demo();

        let entries = seed_opening_balances(&market, &users).await.unwrap();

        assert_eq!(entries.len(), 3);
        for user in users.list_users().await.unwrap() {
            assert_eq!(market.ledger_balance(user.id).unwrap(), user.points);
            assert_eq!(user.points, DEMO_STARTING_POINTS);
        }
        assert!(entries
            .iter()
            .all(|t| t.transaction_type == TransactionType::Bonus));
    }
}
