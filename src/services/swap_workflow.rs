use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::db::StatusSwap;
use crate::error::{AppError, Result};
use crate::models::{Item, ItemStatus, NewSwapRequest, SwapRequest, SwapStatus};
use crate::services::marketplace::Marketplace;

/// A swap request with its items resolved at read time.
/// Either item is `None` if it has been deleted since the request was made.
#[derive(Debug, Clone, Serialize)]
pub struct SwapRequestDetails {
    #[serde(flatten)]
    pub request: SwapRequest,
    pub requested_item: Option<Item>,
    pub offered_item: Option<Item>,
}

impl Marketplace {
    /// Opens a swap request and places the requested item on hold
    #[tracing::instrument(skip(self, data), fields(requester_id = %data.requester_id, requested_item_id = %data.requested_item_id))]
    pub fn create_swap_request(&self, data: NewSwapRequest) -> Result<SwapRequest> {
        let _guard = self.lock_workflow();

        let requested = self.require_item(data.requested_item_id)?;
        if requested.owner_id == data.requester_id {
            return Err(AppError::Validation(
                "You cannot request a swap for your own item".to_string(),
            ));
        }

        match data.offered_item_id {
            Some(offered_id) => {
                let offered = self.require_item(offered_id)?;
                if offered.owner_id != data.requester_id {
                    return Err(AppError::Validation(
                        "Offered item must belong to the requester".to_string(),
                    ));
                }
                if offered.status != ItemStatus::Available {
                    return Err(AppError::InvalidState(format!(
                        "offered item {} is {}",
                        offered.id, offered.status
                    )));
                }
                let already_offered = self.store().list_swap_requests()?.iter().any(|r| {
                    r.status == SwapStatus::Pending && r.offered_item_id == Some(offered.id)
                });
                if already_offered {
                    return Err(AppError::InvalidState(format!(
                        "offered item {} is already part of a pending swap",
                        offered.id
                    )));
                }
            }
            None if data.message.trim().is_empty() => {
                return Err(AppError::Validation(
                    "Select an item to offer or add a message".to_string(),
                ));
            }
            None => {}
        }

        match self.store().compare_and_set_item_status(
            requested.id,
            ItemStatus::Available,
            ItemStatus::PendingSwap,
            self.now(),
        )? {
            StatusSwap::Swapped(_) => {}
            StatusSwap::Mismatch(current) => {
                tracing::warn!(item_id = %requested.id, status = %current, "Swap refused, item not available");
                return Err(AppError::InvalidState(format!(
                    "item {} is {}",
                    requested.id, current
                )));
            }
            StatusSwap::Missing => {
                return Err(AppError::NotFound(format!("item {}", requested.id)));
            }
        }

        let now = self.now();
        let request = SwapRequest {
            id: Uuid::new_v4(),
            requester_id: data.requester_id,
            requested_item_id: data.requested_item_id,
            offered_item_id: data.offered_item_id,
            message: data.message,
            status: SwapStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.store().insert_swap_request(request.clone())?;

        tracing::info!(swap_request_id = %request.id, "Swap request created");

        Ok(request)
    }

    /// Resolves a pending swap request and applies the item side effects
    #[tracing::instrument(skip(self), fields(swap_request_id = %id, new_status = %new_status))]
    pub fn update_swap_request_status(&self, id: Uuid, new_status: SwapStatus) -> Result<SwapRequest> {
        let _guard = self.lock_workflow();

        let mut request = self
            .store()
            .find_swap_request(id)?
            .ok_or_else(|| AppError::NotFound(format!("swap request {}", id)))?;

        if request.status.is_terminal() || new_status == SwapStatus::Pending {
            return Err(AppError::InvalidTransition {
                entity: "swap request",
                from: request.status.to_string(),
                to: new_status.to_string(),
            });
        }

        if new_status == SwapStatus::Accepted {
            self.ensure_item_status(request.requested_item_id, ItemStatus::PendingSwap)?;
            if let Some(offered_id) = request.offered_item_id {
                self.ensure_item_status(offered_id, ItemStatus::Available)?;
            }
        }

        request.status = new_status;
        request.updated_at = self.now();
        self.store().save_swap_request(request.clone())?;

        self.settle_item(
            request.requested_item_id,
            ItemStatus::PendingSwap,
            new_status.requested_item_status(),
        )?;
        if let (Some(offered_id), Some(offered_status)) =
            (request.offered_item_id, new_status.offered_item_status())
        {
            self.settle_item(offered_id, ItemStatus::Available, offered_status)?;
        }

        tracing::info!(swap_request_id = %request.id, status = %request.status, "Swap request resolved");

        Ok(request)
    }

    /// Refuses an accept when an item moved on while the request was pending.
    /// Deleted items pass; they are skipped when the side effects run.
    fn ensure_item_status(&self, id: Uuid, expected: ItemStatus) -> Result<()> {
        match self.store().find_item(id)? {
            Some(item) if item.status != expected => {
                tracing::warn!(item_id = %id, status = %item.status, "Swap refused, item no longer tradable");
                Err(AppError::InvalidState(format!(
                    "item {} is {}",
                    id, item.status
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn find_swap_request(&self, id: Uuid) -> Result<SwapRequestDetails> {
        let request = self
            .store()
            .find_swap_request(id)?
            .ok_or_else(|| AppError::NotFound(format!("swap request {}", id)))?;

        let requested_item = self.store().find_item(request.requested_item_id)?;
        let offered_item = match request.offered_item_id {
            Some(offered_id) => self.store().find_item(offered_id)?,
            None => None,
        };

        Ok(SwapRequestDetails {
            request,
            requested_item,
            offered_item,
        })
    }

    /// Requests the user made, plus requests for items the user owns
    pub fn swap_requests_for_user(&self, user_id: Uuid) -> Result<Vec<SwapRequest>> {
        let owners: HashMap<Uuid, Uuid> = self
            .store()
            .list_items()?
            .into_iter()
            .map(|item| (item.id, item.owner_id))
            .collect();

        Ok(self
            .store()
            .list_swap_requests()?
            .into_iter()
            .filter(|request| {
                request.requester_id == user_id
                    || owners.get(&request.requested_item_id) == Some(&user_id)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::marketplace::fixtures::{available_item, listing, market};

    fn request(requester_id: Uuid, requested: &Item, offered: Option<&Item>) -> NewSwapRequest {
        NewSwapRequest {
            requester_id,
            requested_item_id: requested.id,
            offered_item_id: offered.map(|i| i.id),
            message: "Would love to trade".to_string(),
        }
    }

    #[test]
    fn test_accept_redeems_both_items_and_closes_request() {
        let (market, _) = market();
        let owner = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let wanted = available_item(&market, owner, "Denim Jacket", 45);
        let offered = available_item(&market, requester, "Wool Sweater", 40);

        let swap = market
            .create_swap_request(request(requester, &wanted, Some(&offered)))
            .unwrap();
        assert_eq!(swap.status, SwapStatus::Pending);
        assert_eq!(
            market.find_item(wanted.id).unwrap().status,
            ItemStatus::PendingSwap
        );
        assert_eq!(
            market.find_item(offered.id).unwrap().status,
            ItemStatus::Available
        );

        let accepted = market
            .update_swap_request_status(swap.id, SwapStatus::Accepted)
            .unwrap();
        assert_eq!(accepted.status, SwapStatus::Accepted);
        assert_eq!(market.find_item(wanted.id).unwrap().status, ItemStatus::Redeemed);
        assert_eq!(market.find_item(offered.id).unwrap().status, ItemStatus::Redeemed);

        let err = market
            .update_swap_request_status(swap.id, SwapStatus::Cancelled)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_reject_and_cancel_restore_requested_item() {
        for outcome in [SwapStatus::Rejected, SwapStatus::Cancelled] {
            let (market, _) = market();
            let requester = Uuid::new_v4();
            let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
            let offered = available_item(&market, requester, "Scarf", 20);

            let swap = market
                .create_swap_request(request(requester, &wanted, Some(&offered)))
                .unwrap();
            market.update_swap_request_status(swap.id, outcome).unwrap();

            assert_eq!(market.find_item(wanted.id).unwrap().status, ItemStatus::Available);
            assert_eq!(market.find_item(offered.id).unwrap().status, ItemStatus::Available);
        }
    }

    #[test]
    fn test_offered_item_stays_available_while_pending() {
        for outcome in [SwapStatus::Rejected, SwapStatus::Cancelled] {
            let (market, _) = market();
            let requester = Uuid::new_v4();
            let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
            let offered = available_item(&market, requester, "Scarf", 20);

            let swap = market
                .create_swap_request(request(requester, &wanted, Some(&offered)))
                .unwrap();
            let pending = market.find_item(offered.id).unwrap();
            assert_eq!(pending.status, ItemStatus::Available);
            assert_eq!(pending.updated_at, offered.updated_at);

            market.update_swap_request_status(swap.id, outcome).unwrap();
            let after = market.find_item(offered.id).unwrap();
            assert_eq!(after.status, ItemStatus::Available);
            assert_eq!(after.updated_at, offered.updated_at);
        }
    }

    #[test]
    fn test_accept_fails_when_offered_item_was_redeemed() {
        let (market, _) = market();
        let requester = Uuid::new_v4();
        let wanted = available_item(&market, Uuid::new_v4(), "Denim Jacket", 45);
        let offered = available_item(&market, requester, "Wool Sweater", 40);
        let swap = market
            .create_swap_request(request(requester, &wanted, Some(&offered)))
            .unwrap();

        assert!(market.redeem_item(offered.id, Uuid::new_v4()));

        let err = market
            .update_swap_request_status(swap.id, SwapStatus::Accepted)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert_eq!(
            market.find_swap_request(swap.id).unwrap().request.status,
            SwapStatus::Pending
        );
        assert_eq!(
            market.find_item(wanted.id).unwrap().status,
            ItemStatus::PendingSwap
        );

        market
            .update_swap_request_status(swap.id, SwapStatus::Cancelled)
            .unwrap();
        assert_eq!(market.find_item(wanted.id).unwrap().status, ItemStatus::Available);
        assert_eq!(market.find_item(offered.id).unwrap().status, ItemStatus::Redeemed);
    }

    #[test]
    fn test_offered_item_cannot_be_traded_twice() {
        let (market, _) = market();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let bobs_jacket = available_item(&market, bob, "Jacket", 45);
        let carols_coat = available_item(&market, carol, "Coat", 60);
        let alices_scarf = available_item(&market, alice, "Scarf", 20);

        let offer = market
            .create_swap_request(request(alice, &bobs_jacket, Some(&alices_scarf)))
            .unwrap();
        assert!(matches!(
            market.create_swap_request(request(alice, &carols_coat, Some(&alices_scarf))),
            Err(AppError::InvalidState(_))
        ));

        // Requested elsewhere while offered: accepting the offer must fail
        let first = market
            .create_swap_request(request(bob, &alices_scarf, None))
            .unwrap();
        assert!(matches!(
            market.update_swap_request_status(offer.id, SwapStatus::Accepted),
            Err(AppError::InvalidState(_))
        ));

        market
            .update_swap_request_status(first.id, SwapStatus::Rejected)
            .unwrap();
        market
            .update_swap_request_status(offer.id, SwapStatus::Accepted)
            .unwrap();
        assert_eq!(
            market.find_item(alices_scarf.id).unwrap().status,
            ItemStatus::Redeemed
        );
    }

    #[test]
    fn test_reject_does_not_relist_item_that_moved_on() {
        let (market, _) = market();
        let wanted = available_item(&market, Uuid::new_v4(), "Boots", 40);
        let swap = market
            .create_swap_request(request(Uuid::new_v4(), &wanted, None))
            .unwrap();

        let mut sold = market.find_item(wanted.id).unwrap();
        sold.status = ItemStatus::Redeemed;
        market.store().save_item(sold).unwrap();

        market
            .update_swap_request_status(swap.id, SwapStatus::Rejected)
            .unwrap();
        assert_eq!(market.find_item(wanted.id).unwrap().status, ItemStatus::Redeemed);
    }

    #[test]
    fn test_terminal_requests_cannot_move_again() {
        let (market, _) = market();
        let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
        let swap = market
            .create_swap_request(request(Uuid::new_v4(), &wanted, None))
            .unwrap();
        market
            .update_swap_request_status(swap.id, SwapStatus::Rejected)
            .unwrap();

        for next in [
            SwapStatus::Accepted,
            SwapStatus::Rejected,
            SwapStatus::Cancelled,
            SwapStatus::Pending,
        ] {
            assert!(matches!(
                market.update_swap_request_status(swap.id, next),
                Err(AppError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_pending_to_pending_is_not_a_transition() {
        let (market, _) = market();
        let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
        let swap = market
            .create_swap_request(request(Uuid::new_v4(), &wanted, None))
            .unwrap();

        assert!(matches!(
            market.update_swap_request_status(swap.id, SwapStatus::Pending),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_requester_cannot_swap_for_own_item() {
        let (market, _) = market();
        let owner = Uuid::new_v4();
        let wanted = available_item(&market, owner, "Dress", 35);

        assert!(matches!(
            market.create_swap_request(request(owner, &wanted, None)),
            Err(AppError::Validation(_))
        ));
        assert_eq!(market.find_item(wanted.id).unwrap().status, ItemStatus::Available);
    }

    #[test]
    fn test_second_request_on_held_item_is_refused() {
        let (market, _) = market();
        let wanted = available_item(&market, Uuid::new_v4(), "Sneakers", 50);

        market
            .create_swap_request(request(Uuid::new_v4(), &wanted, None))
            .unwrap();
        let err = market
            .create_swap_request(request(Uuid::new_v4(), &wanted, None))
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_unapproved_item_cannot_be_requested() {
        let (market, _) = market();
        let pending = market
            .create_item(listing(Uuid::new_v4(), "Coat", 60))
            .unwrap();

        assert!(matches!(
            market.create_swap_request(request(Uuid::new_v4(), &pending, None)),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_offered_item_must_belong_to_requester() {
        let (market, _) = market();
        let requester = Uuid::new_v4();
        let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
        let someone_elses = available_item(&market, Uuid::new_v4(), "Hat", 15);

        assert!(matches!(
            market.create_swap_request(request(requester, &wanted, Some(&someone_elses))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_request_needs_offer_or_message() {
        let (market, _) = market();
        let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
        let mut empty = request(Uuid::new_v4(), &wanted, None);
        empty.message = "   ".to_string();

        assert!(matches!(
            market.create_swap_request(empty),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_request_and_item() {
        let (market, _) = market();

        assert!(matches!(
            market.update_swap_request_status(Uuid::new_v4(), SwapStatus::Accepted),
            Err(AppError::NotFound(_))
        ));

        let data = NewSwapRequest {
            requester_id: Uuid::new_v4(),
            requested_item_id: Uuid::new_v4(),
            offered_item_id: None,
            message: "hi".to_string(),
        };
        assert!(matches!(
            market.create_swap_request(data),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_deleted_item_leaves_request_resolvable() {
        let (market, _) = market();
        let requester = Uuid::new_v4();
        let wanted = available_item(&market, Uuid::new_v4(), "Dress", 35);
        let swap = market
            .create_swap_request(request(requester, &wanted, None))
            .unwrap();

        market.delete_item(wanted.id).unwrap();

        let details = market.find_swap_request(swap.id).unwrap();
        assert!(details.requested_item.is_none());

        let cancelled = market
            .update_swap_request_status(swap.id, SwapStatus::Cancelled)
            .unwrap();
        assert_eq!(cancelled.status, SwapStatus::Cancelled);
    }

    #[test]
    fn test_swap_requests_for_user_includes_both_sides() {
        let (market, _) = market();
        let owner = Uuid::new_v4();
        let requester = Uuid::new_v4();
        let bystander = Uuid::new_v4();
        let wanted = available_item(&market, owner, "Dress", 35);
        let swap = market
            .create_swap_request(request(requester, &wanted, None))
            .unwrap();

        assert_eq!(market.swap_requests_for_user(owner).unwrap()[0].id, swap.id);
        assert_eq!(market.swap_requests_for_user(requester).unwrap()[0].id, swap.id);
        assert!(market.swap_requests_for_user(bystander).unwrap().is_empty());
    }
}
