//! Read-only views of the vault contract.

use alloy_primitives::{Address, B256, U256};
use cipherbid_types::{AuctionTuple, Handle};

use crate::error::VaultError;
use crate::handlers::HandlerResult;
use crate::state::VaultState;

/// `getAuctionCount()`.
pub fn auction_count(state: &VaultState) -> U256 {
    U256::from(state.auctions.len() as u64)
}

/// `getAuction(id)`.
pub fn auction(state: &VaultState, auction_id: U256) -> HandlerResult<AuctionTuple> {
    state
        .get_auction(auction_id)
        .map(|record| record.to_tuple())
        .ok_or(VaultError::AuctionNotFound(auction_id))
}

/// `getBid(id, account)`. The zero word means no bid.
pub fn bid(state: &VaultState, auction_id: U256, account: Address) -> Handle {
    state
        .bids
        .get(&(auction_id, account))
        .copied()
        .unwrap_or(B256::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{handle_create_auction, CallContext};

    #[test]
    fn test_queries_on_empty_and_populated_vault() {
        let mut state = VaultState::new();
        assert_eq!(auction_count(&state), U256::ZERO);
        assert_eq!(
            auction(&state, U256::from(1u64)),
            Err(VaultError::AuctionNotFound(U256::from(1u64)))
        );

        let ctx = CallContext {
            sender: Address::repeat_byte(1),
            contract: Address::repeat_byte(0xc0),
            timestamp: 0,
        };
        handle_create_auction(
            &mut state,
            &ctx,
            "A".to_string(),
            "d".to_string(),
            U256::from(10u64),
            U256::from(24u64),
        )
        .unwrap();

        assert_eq!(auction_count(&state), U256::from(1u64));
        let tuple = auction(&state, U256::from(1u64)).unwrap();
        assert_eq!(tuple.0, U256::from(1u64));
        assert_eq!(tuple.1, "A");
        assert_eq!(tuple.5, B256::ZERO);
        assert_eq!(
            auction(&state, U256::ZERO),
            Err(VaultError::AuctionNotFound(U256::ZERO))
        );
        assert_eq!(bid(&state, U256::from(1u64), Address::repeat_byte(2)), B256::ZERO);
    }
}
