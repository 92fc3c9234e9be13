//! Purchase service: turns a requested quantity into freshly granted card keys.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::game::error::ShopError;
use crate::game::types::{Card, CardKey, catalog};

/// Anything able to sell cards to a player.
pub trait PurchaseService {
    fn purchase(&mut self, quantity: usize) -> Result<Vec<CardKey>, ShopError>;
}

/// In-process shop drawing uniformly from the full catalog.
pub struct Shop {
    catalog: Vec<Card>,
    rng: StdRng,
}

impl Shop {
    pub fn new(seed: u64) -> Self {
        Self {
            catalog: catalog(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for Shop {
    fn default() -> Self {
        Self::new(rand::random())
    }
}

impl PurchaseService for Shop {
    fn purchase(&mut self, quantity: usize) -> Result<Vec<CardKey>, ShopError> {
        if quantity == 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        (0..quantity)
            .map(|_| {
                self.catalog
                    .choose(&mut self.rng)
                    .map(Card::key)
                    .ok_or(ShopError::ServiceUnavailable)
            })
            .collect()
    }
}

/// A purchase service that is always down.
pub struct ClosedShop;

impl PurchaseService for ClosedShop {
    fn purchase(&mut self, _quantity: usize) -> Result<Vec<CardKey>, ShopError> {
        Err(ShopError::ServiceUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_returns_catalog_keys() {
        let mut shop = Shop::new(7);
        let keys = shop.purchase(5).unwrap();
        assert_eq!(keys.len(), 5);
        assert!(keys.iter().all(|k| k.parse::<Card>().is_ok()));
        assert_eq!(shop.purchase(0), Err(ShopError::InvalidQuantity(0)));
    }

    #[test]
    fn test_same_seed_same_cards() {
        assert_eq!(Shop::new(42).purchase(10), Shop::new(42).purchase(10));
    }

    #[test]
    fn test_closed_shop() {
        assert_eq!(ClosedShop.purchase(1), Err(ShopError::ServiceUnavailable));
    }
}
