use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One cart entry. A food id appears at most once per cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub food_id: Uuid,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
}

/// Bounds applied when adding to a cart.
#[derive(Debug, Clone, Copy)]
pub struct CartLimits {
    /// Largest quantity accepted by a single add.
    pub max_per_add: u32,
    /// Largest merged quantity for a line. `None` leaves merged lines unbounded.
    pub max_per_line: Option<u32>,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self {
            max_per_add: 10,
            max_per_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("quantity is not a whole number")]
    NotANumber,

    #[error("quantity must be between 1 and {max}")]
    OutOfRange { max: u32 },

    #[error("line would hold {attempted}, limit is {max}")]
    LineLimit { max: u32, attempted: u32 },
}

/// Ordered list of cart lines with merge-on-add semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn quantity_of(&self, food_id: Uuid) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.food_id == food_id)
            .map(|line| line.quantity)
    }

    pub fn total_units(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Adds `quantity` of `food_id`, merging into an existing line.
    ///
    /// Returns the resulting line quantity. On error the cart is untouched.
    pub fn add(&mut self, food_id: Uuid, quantity: u32, limits: CartLimits) -> Result<u32, CartError> {
        if quantity == 0 || quantity > limits.max_per_add {
            return Err(CartError::OutOfRange {
                max: limits.max_per_add,
            });
        }

        let current = self.quantity_of(food_id).unwrap_or(0);
        let merged = current.saturating_add(quantity);
        if let Some(max) = limits.max_per_line.filter(|max| merged > *max) {
            return Err(CartError::LineLimit {
                max,
                attempted: merged,
            });
        }

        match self.lines.iter_mut().find(|line| line.food_id == food_id) {
            Some(line) => line.quantity = merged,
            None => self.lines.push(CartLine {
                food_id,
                quantity,
                special_instructions: None,
            }),
        }
        Ok(merged)
    }

    /// Drops the lines whose food ids are in `food_ids`.
    pub fn remove_all(&mut self, food_ids: &[Uuid]) {
        self.lines.retain(|line| !food_ids.contains(&line.food_id));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }
}

/// Parses a customer-typed quantity, accepting whole numbers in `[1, max]`.
pub fn parse_quantity(text: &str, max: u32) -> Result<u32, CartError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(CartError::NotANumber);
    }
    // All-digit strings too long for u32 are out of range, not malformed
    let value: u32 = trimmed.parse().map_err(|_| CartError::OutOfRange { max })?;
    if value == 0 || value > max {
        return Err(CartError::OutOfRange { max });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_accepts_full_range() {
        for quantity in 1..=10 {
            let mut cart = Cart::default();
            assert_eq!(cart.add(Uuid::now_v7(), quantity, CartLimits::default()), Ok(quantity));
        }
    }

    #[test]
    fn test_add_rejects_out_of_range_without_mutation() {
        let mut cart = Cart::default();
        let food = Uuid::now_v7();
        cart.add(food, 2, CartLimits::default()).unwrap();
        let before = cart.clone();

        assert_eq!(
            cart.add(food, 0, CartLimits::default()),
            Err(CartError::OutOfRange { max: 10 })
        );
        assert_eq!(
            cart.add(food, 11, CartLimits::default()),
            Err(CartError::OutOfRange { max: 10 })
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_merges_same_food() {
        let mut cart = Cart::default();
        let food = Uuid::now_v7();
        cart.add(food, 4, CartLimits::default()).unwrap();
        cart.add(food, 9, CartLimits::default()).unwrap();
        assert_eq!(cart.len(), 1);
        // Merged lines may exceed the per-add bound unless a line cap is set
        assert_eq!(cart.quantity_of(food), Some(13));
    }

    #[test]
    fn test_line_cap_when_configured() {
        let limits = CartLimits {
            max_per_add: 10,
            max_per_line: Some(10),
        };
        let mut cart = Cart::default();
        let food = Uuid::now_v7();
        cart.add(food, 6, limits).unwrap();
        assert_eq!(
            cart.add(food, 5, limits),
            Err(CartError::LineLimit {
                max: 10,
                attempted: 11
            })
        );
        assert_eq!(cart.quantity_of(food), Some(6));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 3 ", 10), Ok(3));
        assert_eq!(parse_quantity("10", 10), Ok(10));
        assert_eq!(parse_quantity("0", 10), Err(CartError::OutOfRange { max: 10 }));
        assert_eq!(parse_quantity("11", 10), Err(CartError::OutOfRange { max: 10 }));
        assert_eq!(parse_quantity("2.5", 10), Err(CartError::NotANumber));
        assert_eq!(parse_quantity("-1", 10), Err(CartError::NotANumber));
        assert_eq!(parse_quantity("three", 10), Err(CartError::NotANumber));
        assert_eq!(
            parse_quantity("99999999999999", 10),
            Err(CartError::OutOfRange { max: 10 })
        );
    }

    #[test]
    fn test_remove_all() {
        let mut cart = Cart::default();
        let keep = Uuid::now_v7();
        let drop = Uuid::now_v7();
        cart.add(keep, 1, CartLimits::default()).unwrap();
        cart.add(drop, 1, CartLimits::default()).unwrap();
        cart.remove_all(&[drop]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(keep), Some(1));
    }
}
