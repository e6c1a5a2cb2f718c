//! Shared nutrition data structure
//!
//! Used across ingredients, meals, trip days and whole trips.

use std::ops::{Add, AddAssign, Index, Mul};

use serde::{Deserialize, Serialize};

/// Number of nutrient slots
pub const NUTRIENT_COUNT: usize = 8;

/// Slot labels in positional order, as used in file headers
pub const NUTRIENT_LABELS: [&str; NUTRIENT_COUNT] = [
    "energy", "fat", "sat_fat", "carbs", "sugar", "fiber", "protein", "salt",
];

/// Nutritional information
///
/// Ingredients store values per 100 grams; meals, days and trips store
/// absolute totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub energy: f64,        // kcal
    pub fat: f64,           // grams
    pub saturated_fat: f64, // grams
    pub carbs: f64,         // grams
    pub sugar: f64,         // grams
    pub fiber: f64,         // grams
    pub protein: f64,       // grams
    pub salt: f64,          // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from slots in positional order
    pub fn from_array(values: [f64; NUTRIENT_COUNT]) -> Self {
        let [energy, fat, saturated_fat, carbs, sugar, fiber, protein, salt] = values;
        Self {
            energy,
            fat,
            saturated_fat,
            carbs,
            sugar,
            fiber,
            protein,
            salt,
        }
    }

    /// Slots in positional order
    pub fn as_array(&self) -> [f64; NUTRIENT_COUNT] {
        [
            self.energy,
            self.fat,
            self.saturated_fat,
            self.carbs,
            self.sugar,
            self.fiber,
            self.protein,
            self.salt,
        ]
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self::from_array(self.as_array().map(|v| v * multiplier))
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        let a = self.as_array();
        let b = other.as_array();
        Self::from_array(std::array::from_fn(|i| a[i] + b[i]))
    }

    /// Contribution of `amount` grams of something whose values are per 100 g
    pub fn for_amount(&self, grams: f64) -> Self {
        self.scale(0.01 * grams)
    }

    /// Slotwise comparison within an absolute tolerance
    pub fn approx_eq(&self, other: &Nutrition, tolerance: f64) -> bool {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl AddAssign for Nutrition {
    fn add_assign(&mut self, other: Nutrition) {
        *self = Nutrition::add(self, &other);
    }
}

impl Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl Index<usize> for Nutrition {
    type Output = f64;

    fn index(&self, slot: usize) -> &f64 {
        match slot {
            0 => &self.energy,
            1 => &self.fat,
            2 => &self.saturated_fat,
            3 => &self.carbs,
            4 => &self.sugar,
            5 => &self.fiber,
            6 => &self.protein,
            7 => &self.salt,
            _ => panic!("nutrient slot {} out of range", slot),
        }
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oats() -> Nutrition {
        Nutrition::from_array([370.0, 6.9, 1.2, 59.0, 1.3, 10.0, 13.0, 0.0])
    }

    #[test]
    fn test_positional_order() {
        let n = oats();
        assert_eq!(n[0], 370.0);
        assert_eq!(n.saturated_fat, 1.2);
        assert_eq!(n[5], 10.0);
        assert_eq!(n.as_array(), [370.0, 6.9, 1.2, 59.0, 1.3, 10.0, 13.0, 0.0]);
    }

    #[test]
    fn test_add_and_scale() {
        let sum = oats() + oats();
        assert_eq!(sum, oats() * 2.0);
        assert_eq!(Nutrition::zero() + oats(), oats());
    }

    #[test]
    fn test_for_amount_converts_per_100g() {
        let forty = oats().for_amount(40.0);
        assert!((forty.energy - 148.0).abs() < 1e-9);
        assert!((forty.protein - 5.2).abs() < 1e-9);
    }

    #[test]
    fn test_sum() {
        let total: Nutrition = vec![oats(), oats(), Nutrition::zero()].into_iter().sum();
        assert!(total.approx_eq(&(oats() * 2.0), 1e-9));
    }

    #[test]
    fn test_nan_propagates() {
        let mut n = oats();
        n.salt = f64::NAN;
        let total = n + oats();
        assert!(total.salt.is_nan());
        assert_eq!(total.energy, 740.0);
    }
}
