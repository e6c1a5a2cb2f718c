//! Meal type enumeration
//!
//! The four fixed daily slots of a trip day.

use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Meal type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// All meal types in code order
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    /// Human readable label
    pub fn name(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }

    /// Stable integer code used in files
    pub fn code(&self) -> i64 {
        match self {
            MealType::Breakfast => 0,
            MealType::Lunch => 1,
            MealType::Dinner => 2,
            MealType::Snack => 3,
        }
    }

    /// Slot index within a day
    pub fn index(&self) -> usize {
        self.code() as usize
    }

    pub fn from_code(code: i64) -> DbResult<Self> {
        match code {
            0 => Ok(MealType::Breakfast),
            1 => Ok(MealType::Lunch),
            2 => Ok(MealType::Dinner),
            3 => Ok(MealType::Snack),
            other => Err(DbError::UnknownMealType(other)),
        }
    }

    /// Parse a label case-insensitively
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" => Some(MealType::Snack),
            _ => None,
        }
    }

    /// Encode a set of meal types as a run of `<code>--` tokens
    pub fn encode_codes(types: &[MealType]) -> String {
        types.iter().map(|t| format!("{}--", t.code())).collect()
    }

    /// Decode a run of `<code>--` tokens; the text after the last `--` is dropped
    pub fn decode_codes(field: &str) -> DbResult<Vec<MealType>> {
        let mut tokens: Vec<&str> = field.trim().split("--").collect();
        tokens.pop();

        tokens
            .into_iter()
            .map(|token| {
                let code = token.trim().parse::<i64>().map_err(|_| {
                    DbError::malformed("meal type list", 0, format!("'{}' is not a code", token))
                })?;
                MealType::from_code(code)
            })
            .collect()
    }
}
