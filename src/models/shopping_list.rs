//! Shopping list
//!
//! Purchase quantities derived from a trip's meal plan, rounded up to whole
//! purchasable units and scaled by the number of people.

use std::path::Path;

use serde::Serialize;

use crate::db::{DbError, DbResult};
use super::{IngredientSource, MealSource, Trip};

/// One ingredient to buy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListRow {
    pub ingredient_name: String,
    pub ingredient_code: i64,
    /// Grams across the whole plan, already multiplied by persons
    pub total_amount_needed: f64,
    pub unit_size: f64,
    /// Whole units to buy; NaN while the unit size is unknown
    pub needed_units: f64,
    pub price_per_unit: f64,
    pub total_price: f64,
}

const EXPORT_COLUMNS: [&str; 7] = [
    "ingredient_name",
    "ingredient_code",
    "total_amount_needed",
    "unit_size",
    "needed_units",
    "price_per_unit",
    "total_price",
];

/// Shopping list for a trip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingList {
    pub persons: u32,
    rows: Vec<ShoppingListRow>,
    finalized: bool,
}

impl ShoppingList {
    pub fn new(persons: u32) -> Self {
        Self {
            persons,
            rows: Vec::new(),
            finalized: false,
        }
    }

    /// Build a finalized list in one go
    pub fn for_trip<D>(trip: &Trip, database: &D, persons: u32) -> DbResult<Self>
    where
        D: MealSource + IngredientSource + ?Sized,
    {
        let mut list = Self::new(persons);
        list.recompute_quantities(trip, database, persons)?;
        list.finalize_units();
        Ok(list)
    }

    pub fn rows(&self) -> &[ShoppingListRow] {
        &self.rows
    }

    pub fn row(&self, ingredient_code: i64) -> Option<&ShoppingListRow> {
        self.rows.iter().find(|r| r.ingredient_code == ingredient_code)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Rebuild the per-ingredient gram totals from the trip's meal plan.
    ///
    /// Each filled slot contributes `amount * persons` for every ingredient
    /// of its meal. Slots pointing at meals that no longer exist are skipped.
    /// Units and prices are left for [`ShoppingList::finalize_units`].
    pub fn recompute_quantities<D>(&mut self, trip: &Trip, database: &D, persons: u32) -> DbResult<()>
    where
        D: MealSource + IngredientSource + ?Sized,
    {
        self.persons = persons;
        self.rows.clear();
        self.finalized = false;
        let factor = f64::from(persons);

        for code in trip.meal_codes() {
            let Some(meal) = database.meal(code) else {
                tracing::warn!("Shopping list skips meal {} which is not in the database", code);
                continue;
            };

            for line in meal.ingredients() {
                let amount = line.amount * factor;
                match self.rows.iter().position(|r| r.ingredient_code == line.ingredient_code) {
                    Some(pos) => self.rows[pos].total_amount_needed += amount,
                    None => {
                        let ingredient = database.require_ingredient(line.ingredient_code)?;
                        self.rows.push(ShoppingListRow {
                            ingredient_name: ingredient.name.clone(),
                            ingredient_code: ingredient.code,
                            total_amount_needed: amount,
                            unit_size: ingredient.unit_size,
                            needed_units: 0.0,
                            price_per_unit: ingredient.price_per_unit,
                            total_price: 0.0,
                        });
                    }
                }
            }
        }

        tracing::debug!("Shopping list has {} ingredient rows for {} person(s)", self.rows.len(), persons);
        Ok(())
    }

    /// Round every row up to whole units and price it
    pub fn finalize_units(&mut self) {
        for row in &mut self.rows {
            row.needed_units = (row.total_amount_needed / row.unit_size).ceil();
            row.total_price = row.needed_units * row.price_per_unit;
        }
        self.finalized = true;
    }

    /// Sum of row prices; NaN if any price is unknown
    pub fn total_cost(&self) -> f64 {
        self.rows.iter().map(|r| r.total_price).sum()
    }

    /// Write the list as a spreadsheet (CSV with a header row).
    ///
    /// Refused before anything is written if the list is not finalized.
    pub fn export(&self, path: &Path) -> DbResult<()> {
        if !self.finalized {
            return Err(DbError::ShoppingListNotFinalized);
        }

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(EXPORT_COLUMNS)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        tracing::info!("Exported shopping list with {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }
}
