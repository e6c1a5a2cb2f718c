//! Trip model
//!
//! A fixed-slot calendar: every day has one optional meal per meal type.
//! Slots hold meal codes, resolved through a [`MealSource`] when summarised.

use serde::{Deserialize, Serialize};

use super::{Meal, MealType, Nutrition};

/// Anything that can resolve a meal code to the live meal
pub trait MealSource {
    fn meal(&self, code: i64) -> Option<&Meal>;
}

impl MealSource for [Meal] {
    fn meal(&self, code: i64) -> Option<&Meal> {
        self.iter().find(|m| m.code == code)
    }
}

impl MealSource for Vec<Meal> {
    fn meal(&self, code: i64) -> Option<&Meal> {
        self.as_slice().meal(code)
    }
}

/// One day of a trip: a slot per meal type, indexed by meal type code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    slots: [Option<i64>; 4],
}

impl DayPlan {
    pub fn meal_code(&self, meal_type: MealType) -> Option<i64> {
        self.slots[meal_type.index()]
    }

    /// Filled slots in meal type order
    pub fn filled(&self) -> impl Iterator<Item = (MealType, i64)> + '_ {
        MealType::ALL
            .into_iter()
            .filter_map(move |t| self.slots[t.index()].map(|code| (t, code)))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    fn set(&mut self, meal_type: MealType, code: Option<i64>) {
        self.slots[meal_type.index()] = code;
    }
}

/// Totals for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaySummary {
    pub nutrition: Nutrition,
    pub cost: f64,
    pub weight: f64,
    /// Number of filled slots whose meal needs cooking
    pub cooking_count: u32,
}

impl Default for DaySummary {
    fn default() -> Self {
        Self {
            nutrition: Nutrition::zero(),
            cost: 0.0,
            weight: 0.0,
            cooking_count: 0,
        }
    }
}

/// Totals for a whole trip
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TripSummary {
    pub nutrition: Nutrition,
    pub cost: f64,
    pub weight: f64,
    pub cooking_count: u32,
    pub duration: usize,
}

/// A planned trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub code: i64,
    pub name: String,
    meal_plan: Vec<DayPlan>,
    /// Identity code of the database this trip was planned against
    pub linked_db_code: Option<i64>,
    pub linked_db_name: String,
}

impl Trip {
    /// Create a trip with `duration` empty days (at least one)
    pub fn new(duration: usize) -> Self {
        Self {
            code: 0,
            name: String::new(),
            meal_plan: vec![DayPlan::default(); duration.max(1)],
            linked_db_code: None,
            linked_db_name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Create a trip with no days yet; used when rebuilding from a file
    pub(crate) fn without_days() -> Self {
        Self {
            meal_plan: Vec::new(),
            ..Self::new(1)
        }
    }

    pub fn duration(&self) -> usize {
        self.meal_plan.len()
    }

    pub fn days(&self) -> &[DayPlan] {
        &self.meal_plan
    }

    pub fn day(&self, day_index: usize) -> Option<&DayPlan> {
        self.meal_plan.get(day_index)
    }

    /// Append an empty day. Always succeeds.
    pub fn add_day(&mut self) -> bool {
        self.meal_plan.push(DayPlan::default());
        true
    }

    /// Put a meal into a slot, replacing whatever was there.
    ///
    /// Returns false if `day_index` is past the last day.
    pub fn set_meal_at_day(&mut self, meal_code: i64, day_index: usize, meal_type: MealType) -> bool {
        match self.meal_plan.get_mut(day_index) {
            Some(day) => {
                day.set(meal_type, Some(meal_code));
                true
            }
            None => false,
        }
    }

    /// Clear a slot. Returns false if `day_index` is past the last day.
    pub fn remove_meal_at_day(&mut self, day_index: usize, meal_type: MealType) -> bool {
        match self.meal_plan.get_mut(day_index) {
            Some(day) => {
                day.set(meal_type, None);
                true
            }
            None => false,
        }
    }

    /// Sum the filled slots of one day. `None` if the day does not exist.
    pub fn day_summary<S>(&self, meals: &S, day_index: usize) -> Option<DaySummary>
    where
        S: MealSource + ?Sized,
    {
        let day = self.meal_plan.get(day_index)?;
        let mut summary = DaySummary::default();

        for (meal_type, code) in day.filled() {
            let Some(meal) = meals.meal(code) else {
                tracing::warn!(
                    "Day {} {} refers to meal {} which is not in the database; skipping",
                    day_index + 1,
                    meal_type.name(),
                    code
                );
                continue;
            };
            summary.nutrition += meal.nutrition();
            summary.cost += meal.cost();
            summary.weight += meal.weight();
            if meal.cooking() {
                summary.cooking_count += 1;
            }
        }

        Some(summary)
    }

    /// Sum every day
    pub fn trip_summary<S>(&self, meals: &S) -> TripSummary
    where
        S: MealSource + ?Sized,
    {
        let mut summary = TripSummary {
            nutrition: Nutrition::zero(),
            cost: 0.0,
            weight: 0.0,
            cooking_count: 0,
            duration: self.duration(),
        };

        for day_index in 0..self.duration() {
            if let Some(day) = self.day_summary(meals, day_index) {
                summary.nutrition += day.nutrition;
                summary.cost += day.cost;
                summary.weight += day.weight;
                summary.cooking_count += day.cooking_count;
            }
        }

        summary
    }

    /// Record the database this trip is planned against
    pub fn link_database(&mut self, db_code: i64, db_name: impl Into<String>) {
        self.linked_db_code = Some(db_code);
        self.linked_db_name = db_name.into();
    }

    /// Whether this trip was planned against the database with `db_code`
    pub fn verify_paired_database(&self, db_code: i64) -> bool {
        self.linked_db_code == Some(db_code)
    }

    /// Every meal code referenced by any slot, with repeats
    pub fn meal_codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.meal_plan.iter().flat_map(|day| day.filled().map(|(_, code)| code))
    }
}
