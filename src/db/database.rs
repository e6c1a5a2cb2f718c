//! Local database
//!
//! Owns the ingredient and meal tables, hands out codes, guards the
//! "ingredient still used by a meal" rule and reads/writes the flat files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

use super::error::{DbError, DbResult};
use super::storage::{self, BaseFile};
use crate::models::{
    Ingredient, IngredientCreate, IngredientSource, IngredientUpdate, Meal, MealCreate, MealSource,
    MealType,
};

/// Default field separator of the data files
pub const DEFAULT_SEPARATOR: u8 = b';';

static LAST_DATABASE_CODE: AtomicI64 = AtomicI64::new(0);

/// Identity code for a new database: creation time in seconds, bumped so
/// that two databases created in the same second still differ
fn next_database_code() -> i64 {
    let now = chrono::Utc::now().timestamp();
    let mut previous = LAST_DATABASE_CODE.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(previous + 1);
        match LAST_DATABASE_CODE.compare_exchange(previous, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => previous = actual,
        }
    }
}

/// Which table a name search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Ingredients,
    Meals,
    Trips,
}

/// In-memory catalog of ingredients and meals
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    /// Identity used to pair trips with the database they were planned against
    pub code: i64,
    /// Base file stem once saved or loaded
    pub name: String,
    separator: u8,
    ingredients: Vec<Ingredient>,
    meals: Vec<Meal>,
    next_ingredient_code: i64,
    next_meal_code: i64,
}

impl Default for LocalDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalDatabase {
    /// Create an empty database with a fresh identity code
    pub fn new() -> Self {
        Self::with_code(next_database_code())
    }

    pub fn with_code(code: i64) -> Self {
        Self {
            code,
            name: String::new(),
            separator: DEFAULT_SEPARATOR,
            ingredients: Vec::new(),
            meals: Vec::new(),
            next_ingredient_code: 0,
            next_meal_code: 0,
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a database from its base file
    pub fn open(base_path: &Path) -> DbResult<Self> {
        let mut db = Self::new();
        db.load_from_base_file(base_path)?;
        Ok(db)
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    pub fn meal_types(&self) -> &'static [MealType; 4] {
        &MealType::ALL
    }

    pub fn meal_type_names(&self) -> Vec<&'static str> {
        MealType::ALL.iter().map(|t| t.name()).collect()
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn has_ingredients(&self) -> bool {
        !self.ingredients.is_empty()
    }

    pub fn has_meals(&self) -> bool {
        !self.meals.is_empty()
    }

    // ------------------------------------------------------------------
    // Ingredients
    // ------------------------------------------------------------------

    /// Add an ingredient under the next unused code
    pub fn add_ingredient(&mut self, data: IngredientCreate) -> &Ingredient {
        let code = self.next_ingredient_code;
        self.next_ingredient_code += 1;

        tracing::debug!("Adding ingredient {} '{}'", code, data.name);
        self.ingredients.push(Ingredient::new(code, data));
        &self.ingredients[self.ingredients.len() - 1]
    }

    pub fn ingredient_by_code(&self, code: i64) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.code == code)
    }

    /// First ingredient with this name, by insertion order
    pub fn ingredient_by_name(&self, name: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.name == name)
    }

    pub fn ingredient_names(&self) -> Vec<String> {
        self.ingredients.iter().map(|i| i.name.clone()).collect()
    }

    pub fn ingredient_codes(&self) -> Vec<i64> {
        self.ingredients.iter().map(|i| i.code).collect()
    }

    /// Replace every field of an ingredient and recompute the meals using it.
    ///
    /// Returns the codes of the recomputed meals.
    pub fn update_ingredient(&mut self, code: i64, data: IngredientUpdate) -> DbResult<Vec<i64>> {
        let Self { ingredients, meals, .. } = self;

        let ingredient = ingredients
            .iter_mut()
            .find(|i| i.code == code)
            .ok_or(DbError::IngredientNotFound(code))?;
        ingredient.update(data);

        let ingredients = &*ingredients;
        let mut recomputed = Vec::new();
        for meal in meals.iter_mut().filter(|m| m.contains_ingredient(code)) {
            meal.recalculate(ingredients)?;
            recomputed.push(meal.code);
        }

        tracing::debug!("Updated ingredient {}; recomputed meals {:?}", code, recomputed);
        Ok(recomputed)
    }

    /// Codes of every ingredient referenced by at least one meal
    pub fn ingredient_codes_used_in_meals(&self) -> Vec<i64> {
        let mut codes = Vec::new();
        for meal in &self.meals {
            for code in meal.ingredient_codes() {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }
        codes
    }

    /// Names of the meals that use an ingredient
    pub fn meals_using_ingredient(&self, code: i64) -> Vec<String> {
        self.meals
            .iter()
            .filter(|m| m.contains_ingredient(code))
            .map(|m| m.name.clone())
            .collect()
    }

    /// Delete an ingredient that no meal uses.
    ///
    /// Fails with `ItemUsedElsewhere` and leaves the catalog untouched if any
    /// meal still references it.
    pub fn remove_ingredient_by_code(&mut self, code: i64) -> DbResult<bool> {
        let pos = self
            .ingredients
            .iter()
            .position(|i| i.code == code)
            .ok_or(DbError::IngredientNotFound(code))?;

        let used_in = self.meals_using_ingredient(code);
        if !used_in.is_empty() {
            return Err(DbError::ItemUsedElsewhere { code, used_in });
        }

        let removed = self.ingredients.remove(pos);
        tracing::debug!("Removed ingredient {} '{}'", removed.code, removed.name);
        Ok(true)
    }

    /// Delete the first ingredient with this name, under the same usage rule.
    ///
    /// Returns `Ok(false)` if no ingredient has the name.
    pub fn remove_ingredient_by_name(&mut self, name: &str) -> DbResult<bool> {
        match self.ingredient_by_name(name).map(|i| i.code) {
            Some(code) => self.remove_ingredient_by_code(code),
            None => Ok(false),
        }
    }

    // ------------------------------------------------------------------
    // Meals
    // ------------------------------------------------------------------

    /// Add a meal under the next unused code, computing its totals
    pub fn add_meal(&mut self, data: MealCreate) -> DbResult<&Meal> {
        let code = self.next_meal_code;
        let meal = Meal::create(code, data, self.ingredients.as_slice())?;
        self.next_meal_code += 1;

        tracing::debug!("Adding meal {} '{}'", code, meal.name);
        self.meals.push(meal);
        Ok(&self.meals[self.meals.len() - 1])
    }

    pub fn meal_by_code(&self, code: i64) -> Option<&Meal> {
        self.meals.iter().find(|m| m.code == code)
    }

    /// First meal with this name, by insertion order
    pub fn meal_by_name(&self, name: &str) -> Option<&Meal> {
        self.meals.iter().find(|m| m.name == name)
    }

    pub fn meal_names(&self) -> Vec<String> {
        self.meals.iter().map(|m| m.name.clone()).collect()
    }

    pub fn meal_codes(&self) -> Vec<i64> {
        self.meals.iter().map(|m| m.code).collect()
    }

    /// Add an ingredient to a stored meal, or replace its amount
    pub fn add_ingredient_to_meal(&mut self, meal_code: i64, ingredient_code: i64, amount: f64) -> DbResult<&Meal> {
        let Self { ingredients, meals, .. } = self;
        let ingredients = &*ingredients;

        let ingredient = ingredients.require_ingredient(ingredient_code)?;
        let meal = meals
            .iter_mut()
            .find(|m| m.code == meal_code)
            .ok_or(DbError::MealNotFound(meal_code))?;
        meal.add_ingredient(ingredients, ingredient, amount)?;
        Ok(&*meal)
    }

    /// Remove the first ingredient named `name` from a stored meal
    pub fn remove_ingredient_from_meal(&mut self, meal_code: i64, name: &str) -> DbResult<bool> {
        let Self { ingredients, meals, .. } = self;
        let meal = meals
            .iter_mut()
            .find(|m| m.code == meal_code)
            .ok_or(DbError::MealNotFound(meal_code))?;
        meal.remove_ingredient_by_name(ingredients.as_slice(), name)
    }

    /// What a stored meal would look like with an ingredient added; the
    /// stored meal is not changed
    pub fn preview_ingredient_in_meal(&self, meal_code: i64, ingredient_code: i64, amount: f64) -> DbResult<Meal> {
        let meal = self.meal_by_code(meal_code).ok_or(DbError::MealNotFound(meal_code))?;
        let ingredient = self.ingredients.require_ingredient(ingredient_code)?;

        let mut preview = meal.snapshot();
        preview.add_ingredient(self.ingredients.as_slice(), ingredient, amount)?;
        Ok(preview)
    }

    /// Swap a stored meal for another in the same position.
    ///
    /// Returns false if `old_code` is not stored.
    pub fn replace_meal(&mut self, old_code: i64, new_meal: Meal) -> bool {
        match self.meals.iter().position(|m| m.code == old_code) {
            Some(pos) => {
                self.meals[pos] = new_meal;
                true
            }
            None => false,
        }
    }

    /// Delete the first meal with this name. Meals have no dependants.
    pub fn remove_meal_by_name(&mut self, name: &str) -> bool {
        match self.meals.iter().position(|m| m.name == name) {
            Some(pos) => {
                let removed = self.meals.remove(pos);
                tracing::debug!("Removed meal {} '{}'", removed.code, removed.name);
                true
            }
            None => false,
        }
    }

    pub fn remove_meal_by_code(&mut self, code: i64) -> bool {
        match self.meals.iter().position(|m| m.code == code) {
            Some(pos) => {
                let removed = self.meals.remove(pos);
                tracing::debug!("Removed meal {} '{}'", removed.code, removed.name);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Names matching `text`.
    ///
    /// Queries of one or two characters match as a prefix, longer queries
    /// match anywhere in the name.
    pub fn search_by_name(&self, mode: SearchMode, text: &str) -> Vec<String> {
        let names = match mode {
            SearchMode::Ingredients => self.ingredient_names(),
            SearchMode::Meals => self.meal_names(),
            SearchMode::Trips => return Vec::new(),
        };

        if text.chars().count() <= 2 {
            names.into_iter().filter(|n| n.starts_with(text)).collect()
        } else {
            names.into_iter().filter(|n| n.contains(text)).collect()
        }
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Write `<stem>_ingredients.csv`, `<stem>_meals.csv` and the base file
    /// `base_name` into `dir`. Returns the base file path.
    ///
    /// Both data files are rendered before either is written.
    pub fn save(&mut self, dir: &Path, base_name: &str) -> DbResult<PathBuf> {
        let stem = file_stem(Path::new(base_name));
        let ingredients_path = dir.join(format!("{}_ingredients.csv", stem));
        let meals_path = dir.join(format!("{}_meals.csv", stem));

        let ingredient_bytes = storage::render_ingredients(&self.ingredients, self.separator)?;
        let meal_bytes = storage::render_meals(&self.meals, self.separator)?;

        fs::create_dir_all(dir)?;
        fs::write(&ingredients_path, ingredient_bytes)?;
        fs::write(&meals_path, meal_bytes)?;

        let base_path = dir.join(base_name);
        BaseFile {
            code: self.code,
            ingredients_path,
            meals_path: Some(meals_path),
        }
        .write(&base_path)?;

        self.name = stem;
        tracing::info!(
            "Saved database {} ({} ingredients, {} meals) to {}",
            self.code,
            self.ingredients.len(),
            self.meals.len(),
            base_path.display()
        );
        Ok(base_path)
    }

    /// Replace the tables from an ingredient file and an optional meal file.
    ///
    /// Nothing changes unless both files parse.
    pub fn load(&mut self, ingredients_path: &Path, meals_path: Option<&Path>) -> DbResult<()> {
        let ingredients = storage::parse_ingredients(&fs::read(ingredients_path)?, self.separator, &display_name(ingredients_path))?;
        let meals = match meals_path {
            Some(path) => storage::parse_meals(&fs::read(path)?, self.separator, &display_name(path), &ingredients)?,
            None => Vec::new(),
        };

        self.next_ingredient_code = ingredients.iter().map(|i| i.code + 1).max().unwrap_or(0);
        self.next_meal_code = meals.iter().map(|m| m.code + 1).max().unwrap_or(0);
        self.ingredients = ingredients;
        self.meals = meals;

        tracing::info!(
            "Loaded {} ingredients and {} meals",
            self.ingredients.len(),
            self.meals.len()
        );
        Ok(())
    }

    /// Load the files listed in a base file and adopt its identity code
    pub fn load_from_base_file(&mut self, base_path: &Path) -> DbResult<()> {
        let base = BaseFile::read(base_path)?;
        self.load(&base.ingredients_path, base.meals_path.as_deref())?;
        self.code = base.code;
        self.name = file_stem(base_path);

        tracing::info!("Opened database {} '{}' from {}", self.code, self.name, base_path.display());
        Ok(())
    }
}

impl IngredientSource for LocalDatabase {
    fn ingredient(&self, code: i64) -> Option<&Ingredient> {
        self.ingredient_by_code(code)
    }
}

impl MealSource for LocalDatabase {
    fn meal(&self, code: i64) -> Option<&Meal> {
        self.meal_by_code(code)
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealIngredient, Nutrition};

    fn oats() -> IngredientCreate {
        IngredientCreate {
            name: "Rolled Oats".to_string(),
            nutrition: Nutrition::from_array([370.0, 6.9, 1.2, 59.0, 1.3, 10.0, 13.0, 0.0]),
            types: vec![MealType::Breakfast],
            cooking: true,
            water: true,
            price_per_unit: 1.15,
            unit_size: 850.0,
        }
    }

    fn named(name: &str) -> IngredientCreate {
        IngredientCreate {
            name: name.to_string(),
            nutrition: Nutrition::from_array([100.0, 1.0, 0.5, 20.0, 2.0, 3.0, 4.0, 0.1]),
            types: vec![],
            cooking: false,
            water: false,
            price_per_unit: 1.0,
            unit_size: 100.0,
        }
    }

    fn line(code: i64, amount: f64) -> MealIngredient {
        MealIngredient { ingredient_code: code, amount }
    }

    fn stocked() -> LocalDatabase {
        let mut db = LocalDatabase::new();
        db.add_ingredient(oats());
        db.add_ingredient(named("Smooth Peanut Butter"));
        db.add_ingredient(named("Abricots"));
        db.add_meal(MealCreate {
            name: "Breakfast 1".to_string(),
            own_types: vec![MealType::Breakfast],
            ingredients: vec![line(0, 40.0), line(1, 20.0)],
        })
        .unwrap();
        db
    }

    #[test]
    fn test_codes_are_monotonic_and_not_reused() {
        let mut db = LocalDatabase::new();
        let a = db.add_ingredient(named("A")).code;
        let b = db.add_ingredient(named("B")).code;
        assert_eq!((a, b), (0, 1));

        assert!(db.remove_ingredient_by_code(b).unwrap());
        let c = db.add_ingredient(named("C")).code;
        assert_eq!(c, 2);
    }

    #[test]
    fn test_instances_have_independent_counters_and_codes() {
        let mut first = LocalDatabase::new();
        let mut second = LocalDatabase::new();
        first.add_ingredient(named("A"));
        first.add_ingredient(named("B"));

        assert_eq!(second.add_ingredient(named("C")).code, 0);
        assert_ne!(first.code, second.code);
    }

    #[test]
    fn test_rolled_oats_price_per_gram() {
        let mut db = LocalDatabase::new();
        let item = db.add_ingredient(oats());
        assert!((item.price_per_gram() - 0.001353).abs() < 1e-6);
    }

    #[test]
    fn test_remove_used_ingredient_is_refused() {
        let mut db = stocked();
        let before = db.ingredients().len();

        for code in db.ingredient_codes_used_in_meals() {
            match db.remove_ingredient_by_code(code) {
                Err(DbError::ItemUsedElsewhere { code: c, used_in }) => {
                    assert_eq!(c, code);
                    assert_eq!(used_in, vec!["Breakfast 1".to_string()]);
                }
                other => panic!("expected ItemUsedElsewhere, got {:?}", other),
            }
            assert!(db.ingredient_by_code(code).is_some());
        }
        assert_eq!(db.ingredients().len(), before);
    }

    #[test]
    fn test_remove_unused_and_missing_ingredient() {
        let mut db = stocked();
        assert!(db.remove_ingredient_by_code(2).unwrap());
        assert!(db.ingredient_by_code(2).is_none());
        assert!(matches!(
            db.remove_ingredient_by_code(2),
            Err(DbError::IngredientNotFound(2))
        ));
    }

    #[test]
    fn test_remove_ingredient_by_name_checks_usage() {
        let mut db = stocked();
        assert!(matches!(
            db.remove_ingredient_by_name("Rolled Oats"),
            Err(DbError::ItemUsedElsewhere { .. })
        ));
        assert!(!db.remove_ingredient_by_name("Granola").unwrap());
        assert!(db.remove_ingredient_by_name("Abricots").unwrap());
    }

    #[test]
    fn test_update_ingredient_reaches_meals() {
        let mut db = stocked();
        let mut data = oats();
        data.nutrition.energy = 400.0;
        data.cooking = false;
        data.water = false;

        let recomputed = db.update_ingredient(0, data).unwrap();
        assert_eq!(recomputed, vec![0]);

        let meal = db.meal_by_code(0).unwrap();
        assert!((meal.nutrition().energy - (160.0 + 20.0)).abs() < 1e-9);
        assert!(!meal.cooking());
        assert_eq!(db.ingredient_by_code(0).unwrap().code, 0);

        assert!(matches!(
            db.update_ingredient(42, oats()),
            Err(DbError::IngredientNotFound(42))
        ));
    }

    #[test]
    fn test_add_meal_with_unknown_ingredient_fails() {
        let mut db = stocked();
        let result = db.add_meal(MealCreate {
            name: "Ghost".to_string(),
            own_types: vec![],
            ingredients: vec![line(9, 10.0)],
        });
        assert!(matches!(result, Err(DbError::IngredientNotFound(9))));
        assert_eq!(db.meals().len(), 1);

        let next = db.add_meal(MealCreate { name: "Empty".to_string(), ..Default::default() }).unwrap();
        assert_eq!(next.code, 1);
        assert_eq!(next.weight(), 0.0);
    }

    #[test]
    fn test_meal_editing_through_database() {
        let mut db = stocked();
        let meal = db.add_ingredient_to_meal(0, 2, 30.0).unwrap();
        assert_eq!(meal.weight(), 90.0);

        let preview = db.preview_ingredient_in_meal(0, 2, 50.0).unwrap();
        assert_eq!(preview.weight(), 110.0);
        assert_eq!(db.meal_by_code(0).unwrap().weight(), 90.0);

        assert!(db.remove_ingredient_from_meal(0, "Abricots").unwrap());
        assert_eq!(db.meal_by_code(0).unwrap().weight(), 60.0);
        assert!(matches!(
            db.add_ingredient_to_meal(7, 0, 1.0),
            Err(DbError::MealNotFound(7))
        ));
    }

    #[test]
    fn test_remove_meal_unblocks_ingredient() {
        let mut db = stocked();
        assert!(db.remove_meal_by_name("Breakfast 1"));
        assert!(!db.remove_meal_by_name("Breakfast 1"));
        assert!(db.remove_ingredient_by_code(0).unwrap());
    }

    #[test]
    fn test_replace_meal() {
        let mut db = stocked();
        let mut edited = db.meal_by_code(0).unwrap().snapshot();
        edited.name = "Breakfast One".to_string();

        assert!(db.replace_meal(0, edited.clone()));
        assert_eq!(db.meal_names(), vec!["Breakfast One".to_string()]);
        assert!(!db.replace_meal(99, edited));
    }

    #[test]
    fn test_search_short_query_is_prefix() {
        let mut db = LocalDatabase::new();
        for name in ["abc", "xabc", "ab", "Abc", "cab"] {
            db.add_ingredient(named(name));
        }

        assert_eq!(db.search_by_name(SearchMode::Ingredients, "ab"), vec!["abc", "ab"]);
        assert_eq!(db.search_by_name(SearchMode::Ingredients, "abc"), vec!["abc", "xabc"]);
        assert_eq!(db.search_by_name(SearchMode::Ingredients, "a").len(), 2);
        assert_eq!(db.search_by_name(SearchMode::Ingredients, "").len(), 5);
        assert!(db.search_by_name(SearchMode::Ingredients, "zzz").is_empty());
        assert!(db.search_by_name(SearchMode::Trips, "ab").is_empty());
    }

    #[test]
    fn test_search_meals() {
        let db = stocked();
        assert_eq!(db.search_by_name(SearchMode::Meals, "fast"), vec!["Breakfast 1"]);
        assert!(db.search_by_name(SearchMode::Meals, "fa").is_empty());
    }

    #[test]
    fn test_duplicate_names_resolve_to_first_inserted() {
        let mut db = LocalDatabase::new();
        let first = db.add_ingredient(named("Salt")).code;
        let second = db.add_ingredient(named("Salt")).code;

        assert_eq!(db.ingredient_by_name("Salt").unwrap().code, first);
        assert!(db.remove_ingredient_by_name("Salt").unwrap());
        assert_eq!(db.ingredient_by_name("Salt").unwrap().code, second);

        db.add_meal(MealCreate { name: "Soup".to_string(), ..Default::default() }).unwrap();
        db.add_meal(MealCreate { name: "Soup".to_string(), ..Default::default() }).unwrap();
        assert_eq!(db.meal_by_name("Soup").unwrap().code, 0);
        assert!(db.remove_meal_by_name("Soup"));
        assert_eq!(db.meal_by_name("Soup").unwrap().code, 1);
    }

    #[test]
    fn test_meal_type_names() {
        let db = LocalDatabase::new();
        assert_eq!(db.meal_type_names(), vec!["Breakfast", "Lunch", "Dinner", "Snack"]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = stocked();
        let mut unpriced = named("Wild Garlic");
        unpriced.price_per_unit = f64::NAN;
        db.add_ingredient(unpriced);
        db.add_meal(MealCreate {
            name: "Garlic Snack; spicy".to_string(),
            own_types: vec![MealType::Lunch, MealType::Snack],
            ingredients: vec![line(3, 5.0), line(2, 12.5)],
        })
        .unwrap();

        let base_path = db.save(dir.path(), "alps.txt").unwrap();
        assert_eq!(db.name, "alps");
        assert!(dir.path().join("alps_ingredients.csv").exists());
        assert!(dir.path().join("alps_meals.csv").exists());

        let loaded = LocalDatabase::open(&base_path).unwrap();
        assert_eq!(loaded.code, db.code);
        assert_eq!(loaded.name, "alps");
        assert_eq!(loaded.ingredient_codes(), db.ingredient_codes());
        assert_eq!(loaded.ingredient_names(), db.ingredient_names());
        for (a, b) in loaded.ingredients().iter().zip(db.ingredients()) {
            assert_eq!(a.nutrition, b.nutrition);
            assert_eq!(a.types, b.types);
            assert_eq!(a.cooking, b.cooking);
        }
        assert!(loaded.ingredient_by_code(3).unwrap().price_per_gram().is_nan());

        assert_eq!(loaded.meal_codes(), db.meal_codes());
        assert_eq!(loaded.meal_names(), db.meal_names());
        for (a, b) in loaded.meals().iter().zip(db.meals()) {
            assert_eq!(a.ingredients(), b.ingredients());
            assert_eq!(a.own_types, b.own_types);
            assert!(a.nutrition().approx_eq(&b.nutrition(), 1e-9));
        }
        assert!(loaded.meal_by_code(1).unwrap().cost().is_nan());
    }

    #[test]
    fn test_padded_names_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = LocalDatabase::new();
        db.add_ingredient(named(" Oats "));
        db.add_meal(MealCreate {
            name: "  Porridge".to_string(),
            ingredients: vec![line(0, 80.0)],
            ..Default::default()
        })
        .unwrap();

        let base_path = db.save(dir.path(), "padded.txt").unwrap();
        let loaded = LocalDatabase::open(&base_path).unwrap();
        assert_eq!(loaded.ingredient_names(), vec![" Oats ".to_string()]);
        assert_eq!(loaded.meal_names(), vec!["  Porridge".to_string()]);
        assert!(loaded.meal_by_name("  Porridge").is_some());
    }

    #[test]
    fn test_load_continues_codes_after_highest() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = stocked();
        db.remove_ingredient_by_code(2).unwrap();
        db.add_ingredient(named("Late Addition"));
        let base_path = db.save(dir.path(), "gaps.txt").unwrap();

        let mut loaded = LocalDatabase::open(&base_path).unwrap();
        assert_eq!(loaded.add_ingredient(named("Next")).code, 4);
        let meal_code = loaded
            .add_meal(MealCreate { name: "Next".to_string(), ..Default::default() })
            .unwrap()
            .code;
        assert_eq!(meal_code, 1);
    }

    #[test]
    fn test_load_without_meals_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = stocked();
        db.save(dir.path(), "solo.txt").unwrap();

        let mut fresh = LocalDatabase::new();
        fresh
            .load(&dir.path().join("solo_ingredients.csv"), None)
            .unwrap();
        assert_eq!(fresh.ingredients().len(), 3);
        assert!(!fresh.has_meals());
    }

    #[test]
    fn test_failed_load_leaves_tables_alone() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.csv");
        std::fs::write(&broken, "code;name\n0;Oats\n").unwrap();

        let mut db = stocked();
        assert!(db.load(&broken, None).is_err());
        assert_eq!(db.ingredients().len(), 3);
        assert_eq!(db.meals().len(), 1);
    }
}
