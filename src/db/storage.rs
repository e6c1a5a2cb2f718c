//! Delimited file storage
//!
//! Rendering and parsing of the ingredient, meal and base files. Rendering
//! works on in-memory buffers so callers can write both data files only once
//! both are complete.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use super::error::{DbError, DbResult};
use crate::models::{Ingredient, IngredientCreate, Meal, MealCreate, MealIngredient, MealType, Nutrition, NUTRIENT_COUNT, NUTRIENT_LABELS};

const INGREDIENT_COLUMNS: [&str; 6] = ["cooking", "water", "price_per_unit", "unit_size", "price_per_gram", "types"];
const MEAL_COLUMNS: [&str; 7] = ["own_types", "ingredients", "amount", "cooking", "water", "cost", "weight"];

fn header(tail: &[&'static str]) -> Vec<&'static str> {
    let mut columns = vec!["code", "name"];
    columns.extend(NUTRIENT_LABELS);
    columns.extend_from_slice(tail);
    columns
}

fn flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> DbResult<Vec<u8>> {
    writer.into_inner().map_err(|e| DbError::Io(e.into_error()))
}

/// Render the ingredient table
pub fn render_ingredients(items: &[Ingredient], separator: u8) -> DbResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().delimiter(separator).from_writer(Vec::new());
    writer.write_record(header(&INGREDIENT_COLUMNS))?;

    for item in items {
        let mut record = vec![item.code.to_string(), item.name.clone()];
        record.extend(item.nutrition.as_array().iter().map(f64::to_string));
        record.push(flag(item.cooking));
        record.push(flag(item.water));
        record.push(item.price_per_unit.to_string());
        record.push(item.unit_size.to_string());
        record.push(item.price_per_gram().to_string());
        record.push(MealType::encode_codes(&item.types));
        writer.write_record(&record)?;
    }

    into_bytes(writer)
}

/// Render the meal table, including the denormalized totals
pub fn render_meals(meals: &[Meal], separator: u8) -> DbResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().delimiter(separator).from_writer(Vec::new());
    writer.write_record(header(&MEAL_COLUMNS))?;

    for meal in meals {
        let mut record = vec![meal.code.to_string(), meal.name.clone()];
        record.extend(meal.nutrition().as_array().iter().map(f64::to_string));
        record.push(MealType::encode_codes(&meal.own_types));
        record.push(bracketed(meal.ingredient_codes()));
        record.push(bracketed(meal.ingredient_amounts()));
        record.push(flag(meal.cooking()));
        record.push(flag(meal.water()));
        record.push(meal.cost().to_string());
        record.push(meal.weight().to_string());
        writer.write_record(&record)?;
    }

    into_bytes(writer)
}

fn bracketed<T: ToString>(values: Vec<T>) -> String {
    let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Column positions looked up by header name
struct Columns<'a> {
    headers: StringRecord,
    source_name: &'a str,
}

impl<'a> Columns<'a> {
    fn position(&self, name: &str) -> DbResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DbError::malformed(self.source_name, 1, format!("column '{}' not found", name)))
    }

    fn nutrients(&self) -> DbResult<[usize; NUTRIENT_COUNT]> {
        let mut positions = [0; NUTRIENT_COUNT];
        for (slot, label) in NUTRIENT_LABELS.iter().enumerate() {
            positions[slot] = self.position(label)?;
        }
        Ok(positions)
    }
}

/// One parsed row, carrying its line number for error messages
struct Row<'a> {
    record: StringRecord,
    line: usize,
    source_name: &'a str,
}

impl<'a> Row<'a> {
    /// The field as written; names keep their padding
    fn text(&self, idx: usize) -> DbResult<&str> {
        self.record
            .get(idx)
            .ok_or_else(|| DbError::malformed(self.source_name, self.line, format!("missing field {}", idx + 1)))
    }

    fn value(&self, idx: usize) -> DbResult<&str> {
        Ok(self.text(idx)?.trim())
    }

    fn code(&self, idx: usize) -> DbResult<i64> {
        let text = self.value(idx)?;
        text.parse::<i64>()
            .map_err(|_| DbError::malformed(self.source_name, self.line, format!("'{}' is not a code", text)))
    }

    /// Empty fields and `nan` read as NaN
    fn number(&self, idx: usize) -> DbResult<f64> {
        let text = self.value(idx)?;
        if text.is_empty() || text.eq_ignore_ascii_case("nan") {
            return Ok(f64::NAN);
        }
        text.parse::<f64>()
            .map_err(|_| DbError::malformed(self.source_name, self.line, format!("'{}' is not a number", text)))
    }

    /// Only the literal `true` (any case, any padding) is true
    fn flag(&self, idx: usize) -> DbResult<bool> {
        Ok(self.value(idx)?.to_lowercase() == "true")
    }

    fn meal_types(&self, idx: usize) -> DbResult<Vec<MealType>> {
        MealType::decode_codes(self.value(idx)?).map_err(|e| match e {
            DbError::Malformed { message, .. } => DbError::malformed(self.source_name, self.line, message),
            other => other,
        })
    }

    fn nutrition(&self, positions: &[usize; NUTRIENT_COUNT]) -> DbResult<Nutrition> {
        let mut values = [0.0; NUTRIENT_COUNT];
        for (slot, idx) in positions.iter().enumerate() {
            values[slot] = self.number(*idx)?;
        }
        Ok(Nutrition::from_array(values))
    }

    /// Items of a `[a, b, c]` field, with brackets and quotes stripped
    fn list(&self, idx: usize) -> DbResult<Vec<String>> {
        let cleaned: String = self
            .value(idx)?
            .chars()
            .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
            .collect();
        Ok(cleaned
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn rows<'a>(bytes: &[u8], separator: u8, source_name: &'a str) -> DbResult<(Columns<'a>, Vec<Row<'a>>)> {
    let mut reader = ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let columns = Columns {
        headers: reader.headers()?.clone(),
        source_name,
    };

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        rows.push(Row { record, line, source_name });
    }
    Ok((columns, rows))
}

/// Parse an ingredient table
pub fn parse_ingredients(bytes: &[u8], separator: u8, source_name: &str) -> DbResult<Vec<Ingredient>> {
    let (columns, rows) = rows(bytes, separator, source_name)?;
    let code = columns.position("code")?;
    let name = columns.position("name")?;
    let nutrients = columns.nutrients()?;
    let cooking = columns.position("cooking")?;
    let water = columns.position("water")?;
    let price_per_unit = columns.position("price_per_unit")?;
    let unit_size = columns.position("unit_size")?;
    let types = columns.position("types")?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(Ingredient::new(
            row.code(code)?,
            IngredientCreate {
                name: row.text(name)?.to_string(),
                nutrition: row.nutrition(&nutrients)?,
                types: row.meal_types(types)?,
                cooking: row.flag(cooking)?,
                water: row.flag(water)?,
                price_per_unit: row.number(price_per_unit)?,
                unit_size: row.number(unit_size)?,
            },
        ));
    }

    tracing::debug!("Parsed {} ingredients from {}", items.len(), source_name);
    Ok(items)
}

/// Parse a meal table and rebuild every meal's totals from `catalog`.
///
/// Stored `cost` and `weight` columns that disagree with the rebuilt totals
/// are reported and replaced.
pub fn parse_meals(bytes: &[u8], separator: u8, source_name: &str, catalog: &[Ingredient]) -> DbResult<Vec<Meal>> {
    let (columns, rows) = rows(bytes, separator, source_name)?;
    let code = columns.position("code")?;
    let name = columns.position("name")?;
    let own_types = columns.position("own_types")?;
    let ingredients = columns.position("ingredients")?;
    let amount = columns.position("amount")?;
    let cost = columns.position("cost")?;
    let weight = columns.position("weight")?;

    let mut meals = Vec::with_capacity(rows.len());
    for row in &rows {
        let codes = row.list(ingredients)?;
        let amounts = row.list(amount)?;
        if codes.len() != amounts.len() {
            return Err(DbError::malformed(
                source_name,
                row.line,
                format!("{} ingredient codes but {} amounts", codes.len(), amounts.len()),
            ));
        }

        let mut lines = Vec::with_capacity(codes.len());
        for (code_text, amount_text) in codes.iter().zip(&amounts) {
            let ingredient_code = code_text.parse::<i64>().map_err(|_| {
                DbError::malformed(source_name, row.line, format!("'{}' is not an ingredient code", code_text))
            })?;
            let amount = amount_text.parse::<f64>().map_err(|_| {
                DbError::malformed(source_name, row.line, format!("'{}' is not an amount", amount_text))
            })?;
            lines.push(MealIngredient { ingredient_code, amount });
        }

        let meal = Meal::create(
            row.code(code)?,
            MealCreate {
                name: row.text(name)?.to_string(),
                own_types: row.meal_types(own_types)?,
                ingredients: lines,
            },
            catalog,
        )?;

        let stored_cost = row.number(cost)?;
        let stored_weight = row.number(weight)?;
        if differs(stored_cost, meal.cost()) || differs(stored_weight, meal.weight()) {
            tracing::warn!(
                "Meal {} '{}' in {}: stored cost/weight {}/{} reconciled to {}/{}",
                meal.code,
                meal.name,
                source_name,
                stored_cost,
                stored_weight,
                meal.cost(),
                meal.weight()
            );
        }
        meals.push(meal);
    }

    tracing::debug!("Parsed {} meals from {}", meals.len(), source_name);
    Ok(meals)
}

fn differs(stored: f64, computed: f64) -> bool {
    if stored.is_nan() || computed.is_nan() {
        return stored.is_nan() != computed.is_nan();
    }
    (stored - computed).abs() > 1e-6 * computed.abs().max(1.0)
}

/// The small file naming a database: its code and its data files
#[derive(Debug, Clone, PartialEq)]
pub struct BaseFile {
    pub code: i64,
    pub ingredients_path: PathBuf,
    pub meals_path: Option<PathBuf>,
}

impl BaseFile {
    /// Read a base file. Relative data paths resolve against its directory.
    pub fn read(path: &Path) -> DbResult<Self> {
        let text = fs::read_to_string(path)?;
        let source_name = path.display().to_string();
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut lines = text.lines().map(str::trim);

        let code_line = lines.next().unwrap_or("");
        let code = code_line
            .parse::<i64>()
            .map_err(|_| DbError::malformed(&source_name, 1, format!("'{}' is not a database code", code_line)))?;

        let ingredients_path = match lines.next() {
            Some(line) if !line.is_empty() => dir.join(line),
            _ => return Err(DbError::malformed(&source_name, 2, "missing ingredients file")),
        };
        let meals_path = lines.next().filter(|l| !l.is_empty()).map(|l| dir.join(l));

        Ok(Self {
            code,
            ingredients_path,
            meals_path,
        })
    }

    /// Write the base file. Data files next to it are stored by file name.
    pub fn write(&self, path: &Path) -> DbResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut text = format!("{}\n{}\n", self.code, relative_to(&self.ingredients_path, dir).display());
        if let Some(meals_path) = &self.meals_path {
            text.push_str(&format!("{}\n", relative_to(meals_path, dir).display()));
        }
        fs::write(path, text)?;
        Ok(())
    }
}

fn relative_to<'p>(path: &'p Path, dir: &Path) -> &'p Path {
    path.strip_prefix(dir).unwrap_or(path)
}
