//! Trip files
//!
//! Line 1 is the linked database code, line 2 its name, then a delimited
//! table with one row per day and one column per meal type.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use super::database::{file_stem, LocalDatabase};
use super::error::{DbError, DbResult};
use crate::models::{MealSource, MealType, Trip};

/// Read only the linked database code of a trip file
pub fn read_linked_code(path: &Path) -> DbResult<i64> {
    let text = fs::read_to_string(path)?;
    parse_linked_code(&text, &path.display().to_string())
}

fn parse_linked_code(text: &str, source_name: &str) -> DbResult<i64> {
    let first = text.lines().next().unwrap_or("").trim();
    first
        .parse::<i64>()
        .map_err(|_| DbError::malformed(source_name, 1, format!("'{}' is not a database code", first)))
}

impl LocalDatabase {
    /// Write a trip planned against this database.
    ///
    /// A trip linked to another database is refused; an unlinked trip is
    /// saved as belonging to this one. Slots naming deleted meals are
    /// written empty, since their codes may be handed out again after a
    /// reload.
    pub fn save_trip(&self, trip: &Trip, path: &Path) -> DbResult<()> {
        if trip.linked_db_code.is_some() && !trip.verify_paired_database(self.code) {
            return Err(DbError::PairingMismatch {
                trip_db_code: trip.linked_db_code,
                database_code: self.code,
            });
        }

        let mut writer = WriterBuilder::new()
            .delimiter(self.separator())
            .from_writer(Vec::new());
        let mut header = vec!["day"];
        header.extend(MealType::ALL.iter().map(|t| t.name()));
        writer.write_record(&header)?;

        for (index, day) in trip.days().iter().enumerate() {
            let mut record = vec![(index + 1).to_string()];
            for meal_type in MealType::ALL {
                let field = match day.meal_code(meal_type) {
                    Some(code) if self.meal(code).is_some() => code.to_string(),
                    Some(code) => {
                        tracing::warn!(
                            "Trip '{}' day {} {}: meal {} is not in the database; slot saved empty",
                            trip.name,
                            index + 1,
                            meal_type.name(),
                            code
                        );
                        String::new()
                    }
                    None => String::new(),
                };
                record.push(field);
            }
            writer.write_record(&record)?;
        }
        let table = writer.into_inner().map_err(|e| DbError::Io(e.into_error()))?;

        let mut bytes = format!("{}\n{}\n", self.code, self.name).into_bytes();
        bytes.extend(table);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, bytes)?;

        tracing::info!("Saved trip '{}' ({} days) to {}", trip.name, trip.duration(), path.display());
        Ok(())
    }

    /// Load a trip planned against this database.
    ///
    /// The linked code on line 1 is checked before any slot is read, so a
    /// trip from another database fails with `PairingMismatch`. Slots naming
    /// meals this database no longer has are left empty.
    pub fn load_trip(&self, path: &Path) -> DbResult<Trip> {
        let text = fs::read_to_string(path)?;
        let source_name = path.display().to_string();

        let linked_code = parse_linked_code(&text, &source_name)?;
        let mut trip = Trip::without_days().with_name(file_stem(path));
        trip.link_database(linked_code, "");
        if !trip.verify_paired_database(self.code) {
            return Err(DbError::PairingMismatch {
                trip_db_code: Some(linked_code),
                database_code: self.code,
            });
        }

        let mut lines = text.splitn(3, '\n');
        lines.next();
        let db_name = lines.next().unwrap_or("").trim().to_string();
        trip.link_database(linked_code, db_name);
        let table = lines.next().unwrap_or("");

        let mut reader = ReaderBuilder::new()
            .delimiter(self.separator())
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(table.as_bytes());

        for result in reader.records() {
            let record = result?;
            // header is file line 3
            let line = record.position().map(|p| p.line() as usize + 2).unwrap_or(0);
            trip.add_day();
            let day_index = trip.duration() - 1;

            for meal_type in MealType::ALL {
                let field = record.get(meal_type.index() + 1).unwrap_or("");
                if field.is_empty() {
                    continue;
                }
                let code = field.parse::<i64>().map_err(|_| {
                    DbError::malformed(&source_name, line, format!("'{}' is not a meal code", field))
                })?;

                if self.meal(code).is_some() {
                    trip.set_meal_at_day(code, day_index, meal_type);
                } else {
                    tracing::warn!(
                        "Trip {} day {} {}: meal {} is not in the database; slot left empty",
                        source_name,
                        day_index + 1,
                        meal_type.name(),
                        code
                    );
                }
            }
        }

        if trip.duration() == 0 {
            trip.add_day();
        }

        tracing::info!("Loaded trip '{}' ({} days) from {}", trip.name, trip.duration(), path.display());
        Ok(trip)
    }
}
