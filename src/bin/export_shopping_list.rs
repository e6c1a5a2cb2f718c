//! Utility to export the shopping list of a saved trip
//!
//! Usage: export_shopping_list <base file> <trip file> [persons]
//!
//! Relative paths resolve against the databases and trips directories.

use trailfood::config::Settings;
use trailfood::db::LocalDatabase;
use trailfood::models::ShoppingList;
use trailfood::tools::shopping::default_file_name;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <base file> <trip file> [persons]", args[0]);
        std::process::exit(1);
    }

    let persons: u32 = match args.get(3) {
        Some(value) => value.parse()?,
        None => 1,
    };
    if persons == 0 {
        return Err("persons must be at least 1".into());
    }

    let settings = Settings::from_env();
    settings.ensure_dirs()?;

    let base_path = Settings::resolve(&settings.databases_dir(), &args[1]);
    let trip_path = Settings::resolve(&settings.trips_dir(), &args[2]);
    println!("Database: {}", base_path.display());
    println!("Trip: {}", trip_path.display());

    let mut database = LocalDatabase::new().with_separator(settings.separator);
    database.load_from_base_file(&base_path)?;
    let trip = database.load_trip(&trip_path)?;

    let list = ShoppingList::for_trip(&trip, &database, persons)?;
    let out_path = settings.shopping_lists_dir().join(default_file_name(&trip.name));
    list.export(&out_path)?;

    println!("Shopping list for {} person(s), {} day(s):", persons, trip.duration());
    for row in list.rows() {
        println!(
            "  {:<30} {:>9.1} g  {:>4} x {:<7} {:>8.2}",
            row.ingredient_name, row.total_amount_needed, row.needed_units, row.unit_size, row.total_price
        );
    }
    println!("Total: {:.2}", list.total_cost());
    println!("Written to {}", out_path.display());

    Ok(())
}
