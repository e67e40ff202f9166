//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `retail_core` linkage and store bootstrap from `RETAIL_*`
//!   environment settings.
//! - Print one `name=value` line per collection for quick sanity checks.

use log::info;
use retail_core::{
    init_logging_from, open_db_with, Branch, Collection, CoreConfig, DocumentStore, Employee,
    Product, Sells, StoreResult,
};
use rusqlite::Connection;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("retail_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from(&config).map_err(|err| err.to_string())?;

    println!("retail_core ping={}", retail_core::ping());
    println!("retail_core version={}", retail_core::core_version());

    let conn = open_db_with(&config.store).map_err(|err| err.to_string())?;
    println!("store mode={}", config.store.location.mode());
    for (name, count) in [
        (Employee::NAME, count::<Employee>(&conn)),
        (Product::NAME, count::<Product>(&conn)),
        (Branch::NAME, count::<Branch>(&conn)),
        (Sells::NAME, count::<Sells>(&conn)),
    ] {
        let count = count.map_err(|err| err.to_string())?;
        println!("{name}={count}");
    }
    info!("event=cli_probe module=cli status=ok");
    Ok(())
}

fn count<C: Collection>(conn: &Connection) -> StoreResult<u64> {
    DocumentStore::<C>::try_new(conn)?.count()
}
