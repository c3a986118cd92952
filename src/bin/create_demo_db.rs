use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use momo_dashboard::{count_transactions, import_transactions, initialize_db, mock};

/// A utility for creating a demo database filled with mock MoMo transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of transactions to generate.
    #[arg(long, short, default_value_t = 200)]
    count: usize,

    /// The seed for the random generator, the same seed gives the same transactions.
    #[arg(long, short, default_value_t = 42)]
    seed: u64,
}

/// Create and populate a database for demos and manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'demo.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'demo.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!(
        "Generating {} transactions with seed {}...",
        args.count, args.seed
    );
    let transactions = mock::generate_transactions(args.count, args.seed, OffsetDateTime::now_utc());

    let tx = conn.unchecked_transaction()?;
    import_transactions(transactions, &tx)?;
    tx.commit()?;

    println!("Success! Created {} transactions.", count_transactions(&conn)?);

    Ok(())
}
