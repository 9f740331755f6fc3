use std::{
    error::Error,
    io::{self, Write},
    path::Path,
    process::exit,
    str::FromStr,
    sync::{Arc, Mutex},
};

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;

use expense_tracker::{SQLiteUserStore, UserStore, initialize_db};

/// A utility for deleting a registered user and all of their expenses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email of the user to delete.
    #[arg(long)]
    email: String,

    /// Delete without asking for confirmation.
    #[arg(long, short)]
    yes: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let email = match EmailAddress::from_str(&args.email) {
        Ok(email) => email,
        Err(error) => {
            eprintln!("Invalid email {:?}: {error}", args.email);
            exit(1);
        }
    };

    let conn = Connection::open(db_path)?;
    // Turns on foreign keys so the user's expenses are deleted with them.
    initialize_db(&conn)?;
    let users = SQLiteUserStore::new(Arc::new(Mutex::new(conn)));

    let Some(user) = users.find_by_email(&email)? else {
        eprintln!("No user is registered with the email {email}.");
        exit(1);
    };

    if !args.yes && !confirm(&format!("Delete {email} and all of their expenses?"))? {
        println!("Nothing was deleted.");
        return Ok(());
    }

    users.delete(user.id)?;
    println!("Deleted user {email}.");

    Ok(())
}

fn confirm(question: &str) -> Result<bool, io::Error> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
