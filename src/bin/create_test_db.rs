use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    Category, NewExpense, NewIncome, NewSavingsGoal, PasswordHash, ValidatedPassword,
    create_expense, create_goal, create_income, create_user, initialize_db,
};

/// A utility for creating a test database for the JSON API server of finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
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

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user("test", "test@example.com", password_hash, &conn)?;

    println!("Creating income and expenses...");

    let today = OffsetDateTime::now_utc().date();

    for months_ago in 0..6 {
        let date = today - Duration::days(30 * months_ago);
        let salary = NewIncome::new("Salary", dec!(4200), date, "", today)?;
        create_income(user.id, &salary, &conn)?;

        let expenses: [(&str, Category, Decimal); 4] = [
            ("Rent", Category::Rent, dec!(1650)),
            ("Groceries", Category::Food, dec!(412.37)),
            ("Power bill", Category::Utilities, dec!(148.20)),
            ("Bus pass", Category::Travel, dec!(60)),
        ];

        for (title, category, amount) in expenses {
            let expense = NewExpense::new(title, category, amount, date, "")?;
            create_expense(user.id, &expense, &conn)?;
        }
    }

    println!("Creating savings goals...");

    let goals = [
        ("Emergency fund", dec!(10000), dec!(3500), 180),
        ("New laptop", dec!(2400), dec!(300), 60),
    ];

    for (name, target_amount, current_amount, days_until_deadline) in goals {
        let goal = NewSavingsGoal::new(
            name,
            target_amount,
            current_amount,
            today + Duration::days(days_until_deadline),
            today,
        )?;
        create_goal(user.id, &goal, &conn)?;
    }

    println!("Success! Log in with the username \"test\" and the password \"test\".");

    Ok(())
}
