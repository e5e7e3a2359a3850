use garagebook::model::{Money, Role, YearMonth};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "garagebook")]
#[command(about = "Workshop records for a small auto-repair business", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "GARAGEBOOK_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Log as this employee before running the command
    #[arg(long, global = true, env = "GARAGEBOOK_USER")]
    pub user: Option<String>,

    /// Password for --user
    #[arg(long, global = true, env = "GARAGEBOOK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage clients
    #[command(subcommand)]
    #[command(alias = "c")]
    Client(ClientCommand),

    /// Manage vehicles
    #[command(subcommand)]
    #[command(alias = "v")]
    Vehicle(VehicleCommand),

    /// Manage employees
    #[command(subcommand)]
    #[command(alias = "e")]
    Employee(EmployeeCommand),

    /// Services and parts on offer
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Record and list purchases
    #[command(subcommand)]
    #[command(alias = "p")]
    Purchase(PurchaseCommand),

    /// Record and list monthly expenses
    #[command(subcommand)]
    Expense(ExpenseCommand),

    /// Income, expenses and net for a month
    Report {
        /// Month as YYYY-MM (defaults to the current month)
        month: Option<YearMonth>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (obfuscate, date-format)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Register a new client
    Add {
        name: String,
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// List all clients
    #[command(alias = "ls")]
    List,

    /// Show a client with vehicles and purchases
    Show {
        /// Client id or unique id prefix
        id: String,
    },

    /// Fuzzy search by name
    Find { pattern: String },

    /// Change contact details
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        email: Option<String>,
    },

    /// Remove a client who owns no vehicles
    #[command(alias = "rm")]
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum VehicleCommand {
    /// Register a vehicle for a client
    Add {
        /// Owner id or unique id prefix
        owner: String,
        make: String,
        model: String,
        year: u16,
        plate: String,
    },

    /// List vehicles
    #[command(alias = "ls")]
    List {
        /// Only vehicles of this client
        #[arg(long)]
        owner: Option<String>,
    },

    /// Remove a vehicle
    #[command(alias = "rm")]
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum EmployeeCommand {
    /// Add an employee (a manager must be logged in once one exists)
    Add {
        name: String,
        role: Role,
        /// Password for the new employee
        #[arg(long, env = "GARAGEBOOK_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },

    /// List employees
    #[command(alias = "ls")]
    List,

    /// Check credentials and record the login
    Login { name: String, password: String },
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Add a service
    AddService {
        name: String,
        price: Money,
        /// Expected labour in minutes
        #[arg(long, default_value_t = 60)]
        minutes: u32,
    },

    /// Add a part to the store
    AddPart {
        name: String,
        price: Money,
        #[arg(long, default_value_t = 0)]
        stock: u32,
    },

    /// Add stock to a part
    Restock { id: String, quantity: u32 },

    /// List services and parts
    #[command(alias = "ls")]
    List,
}

#[derive(Args, Debug)]
pub struct PurchaseLines {
    /// Service as ID or ID:QTY (repeatable)
    #[arg(long = "service", short = 's')]
    pub services: Vec<String>,

    /// Part as ID or ID:QTY (repeatable)
    #[arg(long = "part", short = 'p')]
    pub parts: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum PurchaseCommand {
    /// Record a purchase for a client
    Record {
        client: String,
        #[arg(long)]
        vehicle: Option<String>,
        #[command(flatten)]
        lines: PurchaseLines,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List purchases
    #[command(alias = "ls")]
    List {
        /// Only this month (YYYY-MM)
        #[arg(long)]
        month: Option<YearMonth>,
        /// Only this client
        #[arg(long)]
        client: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// Record an expense
    Add {
        description: String,
        amount: Money,
        #[arg(long)]
        category: Option<String>,
        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Remove an expense recorded by mistake
    #[command(alias = "rm")]
    Remove {
        id: String,
        /// Month the expense is filed under (defaults to the current month)
        #[arg(long)]
        month: Option<YearMonth>,
    },

    /// List a month's expenses
    #[command(alias = "ls")]
    List {
        /// Month as YYYY-MM (defaults to the current month)
        month: Option<YearMonth>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_commands() {
        let cli = Cli::parse_from([
            "garagebook",
            "--data-dir",
            "/tmp/shop",
            "purchase",
            "record",
            "ab12",
            "-s",
            "cd34",
            "-p",
            "ef56:2",
            "--date",
            "2026-10-19",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/shop")));
        match cli.command {
            Commands::Purchase(PurchaseCommand::Record { client, lines, date, .. }) => {
                assert_eq!(client, "ab12");
                assert_eq!(lines.services, vec!["cd34"]);
                assert_eq!(lines.parts, vec!["ef56:2"]);
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 19));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn typed_arguments_are_validated() {
        assert!(Cli::try_parse_from(["garagebook", "expense", "add", "rent", "-5"]).is_err());
        assert!(Cli::try_parse_from(["garagebook", "report", "2026-13"]).is_err());
        assert!(Cli::try_parse_from(["garagebook", "employee", "add", "Mo", "janitor", "--new-password", "x"]).is_err());

        let cli = Cli::try_parse_from(["garagebook", "expense", "add", "rent", "950.5"]).unwrap();
        match cli.command {
            Commands::Expense(ExpenseCommand::Add { amount, .. }) => {
                assert_eq!(amount, Money::from_cents(95_050))
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
