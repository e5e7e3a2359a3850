use clap::Parser;
use directories::ProjectDirs;
use garagebook::api::{CmdMessage, ClientUpdate, ConfigAction, ShopApi};
use garagebook::commands::CmdResult;
use garagebook::error::{Result, ShopError};
use std::path::PathBuf;

mod args;
mod print;
use args::{
    CatalogCommand, Cli, ClientCommand, Commands, EmployeeCommand, ExpenseCommand,
    PurchaseCommand, VehicleCommand,
};
use print::{print_listing, print_messages};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "garagebook=debug" } else { "garagebook=warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    ProjectDirs::from("com", "garagebook", "garagebook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ShopError::Invalid("Could not determine a data directory; pass --data-dir".into()))
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dir = data_dir(&cli)?;
    tracing::debug!(dir = %dir.display(), "opening workshop");
    let mut api = ShopApi::open(dir)?;

    if let Some(user) = &cli.user {
        let password = cli.password.as_deref().unwrap_or_default();
        api.login(user, password)?;
    }

    let result = dispatch(&mut api, cli.command);
    api.shutdown();
    let result = result?;

    if let Some(listing) = &result.listing {
        print_listing(listing, &api.shop().config().date_format);
    }
    print_messages(&result.messages);
    Ok(())
}

fn dispatch(api: &mut ShopApi, command: Commands) -> Result<CmdResult> {
    match command {
        Commands::Client(cmd) => handle_client(api, cmd),
        Commands::Vehicle(cmd) => handle_vehicle(api, cmd),
        Commands::Employee(cmd) => handle_employee(api, cmd),
        Commands::Catalog(cmd) => handle_catalog(api, cmd),
        Commands::Purchase(cmd) => handle_purchase(api, cmd),
        Commands::Expense(cmd) => handle_expense(api, cmd),
        Commands::Report { month } => api.report(month),
        Commands::Config { key, value } => handle_config(api, key, value),
    }
}

fn handle_client(api: &mut ShopApi, cmd: ClientCommand) -> Result<CmdResult> {
    match cmd {
        ClientCommand::Add { name, phone, email } => api.add_client(&name, &phone, email.as_deref()),
        ClientCommand::List => api.list_clients(),
        ClientCommand::Show { id } => api.show_client(&id),
        ClientCommand::Find { pattern } => api.find_clients(&pattern),
        ClientCommand::Update {
            id,
            name,
            phone,
            email,
        } => {
            let changes = ClientUpdate { name, phone, email };
            if changes.is_empty() {
                return Ok(CmdResult::default()
                    .with_message(CmdMessage::warning("Nothing to update; pass --name, --phone or --email.")));
            }
            api.update_client(&id, changes)
        }
        ClientCommand::Remove { id } => api.remove_client(&id),
    }
}

fn handle_vehicle(api: &mut ShopApi, cmd: VehicleCommand) -> Result<CmdResult> {
    match cmd {
        VehicleCommand::Add {
            owner,
            make,
            model,
            year,
            plate,
        } => api.add_vehicle(&owner, &make, &model, year, &plate),
        VehicleCommand::List { owner } => api.list_vehicles(owner.as_deref()),
        VehicleCommand::Remove { id } => api.remove_vehicle(&id),
    }
}

fn handle_employee(api: &mut ShopApi, cmd: EmployeeCommand) -> Result<CmdResult> {
    match cmd {
        EmployeeCommand::Add {
            name,
            role,
            new_password,
        } => api.add_employee(&name, role, &new_password),
        EmployeeCommand::List => api.list_employees(),
        EmployeeCommand::Login { name, password } => api.login(&name, &password),
    }
}

fn handle_catalog(api: &mut ShopApi, cmd: CatalogCommand) -> Result<CmdResult> {
    match cmd {
        CatalogCommand::AddService {
            name,
            price,
            minutes,
        } => api.add_service(&name, price, minutes),
        CatalogCommand::AddPart { name, price, stock } => api.add_part(&name, price, stock),
        CatalogCommand::Restock { id, quantity } => api.restock(&id, quantity),
        CatalogCommand::List => api.list_catalog(),
    }
}

fn handle_purchase(api: &mut ShopApi, cmd: PurchaseCommand) -> Result<CmdResult> {
    match cmd {
        PurchaseCommand::Record {
            client,
            vehicle,
            lines,
            date,
        } => api.record_purchase(
            &client,
            vehicle.as_deref(),
            &lines.services,
            &lines.parts,
            date,
        ),
        PurchaseCommand::List { month, client } => api.list_purchases(month, client.as_deref()),
    }
}

fn handle_expense(api: &mut ShopApi, cmd: ExpenseCommand) -> Result<CmdResult> {
    match cmd {
        ExpenseCommand::Add {
            description,
            amount,
            category,
            date,
        } => api.add_expense(&description, category.as_deref(), amount, date),
        ExpenseCommand::Remove { id, month } => api.remove_expense(&id, month),
        ExpenseCommand::List { month } => api.list_expenses(month),
    }
}

fn handle_config(api: &mut ShopApi, key: Option<String>, value: Option<String>) -> Result<CmdResult> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };
    api.config(action)
}
