//! Winkel CLI - browse the shop, manage a cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Log in (the session is kept in the profile directory)
//! winkel login -e ash@pallet.town -p pikachu
//!
//! # Browse and fill the cart
//! winkel items list
//! winkel cart add 3f6c0d5e-...
//! winkel cart set 3f6c0d5e-... 2
//!
//! # Place the order
//! winkel checkout --street Damrak --house-number 1 --postal-code "1012 LG" --city Amsterdam
//! ```
//!
//! # Commands
//!
//! - `login`, `logout`, `whoami`, `register` - Account
//! - `items` - Browse the catalog
//! - `cart` - Show and edit the cart
//! - `checkout` - Place an order for the cart
//! - `orders` - Order history
//! - `admin` - Manage catalog items (administrators only)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use secrecy::SecretString;
use winkel_core::{AddressForm, Email, ItemId, OrderId, Price, UserId};
use winkel_storefront::api::{ItemUpdate, NewItem, UserUpdate};
use winkel_storefront::config::StorefrontConfig;
use winkel_storefront::error::Result;
use winkel_storefront::state::AppState;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "winkel")]
#[command(author, version, about = "Winkel storefront")]
struct Cli {
    /// Base URL of the shop API (overrides `WINKEL_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the session and cart (overrides `WINKEL_PROFILE_DIR`)
    #[arg(long, global = true)]
    profile_dir: Option<PathBuf>,

    /// Write logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the shop
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account
    Register {
        #[arg(short, long)]
        email: Email,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Browse the catalog
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the cart
    Checkout(AddressArgs),
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage catalog items and user accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ItemsAction {
    /// List active items
    List {
        /// Number of items to skip
        #[arg(long)]
        skip: Option<u32>,
        /// Maximum number of items to return
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one item
    Show { id: ItemId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of an item
    Add { id: ItemId },
    /// Set an item's quantity (0 removes it)
    Set {
        id: ItemId,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove an item
    Remove { id: ItemId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Show { id: OrderId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a catalog item
    CreateItem(NewItemArgs),
    /// Update fields of a catalog item
    UpdateItem {
        id: ItemId,
        #[command(flatten)]
        fields: UpdateItemArgs,
    },
    /// Delete a catalog item
    DeleteItem { id: ItemId },
    /// List user accounts
    Users,
    /// Show one user account
    ShowUser { id: UserId },
    /// Update fields of a user account
    UpdateUser {
        id: UserId,
        #[command(flatten)]
        fields: UpdateUserArgs,
    },
    /// Delete a user account
    DeleteUser { id: UserId },
}

/// Shipping address. Blank fields are reported before anything is sent.
#[derive(Args)]
struct AddressArgs {
    #[arg(long, default_value = "")]
    street: String,
    #[arg(long, default_value = "")]
    house_number: String,
    #[arg(long, default_value = "")]
    postal_code: String,
    #[arg(long, default_value = "")]
    city: String,
    /// Defaults to Nederland
    #[arg(long, default_value = "")]
    country: String,
}

impl From<AddressArgs> for AddressForm {
    fn from(args: AddressArgs) -> Self {
        Self {
            street: args.street,
            house_number: args.house_number,
            postal_code: args.postal_code,
            city: args.city,
            country: args.country,
        }
    }
}

#[derive(Args)]
struct NewItemArgs {
    #[arg(long)]
    name: String,
    /// Unit price in euros, e.g. 12.50
    #[arg(long)]
    price: Price,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, default_value_t = 0)]
    stock: i64,
}

impl From<NewItemArgs> for NewItem {
    fn from(args: NewItemArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            price: args.price,
            image_url: args.image_url,
            category: args.category,
            stock: args.stock,
        }
    }
}

#[derive(Args)]
struct UpdateItemArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    price: Option<Price>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    stock: Option<i64>,
    /// Whether the item is listed in the shop
    #[arg(long)]
    active: Option<bool>,
}

impl From<UpdateItemArgs> for ItemUpdate {
    fn from(args: UpdateItemArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            price: args.price,
            image_url: args.image_url,
            category: args.category,
            stock: args.stock,
            is_active: args.active,
        }
    }
}

#[derive(Args)]
struct UpdateUserArgs {
    #[arg(long)]
    email: Option<Email>,
    /// New password
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    /// Whether the account may log in
    #[arg(long)]
    active: Option<bool>,
}

impl From<UpdateUserArgs> for UserUpdate {
    fn from(args: UpdateUserArgs) -> Self {
        Self {
            email: args.email,
            password: args.password.map(SecretString::from),
            first_name: args.first_name,
            last_name: args.last_name,
            is_active: args.active,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Logs go to stderr; stdout is reserved for command output.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "winkel_storefront=info,winkel_cli=info".into());

    let (plain, json) = if json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        (Some(layer), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain)
        .with(json)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

fn load_config(cli: &Cli) -> Result<StorefrontConfig> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }
    if let Some(dir) = &cli.profile_dir {
        config = config.with_profile_dir(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            render::error(&e);
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            render::error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &StorefrontConfig) -> Result<()> {
    let mut state = AppState::new(config)?;
    tracing::debug!(api = %state.api().base_url(), profile = %config.profile_dir.display(), "starting");

    match command {
        Commands::Login { email, password } => {
            commands::account::login(&mut state, &email, password).await?;
        }
        Commands::Logout => commands::account::logout(&mut state),
        Commands::Whoami => commands::account::whoami(&state),
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            commands::account::register(&state, email, password, first_name, last_name).await?;
        }
        Commands::Items { action } => match action {
            ItemsAction::List { skip, limit } => {
                commands::items::list(&state, skip, limit).await?;
            }
            ItemsAction::Show { id } => commands::items::show(&state, &id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add { id } => commands::cart::add(&mut state, &id).await?,
            CartAction::Set { id, quantity } => commands::cart::set(&mut state, &id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&mut state, &id)?,
            CartAction::Clear => commands::cart::clear(&mut state),
        },
        Commands::Checkout(address) => {
            commands::checkout::place_order(&mut state, &address.into()).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&mut state).await?,
            OrdersAction::Show { id } => commands::orders::show(&mut state, &id).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::CreateItem(args) => {
                commands::admin::create_item(&mut state, &args.into()).await?;
            }
            AdminAction::UpdateItem { id, fields } => {
                commands::admin::update_item(&mut state, &id, &fields.into()).await?;
            }
            AdminAction::DeleteItem { id } => commands::admin::delete_item(&mut state, &id).await?,
            AdminAction::Users => commands::admin::users(&mut state).await?,
            AdminAction::ShowUser { id } => commands::admin::show_user(&mut state, &id).await?,
            AdminAction::UpdateUser { id, fields } => {
                commands::admin::update_user(&mut state, &id, &fields.into()).await?;
            }
            AdminAction::DeleteUser { id } => commands::admin::delete_user(&mut state, &id).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_negative_quantity_parses() {
        let cli = Cli::try_parse_from(["winkel", "cart", "set", "pikachu", "-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart {
                action: CartAction::Set { quantity: -1, .. }
            }
        ));
    }

    #[test]
    fn test_checkout_blank_fields_default_empty() {
        let cli = Cli::try_parse_from(["winkel", "checkout", "--street", "Damrak"]).unwrap();
        let Commands::Checkout(address) = cli.command else {
            panic!("expected checkout");
        };
        let form = AddressForm::from(address);
        assert_eq!(form.street, "Damrak");
        assert!(form.city.is_empty());
    }

    #[test]
    fn test_invalid_price_is_rejected_by_parser() {
        assert!(
            Cli::try_parse_from(["winkel", "admin", "create-item", "--name", "X", "--price=-1"])
                .is_err()
        );
    }

    #[test]
    fn test_update_user_flags() {
        let cli = Cli::try_parse_from([
            "winkel",
            "admin",
            "update-user",
            "u-7",
            "--email",
            "Brock@Pewter.gym",
            "--active",
            "false",
        ])
        .unwrap();
        let Commands::Admin {
            action: AdminAction::UpdateUser { id, fields },
        } = cli.command
        else {
            panic!("expected update-user");
        };
        let update = UserUpdate::from(fields);
        assert_eq!(id.as_str(), "u-7");
        assert_eq!(update.email.unwrap().as_str(), "Brock@Pewter.gym");
        assert_eq!(update.is_active, Some(false));
        assert!(update.password.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "winkel",
            "whoami",
            "--api-url",
            "http://localhost:9000",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000"));
        assert!(cli.log_json);
    }
}
