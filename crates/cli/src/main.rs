//! Goods mall CLI - browse, manage the cart and place orders from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! gm goods list
//! gm goods show 12
//! gm goods search hoodie
//!
//! # Cart
//! gm cart add 12 --quantity 2 --method delivery --color navy
//! gm cart list
//!
//! # Order every delivery entry in the cart
//! gm order cart --method delivery --name "Kim Sejong" --phone 010-1234-5678 \
//!     --zipcode 05006 --address "209 Neungdong-ro"
//! ```
//!
//! # Commands
//!
//! - `goods` - Browse the catalog
//! - `cart` - View and edit the cart
//! - `order` - Place orders and view history
//! - `scrap` - Manage scrapped goods
//! - `signup` - Create an account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use goodsmall_client::{ClientConfig, ConfigError, GoodsMallClient, Session, SessionError};
use goodsmall_core::{CartId, CategoryId, FulfillmentMethod, GoodsId};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("API client error: {0}")]
    Client(#[from] goodsmall_client::ApiError),
    #[error("{0}")]
    InvalidArgument(String),
}

#[derive(Parser)]
#[command(name = "gm")]
#[command(author, version, about = "Sejong University goods mall CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Goods {
        #[command(subcommand)]
        action: GoodsAction,
    },
    /// View and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place orders and view history
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Manage scrapped goods
    Scrap {
        #[command(subcommand)]
        action: ScrapAction,
    },
    /// Create an account
    Signup {
        #[command(subcommand)]
        action: SignupAction,
    },
}

#[derive(Subcommand)]
enum GoodsAction {
    /// List goods, optionally in one category
    List {
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// Show one goods item
    Show { goods_id: GoodsId },
    /// Search by title, seller or description
    Search { query: String },
    /// List categories
    Categories,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    List,
    /// Add a goods item to the cart
    Add {
        goods_id: GoodsId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// `pickup` or `delivery`
        #[arg(short, long, default_value = "pickup")]
        method: FulfillmentMethod,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
    },
    /// Change the quantity of a cart entry
    Update {
        cart_id: CartId,
        #[arg(short, long)]
        quantity: u32,
    },
    /// Delete cart entries
    Delete {
        #[arg(required = true)]
        cart_ids: Vec<CartId>,
    },
}

/// Buyer contact details shared by the order commands.
#[derive(Args)]
struct ContactArgs {
    /// Buyer name
    #[arg(long)]
    name: String,
    /// Mobile number, e.g. 010-1234-5678
    #[arg(long)]
    phone: String,
    /// Five digit postal code (delivery only)
    #[arg(long)]
    zipcode: Option<String>,
    /// Street address (delivery only)
    #[arg(long)]
    address: Option<String>,
    /// Building, floor or room (delivery only)
    #[arg(long, default_value = "")]
    detail_address: String,
    /// Note for the courier (delivery only)
    #[arg(long, default_value = "")]
    note: String,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Order one goods item directly
    Detail {
        goods_id: GoodsId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        #[arg(short, long, default_value = "pickup")]
        method: FulfillmentMethod,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Order cart entries (all entries of the method unless ids are given)
    Cart {
        #[arg(short, long, default_value = "pickup")]
        method: FulfillmentMethod,
        #[arg(long, value_delimiter = ',')]
        cart_ids: Vec<CartId>,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Show order history
    History,
}

#[derive(Subcommand)]
enum ScrapAction {
    /// Scrap a goods item
    Add { goods_id: GoodsId },
    /// Remove a scrap
    Remove { goods_id: GoodsId },
    /// List scrapped goods
    List,
}

#[derive(Subcommand)]
enum SignupAction {
    /// Check whether an email address is free
    Check { email: String },
    /// Register a new account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirmation: String,
        #[arg(long)]
        name: String,
        /// Birth date as YYYYMMDD
        #[arg(long)]
        birth: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
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

    tracing::info!("Sentry initialized");
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

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "goodsmall_client=info,goodsmall_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet, fall back to a plain subscriber for this one message
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let client = GoodsMallClient::new(&config.api)?;
    let mut session = Session::new(client, config.api.token.clone());
    let events = commands::log_events(&session);

    let result = match cli.command {
        Commands::Goods { action } => match action {
            GoodsAction::List { category } => commands::goods::list(&mut session, category).await,
            GoodsAction::Show { goods_id } => commands::goods::show(&mut session, goods_id).await,
            GoodsAction::Search { query } => commands::goods::search(&mut session, &query).await,
            GoodsAction::Categories => commands::goods::categories(&mut session).await,
        },
        Commands::Cart { action } => match action {
            CartAction::List => commands::cart::list(&mut session).await,
            CartAction::Add {
                goods_id,
                quantity,
                method,
                color,
                size,
            } => {
                commands::cart::add(&mut session, goods_id, quantity, method, color, size).await
            }
            CartAction::Update { cart_id, quantity } => {
                commands::cart::update(&mut session, cart_id, quantity).await
            }
            CartAction::Delete { cart_ids } => commands::cart::delete(&mut session, &cart_ids).await,
        },
        Commands::Order { action } => match action {
            OrderAction::Detail {
                goods_id,
                quantity,
                method,
                color,
                size,
                contact,
            } => {
                let line = commands::order::DetailLine {
                    goods_id,
                    quantity,
                    color,
                    size,
                };
                commands::order::from_detail(&mut session, line, method, &contact.into()).await
            }
            OrderAction::Cart {
                method,
                cart_ids,
                contact,
            } => commands::order::from_cart(&mut session, method, &cart_ids, &contact.into()).await,
            OrderAction::History => commands::order::history(&mut session).await,
        },
        Commands::Scrap { action } => match action {
            ScrapAction::Add { goods_id } => {
                commands::scrap::set(&mut session, goods_id, true).await
            }
            ScrapAction::Remove { goods_id } => {
                commands::scrap::set(&mut session, goods_id, false).await
            }
            ScrapAction::List => commands::scrap::list(&mut session).await,
        },
        Commands::Signup { action } => match action {
            SignupAction::Check { email } => commands::signup::check(&mut session, &email).await,
            SignupAction::Register {
                email,
                password,
                password_confirmation,
                name,
                birth,
            } => {
                let form = goodsmall_client::signup::SignUpForm {
                    email,
                    password,
                    password_confirmation,
                    user_name: name,
                    birth,
                };
                commands::signup::register(&mut session, &form).await
            }
        },
    };

    drop(session);
    // The logger ends once the session's sender is gone
    let _ = events.await;
    result
}

impl From<ContactArgs> for goodsmall_client::order::OrderContact {
    fn from(args: ContactArgs) -> Self {
        let address = (args.zipcode.is_some() || args.address.is_some()).then(|| {
            goodsmall_client::order::AddressForm {
                zipcode: args.zipcode.unwrap_or_default(),
                main_address: args.address.unwrap_or_default(),
                detail_address: args.detail_address,
            }
        });
        Self {
            buyer_name: args.name,
            phone_number: args.phone,
            address,
            delivery_note: args.note,
        }
    }
}
