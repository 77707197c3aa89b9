//! Handlers for each subcommand.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use pricing_core::api::ProductsApi;
use pricing_core::auth::AuthState;
use pricing_core::catalog::ProductCatalog;
use pricing_core::config::CredentialBackend;
use pricing_core::models::{NewProduct, Product, ProductPatch, Role};
use pricing_core::utils::{format_number, format_price, truncate_string};
use pricing_core::{ApiError, Config, Gateway};
use tracing::debug;

use crate::cli::{CredentialsArg, NewProductArgs, ProductCommands, ProductPatchArgs};

/// Maximum width of the name column in product tables
const NAME_COLUMN_WIDTH: usize = 28;

pub struct App {
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub json: bool,
}

impl App {
    fn auth(&self) -> AuthState {
        AuthState::new(self.gateway.clone())
    }

    fn catalog(&self) -> ProductCatalog {
        ProductCatalog::new(ProductsApi::new(self.gateway.clone()))
    }

    fn require_login(&self) -> Result<()> {
        if !self.auth().is_authenticated() {
            bail!("Not logged in. Run `pricing-admin login` first.");
        }
        Ok(())
    }
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

pub async fn login(app: &mut App, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| app.config.last_email.clone()) {
        Some(e) => e,
        None => prompt("Email")?,
    };
    if email.is_empty() {
        bail!("Email is required");
    }
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let user = app.auth().login(&email, &password).await?;

    app.config.last_email = Some(email);
    if let Err(e) = app.config.save() {
        debug!(error = %e, "Could not save config");
    }
    println!("Logged in as {} ({})", user.username, user.role_label());
    Ok(())
}

pub async fn register(app: &App, username: &str, email: &str, role: &str) -> Result<()> {
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    let role: Role = role.parse()?;
    let message = app.auth().register(username, email, &password, role).await?;
    println!("{}", message);
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    app.auth().logout()?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let auth = app.auth();
    match auth.user() {
        Some(user) if auth.is_authenticated() => {
            if app.json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("{} <{}>  role: {}", user.username, user.email, user.role_label());
            }
        }
        _ => println!("Not logged in"),
    }
    Ok(())
}

pub fn config(
    app: &mut App,
    set_api_url: Option<String>,
    credentials: Option<CredentialsArg>,
) -> Result<()> {
    let mut changed = false;
    if let Some(url) = set_api_url {
        app.config.api_base_url = url;
        changed = true;
    }
    if let Some(backend) = credentials {
        app.config.credential_backend = match backend {
            CredentialsArg::File => CredentialBackend::File,
            CredentialsArg::Keyring => CredentialBackend::Keyring,
        };
        changed = true;
    }
    if changed {
        app.config.save()?;
    }
    println!("{}", serde_json::to_string_pretty(&app.config)?);
    Ok(())
}

pub async fn products(app: &App, command: ProductCommands) -> Result<()> {
    app.require_login()?;
    let mut catalog = app.catalog();

    match command {
        ProductCommands::List {
            name,
            category,
            page,
        } => {
            catalog.set_filters(name.as_deref(), category.as_deref());
            catalog.fetch(page).await?;
            if app.json {
                println!("{}", serde_json::to_string_pretty(&catalog.products)?);
            } else {
                print_table(&catalog.products);
                let p = &catalog.pagination;
                println!(
                    "\nPage {} - {} of {} products{}",
                    p.current_page,
                    p.page_size,
                    format_number(p.count as i64),
                    if p.next.is_some() { " (more: --page N)" } else { "" }
                );
            }
        }
        ProductCommands::Show { ids } => {
            let mut failed = 0;
            for (id, result) in catalog.load_details(&ids).await {
                match result {
                    Ok(product) if app.json => {
                        println!("{}", serde_json::to_string_pretty(&product)?)
                    }
                    Ok(product) => print_detail(&product),
                    Err(e) => {
                        failed += 1;
                        eprintln!("Product {}: {}", id, e.user_message());
                    }
                }
            }
            if failed == ids.len() {
                bail!("No products could be loaded");
            }
        }
        ProductCommands::Add(args) => {
            let product = catalog.add(&new_product(args)).await?;
            println!("Created product {} ({})", product.id, product.name);
        }
        ProductCommands::Update { id, fields } => {
            let product = catalog.update(id, &patch(fields)).await?;
            println!("Updated product {} ({})", product.id, product.name);
        }
        ProductCommands::Delete { id } => {
            catalog.delete(id).await?;
            println!("Deleted product {}", id);
        }
    }
    Ok(())
}

fn new_product(args: NewProductArgs) -> NewProduct {
    NewProduct {
        name: args.name,
        category: args.category,
        cost_price: args.cost_price,
        selling_price: args.selling_price,
        description: args.description,
        stock_available: args.stock,
        units_sold: args.units_sold,
        customer_rating: args.rating,
        demand_forecast: args.demand_forecast,
        optimized_price: args.optimized_price,
    }
}

fn patch(args: ProductPatchArgs) -> ProductPatch {
    ProductPatch {
        name: args.name,
        category: args.category,
        cost_price: args.cost_price,
        selling_price: args.selling_price,
        description: args.description,
        stock_available: args.stock,
        units_sold: args.units_sold,
        customer_rating: args.rating,
        demand_forecast: args.demand_forecast,
        optimized_price: args.optimized_price,
    }
}

fn print_table(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    println!(
        "{:>5}  {:<width$}  {:<14}  {:>10}  {:>10}  {:>8}  {:>8}  {:>6}  {:>8}",
        "ID", "Name", "Category", "Price", "Optimized", "Stock", "Sold", "Rating", "Demand",
        width = NAME_COLUMN_WIDTH
    );
    for p in products {
        println!(
            "{:>5}  {:<width$}  {:<14}  {:>10}  {:>10}  {:>8}  {:>8}  {:>6}  {:>8}",
            p.id,
            truncate_string(&p.name, NAME_COLUMN_WIDTH),
            truncate_string(&p.category, 14),
            format_price(&p.selling_price),
            format_price(&p.optimized_price),
            format_number(p.stock_available),
            format_number(p.units_sold),
            p.customer_rating,
            p.demand_forecast
                .map(format_number)
                .unwrap_or_else(|| "-".to_string()),
            width = NAME_COLUMN_WIDTH
        );
    }
}

fn print_detail(p: &Product) {
    println!("#{} {} [{}]", p.id, p.name, p.category);
    if !p.description.is_empty() {
        println!("  {}", p.description);
    }
    println!(
        "  cost {}  selling {}  optimized {}",
        format_price(&p.cost_price),
        format_price(&p.selling_price),
        format_price(&p.optimized_price)
    );
    if let Some(margin) = p.margin() {
        println!("  margin ${:.2}", margin);
    }
    println!(
        "  stock {}  sold {}  rating {}/5  demand forecast {}",
        format_number(p.stock_available),
        format_number(p.units_sold),
        p.customer_rating,
        p.demand_forecast
            .map(format_number)
            .unwrap_or_else(|| "-".to_string())
    );
}

/// Best message to show for a failed command.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => api.user_message(),
        None => format!("{:#}", err),
    }
}
