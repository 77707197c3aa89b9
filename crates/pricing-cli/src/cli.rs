use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pricing-admin")]
#[command(version)]
#[command(about = "Manage the pricing tool product catalog from the terminal", long_about = None)]
pub struct Cli {
    /// API base URL (overrides the saved config)
    #[arg(long, env = "PRICING_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account email (defaults to the last one used)
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        /// admin, buyer, supplier, or any custom role name
        #[arg(short, long, default_value = "buyer")]
        role: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show or change saved settings
    Config {
        /// Save a new API base URL
        #[arg(long)]
        set_api_url: Option<String>,
        /// Where to keep the refresh token
        #[arg(long, value_enum)]
        credentials: Option<CredentialsArg>,
    },
    /// Product catalog operations
    #[command(subcommand)]
    Products(ProductCommands),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CredentialsArg {
    /// Session file only
    File,
    /// OS keychain for the refresh token
    Keyring,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List products, optionally filtered
    List {
        /// Search by name
        #[arg(short, long)]
        name: Option<String>,
        /// Filter by category ("all" for every category)
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one or more products with pricing and demand figures
    Show {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Create a product
    Add(NewProductArgs),
    /// Change fields of a product
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductPatchArgs,
    },
    /// Delete a product
    Delete { id: i64 },
}

#[derive(Args, Debug)]
pub struct NewProductArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub cost_price: String,
    #[arg(long)]
    pub selling_price: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, default_value_t = 0)]
    pub stock: i64,
    #[arg(long, default_value_t = 0)]
    pub units_sold: i64,
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i32).range(0..=5))]
    pub rating: i32,
    #[arg(long, default_value_t = 0)]
    pub demand_forecast: i64,
    #[arg(long, default_value = "0.00")]
    pub optimized_price: String,
}

#[derive(Args, Debug)]
pub struct ProductPatchArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub cost_price: Option<String>,
    #[arg(long)]
    pub selling_price: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub stock: Option<i64>,
    #[arg(long)]
    pub units_sold: Option<i64>,
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=5))]
    pub rating: Option<i32>,
    #[arg(long)]
    pub demand_forecast: Option<i64>,
    #[arg(long)]
    pub optimized_price: Option<String>,
}
