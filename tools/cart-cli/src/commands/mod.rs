//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod config;

use clap::{Args, Subcommand};

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    /// Session whose cart to use (default: "default-session").
    #[arg(short, long, global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart.
    Show,
    /// Add units of a product.
    Add {
        /// Product ID.
        product_id: i64,

        /// Units to add.
        #[arg(short, long, default_value = "1")]
        quantity: i64,

        /// Unit price; looked up in the catalog when omitted.
        #[arg(long)]
        price: Option<String>,

        /// Display name; looked up in the catalog when omitted.
        #[arg(long)]
        name: Option<String>,
    },
    /// Set the quantity of a line (0 removes it).
    Set {
        /// Product ID.
        product_id: String,

        /// New quantity.
        quantity: i64,
    },
    /// Remove a line.
    Remove {
        /// Product ID.
        product_id: String,
    },
    /// Empty the cart.
    Clear,
    /// Check that the store answers.
    Health,
}

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// Check a product against a quantity.
    Validate {
        /// Product ID.
        product_id: String,

        /// Requested quantity.
        #[arg(short, long, default_value = "1")]
        quantity: i32,
    },
    /// Look up a product's price.
    Price {
        /// Product ID.
        product_id: String,
    },
    /// Check several lines, given as `product_id:quantity`.
    Check {
        /// Lines to check.
        #[arg(required_unless_present = "session")]
        items: Vec<String>,

        /// Check this session's stored cart instead.
        #[arg(short, long, conflicts_with = "items")]
        session: Option<String>,
    },
    /// List the products in the catalog file.
    List,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
