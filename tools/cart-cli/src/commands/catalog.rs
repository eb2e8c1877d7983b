//! Catalog validation commands.

use anyhow::{bail, Context as _, Result};
use cart_core::SessionId;
use catalog_validation::{CartItemRequest, CartValidationResponse, ProductValidationResponse};

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::status_badge;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    match args.command {
        CatalogCommand::Validate {
            product_id,
            quantity,
        } => validate(&product_id, quantity, ctx).await,
        CatalogCommand::Price { product_id } => price(&product_id, ctx).await,
        CatalogCommand::Check { items, session } => check(items, session, ctx).await,
        CatalogCommand::List => list(ctx),
    }
}

async fn validate(product_id: &str, quantity: i32, ctx: &Context) -> Result<()> {
    let client = ctx.require_catalog()?;
    let result = client
        .validate_product(&ctx.call(), product_id, quantity)
        .await?;

    if ctx.output.is_json() {
        ctx.output.json(&result);
        return Ok(());
    }

    ctx.output.header(&format!("Product {}", product_id));
    ctx.output.kv("status", &status_badge(line_status(&result)));
    if result.valid {
        ctx.output.kv("name", &result.product_name);
        ctx.output.kv("price", &result.unit_price.to_string());
        ctx.output
            .kv("available", &result.available_quantity.to_string());
    }
    if let Some(message) = &result.error_message {
        ctx.output.kv("message", message);
    }
    Ok(())
}

async fn price(product_id: &str, ctx: &Context) -> Result<()> {
    let client = ctx.require_catalog()?;
    let result = client.get_product_price(&ctx.call(), product_id).await?;

    if ctx.output.is_json() {
        ctx.output.json(&result);
        return Ok(());
    }

    if !result.found {
        bail!(
            "{}",
            result
                .error_message
                .unwrap_or_else(|| "Product not found".to_string())
        );
    }
    let currency = result.currency.unwrap_or(ctx.config.catalog.currency);
    ctx.output
        .kv(product_id, &format!("{} {}", result.price, currency.code()));
    Ok(())
}

async fn check(items: Vec<String>, session: Option<String>, ctx: &Context) -> Result<()> {
    let client = ctx.require_catalog()?;

    let response = match session {
        Some(session) => {
            let session = SessionId::new(session);
            let store = ctx.store().await?;
            let cart = store.get(&ctx.call(), &session).await?;
            if cart.is_empty() {
                ctx.output.warn(&format!("Cart {} is empty", session));
            }
            client.validate_cart(&ctx.call(), &cart).await?
        }
        None => {
            let items = items
                .iter()
                .map(|spec| parse_item(spec))
                .collect::<Result<Vec<_>>>()?;
            client.validate_cart_items(&ctx.call(), items).await?
        }
    };

    print_validation(&response, ctx);
    if !response.all_valid {
        bail!("Cart is not orderable");
    }
    Ok(())
}

fn list(ctx: &Context) -> Result<()> {
    let catalog = ctx
        .product_catalog()?
        .context("No catalog configured. Set [catalog] products_file in cart.toml.")?;
    let products = catalog.products();

    if ctx.output.is_json() {
        ctx.output.json(&products);
        return Ok(());
    }

    ctx.output.header(&format!("{} products", products.len()));
    let widths = [10, 28, 10, 8];
    ctx.output
        .table_row(&["ID", "NAME", "PRICE", "STOCK"], &widths);
    for product in &products {
        ctx.output.table_row(
            &[
                &product.id.to_string(),
                &product.name,
                &product.price.to_string(),
                &product.stock_quantity.to_string(),
            ],
            &widths,
        );
    }
    Ok(())
}

fn print_validation(response: &CartValidationResponse, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(response);
        return;
    }

    ctx.output.header("Cart validation");
    let widths = [24, 10, 10, 14];
    ctx.output
        .table_row(&["NAME", "PRICE", "AVAILABLE", "STATUS"], &widths);
    for result in &response.results {
        ctx.output.table_row(
            &[
                &result.product_name,
                &result.unit_price.to_string(),
                &result.available_quantity.to_string(),
                &status_badge(line_status(result)),
            ],
            &widths,
        );
    }

    println!();
    ctx.output.kv(
        "total",
        &format!("{} {}", response.total_price, response.currency.code()),
    );
    if response.all_valid {
        ctx.output.success("All items are available");
    }
}

fn line_status(result: &ProductValidationResponse) -> &'static str {
    if !result.valid {
        "not found"
    } else if !result.in_stock {
        "out of stock"
    } else {
        "ok"
    }
}

/// Parse `<product_id>:<quantity>`; a bare id means quantity 1.
fn parse_item(spec: &str) -> Result<CartItemRequest> {
    let (product_id, quantity) = match spec.split_once(':') {
        Some((id, qty)) => {
            let qty = qty
                .trim()
                .parse::<i32>()
                .with_context(|| format!("Invalid quantity in '{}'", spec))?;
            (id.trim(), qty)
        }
        None => (spec.trim(), 1),
    };
    if product_id.is_empty() {
        bail!("Missing product ID in '{}'", spec);
    }
    Ok(CartItemRequest::new(product_id, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cart_core::Decimal;

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("42:3").unwrap(), CartItemRequest::new("42", 3));
        assert_eq!(parse_item("7").unwrap(), CartItemRequest::new("7", 1));
        assert_eq!(parse_item(" 9 : 2 ").unwrap(), CartItemRequest::new("9", 2));
    }

    #[test]
    fn test_parse_item_rejects_garbage() {
        assert!(parse_item("42:many").is_err());
        assert!(parse_item(":3").is_err());
    }

    #[test]
    fn test_line_status() {
        assert_eq!(line_status(&ProductValidationResponse::not_found()), "not found");

        let mut result = ProductValidationResponse {
            valid: true,
            in_stock: true,
            available_quantity: 5,
            product_name: "Mug".to_string(),
            unit_price: Decimal::new(1000, 2),
            error_message: None,
        };
        assert_eq!(line_status(&result), "ok");

        result.in_stock = false;
        assert_eq!(line_status(&result), "out of stock");
    }
}
