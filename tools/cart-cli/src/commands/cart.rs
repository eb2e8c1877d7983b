//! Session cart commands.

use anyhow::{bail, Context as _, Result};
use cart_cache::SessionCartStore;
use cart_core::api::{parse_product_id, AddItemRequest, UpdateItemRequest};
use cart_core::{Cart, Decimal, SessionId};

use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let session = SessionId::resolve(args.session.as_deref(), None);
    ctx.output.debug(&format!("Session: {}", session));

    let store = ctx.store().await?;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => show_cart(&store, &session, ctx).await,
        CartCommand::Add {
            product_id,
            quantity,
            price,
            name,
        } => add_item(&store, &session, product_id, quantity, price, name, ctx).await,
        CartCommand::Set {
            product_id,
            quantity,
        } => set_quantity(&store, &session, &product_id, quantity, ctx).await,
        CartCommand::Remove { product_id } => remove_item(&store, &session, &product_id, ctx).await,
        CartCommand::Clear => clear_cart(&store, &session, ctx).await,
        CartCommand::Health => health(&store, ctx).await,
    }
}

async fn show_cart(store: &SessionCartStore, session: &SessionId, ctx: &Context) -> Result<()> {
    let cart = store.get(&ctx.call(), session).await?;
    print_cart(&cart, ctx);
    Ok(())
}

async fn add_item(
    store: &SessionCartStore,
    session: &SessionId,
    product_id: i64,
    quantity: i64,
    price: Option<String>,
    name: Option<String>,
    ctx: &Context,
) -> Result<()> {
    let (product_id, quantity) = AddItemRequest {
        product_id,
        quantity,
    }
    .validate()?;

    let (unit_price, name) = match price {
        Some(price) => {
            let price: Decimal = price
                .parse()
                .with_context(|| format!("Invalid price: {}", price))?;
            (price, name.unwrap_or_else(|| format!("Product {}", product_id)))
        }
        None => {
            let Some(catalog) = ctx.catalog()? else {
                bail!("No --price given and no catalog configured to look it up");
            };
            let requested = i32::try_from(quantity)
                .with_context(|| format!("Quantity {} is out of range", quantity))?;
            let check = catalog
                .validate_product(&ctx.call(), product_id.to_string(), requested)
                .await?;
            if !check.valid {
                bail!("Product {} not found in catalog", product_id);
            }
            if let Some(message) = check.error_message.as_deref() {
                ctx.output.warn(message);
            }
            (check.unit_price, name.unwrap_or(check.product_name))
        }
    };

    let cart = store
        .add_item(&ctx.call(), session, product_id, quantity, unit_price, name)
        .await?;
    ctx.output
        .success(&format!("Added {} x product {}", quantity, product_id));
    print_cart(&cart, ctx);
    Ok(())
}

async fn set_quantity(
    store: &SessionCartStore,
    session: &SessionId,
    product_id: &str,
    quantity: i64,
    ctx: &Context,
) -> Result<()> {
    let product_id = parse_product_id(product_id)?;
    let quantity = UpdateItemRequest { quantity }.validate()?;

    let cart = store
        .update_quantity(&ctx.call(), session, product_id, quantity)
        .await?;
    if quantity == 0 {
        ctx.output.success(&format!("Removed product {}", product_id));
    } else {
        ctx.output
            .success(&format!("Set product {} to {}", product_id, quantity));
    }
    print_cart(&cart, ctx);
    Ok(())
}

async fn remove_item(
    store: &SessionCartStore,
    session: &SessionId,
    product_id: &str,
    ctx: &Context,
) -> Result<()> {
    let product_id = parse_product_id(product_id)?;
    let cart = store.remove_item(&ctx.call(), session, product_id).await?;
    ctx.output.success(&format!("Removed product {}", product_id));
    print_cart(&cart, ctx);
    Ok(())
}

async fn clear_cart(store: &SessionCartStore, session: &SessionId, ctx: &Context) -> Result<()> {
    let cart = store.clear(&ctx.call(), session).await?;
    ctx.output.success(&format!("Cleared cart for {}", session));
    if ctx.output.is_json() {
        ctx.output.json(&cart.snapshot());
    }
    Ok(())
}

async fn health(store: &SessionCartStore, ctx: &Context) -> Result<()> {
    store.health_check(&ctx.call()).await?;
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "status": "healthy" }));
    } else {
        ctx.output.success(&format!(
            "Store is healthy ({})",
            ctx.config.store.backend.as_str()
        ));
    }
    Ok(())
}

fn print_cart(cart: &Cart, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&cart.snapshot());
        return;
    }

    ctx.output.header(&format!("Cart {}", cart.session_id));
    if cart.is_empty() {
        ctx.output.info("Cart is empty.");
        return;
    }

    let widths = [10, 24, 8, 10, 10];
    ctx.output
        .table_row(&["PRODUCT", "NAME", "QTY", "PRICE", "LINE"], &widths);
    for item in &cart.items {
        ctx.output.table_row(
            &[
                &item.product_id.to_string(),
                &item.name,
                &item.quantity.to_string(),
                &item.unit_price.to_string(),
                &item.line_total().to_string(),
            ],
            &widths,
        );
    }

    println!();
    ctx.output.kv("items", &cart.item_count().to_string());
    ctx.output.kv("total", &cart.total.to_string());
    if let Some(updated_at) = cart.updated_at {
        ctx.output.kv("updated", &updated_at.to_rfc3339());
    }
}
