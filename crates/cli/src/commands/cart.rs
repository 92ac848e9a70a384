//! Cart commands.

use goodsmall_client::Session;
use goodsmall_core::{CartId, FulfillmentMethod, GoodsId};

use crate::CliError;

/// Show the cart, grouped by method.
pub async fn list(session: &mut Session) -> Result<(), CliError> {
    session.fetch_cart().await?;

    for method in [FulfillmentMethod::Pickup, FulfillmentMethod::Delivery] {
        let entries = session.cart().entries(method);
        tracing::info!("{method} ({} entries)", entries.len());
        for entry in entries {
            tracing::info!(
                "  [{}] {} x{} - {} ({})",
                entry.id,
                entry.title,
                entry.quantity,
                entry.price,
                entry.seller.name
            );
        }
    }
    Ok(())
}

/// Add a goods item to the cart.
pub async fn add(
    session: &mut Session,
    goods_id: GoodsId,
    quantity: u32,
    method: FulfillmentMethod,
    color: Option<String>,
    size: Option<String>,
) -> Result<(), CliError> {
    session.fetch_goods_detail(goods_id).await?;
    session.set_fulfillment_method(method);
    session.add_to_cart(quantity, color, size).await?;

    tracing::info!(
        "Added goods {goods_id} to the {method} cart ({} pickup, {} delivery entries)",
        session.cart().entries(FulfillmentMethod::Pickup).len(),
        session.cart().entries(FulfillmentMethod::Delivery).len()
    );
    Ok(())
}

/// Change the quantity of a cart entry.
pub async fn update(session: &mut Session, cart_id: CartId, quantity: u32) -> Result<(), CliError> {
    session.update_cart_quantity(cart_id, quantity).await?;
    if let Some(entry) = session.cart().entry(cart_id) {
        tracing::info!("[{}] {} x{} - {}", entry.id, entry.title, entry.quantity, entry.price);
    }
    Ok(())
}

/// Delete cart entries one by one.
pub async fn delete(session: &mut Session, cart_ids: &[CartId]) -> Result<(), CliError> {
    for cart_id in cart_ids {
        session.delete_cart_entry(*cart_id).await?;
        tracing::info!("Deleted cart entry {cart_id}");
    }
    Ok(())
}
