//! Order commands.

use goodsmall_client::Session;
use goodsmall_client::api::OrderConfirmation;
use goodsmall_client::order::OrderContact;
use goodsmall_core::{CartId, FulfillmentMethod, GoodsId};

use crate::CliError;

/// The goods line of a detail-page order.
pub struct DetailLine {
    pub goods_id: GoodsId,
    pub quantity: u32,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Order one goods item directly.
pub async fn from_detail(
    session: &mut Session,
    line: DetailLine,
    method: FulfillmentMethod,
    contact: &OrderContact,
) -> Result<(), CliError> {
    session.fetch_goods_detail(line.goods_id).await?;
    session.set_fulfillment_method(method);
    session.begin_detail_order(line.quantity, line.color, line.size)?;

    submit(session, contact).await
}

/// Order cart entries of one method; all of them when `cart_ids` is empty.
pub async fn from_cart(
    session: &mut Session,
    method: FulfillmentMethod,
    cart_ids: &[CartId],
    contact: &OrderContact,
) -> Result<(), CliError> {
    session.fetch_cart().await?;
    session.set_fulfillment_method(method);
    session.clear_cart_selection();

    if cart_ids.is_empty() {
        session.select_all_cart_entries();
    } else {
        for cart_id in cart_ids {
            if session.cart().entry(*cart_id).is_none() {
                return Err(CliError::InvalidArgument(format!(
                    "cart entry {cart_id} does not exist"
                )));
            }
            session.toggle_cart_entry(*cart_id);
        }
    }

    session.begin_cart_order().await?;
    submit(session, contact).await
}

async fn submit(session: &mut Session, contact: &OrderContact) -> Result<(), CliError> {
    tracing::info!(
        "Ordering {} item(s) for {}, delivery fees {}",
        session.order_items().len(),
        session.order_total(),
        session.fees().total()
    );

    session.submit_order(contact).await?;

    if let Some(confirmation) = session.confirmation() {
        log_confirmation(session, confirmation);
    }
    Ok(())
}

fn log_confirmation(session: &Session, confirmation: &OrderConfirmation) {
    let order = confirmation
        .id
        .map_or_else(|| "(pending id)".to_string(), |id| id.to_string());
    let method = confirmation
        .order_method
        .map_or("-", |method| method.as_str());

    tracing::info!(
        "Order {order} placed {} by {} ({method})",
        confirmation.created_at,
        confirmation.buyer_name
    );
    for item in &confirmation.order_items {
        let title = item
            .item_id
            .and_then(|id| session.prefetched(id))
            .map_or("?", |goods| goods.title.as_str());
        tracing::info!("  {title} x{} - {}", item.quantity, item.price);
    }
}

/// Show order history, newest first.
pub async fn history(session: &mut Session) -> Result<(), CliError> {
    session.fetch_order_history().await?;

    for confirmation in session.order_history() {
        log_confirmation(session, confirmation);
    }
    let (pickup, delivery) = session.order_item_counts();
    tracing::info!("{pickup} pickup item(s), {delivery} delivery item(s)");
    Ok(())
}
