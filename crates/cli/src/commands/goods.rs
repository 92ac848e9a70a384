//! Catalog commands.

use goodsmall_client::Session;
use goodsmall_client::api::Goods;
use goodsmall_core::{CategoryId, GoodsId};

use crate::CliError;

fn log_goods(goods: &Goods) {
    tracing::info!(
        "[{}] {} - {} ({}, {})",
        goods.id,
        goods.title,
        goods.price,
        goods.seller.name,
        goods.seller.method
    );
}

/// List goods, optionally in one category.
pub async fn list(session: &mut Session, category: Option<CategoryId>) -> Result<(), CliError> {
    match category {
        Some(category_id) => session.fetch_goods_by_category(category_id).await?,
        None => session.fetch_goods_list().await?,
    }

    session.goods_list().iter().for_each(log_goods);
    tracing::info!(
        "{} goods, {} in cart",
        session.goods_list().len(),
        session.cart_item_count()
    );
    Ok(())
}

/// Show one goods item.
pub async fn show(session: &mut Session, goods_id: GoodsId) -> Result<(), CliError> {
    session.fetch_goods_detail(goods_id).await?;
    let Some(goods) = session.goods_detail() else {
        return Ok(());
    };

    log_goods(goods);
    if !goods.delivery_fee.is_zero() {
        tracing::info!("  Delivery fee: {}", goods.delivery_fee);
    }
    if let Some(description) = &goods.description {
        tracing::info!("  {description}");
    }
    for option in &goods.goods_infos {
        tracing::info!(
            "  Option: color={} size={}",
            option.color.as_deref().unwrap_or("-"),
            option.size.as_deref().unwrap_or("-")
        );
    }
    tracing::info!(
        "  Scraps: {}{}",
        goods.scrap_count,
        if goods.scraped { " (scrapped)" } else { "" }
    );
    Ok(())
}

/// Search by title, seller or description.
pub async fn search(session: &mut Session, query: &str) -> Result<(), CliError> {
    session.search(query).await?;
    session.search_results().iter().for_each(log_goods);
    tracing::info!("{} matches for {query:?}", session.search_results().len());
    Ok(())
}

/// List categories.
pub async fn categories(session: &mut Session) -> Result<(), CliError> {
    session.fetch_categories().await?;
    for category in session.categories() {
        tracing::info!("[{}] {}", category.id, category.name);
    }
    Ok(())
}
