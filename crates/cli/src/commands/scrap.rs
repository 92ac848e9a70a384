//! Scrap commands.

use goodsmall_client::{Session, SessionEvent};
use goodsmall_core::GoodsId;

use crate::CliError;

/// Scrap or unscrap a goods item.
pub async fn set(session: &mut Session, goods_id: GoodsId, scraped: bool) -> Result<(), CliError> {
    let mut events = session.subscribe();
    session.set_scrap(goods_id, scraped).await?;

    while let Ok(event) = events.try_recv() {
        if let SessionEvent::ScrapChanged { scrap_count, .. } = event {
            tracing::info!(
                "{} goods {goods_id} ({scrap_count} scraps)",
                if scraped { "Scrapped" } else { "Unscrapped" }
            );
        }
    }
    Ok(())
}

/// List scrapped goods.
pub async fn list(session: &mut Session) -> Result<(), CliError> {
    session.fetch_scrap_list().await?;
    for goods in session.scraps() {
        tracing::info!("[{}] {} - {}", goods.id, goods.title, goods.price);
    }
    tracing::info!("{} scrapped goods", session.scraps().len());
    Ok(())
}
