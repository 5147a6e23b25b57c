//! Category and word list command handlers.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use wordbank_core::AppContext;

use super::print_json;

pub async fn categories(ctx: &AppContext, cancel: &CancellationToken) -> Result<()> {
    // On failure the store already holds the bundled categories.
    if let Err(e) = ctx.fetch_categories(cancel).await {
        eprintln!("warning: {}; showing offline categories", e.user_message());
    }
    let categories = ctx.store().select(|s| s.game.categories.clone());
    print_json(&categories)
}

pub async fn category(ctx: &AppContext, id: &str, cancel: &CancellationToken) -> Result<()> {
    ctx.fetch_category(id, cancel)
        .await
        .with_context(|| format!("load category {id}"))?;
    let category = ctx.store().select(|s| s.game.category.clone());
    print_json(&category)
}

pub async fn lists(
    ctx: &AppContext,
    page: u32,
    per_page: u32,
    cancel: &CancellationToken,
) -> Result<()> {
    ctx.fetch_word_lists(page, per_page, cancel)
        .await
        .context("load word lists")?;
    let (lists, page_info) = ctx
        .store()
        .select(|s| (s.game.word_lists.clone(), s.game.pagination));
    print_json(&lists)?;
    if let Some(info) = page_info {
        eprintln!(
            "page {}/{} ({} lists)",
            info.page, info.total_pages, info.total_items
        );
    }
    Ok(())
}

pub async fn by_category(
    ctx: &AppContext,
    category_id: &str,
    page: u32,
    per_page: u32,
    cancel: &CancellationToken,
) -> Result<()> {
    ctx.fetch_lists_by_category(category_id, page, per_page, cancel)
        .await
        .with_context(|| format!("load word lists in category {category_id}"))?;
    let (lists, page_info) = ctx.store().select(|s| {
        (
            s.game.lists_by_category.clone(),
            s.game.lists_by_category_pagination,
        )
    });
    print_json(&lists)?;
    if let Some(info) = page_info {
        eprintln!(
            "page {}/{} ({} lists)",
            info.page, info.total_pages, info.total_items
        );
    }
    Ok(())
}

pub async fn list(ctx: &AppContext, id: &str, cancel: &CancellationToken) -> Result<()> {
    ctx.fetch_list(id, cancel)
        .await
        .with_context(|| format!("load word list {id}"))?;
    let list = ctx.store().select(|s| s.game.list.clone());
    print_json(&list)
}

pub async fn bank(ctx: &AppContext, list_id: &str, cancel: &CancellationToken) -> Result<()> {
    ctx.add_list_to_bank(list_id, cancel)
        .await
        .with_context(|| format!("add list {list_id} to bank"))?;
    println!("Added {list_id} to your bank");
    Ok(())
}
