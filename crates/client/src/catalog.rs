//! Catalog helpers: category list and text search.

use crate::api::{Category, Goods};

/// Category list with the synthetic "all products" entry first.
#[must_use]
pub fn with_all_products(categories: Vec<Category>) -> Vec<Category> {
    let mut list = Vec::with_capacity(categories.len() + 1);
    list.push(Category::all_products());
    list.extend(
        categories
            .into_iter()
            .filter(|category| category.id != Category::all_products().id),
    );
    list
}

/// Returns true if the goods item matches a search query.
///
/// Matches on title, seller name, seller method and description,
/// case-insensitively. A blank query matches everything.
#[must_use]
pub fn matches_query(goods: &Goods, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    let contains = |text: &str| text.to_lowercase().contains(&query);
    contains(&goods.title)
        || contains(&goods.seller.name)
        || contains(goods.seller.method.as_str())
        || goods.description.as_deref().is_some_and(contains)
}

/// Keep the goods matching a search query, in list order.
#[must_use]
pub fn search(goods: Vec<Goods>, query: &str) -> Vec<Goods> {
    goods
        .into_iter()
        .filter(|item| matches_query(item, query))
        .collect()
}
