use std::collections::BTreeMap;
use std::fmt::Write;

use sea_orm::{sea_query::Query, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::db::entities::{ingredient, recipe_ingredient, shopping_cart};
use crate::db::models::ShoppingListItem;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// Sums ingredient amounts over every recipe in the user's cart.
pub async fn shopping_list<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<ShoppingListItem>, DbErr> {
    let rows = recipe_ingredient::Entity::find()
        .filter(
            recipe_ingredient::Column::RecipeId.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .find_also_related(ingredient::Entity)
        .all(db)
        .await?;

    Ok(aggregate(rows.into_iter().filter_map(|(link, ingredient)| {
        ingredient.map(|i| (i.name, i.measurement_unit, link.amount))
    })))
}

/// Groups `(name, unit, amount)` rows by name and unit, ordered by name.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = (String, String, i32)>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_insert(0) += i64::from(amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListItem {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// Renders the list as the plain-text download, one item per line.
pub fn render(items: &[ShoppingListItem]) -> String {
    let mut out = String::new();
    for item in items {
        let _ = writeln!(out, "{} ({}) - {}", item.name, item.measurement_unit, item.amount);
    }
    out
}
