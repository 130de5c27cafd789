use uuid::Uuid;

use crate::{
    DbConn,
    error::{Error, Result},
    models::{Category, FoodItem},
};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    is_active: bool,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
        }
    }
}

/// Food item joined with its restaurant.
#[derive(Debug, sqlx::FromRow)]
struct FoodRow {
    id: Uuid,
    name: String,
    description: String,
    price: i64,
    category_id: Uuid,
    restaurant_id: Uuid,
    restaurant_name: String,
    delivery_time: String,
    preparation_time: String,
    tags: Vec<String>,
    is_available: bool,
}

impl From<FoodRow> for FoodItem {
    fn from(row: FoodRow) -> Self {
        FoodItem {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
            restaurant_id: row.restaurant_id,
            restaurant_name: row.restaurant_name,
            delivery_time: row.delivery_time,
            preparation_time: row.preparation_time,
            tags: row.tags,
            is_available: row.is_available,
        }
    }
}

const FOOD_SELECT: &str = r#"
    SELECT f.id, f.name, f.description, f.price, f.category_id, f.restaurant_id,
           r.name AS restaurant_name, r.delivery_time, f.preparation_time, f.tags,
           (f.is_available AND r.is_active) AS is_available
    FROM food_items f
    JOIN restaurants r ON r.id = f.restaurant_id
"#;

/// Escapes LIKE wildcards so customer text is matched literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Lists active categories ordered by name.
pub async fn list_active_categories(conn: &mut DbConn) -> Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        r#"
        SELECT id, name, description, is_active
        FROM categories
        WHERE is_active = TRUE
        ORDER BY name
        "#,
    )
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(rows.into_iter().map(Category::from).collect())
}

pub async fn get_category_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<Category>> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description, is_active FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(row.map(Category::from))
}

/// Gets a food item by id regardless of availability.
pub async fn get_food_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<FoodItem>> {
    let row = sqlx::query_as::<_, FoodRow>(&format!("{FOOD_SELECT} WHERE f.id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Error::Sqlx)?;

    Ok(row.map(FoodItem::from))
}

/// Searches available items by name, description or tag (case-insensitive).
pub async fn search_available_foods(
    conn: &mut DbConn,
    query: &str,
    limit: i64,
) -> Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodRow>(&format!(
        r#"{FOOD_SELECT}
        WHERE f.is_available AND r.is_active
          AND (f.name ILIKE $1 OR f.description ILIKE $1
               OR EXISTS (SELECT 1 FROM unnest(f.tags) AS tag WHERE tag ILIKE $1))
        ORDER BY f.name
        LIMIT $2
        "#
    ))
    .bind(like_pattern(query))
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(rows.into_iter().map(FoodItem::from).collect())
}

/// Lists available items in a category.
pub async fn list_available_foods_in_category(
    conn: &mut DbConn,
    category_id: Uuid,
    limit: i64,
) -> Result<Vec<FoodItem>> {
    let rows = sqlx::query_as::<_, FoodRow>(&format!(
        r#"{FOOD_SELECT}
        WHERE f.category_id = $1 AND f.is_available AND r.is_active
        ORDER BY f.name
        LIMIT $2
        "#
    ))
    .bind(category_id)
    .bind(limit)
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(rows.into_iter().map(FoodItem::from).collect())
}
