//! # Category Repository
//!
//! Database operations for categories. Deleting a category that still owns
//! products is refused.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::{begin_write, count_referencing};
use almacen_core::{Category, NewCategory};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category and returns it with its generated ID.
    pub async fn create(&self, new: &NewCategory) -> DbResult<Category> {
        new.validate()?;

        let category = Category {
            id: generate_id(),
            name: new.name.clone(),
            image_path: new.image_path.clone(),
        };

        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name, image_path) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.image_path)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, image_path FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, image_path FROM categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Updates name and image path.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        category.validate()?;

        debug!(id = %category.id, "Updating category");

        let result = sqlx::query("UPDATE categories SET name = ?2, image_path = ?3 WHERE id = ?1")
            .bind(&category.id)
            .bind(&category.name)
            .bind(&category.image_path)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category and returns the removed row.
    ///
    /// Fails with [`DbError::ReferentialIntegrity`] while any product
    /// belongs to it; nothing is removed in that case.
    pub async fn delete(&self, id: &str) -> DbResult<Category> {
        debug!(id = %id, "Deleting category");

        let mut tx = begin_write(&self.pool).await?;

        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, image_path FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Category", id))?;

        let products = count_referencing(&mut *tx, "products", "category_id", id).await?;
        if products > 0 {
            return Err(DbError::protected("Category", id, "products"));
        }

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(category)
    }

    /// Counts categories.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use almacen_core::ValidationError;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = fixtures::db().await;
        let created = fixtures::category(&db, "Lácteos").await;

        let fetched = db.categories().get_by_id(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created.clone()));
        assert_eq!(created.to_string(), "Lácteos");
    }

    #[tokio::test]
    async fn test_name_required() {
        let db = fixtures::db().await;
        let err = db
            .categories()
            .create(&NewCategory::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Required { .. })
        ));
        assert_eq!(db.categories().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update() {
        let db = fixtures::db().await;
        let mut category = fixtures::category(&db, "Bebidas").await;

        category.name = "Bebidas frías".to_string();
        category.image_path = Some("categories_images/bebidas-frias-0a1b2c3d.png".to_string());
        db.categories().update(&category).await.unwrap();

        let fetched = db.categories().get_by_id(&category.id).await.unwrap().unwrap();
        assert_eq!(fetched, category);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = fixtures::db().await;
        let ghost = Category {
            id: generate_id(),
            name: "Fantasma".to_string(),
            image_path: None,
        };

        let err = db.categories().update(&ghost).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_unreferenced() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Vacía").await;

        let removed = db.categories().delete(&category.id).await.unwrap();
        assert_eq!(removed.id, category.id);
        assert!(db.categories().get_by_id(&category.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_with_products_is_protected() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Granos").await;
        let product = fixtures::product(&db, &category, "Arroz 1kg").await;

        let err = db.categories().delete(&category.id).await.unwrap_err();
        assert!(matches!(err, DbError::ReferentialIntegrity { .. }));

        // Both rows remain
        assert!(db.categories().get_by_id(&category.id).await.unwrap().is_some());
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let db = fixtures::db().await;
        fixtures::category(&db, "Limpieza").await;
        fixtures::category(&db, "Abarrotes").await;

        let names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Abarrotes", "Limpieza"]);
    }
}
