//! # Catalog Service
//!
//! Categories and products, including their images.
//!
//! ## Product Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate fields (nothing stored yet)                                │
//! │  2. new upload?   put blob ──► normalize in place (RGB, ≤ 800px)        │
//! │     no upload?    existing image is normalized again                   │
//! │  3. write row ── failure ──► new blob removed                          │
//! │  4. replaced image? old blob removed                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The call returns only after the stored image has its final size.

use almacen_core::upload::UploadNamespace;
use almacen_core::{Category, NewCategory, NewProduct, Product};
use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::services::ImageUpload;
use crate::Almacen;

/// Category fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: String,
    /// New image. `None` keeps the current one.
    pub image: Option<ImageUpload>,
}

/// Product fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: String,
    pub price_cents: i64,
    pub description: String,
    pub category_id: String,
    /// New image. `None` keeps the current one.
    pub image: Option<ImageUpload>,
}

impl Almacen {
    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn create_category(&self, form: CategoryForm) -> ServiceResult<Category> {
        let mut new = NewCategory {
            name: form.name,
            image_path: None,
        };
        new.validate()?;

        new.image_path = self
            .store_optional_upload(UploadNamespace::Categories, &new.name, form.image.as_ref())
            .await?;

        match self.db.categories().create(&new).await {
            Ok(category) => {
                info!(id = %category.id, name = %category.name, "Category created");
                Ok(category)
            }
            Err(e) => {
                self.discard_optional_blob(new.image_path.as_deref()).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_category(&self, id: &str) -> ServiceResult<Category> {
        self.db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.db.categories().list().await?)
    }

    pub async fn update_category(&self, id: &str, form: CategoryForm) -> ServiceResult<Category> {
        let existing = self.get_category(id).await?;

        let mut category = Category {
            name: form.name,
            ..existing.clone()
        };
        category.validate()?;

        let new_path = self
            .store_optional_upload(UploadNamespace::Categories, &category.name, form.image.as_ref())
            .await?;
        if new_path.is_some() {
            category.image_path = new_path.clone();
        }

        if let Err(e) = self.db.categories().update(&category).await {
            self.discard_optional_blob(new_path.as_deref()).await;
            return Err(e.into());
        }

        if new_path.is_some() {
            self.discard_optional_blob(existing.image_path.as_deref()).await;
        }

        Ok(category)
    }

    /// Deletes a category without products, then its image.
    pub async fn delete_category(&self, id: &str) -> ServiceResult<Category> {
        let category = self.db.categories().delete(id).await?;
        self.discard_optional_blob(category.image_path.as_deref()).await;

        info!(id = %category.id, "Category deleted");
        Ok(category)
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn create_product(&self, form: ProductForm) -> ServiceResult<Product> {
        let mut new = NewProduct {
            name: form.name,
            image_path: None,
            price_cents: form.price_cents,
            description: form.description,
            category_id: form.category_id,
        };
        new.validate()?;

        new.image_path = self.store_product_image(&new.name, form.image.as_ref()).await?;

        match self.db.products().create(&new).await {
            Ok(product) => {
                info!(id = %product.id, name = %product.name, "Product created");
                Ok(product)
            }
            Err(e) => {
                self.discard_optional_blob(new.image_path.as_deref()).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list().await?)
    }

    pub async fn products_in_category(&self, category_id: &str) -> ServiceResult<Vec<Product>> {
        Ok(self.db.products().list_by_category(category_id).await?)
    }

    pub async fn update_product(&self, id: &str, form: ProductForm) -> ServiceResult<Product> {
        let existing = self.get_product(id).await?;

        let mut product = Product {
            name: form.name,
            price_cents: form.price_cents,
            description: form.description,
            category_id: form.category_id,
            ..existing.clone()
        };
        product.validate()?;

        let new_path = self.store_product_image(&product.name, form.image.as_ref()).await?;
        match &new_path {
            Some(path) => product.image_path = Some(path.clone()),
            None => {
                if let Some(current) = &product.image_path {
                    if let Err(e) = self.normalize_product_image(current).await {
                        warn!(id = %product.id, path = %current, error = %e, "Could not normalize stored image");
                    }
                }
            }
        }

        if let Err(e) = self.db.products().update(&product).await {
            self.discard_optional_blob(new_path.as_deref()).await;
            return Err(e.into());
        }

        if new_path.is_some() {
            self.discard_optional_blob(existing.image_path.as_deref()).await;
        }

        Ok(product)
    }

    /// Deletes a product without movements or transactions, then its image.
    ///
    /// NFC tags bound to it are unbound.
    pub async fn delete_product(&self, id: &str) -> ServiceResult<Product> {
        let product = self.db.products().delete(id).await?;
        self.discard_optional_blob(product.image_path.as_deref()).await;

        info!(id = %product.id, "Product deleted");
        Ok(product)
    }

    /// Stores and normalizes a product upload. Nothing is left behind on failure.
    async fn store_product_image(
        &self,
        name: &str,
        upload: Option<&ImageUpload>,
    ) -> ServiceResult<Option<String>> {
        let Some(path) = self
            .store_optional_upload(UploadNamespace::Products, name, upload)
            .await?
        else {
            return Ok(None);
        };

        if let Err(e) = self.normalize_product_image(&path).await {
            self.discard_blob(&path).await;
            return Err(e);
        }

        Ok(Some(path))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
