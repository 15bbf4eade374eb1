//! # User Service

use almacen_core::upload::UploadNamespace;
use almacen_core::{NewUser, User};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::services::ImageUpload;
use crate::Almacen;

/// User fields as submitted.
#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    /// New avatar. `None` keeps the current one.
    pub image: Option<ImageUpload>,
}

impl Almacen {
    pub async fn create_user(&self, form: UserForm) -> ServiceResult<User> {
        let mut new = NewUser {
            name: form.name,
            email: form.email,
            password: form.password,
            image_path: None,
        };
        new.validate()?;

        new.image_path = self
            .store_optional_upload(UploadNamespace::Users, &new.name, form.image.as_ref())
            .await?;

        match self.db.users().create(&new).await {
            Ok(user) => {
                info!(id = %user.id, "User created");
                Ok(user)
            }
            Err(e) => {
                self.discard_optional_blob(new.image_path.as_deref()).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        self.db
            .users()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.db.users().list().await?)
    }

    pub async fn update_user(&self, id: &str, form: UserForm) -> ServiceResult<User> {
        let existing = self.get_user(id).await?;

        let mut user = User {
            name: form.name,
            email: form.email.trim().to_string(),
            password: form.password,
            ..existing.clone()
        };
        user.validate()?;

        let new_path = self
            .store_optional_upload(UploadNamespace::Users, &user.name, form.image.as_ref())
            .await?;
        if new_path.is_some() {
            user.image_path = new_path.clone();
        }

        if let Err(e) = self.db.users().update(&user).await {
            self.discard_optional_blob(new_path.as_deref()).await;
            return Err(e.into());
        }

        if new_path.is_some() {
            self.discard_optional_blob(existing.image_path.as_deref()).await;
        }

        Ok(user)
    }

    /// Deletes a user without transactions, then their avatar.
    pub async fn delete_user(&self, id: &str) -> ServiceResult<User> {
        let user = self.db.users().delete(id).await?;
        self.discard_optional_blob(user.image_path.as_deref()).await;

        info!(id = %user.id, "User deleted");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::{almacen, assert_upload_path, rgba_png};
    use almacen_media::BlobStore;

    fn form(name: &str, email: &str) -> UserForm {
        UserForm {
            name: name.to_string(),
            email: email.to_string(),
            password: "clave-segura".to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_with_avatar() {
        let (svc, media) = almacen().await;

        let mut f = form("Ana Pérez", "ana@almacen.test");
        f.image = Some(ImageUpload::new("avatar.JPG", rgba_png(16, 16)));
        let user = svc.create_user(f).await.unwrap();

        let path = user.image_path.clone().unwrap();
        assert_upload_path(&path, "users_images", "ana-perez", "JPG");
        assert!(media.exists(&path).unwrap());

        // Password never leaves through serialization
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn test_invalid_email() {
        let (svc, media) = almacen().await;

        let mut f = form("Luis", "no-es-correo");
        f.image = Some(ImageUpload::new("l.png", rgba_png(4, 4)));
        let err = svc.create_user(f).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(media.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let (svc, media) = almacen().await;

        let mut f = form("Marta", "marta@almacen.test");
        f.image = Some(ImageUpload::new("m.png", rgba_png(4, 4)));
        let user = svc.create_user(f).await.unwrap();
        let old_path = user.image_path.clone().unwrap();

        let mut f = form("Marta Ruiz", " marta.ruiz@almacen.test ");
        f.image = Some(ImageUpload::new("m2.png", rgba_png(4, 4)));
        let updated = svc.update_user(&user.id, f).await.unwrap();

        assert_eq!(updated.email, "marta.ruiz@almacen.test");
        assert!(!media.exists(&old_path).unwrap());
        assert_eq!(media.len(), 1);

        svc.delete_user(&user.id).await.unwrap();
        assert!(media.is_empty());
        assert_eq!(
            svc.get_user(&user.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
