//! # Controller Repository
//!
//! Registration and listing of controllers. Controller ids are either
//! supplied by the caller or generated here as 20 random bytes, hex-encoded.

use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::auth::UserId;
use crate::error::{RepositoryError, is_unique_violation};
use crate::models::controller::{self, ActiveModel as ControllerActiveModel, Entity as Controller};

use super::{MAX_NAME_LEN, require_text};

/// Number of random bytes in a generated controller id
pub const CONTROLLER_ID_BYTES: usize = 20;

/// Longest caller-supplied controller id accepted
pub const MAX_CONTROLLER_ID_LEN: usize = 40;

/// Attempts made to find an unused generated id before giving up
const MAX_ID_ATTEMPTS: usize = 8;

/// Generate a controller id: 20 bytes from the OS RNG as 40 lowercase hex characters
pub fn generate_controller_id() -> String {
    let mut bytes = [0u8; CONTROLLER_ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Request data for registering a controller
#[derive(Debug, Clone)]
pub struct NewController {
    pub name: String,
    pub location: String,
    /// Caller-chosen id; generated when absent
    pub controller_id: Option<String>,
}

/// Repository for controller database operations
pub struct ControllerRepository<'a, C> {
    db: &'a C,
    id_generator: fn() -> String,
}

impl<'a, C: ConnectionTrait> ControllerRepository<'a, C> {
    /// Create a new ControllerRepository with the given connection
    pub fn new(db: &'a C) -> Self {
        Self {
            db,
            id_generator: generate_controller_id,
        }
    }

    /// Replace the id generator (collision handling is exercised through this)
    pub fn with_id_generator(mut self, id_generator: fn() -> String) -> Self {
        self.id_generator = id_generator;
        self
    }

    /// Register a controller for `owner`
    ///
    /// Each attempt is a single insert so the unique indexes decide the
    /// outcome. Both indexes are scoped to the owner, so other users'
    /// controllers never collide. A generated id that collides is
    /// regenerated; a duplicate `(owner, name)` or a caller-supplied id the
    /// owner already uses is a conflict.
    pub async fn create(
        &self,
        owner: &UserId,
        request: NewController,
    ) -> Result<controller::Model, RepositoryError> {
        let name = require_text("name", &request.name, Some(MAX_NAME_LEN))?;
        let location = require_text("location", &request.location, None)?;
        let supplied_id = request
            .controller_id
            .as_deref()
            .map(|id| require_text("controller_id", id, Some(MAX_CONTROLLER_ID_LEN)))
            .transpose()?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let controller_id = match &supplied_id {
                Some(id) => id.clone(),
                None => (self.id_generator)(),
            };

            let controller = ControllerActiveModel {
                id: Set(Uuid::new_v4()),
                controller_id: Set(controller_id.clone()),
                owner_id: Set(owner.0),
                name: Set(name.clone()),
                location: Set(location.clone()),
                created_at: Set(Utc::now().into()),
            };

            let error = match controller.insert(self.db).await {
                Ok(model) => return Ok(model),
                Err(error) if is_unique_violation(&error) => error,
                Err(error) => return Err(error.into()),
            };

            if self.name_taken(owner, &name).await? {
                return Err(RepositoryError::Conflict(format!(
                    "Controller named '{}' already exists",
                    name
                )));
            }

            if supplied_id.is_some() {
                return Err(RepositoryError::Conflict(format!(
                    "Controller id '{}' is already registered",
                    controller_id
                )));
            }

            tracing::warn!(attempt, ?error, "Generated controller id collided, regenerating");
        }

        Err(RepositoryError::Internal(format!(
            "could not generate an unused controller id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }

    /// List every controller owned by `owner`, oldest first
    pub async fn list(&self, owner: &UserId) -> Result<Vec<controller::Model>, RepositoryError> {
        let controllers = Controller::find()
            .filter(controller::Column::OwnerId.eq(owner.0))
            .order_by_asc(controller::Column::CreatedAt)
            .order_by_asc(controller::Column::Id)
            .all(self.db)
            .await?;

        Ok(controllers)
    }

    async fn name_taken(&self, owner: &UserId, name: &str) -> Result<bool, RepositoryError> {
        let existing = Controller::find()
            .filter(controller::Column::OwnerId.eq(owner.0))
            .filter(controller::Column::Name.eq(name))
            .one(self.db)
            .await?;

        Ok(existing.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::setup_db;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn greenhouse() -> NewController {
        NewController {
            name: "Greenhouse".to_string(),
            location: "Backyard".to_string(),
            controller_id: None,
        }
    }

    #[test]
    fn generated_ids_are_40_lowercase_hex_and_distinct() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let id = generate_controller_id();
            assert_eq!(id.len(), 40);
            assert!(
                id.chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
            );
            assert!(seen.insert(id));
        }
    }

    #[tokio::test]
    async fn create_generates_id_when_absent() {
        let db = setup_db().await;
        let owner = UserId(Uuid::new_v4());

        let controller = ControllerRepository::new(&db)
            .create(&owner, greenhouse())
            .await
            .unwrap();

        assert_eq!(controller.controller_id.len(), 40);
        assert_eq!(controller.owner_id, owner.0);
        assert_eq!(controller.name, "Greenhouse");
        assert_eq!(controller.location, "Backyard");
    }

    #[tokio::test]
    async fn duplicate_name_for_same_owner_conflicts() {
        let db = setup_db().await;
        let owner = UserId(Uuid::new_v4());
        let repo = ControllerRepository::new(&db);

        assert!(repo.create(&owner, greenhouse()).await.is_ok());
        assert!(matches!(
            repo.create(&owner, greenhouse()).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn same_name_for_different_owners_is_allowed() {
        let db = setup_db().await;
        let repo = ControllerRepository::new(&db);

        repo.create(&UserId(Uuid::new_v4()), greenhouse())
            .await
            .unwrap();
        repo.create(&UserId(Uuid::new_v4()), greenhouse())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn supplied_id_is_kept_and_collisions_conflict() {
        let db = setup_db().await;
        let repo = ControllerRepository::new(&db);
        let owner = UserId(Uuid::new_v4());

        let mut request = greenhouse();
        request.controller_id = Some("gateway-01".to_string());
        let controller = repo.create(&owner, request).await.unwrap();
        assert_eq!(controller.controller_id, "gateway-01");

        let clash = NewController {
            name: "Garage".to_string(),
            location: "House".to_string(),
            controller_id: Some("gateway-01".to_string()),
        };
        assert!(matches!(
            repo.create(&owner, clash).await,
            Err(RepositoryError::Conflict(_))
        ));
    }

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn colliding_then_fresh() -> String {
        if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
            "a".repeat(40)
        } else {
            generate_controller_id()
        }
    }

    #[tokio::test]
    async fn generated_id_collision_is_retried() {
        let db = setup_db().await;
        let repo = ControllerRepository::new(&db);
        let owner = UserId(Uuid::new_v4());

        let mut taken = greenhouse();
        taken.controller_id = Some("a".repeat(40));
        repo.create(&owner, taken).await.unwrap();

        let controller = ControllerRepository::new(&db)
            .with_id_generator(colliding_then_fresh)
            .create(
                &owner,
                NewController {
                    name: "Garage".to_string(),
                    location: "House".to_string(),
                    controller_id: None,
                },
            )
            .await
            .unwrap();

        assert_ne!(controller.controller_id, "a".repeat(40));
        assert!(CALLS.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn controller_ids_are_scoped_to_their_owner() {
        let db = setup_db().await;
        let repo = ControllerRepository::new(&db);
        let alice = UserId(Uuid::new_v4());
        let bob = UserId(Uuid::new_v4());

        let mut request = greenhouse();
        request.controller_id = Some("gateway-01".to_string());
        let alices = repo.create(&alice, request).await.unwrap();

        let bobs = repo
            .create(
                &bob,
                NewController {
                    name: "Shed".to_string(),
                    location: "Garden".to_string(),
                    controller_id: Some("gateway-01".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(bobs.controller_id, "gateway-01");
        assert_eq!(bobs.owner_id, bob.0);
        assert_ne!(bobs.id, alices.id);
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let db = setup_db().await;
        let repo = ControllerRepository::new(&db);
        let owner = UserId(Uuid::new_v4());

        let mut blank_name = greenhouse();
        blank_name.name = "   ".to_string();
        assert!(matches!(
            repo.create(&owner, blank_name).await,
            Err(RepositoryError::Validation { field: "name", .. })
        ));

        let mut long_id = greenhouse();
        long_id.controller_id = Some("x".repeat(41));
        assert!(matches!(
            repo.create(&owner, long_id).await,
            Err(RepositoryError::Validation {
                field: "controller_id",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn list_returns_only_owned_controllers() {
        let db = setup_db().await;
        let repo = ControllerRepository::new(&db);
        let owner = UserId(Uuid::new_v4());

        repo.create(&owner, greenhouse()).await.unwrap();
        repo.create(
            &owner,
            NewController {
                name: "Garage".to_string(),
                location: "House".to_string(),
                controller_id: None,
            },
        )
        .await
        .unwrap();
        repo.create(&UserId(Uuid::new_v4()), greenhouse())
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list(&owner)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Greenhouse".to_string()));
        assert!(names.contains(&"Garage".to_string()));
    }
}
