//! User records and the in-memory repository.

use essentials_core::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A stored user.
///
/// The password is accepted on creation but never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier, assigned by the store.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address.
    pub email: String,
    /// Avatar URL.
    pub photo_url: String,
    /// Login secret.
    #[serde(skip_serializing, default)]
    pub password: String,
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address.
    pub email: String,
    /// Avatar URL.
    pub photo_url: String,
    /// Login secret.
    pub password: String,
}

impl NewUser {
    fn into_user(self, id: String) -> User {
        User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            photo_url: self.photo_url,
            password: self.password,
        }
    }
}

/// Storage for users.
pub trait UserRepository: Send + Sync + 'static {
    /// Stores a new user and returns it with its assigned id.
    fn create_user(&self, user: NewUser) -> BoxFuture<'_, User>;

    /// Looks a user up by id.
    fn get_user<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<User>>;

    /// Returns every user in insertion order.
    fn list_users(&self) -> BoxFuture<'_, Vec<User>>;
}

/// In-memory user list.
///
/// Ids are the list length plus one at insertion time. Nothing is ever
/// removed, so ids stay unique.
#[derive(Debug)]
pub struct LocalUserStore {
    users: RwLock<Vec<User>>,
}

impl LocalUserStore {
    /// Creates a store holding only the seed user.
    #[must_use]
    pub fn new() -> Self {
        Self::with_users(vec![seed_user()])
    }

    /// Creates a store with the given users.
    #[must_use]
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    /// Returns the number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl Default for LocalUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for LocalUserStore {
    fn create_user(&self, user: NewUser) -> BoxFuture<'_, User> {
        let mut users = self.users.write();
        let user = user.into_user((users.len() + 1).to_string());
        users.push(user.clone());
        drop(users);

        tracing::debug!(user_id = %user.id, "User created");
        Box::pin(std::future::ready(user))
    }

    fn get_user<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<User>> {
        let user = self.users.read().iter().find(|u| u.id == id).cloned();
        Box::pin(std::future::ready(user))
    }

    fn list_users(&self) -> BoxFuture<'_, Vec<User>> {
        let users = self.users.read().clone();
        Box::pin(std::future::ready(users))
    }
}

fn seed_user() -> User {
    User {
        id: "1".to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: "john.doe.example.com".to_string(),
        photo_url: "https://example.com/john-doe.jpg".to_string(),
        password: "password".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> NewUser {
        NewUser {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane.doe.example.com".to_string(),
            photo_url: "https://example.com/jane-doe.jpg".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeded_with_john() {
        let store = LocalUserStore::new();
        let john = store.get_user("1").await.unwrap();
        assert_eq!(john.first_name, "John");
        assert_eq!(john.email, "john.doe.example.com");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = LocalUserStore::new();
        let created = store.create_user(jane()).await;
        assert_eq!(created.id, "2");

        let fetched = store.get_user("2").await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.list_users().await.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_store_starts_at_one() {
        let store = LocalUserStore::with_users(Vec::new());
        assert!(store.is_empty());
        assert_eq!(store.create_user(jane()).await.id, "1");
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = LocalUserStore::new();
        assert!(store.get_user("99").await.is_none());
    }

    #[test]
    fn test_password_not_serialized() {
        let json = serde_json::to_value(seed_user()).unwrap();
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["photoUrl"], "https://example.com/john-doe.jpg");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_new_user_from_camel_case() {
        let user: NewUser = serde_json::from_value(serde_json::json!({
            "firstName": "Alice",
            "lastName": "Smith",
            "email": "alice.smith.example.com",
            "photoUrl": "https://example.com/alice-smith.jpg",
            "password": "pw"
        }))
        .unwrap();
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.password, "pw");
    }
}
