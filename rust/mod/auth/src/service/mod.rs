pub mod password;

use std::sync::Arc;

use royalcare_core::{Role, ServiceError, new_id, non_blank, now_rfc3339};
use royalcare_kv::KVStore;

use crate::model::{Identity, NewUser, UserRecord};

const USER_PREFIX: &str = "auth/users/";

fn user_key(username: &str) -> String {
    format!("{}{}", USER_PREFIX, username)
}

/// Credential verification. The only operation the rest of the system
/// needs from the user database.
pub trait CredentialStore: Send + Sync {
    /// Return the identity for a matching username/password, or `None`.
    fn verify(&self, username: &str, password: &str) -> Result<Option<Identity>, ServiceError>;
}

/// Authenticate a login attempt. Empty input, unknown users and wrong
/// passwords all fail with the same `Unauthenticated` error.
pub fn authenticate(
    store: &dyn CredentialStore,
    username: &str,
    password: &str,
) -> Result<Identity, ServiceError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ServiceError::Unauthenticated("Wrong credentials".into()));
    }
    match store.verify(username, password)? {
        Some(identity) => Ok(identity),
        None => {
            tracing::warn!(username, "login rejected");
            Err(ServiceError::Unauthenticated("Wrong credentials".into()))
        }
    }
}

/// CredentialStore backed by the KV store, one JSON record per user.
pub struct KvCredentialStore {
    kv: Arc<dyn KVStore>,
}

impl KvCredentialStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    fn storage_err(e: royalcare_kv::KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    /// Look up a user record by username.
    pub fn get_user(&self, username: &str) -> Result<Option<UserRecord>, ServiceError> {
        let Some(bytes) = self.kv.get(&user_key(username)).map_err(Self::storage_err)? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Internal(format!("corrupt user record {}: {}", username, e)))?;
        Ok(Some(record))
    }

    /// Provision a user. Fails `Validation` if the username is blank, the
    /// password is empty or the username is taken.
    pub fn add_user(&self, input: NewUser) -> Result<Identity, ServiceError> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(ServiceError::Validation("username is required".into()));
        }
        if input.password.is_empty() {
            return Err(ServiceError::Validation("password is required".into()));
        }

        let record = UserRecord {
            id: new_id(),
            username: username.clone(),
            role: input.role,
            department: non_blank(input.department),
            password_hash: password::hash_password(&input.password)?,
            created_at: now_rfc3339(),
        };
        let data = serde_json::to_vec(&record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        let inserted = self
            .kv
            .set_if_absent(&user_key(&username), &data)
            .map_err(Self::storage_err)?;
        if !inserted {
            return Err(ServiceError::Validation(format!(
                "user {} already exists",
                username
            )));
        }

        tracing::info!(username = %username, role = record.role.as_str(), "user created");
        Ok(record.identity())
    }

    /// Create a user from an existing argon2id hash unless the username is
    /// already taken. Returns whether the user was created.
    pub fn ensure_user_with_hash(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        department: Option<String>,
    ) -> Result<bool, ServiceError> {
        let record = UserRecord {
            id: new_id(),
            username: username.to_string(),
            role,
            department: non_blank(department),
            password_hash: password_hash.to_string(),
            created_at: now_rfc3339(),
        };
        let data = serde_json::to_vec(&record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        let created = self
            .kv
            .set_if_absent(&user_key(username), &data)
            .map_err(Self::storage_err)?;
        if created {
            tracing::info!(username, role = role.as_str(), "user provisioned");
        }
        Ok(created)
    }

    /// Replace a user's password.
    pub fn set_password(&self, username: &str, password: &str) -> Result<(), ServiceError> {
        if password.is_empty() {
            return Err(ServiceError::Validation("password is required".into()));
        }
        let mut record = self
            .get_user(username)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} not found", username)))?;
        record.password_hash = password::hash_password(password)?;
        let data = serde_json::to_vec(&record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        self.kv
            .set(&user_key(username), &data)
            .map_err(Self::storage_err)?;
        tracing::info!(username, "password updated");
        Ok(())
    }

    /// All provisioned users, sorted by username.
    pub fn list_users(&self) -> Result<Vec<Identity>, ServiceError> {
        let mut users = Vec::new();
        for (key, bytes) in self.kv.scan(USER_PREFIX).map_err(Self::storage_err)? {
            let record: UserRecord = serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Internal(format!("corrupt user record {}: {}", key, e)))?;
            users.push(record.identity());
        }
        Ok(users)
    }
}

impl CredentialStore for KvCredentialStore {
    fn verify(&self, username: &str, password: &str) -> Result<Option<Identity>, ServiceError> {
        let Some(record) = self.get_user(username)? else {
            return Ok(None);
        };
        if password::verify_password(password, &record.password_hash) {
            Ok(Some(record.identity()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use royalcare_kv::RedbStore;

    fn test_store() -> (KvCredentialStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(RedbStore::open(&dir.path().join("auth.redb")).unwrap());
        (KvCredentialStore::new(kv), dir)
    }

    fn new_user(username: &str, password: &str, role: Role, dept: Option<&str>) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            role,
            department: dept.map(String::from),
        }
    }

    #[test]
    fn add_user_then_authenticate() {
        let (store, _dir) = test_store();
        let created = store
            .add_user(new_user("nurse", "pw", Role::User, Some("ICU")))
            .unwrap();
        assert_eq!(created.username, "nurse");
        assert_eq!(created.department.as_deref(), Some("ICU"));

        let identity = authenticate(&store, "nurse", "pw").unwrap();
        assert_eq!(identity, created);
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn wrong_password_and_unknown_user_are_unauthenticated() {
        let (store, _dir) = test_store();
        store.add_user(new_user("boss", "pw", Role::Admin, None)).unwrap();

        assert!(matches!(
            authenticate(&store, "boss", "nope"),
            Err(ServiceError::Unauthenticated(_))
        ));
        assert!(matches!(
            authenticate(&store, "ghost", "pw"),
            Err(ServiceError::Unauthenticated(_))
        ));
        assert!(matches!(
            authenticate(&store, "", ""),
            Err(ServiceError::Unauthenticated(_))
        ));
    }

    #[test]
    fn duplicate_username_rejected() {
        let (store, _dir) = test_store();
        store.add_user(new_user("a", "pw", Role::User, None)).unwrap();
        let err = store.add_user(new_user("a", "other", Role::Admin, None)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        // The original account is untouched.
        assert_eq!(authenticate(&store, "a", "pw").unwrap().role, Role::User);
    }

    #[test]
    fn blank_department_is_absent() {
        let (store, _dir) = test_store();
        let id = store.add_user(new_user("b", "pw", Role::User, Some("  "))).unwrap();
        assert_eq!(id.department, None);
    }

    #[test]
    fn set_password_replaces_hash() {
        let (store, _dir) = test_store();
        store.add_user(new_user("c", "old", Role::User, None)).unwrap();
        store.set_password("c", "new").unwrap();
        assert!(authenticate(&store, "c", "old").is_err());
        assert!(authenticate(&store, "c", "new").is_ok());
        assert!(matches!(
            store.set_password("missing", "x"),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn ensure_user_with_hash_only_creates_once() {
        let (store, _dir) = test_store();
        let hash = password::hash_password("boot").unwrap();
        assert!(store.ensure_user_with_hash("root", &hash, Role::Admin, None).unwrap());
        assert!(!store
            .ensure_user_with_hash("root", "$argon2id$other", Role::User, None)
            .unwrap());

        let identity = authenticate(&store, "root", "boot").unwrap();
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn list_users_sorted() {
        let (store, _dir) = test_store();
        store.add_user(new_user("zed", "pw", Role::User, None)).unwrap();
        store.add_user(new_user("amy", "pw", Role::Admin, None)).unwrap();
        let names: Vec<String> = store.list_users().unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }
}
