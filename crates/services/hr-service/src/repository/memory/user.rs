use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{
    Page, Pagination, RepositoryError, RepositoryResult, User, UserFilter, UserRepository,
    UserRole, UserSort,
};

/// Users keyed by id. Usernames are unique exactly, emails case-insensitively.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn check_unique(store: &HashMap<Uuid, User>, user: &User) -> RepositoryResult<()> {
    let id = user.id();
    if store
        .values()
        .any(|u| u.id() != id && u.username() == user.username())
    {
        return Err(RepositoryError::Duplicate { field: "username" });
    }
    if store
        .values()
        .any(|u| u.id() != id && u.email().eq_ignore_ascii_case(user.email()))
    {
        return Err(RepositoryError::Duplicate { field: "email" });
    }
    Ok(())
}

fn sorted(store: &HashMap<Uuid, User>, filter: &UserFilter, sort: UserSort) -> Vec<User> {
    let mut matching: Vec<User> = store.values().filter(|u| filter.matches(u)).cloned().collect();
    matching.sort_by(|a, b| sort.compare(a, b));
    matching
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut store = self.users.write().await;
        if store.contains_key(&user.id()) {
            return Err(RepositoryError::Duplicate { field: "id" });
        }
        check_unique(&store, user)?;
        store.insert(user.id(), user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let mut store = self.users.write().await;
        if !store.contains_key(&user.id()) {
            return Err(RepositoryError::NotFound);
        }
        check_unique(&store, user)?;
        store.insert(user.id(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let store = self.users.read().await;
        Ok(store.values().find(|u| u.username() == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let store = self.users.read().await;
        Ok(store
            .values()
            .find(|u| u.email().eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_role(&self, role: UserRole) -> RepositoryResult<Vec<User>> {
        let filter = UserFilter {
            role: Some(role),
            ..UserFilter::default()
        };
        Ok(sorted(&*self.users.read().await, &filter, UserSort::default()))
    }

    async fn find_by_active_status(&self, is_active: bool) -> RepositoryResult<Vec<User>> {
        let filter = UserFilter {
            is_active: Some(is_active),
            ..UserFilter::default()
        };
        Ok(sorted(&*self.users.read().await, &filter, UserSort::default()))
    }

    async fn list(
        &self,
        filter: &UserFilter,
        sort: UserSort,
        pagination: &Pagination,
    ) -> RepositoryResult<Page<User>> {
        let matching = sorted(&*self.users.read().await, filter, sort);
        Page::paginate(matching, pagination, |u| u.id().to_string())
    }

    async fn count(&self, filter: &UserFilter) -> RepositoryResult<u64> {
        let store = self.users.read().await;
        Ok(store.values().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool> {
        let store = self.users.read().await;
        Ok(store.values().any(|u| u.username() == username))
    }

    async fn exists_by_email(&self, email: &str) -> RepositoryResult<bool> {
        let store = self.users.read().await;
        Ok(store.values().any(|u| u.email().eq_ignore_ascii_case(email)))
    }

    async fn exists_by_id(&self, id: Uuid) -> RepositoryResult<bool> {
        Ok(self.users.read().await.contains_key(&id))
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> RepositoryResult<()> {
        let mut store = self.users.write().await;
        let user = store.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.update_last_login_at(at);
        Ok(())
    }

    async fn get_inactive_users(&self, since: DateTime<Utc>) -> RepositoryResult<Vec<User>> {
        let store = self.users.read().await;
        let mut inactive: Vec<User> = store
            .values()
            .filter(|u| u.last_login().map_or(true, |at| at < since))
            .cloned()
            .collect();
        inactive.sort_by(|a, b| UserSort::default().compare(a, b));
        Ok(inactive)
    }

    async fn create_many(&self, users: &[User]) -> RepositoryResult<()> {
        let mut store = self.users.write().await;
        let mut next = store.clone();
        for user in users {
            if next.contains_key(&user.id()) {
                return Err(RepositoryError::Duplicate { field: "id" });
            }
            check_unique(&next, user)?;
            next.insert(user.id(), user.clone());
        }
        *store = next;
        Ok(())
    }
}
