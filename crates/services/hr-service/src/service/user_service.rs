//! User service - accounts, credentials and activation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use uuid::Uuid;

use domain::{
    AuditLog, DomainEvent, Page, Pagination, Password, PasswordChangeMethod, RepositoryError,
    Snapshot, SortDirection, User, UserFilter, UserRepository, UserRole, UserSort, UserSortField,
    UserUpdate, OP_USER_ACTIVATE, OP_USER_CREATE, OP_USER_DEACTIVATE, OP_USER_LOGIN,
    OP_USER_PASSWORD_CHANGE, OP_USER_PASSWORD_RESET, OP_USER_UPDATE,
};

use crate::context::RequestContext;
use crate::error::{ServiceError, ServiceResult};
use crate::outcome::{Advisory, AdvisoryKind, Outcome};
use crate::service::SideEffects;

/// Recorded as `changedBy` when users change their own password.
pub const CHANGED_BY_SELF: &str = "self";

// Verified against when the username is unknown so both paths cost one hash.
static DUMMY_PASSWORD: Lazy<Option<Password>> =
    Lazy::new(|| Password::new("Unmatchable#Passw0rd").ok());

/// Input for account creation.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create an account; username and email must both be free
    async fn create_user(&self, ctx: &RequestContext, input: NewUser)
        -> ServiceResult<Outcome<User>>;

    /// Check credentials and record the login
    async fn authenticate_user(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> ServiceResult<Outcome<User>>;

    /// Self-service change; the current password must match
    async fn change_password(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<Outcome<()>>;

    /// Administrative reset attributed to the context's actor
    async fn reset_password(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_password: &str,
    ) -> ServiceResult<Outcome<()>>;

    async fn update_user_profile(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: UserUpdate,
    ) -> ServiceResult<Outcome<User>>;

    async fn activate_user(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Outcome<User>>;

    async fn deactivate_user(&self, ctx: &RequestContext, id: Uuid)
        -> ServiceResult<Outcome<User>>;

    async fn get_user_by_id(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<User>;

    async fn get_user_by_username(&self, ctx: &RequestContext, username: &str)
        -> ServiceResult<User>;

    async fn list_users(
        &self,
        ctx: &RequestContext,
        filter: UserFilter,
        sort: UserSort,
        pagination: Pagination,
    ) -> ServiceResult<Page<User>>;

    /// Free-text search, always ordered by username ascending
    async fn search_users(
        &self,
        ctx: &RequestContext,
        term: &str,
        role: Option<UserRole>,
        is_active: Option<bool>,
        pagination: Pagination,
    ) -> ServiceResult<Page<User>>;

    /// Users who have not logged in since `since`, never-logged-in included
    async fn get_inactive_users(
        &self,
        ctx: &RequestContext,
        since: DateTime<Utc>,
    ) -> ServiceResult<Vec<User>>;

    /// Audit entries the given actor produced within the range
    async fn get_user_activity(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<AuditLog>>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    effects: SideEffects,
}

impl UserManager {
    pub fn new(repo: Arc<dyn UserRepository>, effects: SideEffects) -> Self {
        // Hash now so the first unknown-user login costs the same as the rest.
        Lazy::force(&DUMMY_PASSWORD);
        Self { repo, effects }
    }

    async fn load(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<User> {
        ctx.ensure_active()?;
        self.repo
            .get_by_id(id)
            .await
            .map_err(ServiceError::repository("failed to get user"))?
            .ok_or(ServiceError::UserNotFound)
    }

    async fn save(&self, ctx: &RequestContext, user: &User) -> ServiceResult<()> {
        ctx.ensure_active()?;
        self.repo.update(user).await.map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::UserNotFound,
            e => ServiceError::write("failed to update user")(e),
        })
    }

    async fn password_changed(
        &self,
        ctx: &RequestContext,
        user: &User,
        changed_by: &str,
        method: PasswordChangeMethod,
    ) -> Vec<Advisory> {
        let (operation, method_name) = match method {
            PasswordChangeMethod::Change => (OP_USER_PASSWORD_CHANGE, "change"),
            PasswordChangeMethod::Reset => (OP_USER_PASSWORD_RESET, "reset"),
        };
        let new_values = Snapshot::from([
            ("passwordChanged".to_string(), true.into()),
            ("changedBy".to_string(), changed_by.into()),
            ("method".to_string(), method_name.into()),
        ]);

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                user.id(),
                operation,
                Snapshot::new(),
                new_values,
                &mut warnings,
            )
            .await;
        self.effects
            .publish(
                ctx,
                DomainEvent::user_password_changed(user, changed_by, method),
                &mut warnings,
            )
            .await;
        warnings
    }

    async fn activation_changed(&self, ctx: &RequestContext, user: &User) -> Vec<Advisory> {
        let (operation, event) = if user.is_active() {
            (OP_USER_ACTIVATE, DomainEvent::user_activated(user, &ctx.actor))
        } else {
            (OP_USER_DEACTIVATE, DomainEvent::user_deactivated(user, &ctx.actor))
        };

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                user.id(),
                operation,
                Snapshot::from([("isActive".to_string(), (!user.is_active()).into())]),
                Snapshot::from([("isActive".to_string(), user.is_active().into())]),
                &mut warnings,
            )
            .await;
        self.effects.publish(ctx, event, &mut warnings).await;
        warnings
    }
}

#[async_trait]
impl UserService for UserManager {
    #[tracing::instrument(
        skip(self, ctx, input),
        fields(actor = %ctx.actor, username = %input.username)
    )]
    async fn create_user(
        &self,
        ctx: &RequestContext,
        input: NewUser,
    ) -> ServiceResult<Outcome<User>> {
        ctx.ensure_active()?;
        let username_taken = self
            .repo
            .exists_by_username(&input.username)
            .await
            .map_err(ServiceError::repository("failed to check username existence"))?;
        if username_taken {
            return Err(ServiceError::UsernameAlreadyExists);
        }

        ctx.ensure_active()?;
        let email_taken = self
            .repo
            .exists_by_email(&input.email)
            .await
            .map_err(ServiceError::repository("failed to check email existence"))?;
        if email_taken {
            return Err(ServiceError::EmailAlreadyExists);
        }

        let user = User::new(&input.username, &input.email, &input.password, input.role)?;

        ctx.ensure_active()?;
        self.repo
            .create(&user)
            .await
            .map_err(ServiceError::write("failed to create user"))?;
        tracing::info!(user_id = %user.id(), role = %user.role(), "user created");

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                user.id(),
                OP_USER_CREATE,
                Snapshot::new(),
                user.snapshot(),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(ctx, DomainEvent::user_created(&user, &ctx.actor), &mut warnings)
            .await;

        Ok(Outcome::new(user, warnings))
    }

    #[tracing::instrument(skip(self, ctx, password), fields(ip = %ctx.ip_address))]
    async fn authenticate_user(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> ServiceResult<Outcome<User>> {
        ctx.ensure_active()?;
        let found = self
            .repo
            .find_by_username(username)
            .await
            .map_err(ServiceError::repository("failed to find user"))?;

        let verified = match &found {
            Some(user) => user.verify_password(password),
            None => {
                if let Some(dummy) = DUMMY_PASSWORD.as_ref() {
                    std::hint::black_box(dummy.verify(password));
                }
                false
            }
        };
        let Some(mut user) = found.filter(|_| verified) else {
            tracing::info!("authentication failed");
            return Err(ServiceError::InvalidCredentials);
        };
        if !user.is_active() {
            return Err(ServiceError::UserNotActive);
        }

        user.update_last_login();
        let logged_in_at = user.last_login().unwrap_or_else(Utc::now);
        let mut warnings = Vec::new();

        if ctx.is_cancelled() {
            warnings.push(Advisory::new(
                AdvisoryKind::LastLogin,
                "skipped: request cancelled",
            ));
        } else if let Err(e) = self.repo.update_last_login(user.id(), logged_in_at).await {
            tracing::warn!(
                operation = OP_USER_LOGIN,
                aggregate_id = %user.id(),
                error = %e,
                "failed to update last login"
            );
            warnings.push(Advisory::new(
                AdvisoryKind::LastLogin,
                format!("failed to update last login: {e}"),
            ));
        }

        self.effects
            .record_audit(
                ctx,
                user.id(),
                OP_USER_LOGIN,
                Snapshot::new(),
                Snapshot::from([("lastLogin".to_string(), logged_in_at.into())]),
                &mut warnings,
            )
            .await;
        self.effects
            .publish(
                ctx,
                DomainEvent::user_logged_in(&user, &ctx.ip_address, &ctx.user_agent),
                &mut warnings,
            )
            .await;

        tracing::info!(user_id = %user.id(), "user authenticated");
        Ok(Outcome::new(user, warnings))
    }

    #[tracing::instrument(skip(self, ctx, current_password, new_password), fields(user_id = %id))]
    async fn change_password(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<Outcome<()>> {
        let mut user = self.load(ctx, id).await?;
        user.change_password(current_password, new_password)?;
        self.save(ctx, &user).await?;

        let warnings = self
            .password_changed(ctx, &user, CHANGED_BY_SELF, PasswordChangeMethod::Change)
            .await;
        Ok(Outcome::new((), warnings))
    }

    #[tracing::instrument(skip(self, ctx, new_password), fields(actor = %ctx.actor, user_id = %id))]
    async fn reset_password(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        new_password: &str,
    ) -> ServiceResult<Outcome<()>> {
        let mut user = self.load(ctx, id).await?;
        user.reset_password(new_password)?;
        self.save(ctx, &user).await?;

        let warnings = self
            .password_changed(ctx, &user, &ctx.actor, PasswordChangeMethod::Reset)
            .await;
        Ok(Outcome::new((), warnings))
    }

    #[tracing::instrument(skip(self, ctx, update), fields(actor = %ctx.actor, user_id = %id))]
    async fn update_user_profile(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: UserUpdate,
    ) -> ServiceResult<Outcome<User>> {
        let mut user = self.load(ctx, id).await?;
        let old_values = user.snapshot();

        if let Some(username) = update.username.as_deref().filter(|u| *u != user.username()) {
            ctx.ensure_active()?;
            let holder = self
                .repo
                .find_by_username(username)
                .await
                .map_err(ServiceError::repository("failed to check username existence"))?;
            if holder.is_some_and(|other| other.id() != id) {
                return Err(ServiceError::UsernameAlreadyExists);
            }
        }
        if let Some(email) = update.email.as_deref().filter(|e| *e != user.email()) {
            ctx.ensure_active()?;
            let holder = self
                .repo
                .find_by_email(email)
                .await
                .map_err(ServiceError::repository("failed to check email existence"))?;
            if holder.is_some_and(|other| other.id() != id) {
                return Err(ServiceError::EmailAlreadyExists);
            }
        }

        let changed_fields = user.apply_update(update)?;
        self.save(ctx, &user).await?;
        tracing::info!(changed = ?changed_fields, "user profile updated");

        let mut warnings = Vec::new();
        self.effects
            .record_audit(
                ctx,
                id,
                OP_USER_UPDATE,
                old_values,
                user.snapshot(),
                &mut warnings,
            )
            .await;

        Ok(Outcome::new(user, warnings))
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.actor, user_id = %id))]
    async fn activate_user(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<Outcome<User>> {
        let mut user = self.load(ctx, id).await?;
        user.activate()?;
        self.save(ctx, &user).await?;

        let warnings = self.activation_changed(ctx, &user).await;
        Ok(Outcome::new(user, warnings))
    }

    #[tracing::instrument(skip(self, ctx), fields(actor = %ctx.actor, user_id = %id))]
    async fn deactivate_user(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> ServiceResult<Outcome<User>> {
        let mut user = self.load(ctx, id).await?;
        user.deactivate()?;
        self.save(ctx, &user).await?;

        let warnings = self.activation_changed(ctx, &user).await;
        Ok(Outcome::new(user, warnings))
    }

    async fn get_user_by_id(&self, ctx: &RequestContext, id: Uuid) -> ServiceResult<User> {
        self.load(ctx, id).await
    }

    async fn get_user_by_username(
        &self,
        ctx: &RequestContext,
        username: &str,
    ) -> ServiceResult<User> {
        ctx.ensure_active()?;
        self.repo
            .find_by_username(username)
            .await
            .map_err(ServiceError::repository("failed to find user"))?
            .ok_or(ServiceError::UserNotFound)
    }

    #[tracing::instrument(skip(self, ctx, filter))]
    async fn list_users(
        &self,
        ctx: &RequestContext,
        filter: UserFilter,
        sort: UserSort,
        pagination: Pagination,
    ) -> ServiceResult<Page<User>> {
        ctx.ensure_active()?;
        self.repo
            .list(&filter, sort, &pagination)
            .await
            .map_err(ServiceError::repository("failed to list users"))
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn search_users(
        &self,
        ctx: &RequestContext,
        term: &str,
        role: Option<UserRole>,
        is_active: Option<bool>,
        pagination: Pagination,
    ) -> ServiceResult<Page<User>> {
        let filter = UserFilter {
            search: Some(term.to_string()),
            role,
            is_active,
            ..UserFilter::default()
        };
        let sort = UserSort::by(UserSortField::Username, SortDirection::Asc);
        self.list_users(ctx, filter, sort, pagination).await
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn get_inactive_users(
        &self,
        ctx: &RequestContext,
        since: DateTime<Utc>,
    ) -> ServiceResult<Vec<User>> {
        ctx.ensure_active()?;
        self.repo
            .get_inactive_users(since)
            .await
            .map_err(ServiceError::repository("failed to get inactive users"))
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn get_user_activity(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<Vec<AuditLog>> {
        ctx.ensure_active()?;
        self.effects
            .audit_logs()
            .get_user_activity(user_id, start, end)
            .await
            .map_err(ServiceError::repository("failed to get user activity"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{
        EventDispatcher, MockAuditLogRepository, MockEventStoreRepository, MockUserRepository,
    };

    const PASSWORD: &str = "Str0ng!Pass";

    fn ctx() -> RequestContext {
        RequestContext::new("admin-1", "10.1.2.3", "unit-tests")
    }

    fn effects() -> SideEffects {
        let mut audit = MockAuditLogRepository::new();
        audit.expect_create().returning(|_| Ok(()));
        let mut store = MockEventStoreRepository::new();
        store.expect_save_event().returning(|_| Ok(()));
        SideEffects::new(
            Arc::new(audit),
            Arc::new(store),
            Arc::new(EventDispatcher::new()),
        )
    }

    fn user(active: bool) -> User {
        let mut user = User::new("jdoe", "jdoe@example.com", PASSWORD, UserRole::Viewer).unwrap();
        if !active {
            user.deactivate().unwrap();
        }
        user
    }

    fn repo_with(found: Option<User>) -> MockUserRepository {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(found.clone()));
        repo
    }

    #[test]
    fn test_dummy_hash_is_ready_before_first_login() {
        let _manager = UserManager::new(Arc::new(MockUserRepository::new()), effects());
        let dummy = Lazy::get(&DUMMY_PASSWORD).expect("dummy hash computed on construction");
        assert!(dummy.is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let service = UserManager::new(Arc::new(repo_with(None)), effects());
        let unknown = service
            .authenticate_user(&ctx(), "ghost", PASSWORD)
            .await
            .unwrap_err();

        let service = UserManager::new(Arc::new(repo_with(Some(user(true)))), effects());
        let wrong = service
            .authenticate_user(&ctx(), "jdoe", "Wr0ng!Pass")
            .await
            .unwrap_err();

        assert!(matches!(unknown, ServiceError::InvalidCredentials));
        assert!(matches!(wrong, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_inactive_account_needs_correct_password_to_be_revealed() {
        let service = UserManager::new(Arc::new(repo_with(Some(user(false)))), effects());
        let wrong = service
            .authenticate_user(&ctx(), "jdoe", "Wr0ng!Pass")
            .await
            .unwrap_err();
        assert!(matches!(wrong, ServiceError::InvalidCredentials));

        let right = service
            .authenticate_user(&ctx(), "jdoe", PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(right, ServiceError::UserNotActive));
    }

    #[tokio::test]
    async fn test_last_login_failure_is_advisory() {
        let mut repo = repo_with(Some(user(true)));
        repo.expect_update_last_login()
            .times(1)
            .returning(|_, _| Err(RepositoryError::backend("replica read-only")));

        let service = UserManager::new(Arc::new(repo), effects());
        let outcome = service
            .authenticate_user(&ctx(), "jdoe", PASSWORD)
            .await
            .unwrap();

        assert!(outcome.value.last_login().is_some());
        assert!(outcome.has_warning(AdvisoryKind::LastLogin));
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_create_checks_username_then_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_exists_by_email().returning(|_| Ok(true));
        repo.expect_create().never();

        let service = UserManager::new(Arc::new(repo), effects());
        let err = service
            .create_user(
                &ctx(),
                NewUser {
                    username: "jdoe".to_string(),
                    email: "jdoe@example.com".to_string(),
                    password: PASSWORD.to_string(),
                    role: UserRole::Viewer,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailAlreadyExists));
    }

    #[tokio::test]
    async fn test_deactivate_twice_is_rejected() {
        let inactive = user(false);
        let id = inactive.id();
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_id()
            .returning(move |_| Ok(Some(inactive.clone())));
        repo.expect_update().never();

        let service = UserManager::new(Arc::new(repo), effects());
        let err = service.deactivate_user(&ctx(), id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(domain::DomainError::UserAlreadyInactive)
        ));
    }
}
