use common::auth::{
    AccessGuard, AuthTokenProvider, DenyReason, LoginUserInput, LoginUserOutput, Operation,
    PasswordService, Principal, ResourceKind, ResourceRef, Role,
};
use common::domain::{
    CreateUserInput, CreateUserInputWithId, DomainError, DomainResult, UpdateUserInput,
    UpdateUserInputWithHash, User, UserRepository, UserView,
};
use common::validation::validate_struct;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::access::{authorize, log_denial};

/// Well-formed Argon2 hash checked when the username is unknown, so a
/// missing account costs the same hash computation as a wrong password
const UNKNOWN_USER_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Login and staff account management
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    guard: Arc<AccessGuard>,
    auth_token_provider: Arc<dyn AuthTokenProvider>,
    password_service: Arc<dyn PasswordService>,
}

impl UserService {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        guard: Arc<AccessGuard>,
        auth_token_provider: Arc<dyn AuthTokenProvider>,
        password_service: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            user_repository,
            guard,
            auth_token_provider,
            password_service,
        }
    }

    /// Role ceiling: `principal` may only hand out, or act on accounts
    /// holding, a role no higher than its own
    fn check_role_ceiling(&self, principal: Option<&Principal>, role: Role) -> DomainResult<()> {
        let decision = self.guard.may_assign_role(principal, role);
        log_denial(
            &decision,
            principal,
            Operation::Update,
            ResourceRef::of_kind(ResourceKind::User),
        );
        decision.into_result().map(|_| ())
    }

    /// Load `user_id` and decide `operation` against the account itself
    async fn authorize_existing(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        user_id: &str,
    ) -> DomainResult<User> {
        if principal.is_none() {
            authorize(
                &self.guard,
                None,
                operation,
                ResourceRef::of_kind(ResourceKind::User),
            )?;
        }

        let user = self
            .user_repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, user_id))?;

        authorize(
            &self.guard,
            principal,
            operation,
            ResourceRef::owned(ResourceKind::User, Some(user.username.as_str())),
        )?;
        Ok(user)
    }

    /// Verify a username/password pair and issue an access token.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginUserInput) -> DomainResult<LoginUserOutput> {
        debug!("attempting login");

        let user = self
            .user_repository
            .get_user_by_username(&input.username)
            .await?;
        let hash = user
            .as_ref()
            .map_or(UNKNOWN_USER_HASH, |u| u.password_hash.as_str());

        let verified = match self.password_service.verify_password(&input.password, hash) {
            Ok(verified) => verified,
            // A stored value that is not an Argon2 hash never matches
            Err(DomainError::PasswordHashingError(e)) => {
                warn!(error = %e, "stored password hash is unreadable");
                false
            }
            Err(e) => return Err(e),
        };

        let user = match user {
            Some(user) if verified => user,
            _ => return Err(DomainError::InvalidCredentials),
        };

        let access_token = self.auth_token_provider.generate_token(&user.principal())?;

        debug!(user_id = %user.id, role = %user.role, "login successful");
        Ok(LoginUserOutput {
            access_token,
            token_type: "Bearer",
            user: user.into(),
        })
    }

    /// The account behind the current credential
    #[instrument(skip(self, principal))]
    pub async fn me(&self, principal: Option<&Principal>) -> DomainResult<UserView> {
        let principal = principal.ok_or(DomainError::AccessDenied(DenyReason::Unauthenticated))?;

        let user = self
            .user_repository
            .get_user(&principal.id)
            .await?
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, principal.id.as_str()))?;
        Ok(user.into())
    }

    #[instrument(skip(self, principal))]
    pub async fn list_users(&self, principal: Option<&Principal>) -> DomainResult<Vec<UserView>> {
        let grant = authorize(
            &self.guard,
            principal,
            Operation::List,
            ResourceRef::of_kind(ResourceKind::User),
        )?;

        let users = self.user_repository.list_users(&grant.scope).await?;
        debug!(count = users.len(), "listed users");
        Ok(users.into_iter().map(UserView::from).collect())
    }

    #[instrument(skip(self, principal))]
    pub async fn get_user(
        &self,
        principal: Option<&Principal>,
        user_id: &str,
    ) -> DomainResult<UserView> {
        let user = self
            .authorize_existing(principal, Operation::Read, user_id)
            .await?;
        Ok(user.into())
    }

    #[instrument(skip(self, principal, input), fields(username = %input.username, role = %input.role))]
    pub async fn create_user(
        &self,
        principal: Option<&Principal>,
        input: CreateUserInput,
    ) -> DomainResult<UserView> {
        authorize(
            &self.guard,
            principal,
            Operation::Create,
            ResourceRef::of_kind(ResourceKind::User),
        )?;
        self.check_role_ceiling(principal, input.role)?;
        validate_struct(&input)?;

        let password_hash = self.password_service.hash_password(&input.password)?;
        let user_id = xid::new().to_string();

        debug!(user_id = %user_id, "creating user with hashed password");

        let user = self
            .user_repository
            .create_user(CreateUserInputWithId {
                id: user_id,
                username: input.username,
                password_hash,
                role: input.role,
            })
            .await?;

        debug!(user_id = %user.id, "user created");
        Ok(user.into())
    }

    /// Change password and/or role. Basic staff may only update themselves,
    /// and nobody can raise a role above their own.
    #[instrument(skip(self, principal, input))]
    pub async fn update_user(
        &self,
        principal: Option<&Principal>,
        user_id: &str,
        input: UpdateUserInput,
    ) -> DomainResult<UserView> {
        let user = self
            .authorize_existing(principal, Operation::Update, user_id)
            .await?;
        self.check_role_ceiling(principal, user.role)?;

        let role = input.role.filter(|role| *role != user.role);
        if let Some(role) = role {
            self.check_role_ceiling(principal, role)?;
        }
        validate_struct(&input)?;

        let password_hash = input
            .password
            .as_deref()
            .map(|password| self.password_service.hash_password(password))
            .transpose()?;

        let updated = self
            .user_repository
            .update_user(UpdateUserInputWithHash {
                id: user.id,
                password_hash,
                role,
            })
            .await?;

        debug!(user_id = %updated.id, "user updated");
        Ok(updated.into())
    }

    #[instrument(skip(self, principal))]
    pub async fn delete_user(
        &self,
        principal: Option<&Principal>,
        user_id: &str,
    ) -> DomainResult<()> {
        let user = self
            .authorize_existing(principal, Operation::Delete, user_id)
            .await?;
        self.check_role_ceiling(principal, user.role)?;

        self.user_repository.delete_user(&user.id).await?;
        debug!(user_id = %user.id, "user deleted");
        Ok(())
    }

    /// Create the first super account when none exists yet
    #[instrument(skip(self, password))]
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> DomainResult<Option<UserView>> {
        if self.user_repository.has_role(Role::Super).await? {
            debug!("super account already present, skipping bootstrap");
            return Ok(None);
        }

        let input = CreateUserInput {
            username: username.to_string(),
            password: password.to_string(),
            role: Role::Super,
        };
        validate_struct(&input)?;

        let user = self
            .user_repository
            .create_user(CreateUserInputWithId {
                id: xid::new().to_string(),
                username: input.username,
                password_hash: self.password_service.hash_password(&input.password)?,
                role: Role::Super,
            })
            .await?;

        info!(username = %user.username, "bootstrapped super account");
        Ok(Some(user.into()))
    }
}
