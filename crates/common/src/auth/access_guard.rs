//! Role and ownership based access decisions.
//!
//! [`AccessGuard::decide`] is a pure function of the principal, the operation
//! and a snapshot of the target record. It never touches storage; callers
//! fetch the record first (a missing record is their `NotFound`, not ours) and
//! hand list queries the returned [`ScopeFilter`].
//!
//! Rules, first match wins:
//!
//! 1. listing a public kind: allow, unrestricted, with or without a principal
//! 2. no principal: deny `unauthenticated`
//! 3. super or semi: allow everything, unrestricted
//! 4. basic, user accounts, create or delete: deny `insufficient_role`
//! 5. basic, list: allow, scoped to records owned by the caller
//! 6. basic, create: allow, owner forced to the caller
//! 7. basic, read/update/delete: allow only on records the caller owns,
//!    otherwise deny `not_owner` (tours included)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::{Operation, Principal, ResourceKind, Role};
use crate::domain::{DomainError, DomainResult};

/// Machine-readable reason attached to a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    NotOwner,
    InsufficientRole,
    NotFound,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::NotOwner => "not_owner",
            DenyReason::InsufficientRole => "insufficient_role",
            DenyReason::NotFound => "not_found",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate a store applies to narrow a list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    Unrestricted,
    OwnedBy(String),
}

impl ScopeFilter {
    pub fn permits(&self, owner: Option<&str>) -> bool {
        match self {
            ScopeFilter::Unrestricted => true,
            ScopeFilter::OwnedBy(username) => owner == Some(username.as_str()),
        }
    }
}

/// What an allow decision lets the caller do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub scope: ScopeFilter,
    /// Owner a created record must carry, ignoring any client-supplied value.
    pub owner_override: Option<String>,
}

impl Grant {
    pub fn unrestricted() -> Self {
        Self {
            scope: ScopeFilter::Unrestricted,
            owner_override: None,
        }
    }

    fn owned_by(username: &str) -> Self {
        Self {
            scope: ScopeFilter::OwnedBy(username.to_string()),
            owner_override: None,
        }
    }

    fn forced_owner(username: &str) -> Self {
        Self {
            scope: ScopeFilter::OwnedBy(username.to_string()),
            owner_override: Some(username.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(Grant),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(reason) => Some(*reason),
        }
    }

    /// Turn a denial into [`DomainError::AccessDenied`]
    pub fn into_result(self) -> DomainResult<Grant> {
        match self {
            Decision::Allow(grant) => Ok(grant),
            Decision::Deny(reason) => Err(DomainError::AccessDenied(reason)),
        }
    }
}

/// Snapshot of the record a decision is about.
///
/// For `list` and `create` there is no record yet, only its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef<'a> {
    pub kind: ResourceKind,
    pub owner: Option<&'a str>,
}

impl<'a> ResourceRef<'a> {
    pub fn of_kind(kind: ResourceKind) -> Self {
        Self { kind, owner: None }
    }

    pub fn owned(kind: ResourceKind, owner: Option<&'a str>) -> Self {
        Self { kind, owner }
    }
}

/// Deployment switches for the guard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Let anonymous callers list regions (used by the public booking page).
    #[serde(default)]
    pub public_region_list: bool,
}

impl AccessPolicy {
    fn is_public_list(&self, kind: ResourceKind) -> bool {
        kind == ResourceKind::Region && self.public_region_list
    }
}

/// Central authorization decision function.
///
/// Holds only an immutable policy and is shared across request tasks as is.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    policy: AccessPolicy,
}

impl AccessGuard {
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn decide(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        resource: ResourceRef<'_>,
    ) -> Decision {
        if operation == Operation::List && self.policy.is_public_list(resource.kind) {
            return Decision::Allow(Grant::unrestricted());
        }

        let Some(principal) = principal else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };

        if principal.role.is_elevated() {
            return Decision::Allow(Grant::unrestricted());
        }

        match (resource.kind, operation) {
            (ResourceKind::User, Operation::Create | Operation::Delete) => {
                Decision::Deny(DenyReason::InsufficientRole)
            }
            (_, Operation::List) => Decision::Allow(Grant::owned_by(&principal.username)),
            (_, Operation::Create) => Decision::Allow(Grant::forced_owner(&principal.username)),
            (_, Operation::Read | Operation::Update | Operation::Delete) => {
                if principal.owns(resource.owner) {
                    Decision::Allow(Grant::owned_by(&principal.username))
                } else {
                    Decision::Deny(DenyReason::NotOwner)
                }
            }
        }
    }

    /// Whether `principal` may give an account the role `role`.
    ///
    /// Nobody hands out more privilege than they hold.
    pub fn may_assign_role(&self, principal: Option<&Principal>, role: Role) -> Decision {
        match principal {
            None => Decision::Deny(DenyReason::Unauthenticated),
            Some(p) if role <= p.role => Decision::Allow(Grant::unrestricted()),
            Some(_) => Decision::Deny(DenyReason::InsufficientRole),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(username: &str, role: Role) -> Principal {
        Principal::new(format!("id-{}", username), username, role)
    }

    fn guard() -> AccessGuard {
        AccessGuard::default()
    }

    #[test]
    fn test_elevated_roles_allowed_everything() {
        let guard = guard();
        for role in [Role::Super, Role::Semi] {
            let p = principal("boss", role);
            for kind in ResourceKind::ALL {
                for op in Operation::ALL {
                    for owner in [None, Some("boss"), Some("staff2")] {
                        let decision = guard.decide(Some(&p), op, ResourceRef::owned(kind, owner));
                        assert_eq!(
                            decision,
                            Decision::Allow(Grant::unrestricted()),
                            "{:?} {} {} owner={:?}",
                            role,
                            op,
                            kind,
                            owner
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_basic_owner_may_update_and_delete() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        for kind in [
            ResourceKind::Tour,
            ResourceKind::Sale,
            ResourceKind::Document,
            ResourceKind::Region,
            ResourceKind::Target,
        ] {
            for op in [Operation::Update, Operation::Delete] {
                let decision = guard.decide(Some(&p), op, ResourceRef::owned(kind, Some("staff1")));
                assert!(decision.is_allowed(), "{} {}", op, kind);
            }
        }
    }

    #[test]
    fn test_basic_non_owner_denied_update_and_delete() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        for kind in ResourceKind::ALL {
            for owner in [None, Some("staff2"), Some("STAFF1")] {
                let decision = guard.decide(
                    Some(&p),
                    Operation::Update,
                    ResourceRef::owned(kind, owner),
                );
                assert_eq!(decision, Decision::Deny(DenyReason::NotOwner));
            }
        }

        let decision = guard.decide(
            Some(&p),
            Operation::Delete,
            ResourceRef::owned(ResourceKind::Sale, Some("staff2")),
        );
        assert_eq!(decision, Decision::Deny(DenyReason::NotOwner));
    }

    #[test]
    fn test_basic_list_is_scoped_to_own_records() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        let decision = guard.decide(
            Some(&p),
            Operation::List,
            ResourceRef::of_kind(ResourceKind::Sale),
        );
        let grant = decision.into_result().unwrap();
        assert_eq!(grant.scope, ScopeFilter::OwnedBy("staff1".to_string()));
        assert!(grant.scope.permits(Some("staff1")));
        assert!(!grant.scope.permits(Some("staff2")));
        assert!(!grant.scope.permits(None));
    }

    #[test]
    fn test_basic_create_forces_owner() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        for kind in [ResourceKind::Tour, ResourceKind::Sale, ResourceKind::Target] {
            let grant = guard
                .decide(Some(&p), Operation::Create, ResourceRef::of_kind(kind))
                .into_result()
                .unwrap();
            assert_eq!(grant.owner_override, Some("staff1".to_string()));
        }
    }

    #[test]
    fn test_basic_read_follows_ownership() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        assert!(guard
            .decide(
                Some(&p),
                Operation::Read,
                ResourceRef::owned(ResourceKind::Document, Some("staff1"))
            )
            .is_allowed());
        assert_eq!(
            guard.decide(
                Some(&p),
                Operation::Read,
                ResourceRef::owned(ResourceKind::Document, Some("staff2"))
            ),
            Decision::Deny(DenyReason::NotOwner)
        );
    }

    #[test]
    fn test_basic_cannot_create_or_delete_accounts() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        assert_eq!(
            guard.decide(
                Some(&p),
                Operation::Create,
                ResourceRef::of_kind(ResourceKind::User)
            ),
            Decision::Deny(DenyReason::InsufficientRole)
        );
        assert_eq!(
            guard.decide(
                Some(&p),
                Operation::Delete,
                ResourceRef::owned(ResourceKind::User, Some("staff1"))
            ),
            Decision::Deny(DenyReason::InsufficientRole)
        );
        assert!(guard
            .decide(
                Some(&p),
                Operation::Update,
                ResourceRef::owned(ResourceKind::User, Some("staff1"))
            )
            .is_allowed());
    }

    #[test]
    fn test_unauthenticated_denied() {
        let guard = guard();
        for kind in ResourceKind::ALL {
            for op in Operation::ALL {
                assert_eq!(
                    guard.decide(None, op, ResourceRef::owned(kind, Some("staff1"))),
                    Decision::Deny(DenyReason::Unauthenticated)
                );
            }
        }
    }

    #[test]
    fn test_public_region_list() {
        let guard = AccessGuard::new(AccessPolicy {
            public_region_list: true,
        });
        assert_eq!(
            guard.decide(None, Operation::List, ResourceRef::of_kind(ResourceKind::Region)),
            Decision::Allow(Grant::unrestricted())
        );
        assert_eq!(
            guard.decide(None, Operation::Read, ResourceRef::of_kind(ResourceKind::Region)),
            Decision::Deny(DenyReason::Unauthenticated)
        );
        assert_eq!(
            guard.decide(None, Operation::List, ResourceRef::of_kind(ResourceKind::Tour)),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_public_list_is_never_narrowed_by_a_token() {
        let guard = AccessGuard::new(AccessPolicy {
            public_region_list: true,
        });
        let anonymous = guard.decide(None, Operation::List, ResourceRef::of_kind(ResourceKind::Region));
        for role in [Role::Basic, Role::Semi, Role::Super] {
            let p = principal("staff1", role);
            assert_eq!(
                guard.decide(Some(&p), Operation::List, ResourceRef::of_kind(ResourceKind::Region)),
                anonymous,
                "{:?}",
                role
            );
        }

        // Only listing is public; everything else keeps the ownership rule
        let p = principal("staff1", Role::Basic);
        assert_eq!(
            guard.decide(
                Some(&p),
                Operation::Update,
                ResourceRef::owned(ResourceKind::Region, Some("staff2"))
            ),
            Decision::Deny(DenyReason::NotOwner)
        );
        let grant = guard
            .decide(Some(&p), Operation::List, ResourceRef::of_kind(ResourceKind::Tour))
            .into_result()
            .unwrap();
        assert_eq!(grant.scope, ScopeFilter::OwnedBy("staff1".to_string()));
    }

    #[test]
    fn test_decide_is_deterministic() {
        let guard = guard();
        let p = principal("staff1", Role::Basic);
        let resource = ResourceRef::owned(ResourceKind::Tour, Some("staff2"));
        let first = guard.decide(Some(&p), Operation::Delete, resource);
        let second = guard.decide(Some(&p), Operation::Delete, resource);
        assert_eq!(first, second);
    }

    #[test]
    fn test_role_assignment_ceiling() {
        let guard = guard();
        let semi = principal("lead", Role::Semi);
        assert!(guard.may_assign_role(Some(&semi), Role::Basic).is_allowed());
        assert!(guard.may_assign_role(Some(&semi), Role::Semi).is_allowed());
        assert_eq!(
            guard.may_assign_role(Some(&semi), Role::Super),
            Decision::Deny(DenyReason::InsufficientRole)
        );
        let root = principal("root", Role::Super);
        assert!(guard.may_assign_role(Some(&root), Role::Super).is_allowed());
        assert_eq!(
            guard.may_assign_role(None, Role::Basic),
            Decision::Deny(DenyReason::Unauthenticated)
        );
    }

    #[test]
    fn test_into_result_maps_denial() {
        let result = Decision::Deny(DenyReason::NotOwner).into_result();
        assert!(matches!(
            result,
            Err(DomainError::AccessDenied(DenyReason::NotOwner))
        ));
    }
}
