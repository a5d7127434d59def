use common::auth::{AccessGuard, Decision, Grant, Operation, Principal, ResourceRef};
use common::domain::DomainResult;
use tracing::warn;

/// Turn a guard decision into a result, logging denials
pub(crate) fn authorize(
    guard: &AccessGuard,
    principal: Option<&Principal>,
    operation: Operation,
    resource: ResourceRef<'_>,
) -> DomainResult<Grant> {
    let decision = guard.decide(principal, operation, resource);
    log_denial(&decision, principal, operation, resource);
    decision.into_result()
}

pub(crate) fn log_denial(
    decision: &Decision,
    principal: Option<&Principal>,
    operation: Operation,
    resource: ResourceRef<'_>,
) {
    if let Some(reason) = decision.deny_reason() {
        warn!(
            kind = %resource.kind,
            operation = %operation,
            mutation = operation.is_mutation(),
            username = principal.map(|p| p.username.as_str()),
            reason = %reason,
            "access denied"
        );
    }
}
