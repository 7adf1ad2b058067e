//! Permission model for the signed-in user.
//!
//! The capability table itself lives in [`salon_core::permission`]. This
//! module adds the caller's side: the role may still be loading, in which
//! case every check is denied so that gated content never appears before
//! authorization is confirmed. Consumers use [`Permissions::role_loading`] to
//! show a placeholder instead of a false "access denied".

use std::fmt::Display;
use std::future::Future;

use tokio::sync::watch;

use salon_core::{Action, PermissionArea, Role, UserId, accessible_areas, has_permission};

use crate::retry::{RetryPolicy, Retryable};

/// Where the caller's role currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// The role lookup has not completed yet.
    Loading,
    /// The user holds this role.
    Resolved(Role),
    /// The user has no role, or the lookup failed. Everything is denied.
    Unassigned,
}

impl RoleState {
    /// Whether the lookup is still pending.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// A snapshot of what the caller may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permissions {
    state: RoleState,
}

impl Permissions {
    /// Permissions while the role is still being fetched.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            state: RoleState::Loading,
        }
    }

    /// Permissions for a known role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        Self {
            state: RoleState::Resolved(role),
        }
    }

    /// Permissions for a user with no role.
    #[must_use]
    pub const fn unassigned() -> Self {
        Self {
            state: RoleState::Unassigned,
        }
    }

    /// Permissions for an arbitrary state.
    #[must_use]
    pub const fn from_state(state: RoleState) -> Self {
        Self { state }
    }

    #[must_use]
    pub const fn state(&self) -> RoleState {
        self.state
    }

    /// Whether the role lookup is still pending.
    #[must_use]
    pub const fn role_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// The resolved role, if any.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self.state {
            RoleState::Resolved(role) => Some(role),
            RoleState::Loading | RoleState::Unassigned => None,
        }
    }

    /// Whether the caller may perform `action` on `area`.
    ///
    /// Always `false` while loading or unassigned.
    #[must_use]
    pub const fn has_permission(&self, area: PermissionArea, action: Action) -> bool {
        match self.state {
            RoleState::Resolved(role) => has_permission(role, area, action),
            RoleState::Loading | RoleState::Unassigned => false,
        }
    }

    #[must_use]
    pub const fn can_view(&self, area: PermissionArea) -> bool {
        self.has_permission(area, Action::View)
    }

    #[must_use]
    pub const fn can_create(&self, area: PermissionArea) -> bool {
        self.has_permission(area, Action::Create)
    }

    #[must_use]
    pub const fn can_edit(&self, area: PermissionArea) -> bool {
        self.has_permission(area, Action::Edit)
    }

    #[must_use]
    pub const fn can_delete(&self, area: PermissionArea) -> bool {
        self.has_permission(area, Action::Delete)
    }

    /// Areas the caller can see at all. Empty until the role resolves.
    #[must_use]
    pub fn accessible_areas(&self) -> Vec<PermissionArea> {
        self.role().map(accessible_areas).unwrap_or_default()
    }

    #[must_use]
    pub const fn is_owner(&self) -> bool {
        matches!(self.state, RoleState::Resolved(Role::Owner))
    }

    #[must_use]
    pub const fn is_manager_or_above(&self) -> bool {
        match self.state {
            RoleState::Resolved(role) => role.is_manager_or_above(),
            RoleState::Loading | RoleState::Unassigned => false,
        }
    }
}

/// Looks up the role assigned to a user.
pub trait RoleSource: Send + Sync {
    type Error: Retryable + Display + Send;

    /// The user's role, or `None` if none is assigned.
    fn role_for(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send;
}

/// Resolves and publishes the signed-in user's role.
///
/// Observers subscribe to a `watch` channel and see `Loading` until the
/// lookup finishes.
#[derive(Debug)]
pub struct RoleResolver {
    state: watch::Sender<RoleState>,
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleResolver {
    /// Create a resolver in the `Loading` state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(RoleState::Loading);
        Self { state }
    }

    /// Watch role state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RoleState> {
        self.state.subscribe()
    }

    /// Current permissions snapshot.
    #[must_use]
    pub fn permissions(&self) -> Permissions {
        Permissions::from_state(*self.state.borrow())
    }

    /// Wait until the role is no longer loading.
    pub async fn settled(&self) -> Permissions {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let state = rx
            .wait_for(|state| !state.is_loading())
            .await
            .map_or(RoleState::Unassigned, |state| *state);
        Permissions::from_state(state)
    }

    /// Go back to `Loading`, e.g. after sign-out.
    pub fn reset(&self) {
        self.state.send_replace(RoleState::Loading);
    }

    /// Fetch `user`'s role from `source` and publish it.
    ///
    /// A failed lookup publishes `Unassigned` so that nothing stays gated
    /// behind a spinner forever.
    ///
    /// # Errors
    ///
    /// Returns the source's error after retries are exhausted.
    #[tracing::instrument(skip(self, source, retry))]
    pub async fn resolve<S: RoleSource>(
        &self,
        source: &S,
        user: UserId,
        retry: &RetryPolicy,
    ) -> Result<Permissions, S::Error> {
        self.state.send_replace(RoleState::Loading);

        match retry.run(|| source.role_for(user)).await {
            Ok(Some(role)) => {
                self.state.send_replace(RoleState::Resolved(role));
                tracing::debug!(%role, "Role resolved");
                Ok(Permissions::for_role(role))
            }
            Ok(None) => {
                self.state.send_replace(RoleState::Unassigned);
                tracing::info!("User has no role assigned");
                Ok(Permissions::unassigned())
            }
            Err(e) => {
                self.state.send_replace(RoleState::Unassigned);
                tracing::error!(error = %e, "Failed to resolve user role");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::Notify;

    use super::*;

    #[derive(Debug)]
    struct LookupFailed;

    impl Display for LookupFailed {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("lookup failed")
        }
    }

    impl Retryable for LookupFailed {
        fn is_retryable(&self) -> bool {
            false
        }
    }

    struct FixedSource {
        role: Option<Role>,
        gate: Option<Arc<Notify>>,
        calls: AtomicU32,
    }

    impl FixedSource {
        fn new(role: Option<Role>) -> Self {
            Self {
                role,
                gate: None,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl RoleSource for FixedSource {
        type Error = LookupFailed;

        async fn role_for(&self, _user: UserId) -> Result<Option<Role>, LookupFailed> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(self.role)
        }
    }

    struct FailingSource;

    impl RoleSource for FailingSource {
        type Error = LookupFailed;

        async fn role_for(&self, _user: UserId) -> Result<Option<Role>, LookupFailed> {
            Err(LookupFailed)
        }
    }

    #[test]
    fn test_loading_denies_everything() {
        let perms = Permissions::loading();
        assert!(perms.role_loading());
        for area in PermissionArea::ALL {
            for action in Action::ALL {
                assert!(!perms.has_permission(area, action));
            }
        }
        assert!(perms.accessible_areas().is_empty());
        assert!(!perms.is_manager_or_above());
    }

    #[test]
    fn test_unassigned_denies_everything() {
        let perms = Permissions::unassigned();
        assert!(!perms.role_loading());
        assert!(!perms.can_view(PermissionArea::Dashboard));
    }

    #[test]
    fn test_resolved_role_follows_table() {
        let staff = Permissions::for_role(Role::Staff);
        assert!(staff.can_view(PermissionArea::Appointments));
        assert!(!staff.can_view(PermissionArea::Inventory));
        assert!(!staff.can_delete(PermissionArea::Appointments));

        let owner = Permissions::for_role(Role::Owner);
        assert!(owner.is_owner());
        assert!(owner.can_delete(PermissionArea::Settings));
    }

    #[tokio::test]
    async fn test_resolver_reports_loading_until_lookup_finishes() {
        let gate = Arc::new(Notify::new());
        let source = Arc::new(FixedSource {
            gate: Some(gate.clone()),
            ..FixedSource::new(Some(Role::Receptionist))
        });
        let resolver = Arc::new(RoleResolver::new());
        let user = UserId::random();

        let task = {
            let resolver = resolver.clone();
            let source = source.clone();
            tokio::spawn(async move {
                resolver
                    .resolve(source.as_ref(), user, &RetryPolicy::no_retry())
                    .await
            })
        };

        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let pending = resolver.permissions();
        assert!(pending.role_loading());
        assert!(!pending.can_view(PermissionArea::Appointments));

        gate.notify_one();
        let resolved = task.await.unwrap().unwrap();
        assert_eq!(resolved.role(), Some(Role::Receptionist));
        assert_eq!(resolver.settled().await, resolved);
        assert!(
            resolver
                .permissions()
                .can_create(PermissionArea::Appointments)
        );
    }

    #[tokio::test]
    async fn test_resolver_without_role_is_unassigned() {
        let resolver = RoleResolver::new();
        let perms = resolver
            .resolve(&FixedSource::new(None), UserId::random(), &RetryPolicy::no_retry())
            .await
            .unwrap();
        assert_eq!(perms.state(), RoleState::Unassigned);
    }

    #[tokio::test]
    async fn test_resolver_failure_denies() {
        let resolver = RoleResolver::new();
        let result = resolver
            .resolve(&FailingSource, UserId::random(), &RetryPolicy::no_retry())
            .await;
        assert!(result.is_err());
        assert_eq!(resolver.permissions().state(), RoleState::Unassigned);
    }

    #[tokio::test]
    async fn test_reset_returns_to_loading() {
        let resolver = RoleResolver::new();
        resolver
            .resolve(
                &FixedSource::new(Some(Role::Owner)),
                UserId::random(),
                &RetryPolicy::no_retry(),
            )
            .await
            .unwrap();
        resolver.reset();
        assert!(resolver.permissions().role_loading());
    }
}
