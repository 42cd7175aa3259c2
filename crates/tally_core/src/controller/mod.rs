//! Application state controller.
//!
//! # Responsibility
//! - Hold the authoritative in-memory goal list for the active owner scope.
//! - Apply every mutation optimistically, then write through to the store.
//! - Drive session transitions and re-scope the store subscription.
//!
//! # Invariants
//! - At most one store subscription is active; switching owners cancels the
//!   prior one before the new one starts.
//! - Optimistic state changes are applied strictly before the persistence
//!   call is issued.
//! - Only `create_goal` rolls back on persistence failure. Every other
//!   mutation keeps its optimistic result and logs the failure; the
//!   divergence heals on the next subscription refresh.

use crate::gesture::{reorder_goals, ReorderRequest};
use crate::model::goal::{Goal, GoalDraft, GoalValidationError};
use crate::model::profile::{OwnerScope, UserProfile};
use crate::session::{
    validate_password, validate_registration, AuthError, IdentityProvider, ProviderKind,
};
use crate::store::{GoalListCallback, GoalStore, StoreError, StoreResult, Subscription};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Maximum number of non-archived goals for a non-premium owner.
pub const FREE_TIER_GOAL_LIMIT: usize = 3;

/// Failure surface of `AppController::create_goal`.
#[derive(Debug)]
pub enum CreateGoalError {
    Validation(GoalValidationError),
    /// The owner is on the free tier and already at the active-goal cap.
    /// Signalled instead of writing; the UI routes this to the upgrade
    /// screen.
    LimitReached { active: usize },
    Persistence(StoreError),
}

impl Display for CreateGoalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::LimitReached { active } => {
                write!(f, "free plan limit reached with {active} active goals")
            }
            Self::Persistence(err) => write!(f, "failed to save goal: {err}"),
        }
    }
}

impl Error for CreateGoalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::LimitReached { .. } => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<GoalValidationError> for CreateGoalError {
    fn from(value: GoalValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Failure surface of the session flows, which touch both collaborators.
#[derive(Debug)]
pub enum SessionError {
    Auth(AuthError),
    Store(StoreError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<AuthError> for SessionError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Shared slot the subscription callback delivers into.
///
/// `generation` guards against deliveries from a cancelled scope: a callback
/// created for generation N is ignored once the controller has moved on.
#[derive(Debug, Default)]
struct ListState {
    generation: u64,
    goals: Vec<Goal>,
}

fn lock(state: &Mutex<ListState>) -> MutexGuard<'_, ListState> {
    // Recover rather than propagate: the execution model is a single
    // logical thread, so a poisoned lock only means a panicking callback.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Authoritative in-memory state for the active owner.
pub struct AppController {
    store: Arc<dyn GoalStore>,
    identity: Arc<dyn IdentityProvider>,
    state: Arc<Mutex<ListState>>,
    session: Option<UserProfile>,
    subscription: Option<Subscription>,
}

impl AppController {
    /// Creates an idle controller. Call `bootstrap` (or `initialize`) before
    /// reading goals.
    pub fn new(store: Arc<dyn GoalStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            store,
            identity,
            state: Arc::new(Mutex::new(ListState::default())),
            session: None,
            subscription: None,
        }
    }

    /// Restores the persisted session (or guest) and subscribes to its scope.
    pub fn bootstrap(&mut self) -> Result<(), SessionError> {
        let session = self.identity.load_session()?;
        self.switch_session(session)
    }

    /// Discards the in-memory list and re-subscribes to `scope`.
    ///
    /// The prior subscription is cancelled first; a delivery that raced the
    /// switch is dropped by the generation guard. A brief window with an
    /// empty list is acceptable by design.
    pub fn initialize(&mut self, scope: OwnerScope) -> StoreResult<()> {
        if let Some(prior) = self.subscription.take() {
            prior.unsubscribe();
        }

        let expected = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.goals.clear();
            state.generation
        };

        let slot = Arc::clone(&self.state);
        let callback: GoalListCallback = Box::new(move |goals| {
            let mut state = lock(&slot);
            if state.generation == expected {
                state.goals = goals;
            } else {
                debug!(
                    "event=goal_snapshot module=controller status=stale_drop generation={expected}"
                );
            }
        });

        info!("event=scope_init module=controller owner={scope}");
        self.subscription = Some(self.store.subscribe(&scope, callback)?);
        Ok(())
    }

    // --- read surface ---

    pub fn session(&self) -> Option<&UserProfile> {
        self.session.as_ref()
    }

    pub fn is_premium(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|profile| profile.is_premium)
    }

    /// Partition the active session reads and writes.
    pub fn owner_scope(&self) -> OwnerScope {
        match &self.session {
            Some(profile) => OwnerScope::for_profile(profile),
            None => OwnerScope::Guest,
        }
    }

    /// Snapshot of the full in-memory list, in display order.
    pub fn goals(&self) -> Vec<Goal> {
        lock(&self.state).goals.clone()
    }

    pub fn goal(&self, goal_id: &str) -> Option<Goal> {
        lock(&self.state)
            .goals
            .iter()
            .find(|goal| goal.id == goal_id)
            .cloned()
    }

    pub fn active_goals(&self) -> Vec<Goal> {
        lock(&self.state)
            .goals
            .iter()
            .filter(|goal| goal.is_active())
            .cloned()
            .collect()
    }

    pub fn archived_goals(&self) -> Vec<Goal> {
        lock(&self.state)
            .goals
            .iter()
            .filter(|goal| !goal.is_active())
            .cloned()
            .collect()
    }

    /// Whether creating one more goal would be rejected for this owner.
    pub fn is_limit_reached(&self) -> bool {
        !self.is_premium() && self.active_count() >= FREE_TIER_GOAL_LIMIT
    }

    fn active_count(&self) -> usize {
        lock(&self.state)
            .goals
            .iter()
            .filter(|goal| goal.is_active())
            .count()
    }

    // --- goal mutations ---

    /// Creates a goal from a draft: optimistic head insertion, then persist.
    ///
    /// Returns the stored record, which may carry a backend-assigned id
    /// while the in-memory list still holds the temporary one; the next
    /// subscription refresh reconciles them. On persistence failure the
    /// optimistic entry is removed again and the list is exactly its
    /// pre-call state.
    pub fn create_goal(&mut self, draft: GoalDraft) -> Result<Goal, CreateGoalError> {
        draft.validate()?;

        let active = self.active_count();
        if !self.is_premium() && active >= FREE_TIER_GOAL_LIMIT {
            return Err(CreateGoalError::LimitReached { active });
        }

        let goal = Goal::from_draft(draft)?;
        {
            let mut state = lock(&self.state);
            state.goals.insert(0, goal.clone());
        }

        let owner = self.owner_scope();
        match self.store.add(&owner, &goal) {
            Ok(stored) => {
                info!(
                    "event=goal_create module=controller status=ok owner={owner} id={}",
                    stored.id
                );
                Ok(stored)
            }
            Err(err) => {
                let mut state = lock(&self.state);
                state.goals.retain(|candidate| candidate.id != goal.id);
                error!(
                    "event=goal_create module=controller status=rollback owner={owner} id={} error={err}",
                    goal.id
                );
                Err(CreateGoalError::Persistence(err))
            }
        }
    }

    /// Applies a clamped counter delta. Unknown ids are a no-op.
    pub fn adjust_count(&mut self, goal_id: &str, delta: i32) {
        let updated = {
            let mut state = lock(&self.state);
            let Some(goal) = state.goals.iter_mut().find(|goal| goal.id == goal_id) else {
                return;
            };
            goal.apply_delta(delta);
            goal.clone()
        };
        self.write_through(&updated, "goal_adjust_count");
    }

    /// Full-record overwrite by id. Unknown ids are a no-op; the counter
    /// invariant is re-established before anything is stored.
    pub fn replace_goal(&mut self, mut updated: Goal) {
        updated.clamp_count();
        let replaced = {
            let mut state = lock(&self.state);
            match state
                .goals
                .iter_mut()
                .find(|candidate| candidate.id == updated.id)
            {
                Some(slot) => {
                    *slot = updated.clone();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.write_through(&updated, "goal_replace");
        }
    }

    /// Removes a goal immediately; no tombstone, no undo.
    pub fn delete_goal(&mut self, goal_id: &str) {
        {
            let mut state = lock(&self.state);
            state.goals.retain(|goal| goal.id != goal_id);
        }
        let owner = self.owner_scope();
        if let Err(err) = self.store.delete(&owner, goal_id) {
            error!(
                "event=goal_delete module=controller status=persist_error owner={owner} id={goal_id} error={err}"
            );
        }
    }

    /// Flips the archived flag and records the toggle time.
    pub fn toggle_archive(&mut self, goal_id: &str) {
        let updated = {
            let mut state = lock(&self.state);
            let Some(goal) = state.goals.iter_mut().find(|goal| goal.id == goal_id) else {
                return;
            };
            goal.toggle_archived();
            goal.clone()
        };
        self.write_through(&updated, "goal_toggle_archive");
    }

    /// Replaces the list with a caller-supplied permutation and persists it
    /// as a whole; array position is the display order.
    pub fn reorder(&mut self, new_order: Vec<Goal>) {
        {
            let mut state = lock(&self.state);
            state.goals = new_order.clone();
        }
        let owner = self.owner_scope();
        if let Err(err) = self.store.replace_all(&owner, &new_order) {
            error!(
                "event=goal_reorder module=controller status=persist_error owner={owner} error={err}"
            );
        }
    }

    /// Applies a completed drag gesture to the current list.
    pub fn apply_reorder(&mut self, request: &ReorderRequest) {
        let next = {
            let state = lock(&self.state);
            reorder_goals(&state.goals, &request.from_id, &request.to_id)
        };
        self.reorder(next);
    }

    /// Fire-and-forget write-through: the optimistic in-memory state stays
    /// even when the store write fails.
    fn write_through(&self, goal: &Goal, op: &'static str) {
        let owner = self.owner_scope();
        if let Err(err) = self.store.update(&owner, goal) {
            error!(
                "event={op} module=controller status=persist_error owner={owner} id={} error={err}",
                goal.id
            );
        }
    }

    // --- session flows ---

    /// Registers a new account. Credential validation runs before any
    /// collaborator I/O.
    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<UserProfile, SessionError> {
        validate_registration(name, password)?;
        let profile = self.identity.register_with_password(email, password, name)?;
        self.switch_session(Some(profile.clone()))?;
        Ok(profile)
    }

    /// Logs into an existing account.
    pub fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, SessionError> {
        validate_password(password)?;
        let profile = self.identity.login_with_password(email, password)?;
        self.switch_session(Some(profile.clone()))?;
        Ok(profile)
    }

    /// Signs in through a third-party provider.
    pub fn sign_in_with(&mut self, provider: ProviderKind) -> Result<UserProfile, SessionError> {
        let profile = self.identity.sign_in_with_provider(provider)?;
        self.switch_session(Some(profile.clone()))?;
        Ok(profile)
    }

    /// Ends the session and falls back to the guest scope.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.identity.logout()?;
        self.switch_session(None)
    }

    /// Deletes the authenticated account: goal partition first, then the
    /// identity record. On failure the session is kept so the user can
    /// retry; nothing here retries on its own.
    pub fn delete_account(&mut self) -> Result<(), SessionError> {
        let Some(profile) = self.session.clone() else {
            return Ok(());
        };
        let scope = OwnerScope::for_profile(&profile);
        self.store.clear(&scope)?;
        self.identity.delete_account(&profile.uid)?;
        self.switch_session(None)
    }

    fn switch_session(&mut self, session: Option<UserProfile>) -> Result<(), SessionError> {
        self.session = session;
        let scope = self.owner_scope();
        self.initialize(scope)?;
        Ok(())
    }
}
