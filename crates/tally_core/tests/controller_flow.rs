use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tally_core::db::open_db_in_memory;
use tally_core::{
    AppController, AuthError, AuthResult, BlobRepository, CreateGoalError, Goal, GoalDraft,
    GoalListCallback, GoalStore, IdentityProvider, LocalIdentity, LocalStore, OwnerScope,
    ProviderKind, SqliteBlobRepository, StoreError, StoreResult, Subscription, Timeframe,
    UserProfile, FREE_TIER_GOAL_LIMIT,
};

fn new_repo() -> Arc<SqliteBlobRepository> {
    Arc::new(SqliteBlobRepository::try_new(open_db_in_memory().unwrap()).unwrap())
}

fn local_controller(repo: Arc<SqliteBlobRepository>) -> AppController {
    let store = Arc::new(LocalStore::new(repo.clone()));
    let identity = Arc::new(LocalIdentity::new(repo));
    let mut controller = AppController::new(store, identity);
    controller.bootstrap().unwrap();
    controller
}

fn draft(title: &str) -> GoalDraft {
    GoalDraft {
        title: title.to_string(),
        target_count: 5,
        timeframe: Some(Timeframe::Monthly),
        ..GoalDraft::default()
    }
}

/// Local store with injectable write failures.
struct FlakyStore {
    inner: LocalStore,
    fail_add: AtomicBool,
    fail_update: AtomicBool,
}

impl FlakyStore {
    fn new(repo: Arc<SqliteBlobRepository>) -> Self {
        Self {
            inner: LocalStore::new(repo),
            fail_add: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }
}

impl GoalStore for FlakyStore {
    fn subscribe(
        &self,
        owner: &OwnerScope,
        callback: GoalListCallback,
    ) -> StoreResult<Subscription> {
        self.inner.subscribe(owner, callback)
    }

    fn add(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<Goal> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected add failure".to_string()));
        }
        self.inner.add(owner, goal)
    }

    fn update(&self, owner: &OwnerScope, goal: &Goal) -> StoreResult<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected update failure".to_string()));
        }
        self.inner.update(owner, goal)
    }

    fn delete(&self, owner: &OwnerScope, goal_id: &str) -> StoreResult<()> {
        self.inner.delete(owner, goal_id)
    }

    fn replace_all(&self, owner: &OwnerScope, goals: &[Goal]) -> StoreResult<()> {
        self.inner.replace_all(owner, goals)
    }

    fn clear(&self, owner: &OwnerScope) -> StoreResult<()> {
        self.inner.clear(owner)
    }
}

/// Identity collaborator stub with a fixed profile.
struct StubIdentity {
    profile: UserProfile,
    fail_delete: AtomicBool,
}

impl StubIdentity {
    fn new(profile: UserProfile) -> Self {
        Self {
            profile,
            fail_delete: AtomicBool::new(false),
        }
    }
}

impl IdentityProvider for StubIdentity {
    fn sign_in_with_provider(&self, _provider: ProviderKind) -> AuthResult<UserProfile> {
        Ok(self.profile.clone())
    }

    fn register_with_password(
        &self,
        _email: &str,
        _password: &str,
        _name: &str,
    ) -> AuthResult<UserProfile> {
        Ok(self.profile.clone())
    }

    fn login_with_password(&self, _email: &str, _password: &str) -> AuthResult<UserProfile> {
        Ok(self.profile.clone())
    }

    fn logout(&self) -> AuthResult<()> {
        Ok(())
    }

    fn delete_account(&self, _uid: &str) -> AuthResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AuthError::Other("backend unavailable".to_string()));
        }
        Ok(())
    }

    fn load_session(&self) -> AuthResult<Option<UserProfile>> {
        Ok(Some(self.profile.clone()))
    }
}

fn premium_profile() -> UserProfile {
    UserProfile {
        uid: "premium-1".to_string(),
        email: Some("pro@tally.app".to_string()),
        display_name: Some("Pro".to_string()),
        photo_url: None,
        is_premium: true,
    }
}

#[test]
fn bootstrap_starts_in_guest_scope_with_empty_list() {
    let controller = local_controller(new_repo());
    assert!(controller.session().is_none());
    assert_eq!(controller.owner_scope(), OwnerScope::Guest);
    assert!(controller.goals().is_empty());
}

#[test]
fn create_inserts_at_head_optimistically() {
    let mut controller = local_controller(new_repo());

    let first = controller.create_goal(draft("first")).unwrap();
    let second = controller.create_goal(draft("second")).unwrap();

    let goals = controller.goals();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].id, second.id);
    assert_eq!(goals[1].id, first.id);
    assert_eq!(goals[0].current_count, 0);
    assert!(!goals[0].is_archived);
}

#[test]
fn fourth_active_goal_is_rejected_for_free_tier() {
    let mut controller = local_controller(new_repo());

    for index in 0..FREE_TIER_GOAL_LIMIT {
        controller.create_goal(draft(&format!("goal {index}"))).unwrap();
    }
    assert!(controller.is_limit_reached());

    let err = controller.create_goal(draft("one too many")).unwrap_err();
    assert!(matches!(err, CreateGoalError::LimitReached { active: 3 }));
    assert_eq!(controller.goals().len(), FREE_TIER_GOAL_LIMIT);
}

#[test]
fn archived_goals_do_not_count_toward_the_limit() {
    let mut controller = local_controller(new_repo());

    let first = controller.create_goal(draft("goal 0")).unwrap();
    controller.create_goal(draft("goal 1")).unwrap();
    controller.create_goal(draft("goal 2")).unwrap();
    controller.toggle_archive(&first.id);
    assert!(!controller.is_limit_reached());

    controller.create_goal(draft("fits again")).unwrap();
    assert_eq!(controller.goals().len(), 4);
}

#[test]
fn premium_owner_bypasses_the_limit() {
    let repo = new_repo();
    let store = Arc::new(LocalStore::new(repo.clone()));
    let identity = Arc::new(StubIdentity::new(premium_profile()));
    let mut controller = AppController::new(store, identity);
    controller.bootstrap().unwrap();
    assert!(controller.is_premium());

    for index in 0..5 {
        controller.create_goal(draft(&format!("goal {index}"))).unwrap();
    }
    assert_eq!(controller.goals().len(), 5);
    assert!(!controller.is_limit_reached());
}

#[test]
fn create_rolls_back_optimistic_insert_on_persistence_failure() {
    let repo = new_repo();
    let store = Arc::new(FlakyStore::new(repo.clone()));
    let identity = Arc::new(LocalIdentity::new(repo));
    let mut controller = AppController::new(store.clone(), identity);
    controller.bootstrap().unwrap();

    controller.create_goal(draft("survivor")).unwrap();
    let before = controller.goals();

    store.fail_add.store(true, Ordering::SeqCst);
    let err = controller.create_goal(draft("doomed")).unwrap_err();
    assert!(matches!(err, CreateGoalError::Persistence(_)));

    // The list is exactly its pre-call state.
    assert_eq!(controller.goals(), before);
}

#[test]
fn adjust_count_clamps_and_ignores_unknown_ids() {
    let mut controller = local_controller(new_repo());
    let goal = controller.create_goal(draft("clamped")).unwrap();

    controller.adjust_count(&goal.id, 100);
    assert_eq!(controller.goal(&goal.id).unwrap().current_count, 5);

    controller.adjust_count(&goal.id, -100);
    assert_eq!(controller.goal(&goal.id).unwrap().current_count, 0);

    controller.adjust_count("no-such-goal", 1);
    assert_eq!(controller.goals().len(), 1);
}

#[test]
fn failed_write_through_keeps_optimistic_state() {
    // Deliberate asymmetry with create: a lost update is only repaired by
    // the next subscription refresh.
    let repo = new_repo();
    let store = Arc::new(FlakyStore::new(repo.clone()));
    let identity = Arc::new(LocalIdentity::new(repo.clone()));
    let mut controller = AppController::new(store.clone(), identity);
    controller.bootstrap().unwrap();

    let goal = controller.create_goal(draft("optimist")).unwrap();

    store.fail_update.store(true, Ordering::SeqCst);
    controller.adjust_count(&goal.id, 2);

    // In-memory state advanced...
    assert_eq!(controller.goal(&goal.id).unwrap().current_count, 2);

    // ...while the persisted blob still holds the old count.
    let raw = repo.get("goals/guest").unwrap().unwrap();
    let persisted: Vec<Goal> = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted[0].current_count, 0);
}

#[test]
fn toggle_archive_twice_restores_state_and_touches_timestamp() {
    let mut controller = local_controller(new_repo());
    let goal = controller.create_goal(draft("flip")).unwrap();

    controller.toggle_archive(&goal.id);
    let archived = controller.goal(&goal.id).unwrap();
    assert!(archived.is_archived);

    controller.toggle_archive(&goal.id);
    let restored = controller.goal(&goal.id).unwrap();
    assert!(!restored.is_archived);
    assert!(restored.last_updated >= archived.last_updated);
}

#[test]
fn replace_goal_overwrites_by_id_and_reclamps() {
    let mut controller = local_controller(new_repo());
    let goal = controller.create_goal(draft("edited")).unwrap();

    let mut edited = goal.clone();
    edited.title = "edited title".to_string();
    edited.current_count = 50;
    edited.target_count = 8;
    controller.replace_goal(edited);

    let stored = controller.goal(&goal.id).unwrap();
    assert_eq!(stored.title, "edited title");
    assert_eq!(stored.current_count, 8);

    let mut phantom = goal;
    phantom.id = "unknown".to_string();
    controller.replace_goal(phantom);
    assert_eq!(controller.goals().len(), 1);
}

#[test]
fn delete_goal_removes_immediately() {
    let mut controller = local_controller(new_repo());
    let goal = controller.create_goal(draft("short lived")).unwrap();

    controller.delete_goal(&goal.id);
    assert!(controller.goals().is_empty());
    assert!(controller.goal(&goal.id).is_none());
}

#[test]
fn reorder_persists_and_survives_reload() {
    let repo = new_repo();
    let mut controller = local_controller(repo.clone());
    let a = controller.create_goal(draft("a")).unwrap();
    let b = controller.create_goal(draft("b")).unwrap();
    // Head insertion yields [b, a]; swap back to [a, b].
    let swapped: Vec<Goal> = vec![
        controller.goal(&a.id).unwrap(),
        controller.goal(&b.id).unwrap(),
    ];
    controller.reorder(swapped);

    // A fresh controller loads the persisted order.
    let reloaded = local_controller(repo);
    let goals = reloaded.goals();
    assert_eq!(goals[0].id, a.id);
    assert_eq!(goals[1].id, b.id);
}

#[test]
fn switching_scope_never_writes_into_the_guest_partition() {
    let repo = new_repo();
    let mut controller = local_controller(repo.clone());

    let guest_goal = controller.create_goal(draft("guest goal")).unwrap();

    controller
        .register("anna@example.com", "secret1", "Anna")
        .unwrap();
    let uid = controller.session().unwrap().uid.clone();
    assert_eq!(controller.owner_scope(), OwnerScope::User(uid.clone()));
    assert!(controller.goals().is_empty());

    let user_goal = controller.create_goal(draft("user goal")).unwrap();
    controller.adjust_count(&user_goal.id, 3);

    let guest_blob: Vec<Goal> =
        serde_json::from_str(&repo.get("goals/guest").unwrap().unwrap()).unwrap();
    assert_eq!(guest_blob.len(), 1);
    assert_eq!(guest_blob[0].id, guest_goal.id);
    assert_eq!(guest_blob[0].current_count, 0);

    let user_blob: Vec<Goal> =
        serde_json::from_str(&repo.get(&format!("goals/{uid}")).unwrap().unwrap()).unwrap();
    assert_eq!(user_blob.len(), 1);
    assert_eq!(user_blob[0].current_count, 3);
}

/// Store that hands captured subscription callbacks back to the test so a
/// stale delivery can be replayed after a scope switch.
#[derive(Default)]
struct ManualStore {
    callbacks: Mutex<Vec<GoalListCallback>>,
}

impl ManualStore {
    fn fire(&self, index: usize, goals: Vec<Goal>) {
        let callbacks = self.callbacks.lock().unwrap();
        (callbacks[index])(goals);
    }
}

impl GoalStore for ManualStore {
    fn subscribe(
        &self,
        _owner: &OwnerScope,
        callback: GoalListCallback,
    ) -> StoreResult<Subscription> {
        self.callbacks.lock().unwrap().push(callback);
        Ok(Subscription::no_op())
    }

    fn add(&self, _owner: &OwnerScope, goal: &Goal) -> StoreResult<Goal> {
        Ok(goal.clone())
    }

    fn update(&self, _owner: &OwnerScope, _goal: &Goal) -> StoreResult<()> {
        Ok(())
    }

    fn delete(&self, _owner: &OwnerScope, _goal_id: &str) -> StoreResult<()> {
        Ok(())
    }

    fn replace_all(&self, _owner: &OwnerScope, _goals: &[Goal]) -> StoreResult<()> {
        Ok(())
    }

    fn clear(&self, _owner: &OwnerScope) -> StoreResult<()> {
        Ok(())
    }
}

#[test]
fn stale_subscription_delivery_is_dropped_after_scope_switch() {
    let repo = new_repo();
    let store = Arc::new(ManualStore::default());
    let identity = Arc::new(LocalIdentity::new(repo));
    let mut controller = AppController::new(store.clone(), identity);

    controller.initialize(OwnerScope::Guest).unwrap();
    controller
        .initialize(OwnerScope::User("u-2".to_string()))
        .unwrap();

    let stray = Goal::from_draft(draft("stray guest data")).unwrap();
    store.fire(0, vec![stray.clone()]);
    assert!(controller.goals().is_empty());

    store.fire(1, vec![stray]);
    assert_eq!(controller.goals().len(), 1);
}

#[test]
fn delete_account_clears_partition_and_falls_back_to_guest() {
    let repo = new_repo();
    let mut controller = local_controller(repo.clone());
    controller
        .register("gone@example.com", "secret1", "Gone")
        .unwrap();
    let uid = controller.session().unwrap().uid.clone();
    controller.create_goal(draft("user data")).unwrap();
    assert!(repo.get(&format!("goals/{uid}")).unwrap().is_some());

    controller.delete_account().unwrap();

    assert!(controller.session().is_none());
    assert_eq!(controller.owner_scope(), OwnerScope::Guest);
    assert!(repo.get(&format!("goals/{uid}")).unwrap().is_none());
}

#[test]
fn delete_account_failure_keeps_the_session_for_retry() {
    let repo = new_repo();
    let store = Arc::new(LocalStore::new(repo.clone()));
    let identity = Arc::new(StubIdentity::new(premium_profile()));
    identity.fail_delete.store(true, Ordering::SeqCst);
    let mut controller = AppController::new(store, identity);
    controller.bootstrap().unwrap();

    let err = controller.delete_account().unwrap_err();
    assert!(matches!(
        err,
        tally_core::SessionError::Auth(AuthError::Other(_))
    ));
    assert!(controller.session().is_some());
}
