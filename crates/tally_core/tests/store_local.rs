use std::sync::{Arc, Mutex};
use std::time::Duration;
use tally_core::db::open_db_in_memory;
use tally_core::{
    BlobRepository, Goal, GoalDraft, GoalStore, LocalStore, OwnerScope, SqliteBlobRepository,
    Timeframe,
};

fn new_repo() -> Arc<SqliteBlobRepository> {
    Arc::new(SqliteBlobRepository::try_new(open_db_in_memory().unwrap()).unwrap())
}

fn goal(title: &str) -> Goal {
    Goal::from_draft(GoalDraft {
        title: title.to_string(),
        target_count: 5,
        timeframe: Some(Timeframe::Weekly),
        ..GoalDraft::default()
    })
    .unwrap()
}

fn snapshot(store: &dyn GoalStore, owner: &OwnerScope) -> Vec<Goal> {
    let slot = Arc::new(Mutex::new(Vec::new()));
    let sink = slot.clone();
    store
        .subscribe(
            owner,
            Box::new(move |goals| {
                *sink.lock().unwrap() = goals;
            }),
        )
        .unwrap();
    let goals = slot.lock().unwrap().clone();
    goals
}

#[test]
fn absent_partition_reads_as_empty_list() {
    let store = LocalStore::new(new_repo());
    assert!(snapshot(&store, &OwnerScope::Guest).is_empty());
}

#[test]
fn add_inserts_at_head_and_stamps_owner() {
    let store = LocalStore::new(new_repo());
    let owner = OwnerScope::Guest;

    let first = store.add(&owner, &goal("first")).unwrap();
    let second = store.add(&owner, &goal("second")).unwrap();

    // The local backend honors caller-generated ids.
    assert_eq!(first.owner_id.as_deref(), Some("guest"));

    let goals = snapshot(&store, &owner);
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].id, second.id);
    assert_eq!(goals[1].id, first.id);
}

#[test]
fn subscribe_delivers_exactly_once() {
    let repo = new_repo();
    let store = LocalStore::new(repo);
    let owner = OwnerScope::Guest;
    store.add(&owner, &goal("only")).unwrap();

    let deliveries = Arc::new(Mutex::new(0_u32));
    let counter = deliveries.clone();
    let subscription = store
        .subscribe(
            &owner,
            Box::new(move |_goals| {
                *counter.lock().unwrap() += 1;
            }),
        )
        .unwrap();

    assert_eq!(*deliveries.lock().unwrap(), 1);

    // Later writes never re-fire a one-shot read.
    store.add(&owner, &goal("later")).unwrap();
    assert_eq!(*deliveries.lock().unwrap(), 1);

    subscription.unsubscribe();
}

#[test]
fn simulated_latency_still_delivers() {
    let store = LocalStore::with_simulated_latency(new_repo(), Duration::from_millis(5));
    let owner = OwnerScope::Guest;
    store.add(&owner, &goal("slow")).unwrap();
    assert_eq!(snapshot(&store, &owner).len(), 1);
}

#[test]
fn update_overwrites_by_id_and_ignores_unknown_ids() {
    let store = LocalStore::new(new_repo());
    let owner = OwnerScope::Guest;
    let mut stored = store.add(&owner, &goal("counted")).unwrap();

    stored.current_count = 3;
    store.update(&owner, &stored).unwrap();
    assert_eq!(snapshot(&store, &owner)[0].current_count, 3);

    let phantom = goal("phantom");
    store.update(&owner, &phantom).unwrap();
    let goals = snapshot(&store, &owner);
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].id, stored.id);
}

#[test]
fn delete_removes_one_goal() {
    let store = LocalStore::new(new_repo());
    let owner = OwnerScope::Guest;
    let keep = store.add(&owner, &goal("keep")).unwrap();
    let gone = store.add(&owner, &goal("gone")).unwrap();

    store.delete(&owner, &gone.id).unwrap();

    let goals = snapshot(&store, &owner);
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].id, keep.id);
}

#[test]
fn replace_all_persists_caller_order() {
    let store = LocalStore::new(new_repo());
    let owner = OwnerScope::Guest;
    let a = store.add(&owner, &goal("a")).unwrap();
    let b = store.add(&owner, &goal("b")).unwrap();
    // Head insertion put them in order [b, a].
    assert_eq!(
        snapshot(&store, &owner)
            .iter()
            .map(|g| g.id.clone())
            .collect::<Vec<_>>(),
        vec![b.id.clone(), a.id.clone()]
    );

    store
        .replace_all(&owner, &[a.clone(), b.clone()])
        .unwrap();

    // Array order is the display order on the next load.
    let reloaded = snapshot(&store, &owner);
    assert_eq!(reloaded[0].id, a.id);
    assert_eq!(reloaded[1].id, b.id);
}

#[test]
fn clear_drops_the_whole_partition() {
    let repo = new_repo();
    let store = LocalStore::new(repo.clone());
    let owner = OwnerScope::Guest;
    store.add(&owner, &goal("gone")).unwrap();

    store.clear(&owner).unwrap();

    assert!(snapshot(&store, &owner).is_empty());
    assert!(repo.get("goals/guest").unwrap().is_none());
}

#[test]
fn owner_partitions_never_mix() {
    let store = LocalStore::new(new_repo());
    let guest = OwnerScope::Guest;
    let user = OwnerScope::User("u-1".to_string());

    store.add(&guest, &goal("guest goal")).unwrap();
    store.add(&user, &goal("user goal")).unwrap();

    let guest_goals = snapshot(&store, &guest);
    let user_goals = snapshot(&store, &user);
    assert_eq!(guest_goals.len(), 1);
    assert_eq!(user_goals.len(), 1);
    assert_eq!(guest_goals[0].title, "guest goal");
    assert_eq!(user_goals[0].title, "user goal");
    assert_eq!(user_goals[0].owner_id.as_deref(), Some("u-1"));
}
