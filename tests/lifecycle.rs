use std::sync::Arc;

use chrono::NaiveDate;
use toala::{
    Equipment, EquipmentCategory, EquipmentId, InMemoryStore, MessageChannel, RequestLifecycleManager,
    RequestRole, RequestStatus, ToalaError, User, UserId, ValidationError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn user(name: &str) -> User {
    User {
        id: UserId::new(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        location: "Vienna".to_string(),
        phone: None,
    }
}

fn drill(owner: UserId) -> Equipment {
    Equipment {
        id: EquipmentId::new(),
        owner_id: owner,
        title: "Cordless drill".to_string(),
        description: "18V, two batteries".to_string(),
        category: EquipmentCategory::PowerTools,
        price_per_day: 25.0,
        location: "Vienna".to_string(),
        min_rental_days: 1,
        max_rental_days: Some(30),
        is_available: true,
        created_at: chrono::Utc::now(),
    }
}

/// Store seeded with an owner, a renter, and the owner's drill.
fn setup() -> (Arc<InMemoryStore>, User, User, Equipment) {
    let store = Arc::new(InMemoryStore::new());
    let owner = user("Anna");
    let renter = user("Ben");
    let equipment = drill(owner.id);
    store.add_user(owner.clone());
    store.add_user(renter.clone());
    store.add_equipment(equipment.clone());
    (store, owner, renter, equipment)
}

#[test_log::test(tokio::test)]
async fn full_rental_flow_from_request_to_completion() {
    let (store, owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    // Renter asks for three days at 25/day.
    let request = manager
        .create(
            renter.id,
            &equipment,
            date(2024, 6, 1),
            date(2024, 6, 3),
            "Need it for a weekend project",
        )
        .await
        .unwrap();
    assert_eq!(request.data.total_price, 75.0);
    let created_at = request.data.created_at;
    let data = request.data.clone();

    // Owner approves.
    let approved = manager
        .transition(request.into(), owner.id, RequestStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status(), RequestStatus::Approved);

    // Coordination happens over the request's channel.
    let channel = MessageChannel::new(store.clone(), &data);
    channel.post(owner.id, "See you Monday").await.unwrap();
    let messages = channel.fetch(renter.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "See you Monday");
    assert!(messages[0].timestamp >= created_at);

    // Owner marks the rental finished.
    let completed = manager
        .transition(approved, owner.id, RequestStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status(), RequestStatus::Completed);
    assert!(completed.is_terminal());

    // Terminal means terminal: re-approving is refused.
    let err = manager
        .transition(completed, owner.id, RequestStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::InvalidTransition(_, RequestStatus::Completed, RequestStatus::Approved)
    ));
}

#[test_log::test(tokio::test)]
async fn create_rejects_a_span_over_the_maximum_before_any_write() {
    let (store, _owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    // 40 inclusive days against max_rental_days = 30.
    let err = manager
        .create(
            renter.id,
            &equipment,
            date(2024, 6, 1),
            date(2024, 7, 10),
            "Long renovation",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::Validation(ValidationError::SpanTooLong { span: 40, max: 30 })
    ));
    assert_eq!(store.write_count(), 0);
}

#[test_log::test(tokio::test)]
async fn create_rejects_reversed_dates() {
    let (store, _owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let err = manager
        .create(renter.id, &equipment, date(2024, 6, 3), date(2024, 6, 1), "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::Validation(ValidationError::InvalidDateRange { .. })
    ));
    assert_eq!(store.write_count(), 0);
}

#[test_log::test(tokio::test)]
async fn create_rejects_a_span_under_the_minimum() {
    let (store, _owner, renter, mut equipment) = setup();
    equipment.min_rental_days = 3;
    let manager = RequestLifecycleManager::new(store.clone());

    let err = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::Validation(ValidationError::SpanTooShort { span: 2, min: 3 })
    ));
    assert_eq!(store.write_count(), 0);
}

#[test_log::test(tokio::test)]
async fn create_rejects_self_requests_and_unavailable_listings() {
    let (store, owner, renter, mut equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let err = manager
        .create(owner.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "mine")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::Validation(ValidationError::SelfRequest)
    ));

    equipment.is_available = false;
    let err = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::Validation(ValidationError::Unavailable(_))
    ));
    assert_eq!(store.write_count(), 0);
}

#[test_log::test(tokio::test)]
async fn create_rejects_an_empty_message() {
    let (store, _owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let err = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "  ")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::Validation(ValidationError::EmptyMessage)
    ));
    assert_eq!(store.write_count(), 0);
}

#[test_log::test(tokio::test)]
async fn only_the_owner_decides_whatever_the_current_status() {
    let (store, owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let request = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap();

    // Renter cannot approve their own request.
    let err = manager
        .transition(request.clone().into(), renter.id, RequestStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, ToalaError::Forbidden { .. }));

    // Approve for real, then check a non-owner still gets the
    // authorization error, not the transition error.
    let approved = manager
        .transition(request.into(), owner.id, RequestStatus::Approved)
        .await
        .unwrap();
    let err = manager
        .transition(approved, renter.id, RequestStatus::Declined)
        .await
        .unwrap_err();
    assert!(matches!(err, ToalaError::Forbidden { .. }));
}

#[test_log::test(tokio::test)]
async fn approving_twice_fails_the_second_time() {
    let (store, owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let request = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap();
    let approved = manager
        .transition(request.into(), owner.id, RequestStatus::Approved)
        .await
        .unwrap();

    let err = manager
        .transition(approved, owner.id, RequestStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::InvalidTransition(_, RequestStatus::Approved, RequestStatus::Approved)
    ));
}

#[test_log::test(tokio::test)]
async fn complete_is_only_reachable_from_approved() {
    let (store, owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let pending = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap();

    // pending → completed is not an edge.
    let err = manager
        .transition(pending.clone().into(), renter.id, RequestStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::InvalidTransition(_, RequestStatus::Pending, RequestStatus::Completed)
    ));

    // declined → completed is not an edge either.
    let declined = manager
        .transition(pending.into(), owner.id, RequestStatus::Declined)
        .await
        .unwrap();
    let err = manager
        .transition(declined, renter.id, RequestStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::InvalidTransition(_, RequestStatus::Declined, RequestStatus::Completed)
    ));
}

#[test_log::test(tokio::test)]
async fn either_participant_may_complete() {
    let (store, owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let request = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap();
    let approved = manager
        .transition(request.into(), owner.id, RequestStatus::Approved)
        .await
        .unwrap();

    // The renter, not just the owner, may close it out.
    let completed = manager
        .transition(approved, renter.id, RequestStatus::Completed)
        .await
        .unwrap();
    assert_eq!(completed.status(), RequestStatus::Completed);

    // A stranger may not.
    let (store2, owner2, renter2, equipment2) = setup();
    let manager2 = RequestLifecycleManager::new(store2.clone());
    let request2 = manager2
        .create(renter2.id, &equipment2, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap();
    let approved2 = manager2
        .transition(request2.into(), owner2.id, RequestStatus::Approved)
        .await
        .unwrap();
    let err = manager2
        .transition(approved2, owner.id, RequestStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(err, ToalaError::Forbidden { .. }));
}

#[test_log::test(tokio::test)]
async fn a_stale_request_loses_the_compare_and_set() {
    let (store, owner, renter, equipment) = setup();
    let manager = RequestLifecycleManager::new(store.clone());

    let request = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "hi")
        .await
        .unwrap();
    let stale: toala::AnyRequest = request.clone().into();

    manager
        .transition(request.into(), owner.id, RequestStatus::Approved)
        .await
        .unwrap();

    // The stale pending value races a decline; the store's CAS refuses it.
    let err = manager
        .transition(stale, owner.id, RequestStatus::Declined)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToalaError::InvalidTransition(_, RequestStatus::Approved, RequestStatus::Declined)
    ));
}

#[test_log::test(tokio::test)]
async fn listing_is_most_recent_first_per_role() {
    let (store, owner, renter, equipment) = setup();
    let other_renter = user("Carla");
    store.add_user(other_renter.clone());
    let manager = RequestLifecycleManager::new(store.clone());

    let first = manager
        .create(renter.id, &equipment, date(2024, 6, 1), date(2024, 6, 2), "first")
        .await
        .unwrap();
    let second = manager
        .create(other_renter.id, &equipment, date(2024, 6, 5), date(2024, 6, 6), "second")
        .await
        .unwrap();
    let third = manager
        .create(renter.id, &equipment, date(2024, 6, 9), date(2024, 6, 10), "third")
        .await
        .unwrap();

    // The owner receives all three, newest first.
    let received = manager.list(owner.id, RequestRole::Owner).await.unwrap();
    assert_eq!(
        received.iter().map(|r| r.id()).collect::<Vec<_>>(),
        vec![third.data.id, second.data.id, first.data.id]
    );

    // The renter only sees what they sent.
    let sent = manager.list(renter.id, RequestRole::Requester).await.unwrap();
    assert_eq!(
        sent.iter().map(|r| r.id()).collect::<Vec<_>>(),
        vec![third.data.id, first.data.id]
    );

    // Listing again with no intervening writes returns the same order.
    let again = manager.list(owner.id, RequestRole::Owner).await.unwrap();
    assert_eq!(
        again.iter().map(|r| r.id()).collect::<Vec<_>>(),
        received.iter().map(|r| r.id()).collect::<Vec<_>>()
    );
}
