//! # Full Deal Lifecycle
//!
//! Walks one deal from creation at Initiation/Pending through every stage
//! to Complete/Completed, doing the paperwork and roster work a real deal
//! needs along the way, and checks the stage/status invariant and the
//! audit trail at each step.

use std::sync::Arc;

use paddock_core::{Actor, HorseId, UserId};
use paddock_deal::{
    doc_types, BasicInfo, Deal, DealStage, DealStatus, DealTerms, InspectionPlan, InsurancePolicy,
    ParticipantRole, TimelineEventType,
};
use paddock_engine::{DealEngine, LifecycleEventKind, MemorySink, MemoryStore};

/// Engine logs go to the test writer; `RUST_LOG` controls verbosity.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn new_deal() -> Deal {
    Deal::new(
        BasicInfo {
            horse: HorseId::new(),
            title: "Trakehner show jumper".into(),
            tags: vec!["showjumping".into()],
        },
        DealTerms::new(45_000.0, "EUR"),
    )
}

#[test]
fn deal_travels_from_initiation_to_complete() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(MemorySink::new());
    let engine = DealEngine::new(store.clone(), sink.clone());

    let mut deal = new_deal();
    let seller = UserId::new();
    let buyer = UserId::new();
    let broker = Actor::user(UserId::new());

    // Staff the deal and activate it.
    engine
        .roster()
        .add_participant(&mut deal, seller, ParticipantRole::Seller, &broker)
        .unwrap();
    engine
        .roster()
        .add_participant(&mut deal, buyer, ParticipantRole::Buyer, &broker)
        .unwrap();
    engine
        .attempt_status_transition(&mut deal, DealStatus::Active, None, &broker)
        .unwrap();

    // Initiation -> Discussion: needs both sides and a positive price.
    let outcome = engine
        .attempt_stage_transition(&mut deal, DealStage::Discussion, &broker)
        .unwrap();
    assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
    assert!(deal.stage_status_consistent());

    // Discussion -> Evaluation: needs an inspection arrangement.
    deal.logistics.inspection = Some(InspectionPlan {
        scheduled_at: paddock_core::Timestamp::now().plus_secs(7 * 86_400),
        location: "Warendorf".into(),
        inspector: None,
    });
    engine
        .ledger()
        .record_logistics_change(&mut deal, "vetting booked in Warendorf", broker.clone());
    let outcome = engine
        .attempt_stage_transition(&mut deal, DealStage::Evaluation, &broker)
        .unwrap();
    assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);

    // Evaluation -> Documentation: approved contract plus bound insurance.
    let contract = engine
        .roster()
        .attach_document(&mut deal, doc_types::CONTRACT, seller, &broker)
        .unwrap();
    engine
        .roster()
        .review_document(&mut deal, contract, true, buyer, None, &broker)
        .unwrap();
    deal.logistics.insurance = Some(InsurancePolicy {
        provider: "EquiSure".into(),
        policy_number: "EQ-2026-1188".into(),
        coverage: 45_000.0,
    });
    let outcome = engine
        .attempt_stage_transition(&mut deal, DealStage::Documentation, &broker)
        .unwrap();
    assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);

    // Documentation -> Closing: signed contract and payment confirmation.
    for doc_type in [doc_types::SIGNED_CONTRACT, doc_types::PAYMENT_CONFIRMATION] {
        let id = engine
            .roster()
            .attach_document(&mut deal, doc_type, seller, &broker)
            .unwrap();
        engine
            .roster()
            .review_document(&mut deal, id, true, buyer, None, &broker)
            .unwrap();
    }
    let outcome = engine
        .attempt_stage_transition(&mut deal, DealStage::Closing, &broker)
        .unwrap();
    assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);

    // Closing -> Complete: transfer of ownership closes it out, and the
    // status rides along to Completed in the same commit.
    let transfer = engine
        .roster()
        .attach_document(&mut deal, doc_types::TRANSFER_OF_OWNERSHIP, seller, &broker)
        .unwrap();
    engine
        .roster()
        .review_document(&mut deal, transfer, true, buyer, None, &broker)
        .unwrap();
    let outcome = engine
        .attempt_stage_transition(&mut deal, DealStage::Complete, &broker)
        .unwrap();
    assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
    assert_eq!(deal.stage, DealStage::Complete);
    assert_eq!(deal.status, DealStatus::Completed);
    assert!(deal.stage_status_consistent());

    // The full health check holds at the end of the road.
    assert!(engine.validate(&deal).is_valid);

    // Five stage changes in the audit trail, in order.
    let stage_entries: Vec<_> = deal
        .timeline
        .iter()
        .filter(|e| e.event_type == TimelineEventType::StageChange)
        .collect();
    assert_eq!(stage_entries.len(), 5);
    assert_eq!(
        stage_entries.last().unwrap().metadata.new_stage,
        Some(DealStage::Complete)
    );

    // The store saw the final state.
    let saved = store.load(deal.id).unwrap();
    assert_eq!(saved.stage, DealStage::Complete);
    assert_eq!(saved.status, DealStatus::Completed);

    // Fan-out saw every committed stage change and no rollbacks.
    let events = sink.events();
    let stage_events: Vec<_> = events
        .iter()
        .filter(|e| e.kind == LifecycleEventKind::StageChanged)
        .collect();
    assert_eq!(stage_events.len(), 5);
    assert!(!events
        .iter()
        .any(|e| e.kind == LifecycleEventKind::TransitionRolledBack));
    // The final event carries the structured from/to payload.
    assert_eq!(
        stage_events.last().unwrap().payload,
        serde_json::json!({ "from": "CLOSING", "to": "COMPLETE" })
    );
}

#[test]
fn invariant_holds_after_every_successful_transition() {
    let engine = DealEngine::detached();
    let mut deal = new_deal();
    let actor = Actor::system();

    engine
        .roster()
        .add_participant(&mut deal, UserId::new(), ParticipantRole::Seller, &actor)
        .unwrap();
    engine
        .roster()
        .add_participant(&mut deal, UserId::new(), ParticipantRole::Agent, &actor)
        .unwrap();
    engine
        .attempt_status_transition(&mut deal, DealStatus::Active, None, &actor)
        .unwrap();

    // Bounce around the reversible stages; the invariant is checked after
    // every accepted move. Completed never appears outside Complete.
    for target in [
        DealStage::Discussion,
        DealStage::Initiation,
        DealStage::Discussion,
    ] {
        let outcome = engine
            .attempt_stage_transition(&mut deal, target, &actor)
            .unwrap();
        assert!(outcome.accepted, "{:?}", outcome.rejection_reasons);
        assert!(deal.stage_status_consistent());
        assert_ne!(deal.status, DealStatus::Completed);
    }
}

#[test]
fn completion_requires_an_active_deal() {
    let engine = DealEngine::detached();
    let mut deal = new_deal();
    let actor = Actor::system();
    deal.stage = DealStage::Closing;
    deal.status = DealStatus::Active;

    // Fully documented, then held: the hold blocks completion.
    for doc_type in [
        doc_types::SIGNED_CONTRACT,
        doc_types::PAYMENT_CONFIRMATION,
        doc_types::TRANSFER_OF_OWNERSHIP,
    ] {
        let id = engine
            .roster()
            .attach_document(&mut deal, doc_type, UserId::new(), &actor)
            .unwrap();
        engine
            .roster()
            .review_document(&mut deal, id, true, UserId::new(), None, &actor)
            .unwrap();
    }
    engine
        .roster()
        .add_participant(&mut deal, UserId::new(), ParticipantRole::Seller, &actor)
        .unwrap();
    engine
        .roster()
        .add_participant(&mut deal, UserId::new(), ParticipantRole::Buyer, &actor)
        .unwrap();
    engine
        .attempt_status_transition(
            &mut deal,
            DealStatus::OnHold,
            Some("financing fell through".into()),
            &actor,
        )
        .unwrap();

    let outcome = engine
        .attempt_stage_transition(&mut deal, DealStage::Complete, &actor)
        .unwrap();
    assert!(!outcome.accepted);
    assert_eq!(deal.stage, DealStage::Closing);
    assert_eq!(deal.status, DealStatus::OnHold);
}
