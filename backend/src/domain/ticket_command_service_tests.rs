//! Tests for the ticket lifecycle command service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::{
    MockDirectoryRepository, MockTicketRepository, MockTrackingSequence, TrackingSequenceError,
};
use crate::domain::service_test_helpers::{
    admin, agent, branch, fixture_clock, fixture_timestamp, manager, sample_ticket, ticket_id, user,
};
use crate::domain::{
    ActivityEntry, CustomerId, DirectoryUser, ErrorCode, NewTicket, PriorityId, TicketType,
};
use rstest::rstest;

type Service =
    TicketCommandService<MockTicketRepository, MockTrackingSequence, MockDirectoryRepository>;

fn make_service(
    tickets: MockTicketRepository,
    sequence: MockTrackingSequence,
    directory: MockDirectoryRepository,
) -> Service {
    TicketCommandService::new(
        Arc::new(tickets),
        Arc::new(sequence),
        Arc::new(directory),
        fixture_clock(),
    )
}

fn request(issue: &str) -> NewTicketRequest {
    NewTicketRequest {
        issue: issue.to_owned(),
        description: None,
        priority_id: None,
        status: None,
        ticket_type: TicketType::InShop,
        due_date: None,
        customer_id: None,
        branch_id: None,
        agent_ids: Vec::new(),
    }
}

fn stored(ticket: &NewTicket) -> Ticket {
    ticket.clone().into_ticket(ticket_id(10))
}

fn sequence_from(start: u64) -> MockTrackingSequence {
    let mut sequence = MockTrackingSequence::new();
    let mut next = start;
    sequence.expect_next_value().returning(move || {
        let value = next;
        next += 1;
        Ok(value)
    });
    sequence
}

fn kinds_of(entries: &[ActivityEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.kind.as_str()).collect()
}

#[tokio::test]
async fn create_allocates_tracking_number_and_records_activities() {
    let mut directory = MockDirectoryRepository::new();
    directory.expect_find_users().times(1).return_once(|_| {
        Ok(vec![DirectoryUser {
            id: UserId::new(5).expect("id"),
            name: "Ann Agent".to_owned(),
            email: "ann@example.com".to_owned(),
            role: Role::Agent,
            branch_id: None,
        }])
    });
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_insert()
        .withf(|ticket: &NewTicket, agents: &[UserId], activities: &[ActivityEntry]| {
            ticket.tracking_number.as_str() == "TKT0000042"
                && ticket.slug == "printer-jam-tkt0000042"
                && ticket.status == TicketStatus::Open
                && ticket.branch_id == Some(BranchId::new(1).expect("id"))
                && agents == [UserId::new(5).expect("id")]
                && kinds_of(activities) == [kinds::TICKET_CREATED, kinds::AGENT_ASSIGNED]
                && activities[1].note == "Ann Agent assigned as agent"
        })
        .times(1)
        .returning(|ticket, _, _| Ok(stored(ticket)));

    let service = make_service(tickets, sequence_from(42), directory);
    let mut req = request("  Printer jam ");
    req.agent_ids = vec![user(5), user(5)];

    let ticket = service
        .create_ticket(&agent(2), req)
        .await
        .expect("ticket created");
    assert_eq!(ticket.tracking_number.as_str(), "TKT0000042");
    assert_eq!(ticket.issue, "Printer jam");
    assert_eq!(ticket.created_at, fixture_timestamp());
}

#[tokio::test]
async fn create_retries_tracking_collisions() {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_insert()
        .times(2)
        .returning(|ticket, _, _| {
            if ticket.tracking_number.as_str() == "ONS0000001" {
                Err(TicketRepositoryError::duplicate_tracking_number("ONS0000001"))
            } else {
                Ok(stored(ticket))
            }
        });

    let service = make_service(tickets, sequence_from(1), MockDirectoryRepository::new());
    let mut req = request("Site visit");
    req.ticket_type = TicketType::OnSite;

    let ticket = service
        .create_ticket(&admin(), req)
        .await
        .expect("second attempt succeeds");
    assert_eq!(ticket.tracking_number.as_str(), "ONS0000002");
    assert_eq!(ticket.branch_id, None);
}

#[tokio::test]
async fn create_gives_up_after_repeated_collisions() {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_insert()
        .times(TRACKING_ATTEMPTS)
        .returning(|ticket, _, _| {
            Err(TicketRepositoryError::duplicate_tracking_number(
                ticket.tracking_number.as_str(),
            ))
        });

    let service = make_service(tickets, sequence_from(1), MockDirectoryRepository::new());
    let err = service
        .create_ticket(&admin(), request("Broken screen"))
        .await
        .expect_err("collisions exhaust retries");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn create_fails_when_number_space_is_exhausted() {
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().times(0);

    let service = make_service(
        tickets,
        sequence_from(10_000_000),
        MockDirectoryRepository::new(),
    );
    let err = service
        .create_ticket(&admin(), request("Broken screen"))
        .await
        .expect_err("exhausted");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn create_maps_sequence_outage() {
    let mut sequence = MockTrackingSequence::new();
    sequence
        .expect_next_value()
        .times(1)
        .return_once(|| Err(TrackingSequenceError::connection("refused")));

    let service = make_service(
        MockTicketRepository::new(),
        sequence,
        MockDirectoryRepository::new(),
    );
    let err = service
        .create_ticket(&admin(), request("Broken screen"))
        .await
        .expect_err("sequence down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn create_collects_every_field_error() {
    let mut directory = MockDirectoryRepository::new();
    directory
        .expect_customer_name()
        .times(1)
        .return_once(|_| Ok(None));
    directory
        .expect_find_users()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let mut tickets = MockTicketRepository::new();
    tickets.expect_insert().times(0);

    let service = make_service(tickets, MockTrackingSequence::new(), directory);
    let mut req = request("   ");
    req.customer_id = Some(CustomerId::new(9).expect("id"));
    req.agent_ids = vec![user(8)];

    let err = service
        .create_ticket(&admin(), req)
        .await
        .expect_err("validation fails");
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    let fields = &err.details().expect("details")["fields"];
    assert!(fields.get("issue").is_some());
    assert_eq!(fields["customerId"][0], "customer 9 does not exist");
    assert_eq!(fields["agentIds"][0], "user 8 does not exist");
}

#[rstest]
#[case(agent(4), Some(1))]
#[case(admin(), None)]
#[case(manager(3), None)]
fn branch_defaults_follow_role(#[case] actor: Actor, #[case] expected: Option<i64>) {
    assert_eq!(
        Service::default_branch(&actor, None),
        expected.map(branch)
    );
    assert_eq!(
        Service::default_branch(&actor, Some(branch(7))),
        Some(branch(7))
    );
}

#[tokio::test]
async fn update_logs_one_activity_per_changed_field() {
    let mut directory = MockDirectoryRepository::new();
    directory
        .expect_status_name()
        .returning(|status| Ok(Some(status.label().to_owned())));
    directory
        .expect_priority_name()
        .returning(|_| Ok(Some("High".to_owned())));
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(|_, _| Ok(Some(sample_ticket(3))));
    tickets
        .expect_update()
        .withf(|ticket: &Ticket, activities: &[ActivityEntry]| {
            ticket.closed_at == Some(fixture_timestamp())
                && kinds_of(activities) == [kinds::STATUS_CHANGED, kinds::PRIORITY_CHANGED]
                && activities[0].note == "Status changed from Open to Closed"
                && activities[1].note == "Priority changed from None to High"
        })
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(tickets, MockTrackingSequence::new(), directory);
    let patch = TicketPatch {
        status: Some(TicketStatus::Closed),
        priority_id: FieldUpdate::Set(PriorityId::new(2).expect("id")),
        ..TicketPatch::default()
    };

    let ticket = service
        .update_ticket(&admin(), ticket_id(3), patch)
        .await
        .expect("update succeeds");
    assert_eq!(ticket.status, TicketStatus::Closed);
    assert_eq!(ticket.updated_at, fixture_timestamp());
}

#[tokio::test]
async fn update_without_effective_change_skips_the_write() {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(|_, _| Ok(Some(sample_ticket(3))));
    tickets.expect_update().times(0);

    let service = make_service(
        tickets,
        MockTrackingSequence::new(),
        MockDirectoryRepository::new(),
    );
    let patch = TicketPatch {
        status: Some(TicketStatus::Open),
        ..TicketPatch::default()
    };

    let ticket = service
        .update_ticket(&admin(), ticket_id(3), patch)
        .await
        .expect("no-op update");
    assert_eq!(ticket, sample_ticket(3));
}

#[tokio::test]
async fn update_of_trashed_ticket_is_not_found() {
    let mut trashed = sample_ticket(3);
    trashed.trash(fixture_timestamp());
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(move |_, _| Ok(Some(trashed)));
    tickets.expect_update().times(0);

    let service = make_service(
        tickets,
        MockTrackingSequence::new(),
        MockDirectoryRepository::new(),
    );
    let patch = TicketPatch {
        status: Some(TicketStatus::Closed),
        ..TicketPatch::default()
    };

    let err = service
        .update_ticket(&admin(), ticket_id(3), patch)
        .await
        .expect_err("trashed");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn update_of_unreachable_ticket_is_not_found_before_field_checks() {
    let mut directory = MockDirectoryRepository::new();
    directory.expect_customer_name().times(0);
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(|_, _| Ok(None));
    tickets.expect_update().times(0);

    let service = make_service(tickets, MockTrackingSequence::new(), directory);
    let patch = TicketPatch {
        issue: Some("   ".to_owned()),
        customer_id: FieldUpdate::Set(CustomerId::new(99).expect("id")),
        ..TicketPatch::default()
    };

    let err = service
        .update_ticket(&agent(5), ticket_id(3), patch)
        .await
        .expect_err("hidden ticket");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn manager_without_agents_cannot_reach_any_ticket() {
    let mut directory = MockDirectoryRepository::new();
    directory
        .expect_managed_agent_ids()
        .times(1)
        .return_once(|_| Ok(Vec::new()));
    let mut tickets = MockTicketRepository::new();
    tickets.expect_find_scoped().times(0);

    let service = make_service(tickets, MockTrackingSequence::new(), directory);
    let err = service
        .delete_ticket(&manager(3), ticket_id(3))
        .await
        .expect_err("nothing visible");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn delete_by_non_creator_agent_is_forbidden() {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(|_, _| Ok(Some(sample_ticket(3))));
    tickets.expect_update().times(0);

    let service = make_service(
        tickets,
        MockTrackingSequence::new(),
        MockDirectoryRepository::new(),
    );
    let err = service
        .delete_ticket(&agent(5), ticket_id(3))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn delete_by_creator_moves_ticket_to_trash() {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(|_, _| Ok(Some(sample_ticket(3))));
    tickets
        .expect_update()
        .withf(|ticket: &Ticket, activities: &[ActivityEntry]| {
            ticket.deleted_at == Some(fixture_timestamp())
                && kinds_of(activities) == [kinds::TICKET_DELETED]
                && activities[0].note == "Ticket TKT0000003 deleted"
        })
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(
        tickets,
        MockTrackingSequence::new(),
        MockDirectoryRepository::new(),
    );
    service
        .delete_ticket(&agent(2), ticket_id(3))
        .await
        .expect("creator may delete");
}

#[tokio::test]
async fn restore_reopens_a_closed_ticket() {
    let mut trashed = sample_ticket(3);
    trashed.status = TicketStatus::Closed;
    trashed.trash(fixture_timestamp());
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(move |_, _| Ok(Some(trashed)));
    tickets
        .expect_update()
        .withf(|_: &Ticket, activities: &[ActivityEntry]| {
            kinds_of(activities) == [kinds::TICKET_RESTORED]
        })
        .times(1)
        .return_once(|_, _| Ok(()));

    let service = make_service(
        tickets,
        MockTrackingSequence::new(),
        MockDirectoryRepository::new(),
    );
    let ticket = service
        .restore_ticket(&admin(), ticket_id(3))
        .await
        .expect("restored");
    assert_eq!(ticket.status, TicketStatus::Open);
    assert!(!ticket.is_trashed());
}

#[tokio::test]
async fn restore_of_live_ticket_is_not_found() {
    let mut tickets = MockTicketRepository::new();
    tickets
        .expect_find_scoped()
        .times(1)
        .return_once(|_, _| Ok(Some(sample_ticket(3))));
    tickets.expect_update().times(0);

    let service = make_service(
        tickets,
        MockTrackingSequence::new(),
        MockDirectoryRepository::new(),
    );
    let err = service
        .restore_ticket(&admin(), ticket_id(3))
        .await
        .expect_err("not trashed");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
