//! Integration tests for `DieselTicketRepository` and `DieselTrackingSequence`
//! against embedded PostgreSQL.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use helpdesk::domain::ports::{
    Assignment, AssignmentRepository, TicketRepository, TicketRepositoryError, TrackingSequence,
};
use helpdesk::domain::{
    ActivityEntry, ActivityKind, BranchId, NewTicket, Ticket, TicketBucket, TicketListQuery,
    TicketScope, TicketStatus, TicketType, TrackingNumber, UserId, kinds, ticket_slug,
};
use helpdesk::outbound::persistence::{
    DieselAssignmentRepository, DieselTicketRepository, DieselTrackingSequence,
};
use rstest::{fixture, rstest};

mod support;

use support::{DbContext, handle_cluster_setup_failure, setup_database};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0)
        .single()
        .expect("valid time")
}

fn user(id: i64) -> UserId {
    UserId::new(id).expect("user id")
}

fn branch(id: i64) -> BranchId {
    BranchId::new(id).expect("branch id")
}

fn new_ticket(sequence: u64, issue: &str, branch_id: Option<i64>) -> NewTicket {
    let tracking_number =
        TrackingNumber::allocate(TicketType::InShop, sequence).expect("tracking number");
    NewTicket {
        slug: ticket_slug(issue, &tracking_number),
        tracking_number,
        issue: issue.to_owned(),
        description: None,
        priority_id: None,
        status: TicketStatus::Open,
        ticket_type: TicketType::InShop,
        due_date: None,
        closed_at: None,
        customer_id: None,
        created_by: user(1),
        branch_id: branch_id.map(branch),
        created_at: base_time() + Duration::minutes(i64::try_from(sequence).expect("small")),
    }
}

fn entry(kind: &str, note: &str) -> ActivityEntry {
    ActivityEntry {
        task_id: None,
        kind: ActivityKind::new(kind).expect("kind"),
        note: note.to_owned(),
        extra: None,
        created_by: user(1),
        created_at: base_time(),
    }
}

struct TestContext {
    db: DbContext,
    tickets: DieselTicketRepository,
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_database() {
        Ok(db) => {
            let tickets = DieselTicketRepository::new(db.pool.clone());
            Some(TestContext { db, tickets })
        }
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

impl TestContext {
    fn insert(&self, ticket: &NewTicket, agents: &[UserId], entries: &[ActivityEntry]) -> Ticket {
        self.db
            .block_on(self.tickets.insert(ticket, agents, entries))
            .expect("insert ticket")
    }

    fn issues(&self, scope: &TicketScope, bucket: TicketBucket) -> BTreeSet<String> {
        let query = TicketListQuery {
            bucket,
            ..TicketListQuery::default()
        };
        self.db
            .block_on(self.tickets.list(scope, &query))
            .expect("list tickets")
            .into_items()
            .into_iter()
            .map(|ticket| ticket.issue)
            .collect()
    }

    fn count(&self, sql: &str) -> i64 {
        self.db.scalar(sql).expect("count query")
    }
}

fn set(issues: &[&str]) -> BTreeSet<String> {
    issues.iter().map(|issue| (*issue).to_owned()).collect()
}

#[rstest]
fn insert_writes_ticket_agents_and_activities_together(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: insert_writes_ticket_agents_and_activities_together skipped");
        return;
    };

    let new = new_ticket(1, "Laptop will not boot", Some(1));
    let stored = context.insert(
        &new,
        &[user(2), user(5)],
        &[
            entry(kinds::TICKET_CREATED, "Ticket TKT0000001 created"),
            entry(kinds::AGENT_ASSIGNED, "Alan Agent assigned as agent"),
        ],
    );

    assert_eq!(stored.tracking_number.as_str(), "TKT0000001");
    assert_eq!(stored.updated_at, new.created_at);
    assert!(stored.deleted_at.is_none());
    assert_eq!(context.count("SELECT count(*) FROM ticket_agents"), 2);
    assert_eq!(
        context.count(&format!(
            "SELECT count(*) FROM activities WHERE ticket_id = {}",
            stored.id.get()
        )),
        2
    );

    let found = context
        .db
        .block_on(context.tickets.find_scoped(stored.id, &TicketScope::Unrestricted))
        .expect("find ticket");
    assert_eq!(found, Some(stored));
}

#[rstest]
fn duplicate_tracking_numbers_are_reported_and_rolled_back(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: duplicate_tracking_numbers_are_reported_and_rolled_back skipped"
        );
        return;
    };

    let first = new_ticket(7, "First", None);
    context.insert(&first, &[], &[entry(kinds::TICKET_CREATED, "first")]);

    let mut clash = new_ticket(7, "Second", None);
    clash.slug = "second".to_owned();
    let err = context
        .db
        .block_on(context.tickets.insert(
            &clash,
            &[user(2)],
            &[entry(kinds::TICKET_CREATED, "second")],
        ))
        .expect_err("duplicate tracking number");

    assert_eq!(
        err,
        TicketRepositoryError::DuplicateTrackingNumber {
            tracking_number: "TKT0000007".to_owned(),
        }
    );
    assert_eq!(context.count("SELECT count(*) FROM tickets"), 1);
    assert_eq!(context.count("SELECT count(*) FROM ticket_agents"), 0);
    assert_eq!(context.count("SELECT count(*) FROM activities"), 1);
}

#[rstest]
fn failed_agent_rows_roll_back_the_ticket(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: failed_agent_rows_roll_back_the_ticket skipped");
        return;
    };

    let err = context
        .db
        .block_on(context.tickets.insert(
            &new_ticket(3, "Orphaned", None),
            &[user(99)],
            &[entry(kinds::TICKET_CREATED, "Ticket TKT0000003 created")],
        ))
        .expect_err("unknown agent");

    assert!(matches!(err, TicketRepositoryError::Query { .. }), "{err}");
    assert_eq!(context.count("SELECT count(*) FROM tickets"), 0);
    assert_eq!(context.count("SELECT count(*) FROM activities"), 0);
}

#[rstest]
fn tracking_sequence_hands_out_increasing_values(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: tracking_sequence_hands_out_increasing_values skipped");
        return;
    };

    let sequence = DieselTrackingSequence::new(context.db.pool.clone());
    let values: Vec<u64> = (0..3)
        .map(|_| {
            context
                .db
                .block_on(sequence.next_value())
                .expect("next value")
        })
        .collect();

    assert_eq!(values, vec![1, 2, 3]);
}

#[rstest]
fn scopes_filter_in_sql(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: scopes_filter_in_sql skipped");
        return;
    };

    let downtown = context.insert(&new_ticket(1, "Downtown agent", Some(1)), &[user(2)], &[]);
    context.insert(&new_ticket(2, "Harbour agent", Some(2)), &[user(5)], &[]);
    context.insert(&new_ticket(3, "Nobody", None), &[], &[]);
    let watched = context.insert(&new_ticket(4, "Watched", Some(1)), &[], &[]);
    let assignments = DieselAssignmentRepository::new(context.db.pool.clone());
    context
        .db
        .block_on(assignments.attach(
            watched.id,
            Assignment::NotifyUser(user(2)),
            &entry(kinds::NOTIFY_USER_ADDED, "Alan Agent added to notify list"),
        ))
        .expect("attach notify user");

    let active = TicketBucket::Active;
    assert_eq!(
        context.issues(&TicketScope::Unrestricted, active),
        set(&["Downtown agent", "Harbour agent", "Nobody", "Watched"])
    );
    assert_eq!(
        context.issues(
            &TicketScope::Assigned {
                user: user(2),
                branch: Some(branch(1)),
            },
            active
        ),
        set(&["Downtown agent", "Watched"])
    );
    assert_eq!(
        context.issues(
            &TicketScope::Assigned {
                user: user(2),
                branch: Some(branch(2)),
            },
            active
        ),
        set(&[])
    );
    assert_eq!(
        context.issues(&TicketScope::ManagedAgents(vec![user(2), user(5)]), active),
        set(&["Downtown agent", "Harbour agent"])
    );
    assert_eq!(
        context.issues(&TicketScope::Branch(branch(1)), active),
        set(&["Downtown agent", "Watched"])
    );
    assert_eq!(context.issues(&TicketScope::Nothing, active), set(&[]));

    let hidden = context
        .db
        .block_on(context.tickets.find_scoped(downtown.id, &TicketScope::Branch(branch(2))))
        .expect("scoped lookup");
    assert!(hidden.is_none());
}

#[rstest]
fn listings_come_back_newest_first(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: listings_come_back_newest_first skipped");
        return;
    };

    for (sequence, issue) in [(1, "Oldest"), (2, "Middle"), (3, "Newest")] {
        context.insert(&new_ticket(sequence, issue, None), &[], &[]);
    }

    let page = context
        .db
        .block_on(
            context
                .tickets
                .list(&TicketScope::Unrestricted, &TicketListQuery::default()),
        )
        .expect("list tickets");
    let issues: Vec<&str> = page.items().iter().map(|t| t.issue.as_str()).collect();
    assert_eq!(issues, ["Newest", "Middle", "Oldest"]);
    assert_eq!(page.total(), 3);
}

#[rstest]
fn update_moves_tickets_between_buckets(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: update_moves_tickets_between_buckets skipped");
        return;
    };

    let mut ticket = context.insert(&new_ticket(1, "Cracked screen", None), &[], &[]);
    let closed_at = base_time() + Duration::hours(2);
    ticket.status = TicketStatus::Closed;
    ticket.closed_at = Some(closed_at);
    ticket.updated_at = closed_at;
    context
        .db
        .block_on(context.tickets.update(
            &ticket,
            &[entry(
                kinds::STATUS_CHANGED,
                "Status changed from Open to Closed",
            )],
        ))
        .expect("close ticket");

    let scope = TicketScope::Unrestricted;
    assert_eq!(context.issues(&scope, TicketBucket::Active), set(&[]));
    assert_eq!(
        context.issues(&scope, TicketBucket::Closed),
        set(&["Cracked screen"])
    );

    ticket.trash(closed_at + Duration::minutes(5));
    context
        .db
        .block_on(context.tickets.update(&ticket, &[]))
        .expect("trash ticket");
    assert_eq!(context.issues(&scope, TicketBucket::Closed), set(&[]));
    assert_eq!(
        context.issues(&scope, TicketBucket::Trashed),
        set(&["Cracked screen"])
    );

    let stored = context
        .db
        .block_on(context.tickets.find_scoped(ticket.id, &scope))
        .expect("find ticket")
        .expect("ticket exists");
    assert_eq!(stored, ticket);
    assert_eq!(
        context.count("SELECT count(*) FROM activities WHERE kind = 'Ticket Status Changed'"),
        1
    );
}
