//! Integration tests for `DieselAssignmentRepository` and
//! `DieselActivityRepository` against embedded PostgreSQL.

use chrono::{DateTime, Duration, TimeZone, Utc};
use helpdesk::domain::ports::{
    ActivityRepository, AgentChange, Assignment, AssignmentRepository, AssignmentRepositoryError,
};
use helpdesk::domain::{ActivityEntry, ActivityKind, LabelId, TaskId, TicketId, UserId, kinds};
use helpdesk::outbound::persistence::{DieselActivityRepository, DieselAssignmentRepository};
use pagination::PageRequest;
use rstest::{fixture, rstest};

mod support;

use support::{DbContext, handle_cluster_setup_failure, setup_database};

const TICKET: i64 = 1;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0)
        .single()
        .expect("valid time")
}

fn user(id: i64) -> UserId {
    UserId::new(id).expect("user id")
}

fn ticket() -> TicketId {
    TicketId::new(TICKET).expect("ticket id")
}

fn entry(kind: &str, note: &str, minutes: i64) -> ActivityEntry {
    ActivityEntry {
        task_id: None,
        kind: ActivityKind::new(kind).expect("kind"),
        note: note.to_owned(),
        extra: None,
        created_by: user(1),
        created_at: base_time() + Duration::minutes(minutes),
    }
}

fn change(id: i64, note: &str) -> AgentChange {
    AgentChange {
        user: user(id),
        activity: entry(kinds::AGENT_ASSIGNED, note, 0),
    }
}

struct TestContext {
    db: DbContext,
    assignments: DieselAssignmentRepository,
    activities: DieselActivityRepository,
}

impl TestContext {
    fn count(&self, sql: &str) -> i64 {
        self.db.scalar(sql).expect("count query")
    }
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    let setup = setup_database().and_then(|db| {
        db.seed_ticket(TICKET)?;
        Ok(db)
    });
    match setup {
        Ok(db) => Some(TestContext {
            assignments: DieselAssignmentRepository::new(db.pool.clone()),
            activities: DieselActivityRepository::new(db.pool.clone()),
            db,
        }),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn attaching_twice_keeps_one_row_and_one_activity(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: attaching_twice_keeps_one_row_and_one_activity skipped");
        return;
    };

    let label = Assignment::Label(LabelId::new(1).expect("label id"));
    let note = entry(kinds::LABEL_ADDED, "Label Warranty added", 0);
    let first = context
        .db
        .block_on(context.assignments.attach(ticket(), label, &note))
        .expect("first attach");
    let second = context
        .db
        .block_on(context.assignments.attach(ticket(), label, &note))
        .expect("second attach");

    assert!(first);
    assert!(!second);
    assert_eq!(context.count("SELECT count(*) FROM ticket_labels"), 1);
    assert_eq!(context.count("SELECT count(*) FROM activities"), 1);
    let labels = context
        .db
        .block_on(context.assignments.labels(ticket()))
        .expect("labels");
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name.as_str(), "Warranty");
}

#[rstest]
fn detaching_an_absent_row_logs_nothing(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: detaching_an_absent_row_logs_nothing skipped");
        return;
    };

    let notify = Assignment::NotifyUser(user(4));
    let added = entry(kinds::NOTIFY_USER_ADDED, "Barbara Branch added", 0);
    let removed = entry(kinds::NOTIFY_USER_REMOVED, "Barbara Branch removed", 1);
    context
        .db
        .block_on(context.assignments.attach(ticket(), notify, &added))
        .expect("attach");

    let first = context
        .db
        .block_on(context.assignments.detach(ticket(), notify, &removed))
        .expect("detach");
    let second = context
        .db
        .block_on(context.assignments.detach(ticket(), notify, &removed))
        .expect("detach again");

    assert!(first);
    assert!(!second);
    assert!(
        context
            .db
            .block_on(context.assignments.notify_user_ids(ticket()))
            .expect("notify users")
            .is_empty()
    );
    assert_eq!(context.count("SELECT count(*) FROM activities"), 2);
}

#[rstest]
fn agent_sync_applies_the_delta_in_one_transaction(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: agent_sync_applies_the_delta_in_one_transaction skipped");
        return;
    };
    context
        .db
        .execute("INSERT INTO ticket_agents (ticket_id, user_id) VALUES (1, 2)")
        .expect("seed agent");

    let outcome = context
        .db
        .block_on(context.assignments.sync_agents(
            ticket(),
            &[change(5, "Edsger Agent assigned as agent")],
            &[change(2, "Alan Agent removed as agent"), change(4, "never assigned")],
        ))
        .expect("sync");

    assert_eq!(outcome.added, vec![user(5)]);
    assert_eq!(outcome.removed, vec![user(2)]);
    assert_eq!(
        context
            .db
            .block_on(context.assignments.agent_ids(ticket()))
            .expect("agents"),
        vec![user(5)]
    );
    assert_eq!(context.count("SELECT count(*) FROM activities"), 2);
}

#[rstest]
fn failed_agent_sync_leaves_nothing_behind(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: failed_agent_sync_leaves_nothing_behind skipped");
        return;
    };

    let err = context
        .db
        .block_on(context.assignments.sync_agents(
            ticket(),
            &[change(5, "Edsger Agent assigned"), change(99, "unknown user")],
            &[],
        ))
        .expect_err("foreign key violation");

    assert!(matches!(err, AssignmentRepositoryError::Query { .. }), "{err}");
    assert_eq!(context.count("SELECT count(*) FROM ticket_agents"), 0);
    assert_eq!(context.count("SELECT count(*) FROM activities"), 0);
}

#[rstest]
fn activities_page_newest_first_and_filter_by_task(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: activities_page_newest_first_and_filter_by_task skipped");
        return;
    };

    let task = TaskId::new(7).expect("task id");
    let mut task_entry = entry("Task Note", "checked the fuse", 2);
    task_entry.task_id = Some(task);
    for item in [
        entry(kinds::TICKET_CREATED, "created", 0),
        entry("Phone Call", "called the customer", 1),
        task_entry,
    ] {
        context
            .db
            .block_on(context.activities.append(ticket(), &item))
            .expect("append");
    }

    let page = context
        .db
        .block_on(context.activities.list(
            ticket(),
            None,
            PageRequest::new(1, 2).expect("page"),
        ))
        .expect("list");
    let notes: Vec<&str> = page.items().iter().map(|a| a.note.as_str()).collect();
    assert_eq!(notes, ["checked the fuse", "called the customer"]);
    assert_eq!(page.total(), 3);

    let for_task = context
        .db
        .block_on(
            context
                .activities
                .list(ticket(), Some(task), PageRequest::default()),
        )
        .expect("task list");
    assert_eq!(for_task.total(), 1);
    assert_eq!(for_task.items()[0].kind.as_str(), "Task Note");
}
