//! Integration tests for `DieselDirectoryRepository` against embedded
//! PostgreSQL.

use helpdesk::domain::ports::DirectoryRepository;
use helpdesk::domain::{BranchId, CustomerId, PriorityId, Role, TicketStatus, UserId};
use helpdesk::outbound::persistence::DieselDirectoryRepository;
use rstest::{fixture, rstest};

mod support;

use support::{DbContext, handle_cluster_setup_failure, setup_database};

fn user(id: i64) -> UserId {
    UserId::new(id).expect("user id")
}

struct TestContext {
    db: DbContext,
    directory: DieselDirectoryRepository,
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_database() {
        Ok(db) => {
            let directory = DieselDirectoryRepository::new(db.pool.clone());
            Some(TestContext { db, directory })
        }
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn users_are_found_by_id_and_by_email_in_any_case(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: users_are_found_by_id_and_by_email_in_any_case skipped");
        return;
    };

    let agent = context
        .db
        .block_on(context.directory.find_user(user(2)))
        .expect("find user")
        .expect("user exists");
    assert_eq!(agent.name, "Alan Agent");
    assert_eq!(agent.role, Role::Agent);
    assert_eq!(agent.branch_id, Some(BranchId::new(1).expect("branch id")));

    let by_email = context
        .db
        .block_on(context.directory.find_user_by_email("Agent@Example.COM"))
        .expect("find by email");
    assert_eq!(by_email, Some(agent));

    let missing = context
        .db
        .block_on(context.directory.find_user_by_email("nobody@example.com"))
        .expect("find by email");
    assert!(missing.is_none());
}

#[rstest]
fn bulk_lookup_skips_unknown_ids(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: bulk_lookup_skips_unknown_ids skipped");
        return;
    };

    let names: Vec<String> = context
        .db
        .block_on(context.directory.find_users(&[user(5), user(99), user(1)]))
        .expect("find users")
        .into_iter()
        .map(|found| found.name)
        .collect();
    assert_eq!(names, ["Ada Admin", "Edsger Agent"]);
}

#[rstest]
#[case::manager_with_agents(3, vec![2, 5])]
#[case::manager_without_agents(6, vec![])]
#[case::not_a_manager(2, vec![])]
fn managed_agents_come_from_the_join_table(
    repo_context: Option<TestContext>,
    #[case] manager: i64,
    #[case] expected: Vec<i64>,
) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: managed_agents_come_from_the_join_table skipped");
        return;
    };

    let agents = context
        .db
        .block_on(context.directory.managed_agent_ids(user(manager)))
        .expect("managed agents");
    let expected: Vec<UserId> = expected.into_iter().map(user).collect();
    assert_eq!(agents, expected);
}

#[rstest]
fn reference_names_resolve_or_come_back_empty(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: reference_names_resolve_or_come_back_empty skipped");
        return;
    };
    let directory = &context.directory;
    let db = &context.db;

    let branch = |id| BranchId::new(id).expect("branch id");
    let priority = |id| PriorityId::new(id).expect("priority id");
    let customer = |id| CustomerId::new(id).expect("customer id");

    assert_eq!(
        db.block_on(directory.branch_name(branch(2))).expect("branch"),
        Some("Harbour".to_owned())
    );
    assert_eq!(db.block_on(directory.branch_name(branch(9))).expect("branch"), None);
    assert_eq!(
        db.block_on(directory.priority_name(priority(4))).expect("priority"),
        Some("Urgent".to_owned())
    );
    assert_eq!(
        db.block_on(directory.customer_name(customer(1))).expect("customer"),
        Some("Acme Repairs".to_owned())
    );
    assert_eq!(
        db.block_on(directory.customer_name(customer(3))).expect("customer"),
        None
    );
    assert_eq!(
        db.block_on(directory.status_name(TicketStatus::InProgress))
            .expect("status"),
        Some("In Progress".to_owned())
    );
}
