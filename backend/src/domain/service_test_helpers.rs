//! Shared fixtures for domain service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{
    Actor, BranchId, Role, Ticket, TicketId, TicketStatus, TicketType, TrackingNumber, UserId,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn user(raw: i64) -> UserId {
    UserId::new(raw).expect("user id")
}

pub(crate) fn branch(raw: i64) -> BranchId {
    BranchId::new(raw).expect("branch id")
}

pub(crate) fn ticket_id(raw: i64) -> TicketId {
    TicketId::new(raw).expect("ticket id")
}

pub(crate) fn admin() -> Actor {
    Actor::new(user(1), Role::Admin, None)
}

pub(crate) fn agent(raw: i64) -> Actor {
    Actor::new(user(raw), Role::Agent, Some(branch(1)))
}

pub(crate) fn manager(raw: i64) -> Actor {
    Actor::new(user(raw), Role::Manager, None)
}

/// A live, open in-shop ticket created by user 2 in branch 1.
pub(crate) fn sample_ticket(id: i64) -> Ticket {
    let created = Utc
        .with_ymd_and_hms(2025, 6, 1, 8, 0, 0)
        .single()
        .expect("valid creation time");
    let tracking_number =
        TrackingNumber::allocate(TicketType::InShop, id.unsigned_abs()).expect("tracking number");
    Ticket {
        id: ticket_id(id),
        slug: format!("printer-jam-{}", tracking_number.as_str().to_lowercase()),
        tracking_number,
        issue: "Printer jam".to_owned(),
        description: None,
        priority_id: None,
        status: TicketStatus::Open,
        ticket_type: TicketType::InShop,
        due_date: None,
        closed_at: None,
        customer_id: None,
        created_by: user(2),
        branch_id: Some(branch(1)),
        created_at: created,
        updated_at: created,
        deleted_at: None,
    }
}
