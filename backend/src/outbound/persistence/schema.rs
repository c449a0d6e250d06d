//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Branch offices; reference data.
    branches (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    /// Priority levels; reference data.
    priorities (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    /// Display names for the four status codes.
    statuses (code) {
        code -> Int2,
        name -> Varchar,
    }
}

diesel::table! {
    /// Helpdesk users. `role` holds the role code (1 admin, 2 agent,
    /// 3 manager, 4 branch admin).
    users (id) {
        id -> Int8,
        name -> Varchar,
        email -> Varchar,
        role -> Int2,
        branch_id -> Nullable<Int8>,
    }
}

diesel::table! {
    customers (id) {
        id -> Int8,
        name -> Varchar,
        branch_id -> Nullable<Int8>,
    }
}

diesel::table! {
    /// Which agents each manager supervises.
    manager_agents (manager_id, agent_id) {
        manager_id -> Int8,
        agent_id -> Int8,
    }
}

diesel::table! {
    /// Tickets, including soft-deleted ones.
    tickets (id) {
        id -> Int8,
        /// `TKT` or `ONS` followed by seven digits; unique.
        tracking_number -> Varchar,
        slug -> Varchar,
        issue -> Varchar,
        description -> Nullable<Text>,
        priority_id -> Nullable<Int8>,
        status -> Int2,
        /// `In Shop` or `On Site`.
        ticket_type -> Varchar,
        due_date -> Nullable<Timestamptz>,
        closed_at -> Nullable<Timestamptz>,
        customer_id -> Nullable<Int8>,
        created_by -> Int8,
        branch_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Set when the ticket is trashed.
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    ticket_agents (ticket_id, user_id) {
        ticket_id -> Int8,
        user_id -> Int8,
    }
}

diesel::table! {
    ticket_notify_users (ticket_id, user_id) {
        ticket_id -> Int8,
        user_id -> Int8,
    }
}

diesel::table! {
    /// Label catalogue; names are unique.
    labels (id) {
        id -> Int8,
        name -> Varchar,
        color -> Varchar,
    }
}

diesel::table! {
    ticket_labels (ticket_id, label_id) {
        ticket_id -> Int8,
        label_id -> Int8,
    }
}

diesel::table! {
    /// Append-only audit log.
    activities (id) {
        id -> Int8,
        ticket_id -> Int8,
        task_id -> Nullable<Int8>,
        kind -> Varchar,
        note -> Text,
        extra -> Nullable<Jsonb>,
        created_by -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_labels -> labels (label_id));
diesel::joinable!(ticket_labels -> tickets (ticket_id));
diesel::joinable!(ticket_agents -> tickets (ticket_id));
diesel::joinable!(ticket_notify_users -> tickets (ticket_id));
diesel::joinable!(activities -> tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(
    activities,
    branches,
    customers,
    labels,
    manager_agents,
    priorities,
    statuses,
    ticket_agents,
    ticket_labels,
    ticket_notify_users,
    tickets,
    users,
);
