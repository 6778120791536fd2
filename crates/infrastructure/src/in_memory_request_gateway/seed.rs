use chrono::{DateTime, Duration, TimeZone, Utc};
use opshub_domain::{AuditEvent, AuditEventId, Role, USER_ENTITY_TYPE, User, UserId, UserStatus};
use serde_json::json;

struct SeedUser {
    id: i64,
    first_name: &'static str,
    last_name: &'static str,
    status: UserStatus,
    role: Role,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        id: 1,
        first_name: "Ada",
        last_name: "Lovelace",
        status: UserStatus::Active,
        role: Role::Admin,
    },
    SeedUser {
        id: 2,
        first_name: "Grace",
        last_name: "Hopper",
        status: UserStatus::Active,
        role: Role::Manager,
    },
    SeedUser {
        id: 3,
        first_name: "Alan",
        last_name: "Turing",
        status: UserStatus::Active,
        role: Role::User,
    },
    SeedUser {
        id: 4,
        first_name: "Edsger",
        last_name: "Dijkstra",
        status: UserStatus::Disabled,
        role: Role::User,
    },
    SeedUser {
        id: 5,
        first_name: "Barbara",
        last_name: "Liskov",
        status: UserStatus::Active,
        role: Role::Manager,
    },
    SeedUser {
        id: 6,
        first_name: "Donald",
        last_name: "Knuth",
        status: UserStatus::Active,
        role: Role::User,
    },
    SeedUser {
        id: 7,
        first_name: "Margaret",
        last_name: "Hamilton",
        status: UserStatus::Disabled,
        role: Role::User,
    },
    SeedUser {
        id: 8,
        first_name: "Ken",
        last_name: "Thompson",
        status: UserStatus::Active,
        role: Role::User,
    },
];

fn seed_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn email_for(seed: &SeedUser) -> String {
    format!("{}.{}@opshub.dev", seed.first_name, seed.last_name).to_lowercase()
}

fn created_at(seed: &SeedUser) -> DateTime<Utc> {
    seed_epoch() + Duration::days(seed.id)
}

pub(super) fn demo_users() -> Vec<User> {
    SEED_USERS
        .iter()
        .map(|seed| User {
            id: UserId::new(seed.id),
            email: email_for(seed),
            first_name: seed.first_name.to_owned(),
            last_name: seed.last_name.to_owned(),
            status: seed.status,
            role: Some(seed.role),
            created_at: Some(created_at(seed)),
        })
        .collect()
}

pub(super) fn demo_audit_events() -> Vec<AuditEvent> {
    let admin = Some(UserId::new(1));
    let mut events = Vec::new();

    for seed in SEED_USERS {
        let email = email_for(seed);
        events.push(AuditEvent {
            id: AuditEventId::new(0),
            occurred_at: created_at(seed),
            actor_user_id: (seed.id != 1).then_some(UserId::new(1)),
            action: "USER_CREATED".to_owned(),
            entity_type: USER_ENTITY_TYPE.to_owned(),
            entity_id: seed.id.to_string(),
            summary: format!("User created: {email}"),
            metadata: json!({ "email": email }),
        });

        if seed.status == UserStatus::Disabled {
            events.push(AuditEvent {
                id: AuditEventId::new(0),
                occurred_at: created_at(seed) + Duration::hours(6),
                actor_user_id: admin,
                action: "USER_DISABLED".to_owned(),
                entity_type: USER_ENTITY_TYPE.to_owned(),
                entity_id: seed.id.to_string(),
                summary: format!("User disabled: {email}"),
                metadata: json!({ "email": email }),
            });
        }
    }

    events.sort_by_key(|event| event.occurred_at);
    for (index, event) in events.iter_mut().enumerate() {
        let id = i64::try_from(index).unwrap_or(i64::MAX).saturating_add(1);
        event.id = AuditEventId::new(id);
    }

    events
}
