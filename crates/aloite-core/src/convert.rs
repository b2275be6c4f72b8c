use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use aloite_db::models::{InitiativeRow, SignatureRow, UserRow};
use aloite_types::models::{Engagement, InitiativeSummary, User};

use crate::authz::InitiativeFacts;

pub(crate) fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    match raw.parse() {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Corrupt date '{}': {}", raw, e);
            None
        }
    }
}

pub(crate) fn user_from_row(row: UserRow) -> User {
    User {
        id: parse_id(&row.id, "user"),
        created_at: parse_timestamp(&row.created_at),
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        is_admin: row.is_admin,
    }
}

pub(crate) fn summary_from_row(row: InitiativeRow) -> InitiativeSummary {
    InitiativeSummary {
        id: parse_id(&row.id, "initiative"),
        creator_id: parse_id(&row.creator_id, "creator"),
        created_at: parse_timestamp(&row.created_at),
        start_date: parse_date(row.start_date.as_deref()),
        end_date: parse_date(row.end_date.as_deref()),
        title: row.title,
        description: row.description,
        creator_username: row.creator_username,
        active: row.active,
        deleted: row.deleted,
        has_image: row.has_image,
        engagement_count: row.signature_count.max(0) as u64,
    }
}

pub(crate) fn engagement_from_row(row: SignatureRow) -> Engagement {
    Engagement {
        user_id: parse_id(&row.user_id, "user"),
        initiative_id: parse_id(&row.initiative_id, "initiative"),
        signed_at: parse_timestamp(&row.signed_at),
        username: row.username,
    }
}

pub(crate) fn facts(row: &InitiativeRow) -> InitiativeFacts {
    InitiativeFacts {
        creator_id: parse_id(&row.creator_id, "creator"),
        active: row.active,
        deleted: row.deleted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let ts = parse_timestamp("2024-05-06 07:08:09");
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 5, 6));
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (7, 8, 9));

        let ts = parse_timestamp("2024-05-06T07:08:09Z");
        assert_eq!(ts.hour(), 7);

        assert_eq!(parse_timestamp("yesterday"), DateTime::<Utc>::default());
    }

    #[test]
    fn corrupt_ids_fall_back_to_nil() {
        assert_eq!(parse_id("not-a-uuid", "user"), Uuid::nil());
    }
}
