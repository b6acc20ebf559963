//! Record to event document.

use chrono::Utc;

use super::coerce::{coerce, coerce_consent};
use crate::models::{EventDocument, NamedValue, RawRecord, EVENT_ORIGIN};
use crate::schema::{Group, SchemaDescriptor};

/// Build the event document for one record, stamped with the current time.
pub fn transform_record(record: &RawRecord, schema: &SchemaDescriptor) -> EventDocument {
    transform_record_at(record, schema, Utc::now().timestamp_millis())
}

/// Same as [`transform_record`] with an explicit processing timestamp (ms).
///
/// Group entries keep source column order. Scalars are looked up by exact
/// name; an absent column yields `None`. `job_id` is left unset.
pub fn transform_record_at(
    record: &RawRecord,
    schema: &SchemaDescriptor,
    processing_event_timestamp: i64,
) -> EventDocument {
    let scalar = |name: &str| record.get(name).map(str::to_string);
    let group = |group: Group| {
        schema
            .has_group(group)
            .then(|| collect_group(record, group, coerce))
    };

    EventDocument {
        event_date: scalar("event_date"),
        event_datetime: scalar("event_datetime"),
        event_timestamp: scalar("event_timestamp"),
        processing_event_timestamp,
        event_origin: EVENT_ORIGIN.to_string(),
        job_id: None,
        content_length: scalar("content_length"),
        client_id: scalar("client_id"),
        key: schema.record_key(scalar(schema.key_column)),
        session_id: scalar("session_id"),
        event_name: scalar("event_name"),
        user_data: group(Group::UserData),
        session_data: group(Group::SessionData),
        event_data: collect_group(record, Group::EventData, coerce),
        consent_data: collect_group(record, Group::ConsentData, coerce_consent),
    }
}

fn collect_group<V>(record: &RawRecord, group: Group, coerce: impl Fn(&str) -> V) -> Vec<NamedValue<V>> {
    record
        .iter()
        .filter_map(|(column, raw)| {
            let field = group.field_name(column)?;
            Some(NamedValue::new(field, coerce(raw)))
        })
        .collect()
}
