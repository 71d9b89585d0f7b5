use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};

pub(crate) fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub(crate) fn format_offset(value: OffsetDateTime) -> String {
    let utc = value.to_offset(UtcOffset::UTC);
    utc.format(&Rfc3339).unwrap_or_else(|_| utc.to_string())
}

pub(crate) fn format_optional(value: Option<OffsetDateTime>) -> Option<String> {
    value.map(format_offset)
}
