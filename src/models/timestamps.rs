use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

const PLAIN_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// "YYYY-MM-DD HH:MM:SS", the format comment and history timestamps are
/// exposed in.
pub fn format_plain(dt: OffsetDateTime) -> String {
    dt.format(PLAIN_FORMAT).unwrap_or_else(|_| dt.to_string())
}

/// Serde adapter for [`format_plain`], for `#[serde(with = "timestamps::plain")]`.
pub mod plain {
    use serde::Serializer;
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(
        dt: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_plain(*dt))
    }
}
