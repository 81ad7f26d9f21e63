pub const TICKET_PREFIX: &str = "COMP-";

/// Renders a sequence value as a public ticket number. Values are zero-padded
/// to six digits and grow wider past COMP-999999 instead of wrapping.
pub fn format_ticket_number(seq: i64) -> String {
    format!("{TICKET_PREFIX}{seq:06}")
}
