//! Archive entry name sanitizer
//!
//! Downstream systems choke on entry names outside printable 7-bit ASCII.
//! Stripping can make two different names collide, so a name that was
//! changed gets its final archive position prepended; the position keeps
//! stripped siblings distinguishable and ties the name to one slot.
//!
//! Callers must pass the position the entry will actually occupy in the
//! archive. The manifest reuses these names, and the two must agree.

/// Keep printable 7-bit ASCII only; prefix `"{position}_"` when stripping
/// changed the name. Pure function.
pub fn sanitize(name: &str, position: usize) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| matches!(c, ' '..='~'))
        .collect();

    if stripped == name {
        name.to_string()
    } else {
        format!("{}_{}", position, stripped)
    }
}
