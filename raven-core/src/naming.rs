//! Short operator-facing names for controller identities.

/// `of:000000000000000a` becomes `s10`, a host MAC ending in `:02` becomes
/// `h2`; anything else is returned unchanged.
pub fn friendly_name(id: &str) -> String {
    if let Some(dpid) = id.strip_prefix("of:") {
        if let Ok(n) = u64::from_str_radix(dpid, 16) {
            return format!("s{n}");
        }
        return id.to_string();
    }

    // Host ids look like `00:00:00:00:00:02/None`.
    let mac = id.split('/').next().unwrap_or(id);
    let octets: Vec<&str> = mac.split(':').collect();
    if octets.len() == 6 {
        if let Some(Ok(n)) = octets.last().map(|o| u8::from_str_radix(o, 16)) {
            return format!("h{n}");
        }
    }
    id.to_string()
}

/// Join friendly names with ` -> `.
pub fn format_path<S: AsRef<str>>(nodes: &[S]) -> String {
    nodes
        .iter()
        .map(|n| friendly_name(n.as_ref()))
        .collect::<Vec<_>>()
        .join(" -> ")
}
