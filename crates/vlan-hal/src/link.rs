//! Parser for `ip -o link show` output.
//!
//! One-line mode prints each link as
//!
//! ```text
//! 7: eth0.100@eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue master brlan0 state UP mode DEFAULT group default qlen 1000\    link/ether 00:11:22:33:44:55 brd ff:ff:ff:ff:ff:ff
//! ```

use serde::Serialize;

/// One link as reported by `ip -o link show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    /// Interface index.
    pub index: u32,
    /// Device name without the `@parent` suffix.
    pub name: String,
    /// Lower device for stacked links (`eth0` for `eth0.100@eth0`).
    pub parent: Option<String>,
    /// Bridge the device is enslaved to.
    pub master: Option<String>,
    /// Flags between the angle brackets.
    pub flags: Vec<String>,
    /// Operational state (`UP`, `DOWN`, `UNKNOWN`, ...).
    pub state: Option<String>,
}

impl LinkInfo {
    /// Returns true if the administrative UP flag is set.
    pub fn is_up(&self) -> bool {
        self.flags.iter().any(|f| f == "UP")
    }
}

/// Parses a single `ip -o link` line. Returns `None` for lines that do
/// not carry a link header.
pub fn parse_link_line(line: &str) -> Option<LinkInfo> {
    let (index, rest) = line.trim().split_once(": ")?;
    let index = index.trim().parse().ok()?;
    let (full_name, rest) = rest.split_once(": ")?;

    let (name, parent) = match full_name.split_once('@') {
        Some((name, parent)) => (name, Some(parent.to_string())),
        None => (full_name, None),
    };

    let flags = rest
        .strip_prefix('<')
        .and_then(|r| r.split_once('>'))
        .map(|(flags, _)| {
            flags
                .split(',')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // Attributes stop at the `\` that separates the link/ether line.
    let attrs = rest.split('\\').next().unwrap_or(rest);
    let tokens: Vec<&str> = attrs.split_whitespace().collect();
    let value_of = |key: &str| {
        tokens
            .windows(2)
            .find(|w| w[0] == key)
            .map(|w| w[1].to_string())
    };

    Some(LinkInfo {
        index,
        name: name.to_string(),
        parent,
        master: value_of("master"),
        flags,
        state: value_of("state"),
    })
}

/// Parses the full output of `ip -o link show`.
pub fn parse_links(output: &str) -> Vec<LinkInfo> {
    output.lines().filter_map(parse_link_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VLAN_LINE: &str = r"7: eth0.100@eth0: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue master brlan0 state UP mode DEFAULT group default qlen 1000\    link/ether 00:11:22:33:44:55 brd ff:ff:ff:ff:ff:ff";

    #[test]
    fn test_parse_vlan_member() {
        let link = parse_link_line(VLAN_LINE).unwrap();
        assert_eq!(link.index, 7);
        assert_eq!(link.name, "eth0.100");
        assert_eq!(link.parent.as_deref(), Some("eth0"));
        assert_eq!(link.master.as_deref(), Some("brlan0"));
        assert_eq!(link.state.as_deref(), Some("UP"));
        assert!(link.is_up());
    }

    #[test]
    fn test_parse_bridge_without_master() {
        let line = r"4: brlan0: <BROADCAST,MULTICAST> mtu 1500 qdisc noop state DOWN mode DEFAULT group default qlen 1000\    link/ether 0a:0b:0c:0d:0e:0f brd ff:ff:ff:ff:ff:ff";
        let link = parse_link_line(line).unwrap();
        assert_eq!(link.name, "brlan0");
        assert_eq!(link.parent, None);
        assert_eq!(link.master, None);
        assert!(!link.is_up());
    }

    #[test]
    fn test_parse_links_skips_garbage() {
        let output = format!("{}\nDevice \"eth9\" does not exist.\n\n", VLAN_LINE);
        let links = parse_links(&output);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "eth0.100");
    }
}
