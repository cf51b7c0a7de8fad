//! Plain-text rendering of API responses.
//!
//! Keys are right-aligned to a common margin and emboldened when the terminal
//! supports it; `console` turns styling off when stdout is not a terminal.

use console::style;
use serde_json::Value;
use std::io::{self, Write};

fn key(name: &str, width: usize) -> String {
    style(format!("{:>width$}", name, width = width))
        .bold()
        .to_string()
}

/// Strings print bare; everything else as compact JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Unwraps `{"values": [...]}` collections.
fn values(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => match map.get("values") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Prints every field of `value` as `key: value`, skipping `exclude`.
pub fn print_dict(out: &mut dyn Write, value: &Value, exclude: &[&str]) -> io::Result<()> {
    let Value::Object(map) = value else {
        if !value.is_null() {
            writeln!(out, "{}", scalar(value))?;
        }
        return Ok(());
    };

    let margin = map.keys().map(|k| k.len()).max().unwrap_or(0) + 1;
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    for name in keys {
        if exclude.contains(&name.as_str()) {
            continue;
        }
        let val = &map[name.as_str()];
        match name.as_str() {
            "addresses" => {
                writeln!(out, "{}:", key(name, margin))?;
                print_addresses(out, &values(val), margin)?;
            }
            "servers" => {
                let ids: Vec<String> = values(val).iter().map(scalar).collect();
                writeln!(out, "{}: {}", key(name, margin), ids.join(", "))?;
            }
            _ => writeln!(out, "{}: {}", key(name, margin), scalar(val))?,
        }
    }
    Ok(())
}

/// Prints `id name` per item, followed by the remaining fields when `detail` is set.
pub fn print_items(out: &mut dyn Write, items: &[Value], detail: bool) -> io::Result<()> {
    for item in items {
        let id = item.get("id").map(scalar).unwrap_or_default();
        let name = item.get("name").map(scalar).unwrap_or_default();
        writeln!(out, "{} {}", style(id).bold(), name)?;
        if detail {
            print_dict(out, item, &["id", "name"])?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Prints network attachments, indented past `margin`.
pub fn print_addresses(out: &mut dyn Write, addresses: &[Value], margin: usize) -> io::Result<()> {
    for address in addresses {
        let id = address.get("id").map(scalar).unwrap_or_default();
        let net = if id == "public" {
            id
        } else {
            let name = address.get("name").map(scalar).unwrap_or_default();
            format!("{}/{}", id, name)
        };
        writeln!(out, "{}:", key(&net, margin + 4))?;

        if let Some(mac) = address.get("mac") {
            writeln!(out, "{}: {}", key("ether", margin + 8), scalar(mac))?;
        }
        if let Some(profile) = address.get("firewallProfile") {
            writeln!(out, "{}: {}", key("firewall", margin + 8), scalar(profile))?;
        }
        for ip in address.get("values").map(values).unwrap_or_default() {
            let kind = match ip.get("version").and_then(Value::as_u64) {
                Some(4) => "inet",
                _ => "inet6",
            };
            let addr = ip.get("addr").map(scalar).unwrap_or_default();
            writeln!(out, "{}: {}", key(kind, margin + 8), addr)?;
        }
    }
    Ok(())
}

/// Prints response headers as `name: value`, aligned.
pub fn print_headers(out: &mut dyn Write, headers: &[(String, String)]) -> io::Result<()> {
    let margin = headers.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (name, value) in headers {
        writeln!(out, "{}: {}", key(name, margin), value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        console::set_colors_enabled(false);
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_print_dict_aligns_and_sorts() {
        let out = render(|o| print_dict(o, &json!({"name": "web", "id": 7, "status": "ACTIVE"}), &[]));
        assert_eq!(out, "     id: 7\n   name: web\n status: ACTIVE\n");
    }

    #[test]
    fn test_print_dict_exclude() {
        let out = render(|o| {
            print_dict(o, &json!({"serverRef": 1, "cpuBar": "http://x/cpu"}), &["serverRef"])
        });
        assert_eq!(out, "    cpuBar: http://x/cpu\n");
    }

    #[test]
    fn test_print_dict_servers_and_addresses() {
        let value = json!({
            "servers": {"values": [1, 2]},
            "addresses": {"values": [
                {"id": "public", "values": [{"version": 4, "addr": "10.0.0.1"}]}
            ]}
        });
        let out = render(|o| print_dict(o, &value, &[]));
        assert!(out.contains("   servers: 1, 2\n"));
        assert!(out.contains(" addresses:\n"));
        assert!(out.contains("        public:\n"));
        assert!(out.contains("inet: 10.0.0.1\n"));
    }

    #[test]
    fn test_print_items() {
        let items = vec![json!({"id": 1, "name": "a", "ram": 512}), json!({"id": 2})];
        assert_eq!(render(|o| print_items(o, &items, false)), "1 a\n2 \n");

        let detailed = render(|o| print_items(o, &items[..1], true));
        assert_eq!(detailed, "1 a\n  ram: 512\n\n");
    }

    #[test]
    fn test_print_addresses_private_network() {
        let addresses = vec![json!({
            "id": "42",
            "name": "lan",
            "mac": "aa:bb",
            "firewallProfile": "DISABLED",
            "values": [{"version": 6, "addr": "::1"}]
        })];
        let out = render(|o| print_addresses(o, &addresses, 3));
        assert_eq!(
            out,
            " 42/lan:\n      ether: aa:bb\n   firewall: DISABLED\n      inet6: ::1\n"
        );
    }

    #[test]
    fn test_print_headers() {
        let headers = vec![
            ("x-account-bytes-used".to_string(), "10".to_string()),
            ("date".to_string(), "today".to_string()),
        ];
        let out = render(|o| print_headers(o, &headers));
        assert_eq!(
            out,
            "x-account-bytes-used: 10\n                date: today\n"
        );
    }
}
