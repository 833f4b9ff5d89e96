//! `--list-protocols` output.

use std::io::{self, Write};

use snoopy_core::ProtocolRegistry;

/// Print every protocol name, or one protocol's fields and subprotocols.
pub fn list_protocols<W: Write>(
    registry: &ProtocolRegistry,
    name: Option<&str>,
    out: &mut W,
) -> io::Result<()> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        writeln!(out, "protocols:")?;
        for (_, protocol) in registry.iter() {
            writeln!(out, "  {}", protocol.name())?;
        }
        return Ok(());
    };

    let Some(protocol) = registry.get_by_name(name) else {
        writeln!(out, "unknown protocol {name}")?;
        return Ok(());
    };

    let fields = protocol.fields();
    if !fields.is_empty() {
        writeln!(out, "{}'s filter attributes:", protocol.name())?;
        let width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        for field in fields {
            writeln!(out, "  {:<width$} - {}", field.name, field.help)?;
        }
    }

    let mux = protocol.mux();
    if !mux.is_empty() {
        writeln!(out, "{}'s subprotos:", protocol.name())?;
        for entry in mux {
            writeln!(
                out,
                "  {} {}",
                protocol.format_mux_value(entry.value),
                entry.name
            )?;
        }
    }
    Ok(())
}
