use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

use material_script::prelude::*;

/// Whether a report lets the lint run succeed
pub fn passes(report: &Report, deny_warnings: bool) -> bool {
    !report.has_errors() && !(deny_warnings && report.warning_count() > 0)
}

/// One line per diagnostic followed by a summary line
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for diagnostic in &report.diagnostics {
        let _ = writeln!(out, "{diagnostic}");
    }
    let _ = writeln!(
        out,
        "{} material(s) in {} file(s): {} error(s), {} warning(s)",
        report.materials,
        report.files,
        report.error_count(),
        report.warning_count()
    );
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: usize,
    materials: usize,
    errors: usize,
    warnings: usize,
    diagnostics: &'a [Diagnostic],
}

/// Report as pretty-printed JSON with error and warning totals
pub fn render_json(report: &Report) -> Result<String> {
    let json = JsonReport {
        files: report.files,
        materials: report.materials,
        errors: report.error_count(),
        warnings: report.warning_count(),
        diagnostics: &report.diagnostics,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Aligned table of name, mapTo slot and declaration site, sorted by name
pub fn render_listing(library: &MaterialLibrary) -> String {
    let rows: Vec<(&str, &str, String)> = library
        .names()
        .into_iter()
        .filter_map(|name| library.get(name))
        .map(|m| (m.name.as_str(), m.map_to.as_str(), m.location.to_string()))
        .collect();

    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max("NAME".len());
    let slot_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max("MAPTO".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<name_width$}  {:<slot_width$}  DECLARED", "NAME", "MAPTO");
    for (name, slot, location) in rows {
        let _ = writeln!(out, "{name:<name_width$}  {slot:<slot_width$}  {location}");
    }
    out
}
