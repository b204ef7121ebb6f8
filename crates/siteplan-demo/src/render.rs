//! Text output: summary table, per-unit breakdown, ASCII plan, JSON and
//! the saved-design listing.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use siteplan_core::{Catalog, SiteTotals, UnitBreakdown, UnitKind};
use siteplan_layout::{Footprint, LayoutMode, PlacedBattery};
use siteplan_runtime::{DesignRecord, PlannerSession};

/// Horizontal feet per character cell in the ASCII plan.
pub const FEET_PER_CELL: f64 = 2.0;

/// Multi-line summary of totals, footprint and mode.
#[must_use]
pub fn summary(session: &PlannerSession) -> String {
    let totals = session.totals();
    let footprint = session.footprint();
    let canvas = session.canvas_size();

    let mode = if session.is_auto_forced() && !session.auto_pack_preferred() {
        format!(
            "auto (forced at {} items)",
            session.config().auto_pack_threshold
        )
    } else {
        session.effective_mode().to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "mode          {mode}");
    let _ = writeln!(out, "items         {}", session.placements().len());
    let _ = writeln!(out, "batteries     {}", totals.batteries);
    let _ = writeln!(out, "transformers  {}", totals.transformers);
    let _ = writeln!(out, "cost          ${}", thousands(totals.cost));
    let _ = writeln!(out, "energy        {:.1} MWh", totals.energy);
    let _ = writeln!(
        out,
        "footprint     {} ft x {} ft",
        footprint.length, footprint.width
    );
    let _ = writeln!(out, "land area     {} sq ft", thousands(footprint.area()));
    let _ = writeln!(out, "rows          {}", session.row_count());
    let _ = writeln!(out, "canvas        {} x {} px", canvas.width, canvas.height);
    out
}

/// Per-unit cost and energy lines followed by the site totals.
#[must_use]
pub fn breakdown(session: &PlannerSession) -> String {
    let lines = SiteTotals::breakdown(session.catalog(), session.quantities());
    let totals = session.totals();

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14}{:>7}{:>14}{:>16}{:>10}{:>12}",
        "unit", "count", "unit cost", "cost", "MWh/unit", "MWh"
    );
    for line in &lines {
        let _ = writeln!(
            out,
            "{:<14}{:>7}{:>14}{:>16}{:>10.1}{:>12.1}",
            line.id,
            line.count,
            format!("${}", thousands(line.unit_cost)),
            format!("${}", thousands(line.cost)),
            line.unit_energy,
            line.energy
        );
    }
    let _ = writeln!(
        out,
        "{:<14}{:>7}{:>14}{:>16}{:>10}{:>12.1}",
        "total",
        totals.batteries.saturating_add(totals.transformers),
        "",
        format!("${}", thousands(totals.cost)),
        "",
        totals.energy
    );
    out
}

/// One line per saved design, in the order given.
#[must_use]
pub fn design_list(designs: &[DesignRecord]) -> String {
    if designs.is_empty() {
        return "no saved designs\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<20}{:>10}{:>16}{:>10}{:>14}",
        "id", "name", "batteries", "cost", "MWh", "land sq ft"
    );
    for design in designs {
        let id = design.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let _ = writeln!(
            out,
            "{id:>5}  {:<20}{:>10}{:>16}{:>10.1}{:>14}",
            design.name,
            design.total_batteries,
            format!("${}", thousands(design.cost)),
            design.energy,
            thousands(design.land_area())
        );
    }
    out
}

/// One-letter glyph per unit type: batteries `A`, `B`, ... in catalog
/// order, transformers `T`, `U`, ...
fn glyphs(catalog: &Catalog) -> BTreeMap<String, char> {
    let mut battery = b'A';
    let mut transformer = b'T';
    let mut map = BTreeMap::new();
    for unit in catalog.iter() {
        let slot = match unit.kind {
            UnitKind::Battery => &mut battery,
            UnitKind::Transformer => &mut transformer,
        };
        let glyph = if slot.is_ascii_uppercase() {
            char::from(*slot)
        } else {
            '#'
        };
        *slot = slot.saturating_add(1);
        let _ = map.insert(unit.id.clone(), glyph);
    }
    map
}

/// Draw the visible part of the layout, one text line per row.
#[must_use]
pub fn ascii_plan(session: &PlannerSession) -> String {
    let glyphs = glyphs(session.catalog());
    let visible = session.visible();
    let width = (session.config().max_row_width / FEET_PER_CELL).ceil() as usize;

    let mut rows: BTreeMap<usize, Vec<char>> = BTreeMap::new();
    for placed in &visible {
        let line = rows.entry(placed.row).or_default();
        let start = (placed.x / FEET_PER_CELL).round() as usize;
        let cells = ((placed.unit.length / FEET_PER_CELL).round() as usize).max(1);
        if line.len() < start + cells {
            line.resize(start + cells, ' ');
        }
        let glyph = glyphs.get(&placed.unit.id).copied().unwrap_or('?');
        line[start..start + cells].fill(glyph);
    }

    let border = format!("      +{}+", "-".repeat(width));
    let mut out = String::new();
    let _ = writeln!(out, "{border}");
    for (row, line) in &rows {
        let line: String = line.iter().collect();
        let _ = writeln!(out, "{row:>5} |{line:<width$}|");
    }
    let _ = writeln!(out, "{border}");

    let total_rows = session.row_count();
    if visible.len() < session.placements().len()
        && let (Some(first), Some(last)) = (rows.keys().next(), rows.keys().next_back())
    {
        let _ = writeln!(
            out,
            "showing rows {first}-{last} of {total_rows} at scroll {} px",
            session.scroll_top()
        );
    }

    let legend: Vec<String> = session
        .catalog()
        .iter()
        .filter_map(|unit| glyphs.get(&unit.id).map(|g| format!("{g} {}", unit.id)))
        .collect();
    let _ = writeln!(out, "{}", legend.join("  "));
    out
}

#[derive(Serialize)]
struct PlanJson<'a> {
    mode: LayoutMode,
    auto_pack_forced: bool,
    totals: SiteTotals,
    breakdown: Vec<UnitBreakdown>,
    footprint: Footprint,
    land_area: f64,
    rows: usize,
    canvas_width: f64,
    canvas_height: f64,
    visible: usize,
    placements: Vec<PlacementJson<'a>>,
}

#[derive(Serialize)]
struct PlacementJson<'a> {
    id: &'a str,
    unit: &'a str,
    x: f64,
    y: f64,
    row: usize,
    length: f64,
    width: f64,
}

impl<'a> From<&'a PlacedBattery> for PlacementJson<'a> {
    fn from(placed: &'a PlacedBattery) -> Self {
        Self {
            id: &placed.id,
            unit: &placed.unit.id,
            x: placed.x,
            y: placed.y,
            row: placed.row,
            length: placed.unit.length,
            width: placed.unit.width,
        }
    }
}

/// Full placement list plus totals as pretty JSON.
pub fn json(session: &PlannerSession) -> Result<String, serde_json::Error> {
    let footprint = session.footprint();
    let canvas = session.canvas_size();
    let plan = PlanJson {
        mode: session.effective_mode(),
        auto_pack_forced: session.is_auto_forced(),
        totals: session.totals(),
        breakdown: SiteTotals::breakdown(session.catalog(), session.quantities()),
        footprint,
        land_area: footprint.area(),
        rows: session.row_count(),
        canvas_width: canvas.width,
        canvas_height: canvas.height,
        visible: session.visible().len(),
        placements: session.placements().iter().map(PlacementJson::from).collect(),
    };
    let mut out = serde_json::to_string_pretty(&plan)?;
    out.push('\n');
    Ok(out)
}

/// Integer part with `,` separators.
fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteplan_core::LayoutConfig;
    use std::sync::Arc;

    fn session(pairs: &[(&str, u32)], manual: bool) -> PlannerSession {
        let mut session =
            PlannerSession::new(Arc::new(Catalog::standard()), LayoutConfig::default())
                .expect("valid config");
        session.set_auto_pack(!manual);
        for (id, qty) in pairs {
            let _ = session.set_quantity(id, *qty).expect("known unit");
        }
        session
    }

    #[test]
    fn thousands_groups_digits() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1_000.0), "1,000");
        assert_eq!(thousands(1_234_567.4), "1,234,567");
        assert_eq!(thousands(-25_000.0), "-25,000");
    }

    #[test]
    fn glyphs_follow_catalog_order() {
        let glyphs = glyphs(&Catalog::standard());
        assert_eq!(glyphs.get("megapack-xl"), Some(&'A'));
        assert_eq!(glyphs.get("powerpack"), Some(&'D'));
        assert_eq!(glyphs.get("transformer"), Some(&'T'));
    }

    #[test]
    fn summary_reports_totals() {
        let text = summary(&session(&[("megapack", 4)], false));
        assert!(text.contains("mode          auto"));
        assert!(text.contains("batteries     4"));
        assert!(text.contains("transformers  2"));
        assert!(text.contains("cost          $220,000"));
        assert!(text.contains("energy        7.0 MWh"));
    }

    #[test]
    fn summary_flags_forced_auto() {
        let text = summary(&session(&[("powerpack", 700)], true));
        assert!(text.contains("auto (forced at 1000 items)"));
    }

    #[test]
    fn ascii_plan_draws_rows_in_manual_order() {
        // Two XLs and the powerpack fill row 0 to 96 ft; the transformer wraps.
        let plan = ascii_plan(&session(&[("megapack-xl", 2), ("powerpack", 1)], true));
        let lines: Vec<&str> = plan.lines().collect();
        let xl = "A".repeat(20);
        assert!(lines[1].starts_with(&format!("    0 |{xl} {xl} DDDDD")));
        assert!(lines[2].starts_with("    1 |TTTTT "));
        assert!(plan.contains("A megapack-xl"));
        assert!(!plan.contains("showing rows"));
    }

    #[test]
    fn ascii_plan_notes_virtualized_window() {
        let plan = ascii_plan(&session(&[("powerpack", 2_000)], false));
        assert!(plan.contains("showing rows 0-"));
    }

    #[test]
    fn json_lists_every_placement() {
        let session = session(&[("megapack-2", 3)], false);
        let text = json(&session).expect("serialize");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
        assert_eq!(value["mode"], "auto");
        assert_eq!(value["placements"].as_array().map(Vec::len), Some(4));
        assert_eq!(value["totals"]["batteries"], 3);
        assert_eq!(value["placements"][0]["unit"], "megapack-2");
        assert_eq!(value["breakdown"][0]["id"], "megapack-2");
        assert_eq!(value["breakdown"][0]["cost"], 240_000.0);
        assert_eq!(value["breakdown"][1]["count"], 1);
    }

    #[test]
    fn breakdown_lists_each_unit_then_totals() {
        let text = breakdown(&session(&[("megapack", 4), ("powerpack", 1)], false));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("megapack"));
        assert!(lines[1].contains("$50,000"));
        assert!(lines[1].contains("$200,000"));
        assert!(lines[2].starts_with("powerpack"));
        assert!(lines[3].starts_with("transformer"));
        assert!(lines[3].contains("-1.0"));
        // 4 * 50k + 10k + 2 * 10k
        assert!(lines[4].starts_with("total"));
        assert!(lines[4].contains("$230,000"));
        assert!(lines[4].ends_with("8.0"));
    }

    #[test]
    fn design_list_shows_ids_and_names() {
        let mut design = session(&[("megapack-xl", 2)], false).to_design("north");
        design.id = siteplan_runtime::DesignId::new(7);
        let text = design_list(&[design]);
        let row = text.lines().nth(1).expect("one design row");
        assert!(row.trim_start().starts_with("7  north"));
        assert!(row.contains("$250,000"));
        assert_eq!(design_list(&[]), "no saved designs\n");
    }
}
