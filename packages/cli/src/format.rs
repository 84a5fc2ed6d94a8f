//! Plain-text rendering of impact reports.
//!
//! Numbers follow Brazilian conventions: `.` groups thousands, `,` marks
//! decimals, and large values are compacted with K/M/B/T suffixes.

use std::fmt::{self, Write};

use flood_map_analytics_models::{
    CategorySummary, CountComparison, GroupedMetricRow, ImpactReport, MetricComparison,
};

/// Affected items listed per layer before the rest is summarized.
const LIST_LIMIT: usize = 15;

/// Formats `value` with `decimals` fractional digits in pt-BR style
/// (`1234.5` → `"1.234,5"`).
#[must_use]
pub fn pt_number(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = formatted
        .split_once('.')
        .map_or((formatted.as_str(), None), |(i, f)| (i, Some(f)));

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) => format!("{sign}{grouped},{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Compacts large values (`1_500` → `"1,5 K"`, `2_300_000` → `"2,3 M"`).
/// Values under a thousand are shown whole.
#[must_use]
pub fn compact_br(value: f64) -> String {
    let magnitude = value.abs();
    let suffixes = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    suffixes
        .iter()
        .find(|(threshold, _)| magnitude >= *threshold)
        .map_or_else(
            || pt_number(value, 0),
            |(threshold, suffix)| format!("{} {suffix}", pt_number(value / threshold, 1)),
        )
}

/// Compact currency (`"R$ 1,5 M"`).
#[must_use]
pub fn money_br(value: f64) -> String {
    format!("R$ {}", compact_br(value))
}

/// Whole-number percentage, ties to even (`66.67` → `"67%"`).
#[must_use]
pub fn pct_int(value: f64) -> String {
    if value.is_finite() {
        format!("{:.0}%", value.round_ties_even())
    } else {
        "0%".to_string()
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(count: u64) -> f64 {
    count as f64
}

fn count_line(out: &mut impl Write, label: &str, c: &CountComparison, active: bool) -> fmt::Result {
    if active {
        writeln!(
            out,
            "  {label}: {} de {} ({})",
            compact_br(as_f64(c.affected)),
            compact_br(as_f64(c.total)),
            pct_int(c.percentage)
        )
    } else {
        writeln!(out, "  {label}: {}", compact_br(as_f64(c.total)))
    }
}

fn metric_line(
    out: &mut impl Write,
    label: &str,
    m: &MetricComparison,
    active: bool,
    render: fn(f64) -> String,
) -> fmt::Result {
    if active {
        writeln!(
            out,
            "  {label}: {} de {} ({})",
            render(m.affected),
            render(m.total),
            pct_int(m.percentage)
        )
    } else {
        writeln!(out, "  {label}: {}", render(m.total))
    }
}

/// Means are not shares of a whole, so the affected value is shown next to
/// the total without a percentage.
fn mean_line(
    out: &mut impl Write,
    label: &str,
    m: &MetricComparison,
    active: bool,
    render: fn(f64) -> String,
) -> fmt::Result {
    if active {
        writeln!(
            out,
            "  {label}: {} de {} no Total",
            render(m.affected),
            render(m.total)
        )
    } else {
        writeln!(out, "  {label}: {}", render(m.total))
    }
}

fn summary_block(
    out: &mut impl Write,
    title: &str,
    summary: &CategorySummary,
    active: bool,
) -> fmt::Result {
    if summary.is_empty() {
        return Ok(());
    }

    writeln!(out, "  {title}:")?;
    for row in &summary.rows {
        if active {
            writeln!(
                out,
                "    {}: {} / {} ({})",
                row.label,
                compact_br(as_f64(row.affected)),
                compact_br(as_f64(row.total)),
                pct_int(row.percentage)
            )?;
        } else {
            writeln!(out, "    {}: {}", row.label, compact_br(as_f64(row.total)))?;
        }
    }
    Ok(())
}

fn grouped_block(
    out: &mut impl Write,
    title: &str,
    rows: &[GroupedMetricRow],
    metric_label: &str,
    active: bool,
) -> fmt::Result {
    if rows.is_empty() {
        return Ok(());
    }

    writeln!(out, "  {title}:")?;
    for row in rows {
        if active {
            writeln!(
                out,
                "    {}: {} / {} ({}), {metric_label} {} / {}",
                row.label,
                compact_br(as_f64(row.count.affected)),
                compact_br(as_f64(row.count.total)),
                pct_int(row.count.percentage),
                compact_br(row.metric.affected),
                compact_br(row.metric.total)
            )?;
        } else {
            writeln!(
                out,
                "    {}: {}, {metric_label} {}",
                row.label,
                compact_br(as_f64(row.count.total)),
                compact_br(row.metric.total)
            )?;
        }
    }
    Ok(())
}

fn item_list<T>(
    out: &mut impl Write,
    title: &str,
    items: &[T],
    describe: impl Fn(&T) -> String,
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }

    writeln!(out, "  {title}:")?;
    for item in items.iter().take(LIST_LIMIT) {
        writeln!(out, "    - {}", describe(item))?;
    }
    if items.len() > LIST_LIMIT {
        writeln!(out, "    ... e mais {}", items.len() - LIST_LIMIT)?;
    }
    Ok(())
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes a full report under `title`.
///
/// # Errors
///
/// Propagates write failures from `out`.
#[allow(clippy::too_many_lines)]
pub fn render_report(out: &mut impl Write, title: &str, report: &ImpactReport) -> fmt::Result {
    let active = report.hazard_active;

    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(title.chars().count()))?;
    if !active {
        writeln!(out, "Sem cenário de inundação ativo: apenas totais.")?;
    }

    if let Some(c) = &report.companies {
        writeln!(out, "\nEmpresas")?;
        count_line(out, "Empresas", &c.companies, active)?;
        metric_line(out, "Empregados", &c.employees, active, compact_br)?;
        metric_line(out, "Massa salarial", &c.payroll, active, money_br)?;
        mean_line(out, "Média salarial", &c.mean_salary, active, money_br)?;
        summary_block(out, "Por seção", &c.by_sector, active)?;
    }

    if let Some(h) = &report.health {
        writeln!(out, "\nSaúde")?;
        count_line(out, "Estabelecimentos", &h.units, active)?;
        summary_block(out, "Por tipo", &h.by_type, active)?;
        item_list(out, "Estabelecimentos atingidos", &h.affected_units, |u| {
            format!(
                "{} ({})",
                u.name,
                join_non_empty(&[u.kind.as_str(), u.neighborhood.as_str(), u.address.as_str()])
            )
        })?;
    }

    if let Some(e) = &report.education {
        writeln!(out, "\nEducação")?;
        count_line(out, "Escolas", &e.schools, active)?;
        metric_line(out, "Funcionários", &e.staff, active, compact_br)?;
        metric_line(out, "Matrículas infantil", &e.enrollment_infant, active, compact_br)?;
        metric_line(out, "Matrículas fundamental", &e.enrollment_elementary, active, compact_br)?;
        metric_line(out, "Matrículas médio", &e.enrollment_high_school, active, compact_br)?;
        metric_line(out, "Matrículas técnico", &e.enrollment_technical, active, compact_br)?;
        grouped_block(out, "Por dependência", &e.by_dependency, "funcionários", active)?;
        item_list(out, "Escolas atingidas", &e.affected_schools, |s| {
            format!("{} ({}, {} funcionários)", s.name, s.dependency, pt_number(s.staff, 0))
        })?;
    }

    for (heading, impact) in [
        ("Prédios públicos", &report.public_buildings),
        ("Segurança", &report.security),
    ] {
        if let Some(b) = impact {
            writeln!(out, "\n{heading}")?;
            count_line(out, "Prédios", &b.buildings, active)?;
            summary_block(out, "Por tipo", &b.by_type, active)?;
            item_list(out, "Prédios atingidos", &b.affected_buildings, |row| {
                format!("{} ({})", row.name, join_non_empty(&[row.kind.as_str(), row.address.as_str()]))
            })?;
        }
    }

    if let Some(s) = &report.streets {
        writeln!(out, "\nLogradouros")?;
        count_line(out, "Segmentos", &s.segments, active)?;
        count_line(out, "Ruas", &s.streets, active)?;
        count_line(out, "Com drenagem", &s.drainage, active)?;
        count_line(out, "Com iluminação", &s.lighting, active)?;
        item_list(out, "Ruas atingidas", &s.affected_streets, |r| {
            format!("{} ({} segmentos)", r.street_id, r.segments)
        })?;
    }

    if let Some(p) = &report.parcels {
        writeln!(out, "\nTerrenos")?;
        count_line(out, "Terrenos", &p.parcels, active)?;
        count_line(out, "Com água", &p.water, active)?;
        count_line(out, "Com coleta de lixo", &p.garbage_collection, active)?;
        count_line(out, "Com esgoto pluvial", &p.storm_sewer, active)?;
        count_line(out, "Em condomínio", &p.condominium, active)?;
        count_line(out, "Esgoto cloacal", &p.sewage_network, active)?;
        count_line(out, "Fossa séptica", &p.sewage_septic, active)?;
    }

    if let Some(b) = &report.blocks {
        writeln!(out, "\nQuadras")?;
        count_line(out, "Quadras", &b.blocks, active)?;
    }

    if let Some(r) = &report.real_estate {
        writeln!(out, "\nImóveis")?;
        count_line(out, "Unidades", &r.units, active)?;
        count_line(out, "Em condomínio", &r.condominium, active)?;
        summary_block(out, "Por uso", &r.by_use, active)?;
        summary_block(out, "Por patrimônio", &r.by_ownership, active)?;
    }

    Ok(())
}
