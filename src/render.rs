//! Server-side HTML for the dashboard page.
//!
//! The node table is a radio form that reloads the page with `?row=N`; the
//! donut is inline SVG so the page needs no scripts beyond the submit hook.

use crate::db::NodeSummary;
use crate::presenter::{DonutChart, GenderSection, NodeView, RenderOutput, RowsTable};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::f64::consts::PI;
use std::fmt::Write;

const SLICE_COLORS: [&str; 3] = ["#636efa", "#EF553B", "#00cc96"];
const CHART_SIZE: f64 = 360.0;
const OUTER_RADIUS: f64 = 150.0;

const STYLE: &str = "
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;margin:24px;color:#222}
h1{text-align:center}
table{border-collapse:collapse;width:100%;font-size:13px}
th,td{border:1px solid #ddd;padding:4px 8px;text-align:left}
th{background:#f4f4f8}
tr.selected td{background:#eef1ff}
td.null{color:#aaa}
.scroll-y{height:300px;overflow-y:auto}
.scroll-x{overflow-x:auto}
.donut text{font-size:12px;fill:#fff;text-anchor:middle}
.donut .chart-title{fill:#222;font-size:15px}
";

pub fn render_page(
    page_title: &str,
    nodes: &[NodeSummary],
    selected_row: Option<usize>,
    output: &RenderOutput,
) -> String {
    let title = encode_text(page_title);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", title);
    let _ = writeln!(html, "<style>{}</style>", STYLE);
    html.push_str("</head>\n<body>\n");
    let _ = writeln!(html, "<h1>{}</h1>", title);

    html.push_str("<div style=\"margin-bottom:20px\">\n<h3>All Nodes</h3>\n");
    html.push_str(&render_node_table(nodes, selected_row));
    html.push_str("</div>\n");

    html.push_str(&render_selection(output));
    html.push_str("</body>\n</html>\n");
    html
}

/// The selectable table of all nodes.
pub fn render_node_table(nodes: &[NodeSummary], selected_row: Option<usize>) -> String {
    let mut html = String::new();
    html.push_str("<form id=\"all-nodes-table\" method=\"get\" action=\"/\" class=\"scroll-y\">\n");
    html.push_str("<table>\n<thead><tr><th></th><th>NodeId</th><th>Title</th><th>NationalIdCount</th></tr></thead>\n<tbody>\n");
    for (i, node) in nodes.iter().enumerate() {
        let selected = selected_row == Some(i);
        let _ = writeln!(
            html,
            "<tr{}><td><input type=\"radio\" name=\"row\" value=\"{}\"{} onchange=\"this.form.submit()\"></td><td>{}</td><td>{}</td><td>{}</td></tr>",
            if selected { " class=\"selected\"" } else { "" },
            i,
            if selected { " checked" } else { "" },
            node.node_id,
            encode_text(&node.title),
            node.national_id_count,
        );
    }
    html.push_str("</tbody>\n</table>\n</form>\n");
    html
}

/// The region below the node table.
pub fn render_selection(output: &RenderOutput) -> String {
    match output {
        RenderOutput::NoSelection { message } => format!(
            "<div id=\"filtered-data-container\"><h3>{}</h3></div>\n<div id=\"gender-chart-container\" style=\"margin-top:20px\"></div>\n",
            encode_text(message)
        ),
        RenderOutput::NodeSelected(view) => render_node_view(view),
    }
}

fn render_node_view(view: &NodeView) -> String {
    let mut html = String::new();
    html.push_str("<div id=\"filtered-data-container\">\n");
    let _ = writeln!(html, "<h3>{}</h3>", encode_text(&view.heading));
    html.push_str(&render_rows_table(&view.table));
    html.push_str("</div>\n<div id=\"gender-chart-container\" style=\"margin-top:20px\">\n");
    match &view.gender {
        GenderSection::NoData { message } => {
            let _ = writeln!(html, "<h3>{}</h3>", encode_text(message));
        }
        GenderSection::Chart(chart) => html.push_str(&render_donut(chart)),
    }
    html.push_str("</div>\n");
    html
}

fn render_rows_table(table: &RowsTable) -> String {
    let mut html = String::new();
    html.push_str("<div id=\"filtered-data-table\" class=\"scroll-x\">\n<table>\n<thead><tr>");
    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", encode_text(column));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            match cell {
                Some(value) => {
                    let _ = write!(html, "<td>{}</td>", encode_text(value));
                }
                None => html.push_str("<td class=\"null\"></td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</div>\n");
    html
}

/// Inline SVG donut. Slices run clockwise from twelve o'clock, each labelled
/// with its name and percentage; hovering shows the raw value.
pub fn render_donut(chart: &DonutChart) -> String {
    let center = CHART_SIZE / 2.0;
    let inner = OUTER_RADIUS * chart.hole;
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        "<svg id=\"gender-donut-chart\" class=\"donut\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\">",
        w = CHART_SIZE,
        h = CHART_SIZE + 40.0,
    );
    let _ = writeln!(
        svg,
        "<text class=\"chart-title\" x=\"{}\" y=\"20\">{}</text>",
        center,
        encode_text(&chart.title)
    );
    let _ = writeln!(svg, "<g transform=\"translate(0,40)\">");

    let mut start = 0.0_f64;
    for (i, slice) in chart.slices.iter().enumerate() {
        if slice.value == 0 || chart.total == 0 {
            continue;
        }
        let fraction = slice.value as f64 / chart.total as f64;
        let end = start + fraction * 2.0 * PI;
        let color = SLICE_COLORS[i % SLICE_COLORS.len()];
        let hover = format!("{}: {}", slice.label, slice.value);

        if fraction >= 1.0 - 1e-9 {
            // A single full slice can't be drawn as one arc
            let _ = writeln!(
                svg,
                "<circle cx=\"{c}\" cy=\"{c}\" r=\"{r:.3}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{sw:.3}\"><title>{t}</title></circle>",
                c = center,
                r = (OUTER_RADIUS + inner) / 2.0,
                color = color,
                sw = OUTER_RADIUS - inner,
                t = encode_text(&hover),
            );
        } else {
            let (ox0, oy0) = polar(center, OUTER_RADIUS, start);
            let (ox1, oy1) = polar(center, OUTER_RADIUS, end);
            let (ix1, iy1) = polar(center, inner, end);
            let (ix0, iy0) = polar(center, inner, start);
            let large_arc = if fraction > 0.5 { 1 } else { 0 };
            let _ = writeln!(
                svg,
                "<path d=\"M {ox0:.3} {oy0:.3} A {r:.3} {r:.3} 0 {la} 1 {ox1:.3} {oy1:.3} L {ix1:.3} {iy1:.3} A {ir:.3} {ir:.3} 0 {la} 0 {ix0:.3} {iy0:.3} Z\" fill=\"{color}\" data-label=\"{label}\"><title>{t}</title></path>",
                r = OUTER_RADIUS,
                ir = inner,
                la = large_arc,
                color = color,
                label = encode_double_quoted_attribute(&slice.label),
                t = encode_text(&hover),
            );
        }

        let (lx, ly) = polar(center, (OUTER_RADIUS + inner) / 2.0, (start + end) / 2.0);
        let _ = writeln!(
            svg,
            "<text x=\"{lx:.3}\" y=\"{ly:.3}\"><tspan x=\"{lx:.3}\">{}</tspan><tspan x=\"{lx:.3}\" dy=\"1.2em\">{}</tspan></text>",
            encode_text(&slice.label),
            format_percent(slice.percent),
        );

        start = end;
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

/// Point on a circle, angle measured clockwise from twelve o'clock.
fn polar(center: f64, radius: f64, angle: f64) -> (f64, f64) {
    (center + radius * angle.sin(), center - radius * angle.cos())
}

fn format_percent(percent: f64) -> String {
    if (percent - percent.round()).abs() < 0.05 {
        format!("{:.0}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::tests::row;
    use crate::presenter::{on_selection_changed, DonutSlice};
    use crate::snapshot::DashboardSnapshot;

    fn snapshot() -> DashboardSnapshot {
        DashboardSnapshot::from_rows(vec![
            row(3, "Eng", Some("1"), 8),
            row(3, "Eng", Some("2"), 2),
            row(7, "Ops & <Co>", None, 0),
        ])
    }

    #[test]
    fn test_page_without_selection() {
        let snap = snapshot();
        let html = render_page(
            "Hierarchy Dashboard",
            snap.nodes(),
            None,
            &on_selection_changed(&[], &snap),
        );
        assert!(html.contains("<h1>Hierarchy Dashboard</h1>"));
        assert!(html.contains("<h3>All Nodes</h3>"));
        assert!(html.contains("No Node Selected"));
        assert!(!html.contains("checked"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_titles_are_escaped() {
        let snap = snapshot();
        let html = render_node_table(snap.nodes(), None);
        assert!(html.contains("Ops &amp; &lt;Co&gt;"));
        assert!(!html.contains("<Co>"));
    }

    #[test]
    fn test_selected_row_is_checked() {
        let snap = snapshot();
        let html = render_node_table(snap.nodes(), Some(1));
        assert_eq!(html.matches(" checked").count(), 1);
        assert!(html.contains("value=\"1\" checked"));
    }

    #[test]
    fn test_no_gender_data_placeholder() {
        let snap = snapshot();
        let html = render_selection(&on_selection_changed(&[1], &snap));
        assert!(html.contains("Filtered Data for Node ID 7"));
        assert!(html.contains("No Gender Data Available"));
        assert!(html.contains("<th>SEX_CODE</th>"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_chart_section() {
        let snap = snapshot();
        let html = render_selection(&on_selection_changed(&[0], &snap));
        assert!(html.contains("Filtered Data for Node ID 3"));
        assert!(!html.contains("<th>SEX_CODE</th>"));
        assert!(html.contains("Gender Distribution for Node ID 3"));
        assert!(html.contains("80%"));
        assert!(html.contains("20%"));
        assert!(html.contains("<title>Male: 8</title>"));
        assert_eq!(html.matches("<path").count(), 2);
    }

    #[test]
    fn test_single_slice_drawn_as_ring() {
        let chart = DonutChart {
            title: "Gender Distribution for Node ID 1".to_string(),
            hole: 0.4,
            total: 4,
            slices: vec![DonutSlice { label: "Female".to_string(), value: 4, percent: 100.0 }],
        };
        let svg = render_donut(&chart);
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<path"));
        assert!(svg.contains("100%"));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(80.0), "80%");
        assert_eq!(format_percent(100.0 / 3.0), "33.3%");
    }
}
