use super::super::domain::{AllocationResult, StudentRecord};
use super::super::run::AllocationRun;
use super::super::scoring::ScoreBreakdown;

pub const FULL_REPORT_FILE: &str = "allocations_full.html";

const TABLE_HEADERS: [&str; 5] = [
    "Student ID",
    "Name",
    "Allocated University",
    "Allocated Course",
    "Reasoning",
];

const FULL_REPORT_STYLE: &str = "body { font-family: Arial, sans-serif; margin: 20px; }
h1 { text-align: center; }
table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
th, td { border: 1px solid #333; padding: 5px; text-align: center; font-size: 12px; }
th { background-color: #3498db; color: white; }";

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// File name for a student's report; identifiers are reduced to a safe character set.
pub fn student_report_file_name(student_id: &str) -> String {
    let stem: String = student_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.html")
}

/// Per-student document: subject grades with the points each scored, then the allocation.
pub fn student_report_html(
    record: &StudentRecord,
    result: &AllocationResult,
    breakdown: &ScoreBreakdown,
) -> String {
    let student_id = escape_html(record.id.as_str());
    let mut html = format!(
        "<html>\n<head><title>Report {student_id}</title></head>\n<body>\n\
<h2>Student Report: {name} ({student_id})</h2>\n\
<table border=\"1\" cellpadding=\"5\" cellspacing=\"0\">\n<tr><th>Subject</th><th>Grade</th><th>Points</th></tr>\n",
        name = escape_html(&record.name),
    );

    for component in &breakdown.components {
        let points = if component.recognized {
            component.points.to_string()
        } else {
            format!("{} (not a grade)", component.points)
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&component.subject),
            escape_html(&component.token),
            points
        ));
    }

    html.push_str("</table>\n");
    html.push_str(&format!(
        "<p><b>Total Score:</b> {}</p>\n<p><b>Allocated University:</b> {}</p>\n<p><b>Allocated Course:</b> {}</p>\n<p><b>Reasoning:</b> {}</p>\n",
        breakdown.total,
        escape_html(&result.university),
        escape_html(&result.course),
        escape_html(&result.reasoning)
    ));
    html.push_str("</body></html>\n");
    html
}

fn header_row() -> String {
    let cells: String = TABLE_HEADERS
        .iter()
        .map(|header| format!("<th>{header}</th>"))
        .collect();
    format!("<tr>{cells}</tr>")
}

fn result_row(result: &AllocationResult) -> String {
    let cells: String = [
        result.student_id.as_str(),
        result.name.as_str(),
        result.university.as_str(),
        result.course.as_str(),
        result.reasoning.as_str(),
    ]
    .iter()
    .map(|cell| format!("<td>{}</td>", escape_html(cell)))
    .collect();
    format!("<tr>{cells}</tr>")
}

/// Table fragment for injecting into an already loaded page.
pub fn allocations_table_html(run: &AllocationRun) -> String {
    let mut html = String::from("<table>");
    html.push_str(&header_row());
    for result in &run.results {
        html.push_str(&result_row(result));
    }
    html.push_str("</table>");
    html
}

pub fn full_report_html(run: &AllocationRun) -> String {
    let mut html = format!(
        "<html>\n<head>\n<style>\n{FULL_REPORT_STYLE}\n</style>\n</head>\n<body>\n\
<h1>Full Student Allocations</h1>\n<p>Generated {}</p>\n<table>\n{}\n",
        run.generated_at.format("%Y-%m-%d %H:%M UTC"),
        header_row()
    );
    for result in &run.results {
        html.push_str(&result_row(result));
        html.push('\n');
    }
    html.push_str("</table>\n</body></html>\n");
    html
}

/// Fixed-width table for terminals.
pub fn render_text_table(run: &AllocationRun) -> String {
    let rows: Vec<[&str; 5]> = run
        .results
        .iter()
        .map(|result| {
            [
                result.student_id.as_str(),
                result.name.as_str(),
                result.university.as_str(),
                result.course.as_str(),
                result.reasoning.as_str(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|header| header.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[&str; 5]| {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_row(&TABLE_HEADERS));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    lines.extend(rows.iter().map(format_row));
    lines.join("\n")
}
