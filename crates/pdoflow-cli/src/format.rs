//! Tabular rendering for `posting-status`, `list-postings`, and
//! `priority-stats`. `grid` goes through `comfy-table`; the other three
//! formats are hand-rolled since no single teacher-stack crate renders
//! all of simple/grid/html/latex.

use clap::ValueEnum;
use comfy_table::{Table, presets::UTF8_FULL};
use pdoflow_core::{JobRecord, Posting};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    Simple,
    Grid,
    Html,
    Latex,
}

fn render_table(headers: &[&str], rows: &[Vec<String>], format: OutputFormat) -> String {
    match format {
        OutputFormat::Grid => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL).set_header(headers);
            for row in rows {
                table.add_row(row.clone());
            }
            table.to_string()
        }
        OutputFormat::Simple => {
            let mut out = String::new();
            out.push_str(&headers.join("  "));
            out.push('\n');
            for row in rows {
                out.push_str(&row.join("  "));
                out.push('\n');
            }
            out.trim_end().to_string()
        }
        OutputFormat::Html => {
            let mut out = String::from("<table>\n  <tr>");
            for h in headers {
                out.push_str(&format!("<th>{h}</th>"));
            }
            out.push_str("</tr>\n");
            for row in rows {
                out.push_str("  <tr>");
                for cell in row {
                    out.push_str(&format!("<td>{cell}</td>"));
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</table>");
            out
        }
        OutputFormat::Latex => {
            let mut out = String::new();
            out.push_str(&format!(
                "\\begin{{tabular}}{{{}}}\n",
                "l".repeat(headers.len())
            ));
            out.push_str(&format!("{} \\\\\n", headers.join(" & ")));
            out.push_str("\\hline\n");
            for row in rows {
                out.push_str(&format!("{} \\\\\n", row.join(" & ")));
            }
            out.push_str("\\end{tabular}");
            out
        }
    }
}

pub fn render_postings(postings: &[Posting], format: OutputFormat) -> String {
    let headers = ["id", "poster", "target_function", "status", "created_on"];
    let rows = postings
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.poster.clone(),
                p.target_function.clone(),
                p.status.to_string(),
                p.created_on.to_rfc3339(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows, format)
}

pub fn render_job_records(jobs: &[JobRecord], format: OutputFormat) -> String {
    let headers = ["id", "priority", "tries_remaining", "status", "updated_on"];
    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                j.id.to_string(),
                j.priority.to_string(),
                j.tries_remaining.to_string(),
                j.status.to_string(),
                j.updated_on.to_rfc3339(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows, format)
}

pub fn render_priority_stats(stats: &[pdoflow_db::PriorityStat], format: OutputFormat) -> String {
    let headers = ["priority", "waiting"];
    let rows = stats
        .iter()
        .map(|s| vec![s.priority.to_string(), s.waiting.to_string()])
        .collect::<Vec<_>>();
    render_table(&headers, &rows, format)
}
