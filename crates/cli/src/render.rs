//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use resultgrid_engine::PageView;
use resultgrid_types::{Dataset, FilesResponse, JobStatus};
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const COLUMN_GAP: &str = "  ";

/// Aligns `header` and `rows` into columns, truncating cells wider than
/// `max_width` display columns with a trailing `…`.
pub fn text_table(header: &[String], rows: &[Vec<String>], max_width: usize) -> String {
    let max_width = max_width.max(2);
    let header: Vec<String> = header.iter().map(|cell| truncate(cell, max_width)).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate(cell, max_width)).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.width()).collect();
    for row in &rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.width());
            }
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    push_line(&mut out, &rule, &widths);
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (index, width) in widths.iter().enumerate() {
        let cell = cells.get(index).map(String::as_str).unwrap_or_default();
        if index > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', width.saturating_sub(cell.width())));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Collapses line breaks and cuts `text` to `max_width` display columns.
pub fn truncate(text: &str, max_width: usize) -> String {
    let text: String = text.chars().map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch }).collect();
    if text.width() <= max_width {
        return text;
    }
    let budget = max_width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > budget {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push('…');
    out
}

pub fn job_header(id: &str, status: &JobStatus, base_url: &str) -> String {
    format!("Job {id}\nStatus: {status}\nAPI: {base_url}\n")
}

/// Pretty JSON of the non-tabular blocks (`resumo`, `meta`, ...) found at the
/// document root or inside its `container` object, one titled section each.
pub fn summaries(document: &Value, keys: &[String], container: &str) -> String {
    let scopes = [Some(document), document.get(container)];
    let mut out = String::new();
    for key in keys {
        let found = scopes
            .iter()
            .flatten()
            .filter_map(|scope| scope.as_object()?.get(key))
            .find(|value| !value.is_null());
        if let Some(value) = found {
            let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            let _ = writeln!(out, "{key}:\n{pretty}\n");
        }
    }
    out
}

pub fn dataset_list(datasets: &[Dataset], active: usize) -> String {
    let mut out = String::new();
    for (index, dataset) in datasets.iter().enumerate() {
        let marker = if index == active { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {} ({})", dataset.name, dataset.len());
    }
    out
}

pub fn page_footer(page: &PageView) -> String {
    format!("Page {} of {} ({} items)", page.page, page.total_pages, page.total_rows)
}

pub fn page(page: &PageView, max_width: usize) -> String {
    let mut out = String::new();
    if page.rows.is_empty() {
        out.push_str("No rows match the current filter.\n");
    } else {
        out.push_str(&text_table(&page.columns, &page.rows, max_width));
    }
    out.push_str(&page_footer(page));
    out.push('\n');
    out
}

pub fn files(listing: &FilesResponse) -> String {
    let header = ["name", "size", "modified"].map(String::from).to_vec();
    let rows: Vec<Vec<String>> = listing
        .files
        .iter()
        .map(|file| {
            vec![
                file.name.clone(),
                file.size_human.clone().unwrap_or_else(|| file.size.to_string()),
                file.mtime_iso.clone().unwrap_or_else(|| file.mtime.to_string()),
            ]
        })
        .collect();

    let count = listing.count.unwrap_or(listing.files.len());
    let mut out = format!("{}\n", listing.output_dir);
    if !rows.is_empty() {
        out.push_str(&text_table(&header, &rows, 60));
    }
    let _ = writeln!(out, "{count} files");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use resultgrid_types::FileEntry;
    use serde_json::json;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn table_columns_align_on_display_width() {
        let header = strings(&["codigo", "a_desc"]);
        let rows = vec![strings(&["1", "Água"]), strings(&["00002", "Brita"])];
        let table = text_table(&header, &rows, 40);
        assert_eq!(table, "codigo  a_desc\n------  ------\n1       Água\n00002   Brita\n");
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("linha\ndois", 20), "linha dois");
    }

    #[test]
    fn footer_reports_filtered_total() {
        let view = PageView {
            dataset: "cruzado".into(),
            columns: strings(&["codigo"]),
            rows: vec![],
            page: 1,
            total_pages: 1,
            total_rows: 0,
            dataset_rows: 10,
        };
        assert_eq!(page(&view, 40), "No rows match the current filter.\nPage 1 of 1 (0 items)\n");
    }

    #[test]
    fn job_header_names_status_and_service() {
        assert_eq!(
            job_header("42", &JobStatus::Finished, "http://localhost:8001"),
            "Job 42\nStatus: finished\nAPI: http://localhost:8001\n"
        );
    }

    #[test]
    fn summaries_show_ignored_blocks_at_root_or_in_container() {
        let keys = strings(&["meta", "resumo", "params"]);
        let document = json!({
            "meta": {"kind": "precos"},
            "data": {"resumo": {"itens_orc": 3}, "cruzado": [{"codigo": "1"}]}
        });
        assert_eq!(
            summaries(&document, &keys, "data"),
            "meta:\n{\n  \"kind\": \"precos\"\n}\n\nresumo:\n{\n  \"itens_orc\": 3\n}\n\n"
        );
        assert_eq!(summaries(&json!({"resumo": null, "items": []}), &keys, "data"), "");
        assert_eq!(summaries(&json!([{"resumo": 1}]), &keys, "data"), "");
    }

    #[test]
    fn dataset_list_marks_active() {
        let datasets = vec![Dataset::new("a", vec![]), Dataset::new("b", vec![])];
        assert_eq!(dataset_list(&datasets, 1), "  a (0)\n* b (0)\n");
    }

    #[test]
    fn file_listing_prefers_human_fields() {
        let listing = FilesResponse {
            output_dir: "/srv/output".into(),
            files: vec![FileEntry {
                name: "cruzado.xlsx".into(),
                path: "/srv/output/cruzado.xlsx".into(),
                size: 2048,
                mtime: 1.0,
                size_human: Some("2.0 KB".into()),
                mtime_iso: None,
            }],
            count: None,
        };
        let text = files(&listing);
        assert!(text.starts_with("/srv/output\n"));
        assert!(text.contains("cruzado.xlsx  2.0 KB  1"), "{text}");
        assert!(text.ends_with("1 files\n"));
    }
}
