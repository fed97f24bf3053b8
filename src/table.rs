//! Fixed-width table rendering for terminal output.

use std::fmt::Write as _;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_row(&mut output, headers, &widths);
    let separator = widths
        .iter()
        .map(|width| "-".repeat((*width).max(3)))
        .collect::<Vec<_>>();
    push_row(&mut output, &separator, &widths);
    for row in rows {
        push_row(&mut output, row, &widths);
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (idx, cell) in cells.iter().enumerate().take(widths.len()) {
        if idx > 0 {
            line.push_str("  ");
        }
        let sanitized = cell.replace(['\n', '\r', '\t'], " ");
        let padding = widths[idx].saturating_sub(sanitized.chars().count());
        line.push_str(&sanitized);
        line.push_str(&" ".repeat(padding));
    }
    while line.ends_with(' ') {
        line.pop();
    }
    let _ = writeln!(output, "{line}");
}
