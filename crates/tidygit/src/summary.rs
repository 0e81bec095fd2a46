//! Cross-repository summary box printed after `all`

use console::measure_text_width;
use owo_colors::{OwoColorize, Style};

use tidygit_core::{RepositoryResult, RunSummary};

use crate::colors::COLORS;

/// Column width error messages are wrapped to
const WRAP_WIDTH: usize = 44;

struct Painter {
    colored: bool,
}

impl Painter {
    fn paint(&self, text: &str, style: Style) -> String {
        if self.colored {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Green when non-zero, dim otherwise
    fn kept(&self, n: usize, label: &str) -> String {
        let style = if n == 0 { COLORS.dim } else { COLORS.success };
        self.paint(&format!("{} {}", n, label), style)
    }

    /// Red when non-zero, dim otherwise
    fn removed(&self, n: usize, label: &str) -> String {
        let style = if n == 0 { COLORS.dim } else { COLORS.fail };
        self.paint(&format!("{} {}", n, label), style)
    }

    fn label(&self, label: &str) -> String {
        self.paint(&format!("{:>9}", label), COLORS.accent)
    }
}

/// Greedy word wrap; words longer than `width` get a line of their own
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn repository_lines(p: &Painter, r: &RepositoryResult) -> Vec<String> {
    let icon = if r.has_errors() {
        p.paint("✗", COLORS.fail)
    } else {
        p.paint("✓", COLORS.success)
    };
    let sep = p.paint(" · ", COLORS.dim);

    let mut detail = [
        p.removed(r.worktrees_removed, "wt removed"),
        p.kept(r.worktrees_skipped, "wt kept"),
        p.removed(r.branches_deleted, "br deleted"),
        p.kept(r.branches_skipped, "br kept"),
        p.kept(r.prs_found, "pr(s)"),
    ]
    .join(sep.as_str());
    if r.has_errors() {
        detail.push_str(&sep);
        detail.push_str(&p.paint(&format!("{} error(s)", r.errors.len()), COLORS.fail));
    }
    if r.aborted {
        detail.push_str(&sep);
        detail.push_str(&p.paint("stopped", COLORS.warning));
    }

    vec![
        format!("{} {}", icon, p.paint(&r.name, Style::new().bold())),
        format!("    {}", detail),
    ]
}

/// Summary content before boxing
fn content_lines(results: &[RepositoryResult], colored: bool) -> Vec<String> {
    let p = Painter { colored };
    let totals = RunSummary::from_results(results);
    let rule = p.paint(&"─".repeat(WRAP_WIDTH), COLORS.dim);
    let sep = p.paint(" · ", COLORS.dim);

    let mut lines: Vec<String> = results.iter().flat_map(|r| repository_lines(&p, r)).collect();

    lines.push(String::new());
    lines.push(rule.clone());
    lines.push(format!(
        "  {}  {}{}{}",
        p.label("Repos"),
        p.kept(totals.repos_clean, "clean"),
        sep,
        p.removed(totals.repos_with_errors, "with errors")
    ));
    lines.push(format!(
        "  {}  {}",
        p.label("Worktrees"),
        [
            p.kept(totals.worktrees_active(), "active"),
            p.removed(totals.worktrees_removed, "removed"),
            p.kept(totals.worktrees_kept, "kept"),
        ]
        .join(sep.as_str())
    ));
    lines.push(format!(
        "  {}  {}",
        p.label("Branches"),
        [
            p.kept(totals.branches_active(), "active"),
            p.removed(totals.branches_deleted, "deleted"),
            p.kept(totals.branches_kept, "kept"),
        ]
        .join(sep.as_str())
    ));
    lines.push(format!("  {}  {}", p.label("PRs"), p.kept(totals.prs_found, "found")));
    if totals.errors > 0 {
        lines.push(format!(
            "  {}  {}",
            p.label("Errors"),
            p.paint(&totals.errors.to_string(), COLORS.fail)
        ));
    }

    if totals.errors > 0 {
        lines.push(String::new());
        lines.push(rule);
        for r in results {
            for error in &r.errors {
                let prefix = format!(
                    "{}{}",
                    p.paint(&format!("  {}", r.name), COLORS.fail),
                    p.paint(": ", COLORS.dim)
                );
                for (i, part) in wrap(error, WRAP_WIDTH).iter().enumerate() {
                    let lead = if i == 0 { prefix.clone() } else { "    ".to_string() };
                    lines.push(format!("{}{}", lead, p.paint(part, COLORS.dim)));
                }
            }
        }
    }

    lines
}

/// Rounded box with one blank line and two spaces of padding
fn boxed(lines: &[String], colored: bool) -> String {
    let p = Painter { colored };
    let inner = lines.iter().map(|l| measure_text_width(l)).max().unwrap_or(0) + 4;
    let border = |s: &str| p.paint(s, COLORS.dim);

    let mut out = Vec::with_capacity(lines.len() + 4);
    out.push(border(&format!("╭{}╮", "─".repeat(inner))));
    let blank = format!("{}{}{}", border("│"), " ".repeat(inner), border("│"));
    out.push(blank.clone());
    for line in lines {
        let pad = inner - 4 - measure_text_width(line);
        out.push(format!(
            "{}  {}{}  {}",
            border("│"),
            line,
            " ".repeat(pad),
            border("│")
        ));
    }
    out.push(blank);
    out.push(border(&format!("╰{}╯", "─".repeat(inner))));
    out.join("\n")
}

/// Render the full summary box
pub fn render(results: &[RepositoryResult], colored: bool) -> String {
    boxed(&content_lines(results, colored), colored)
}
