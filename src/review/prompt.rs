use std::fmt::Write;

use crate::diff::{FilePatch, LineKind};

const INSTRUCTIONS: &str = "\
You're a senior software engineer and an expert code reviewer. Analyze the PR
patches below and suggest specific improvements. Only comment on important
issues; avoid nitpicks.

Every line that exists in the new file is prefixed with its new-file line
number. You may only comment on lines marked `+`. Use the number in the left
column as `line`; do not count lines yourself. Removed lines (`-`) have no
number and cannot be commented on.

Reply in this exact JSON format:
[
  { \"path\": \"<filename>\", \"line\": <line_number>, \"body\": \"<review comment>\" }
]
";

/// Render review instructions followed by every patch, annotated with
/// resolved new-file line numbers.
pub fn render(files: &[FilePatch]) -> String {
    let mut out = String::from(INSTRUCTIONS);
    for file in files {
        out.push('\n');
        render_file(&mut out, file);
    }
    out
}

fn render_file(out: &mut String, file: &FilePatch) {
    let _ = writeln!(out, "### {}", file.filename);
    out.push_str("```diff\n");
    for hunk in &file.hunks {
        let _ = writeln!(
            out,
            "@@ -{},{} +{},{} @@",
            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
        );
        for line in &hunk.lines {
            let number = line.new_line.map(|n| n.to_string()).unwrap_or_default();
            let marker = match line.kind {
                LineKind::Added => '+',
                LineKind::Removed => '-',
                LineKind::Context => ' ',
            };
            let _ = writeln!(out, "{:>6} {}{}", number, marker, line.text);
        }
    }
    out.push_str("```\n");
}
