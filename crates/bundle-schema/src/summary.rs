//! Human-readable bundle summary (`summary.md`).

use crate::{Manifest, Metadata};
use std::collections::BTreeMap;

/// Render the Markdown summary for a bundle.
pub fn render_summary(manifest: &Manifest, metadata: &Metadata) -> String {
    let mut summary = String::new();

    summary.push_str("# Evidence Bundle Summary\n\n");
    summary.push_str(&format!("**Case ID:** {}\n", metadata.case_id));
    summary.push_str(&format!("**Analyst:** {}\n", metadata.analyst));
    summary.push_str(&format!("**Source:** {}\n", metadata.source));
    summary.push_str(&format!("**Created (UTC):** {}\n", metadata.created_at));
    summary.push_str(&format!("**Tool:** {}\n\n", metadata.tool_version));

    summary.push_str(&format!("**Total files:** {}\n", manifest.file_count));
    summary.push_str(&format!(
        "**Total size:** {} bytes ({})\n",
        manifest.total_bytes,
        human_bytes(manifest.total_bytes)
    ));

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for file in &manifest.files {
        *kinds.entry(file.kind.as_str()).or_default() += 1;
    }
    if !kinds.is_empty() {
        summary.push_str("\n## File types\n\n");
        for (kind, count) in &kinds {
            summary.push_str(&format!("- {}: {}\n", kind, count));
        }
    }

    if !metadata.notes.trim().is_empty() {
        summary.push_str("\n## Notes\n\n");
        summary.push_str(metadata.notes.trim_end());
        summary.push('\n');
    }

    summary.push_str("\n## Files\n\n");
    if manifest.files.is_empty() {
        summary.push_str("_No evidence files._\n");
    } else {
        summary.push_str("| Path | Size (bytes) | SHA-256 |\n");
        summary.push_str("|------|-------------:|---------|\n");
        for file in &manifest.files {
            summary.push_str(&format!(
                "| {} | {} | `{}` |\n",
                code_cell(&file.path),
                file.size,
                file.sha256
            ));
        }
    }

    summary
}

/// Render `text` as a code span usable inside a table cell. The fence is one
/// backtick longer than the longest backtick run in the text.
fn code_cell(text: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }

    let escaped = text
        .replace('|', "\\|")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    let fence = "`".repeat(longest + 1);
    if escaped.starts_with('`') || escaped.ends_with('`') {
        format!("{fence} {escaped} {fence}")
    } else {
        format!("{fence}{escaped}{fence}")
    }
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_manifest, CaseInfo, EvidenceFile};
    use evibundle_common::Timestamp;

    fn render(files: Vec<EvidenceFile>, notes: &str) -> String {
        let case = CaseInfo {
            case_id: "IR-2025-001".into(),
            analyst: "A. Analyst".into(),
            source: "SOC".into(),
            notes: notes.into(),
        };
        let ts = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        let manifest = build_manifest(files, &case, ts);
        let metadata = Metadata::new(&case, ts, "evibundle 0.1.0");
        render_summary(&manifest, &metadata)
    }

    #[test]
    fn test_summary_lists_counts_and_digests() {
        let summary = render(
            vec![
                EvidenceFile::new("log.txt", "", "aa", 5),
                EvidenceFile::new("notes.txt", "", "bb", 5),
                EvidenceFile::new("mem.raw", "", "cc", 2048),
            ],
            "",
        );

        assert!(summary.contains("**Case ID:** IR-2025-001"));
        assert!(summary.contains("**Total files:** 3"));
        assert!(summary.contains("**Total size:** 2058 bytes (2.0 KiB)"));
        assert!(summary.contains("- raw: 1\n- txt: 2\n"));
        assert!(summary.contains("| `log.txt` | 5 | `aa` |"));
        assert!(!summary.contains("## Notes"));
    }

    #[test]
    fn test_summary_notes_and_empty_bundle() {
        let summary = render(vec![], "Host isolated at 10:02.");
        assert!(summary.contains("**Total files:** 0"));
        assert!(summary.contains("**Total size:** 0 bytes (0 B)"));
        assert!(summary.contains("## Notes\n\nHost isolated at 10:02.\n"));
        assert!(summary.contains("_No evidence files._"));
        assert!(!summary.contains("## File types"));
    }

    #[test]
    fn test_awkward_paths_stay_in_one_cell() {
        let summary = render(
            vec![
                EvidenceFile::new("a`b.txt", "", "aa", 1),
                EvidenceFile::new("x|y\nz.txt", "", "bb", 1),
            ],
            "",
        );
        assert!(summary.contains("| ``a`b.txt`` | 1 | `aa` |\n"));
        assert!(summary.contains("| `x\\|y\\nz.txt` | 1 | `bb` |\n"));
        assert_eq!(code_cell("`tick`"), "`` `tick` ``");
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
