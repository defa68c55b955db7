//! Defense report validation and block structuring.
//!
//! The report stage returns markdown, not JSON; a drafted legal document is
//! validated only by non-emptiness and the presence of the mandatory section
//! markers. The markdown is then split into ordered content blocks so
//! consumers can render comparisons and timelines without re-parsing.

use crate::citations::extract_citations;
use crate::composer::prompts::REPORT_SECTION_MARKERS;
use crate::models::{ContentBlock, DefenseReport, TimelineEvent};

/// Non-empty and every mandatory section marker present.
pub fn validate_report(markdown: &str) -> Result<(), String> {
    if markdown.trim().is_empty() {
        return Err("report is empty".to_string());
    }
    for marker in REPORT_SECTION_MARKERS {
        if !markdown.contains(marker) {
            return Err(format!("report is missing the '{marker}' section"));
        }
    }
    Ok(())
}

/// Assemble the final report artifact from validated markdown.
pub fn from_markdown(markdown: String) -> DefenseReport {
    let blocks = structure_report(&markdown);
    let citations = extract_citations(&markdown);
    DefenseReport {
        markdown,
        blocks,
        citations,
    }
}

/// Derive ordered content blocks from report markdown.
///
/// Headings become Heading blocks. `Before:`/`After:` URL line pairs (plus
/// one caption line) become Comparison blocks attributed to the nearest
/// heading. `- <date> — <event>` lines under a Timeline heading become one
/// Timeline block; prose under a Recommendation/Next Steps heading becomes a
/// Recommendation block. Everything else is Text.
pub fn structure_report(markdown: &str) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut text_buf: Vec<String> = Vec::new();
    let mut timeline_buf: Vec<TimelineEvent> = Vec::new();
    let mut current_heading = String::new();
    let mut pending_before: Option<String> = None;
    let mut pending_pair: Option<(String, String)> = None;

    let mut lines = markdown.lines().peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim();

        if let Some(heading) = heading_text(trimmed) {
            flush_pending(
                &mut blocks,
                &mut text_buf,
                &mut timeline_buf,
                &mut pending_before,
                &mut pending_pair,
                &current_heading,
            );
            current_heading = heading.to_string();
            blocks.push(ContentBlock::Heading {
                content: heading.to_string(),
            });
            continue;
        }

        // Comparison pairs: Before: <url> / After: <url> / caption line
        if let Some(url) = trimmed.strip_prefix("Before:") {
            flush_text(&mut blocks, &mut text_buf, &current_heading);
            pending_before = Some(url.trim().to_string());
            continue;
        }
        if let Some(url) = trimmed.strip_prefix("After:") {
            if let Some(before) = pending_before.take() {
                pending_pair = Some((before, url.trim().to_string()));
                continue;
            }
        }
        if let Some((before, after)) = pending_pair.take() {
            blocks.push(ContentBlock::Comparison {
                item: current_heading.clone(),
                before_image: before,
                after_image: after,
                caption: trimmed.to_string(),
            });
            continue;
        }

        if is_timeline_section(&current_heading) {
            if let Some(event) = timeline_entry(trimmed) {
                timeline_buf.push(event);
                continue;
            }
        }

        if trimmed.is_empty() {
            flush_text(&mut blocks, &mut text_buf, &current_heading);
        } else {
            text_buf.push(trimmed.to_string());
        }
    }

    flush_pending(
        &mut blocks,
        &mut text_buf,
        &mut timeline_buf,
        &mut pending_before,
        &mut pending_pair,
        &current_heading,
    );
    blocks
}

fn heading_text(line: &str) -> Option<&str> {
    let stripped = line.trim_start_matches('#');
    if stripped.len() < line.len() {
        Some(stripped.trim())
    } else {
        None
    }
}

fn is_timeline_section(heading: &str) -> bool {
    heading.to_lowercase().contains("timeline")
}

fn is_recommendation_section(heading: &str) -> bool {
    let lower = heading.to_lowercase();
    lower.contains("recommend") || lower.contains("next steps")
}

/// Parse "- 2026-02-20 — Checkout inspection" (also accepts ":" or "-" as
/// the separator after the date).
fn timeline_entry(line: &str) -> Option<TimelineEvent> {
    let body = line.strip_prefix("- ")?.trim();
    let date_end = body.find(|c: char| !(c.is_ascii_digit() || c == '-'))?;
    if date_end < 8 {
        return None;
    }
    let date = body[..date_end].trim_end_matches('-').to_string();
    let event = body[date_end..]
        .trim_start_matches([' ', '—', ':', '-'])
        .trim()
        .to_string();
    if event.is_empty() {
        return None;
    }
    Some(TimelineEvent { date, event })
}

fn flush_text(blocks: &mut Vec<ContentBlock>, text_buf: &mut Vec<String>, heading: &str) {
    if text_buf.is_empty() {
        return;
    }
    let content = text_buf.join("\n");
    text_buf.clear();
    if is_recommendation_section(heading) {
        blocks.push(ContentBlock::Recommendation { content });
    } else {
        blocks.push(ContentBlock::Text { content });
    }
}

fn flush_pending(
    blocks: &mut Vec<ContentBlock>,
    text_buf: &mut Vec<String>,
    timeline_buf: &mut Vec<TimelineEvent>,
    pending_before: &mut Option<String>,
    pending_pair: &mut Option<(String, String)>,
    heading: &str,
) {
    if let Some((before, after)) = pending_pair.take() {
        blocks.push(ContentBlock::Comparison {
            item: heading.to_string(),
            before_image: before,
            after_image: after,
            caption: String::new(),
        });
    }
    if let Some(orphan) = pending_before.take() {
        // A Before: line without its After: pair is kept as plain text
        text_buf.push(format!("Before: {orphan}"));
    }
    if !timeline_buf.is_empty() {
        blocks.push(ContentBlock::Timeline {
            events: std::mem::take(timeline_buf),
        });
    }
    flush_text(blocks, text_buf, heading);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> String {
        "\
# Defense Report: Rue de la Paix 10

## Executive Summary

The tenant's position is strong under **Art. 267 CO**.

## Evidence Analysis

### Kitchen Countertops

Before: https://store/intake/kc-1.jpg
After: https://store/checkout/kc-1.jpg
Minor scratches consistent with three years of normal cooking use.

## Legal Assessment

Normal wear is exempt under **Art. 267 CO**; the deposit is governed by **Art. 257e CO**.

## Timeline of Events

- 2023-06-01 — Lease commencement
- 2026-02-20 — Checkout inspection completed

## Recommended Actions

Request written justification for every claimed deduction.

## Conclusion

The landlord bears the burden of proof.
"
        .to_string()
    }

    #[test]
    fn valid_report_passes_validation() {
        assert!(validate_report(&sample_report()).is_ok());
    }

    #[test]
    fn empty_report_fails_validation() {
        assert!(validate_report("   \n").is_err());
    }

    #[test]
    fn missing_section_marker_fails_validation() {
        let report = sample_report().replace("## Legal Assessment", "## Law Stuff");
        let err = validate_report(&report).unwrap_err();
        assert!(err.contains("Legal Assessment"));
    }

    #[test]
    fn structure_extracts_comparison_with_verbatim_urls() {
        let blocks = structure_report(&sample_report());
        let comparison = blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::Comparison {
                    item,
                    before_image,
                    after_image,
                    caption,
                } => Some((item, before_image, after_image, caption)),
                _ => None,
            })
            .expect("no comparison block");
        assert_eq!(comparison.0, "Kitchen Countertops");
        assert_eq!(comparison.1, "https://store/intake/kc-1.jpg");
        assert_eq!(comparison.2, "https://store/checkout/kc-1.jpg");
        assert!(comparison.3.contains("normal cooking use"));
    }

    #[test]
    fn structure_extracts_timeline_events() {
        let blocks = structure_report(&sample_report());
        let events = blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::Timeline { events } => Some(events),
                _ => None,
            })
            .expect("no timeline block");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, "2023-06-01");
        assert!(events[1].event.contains("Checkout inspection"));
    }

    #[test]
    fn recommendation_section_becomes_recommendation_block() {
        let blocks = structure_report(&sample_report());
        assert!(blocks.iter().any(|b| matches!(
            b,
            ContentBlock::Recommendation { content } if content.contains("written justification")
        )));
    }

    #[test]
    fn report_artifact_collects_citations() {
        let report = from_markdown(sample_report());
        assert!(report.citations.iter().any(|c| c == "Art. 267 CO"));
        assert!(report.citations.iter().any(|c| c == "Art. 257e CO"));
        // Deduplicated: Art. 267 CO cited twice, listed once
        assert_eq!(
            report.citations.iter().filter(|c| *c == "Art. 267 CO").count(),
            1
        );
    }

    #[test]
    fn headings_become_heading_blocks_in_order() {
        let blocks = structure_report(&sample_report());
        let headings: Vec<&str> = blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Heading { content } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(headings[0], "Defense Report: Rue de la Paix 10");
        assert!(headings.contains(&"Executive Summary"));
    }
}
