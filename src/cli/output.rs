//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;
use serde_json::json;

use crate::core::ProcessorTier;
use crate::research::{CitationGroup, StatusView};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// One JSON value per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name, falling back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Serializes `value` for this format, with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let rendered = match self {
            Self::Ndjson => serde_json::to_string(value),
            Self::Text | Self::Json => serde_json::to_string_pretty(value),
        };
        rendered.map_or_else(|e| format!("{{\"error\": \"{e}\"}}\n"), |s| s + "\n")
    }
}

/// Renders the tier table.
#[must_use]
pub fn format_tiers(format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "{:<9} {:>8}  {:<9} {}\n",
                "TIER", "COST/1K", "TIME", "APPROVAL"
            );
            for tier in ProcessorTier::ALL {
                let _ = writeln!(
                    out,
                    "{:<9} {:>8}  {:<9} {}",
                    tier.as_str(),
                    tier.cost_per_1k(),
                    tier.expected_duration(),
                    if tier.requires_approval() { "yes" } else { "no" }
                );
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            let tiers: Vec<_> = ProcessorTier::ALL
                .iter()
                .map(|tier| {
                    json!({
                        "name": tier,
                        "cost_per_1k": tier.cost_per_1k(),
                        "expected_duration": tier.expected_duration(),
                        "requires_approval": tier.requires_approval(),
                        "default": *tier == ProcessorTier::DEFAULT,
                    })
                })
                .collect();
            format.to_json(&tiers)
        }
    }
}

/// Renders a finished research job with its full answer.
#[must_use]
pub fn format_research(view: &StatusView, content: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "Research {} ({}, {:.1}s)\n\n{content}\n",
                view.state, view.processor, view.elapsed_seconds
            );
            if !view.citations.is_empty() {
                out.push_str("\nSources:\n");
                out.push_str(&format_citations(&view.citations));
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(&json!({
            "job_id": view.job_id,
            "state": view.state,
            "processor": view.processor,
            "elapsed_seconds": view.elapsed_seconds,
            "content": content,
            "citations": view.citations,
        })),
    }
}

fn format_citations(groups: &[CitationGroup]) -> String {
    let mut out = String::new();
    let mut n = 0;
    for group in groups {
        for citation in &group.citations {
            n += 1;
            let title = citation.title.as_deref().unwrap_or("untitled");
            let url = citation.url.as_deref().unwrap_or("-");
            let _ = write!(out, "  [{n}] {title} <{url}>");
            if let Some(confidence) = &group.confidence {
                let _ = write!(out, " (confidence: {confidence})");
            }
            out.push('\n');
        }
    }
    out
}
