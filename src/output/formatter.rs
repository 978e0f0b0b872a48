use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

use crate::cli::OutputFormat;
use crate::registry::IdentityRegistry;
use crate::workspace::FileScan;

use super::{DispositionRecord, ElementRecord, ScanFailure};

#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub files_scanned: usize,
    pub passes: usize,
    pub total_dispositions: usize,
    pub total_elements: usize,
    pub dispositions: Vec<DispositionRecord>,
    pub elements: Vec<ElementRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ScanFailure>,
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn format(
        scans: &[FileScan],
        registry: &IdentityRegistry,
        passes: usize,
        format: OutputFormat,
    ) -> Result<String> {
        let output = Self::build_output(scans, registry, passes);

        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&output)?),
            OutputFormat::Text => Ok(Self::render_text(&output)),
        }
    }

    pub fn build_output(scans: &[FileScan], registry: &IdentityRegistry, passes: usize) -> JsonOutput {
        let dispositions: Vec<DispositionRecord> = scans
            .iter()
            .filter_map(FileScan::report)
            .flat_map(|report| report.dispositions.iter().map(DispositionRecord::from))
            .collect();

        let failures: Vec<ScanFailure> = scans
            .iter()
            .filter_map(|scan| {
                scan.outcome.as_ref().err().map(|e| ScanFailure {
                    file: scan.path.display().to_string(),
                    error: e.to_string(),
                })
            })
            .collect();

        let elements: Vec<ElementRecord> =
            registry.snapshot().iter().map(ElementRecord::from).collect();

        JsonOutput {
            files_scanned: scans.len(),
            passes,
            total_dispositions: dispositions.len(),
            total_elements: elements.len(),
            dispositions,
            elements,
            failures,
        }
    }

    pub fn render_text(output: &JsonOutput) -> String {
        let mut text = String::new();
        let _ = writeln!(
            text,
            "{} files, {} passes, {} dispositions, {} elements",
            output.files_scanned, output.passes, output.total_dispositions, output.total_elements
        );

        for element in &output.elements {
            let _ = write!(text, "{:<8} {:<26} {}", element.state.as_str(), element.kind, element.id);
            if !element.categories.is_empty() {
                let _ = write!(text, " [{}]", element.categories.join(", "));
            }
            if let Some(reason) = &element.skip_reason {
                let _ = write!(text, " (skipped: {reason})");
            }
            text.push('\n');
        }

        for failure in &output.failures {
            let _ = writeln!(text, "error    {}: {}", failure.file, failure.error);
        }
        text
    }
}
