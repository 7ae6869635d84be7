use anyhow::Result;
use colored::*;
use repose_xsd::{Diagnostic, DiagnosticKind, FieldDescriptor};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Compact,
    Pretty,
}

impl OutputFormat {
    pub fn from_compact_flag(compact: bool) -> Self {
        if compact {
            Self::Compact
        } else {
            Self::Pretty
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => Self::Always,
            "never" => Self::Never,
            "auto" => Self::Auto,
            _ => Self::Auto,
        }
    }

    /// Diagnostics go to stderr, so that is the stream checked.
    pub fn should_colorize(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => {
                atty::is(atty::Stream::Stderr)
                    && supports_color::on(supports_color::Stream::Stderr).is_some()
            }
        }
    }
}

/// Render a descriptor tree as JSON
pub fn format_descriptor(descriptor: &FieldDescriptor, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Compact => serde_json::to_string(descriptor)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(descriptor)?,
    })
}

/// Short label for the category of a diagnostic
fn diagnostic_label(kind: &DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::UndefinedType(_) => "undefined-type",
        DiagnosticKind::UnexpectedChild(_) => "unexpected-child",
        DiagnosticKind::NonElementInGroup(_) => "non-element",
        DiagnosticKind::UnhandledComplexChild(_) => "unhandled",
        DiagnosticKind::MissingAttribute(_) => "missing-attribute",
        DiagnosticKind::RecursiveType(_) => "recursive-type",
    }
}

/// Format one diagnostic line
pub fn format_diagnostic(diagnostic: &Diagnostic, colorize: bool) -> String {
    let label = diagnostic_label(&diagnostic.kind);
    if colorize {
        format!(
            "{} {} {}\n  {} {}",
            "warning".yellow().bold(),
            format!("[{}]", label).as_str().dimmed(),
            diagnostic.kind,
            "at".dimmed(),
            diagnostic.path.as_str().bright_black()
        )
    } else {
        format!("warning [{}] {}\n  at {}", label, diagnostic.kind, diagnostic.path)
    }
}

/// Format the closing summary line
pub fn format_summary(diagnostics: usize, colorize: bool) -> String {
    match (diagnostics, colorize) {
        (0, true) => "No diagnostics".green().to_string(),
        (0, false) => "No diagnostics".to_string(),
        (1, _) => "1 diagnostic".to_string(),
        (n, _) => format!("{} diagnostics", n),
    }
}
