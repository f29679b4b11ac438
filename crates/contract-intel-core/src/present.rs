//! Detail rendering for contract records.
//!
//! Turns a [`Contract`] into a [`DetailView`]: a structured, display-ready
//! description of the record that makes no assumption about which categories
//! or fields the extraction pipeline produced. Values of any JSON shape are
//! printed by [`render_value`].

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::contract::{Contract, ContractStatus};

pub const NOT_READY_MESSAGE: &str =
    "Contract processing is not yet completed or data is not available.";
pub const NO_MISSING_FIELDS_MESSAGE: &str = "No missing fields identified.";

/// What the detail view shows for one contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DetailView {
    /// Processing has not finished, failed, or produced no data.
    NotReady {
        id: String,
        status: ContractStatus,
        failure: Option<String>,
    },
    Completed(CompletedView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedView {
    pub id: String,
    pub status: ContractStatus,
    pub categories: Vec<CategorySection>,
    /// Confidence score formatted to two decimals.
    pub confidence: Option<String>,
    /// `None` when the service sent no gap analysis at all.
    pub gaps: Option<GapSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySection {
    pub heading: String,
    pub fields: Vec<FieldLine>,
}

/// One rendered field. `label` is absent when the category itself was a
/// bare value rather than an object of fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldLine {
    pub label: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSection {
    /// Missing field names, verbatim and in service order.
    Missing(Vec<String>),
    NoneMissing,
}

/// Build the detail view for a contract.
pub fn present(contract: &Contract) -> DetailView {
    let data = match (&contract.status, &contract.extracted_data) {
        (status, Some(data)) if status.is_completed() => data,
        _ => {
            return DetailView::NotReady {
                id: contract.id.clone(),
                status: contract.status.clone(),
                failure: contract.error.clone(),
            };
        }
    };

    let categories = data
        .iter()
        .map(|(name, value)| CategorySection {
            heading: humanize(name).to_uppercase(),
            fields: field_lines(value),
        })
        .collect();

    let gaps = contract.gap_analysis.as_ref().map(|gap| {
        match gap.missing_fields.as_deref() {
            Some(fields) if !fields.is_empty() => GapSection::Missing(fields.to_vec()),
            _ => GapSection::NoneMissing,
        }
    });

    DetailView::Completed(CompletedView {
        id: contract.id.clone(),
        status: contract.status.clone(),
        categories,
        confidence: contract.confidence_score.map(|score| format!("{score:.2}")),
        gaps,
    })
}

fn field_lines(category: &Value) -> Vec<FieldLine> {
    match category {
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| FieldLine {
                label: Some(humanize(key)),
                value: render_value(value),
            })
            .collect(),
        other => vec![FieldLine {
            label: None,
            value: render_value(other),
        }],
    }
}

fn humanize(name: &str) -> String {
    name.replace('_', " ")
}

/// Render any JSON value as compact text, keeping element order.
pub fn render_value(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

impl fmt::Display for DetailView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady {
                id,
                status,
                failure,
            } => {
                writeln!(f, "Contract Details: {id}")?;
                writeln!(f, "Status: {status}")?;
                if let Some(reason) = failure {
                    writeln!(f, "Failure: {reason}")?;
                }
                writeln!(f)?;
                writeln!(f, "{NOT_READY_MESSAGE}")
            }
            Self::Completed(view) => fmt::Display::fmt(view, f),
        }
    }
}

impl fmt::Display for CompletedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contract Details: {}", self.id)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f)?;
        writeln!(f, "Extracted Data")?;
        for section in &self.categories {
            writeln!(f, "  {}", section.heading)?;
            for line in &section.fields {
                match &line.label {
                    Some(label) => writeln!(f, "    {label}: {}", line.value)?,
                    None => writeln!(f, "    {}", line.value)?,
                }
            }
        }
        if let Some(confidence) = &self.confidence {
            writeln!(f)?;
            writeln!(f, "Confidence Score: {confidence}")?;
        }
        match &self.gaps {
            Some(GapSection::Missing(fields)) => {
                writeln!(f)?;
                writeln!(f, "Gap Analysis")?;
                for field in fields {
                    writeln!(f, "  - {field}")?;
                }
            }
            Some(GapSection::NoneMissing) => {
                writeln!(f)?;
                writeln!(f, "Gap Analysis")?;
                writeln!(f, "  {NO_MISSING_FIELDS_MESSAGE}")?;
            }
            None => {}
        }
        Ok(())
    }
}
