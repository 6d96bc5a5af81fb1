//! Result classification and the results table.
//!
//! Once the run is finished every step becomes one [`ReportRow`]. A step
//! whose summary is `failure`, `inconclusive` or `skipped` fails the whole
//! run; its label is extended with one `(Flag)` per detail flag that is set.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::step::{Outcome, Summary, TestStep};

/// Column headers of the results table.
pub const HEADERS: [&str; 5] = ["Model", "API Level", "Locale", "Orientation", "Outcome"];

/// How a step's outcome affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeClass {
    Success,
    Failure,
    Inconclusive,
    Skipped,
    /// An unknown summary; shown as-is and does not fail the run.
    Other,
}

impl OutcomeClass {
    /// Whether this outcome fails the run.
    pub fn fails_run(&self) -> bool {
        matches!(
            self,
            OutcomeClass::Failure | OutcomeClass::Inconclusive | OutcomeClass::Skipped
        )
    }

    fn color(&self) -> Option<Color> {
        match self {
            OutcomeClass::Success => Some(Color::Green),
            OutcomeClass::Failure => Some(Color::Red),
            OutcomeClass::Inconclusive => Some(Color::Yellow),
            OutcomeClass::Skipped => Some(Color::Blue),
            OutcomeClass::Other => None,
        }
    }
}

/// Builds the outcome label and class for a step outcome.
pub fn classify(outcome: &Outcome) -> (String, OutcomeClass) {
    let mut label = outcome.summary.to_string();
    let (class, flags): (OutcomeClass, Vec<(bool, &str)>) = match outcome.summary {
        Summary::Success => (OutcomeClass::Success, Vec::new()),
        Summary::Failure => (
            OutcomeClass::Failure,
            outcome
                .failure_detail
                .as_ref()
                .map(|d| {
                    vec![
                        (d.crashed, "Crashed"),
                        (d.not_installed, "NotInstalled"),
                        (d.other_native_crash, "OtherNativeCrash"),
                        (d.timed_out, "TimedOut"),
                        (d.unable_to_crawl, "UnableToCrawl"),
                    ]
                })
                .unwrap_or_default(),
        ),
        Summary::Inconclusive => (
            OutcomeClass::Inconclusive,
            outcome
                .inconclusive_detail
                .as_ref()
                .map(|d| {
                    vec![
                        (d.aborted_by_user, "AbortedByUser"),
                        (d.infrastructure_failure, "InfrastructureFailure"),
                    ]
                })
                .unwrap_or_default(),
        ),
        Summary::Skipped => (
            OutcomeClass::Skipped,
            outcome
                .skipped_detail
                .as_ref()
                .map(|d| {
                    vec![
                        (d.incompatible_app_version, "IncompatibleAppVersion"),
                        (d.incompatible_architecture, "IncompatibleArchitecture"),
                        (d.incompatible_device, "IncompatibleDevice"),
                    ]
                })
                .unwrap_or_default(),
        ),
        Summary::Unrecognized(_) | Summary::Unspecified => (OutcomeClass::Other, Vec::new()),
    };

    for (set, name) in flags {
        if set {
            label.push('(');
            label.push_str(name);
            label.push(')');
        }
    }
    (label, class)
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub model: String,
    pub api_level: String,
    pub locale: String,
    pub orientation: String,
    pub outcome: String,
    pub class: OutcomeClass,
}

impl ReportRow {
    pub fn from_step(step: &TestStep) -> Self {
        let dimensions = step.dimensions();
        let dimension = |key: &str| dimensions.get(key).copied().unwrap_or_default().to_string();
        let (outcome, class) = match &step.outcome {
            Some(outcome) => classify(outcome),
            None => classify(&Outcome::default()),
        };

        Self {
            model: dimension("Model"),
            api_level: dimension("Version"),
            locale: dimension("Locale"),
            orientation: dimension("Orientation"),
            outcome,
            class,
        }
    }
}

/// The classified results of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn from_steps(steps: &[TestStep]) -> Self {
        Self {
            rows: steps.iter().map(ReportRow::from_step).collect(),
        }
    }

    /// `false` if any step failed, was inconclusive or was skipped.
    pub fn successful(&self) -> bool {
        !self.rows.iter().any(|row| row.class.fails_run())
    }

    /// Renders the table. Outcome cells are colored on a terminal.
    pub fn render(&self) -> String {
        self.table().to_string()
    }

    /// Columns keep their content width; labels are never wrapped.
    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(HEADERS);

        for row in &self.rows {
            let mut outcome = Cell::new(&row.outcome);
            if let Some(color) = row.class.color() {
                outcome = outcome.fg(color);
            }
            table.add_row(vec![
                Cell::new(&row.model),
                Cell::new(&row.api_level),
                Cell::new(&row.locale),
                Cell::new(&row.orientation),
                outcome,
            ]);
        }

        table
    }
}
