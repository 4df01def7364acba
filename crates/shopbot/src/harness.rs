//! Scripted evaluation: run fixed queries through the chatbot and check each
//! answer for an expected substring, optionally within a time budget.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chatbot::Chatbot;
use crate::error::ChatbotError;

pub const REPORT_TITLE: &str = "E-Commerce Chatbot Execution Report";
pub const PROJECT_NAME: &str = "E-Commerce Chatbot Testing";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input_query: String,
    pub expected_output: String,
    pub validation_criteria: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("Validation failed: {criteria}")]
    MissingExpected { criteria: String },
    #[error(
        "Validation failed: {criteria}. Time taken: {elapsed_secs:.2}s (budget {budget_secs:.2}s)"
    )]
    TooSlow {
        criteria: String,
        elapsed_secs: f64,
        budget_secs: f64,
    },
    #[error("chatbot error: {message}")]
    Upstream { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub case: TestCase,
    pub response: Option<String>,
    pub elapsed_secs: f64,
    pub failure: Option<ValidationFailure>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub project_name: String,
    pub execution_date: String,
    pub environment: String,
    pub framework: String,
    pub total_execution_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub title: String,
    pub metadata: ReportMetadata,
    pub outcomes: Vec<CaseOutcome>,
}

impl EvalReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn render(&self) -> String {
        let m = &self.metadata;
        let total = m.total_execution_secs;
        let mut lines = vec![
            self.title.clone(),
            format!("Project Name: {}", m.project_name),
            format!("Execution Date: {}", m.execution_date),
            format!("Environment: {}", m.environment),
            format!("Framework: {}", m.framework),
            format!("Total Execution time: {total:.2} seconds"),
            String::new(),
        ];
        for o in &self.outcomes {
            let status = if o.passed() { "PASSED" } else { "FAILED" };
            let (query, secs) = (&o.case.input_query, o.elapsed_secs);
            lines.push(format!("{status} Input query: {query} ({secs:.2}s)"));
            if let Some(f) = &o.failure {
                lines.push(format!("    {f}"));
            }
        }
        let (passed, failed) = (self.passed(), self.failed());
        lines.push(String::new());
        lines.push(format!("{passed} passed, {failed} failed"));
        lines.join("\n")
    }
}

pub fn load_cases(path: impl AsRef<Path>) -> Result<Vec<TestCase>, ChatbotError> {
    let path = path.as_ref();
    let fail = |reason: String| ChatbotError::TestData {
        path: path.to_path_buf(),
        reason,
    };
    let text = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| fail(e.to_string()))
}

/// Run one case. Pipeline errors are recorded as failures, never propagated.
pub async fn run_case(bot: &Chatbot, case: &TestCase, budget: Option<Duration>) -> CaseOutcome {
    let started = Instant::now();
    let result = bot.ask(&case.input_query).await;
    let elapsed = started.elapsed();
    let elapsed_secs = elapsed.as_secs_f64();

    let (response, failure) = match result {
        Err(e) => (
            None,
            Some(ValidationFailure::Upstream {
                message: e.to_string(),
            }),
        ),
        Ok(answer) => {
            let failure = if !answer.contains(&case.expected_output) {
                Some(ValidationFailure::MissingExpected {
                    criteria: case.validation_criteria.clone(),
                })
            } else {
                budget
                    .filter(|b| elapsed >= *b)
                    .map(|b| ValidationFailure::TooSlow {
                        criteria: case.validation_criteria.clone(),
                        elapsed_secs,
                        budget_secs: b.as_secs_f64(),
                    })
            };
            (Some(answer), failure)
        }
    };
    tracing::info!(
        query = %case.input_query,
        elapsed_secs,
        passed = failure.is_none(),
        "evaluated case"
    );
    CaseOutcome {
        case: case.clone(),
        response,
        elapsed_secs,
        failure,
    }
}

pub async fn run_cases(bot: &Chatbot, cases: &[TestCase], budget: Option<Duration>) -> EvalReport {
    let execution_date = chrono::Local::now().format("%Y-%m-%d:%H:%M:%S").to_string();
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(cases.len());
    for case in cases {
        outcomes.push(run_case(bot, case, budget).await);
    }
    EvalReport {
        title: REPORT_TITLE.to_string(),
        metadata: ReportMetadata {
            project_name: PROJECT_NAME.to_string(),
            execution_date,
            environment: "Test".to_string(),
            framework: format!("shopbot {}", env!("CARGO_PKG_VERSION")),
            total_execution_secs: started.elapsed().as_secs_f64(),
        },
        outcomes,
    }
}
