// src/models/bulk.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{FromRow, types::Json};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkSubmissionStatus {
    Draft,      // "DRAFT" - ainda editável
    Processing, // "PROCESSING"
    Success,    // "SUCCESS"
    Fail,       // "FAIL"
}

impl BulkSubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BulkSubmissionStatus::Draft => "DRAFT",
            BulkSubmissionStatus::Processing => "PROCESSING",
            BulkSubmissionStatus::Success => "SUCCESS",
            BulkSubmissionStatus::Fail => "FAIL",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BulkSubmissionStatus::Success | BulkSubmissionStatus::Fail)
    }
}

impl fmt::Display for BulkSubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkSubmission {
    pub id: Uuid,
    pub name: String,
    pub status: BulkSubmissionStatus,
    // Só preenchidos quando o lote termina em FAIL
    pub error_message: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub error_details: Option<Json<Value>>,
    // Quantas vezes o worker já tentou processar o lote
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Resultado do processamento ---

/// Motivo de falha de uma aplicação dentro do lote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Sem formulário anexado ou arquivo inexistente.
    MissingDocument,
    /// Formulário ilegível ou fora do layout (planilhas/colunas faltando).
    InvalidForm,
    /// Qualquer outra falha (banco, transição inválida...).
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationOutcome {
    pub application_id: Uuid,
    pub application_name: String,
    pub failure: Option<OutcomeFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ApplicationOutcome {
    pub fn success(application_id: Uuid, application_name: impl Into<String>) -> Self {
        Self { application_id, application_name: application_name.into(), failure: None }
    }

    pub fn failure(
        application_id: Uuid,
        application_name: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            application_id,
            application_name: application_name.into(),
            failure: Some(OutcomeFailure { kind, message: message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Agregado do processamento de um lote inteiro.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub outcomes: Vec<ApplicationOutcome>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: ApplicationOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn count_of(&self, kind: FailureKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.failure.as_ref().is_some_and(|f| f.kind == kind))
            .count()
    }

    /// SUCCESS só se ao menos uma aplicação passou e nenhuma falhou.
    pub fn is_success(&self) -> bool {
        self.succeeded() > 0 && self.failed() == 0
    }

    pub fn final_status(&self) -> BulkSubmissionStatus {
        if self.is_success() {
            BulkSubmissionStatus::Success
        } else {
            BulkSubmissionStatus::Fail
        }
    }

    /// Mensagem curta para o operador; `None` quando o lote foi bem-sucedido.
    pub fn error_message(&self) -> Option<String> {
        if self.is_success() {
            return None;
        }
        if self.outcomes.is_empty() {
            return Some("O lote não possui aplicações para processar.".to_string());
        }
        Some(format!(
            "{} de {} aplicações falharam no processamento.",
            self.failed(),
            self.outcomes.len()
        ))
    }

    /// Payload estruturado para triagem: contagens por tipo de falha e a
    /// lista das aplicações que falharam.
    pub fn error_details(&self) -> Value {
        let failures: Vec<Value> = self
            .outcomes
            .iter()
            .filter_map(|o| {
                o.failure.as_ref().map(|f| {
                    json!({
                        "applicationId": o.application_id,
                        "applicationName": o.application_name,
                        "kind": f.kind,
                        "message": f.message,
                    })
                })
            })
            .collect();

        json!({
            "total": self.outcomes.len(),
            "succeeded": self.succeeded(),
            "failed": self.failed(),
            "missingDocument": self.count_of(FailureKind::MissingDocument),
            "invalidForm": self.count_of(FailureKind::InvalidForm),
            "internal": self.count_of(FailureKind::Internal),
            "failures": failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str) -> ApplicationOutcome {
        ApplicationOutcome::success(Uuid::new_v4(), name)
    }

    fn missing(name: &str) -> ApplicationOutcome {
        ApplicationOutcome::failure(Uuid::new_v4(), name, FailureKind::MissingDocument, "sem arquivo")
    }

    #[test]
    fn all_successes_is_success() {
        let report = BatchReport { outcomes: vec![ok("a"), ok("b")] };
        assert_eq!(report.final_status(), BulkSubmissionStatus::Success);
        assert!(report.error_message().is_none());
    }

    #[test]
    fn one_failure_fails_the_batch() {
        let report = BatchReport { outcomes: vec![ok("a"), missing("b"), ok("c")] };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.final_status(), BulkSubmissionStatus::Fail);

        let details = report.error_details();
        assert_eq!(details["missingDocument"], 1);
        assert_eq!(details["invalidForm"], 0);
        assert_eq!(details["failures"].as_array().map(Vec::len), Some(1));
        assert_eq!(details["failures"][0]["applicationName"], "b");
    }

    #[test]
    fn empty_batch_fails() {
        let report = BatchReport::default();
        assert_eq!(report.final_status(), BulkSubmissionStatus::Fail);
        assert!(report.error_message().is_some());
    }

    #[test]
    fn status_uses_uppercase_wire_names() {
        assert_eq!(serde_json::to_string(&BulkSubmissionStatus::Processing).unwrap(), "\"PROCESSING\"");
        assert!(BulkSubmissionStatus::Fail.is_terminal());
        assert!(!BulkSubmissionStatus::Draft.is_terminal());
    }
}
