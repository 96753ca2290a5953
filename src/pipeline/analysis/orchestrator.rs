use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use super::client::AnalysisClient;
use super::prompt::{compose_for_mode, compose_structured};
use super::types::{AnalysisMode, AnalysisRequest, AnalysisResult};
use crate::pipeline::diagnostic;
use crate::pipeline::extraction::{extract, ExtractedFacts};
use crate::pipeline::import::MedicalRecord;

/// A request ready to submit, with the facts it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedAnalysis {
    pub run_id: Uuid,
    pub facts: ExtractedFacts,
    pub request: AnalysisRequest,
}

impl PreparedAnalysis {
    /// Extract facts and compose the request for `mode`. No network.
    ///
    /// Facts are always extracted so the reviewer can inspect them, even when
    /// the mode embeds the raw narrative instead.
    pub fn from_record(record: &MedicalRecord, mode: AnalysisMode) -> Self {
        let run_id = Uuid::new_v4();
        let source = record
            .source()
            .map_or_else(|| "<inline>".to_string(), |p| p.display().to_string());
        if record.is_blank() {
            tracing::warn!(run_id = %run_id, source = %source, "Record is empty, request will carry no case text");
        }

        let facts = extract(record.text());
        let request = compose_for_mode(mode, record.text(), &facts);

        tracing::debug!(
            run_id = %run_id,
            source = %source,
            mode = %mode,
            facts = facts.total(),
            "Analysis prepared"
        );

        Self {
            run_id,
            facts,
            request,
        }
    }

    /// Structured-mode request from reviewer-edited facts.
    pub fn from_facts(facts: ExtractedFacts) -> Self {
        let request = compose_structured(&facts);
        Self {
            run_id: Uuid::new_v4(),
            facts,
            request,
        }
    }
}

/// Orchestrates one analysis run:
/// extract → compose → submit → (optional) diagnostic dump
pub struct AnalysisPipeline {
    client: AnalysisClient,
    dump_dir: Option<PathBuf>,
}

impl AnalysisPipeline {
    pub fn new(client: AnalysisClient) -> Self {
        Self {
            client,
            dump_dir: None,
        }
    }

    /// Write per-run artifacts under `dir` (see [`diagnostic`]).
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    /// Submit a prepared request and wait for the outcome.
    pub fn submit(&self, prepared: PreparedAnalysis) -> AnalysisResult {
        let PreparedAnalysis {
            run_id,
            facts,
            request,
        } = prepared;

        tracing::info!(
            run_id = %run_id,
            mode = %request.mode(),
            facts = facts.total(),
            "Analysis run started"
        );

        let dump = self
            .dump_dir
            .as_deref()
            .and_then(|base| diagnostic::dump_dir_for(base, &run_id));
        if let Some(dir) = &dump {
            diagnostic::dump_json(dir, "00-facts.json", &facts);
            diagnostic::dump_json(dir, "01-request.json", &request);
        }

        let result = self.client.submit(request);

        if let Some(dir) = &dump {
            match &result {
                Ok(report) => diagnostic::dump_text(dir, "02-response.txt", &report.text),
                Err(e) => diagnostic::dump_text(dir, "02-error.txt", &e.to_string()),
            }
        }

        result
    }

    /// Full run from a record: prepare, then submit.
    pub fn run(&self, record: &MedicalRecord, mode: AnalysisMode) -> AnalysisResult {
        self.submit(PreparedAnalysis::from_record(record, mode))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pipeline::analysis::mistral::MockLlmClient;
    use crate::pipeline::analysis::prompt::ROOT_CAUSE_PERSONA;
    use crate::pipeline::analysis::AnalysisError;
    use crate::pipeline::extraction::FactCategory;

    const RECORD: &str = "Medical History\n- Hypertension\n- Diabetes\n\nCourse of Events\n- March 1: admitted\n- Cardiac arrest\n\n";

    fn pipeline_with(mock: Arc<MockLlmClient>) -> AnalysisPipeline {
        AnalysisPipeline::new(AnalysisClient::new(Box::new(mock), "mistral-large-latest"))
    }

    #[test]
    fn prepare_extracts_facts_for_every_mode() {
        let record = MedicalRecord::from_text(RECORD);

        for mode in [
            AnalysisMode::Narrative,
            AnalysisMode::Structured,
            AnalysisMode::RootCause,
        ] {
            let prepared = PreparedAnalysis::from_record(&record, mode);
            assert_eq!(prepared.facts.conditions, vec!["hypertension", "diabetes"]);
            assert_eq!(prepared.facts.events, vec!["cardiac arrest"]);
            assert_eq!(prepared.request.mode(), mode);
        }
    }

    #[test]
    fn structured_run_sends_fact_lists() {
        let mock = Arc::new(MockLlmClient::new("Underlying cause: diabetes"));
        let pipeline = pipeline_with(Arc::clone(&mock));

        let report = pipeline
            .run(&MedicalRecord::from_text(RECORD), AnalysisMode::Structured)
            .unwrap();
        assert_eq!(report.text, "Underlying cause: diabetes");
        assert_eq!(report.mode, AnalysisMode::Structured);

        let calls = mock.calls();
        assert_eq!(calls[0][0].content, ROOT_CAUSE_PERSONA);
        let case = &calls[0][1].content;
        assert!(case.contains("Medical History: hypertension, diabetes"));
        assert!(case.contains("Course of Events: cardiac arrest"));
        assert!(!case.contains("march 1"));
    }

    #[test]
    fn reviewer_edits_flow_into_request() {
        let mock = Arc::new(MockLlmClient::new("ok"));
        let pipeline = pipeline_with(Arc::clone(&mock));

        let extracted = extract(RECORD);
        let mut reviewed = extracted.clone();
        reviewed.push(FactCategory::Symptoms, "chest pain");
        reviewed.remove(FactCategory::Conditions, 1);

        pipeline.submit(PreparedAnalysis::from_facts(reviewed)).unwrap();

        let case = &mock.calls()[0][1].content;
        assert!(case.contains("Symptoms: chest pain"));
        assert!(case.contains("Medical History: hypertension\n"));
        assert_eq!(extracted.conditions.len(), 2);
    }

    #[test]
    fn failure_passes_through_as_error() {
        let mock = Arc::new(MockLlmClient::failing(AnalysisError::Api {
            status: 429,
            body: "rate limited".into(),
        }));
        let pipeline = pipeline_with(mock);

        let err = pipeline
            .run(&MedicalRecord::from_text("text"), AnalysisMode::Narrative)
            .unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn blank_file_record_still_prepares_request() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blank.txt");
        std::fs::write(&path, "  \n").unwrap();
        let record = MedicalRecord::load(&path).unwrap();
        assert_eq!(record.source(), Some(path.as_path()));

        let prepared = PreparedAnalysis::from_record(&record, AnalysisMode::Structured);
        assert!(prepared.facts.is_empty());
        assert!(!prepared.request.case_instruction().is_empty());
    }

    #[test]
    fn rejected_key_is_reported_as_auth_failure() {
        let mock = Arc::new(MockLlmClient::failing(AnalysisError::Api {
            status: 401,
            body: "Unauthorized".into(),
        }));
        let err = pipeline_with(mock)
            .run(&MedicalRecord::from_text(RECORD), AnalysisMode::Narrative)
            .unwrap_err();
        assert!(err.is_auth_failure());
    }

    #[test]
    fn dump_dir_receives_run_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(MockLlmClient::new("analysis text")))
            .with_dump_dir(Some(tmp.path().to_path_buf()));

        let prepared = PreparedAnalysis::from_record(&MedicalRecord::from_text(RECORD), AnalysisMode::Narrative);
        let run_dir = tmp.path().join(prepared.run_id.to_string());
        pipeline.submit(prepared).unwrap();

        assert!(run_dir.join("00-facts.json").exists());
        let request = std::fs::read_to_string(run_dir.join("01-request.json")).unwrap();
        assert!(request.contains("\"mode\": \"narrative\""));
        let response = std::fs::read_to_string(run_dir.join("02-response.txt")).unwrap();
        assert_eq!(response, "analysis text");
    }

    #[test]
    fn dump_dir_records_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(MockLlmClient::failing(AnalysisError::EmptyResponse)))
            .with_dump_dir(Some(tmp.path().to_path_buf()));

        let prepared = PreparedAnalysis::from_record(&MedicalRecord::from_text("x"), AnalysisMode::RootCause);
        let run_dir = tmp.path().join(prepared.run_id.to_string());
        assert!(pipeline.submit(prepared).is_err());

        let error = std::fs::read_to_string(run_dir.join("02-error.txt")).unwrap();
        assert!(error.contains("no message"));
    }
}
