//! Prompt composition for cause-of-death analysis.
//!
//! A request is a fixed persona (system message) plus a case instruction
//! (user message) that embeds either the raw record text or the extracted
//! fact lists. Composition is a pure function of its inputs and never fails,
//! even on empty input.

use super::types::{AnalysisMode, AnalysisRequest};
use crate::pipeline::extraction::{ExtractedFacts, FactCategory};

/// Five-step death-certification persona used in narrative mode.
pub const DEATH_CERTIFICATION_PERSONA: &str = "\
You are an expert medical coder with over 20 years of experience in clinical documentation \
and ICD-10 coding. You have extensive knowledge in reviewing medical records across all \
specialties including emergency medicine, internal medicine, surgery, obstetrics, and critical care.

APPROACH EACH MEDICAL RECORD LIKE THIS:

1. INITIAL ASSESSMENT:
   - Review complete record thoroughly
   - Identify department/setting (Emergency, Ward, ICU, etc.)
   - Note patient demographics and presentation
   - Understand timeline of events
   - Identify key clinical findings and interventions

2. CLINICAL CONTEXT ANALYSIS:
   - Assess if this is an emergency/acute presentation or chronic condition
   - Look for pre-existing conditions and their relationship to death
   - Evaluate documented symptoms, signs, and test results
   - Consider the clinical progression and response to interventions
   - Check if death was witnessed or unwitnessed
   - Review any resuscitation attempts and their outcomes

3. CAUSE OF DEATH DETERMINATION:
   Direct Cause:
   - What immediately led to death?
   - Is it clearly documented in the record?
   - Are there objective clinical findings supporting this?

   Intermediate Causes:
   - What conditions led to the direct cause?
   - Are there clear causal relationships?
   - Is the sequence clinically logical?

   Underlying Cause:
   - What started the chain of events?
   - Is it documented in the history?
   - Does it make clinical sense?

4. TIME INTERVAL ASSESSMENT:
   - Use documented dates/times when available
   - Look for disease progression markers
   - Consider typical disease trajectories when exact times aren't given
   - Be honest about uncertainty - use \"Unknown\" if not clear

5. SPECIAL CONSIDERATIONS:
   For Emergency Cases:
   - Note exact timings of events
   - Document interventions and responses
   - Consider pre-hospital events

   For Maternal Cases:
   - Check if female aged 15-49
   - Verify pregnancy status or recent delivery
   - Look for pregnancy-related complications
   - Exclude external causes

   For Chronic Conditions:
   - Evaluate disease progression
   - Note complications
   - Consider multiple organ involvement";

/// Concise root-cause coder persona used in structured and root-cause modes.
pub const ROOT_CAUSE_PERSONA: &str = "\
You are a medical coding expert specializing in determining underlying causes of death \
and assigning appropriate ICD-10 codes. Analyze the medical record to determine the true \
underlying cause of death, not just the immediate cause.";

const DEATH_CERTIFICATION_CHECKLIST: &str = "\
Based on your expert analysis of this medical record, provide:

CLINICAL SCENARIO:
[Provide clear, concise summary of the case and key events]

DEATH CERTIFICATION:
Direct Cause of Death: [Diagnosis with ICD code]
Time Interval: [Specify]

First Intermediate Cause: [Diagnosis with ICD code if present]
Time Interval: [Specify]

Second Intermediate Cause: [Diagnosis with ICD code if present]
Time Interval: [Specify]

Underlying Cause: [Diagnosis with ICD code]
Time Interval: [Specify]

MATERNAL MORTALITY: [Yes/No/Not Applicable with clear reasoning]

CLINICAL REASONING:
[Explain your coding decisions, including why you chose these causes and sequence]";

const ROOT_CAUSE_INSTRUCTIONS: &str = "\
Please analyze this medical record and:
1. Identify the underlying root cause of death
2. Explain the causal chain leading to death
3. Suggest the most appropriate ICD-10 code for the underlying cause
4. Provide rationale for why this is the root cause rather than immediate cause";

/// Separator between entries of one fact list.
pub const FACT_DELIMITER: &str = ", ";

/// Rendered in place of an empty fact list.
pub const EMPTY_FACT_LIST: &str = "None documented";

/// Which fixed instruction set the case instruction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTemplate {
    /// Output checklist: scenario, cause tiers with codes and intervals,
    /// maternal mortality, reasoning.
    DeathCertification,
    /// Four points: root cause, causal chain, code, root-vs-immediate rationale.
    RootCause,
}

impl CaseTemplate {
    fn instructions(&self) -> &'static str {
        match self {
            Self::DeathCertification => DEATH_CERTIFICATION_CHECKLIST,
            Self::RootCause => ROOT_CAUSE_INSTRUCTIONS,
        }
    }
}

/// What the case instruction embeds.
#[derive(Debug, Clone, Copy)]
pub enum RecordPayload<'a> {
    /// Raw record text, embedded verbatim.
    Narrative(&'a str),
    /// Extracted (possibly reviewer-edited) fact lists.
    Facts(&'a ExtractedFacts),
}

/// Build a request from a persona, an instruction template and a payload.
pub fn compose(persona: &str, template: CaseTemplate, payload: RecordPayload<'_>) -> AnalysisRequest {
    let mode = match (template, payload) {
        (_, RecordPayload::Facts(_)) => AnalysisMode::Structured,
        (CaseTemplate::DeathCertification, RecordPayload::Narrative(_)) => AnalysisMode::Narrative,
        (CaseTemplate::RootCause, RecordPayload::Narrative(_)) => AnalysisMode::RootCause,
    };

    let case_instruction = render_case_instruction(template, payload);

    tracing::debug!(
        mode = %mode,
        persona_chars = persona.len(),
        case_chars = case_instruction.len(),
        "Analysis request composed"
    );

    AnalysisRequest::new(mode, persona.to_string(), case_instruction)
}

/// Narrative mode: five-step persona, certification checklist, verbatim record.
pub fn compose_narrative(record_text: &str) -> AnalysisRequest {
    compose(
        DEATH_CERTIFICATION_PERSONA,
        CaseTemplate::DeathCertification,
        RecordPayload::Narrative(record_text),
    )
}

/// Structured mode: root-cause persona, four-point instructions, fact lists.
pub fn compose_structured(facts: &ExtractedFacts) -> AnalysisRequest {
    compose(
        ROOT_CAUSE_PERSONA,
        CaseTemplate::RootCause,
        RecordPayload::Facts(facts),
    )
}

/// Root-cause mode: root-cause persona, four-point instructions, verbatim record.
pub fn compose_root_cause(record_text: &str) -> AnalysisRequest {
    compose(
        ROOT_CAUSE_PERSONA,
        CaseTemplate::RootCause,
        RecordPayload::Narrative(record_text),
    )
}

/// Compose for a mode, using whichever payload the mode reads.
///
/// Structured mode reads `facts`; the other modes read `record_text`.
pub fn compose_for_mode(
    mode: AnalysisMode,
    record_text: &str,
    facts: &ExtractedFacts,
) -> AnalysisRequest {
    match mode {
        AnalysisMode::Narrative => compose_narrative(record_text),
        AnalysisMode::Structured => compose_structured(facts),
        AnalysisMode::RootCause => compose_root_cause(record_text),
    }
}

fn render_case_instruction(template: CaseTemplate, payload: RecordPayload<'_>) -> String {
    let instructions = template.instructions();
    match payload {
        RecordPayload::Narrative(text) => {
            format!("{instructions}\n\nMedical Record:\n{text}")
        }
        RecordPayload::Facts(facts) => {
            format!(
                "{instructions}\n\nExtracted Clinical Facts:\n{}",
                render_facts(facts)
            )
        }
    }
}

fn render_facts(facts: &ExtractedFacts) -> String {
    FactCategory::all()
        .iter()
        .map(|category| {
            let entries = facts.get(*category);
            let joined = if entries.is_empty() {
                EMPTY_FACT_LIST.to_string()
            } else {
                entries.join(FACT_DELIMITER)
            };
            format!("{}: {joined}", category.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
