//! Resume analysis request and response types.
//!
//! The `analyze-resume` function scores a resume, optionally against a job
//! description, and returns a structured [`ResumeAnalysis`].

use serde::{Deserialize, Serialize};

/// Request body for the resume analysis function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Plain text of the resume.
    pub resume_text: String,
    /// Job description to match against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
}

impl AnalysisRequest {
    /// Create a request for a resume on its own.
    #[must_use]
    pub fn new(resume_text: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            job_description: None,
        }
    }

    /// Match against a job description as well.
    #[must_use]
    pub fn with_job_description(mut self, job_description: impl Into<String>) -> Self {
        let jd = job_description.into();
        self.job_description = (!jd.trim().is_empty()).then_some(jd);
        self
    }
}

/// Structured result of a resume analysis.
///
/// Scores are passed through from the model as JSON numbers, so they may be
/// fractional or out of range until [`normalized`](Self::normalized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    /// Overall strength of the resume, 0-100.
    pub overall_score: f64,
    /// Match against the job description, 0-100; absent without one.
    #[serde(default)]
    pub job_match_score: Option<f64>,
    /// Skills found in the resume.
    #[serde(default)]
    pub matched_skills: Vec<String>,
    /// Expected skills that are missing.
    #[serde(default)]
    pub missing_skills: Vec<String>,
    /// Suggested improvements.
    #[serde(default)]
    pub improvements: Vec<String>,
    /// Identified strengths.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Free-text summary.
    #[serde(default)]
    pub summary: String,
}

impl ResumeAnalysis {
    /// Scores clamped into 0-100; the model occasionally overshoots.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.overall_score = clamp_score(self.overall_score);
        self.job_match_score = self.job_match_score.map(clamp_score);
        self
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}
