//! Resume analysis calls.

use tracing::debug;

use crate::analysis::{AnalysisRequest, ResumeAnalysis};
use crate::error::{Result, ServiceError, StatusWording};

use super::Client;

impl Client {
    /// Analyze a resume, optionally against a job description.
    ///
    /// Scores in the result are clamped to 0-100.
    pub async fn analyze_resume(&self, request: &AnalysisRequest) -> Result<ResumeAnalysis> {
        if request.resume_text.trim().is_empty() {
            return Err(ServiceError::request_failed("Resume text is required").into());
        }

        let url = &self.endpoints.analyze;
        debug!(
            url = %url,
            resume_chars = request.resume_text.len(),
            with_job = request.job_description.is_some(),
            "sending resume analysis request"
        );

        let request = self.post_with_timeout(url).json(request);
        let analysis: ResumeAnalysis = Self::call_json(request, &StatusWording::ANALYSIS).await?;

        debug!(score = analysis.overall_score, "resume analysis complete");
        Ok(analysis.normalized())
    }
}
