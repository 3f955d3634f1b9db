//! Health summary generation from accumulated measurements.

use super::client::ChatClient;
use super::prompt::{build_summary_prompt, SUMMARY_SYSTEM_PROMPT};
use super::StructuringError;
use crate::models::Parameter;

/// Ask the model for a short HTML summary of the user's health state based
/// on their accumulated parameters. Single request, no retry.
pub fn summarize_parameters(
    client: &dyn ChatClient,
    params: &[Parameter],
) -> Result<String, StructuringError> {
    if params.is_empty() {
        return Err(StructuringError::NoParameters);
    }

    let prompt = build_summary_prompt(params);

    tracing::info!(parameters = params.len(), "Requesting health summary");
    client.complete(SUMMARY_SYSTEM_PROMPT, &prompt)
}
