use cfn_athena_shared::types::CustomResourceResponse;
use cfn_athena_shared::ResourceError;

/// Upload the result to the presigned S3 URL CloudFormation is polling.
///
/// The URL is signed without a content type, so the header must be empty.
pub async fn send(
    client: &reqwest::Client,
    response_url: &str,
    response: &CustomResourceResponse,
) -> Result<(), ResourceError> {
    let body =
        serde_json::to_string(response).map_err(|e| ResourceError::Response(e.to_string()))?;

    if response_url.is_empty() {
        tracing::warn!("Event has no ResponseURL, not sending {}", body);
        return Ok(());
    }

    tracing::debug!("Response body: {}", body);

    let result = client
        .put(response_url)
        .header("content-type", "")
        .body(body)
        .send()
        .await
        .map_err(|e| ResourceError::Response(e.to_string()))?;

    let status = result.status();
    if !status.is_success() {
        return Err(ResourceError::Response(format!(
            "CloudFormation answered with status {}",
            status
        )));
    }

    tracing::info!("Response sent to CloudFormation");
    Ok(())
}
