//! Request/response body tracing for `--debug`.

use aws_sdk_sts::{
    config::{
        ConfigBag, Intercept, RuntimeComponents,
        interceptors::{AfterDeserializationInterceptorContextRef, BeforeTransmitInterceptorContextRef},
    },
    error::BoxError,
};
use aws_smithy_types::body::SdkBody;
use log::trace;

/// Logs every STS request body before it is sent and every response body
/// once it has been read.
#[derive(Debug)]
pub struct WireLogger;

impl Intercept for WireLogger {
    fn name(&self) -> &'static str {
        "WireLogger"
    }

    fn read_before_transmit(
        &self,
        context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let request = context.request();
        trace!(
            "Request {} {}: {}",
            request.method(),
            request.uri(),
            render_body(request.body())
        );
        Ok(())
    }

    fn read_after_deserialization(
        &self,
        context: &AfterDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let response = context.response();
        trace!(
            "Response {}: {}",
            response.status().as_u16(),
            render_body(response.body())
        );
        Ok(())
    }
}

/// In-memory bodies as (lossy) UTF-8; streaming bodies are not consumed.
pub fn render_body(body: &SdkBody) -> String {
    match body.bytes() {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => "<streaming body>".to_string(),
    }
}
