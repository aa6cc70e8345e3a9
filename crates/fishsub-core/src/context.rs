use uuid::Uuid;

/// Per-request identifier and user identifier, propagated into logs and
/// metrics for every stage invocation (spec C9).
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_id: user_id.into(),
        }
    }

    /// Binds `request_id` and `user_id` as structured fields on the current
    /// tracing span, for call sites that can't use
    /// `#[tracing::instrument(fields(...))]` directly (the context is
    /// constructed at the edge, not at the function signature).
    pub fn record_on_span(&self, span: &tracing::Span) {
        span.record("request_id", tracing::field::display(self.request_id));
        span.record("user_id", tracing::field::display(&self.user_id));
    }
}
