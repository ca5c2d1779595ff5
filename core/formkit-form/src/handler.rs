use crate::error::SubmissionError;
use async_trait::async_trait;
use std::future::Future;

/// The operation run once a submission passes validation.
///
/// Expected business failures (for example "this email is already taken")
/// should come back as [`SubmissionError::Rejected`] naming the field they
/// belong to. The controller also survives [`SubmissionError::Unexpected`]
/// and panics; see [`UnexpectedFailurePolicy`](crate::UnexpectedFailurePolicy)
/// for what the user sees in that case.
///
/// A handler holding a clone of the [`FormController`](crate::FormController)
/// may also call `set_field_error` itself.
#[async_trait]
pub trait SubmissionHandler<T: Send + 'static>: Send + Sync {
    async fn submit(&self, record: T) -> Result<(), SubmissionError>;
}

#[async_trait]
impl<T, F, Fut> SubmissionHandler<T> for F
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), SubmissionError>> + Send + 'static,
{
    async fn submit(&self, record: T) -> Result<(), SubmissionError> {
        (self)(record).await
    }
}
