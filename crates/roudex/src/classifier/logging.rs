use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::error::Failure;

/// Emits one event per failure and passes it through unchanged
#[derive(Default, Clone, Copy, Debug)]
pub struct LoggingClassifier;

impl Classifier for LoggingClassifier {
    fn classify(&self, failure: Failure) -> Failure {
        if failure.is_server_error() {
            warn!(code = failure.code(), message = failure.message(), "extraction failed");
        } else {
            debug!(code = failure.code(), message = failure.message(), "extraction failed");
        }
        failure
    }
}
