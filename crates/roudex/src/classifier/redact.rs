use crate::classifier::Classifier;
use crate::error::{Failure, DATA_EXTRACTION_ERROR};

/// Hides the message of server errors, which may carry storage engine details
#[derive(Default, Clone, Copy, Debug)]
pub struct RedactingClassifier;

impl Classifier for RedactingClassifier {
    fn classify(&self, failure: Failure) -> Failure {
        if failure.is_server_error() { failure.with_message(DATA_EXTRACTION_ERROR) } else { failure }
    }
}

#[cfg(test)]
mod tests {
    use super::RedactingClassifier;
    use crate::classifier::{Classifier, ClassifierExt, LoggingClassifier};
    use crate::error::{Failure, DATA_EXTRACTION_ERROR};

    #[test]
    fn test_redacts_server_errors_only() {
        let classifier = LoggingClassifier.and_then(RedactingClassifier);

        let redacted = classifier.classify(Failure::storage("password authentication failed for user"));
        assert_eq!(redacted.message(), DATA_EXTRACTION_ERROR);
        assert_eq!(redacted.code(), 500);

        assert_eq!(classifier.classify(Failure::not_found()), Failure::not_found());
    }
}
