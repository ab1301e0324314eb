use crate::classifier::{Classifier, IdentityClassifier};
use crate::error::Failure;

#[derive(Debug)]
pub struct ClassifierComposer<C1, C2> {
    classifier_1: C1,
    classifier_2: C2,
}

impl<C1, C2> ClassifierComposer<C1, C2> {
    pub fn new(classifier_1: C1, classifier_2: C2) -> Self {
        Self { classifier_1, classifier_2 }
    }
}

impl Default for ClassifierComposer<IdentityClassifier, IdentityClassifier> {
    fn default() -> Self {
        Self::new(IdentityClassifier, IdentityClassifier)
    }
}

impl<C1, C2> Classifier for ClassifierComposer<C1, C2>
where
    C1: Classifier,
    C2: Classifier,
{
    fn classify(&self, failure: Failure) -> Failure {
        let output_1 = self.classifier_1.classify(failure);
        self.classifier_2.classify(output_1)
    }
}
