use crate::classifier::Classifier;
use crate::error::Failure;

#[derive(Copy, Clone)]
pub struct ClassifierFn<F> {
    f: F,
}

pub fn classifier_fn<F>(f: F) -> ClassifierFn<F>
where
    F: Fn(Failure) -> Failure + Send + Sync,
{
    ClassifierFn { f }
}

impl<F> Classifier for ClassifierFn<F>
where
    F: Fn(Failure) -> Failure + Send + Sync,
{
    fn classify(&self, failure: Failure) -> Failure {
        (self.f)(failure)
    }
}
