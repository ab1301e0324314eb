//! Failure classification.
//!
//! Every [`Failure`] passes through the configured [`Classifier`] before a responder sees it.
//! The default is [`IdentityClassifier`]; classifiers compose left to right with
//! [`ClassifierExt::and_then`].

mod classifier_composer;
mod classifier_fn;
mod identity;
mod logging;
mod redact;

pub use classifier_composer::ClassifierComposer;
pub use classifier_fn::{classifier_fn, ClassifierFn};
pub use identity::IdentityClassifier;
pub use logging::LoggingClassifier;
pub use redact::RedactingClassifier;

use crate::error::Failure;

pub trait Classifier: Send + Sync {
    fn classify(&self, failure: Failure) -> Failure;
}

pub trait ClassifierExt: Classifier {
    fn and_then<C>(self, classifier: C) -> ClassifierComposer<Self, C>
    where
        Self: Sized,
    {
        ClassifierComposer::new(self, classifier)
    }

    fn compose<C>(self, classifier: C) -> ClassifierComposer<C, Self>
    where
        Self: Sized,
    {
        ClassifierComposer::new(classifier, self)
    }
}

impl<T: Classifier + ?Sized> ClassifierExt for T {}
