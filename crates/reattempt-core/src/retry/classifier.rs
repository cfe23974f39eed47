//! Failure classification
//!
//! A classifier decides whether a failure raised by the operation is eligible
//! for retry. Failures it rejects are surfaced immediately, without consuming
//! an attempt or checking the deadline.

use std::borrow::Cow;
use std::fmt;

use super::reload::short_type_name;

/// A predicate that determines whether a failure should be retried
///
/// By default all failures are considered retryable ([`AlwaysRetry`]).
/// Narrow it to short-circuit retries for failures that a retry cannot fix.
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::FailureClassifier;
/// use std::io::{Error, ErrorKind};
///
/// struct TransientIo;
///
/// impl FailureClassifier<Error> for TransientIo {
///     fn is_retryable(&self, error: &Error) -> bool {
///         matches!(error.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted)
///     }
/// }
/// ```
pub trait FailureClassifier<E: ?Sized> {
    /// Determine whether the given failure should be retried
    fn is_retryable(&self, error: &E) -> bool;

    /// Category reported when the failure triggers a retry
    ///
    /// Defaults to the failure's type name without its module path.
    fn category_label(&self, error: &E) -> Cow<'static, str> {
        let _ = error;
        Cow::Borrowed(short_type_name(std::any::type_name::<E>()))
    }
}

/// Retries every failure
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> FailureClassifier<E> for AlwaysRetry {
    fn is_retryable(&self, _error: &E) -> bool {
        true
    }
}

/// Retries nothing; the first failure is terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl<E: ?Sized> FailureClassifier<E> for NeverRetry {
    fn is_retryable(&self, _error: &E) -> bool {
        false
    }
}

/// A classifier that uses a closure to determine retryability
pub struct ClosureClassifier<F> {
    predicate: F,
}

impl<F> ClosureClassifier<F> {
    /// Create a new closure-based classifier
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> FailureClassifier<E> for ClosureClassifier<F>
where
    F: Fn(&E) -> bool,
{
    fn is_retryable(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

/// Failures that expose a category discriminator
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::Categorized;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Kind {
///     InvalidOperation,
///     InvalidArgument,
/// }
///
/// struct ServiceError {
///     kind: Kind,
/// }
///
/// impl Categorized for ServiceError {
///     type Category = Kind;
///
///     fn category(&self) -> Kind {
///         self.kind
///     }
/// }
/// ```
pub trait Categorized {
    /// The discriminator type
    type Category: PartialEq + fmt::Debug;

    /// The category of this failure
    fn category(&self) -> Self::Category;
}

/// Retries only failures whose category is in a configured set
#[derive(Debug, Clone)]
pub struct CategoryClassifier<K> {
    categories: Vec<K>,
}

impl<K> CategoryClassifier<K> {
    /// Retry only failures of this category
    pub fn only(category: K) -> Self {
        Self {
            categories: vec![category],
        }
    }

    /// Retry failures of any of these categories
    pub fn any_of(categories: impl IntoIterator<Item = K>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// The categories considered retryable
    pub fn categories(&self) -> &[K] {
        &self.categories
    }
}

impl<E> FailureClassifier<E> for CategoryClassifier<E::Category>
where
    E: Categorized,
{
    fn is_retryable(&self, error: &E) -> bool {
        let category = error.category();
        self.categories.iter().any(|c| *c == category)
    }

    fn category_label(&self, error: &E) -> Cow<'static, str> {
        Cow::Owned(format!("{:?}", error.category()))
    }
}

impl<E: ?Sized, C: FailureClassifier<E> + ?Sized> FailureClassifier<E> for &C {
    fn is_retryable(&self, error: &E) -> bool {
        (**self).is_retryable(error)
    }

    fn category_label(&self, error: &E) -> Cow<'static, str> {
        (**self).category_label(error)
    }
}

impl<E: ?Sized, C: FailureClassifier<E> + ?Sized> FailureClassifier<E> for Box<C> {
    fn is_retryable(&self, error: &E) -> bool {
        (**self).is_retryable(error)
    }

    fn category_label(&self, error: &E) -> Cow<'static, str> {
        (**self).category_label(error)
    }
}
