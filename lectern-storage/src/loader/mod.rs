//! Request-scoped batching.
//!
//! The generic [`Loader`] collapses the point lookups issued while one
//! request renders into a single bulk fetch per entity and memoizes every
//! answer for the rest of the request. [`LoaderContext`] bundles the five
//! concrete loaders and [`with_loader_scope`] makes one bundle ambient
//! per inbound request.

pub mod batch;
pub mod context;
pub mod entities;

pub use batch::{BatchFetch, BatchItem, Loader};
pub use context::{with_loader_scope, LoaderContext};
pub use entities::{
    course_loader, enrollment_loader, lesson_loader, progress_loader, user_loader,
};
