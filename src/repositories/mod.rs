pub(crate) mod enrollments;
pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod sections;
pub(crate) mod users;

const MAX_PAGE_SIZE: i64 = 1000;

/// Offset window for list queries, clamped to what the database is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Page {
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

impl Page {
    pub(crate) fn new(skip: i64, limit: i64) -> Self {
        Self { skip: skip.max(0), limit: limit.clamp(1, MAX_PAGE_SIZE) }
    }
}
