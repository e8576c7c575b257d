//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one aggregate and dispatches on
//! the configured driver.

pub mod business;
pub mod category;
pub mod claim;
pub mod event;
pub mod message;
pub mod moderation;
pub mod post;
pub mod profile;
pub mod report;
pub mod review;
pub mod session;
pub mod suggestion;
pub mod user;

pub use business::{BusinessRepository, SqlxBusinessRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use claim::{ClaimRepository, SqlxClaimRepository};
pub use event::{EventRepository, SqlxEventRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use moderation::{ModerationRepository, ModerationTarget, SqlxModerationRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use profile::{ProfileRepository, SqlxProfileRepository};
pub use report::{ReportRepository, SqlxReportRepository};
pub use review::{ReviewRepository, SqlxReviewRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use suggestion::{SqlxSuggestionRepository, SuggestionRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// `!` needs no quoting in either dialect; MySQL reads `'\\'` as an escape sequence.
const LIKE_ESCAPE: char = '!';

/// Make `term` match literally inside a `LIKE` pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// WHERE clause assembled from optional listing filters.
///
/// Every bound value is text, so both drivers bind them in order before
/// any LIMIT/OFFSET parameters.
#[derive(Debug, Default)]
pub(crate) struct SqlFilter {
    clauses: Vec<String>,
    binds: Vec<String>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = ?`
    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.clauses.push(format!("{} = ?", column));
        self.binds.push(value.into());
        self
    }

    /// `column = ?` when a value is present
    pub fn eq_opt(self, column: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    /// Substring match across any of `columns`; blank terms are ignored
    pub fn search(mut self, columns: &[&str], term: Option<&str>) -> Self {
        let term = match term.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return self,
        };
        let pattern = format!("%{}%", escape_like(term));
        let ors: Vec<String> = columns
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '{}'", c, LIKE_ESCAPE))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.binds.push(pattern.clone());
        }
        self
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn binds(&self) -> &[String] {
        &self.binds
    }
}
