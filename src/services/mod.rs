//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They are
//! responsible for:
//! - Implementing business rules (ownership, moderation, rating averages)
//! - Coordinating between repositories
//! - Handling validation and error cases

pub mod business;
pub mod content;
pub mod error;
pub mod event;
pub mod moderation;
pub mod password;
pub mod profile;
pub mod review;
pub mod signals;
pub mod user;

pub use business::{BusinessDetail, BusinessDirectory, BusinessService};
pub use content::{map_url, ContentService, Library};
pub use error::{DirectoryError, DirectoryResult};
pub use event::EventService;
pub use moderation::{ActionReport, ModerationService, PromotionReport};
pub use password::{hash_password, verify_password};
pub use profile::ProfileService;
pub use review::ReviewService;
pub use signals::{ProfileSignal, UserObserver};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
