//! Data models
//!
//! Plain records mirrored by the database tables, plus the input structs the
//! services accept.

mod business;
mod category;
mod claim;
mod event;
mod message;
mod moderation;
mod pagination;
mod post;
mod profile;
mod report;
mod review;
mod session;
mod suggestion;
mod user;

pub use business::{round2, Business, CreateBusinessInput, UpdateBusinessInput};
pub use category::{slugify, Category};
pub use claim::{BusinessClaim, CreateClaimInput};
pub use event::{CreateEventInput, CulturalEvent};
pub use message::{InboxMessage, OwnerMessage};
pub use moderation::ModerationStatus;
pub use pagination::{ListParams, PagedResult};
pub use post::{CreatePostInput, Post, PostKind};
pub use profile::{avatar_url, ProfileView, Rank, UpdateProfileInput, UserProfile};
pub use report::{CommentReport, ReportView};
pub use review::{is_valid_score, Comment, CommentWithScore, Rating, MAX_SCORE, MIN_SCORE};
pub use session::Session;
pub use suggestion::{BusinessSuggestion, CreateSuggestionInput};
pub use user::{User, UserRole};
