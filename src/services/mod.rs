pub mod action_lock;
pub mod batch_source;
pub mod feedback;
pub mod providers;
pub mod queue;

pub use action_lock::ActionLock;
pub use batch_source::{Batch, FallbackSource, RecommendationSource};
pub use feedback::{ActionOutcome, FeedbackRecorder};
pub use providers::{PaperApiClient, PaperSource, RecommendationResponse};
pub use queue::{FeedSnapshot, FeedStatus, History, QueueManager, QueueSettings};
