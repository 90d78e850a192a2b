//! Pure building blocks of a validation run.
//!
//! Nothing in here performs network I/O: clocks and rate limits decide
//! *when*, policies decide *whether to go on*, fragment validators decide
//! whether an anchor exists in a response that has already been fetched.

pub mod clock;
pub mod fragment;
pub mod pattern;
pub mod policy;
pub mod rate_limit;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fragment::{AlwaysValid, FragmentValidator, GitHubRawFragmentValidator, HtmlFragmentValidator};
pub use pattern::full_match;
pub use policy::{AggregatePolicy, PolicyOutcome, count_at_least, count_at_most};
pub use rate_limit::{RateLimit, RequestsPerInterval, Unlimited};
