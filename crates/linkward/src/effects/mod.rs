//! Side-effecting parts of a run: fetching, orchestration, reporting.

pub mod error_stream;
pub mod resolver;
pub mod stream;
pub mod validator;

pub use error_stream::ValidationErrorStream;
pub use resolver::{GeneratedFileResolver, SourceResolver};
pub use stream::{DEFAULT_OVERALL_TIMEOUT, DEFAULT_RETRY_ATTEMPTS, LinkStream};
pub use validator::{HttpLinkValidator, LinkValidator};
