pub mod codec;
pub mod error;
pub mod fetch;

pub use error::{
    BatchDecodeError, ConvertError, DecodeError, FetchError, LinkFailure, RuleConfigError,
    SubscriptionError, ValidationError, ValidationReason,
};
pub use fetch::{ContentFetcher, HttpFetcher, StaticFetcher};
