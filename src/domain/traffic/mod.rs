//! Traffic domain - endpoint weights and randomized outcome sampling.

mod endpoints;
mod sampler;

pub use endpoints::{EndpointTable, WeightedEndpoint};
pub use sampler::{
    TrafficSampler, BACKGROUND_ERROR_RATE, ERROR_DURATION_MS, SUCCESS_DURATION_MS,
    USER_CALL_ERROR_RATE,
};
