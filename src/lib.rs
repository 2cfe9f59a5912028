#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod attributes;
mod instruments;
mod propagation;

pub mod config;
pub mod middleware;
pub mod semconv;

pub use crate::config::{AttributeProvider, OtelConfig, RequestFilter, RouteInfo, SpanNameFormatter};
pub use crate::middleware::RouterExt;
