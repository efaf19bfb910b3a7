//! Input/output node types: workflow entry and exit markers plus the
//! HTTP request node.

pub mod end;
pub mod http_request;
pub mod start;

pub use end::EndProcessor;
pub use http_request::HttpRequestProcessor;
pub use start::StartProcessor;
