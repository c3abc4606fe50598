//! Wire messages of the control service.
//!
//! Equivalent schema (package `uihost.control`):
//!
//! ```proto
//! message ControlRequest {
//!   uint64 request_id = 1;
//!   oneof payload {
//!     HandshakeRequest handshake = 10;
//!     OpenPageRequest open_page = 11;
//!     PageStatusRequest page_status = 12;
//!     ShutdownRequest shutdown = 13;
//!   }
//! }
//!
//! message ControlResponse {
//!   uint64 request_id = 1;
//!   oneof payload {
//!     HandshakeResponse handshake = 10;
//!     OpenPageResponse open_page = 11;
//!     PageStatusResponse page_status = 12;
//!     ShutdownResponse shutdown = 13;
//!     ErrorResponse error = 20;
//!   }
//! }
//! ```
//!
//! The derives are written out here so the crate builds without `protoc`.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ControlRequest {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(oneof = "control_request::Payload", tags = "10, 11, 12, 13")]
    pub payload: ::core::option::Option<control_request::Payload>,
}

pub mod control_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "10")]
        Handshake(super::HandshakeRequest),
        #[prost(message, tag = "11")]
        OpenPage(super::OpenPageRequest),
        #[prost(message, tag = "12")]
        PageStatus(super::PageStatusRequest),
        #[prost(message, tag = "13")]
        Shutdown(super::ShutdownRequest),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ControlResponse {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(oneof = "control_response::Payload", tags = "10, 11, 12, 13, 20")]
    pub payload: ::core::option::Option<control_response::Payload>,
}

pub mod control_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "10")]
        Handshake(super::HandshakeResponse),
        #[prost(message, tag = "11")]
        OpenPage(super::OpenPageResponse),
        #[prost(message, tag = "12")]
        PageStatus(super::PageStatusResponse),
        #[prost(message, tag = "13")]
        Shutdown(super::ShutdownResponse),
        #[prost(message, tag = "20")]
        Error(super::ErrorResponse),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HandshakeRequest {
    #[prost(string, tag = "1")]
    pub session_token: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub client_version: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HandshakeResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub server_version: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenPageRequest {
    #[prost(string, tag = "1")]
    pub command_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub page_url: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenPageResponse {
    #[prost(string, tag = "1")]
    pub command_id: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub accepted: bool,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PageStatusRequest {
    #[prost(string, tag = "1")]
    pub command_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PageStatusResponse {
    #[prost(string, tag = "1")]
    pub command_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub status: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub message: ::prost::alloc::string::String,
    #[prost(int32, tag = "4")]
    pub progress_percent: i32,
    #[prost(int64, tag = "5")]
    pub timestamp_millis: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShutdownRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ShutdownResponse {
    #[prost(bool, tag = "1")]
    pub acknowledged: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorResponse {
    #[prost(enumeration = "ErrorCode", tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    Unspecified = 0,
    InvalidMessage = 1,
    InternalError = 2,
}
