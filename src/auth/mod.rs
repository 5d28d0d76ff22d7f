pub mod api_fetch;
pub mod session;
pub mod storage;
