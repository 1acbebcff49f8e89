//! Integration tests driving the full router in-process

mod api_tests;
mod loans_tests;
mod management_tests;
mod storage_tests;
