pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn collect() -> LogCtx<ops::collect::Collect> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn detail() -> LogCtx<ops::detail::Detail> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn report() -> LogCtx<ops::report::Report> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
