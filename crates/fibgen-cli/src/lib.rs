//! # fibgen-cli
//!
//! Output formatting, result presenters, and shell completion.

pub mod completion;
pub mod output;
pub mod presenter;
pub mod ui;

pub use presenter::{JsonPresenter, ReportPresenter, RunReport, TextPresenter};
