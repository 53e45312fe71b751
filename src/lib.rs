//! Monthly ledger of work activity. Every day can hold project hours or a vacation, and a month
//! can be exported as a report with legal holidays, weekends and totals filled in.
//!

pub mod calendar;
pub mod cli;
pub mod report;
pub mod storage;
pub mod utils;
