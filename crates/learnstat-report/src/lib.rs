//! Report rendering for learnstat learning reports.

pub mod html;
