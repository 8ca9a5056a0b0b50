//! Instruction headers and user messages for the two generation stages.

pub mod planner;
pub mod writer;
