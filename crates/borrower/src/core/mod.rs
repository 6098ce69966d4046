pub mod approval;
pub mod borrow_sizing;
pub mod oracle;
pub mod orchestrator;
pub mod position;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;
