/*! # Smartsync Tests

Two-peer harness used to run the replicated object state machine end to end, with in-memory
test doubles for every host capability.
*/
pub mod host;
pub mod stepper;

#[cfg(test)]
mod scenarios;
