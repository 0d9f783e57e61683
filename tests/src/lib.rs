//! End-to-end tests for the calculator client, run against the in-process devnet.

#[cfg(test)]
mod e2e;
