// Integration tests for the branch manager and hierarchy builder
// Run with: cargo test --test integration

mod scylla_store;
mod session_flow;
