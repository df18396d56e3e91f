//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware required.

mod mock_ports;
mod orchestrator_flow_tests;
mod provisioning_flow_tests;
mod run_loop_tests;
