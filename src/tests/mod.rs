//! Binary-level tests: command line handling and whole-panel scenarios driven
//! through the public library API.
