//! Script cloning integration tests.
//!
//! Each test lays out a base directory with a seed script, a definition
//! file and data files, runs the cloner against it and checks the output
//! scripts and the rewritten data files.

mod count;
mod fixture;
mod scenarios;
