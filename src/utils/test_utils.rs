//! Test utilities for running programs.
