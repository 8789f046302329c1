//! Workspace-level scenario tests for fibgen live in `tests/`.
