//! Domain tests module.
//!
//! Property tests: proptest-based randomized testing for the reducer and
//! reaction-state invariants. Example-based transition tests live next to
//! the reducer itself.
