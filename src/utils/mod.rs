//! Utility modules for waitfor

pub mod logging;
