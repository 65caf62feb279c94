//! Generated key requests

/// Which generated keys a prepared statement should make available
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyRequest {
    /// Do not ask the driver for generated keys
    #[default]
    Off,
    /// Whatever keys the driver considers generated
    Auto,
    /// Keys from the named columns
    Columns(Vec<String>),
    /// Keys from the given 1-based column positions
    Indexes(Vec<i32>),
}

impl KeyRequest {
    pub fn is_off(&self) -> bool {
        matches!(self, KeyRequest::Off)
    }
}
