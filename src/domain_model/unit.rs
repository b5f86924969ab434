use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("page size must be a positive integer, got {0}")]
    NonPositivePageSize(i64),
}

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize)]
#[serde(try_from = "i64")]
pub struct PageSize(u32);

impl PageSize {
    pub const DEFAULT: PageSize = PageSize(20);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Accepts any positive value. Values beyond `u32::MAX` saturate; the store
/// applies its own cap anyway.
impl TryFrom<i64> for PageSize {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(ValidationError::NonPositivePageSize(value));
        }
        Ok(PageSize(u32::try_from(value).unwrap_or(u32::MAX)))
    }
}
