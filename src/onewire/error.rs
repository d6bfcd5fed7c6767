pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus line error
    Pin(E),

    /// The CRC byte read back from the device does not match the data it covers. The bus timing is
    /// off or the device was disturbed mid-transfer.
    CrcMismatch,
}

impl<E> Error<E> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Error::Pin(_) => "Pin error",
            Error::CrcMismatch => "CRC mismatch",
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::Pin(value)
    }
}
