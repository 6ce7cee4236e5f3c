pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns a [`Corrupted`](crate::error::ErrorKind::Corrupted) error from the
/// enclosing function unless `cond` holds.
///
/// `file` names the index file the checked data was read from.
#[macro_export]
macro_rules! verify_data {
    ($file:expr, $cond:expr) => {
        if !$cond {
            return Err($crate::error::Error::corrupted(
                $file,
                concat!("check failed: ", stringify!($cond)),
            ));
        }
    };
}
