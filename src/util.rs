#[macro_export]
/// Helper macro to make implementing `From` easier.
macro_rules! from_fn {
    ($to:ty, $from:ty, $fn:expr) => {
        impl From<$from> for $to {
            fn from(f: $from) -> $to { $fn(f) }
        }
    };
}

#[macro_export]
/// Builds a [`RecordSchema`](crate::record::RecordSchema) from `name => type` pairs.
///
/// Evaluates to a `Result`, since the schema is validated on construction.
///
/// # Example
///
/// ```
/// use binframe::{prelude::*, record_schema};
///
/// let schema = record_schema! {
///     "id" => FieldType::uint(Width::Four),
///     "name" => FieldType::text(8),
/// }
/// .unwrap();
///
/// assert_eq!(schema.record_size(), 12);
/// ```
macro_rules! record_schema {
    ($($name:expr => $ty:expr),* $(,)?) => {
        $crate::record::RecordSchema::new(vec![$(($name, $ty)),*])
    };
}

/// Sums bytes into a `u32`, wrapping on overflow.
#[inline]
pub(crate) fn wrapping_sum(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)))
}
