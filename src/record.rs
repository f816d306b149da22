//! # Fixed-size records
//!
//! The alternative to chunks as a message body: a run of records that all share one
//! [`RecordSchema`]. Every field has a fixed width, so every record has the same size and
//! the body needs no per-record framing.

use crate::{
    cursor::{ByteCursor, ByteWriter, WriteBuf},
    errors::{CodecError, Result},
    field::{decode_value, encode_value, FieldType, Value},
};
use smallvec::SmallVec;
use std::iter::FromIterator;

/// An ordered list of named, fixed-width fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordSchema {
    fields: Vec<(String, FieldType)>,
    size: usize,
}

impl RecordSchema {
    /// Builds a schema, checking every field has a fixed width and a unique name.
    ///
    /// # Errors
    ///
    /// * [`CodecError::VariableField`] for a field without a fixed width.
    /// * [`CodecError::DuplicateField`] for a name used twice.
    /// * [`CodecError::EmptyRecord`] if the fields add up to zero bytes. A header count
    ///   could not be checked against the body for such records.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let mut out: Vec<(String, FieldType)> = Vec::new();
        let mut size = 0;
        for (name, ty) in fields {
            let name = name.into();
            if out.iter().any(|(n, _)| *n == name) {
                return Err(CodecError::DuplicateField(name));
            }
            match ty.fixed_size() {
                Some(n) => size += n,
                None => return Err(CodecError::VariableField(name)),
            }
            out.push((name, ty));
        }
        if size == 0 {
            return Err(CodecError::EmptyRecord);
        }
        Ok(RecordSchema { fields: out, size })
    }

    /// Encoded size of one record.
    pub fn record_size(&self) -> usize { self.size }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Position of the field called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> { self.fields.iter().position(|(n, _)| n == name) }

    /// Checks that `record` has one value of the right kind per field.
    pub fn check(&self, record: &Record) -> Result<()> {
        if record.len() != self.len() {
            return Err(CodecError::ArityMismatch {
                expected: self.len(),
                found: record.len(),
            });
        }
        for ((name, ty), value) in self.fields.iter().zip(record.values()) {
            if !ty.accepts(value) {
                return Err(CodecError::FieldMismatch {
                    field: name.clone(),
                    expected: ty.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The values of one record, in schema order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Record {
    values: SmallVec<[Value; 8]>,
}

impl Record {
    pub fn new<I: IntoIterator<Item = Value>>(values: I) -> Self {
        Record {
            values: values.into_iter().collect(),
        }
    }

    pub fn values(&self) -> &[Value] { &self.values }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Looks up a value by the name `schema` gives its field.
    ///
    /// # Example
    ///
    /// ```
    /// use binframe::prelude::*;
    ///
    /// let schema = RecordSchema::new(vec![
    ///     ("id", FieldType::uint(Width::Two)),
    ///     ("temp", FieldType::float(FloatWidth::Single)),
    /// ])
    /// .unwrap();
    ///
    /// let rec = Record::new(vec![Value::from(7u16), Value::from(21.5f32)]);
    /// assert_eq!(rec.get(&schema, "id"), Some(&Value::from(7u16)));
    /// assert_eq!(rec.get(&schema, "humidity"), None);
    /// ```
    pub fn get(&self, schema: &RecordSchema, name: &str) -> Option<&Value> {
        schema.index_of(name).and_then(|i| self.values.get(i))
    }

    pub fn into_values(self) -> Vec<Value> { self.values.into_vec() }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self { Record::new(iter) }
}

impl From<Vec<Value>> for Record {
    fn from(v: Vec<Value>) -> Self {
        Record {
            values: SmallVec::from_vec(v),
        }
    }
}

/// Writes `record` as laid out by `schema`.
///
/// The whole record is checked against the schema before anything is written.
pub fn encode_record<B: WriteBuf>(w: &mut ByteWriter<B>, schema: &RecordSchema, record: &Record) -> Result<()> {
    schema.check(record)?;
    for ((name, ty), value) in schema.fields.iter().zip(record.values()) {
        encode_value(w, ty, value).map_err(|e| match e {
            CodecError::FieldMismatch { expected, .. } => CodecError::FieldMismatch {
                field: name.clone(),
                expected,
            },
            other => other,
        })?;
    }
    Ok(())
}

/// Reads one record laid out by `schema`.
///
/// # Errors
///
/// [`CodecError::Truncated`] if fewer than [`RecordSchema::record_size`] bytes remain.
/// The cursor does not move on error.
pub fn decode_record(c: &mut ByteCursor<'_>, schema: &RecordSchema) -> Result<Record> {
    if c.remaining() < schema.record_size() {
        return Err(CodecError::Truncated {
            offset: c.position(),
            expected: schema.record_size(),
            available: c.remaining(),
        });
    }
    c.atomically(|c| {
        schema
            .fields
            .iter()
            .map(|(_, ty)| decode_value(c, ty))
            .collect::<Result<Record>>()
    })
}

/// Reads exactly `count` records, requiring they fill the buffer when `exact`.
///
/// # Errors
///
/// * [`CodecError::Truncated`] if the buffer cannot hold `count` records.
/// * [`CodecError::CountMismatch`] if `exact` and bytes remain afterwards.
pub fn decode_all_records(
    c: &mut ByteCursor<'_>,
    schema: &RecordSchema,
    count: usize,
    exact: bool,
) -> Result<Vec<Record>> {
    let needed = count.checked_mul(schema.record_size()).unwrap_or(usize::max_value());
    if c.remaining() < needed {
        return Err(CodecError::Truncated {
            offset: c.position(),
            expected: needed,
            available: c.remaining(),
        });
    }
    if exact && c.remaining() > needed {
        return Err(CodecError::CountMismatch {
            expected: count,
            offset: c.position() + needed,
            trailing: c.remaining() - needed,
        });
    }
    c.atomically(|c| (0..count).map(|_| decode_record(c, schema)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cursor::Endian,
        field::{FloatWidth, Width},
    };

    fn sensor_schema() -> RecordSchema {
        RecordSchema::new(vec![
            ("id", FieldType::uint(Width::Four)),
            ("delta", FieldType::int(Width::One)),
            ("reading", FieldType::float(FloatWidth::Double)),
            ("label", FieldType::text(5)),
        ])
        .unwrap()
    }

    fn sensor(id: u32, delta: i8, reading: f64, label: &str) -> Record {
        Record::new(vec![
            Value::from(id),
            Value::from(delta),
            Value::from(reading),
            Value::from(label),
        ])
    }

    #[test]
    fn size_is_sum_of_widths() {
        let schema = sensor_schema();
        assert_eq!(schema.record_size(), 4 + 1 + 8 + 5);
        assert_eq!(schema.len(), 4);
        assert_eq!(schema.index_of("reading"), Some(2));
        let names: Vec<_> = schema.fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["id", "delta", "reading", "label"]);
    }

    #[test]
    fn schema_rejects_variable_and_duplicate_fields() {
        assert_eq!(
            RecordSchema::new(vec![("blob", FieldType::blob(Width::Two))]),
            Err(CodecError::VariableField("blob".to_string()))
        );
        assert_eq!(
            RecordSchema::new(vec![
                ("a", FieldType::uint(Width::One)),
                ("a", FieldType::int(Width::One)),
            ]),
            Err(CodecError::DuplicateField("a".to_string()))
        );
    }

    #[test]
    fn record_round_trip() {
        let schema = sensor_schema();
        let records = vec![sensor(1, -3, 20.5, "east"), sensor(u32::max_value(), 127, -0.0, "north")];

        let mut w = ByteWriter::new(Endian::Little);
        for r in &records {
            encode_record(&mut w, &schema, r).unwrap();
        }
        let out = w.finish();
        assert_eq!(out.len(), 2 * schema.record_size());

        let mut c = ByteCursor::new(&out, Endian::Little);
        let decoded = decode_all_records(&mut c, &schema, 2, true).unwrap();
        assert_eq!(decoded, records);
        assert_eq!(
            decoded[1].get(&schema, "label").and_then(Value::as_text),
            Some("north")
        );
    }

    #[test]
    fn mismatched_records_write_nothing() {
        let schema = sensor_schema();
        let mut w = ByteWriter::new(Endian::Big);

        let short = Record::new(vec![Value::from(1u32)]);
        assert_eq!(
            encode_record(&mut w, &schema, &short),
            Err(CodecError::ArityMismatch {
                expected: 4,
                found: 1,
            })
        );

        let wrong = Record::new(vec![
            Value::from(1u32),
            Value::from("x"),
            Value::from(1.0f64),
            Value::from("y"),
        ]);
        assert_eq!(
            encode_record(&mut w, &schema, &wrong),
            Err(CodecError::FieldMismatch {
                field: "delta".to_string(),
                expected: FieldType::int(Width::One),
            })
        );
        assert_eq!(w.written(), 0);
    }

    #[test]
    fn out_of_range_value_is_reported() {
        let schema = sensor_schema();
        let mut w = ByteWriter::new(Endian::Big);
        let rec = sensor(1, 0, 0.0, "way too long");
        assert_eq!(
            encode_record(&mut w, &schema, &rec),
            Err(CodecError::TextTooLong { len: 12, width: 5 })
        );
    }

    #[test]
    fn record_count_enforcement() {
        let schema = RecordSchema::new(vec![("v", FieldType::uint(Width::Two))]).unwrap();
        let buf = [0u8, 1, 0, 2, 0, 3];

        let mut c = ByteCursor::new(&buf, Endian::Big);
        assert_eq!(
            decode_all_records(&mut c, &schema, 4, true),
            Err(CodecError::Truncated {
                offset: 0,
                expected: 8,
                available: 6,
            })
        );
        assert_eq!(
            decode_all_records(&mut c, &schema, 2, true),
            Err(CodecError::CountMismatch {
                expected: 2,
                offset: 4,
                trailing: 2,
            })
        );
        let two = decode_all_records(&mut c, &schema, 2, false).unwrap();
        assert_eq!(two[1].values(), &[Value::from(2u16)]);
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn zero_size_schemas_are_refused() {
        assert_eq!(
            RecordSchema::new(Vec::<(String, FieldType)>::new()),
            Err(CodecError::EmptyRecord)
        );
        assert_eq!(
            RecordSchema::new(vec![("a", FieldType::text(0)), ("b", FieldType::text(0))]),
            Err(CodecError::EmptyRecord)
        );
        let one = RecordSchema::new(vec![("a", FieldType::text(0)), ("b", FieldType::uint(Width::One))]).unwrap();
        assert_eq!(one.record_size(), 1);
    }
}
