use binframe::prelude::*;
use proptest::prelude::*;

/// arbitrary byte order
pub fn arb_endian() -> impl Strategy<Value = Endian> { prop_oneof![Just(Endian::Big), Just(Endian::Little)] }

/// arbitrary integer or prefix width
pub fn arb_width() -> impl Strategy<Value = Width> {
    prop_oneof![
        Just(Width::One),
        Just(Width::Two),
        Just(Width::Four),
        Just(Width::Eight)
    ]
}

/// arbitrary float width
pub fn arb_float_width() -> impl Strategy<Value = FloatWidth> {
    prop_oneof![
        Just(FloatWidth::Half),
        Just(FloatWidth::Single),
        Just(FloatWidth::Double)
    ]
}

/// arbitrary checksum width
pub fn arb_checksum() -> impl Strategy<Value = ChecksumWidth> {
    prop_oneof![Just(ChecksumWidth::U8), Just(ChecksumWidth::U16)]
}

/// arbitrary Bytes for use with proptest
pub fn arb_bs(max: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=max).prop_map(Bytes::from)
}

/// arbitrary text without NUL, which fixed-width text cannot carry
pub fn arb_text(max_bytes: usize) -> impl Strategy<Value = String> {
    "[^\\x00]{0,16}".prop_map(move |mut s: String| {
        while s.len() > max_bytes {
            s.pop();
        }
        s
    })
}

/// arbitrary fixed-width field type
pub fn arb_fixed_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        (arb_width(), any::<bool>()).prop_map(|(width, signed)| FieldType::FixedInt { width, signed }),
        arb_float_width().prop_map(FieldType::float),
        (0usize..24).prop_map(FieldType::text),
    ]
}

/// arbitrary field type
pub fn arb_field_type() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        3 => arb_fixed_field_type(),
        1 => arb_width().prop_map(FieldType::blob),
    ]
}

fn arb_int(width: Width, signed: bool) -> BoxedStrategy<i128> {
    let bits = width.bits();
    if signed {
        let max = (1i128 << (bits - 1)) - 1;
        (-max - 1..=max).boxed()
    } else {
        (0..=i128::from(width.max_unsigned())).boxed()
    }
}

/// arbitrary value that fits `ty`
pub fn arb_value(ty: &FieldType) -> BoxedStrategy<Value> {
    match ty {
        FieldType::FixedInt { width, signed } => arb_int(*width, *signed).prop_map(Value::Int).boxed(),
        FieldType::Float { width } => match width {
            FloatWidth::Half => any::<u16>().prop_map(|n| Value::from(Float::Half(n))).boxed(),
            FloatWidth::Single => any::<u32>().prop_map(|n| Value::from(Float::Single(n))).boxed(),
            FloatWidth::Double => any::<u64>().prop_map(|n| Value::from(Float::Double(n))).boxed(),
        },
        FieldType::VarBlob { prefix } => {
            let max = (prefix.max_unsigned() as usize).min(300);
            arb_bs(max).prop_map(Value::Blob).boxed()
        }
        FieldType::FixedText { width } => arb_text(*width).prop_map(Value::Text).boxed(),
    }
}

/// arbitrary field type together with a value of that type
pub fn arb_typed_value() -> impl Strategy<Value = (FieldType, Value)> {
    arb_field_type().prop_flat_map(|ty| {
        let value = arb_value(&ty);
        (Just(ty), value)
    })
}

/// arbitrary chunk
pub fn arb_chunk() -> impl Strategy<Value = Chunk> {
    (any::<u8>(), arb_bs(512)).prop_map(|(tag, payload)| {
        Chunk::new(tag, payload).expect("payload below chunk limit")
    })
}

/// arbitrary list of chunks
pub fn arb_chunks(max: usize) -> impl Strategy<Value = Vec<Chunk>> { prop::collection::vec(arb_chunk(), 0..=max) }

/// arbitrary record schema with unique field names
pub fn arb_schema() -> impl Strategy<Value = RecordSchema> {
    prop::collection::vec(arb_fixed_field_type(), 1..8)
        .prop_filter("records must take at least one byte", |types| {
            types.iter().any(|ty| ty.fixed_size() != Some(0))
        })
        .prop_map(|types| {
            RecordSchema::new(
                types
                    .into_iter()
                    .enumerate()
                    .map(|(i, ty)| (format!("f{}", i), ty)),
            )
            .expect("non-empty fixed-width fields with unique names")
        })
}

/// arbitrary record that fits `schema`
pub fn arb_record(schema: &RecordSchema) -> impl Strategy<Value = Record> {
    schema
        .fields()
        .map(|(_, ty)| arb_value(ty))
        .collect::<Vec<_>>()
        .prop_map(Record::from)
}

/// arbitrary schema together with records that fit it
pub fn arb_schema_and_records(max: usize) -> impl Strategy<Value = (RecordSchema, Vec<Record>)> {
    arb_schema().prop_flat_map(move |schema| {
        let records = prop::collection::vec(arb_record(&schema), 0..=max);
        (Just(schema), records)
    })
}
