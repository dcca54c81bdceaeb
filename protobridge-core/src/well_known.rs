//! Standard schema types with bespoke native representations.
//!
//! Only the types in this table are special-cased, everything else goes through ordinary
//! cross-package resolution. The table is immutable and safe to read from any number of builds.

use prost_types::{FieldMask, Timestamp};

use crate::Target;

const NANOS_PER_MILLI: i64 = 1_000_000;
const MILLIS_PER_SECOND: i64 = 1_000;

/// Representation of a well-known type on one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct NativeMapping {
    /// Type generated code uses in place of the message
    pub native_type: &'static str,
    /// Whether `native_type` is built into the target language
    pub is_native: bool,
    /// Module providing the converters
    pub import_source: &'static str,
    /// Converter from the native value to the wire message
    pub serialize_fn: &'static str,
    /// Converter from the wire message to the native value
    pub deserialize_fn: &'static str,
}

/// A well-known type and its mappings
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct WellKnownType {
    /// Fully-qualified schema name without leading dot
    pub fq_name: &'static str,
    /// Rust side
    pub backend: NativeMapping,
    /// TypeScript side
    pub script: NativeMapping,
}

impl WellKnownType {
    /// Mapping for one target
    pub fn mapping(&self, target: Target) -> &NativeMapping {
        match target {
            Target::Backend => &self.backend,
            Target::Script => &self.script,
        }
    }
}

/// Module every script-side converter is imported from
pub const SCRIPT_RUNTIME_MODULE: &str = "@protobridge/runtime";

static WELL_KNOWN_TYPES: [WellKnownType; 2] = [
    WellKnownType {
        fq_name: "google.protobuf.Timestamp",
        backend: NativeMapping {
            native_type: "::std::time::SystemTime",
            is_native: true,
            import_source: "::prost_types",
            serialize_fn: "::prost_types::Timestamp::from",
            deserialize_fn: "::std::time::SystemTime::try_from",
        },
        script: NativeMapping {
            native_type: "Date",
            is_native: true,
            import_source: SCRIPT_RUNTIME_MODULE,
            serialize_fn: "dateToTimestamp",
            deserialize_fn: "timestampToDate",
        },
    },
    WellKnownType {
        fq_name: "google.protobuf.FieldMask",
        backend: NativeMapping {
            native_type: "::std::vec::Vec<::std::string::String>",
            is_native: true,
            import_source: "::prost_types",
            serialize_fn: "::protobridge_runtime::paths_to_field_mask",
            deserialize_fn: "::protobridge_runtime::field_mask_to_paths",
        },
        script: NativeMapping {
            native_type: "string[]",
            is_native: true,
            import_source: SCRIPT_RUNTIME_MODULE,
            serialize_fn: "pathsToFieldMask",
            deserialize_fn: "fieldMaskToPaths",
        },
    },
];

/// Look up a type by fully-qualified name, a leading dot is accepted
pub fn lookup(fq_name: &str) -> Option<&'static WellKnownType> {
    let fq_name = fq_name.strip_prefix('.').unwrap_or(fq_name);
    WELL_KNOWN_TYPES.iter().find(|wkt| wkt.fq_name == fq_name)
}

/// Every special-cased type
pub fn all() -> &'static [WellKnownType] {
    &WELL_KNOWN_TYPES
}

/// Wire timestamp for a script `Date`, given as milliseconds since the epoch
pub fn timestamp_from_millis(millis: i64) -> Timestamp {
    Timestamp {
        seconds: millis.div_euclid(MILLIS_PER_SECOND),
        nanos: (millis.rem_euclid(MILLIS_PER_SECOND) * NANOS_PER_MILLI) as i32,
    }
}

/// Milliseconds since the epoch of a wire timestamp, sub-millisecond precision is truncated
pub fn timestamp_to_millis(timestamp: &Timestamp) -> i64 {
    timestamp.seconds * MILLIS_PER_SECOND + i64::from(timestamp.nanos).div_euclid(NANOS_PER_MILLI)
}

/// Wire field mask for a list of paths
pub fn field_mask_from_paths<S: AsRef<str>>(paths: &[S]) -> FieldMask {
    FieldMask {
        paths: paths.iter().map(|p| p.as_ref().to_owned()).collect(),
    }
}

/// Paths of a wire field mask
pub fn field_mask_to_paths(mask: &FieldMask) -> Vec<String> {
    mask.paths.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_test() {
        assert!(lookup(".google.protobuf.Timestamp").is_some());
        assert!(lookup("google.protobuf.FieldMask").is_some());
        assert!(lookup("google.protobuf.Duration").is_none());
        assert!(lookup("shop.v1.Timestamp").is_none());
        let ts = lookup("google.protobuf.Timestamp").unwrap();
        assert_eq!(ts.mapping(Target::Script).native_type, "Date");
        assert_eq!(ts.mapping(Target::Backend).native_type, "::std::time::SystemTime");
    }

    #[test]
    fn timestamp_round_trip_test() {
        let instants = [
            0i64,
            1,
            999,
            1_000,
            1_700_000_000_123,
            -1,
            -1_500,
            -62_135_596_800_000, // 0001-01-01T00:00:00Z
            253_402_300_799_999, // 9999-12-31T23:59:59.999Z
        ];
        for millis in instants {
            let wire = timestamp_from_millis(millis);
            assert!(
                wire.nanos >= 0 && wire.nanos < 1_000_000_000,
                "nanos out of range for {}",
                millis
            );
            assert_eq!(timestamp_to_millis(&wire), millis);
        }
    }

    #[test]
    fn negative_timestamp_layout_test() {
        let wire = timestamp_from_millis(-1_500);
        assert_eq!(wire.seconds, -2);
        assert_eq!(wire.nanos, 500_000_000);
    }

    #[test]
    fn field_mask_round_trip_test() {
        let paths = ["user.display_name", "photo"];
        let mask = field_mask_from_paths(&paths);
        assert_eq!(field_mask_to_paths(&mask), paths);
    }
}
